use loam_store::Object;

/// Render an object for display, as `git cat-file -p` prints it.
///
/// Blobs are returned verbatim, commits as their text payload, and trees as
/// one `<mode> <kind> <id>\t<name>` line per entry.
pub fn render_object(object: &Object) -> Vec<u8> {
    match object {
        Object::Blob(blob) => blob.data.clone(),
        Object::Commit(commit) => commit.to_payload(),
        Object::Tree(tree) => tree
            .entries
            .iter()
            .map(|e| format!("{} {} {}\t{}\n", e.mode, e.mode.object_kind(), e.object_id, e.name))
            .collect::<String>()
            .into_bytes(),
    }
}
