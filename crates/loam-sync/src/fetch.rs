use std::collections::HashSet;

use loam_crypto::ContentHasher;
use loam_refs::RefStore;
use loam_store::{codec, Object, ObjectKind, ObjectStore};
use loam_types::ObjectId;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::transport::RemoteTransport;
use crate::types::{FetchResult, RefSpec, RefUpdate};

enum Step {
    Visit(ObjectId, ObjectKind),
    Store(ObjectId, Vec<u8>),
}

/// Copies commit closures from a remote into a local object store.
pub struct Fetcher;

impl Fetcher {
    /// Copy `want` and everything reachable from it that `dest` lacks.
    ///
    /// A commit already present in `dest` ends the walk along that branch
    /// of history. Objects are written children-first, so an interrupted
    /// pull never leaves a tree or commit whose references are missing.
    pub fn pull(
        transport: &dyn RemoteTransport,
        dest: &dyn ObjectStore,
        want: &ObjectId,
    ) -> SyncResult<FetchResult> {
        let mut result = FetchResult::default();
        let mut visited = HashSet::new();
        let mut stack = vec![Step::Visit(*want, ObjectKind::Commit)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(id, expected) => {
                    if !visited.insert(id) || dest.exists(&id)? {
                        continue;
                    }
                    let encoded = transport
                        .fetch_object(&id)?
                        .ok_or(SyncError::MissingObject(id))?;
                    let object = Self::check(&id, expected, &encoded)?;
                    result.bytes_transferred += encoded.len() as u64;

                    stack.push(Step::Store(id, encoded));
                    match object {
                        Object::Commit(commit) => {
                            if let Some(parent) = commit.parent {
                                stack.push(Step::Visit(parent, ObjectKind::Commit));
                            }
                            stack.push(Step::Visit(commit.tree, ObjectKind::Tree));
                        }
                        Object::Tree(tree) => {
                            for entry in tree.entries {
                                stack.push(Step::Visit(entry.object_id, entry.mode.object_kind()));
                            }
                        }
                        Object::Blob(_) => {}
                    }
                }
                Step::Store(id, encoded) => {
                    if dest.write_encoded(&id, &encoded)? {
                        result.objects_received += 1;
                    }
                }
            }
        }

        debug!(
            want = %want,
            objects = result.objects_received,
            bytes = result.bytes_transferred,
            "pull complete"
        );
        Ok(result)
    }

    /// Fetch the remote ref `spec.src` and, if `spec.dst` is set, point that
    /// local ref at it. Without `force` the local ref may only move forward
    /// along first parents.
    pub fn fetch(
        transport: &dyn RemoteTransport,
        dest: &dyn ObjectStore,
        dest_refs: &dyn RefStore,
        spec: &RefSpec,
    ) -> SyncResult<FetchResult> {
        let tip = transport
            .list_refs()?
            .into_iter()
            .find(|(name, _)| *name == spec.src)
            .map(|(_, id)| id)
            .ok_or_else(|| SyncError::RemoteRefNotFound(spec.src.clone()))?;

        let mut result = Self::pull(transport, dest, &tip)?;

        if let Some(dst) = &spec.dst {
            let old = dest_refs.read_ref(dst)?;
            if old != Some(tip) {
                if let Some(old) = old {
                    if !spec.force && !is_ancestor(dest, &old, &tip)? {
                        return Err(SyncError::NotFastForward(dst.clone()));
                    }
                }
                dest_refs.write_ref(dst, &tip)?;
                result.refs_updated.push(RefUpdate {
                    name: dst.clone(),
                    old,
                    new: tip,
                });
            }
        }

        info!(
            src = %spec.src,
            tip = %tip,
            objects = result.objects_received,
            "fetched"
        );
        Ok(result)
    }

    fn check(id: &ObjectId, expected: ObjectKind, encoded: &[u8]) -> SyncResult<Object> {
        let corrupt = |reason: String| SyncError::Corrupt { id: *id, reason };
        if !ContentHasher::verify(encoded, id) {
            return Err(corrupt(format!(
                "content hashes to {}",
                ContentHasher::digest(encoded)
            )));
        }
        let object = codec::decode(encoded).map_err(|e| corrupt(e.to_string()))?;
        if object.kind() != expected {
            return Err(corrupt(format!("expected {expected}, got {}", object.kind())));
        }
        Ok(object)
    }
}

/// Whether `ancestor` is `tip` or on its first-parent chain in `store`.
fn is_ancestor(store: &dyn ObjectStore, ancestor: &ObjectId, tip: &ObjectId) -> SyncResult<bool> {
    let mut next = Some(*tip);
    while let Some(id) = next {
        if id == *ancestor {
            return Ok(true);
        }
        next = store.get_commit(&id)?.parent;
    }
    Ok(false)
}
