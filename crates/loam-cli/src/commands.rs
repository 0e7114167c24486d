use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use loam_refs::{RefError, RefStore};
use loam_sdk::{render_object, CommitRequest, ObjectKind, Repository};
use loam_store::{Blob, Object, ObjectStore};
use loam_sync::{Fetcher, LocalTransport, RefSpec};
use loam_types::ObjectId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let work_dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("reading current directory")?,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&work_dir, args),
        Command::HashObject(args) => cmd_hash_object(&work_dir, args),
        Command::CatFile(args) => cmd_cat_file(&work_dir, args),
        Command::LsTree(args) => cmd_ls_tree(&work_dir, args),
        Command::WriteTree => cmd_write_tree(&work_dir),
        Command::CommitTree(args) => cmd_commit_tree(&work_dir, args),
        Command::Commit(args) => cmd_commit(&work_dir, args),
        Command::Log(args) => cmd_log(&work_dir, args, &cli.format),
        Command::Fetch(args) => cmd_fetch(&work_dir, args),
    }
}

fn open(work_dir: &Path) -> anyhow::Result<Repository> {
    Repository::open(work_dir).with_context(|| format!("opening repository at {}", work_dir.display()))
}

/// Resolve `HEAD`, a full ref name, a branch name or a hex object ID.
fn resolve(repo: &Repository, spec: &str) -> anyhow::Result<ObjectId> {
    if spec == "HEAD" {
        return repo
            .refs()
            .resolve_head()?
            .context("HEAD does not point to a commit yet");
    }
    if let Ok(id) = spec.parse::<ObjectId>() {
        return Ok(id);
    }
    let name = if spec.starts_with("refs/") {
        spec.to_string()
    } else {
        format!("refs/heads/{spec}")
    };
    match repo.refs().read_ref(&name) {
        Ok(Some(id)) => Ok(id),
        Ok(None) | Err(RefError::InvalidRefName { .. }) => bail!("not a valid object name: {spec}"),
        Err(e) => Err(e).with_context(|| format!("reading {name}")),
    }
}

fn cmd_init(work_dir: &Path, args: InitArgs) -> anyhow::Result<()> {
    let target = match args.path {
        Some(path) => work_dir.join(path),
        None => work_dir.to_path_buf(),
    };
    let repo = Repository::init(&target)
        .with_context(|| format!("initializing repository at {}", target.display()))?;
    println!(
        "{} Initialized repository in {}",
        "✓".green().bold(),
        repo.git_dir().display().to_string().bold()
    );
    Ok(())
}

fn cmd_hash_object(work_dir: &Path, args: HashObjectArgs) -> anyhow::Result<()> {
    let path: PathBuf = work_dir.join(&args.file);
    let data = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let id = if args.write {
        open(work_dir)?.hash_object(&data, true)?
    } else {
        Object::Blob(Blob::new(data)).compute_id()
    };
    println!("{id}");
    Ok(())
}

fn cmd_cat_file(work_dir: &Path, args: CatFileArgs) -> anyhow::Result<()> {
    let repo = open(work_dir)?;
    let id = resolve(&repo, &args.object)?;
    if args.mode.kind {
        println!("{}", repo.object_kind(&id)?);
    } else if args.mode.size {
        println!("{}", repo.object_size(&id)?);
    } else {
        let object = repo.cat_object(&id)?;
        io::stdout().write_all(&render_object(&object))?;
    }
    Ok(())
}

fn cmd_ls_tree(work_dir: &Path, args: LsTreeArgs) -> anyhow::Result<()> {
    let repo = open(work_dir)?;
    let mut id = resolve(&repo, &args.tree)?;
    if repo.object_kind(&id)? == ObjectKind::Commit {
        id = repo.store().get_commit(&id)?.tree;
    }
    let mut out = io::stdout().lock();
    for entry in repo.list_tree(&id)? {
        if args.name_only {
            writeln!(out, "{}", entry.name)?;
        } else {
            writeln!(
                out,
                "{} {} {}\t{}",
                entry.mode,
                entry.mode.object_kind(),
                entry.object_id,
                entry.name
            )?;
        }
    }
    Ok(())
}

fn cmd_write_tree(work_dir: &Path) -> anyhow::Result<()> {
    let id = open(work_dir)?.write_tree()?;
    println!("{id}");
    Ok(())
}

fn cmd_commit_tree(work_dir: &Path, args: CommitTreeArgs) -> anyhow::Result<()> {
    let repo = open(work_dir)?;
    let mut request = CommitRequest::new(resolve(&repo, &args.tree)?, args.message);
    if let Some(parent) = &args.parent {
        request = request.with_parent(resolve(&repo, parent)?);
    }
    println!("{}", repo.commit_tree(request)?);
    Ok(())
}

fn cmd_commit(work_dir: &Path, args: CommitArgs) -> anyhow::Result<()> {
    let repo = open(work_dir)?;
    let id = repo.commit(args.message)?;
    let commit = repo.store().get_commit(&id)?;
    let branch = repo
        .head()?
        .and_then(|h| h.branch_name().map(str::to_owned))
        .unwrap_or_else(|| "detached HEAD".into());
    let root = if commit.parent.is_none() { " (root-commit)" } else { "" };
    println!(
        "[{}{} {}] {}",
        branch.green(),
        root,
        id.short_hex().yellow(),
        commit.summary()
    );
    Ok(())
}

fn cmd_log(work_dir: &Path, args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let repo = open(work_dir)?;
    let entries = repo.log(args.limit)?;
    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in &entries {
        if args.oneline {
            println!("{} {}", entry.id.short_hex().yellow(), entry.commit.summary());
            continue;
        }
        let author = &entry.commit.author;
        println!("{} {}", "commit".yellow(), entry.id.to_hex().yellow());
        println!("Author: {} <{}>", author.name(), author.email());
        println!("Date:   {}", author.when().to_rfc2822());
        println!();
        for line in entry.commit.message.lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

fn cmd_fetch(work_dir: &Path, args: FetchArgs) -> anyhow::Result<()> {
    let repo = open(work_dir)?;
    let remote_path = work_dir.join(&args.path);
    let transport = LocalTransport::open(&remote_path)
        .with_context(|| format!("opening remote {}", remote_path.display()))?;

    let text = args.refspec.as_deref().unwrap_or("main");
    let mut spec = RefSpec::parse(text).with_context(|| format!("invalid refspec: {text:?}"))?;
    if spec.dst.is_none() {
        let short = spec.src.trim_start_matches("refs/heads/");
        spec.dst = Some(format!("refs/remotes/origin/{short}"));
    }

    let result = Fetcher::fetch(&transport, repo.store(), repo.refs(), &spec)?;
    println!(
        "Fetched {} objects ({} bytes) from {}",
        result.objects_received.to_string().bold(),
        result.bytes_transferred,
        remote_path.display()
    );
    for update in &result.refs_updated {
        let old = update.old.map(|id| id.short_hex()).unwrap_or_else(|| "(new)".into());
        println!("  {} {} -> {}", update.name.green(), old, update.new.short_hex().yellow());
    }
    if result.refs_updated.is_empty() {
        println!("  {}", "up to date".green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(dir: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["loam", "-C", dir.to_str().unwrap()];
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv).unwrap())
    }

    fn with_identity(dir: &Path) {
        let path = dir.join(".git").join(loam_sdk::CONFIG_FILE);
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("\n[user]\nname = \"Test\"\nemail = \"test@example.com\"\n");
        fs::write(path, text).unwrap();
    }

    #[test]
    fn init_then_hash_and_cat() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["init"]).unwrap();
        fs::write(dir.path().join("hello.txt"), "hello\n").unwrap();
        run(dir.path(), &["hash-object", "-w", "hello.txt"]).unwrap();

        let id = "ce013625030ba8dba906f756967f9e9ca394464a";
        assert!(dir.path().join(".git/objects/ce").join(&id[2..]).is_file());
        run(dir.path(), &["cat-file", "-p", id]).unwrap();
        run(dir.path(), &["cat-file", "-t", id]).unwrap();
    }

    #[test]
    fn commands_outside_repository_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["write-tree"]).is_err());
        assert!(run(dir.path(), &["log"]).is_err());
    }

    #[test]
    fn commit_and_log() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["init"]).unwrap();
        with_identity(dir.path());
        fs::write(dir.path().join("a.txt"), "a\n").unwrap();
        run(dir.path(), &["commit", "-m", "first"]).unwrap();
        run(dir.path(), &["log", "--oneline"]).unwrap();
        run(dir.path(), &["ls-tree", "HEAD"]).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.log(10).unwrap().len(), 1);
        assert!(resolve(&repo, "main").is_ok());
        assert!(resolve(&repo, "nope").is_err());
    }

    #[test]
    fn resolve_reports_corrupt_refs() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["init"]).unwrap();
        fs::write(dir.path().join(".git/refs/heads/broken"), "not-a-hash\n").unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let err = resolve(&repo, "broken").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RefError>(),
            Some(RefError::Malformed { .. })
        ));
        let missing = resolve(&repo, "absent").unwrap_err();
        assert!(missing.to_string().contains("not a valid object name"));
    }

    #[test]
    fn fetch_between_repositories() {
        let upstream = tempfile::tempdir().unwrap();
        run(upstream.path(), &["init"]).unwrap();
        with_identity(upstream.path());
        fs::write(upstream.path().join("f"), "data\n").unwrap();
        run(upstream.path(), &["commit", "-m", "upstream"]).unwrap();

        let local = tempfile::tempdir().unwrap();
        run(local.path(), &["init"]).unwrap();
        run(local.path(), &["fetch", upstream.path().to_str().unwrap()]).unwrap();

        let upstream_head = Repository::open(upstream.path())
            .unwrap()
            .refs()
            .resolve_head()
            .unwrap()
            .unwrap();
        let repo = Repository::open(local.path()).unwrap();
        assert_eq!(
            repo.refs().read_ref("refs/remotes/origin/main").unwrap(),
            Some(upstream_head)
        );
        assert!(repo.store().exists(&upstream_head).unwrap());
    }
}
