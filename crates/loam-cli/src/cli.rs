use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "loam",
    about = "loam: content-addressed object storage in git's on-disk format",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Run as if started in DIR
    #[arg(short = 'C', global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository or reinitialize an existing one
    Init(InitArgs),
    /// Compute a file's blob ID and optionally store it
    HashObject(HashObjectArgs),
    /// Show an object's content, kind or size
    CatFile(CatFileArgs),
    /// List the entries of a tree
    LsTree(LsTreeArgs),
    /// Store the working directory as a tree
    WriteTree,
    /// Create a commit object from a tree
    CommitTree(CommitTreeArgs),
    /// Commit the working directory and advance the current branch
    Commit(CommitArgs),
    /// Show first-parent history from HEAD
    Log(LogArgs),
    /// Copy a ref and its history from another repository
    Fetch(FetchArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct HashObjectArgs {
    /// Write the object into the store
    #[arg(short = 'w')]
    pub write: bool,
    pub file: PathBuf,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct CatMode {
    /// Pretty-print the content
    #[arg(short = 'p')]
    pub pretty: bool,
    /// Show the object kind
    #[arg(short = 't')]
    pub kind: bool,
    /// Show the payload size
    #[arg(short = 's')]
    pub size: bool,
}

#[derive(Args)]
pub struct CatFileArgs {
    #[command(flatten)]
    pub mode: CatMode,
    pub object: String,
}

#[derive(Args)]
pub struct LsTreeArgs {
    #[arg(long)]
    pub name_only: bool,
    pub tree: String,
}

#[derive(Args)]
pub struct CommitTreeArgs {
    pub tree: String,
    #[arg(short = 'p')]
    pub parent: Option<String>,
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Path of the repository to fetch from
    pub path: PathBuf,
    /// `[+]<src>[:<dst>]`, default `main`
    pub refspec: Option<String>,
}
