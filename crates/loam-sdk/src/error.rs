use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("repository not initialized at {0}")]
    NotInitialized(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("no committer identity: set [user] name and email in loam.toml")]
    MissingIdentity,

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] loam_refs::RefError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
