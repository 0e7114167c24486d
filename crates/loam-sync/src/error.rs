use loam_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote is missing object {0}")]
    MissingObject(ObjectId),

    #[error("corrupt object {id} from remote: {reason}")]
    Corrupt { id: ObjectId, reason: String },

    #[error("remote ref not found: {0}")]
    RemoteRefNotFound(String),

    #[error("not a fast-forward update for ref {0}")]
    NotFastForward(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("store error: {0}")]
    Store(#[from] loam_store::StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] loam_refs::RefError),
}

pub type SyncResult<T> = Result<T, SyncError>;
