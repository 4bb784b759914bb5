use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlashdeckError {
    #[error("Subscription to {stream} failed: {message}")]
    Subscription { stream: String, message: String },

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Deleting deck {deck} failed: {failed} delete(s) failed, {deleted} card(s) already deleted")]
    CascadeDelete {
        deck: String,
        failed: usize,
        deleted: usize,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Sign in required: {0}")]
    Unauthenticated(String),

    #[error("Malformed document: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, FlashdeckError>;
