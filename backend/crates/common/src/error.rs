use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubsyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("validation error: {0}")]
    Validation(String),
}

pub type HubsyncResult<T> = Result<T, HubsyncError>;
