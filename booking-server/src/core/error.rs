use thiserror::Error;

/// Server bootstrap/runtime errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Application error: {0}")]
    App(#[from] crate::utils::AppError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
