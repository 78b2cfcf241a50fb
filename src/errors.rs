use thiserror::Error;

/// Errors that can occur while grabbing a context slice.
#[derive(Error, Debug)]
pub enum GrabError {
    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("parse error: {message} (path: {path}, line: {line:?})")]
    Parse {
        message: String,
        path: String,
        line: Option<u32>,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("usage error: {message}")]
    Usage { message: String },

    #[error("formatter error: {message}")]
    Format { message: String },

    #[error("clipboard error: {message}")]
    Clipboard { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `GrabError`.
pub type Result<T> = std::result::Result<T, GrabError>;
