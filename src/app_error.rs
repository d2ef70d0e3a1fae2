use thiserror::Error;

/// Error crossing the CLI boundary, classified by exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Runtime(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn usage<T: Into<String>>(message: T) -> Self {
        Self::Usage(message.into())
    }

    pub fn runtime<T: Into<String>>(message: T) -> Self {
        Self::Runtime(message.into())
    }

    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            Self::Runtime(_) => 1,
            Self::Internal(_) => 3,
        }
    }
}
