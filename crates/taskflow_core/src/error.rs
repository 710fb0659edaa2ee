use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("empty_text - task text is required")]
    EmptyText,
    #[error("not_found - task {0} not found")]
    NotFound(u64),
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("persistence_error - {0}")]
    Persistence(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn persistence<M: Into<String>>(message: M) -> Self {
        Self::Persistence(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
