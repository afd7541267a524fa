use selector_core::SelectorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FindError {
    #[error("Validation error: {0}")]
    Validation(#[from] SelectorError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend error: status {status}, {error}: {reason}")]
    Backend {
        status: u16,
        error: String,
        reason: String,
    },

    #[error("Unmarshal error: {0}")]
    Unmarshal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FindResult<T> = Result<T, FindError>;

impl FindError {
    pub fn backend(status: u16, error: &str, reason: &str) -> Self {
        FindError::Backend {
            status,
            error: error.to_string(),
            reason: reason.to_string(),
        }
    }

    /// HTTP-like status code for backend failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            FindError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl serde::Serialize for FindError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
