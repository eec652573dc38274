use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("config_missing - {0}")]
    ConfigMissing(String),
    #[error("store_unavailable - {0}")]
    StoreUnavailable(String),
    #[error("not_found - task {0} not found")]
    NotFound(i64),
    /// Phase one of a rotation was persisted but phase two was not; the row
    /// is left `completed` until it is resumed or reconciled.
    #[error("partial_rotation - task {id} left completed: {reason}")]
    PartialRotation { id: i64, reason: String },
    #[error("conflict - {0}")]
    Conflict(String),
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    #[error("io_error - {0}")]
    Io(String),
}

impl AppError {
    pub fn config_missing<M: Into<String>>(message: M) -> Self {
        Self::ConfigMissing(message.into())
    }

    pub fn store_unavailable<M: Into<String>>(message: M) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn conflict<M: Into<String>>(message: M) -> Self {
        Self::Conflict(message.into())
    }

    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) => "config_missing",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::NotFound(_) => "not_found",
            Self::PartialRotation { .. } => "partial_rotation",
            Self::Conflict(_) => "conflict",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NotFound(id) => format!("task {id} not found"),
            Self::PartialRotation { id, reason } => {
                format!("task {id} left completed: {reason}")
            }
            Self::ConfigMissing(message)
            | Self::StoreUnavailable(message)
            | Self::Conflict(message)
            | Self::InvalidInput(message)
            | Self::InvalidData(message)
            | Self::Io(message) => message.clone(),
        }
    }
}
