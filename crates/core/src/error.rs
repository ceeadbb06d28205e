use thiserror::Error;
use uuid::Uuid;

pub type AdResult<T> = Result<T, AdError>;

/// Error taxonomy shared by the service, scheduler, and GraphQL layers.
/// Each variant maps to one GraphQL `extensions.code` value.
#[derive(Error, Debug)]
pub enum AdError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("time slot conflict: {message}")]
    Conflict {
        message: String,
        conflicting_ads: Vec<Uuid>,
    },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AdError {
    /// Stable machine-readable code carried in GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            AdError::Unauthenticated => "UNAUTHENTICATED",
            AdError::Forbidden(_) => "FORBIDDEN",
            AdError::NotFound(_) => "NOT_FOUND",
            AdError::BadRequest(_) => "BAD_REQUEST",
            AdError::InvalidInput(_) => "INVALID_INPUT",
            AdError::Conflict { .. } => "CONFLICT",
            AdError::Internal(_) => "INTERNAL",
        }
    }

    pub fn not_found(entity: &str, id: Uuid) -> Self {
        AdError::NotFound(format!("{entity} {id}"))
    }
}
