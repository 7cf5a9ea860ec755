use thiserror::Error;

/// Closed set of failures the identity core can produce. The HTTP layer
/// matches this exhaustively; no behavior depends on message text.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
