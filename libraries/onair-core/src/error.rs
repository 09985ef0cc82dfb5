/// Core error types for OnAir Player
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating shared media records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The item is missing its routing slug
    #[error("Media item {id:?} has no slug")]
    MissingSlug { id: String },

    /// The source locator could not be parsed
    #[error("Invalid source url: {0}")]
    InvalidSourceUrl(String),
}
