use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    /// Merge called with arguments that can never succeed, e.g. a keep-id
    /// outside the merge set. Surfaced before any write happens.
    #[error("invalid merge: {0}")]
    InvalidMerge(String),

    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    /// Storage collaborator failure, propagated unchanged.
    #[error(transparent)]
    Store(#[from] ladle_core::LadleError),
}

pub type Result<T> = std::result::Result<T, DedupError>;
