//! Ladle Dedup — multi-signal duplicate detection for recipes.
//!
//! Five independent detectors (exact title, fuzzy title, ingredient overlap,
//! source URL, content fingerprint) run over a pool of saved recipes; the
//! aggregator dedupes and ranks their results. The scanner extends this to
//! whole-collection duplicate groups, and the merge engine collapses a group
//! into one surviving recipe.
//!
//! The engine is stateless compute: the pool is fetched once through the
//! [`ladle_core::RecipeStore`] collaborator and everything after that is
//! in-memory.

pub mod detect;
pub mod error;
pub mod normalize;
pub mod scan;
pub mod similarity;

pub use detect::{
    Confidence, DetectOptions, DetectionReport, DuplicateMatch, DuplicateStats, MatchType,
    check_recipe, collection_stats, detect_duplicates, duplicate_stats,
};
pub use error::{DedupError, Result};
pub use scan::{DuplicateGroup, MergeOutcome, ScanOptions, find_all_duplicates, merge_duplicates};
