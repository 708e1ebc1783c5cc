pub mod database;
pub mod repositories;

use uuid::Uuid;

use crate::error::Result;
use crate::models::RecipeCard;

/// Narrow persistence contract consumed by the duplicate-detection engine.
///
/// Implementations own the eligibility rules: `fetch_eligible` must already
/// exclude soft-deleted rows and, when an owner is given, rows belonging to
/// anyone else. The engine performs no filtering of its own on top of this.
pub trait RecipeStore {
    /// All non-deleted recipes, optionally restricted to one owner.
    fn fetch_eligible(&self, owner: Option<&str>) -> Result<Vec<RecipeCard>>;

    /// Resolve ids to non-deleted recipes. Ids that do not resolve are
    /// simply absent from the result, in no guaranteed order.
    fn resolve_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeCard>>;

    /// Mark a recipe deleted and return the updated card.
    fn soft_delete(&self, id: &Uuid) -> Result<RecipeCard>;
}
