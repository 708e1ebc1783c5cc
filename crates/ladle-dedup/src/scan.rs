//! Whole-collection duplicate scan and the merge engine.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use ladle_core::{RecipeCard, RecipeStore};

use crate::detect::{DetectOptions, MatchType, detect_duplicates};
use crate::error::{DedupError, Result};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub similarity_threshold: f64,
    /// Pool cap. The scan is O(n²) detector invocations over this many
    /// recipes, so the cap keeps a full-collection pass predictable.
    pub limit: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            limit: 50,
        }
    }
}

/// A cluster of at least two recipes judged mutually duplicate, with the
/// seed's best match score and first match type as representatives.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub recipes: Vec<RecipeCard>,
    pub similarity_score: f64,
    pub match_type: MatchType,
}

/// Scan the (capped) eligible pool for duplicate groups.
///
/// The pool is fetched once; everything after is in-memory. Each recipe
/// not yet claimed by a group seeds a detection against the remaining
/// unclaimed recipes; the seed plus its matches become one group and all
/// of them are excluded from later seeding and matching. A recipe
/// therefore belongs to at most one group, and grouping reaches one hop
/// from each seed rather than computing a transitive closure; that is
/// the intended, observable semantics, not an optimization target.
pub fn find_all_duplicates<S>(
    store: &S,
    owner: Option<&str>,
    options: &ScanOptions,
) -> Result<Vec<DuplicateGroup>>
where
    S: RecipeStore + ?Sized,
{
    let mut pool = store.fetch_eligible(owner)?;
    pool.truncate(options.limit);
    tracing::debug!(pool_size = pool.len(), "scanning for duplicate groups");

    let detect_options = DetectOptions::default().with_threshold(options.similarity_threshold);
    let mut claimed: HashSet<Uuid> = HashSet::new();
    let mut groups = Vec::new();

    for seed in &pool {
        if claimed.contains(&seed.id) {
            continue;
        }

        let rest: Vec<RecipeCard> = pool
            .iter()
            .filter(|card| card.id != seed.id && !claimed.contains(&card.id))
            .cloned()
            .collect();

        let report = detect_duplicates(&seed.recipe, &rest, &detect_options);
        if !report.has_duplicates {
            continue;
        }

        let similarity_score = report.highest_score;
        let match_type = report.duplicates[0].match_type;

        claimed.insert(seed.id);
        let mut recipes = Vec::with_capacity(report.total_duplicates + 1);
        recipes.push(seed.clone());
        for matched in report.duplicates {
            claimed.insert(matched.recipe.id);
            recipes.push(matched.recipe);
        }

        groups.push(DuplicateGroup {
            recipes,
            similarity_score,
            match_type,
        });
    }

    Ok(groups)
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub kept: RecipeCard,
    pub deleted: Vec<RecipeCard>,
}

/// Collapse a duplicate set into one surviving recipe.
///
/// `keep_id` must be a member of `recipe_ids`; the keep recipe must
/// resolve. Ids that fail to resolve are skipped with a warning rather
/// than failing the merge. Nothing is deleted unless both preconditions
/// hold.
pub fn merge_duplicates<S>(
    store: &S,
    recipe_ids: &[Uuid],
    keep_id: &Uuid,
) -> Result<MergeOutcome>
where
    S: RecipeStore + ?Sized,
{
    if !recipe_ids.contains(keep_id) {
        return Err(DedupError::InvalidMerge(format!(
            "keep id {keep_id} is not in the merge set"
        )));
    }

    let resolved = store.resolve_by_ids(recipe_ids)?;
    let kept = resolved
        .iter()
        .find(|card| card.id == *keep_id)
        .cloned()
        .ok_or_else(|| DedupError::RecipeNotFound(keep_id.to_string()))?;

    if resolved.len() < recipe_ids.len() {
        warn!(
            requested = recipe_ids.len(),
            resolved = resolved.len(),
            "some merge candidates did not resolve and will be skipped"
        );
    }

    let mut deleted = Vec::new();
    for card in resolved {
        if card.id == *keep_id {
            continue;
        }
        deleted.push(store.soft_delete(&card.id)?);
    }

    Ok(MergeOutcome { kept, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladle_core::{Database, Ingredient, Recipe};

    fn cookie_recipe(title: &str) -> Recipe {
        let mut recipe = Recipe::new(title);
        recipe.ingredients = vec![
            Ingredient::new("flour"),
            Ingredient::new("sugar"),
            Ingredient::new("butter"),
        ];
        recipe
    }

    fn seeded_db(titles: &[&str]) -> (Database, Vec<RecipeCard>) {
        let db = Database::open_in_memory().unwrap();
        let mut cards = Vec::new();
        for title in titles {
            let card = RecipeCard::new(cookie_recipe(title));
            db.upsert_recipe(&card).unwrap();
            cards.push(card);
        }
        (db, cards)
    }

    #[test]
    fn scan_groups_matching_recipes_once() {
        // Two cookie variants plus an unrelated stew. The cookies share
        // all ingredients, so they group; the stew stays ungrouped.
        let db = Database::open_in_memory().unwrap();
        let a = RecipeCard::new(cookie_recipe("Chocolate Chip Cookies"));
        let b = RecipeCard::new(cookie_recipe("Chocolate Chip Cookies"));
        let mut stew = Recipe::new("Beef Stew");
        stew.ingredients = vec![Ingredient::new("beef"), Ingredient::new("carrots")];
        let c = RecipeCard::new(stew);
        for card in [&a, &b, &c] {
            db.upsert_recipe(card).unwrap();
        }

        let groups = find_all_duplicates(&db, None, &ScanOptions::default()).unwrap();
        assert_eq!(groups.len(), 1);

        let group = &groups[0];
        assert_eq!(group.recipes.len(), 2);
        assert_eq!(group.match_type, MatchType::ExactTitle);
        assert_eq!(group.similarity_score, 1.0);

        let ids: HashSet<Uuid> = group.recipes.iter().map(|card| card.id).collect();
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&b.id));
        assert!(!ids.contains(&c.id));
    }

    #[test]
    fn scan_claims_each_recipe_for_one_group() {
        let (db, cards) = seeded_db(&["Pancakes", "Pancakes", "Pancakes"]);

        let groups = find_all_duplicates(&db, None, &ScanOptions::default()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].recipes.len(), 3);

        let grouped: HashSet<Uuid> = groups[0].recipes.iter().map(|c| c.id).collect();
        assert_eq!(grouped.len(), cards.len());
    }

    #[test]
    fn scan_respects_pool_limit() {
        let db = Database::open_in_memory().unwrap();
        let mut pancakes = Recipe::new("Pancakes");
        pancakes.ingredients = vec![Ingredient::new("maple syrup")];
        let mut waffles = Recipe::new("Waffles");
        waffles.ingredients = vec![Ingredient::new("yeast")];

        db.upsert_recipe(&RecipeCard::new(pancakes.clone())).unwrap();
        db.upsert_recipe(&RecipeCard::new(waffles)).unwrap();
        db.upsert_recipe(&RecipeCard::new(pancakes)).unwrap();

        // Pool is fetched oldest-first; the cap cuts off the second
        // "Pancakes" so nothing groups.
        let options = ScanOptions {
            limit: 2,
            ..ScanOptions::default()
        };
        let groups = find_all_duplicates(&db, None, &options).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn scan_empty_collection_yields_no_groups() {
        let db = Database::open_in_memory().unwrap();
        let groups = find_all_duplicates(&db, None, &ScanOptions::default()).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn merge_keeps_chosen_recipe_and_soft_deletes_rest() {
        let (db, cards) = seeded_db(&["Pancakes", "Pancakes", "Pancakes"]);
        let ids: Vec<Uuid> = cards.iter().map(|c| c.id).collect();

        let outcome = merge_duplicates(&db, &ids, &ids[1]).unwrap();
        assert_eq!(outcome.kept.id, ids[1]);
        assert_eq!(outcome.deleted.len(), 2);
        assert!(outcome.deleted.iter().all(|c| c.is_deleted()));

        let pool = db.fetch_eligible(None).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, ids[1]);
    }

    #[test]
    fn merge_rejects_keep_id_outside_set() {
        let (db, cards) = seeded_db(&["Pancakes", "Pancakes"]);
        let ids: Vec<Uuid> = cards.iter().map(|c| c.id).collect();
        let outsider = Uuid::now_v7();

        let err = merge_duplicates(&db, &ids, &outsider).unwrap_err();
        assert!(matches!(err, DedupError::InvalidMerge(_)));

        // Precondition failure must not delete anything.
        assert_eq!(db.fetch_eligible(None).unwrap().len(), 2);
    }

    #[test]
    fn merge_fails_when_keep_recipe_is_gone() {
        let (db, cards) = seeded_db(&["Pancakes", "Pancakes"]);
        let ghost = Uuid::now_v7();
        let ids = vec![cards[0].id, ghost];

        let err = merge_duplicates(&db, &ids, &ghost).unwrap_err();
        assert!(matches!(err, DedupError::RecipeNotFound(_)));
        assert_eq!(db.fetch_eligible(None).unwrap().len(), 2);
    }

    #[test]
    fn merge_skips_unresolvable_members() {
        let (db, cards) = seeded_db(&["Pancakes", "Pancakes"]);
        let ghost = Uuid::now_v7();
        let ids = vec![cards[0].id, cards[1].id, ghost];

        let outcome = merge_duplicates(&db, &ids, &cards[0].id).unwrap();
        assert_eq!(outcome.kept.id, cards[0].id);
        assert_eq!(outcome.deleted.len(), 1);
        assert_eq!(outcome.deleted[0].id, cards[1].id);
    }
}
