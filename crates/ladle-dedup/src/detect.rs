//! Match detectors and the duplicate aggregator.
//!
//! Detector order is fixed: exact title, fuzzy title, ingredient overlap,
//! source URL, content fingerprint. When several detectors flag the same
//! existing recipe, the first one to run decides the reported match type,
//! so this order is part of the observable contract.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ladle_core::{Recipe, RecipeCard, RecipeStore};

use crate::error::Result;
use crate::normalize::{normalize_ingredients, normalize_text, normalize_url};
use crate::similarity::{content_fingerprint, ingredient_similarity, string_similarity};

/// Fuzzy title matches below this score are not reported at all.
pub const FUZZY_TITLE_THRESHOLD: f64 = 0.8;
/// Ingredient-overlap matches below this Jaccard index are not reported.
pub const INGREDIENT_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactTitle,
    FuzzyTitle,
    IngredientSimilarity,
    SourceUrl,
    ContentFingerprint,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ExactTitle => "exact_title",
            Self::FuzzyTitle => "fuzzy_title",
            Self::IngredientSimilarity => "ingredient_similarity",
            Self::SourceUrl => "source_url",
            Self::ContentFingerprint => "content_fingerprint",
        };
        write!(f, "{name}")
    }
}

/// Coarse bucketing of a raw score for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        write!(f, "{name}")
    }
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::High
        } else if score >= 0.7 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One existing recipe flagged as a likely duplicate of the candidate.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateMatch {
    pub recipe: RecipeCard,
    pub similarity_score: f64,
    pub match_type: MatchType,
    pub confidence: Confidence,
}

impl DuplicateMatch {
    fn new(recipe: &RecipeCard, score: f64, match_type: MatchType) -> Self {
        Self {
            recipe: recipe.clone(),
            similarity_score: score,
            match_type,
            confidence: Confidence::from_score(score),
        }
    }
}

/// Which detectors run, and the score floor for the final report.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub check_exact_title: bool,
    pub check_fuzzy_title: bool,
    pub check_ingredients: bool,
    pub check_source_url: bool,
    pub check_fingerprint: bool,
    pub similarity_threshold: f64,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            check_exact_title: true,
            check_fuzzy_title: true,
            check_ingredients: true,
            check_source_url: true,
            check_fingerprint: true,
            similarity_threshold: 0.5,
        }
    }
}

impl DetectOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

/// Aggregated outcome of one detection call. `duplicates` is sorted by
/// score, descending, and holds at most one entry per existing recipe.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub duplicates: Vec<DuplicateMatch>,
    pub has_duplicates: bool,
    pub total_duplicates: usize,
    pub highest_score: f64,
}

// ─── Detectors ──────────────────────────────────────────────────────────────

fn detect_exact_title(candidate: &Recipe, pool: &[RecipeCard]) -> Vec<DuplicateMatch> {
    let title = normalize_text(&candidate.title);
    pool.iter()
        .filter(|card| normalize_text(&card.recipe.title) == title)
        .map(|card| DuplicateMatch::new(card, 1.0, MatchType::ExactTitle))
        .collect()
}

fn detect_fuzzy_title(candidate: &Recipe, pool: &[RecipeCard]) -> Vec<DuplicateMatch> {
    let title = normalize_text(&candidate.title);
    pool.iter()
        .filter_map(|card| {
            let score = string_similarity(&title, &normalize_text(&card.recipe.title));
            (score >= FUZZY_TITLE_THRESHOLD)
                .then(|| DuplicateMatch::new(card, score, MatchType::FuzzyTitle))
        })
        .collect()
}

fn detect_ingredient_overlap(candidate: &Recipe, pool: &[RecipeCard]) -> Vec<DuplicateMatch> {
    let names = normalize_ingredients(&candidate.ingredients);
    pool.iter()
        .filter_map(|card| {
            let other = normalize_ingredients(&card.recipe.ingredients);
            let score = ingredient_similarity(&names, &other);
            (score >= INGREDIENT_THRESHOLD)
                .then(|| DuplicateMatch::new(card, score, MatchType::IngredientSimilarity))
        })
        .collect()
}

fn detect_source_url(candidate: &Recipe, pool: &[RecipeCard]) -> Vec<DuplicateMatch> {
    // A recipe without a source is excluded, never a wildcard.
    let Some(source) = candidate.source.as_deref() else {
        return Vec::new();
    };
    let source = normalize_url(source);

    pool.iter()
        .filter(|card| {
            card.recipe
                .source
                .as_deref()
                .is_some_and(|other| normalize_url(other) == source)
        })
        .map(|card| DuplicateMatch::new(card, 1.0, MatchType::SourceUrl))
        .collect()
}

fn detect_fingerprint(candidate: &Recipe, pool: &[RecipeCard]) -> Vec<DuplicateMatch> {
    let fingerprint = content_fingerprint(candidate);
    pool.iter()
        .filter(|card| content_fingerprint(&card.recipe) == fingerprint)
        .map(|card| DuplicateMatch::new(card, 1.0, MatchType::ContentFingerprint))
        .collect()
}

// ─── Aggregator ─────────────────────────────────────────────────────────────

/// Run the enabled detectors over an in-memory pool.
///
/// Pure function: dedupes by existing-recipe id (first detector wins),
/// drops matches below `similarity_threshold`, sorts descending by score
/// and derives the summary fields.
pub fn detect_duplicates(
    candidate: &Recipe,
    pool: &[RecipeCard],
    options: &DetectOptions,
) -> DetectionReport {
    let mut collected: Vec<DuplicateMatch> = Vec::new();

    if options.check_exact_title {
        collected.extend(detect_exact_title(candidate, pool));
    }
    if options.check_fuzzy_title {
        collected.extend(detect_fuzzy_title(candidate, pool));
    }
    if options.check_ingredients {
        collected.extend(detect_ingredient_overlap(candidate, pool));
    }
    if options.check_source_url {
        collected.extend(detect_source_url(candidate, pool));
    }
    if options.check_fingerprint {
        collected.extend(detect_fingerprint(candidate, pool));
    }

    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut duplicates: Vec<DuplicateMatch> = collected
        .into_iter()
        .filter(|m| seen.insert(m.recipe.id))
        .filter(|m| m.similarity_score >= options.similarity_threshold)
        .collect();

    duplicates.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let highest_score = duplicates
        .first()
        .map(|m| m.similarity_score)
        .unwrap_or(0.0);

    DetectionReport {
        has_duplicates: !duplicates.is_empty(),
        total_duplicates: duplicates.len(),
        highest_score,
        duplicates,
    }
}

/// Fetch the eligible pool through the storage collaborator, then run
/// [`detect_duplicates`]. Storage failures propagate unchanged.
pub fn check_recipe<S>(
    store: &S,
    candidate: &Recipe,
    owner: Option<&str>,
    options: &DetectOptions,
) -> Result<DetectionReport>
where
    S: RecipeStore + ?Sized,
{
    let pool = store.fetch_eligible(owner)?;
    tracing::debug!(pool_size = pool.len(), "running duplicate detection");
    Ok(detect_duplicates(candidate, &pool, options))
}

// ─── Collection stats ───────────────────────────────────────────────────────

/// Cheap title-only duplicate estimate for a collection. Deliberately not
/// a pairwise scan: every recipe beyond the first sharing a normalized
/// title counts as one potential duplicate.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateStats {
    pub total_recipes: usize,
    pub potential_duplicates: usize,
    pub duplicate_percentage: f64,
}

pub fn duplicate_stats(pool: &[RecipeCard]) -> DuplicateStats {
    let mut title_counts: HashMap<String, usize> = HashMap::new();
    for card in pool {
        *title_counts
            .entry(normalize_text(&card.recipe.title))
            .or_insert(0) += 1;
    }

    let potential_duplicates: usize = title_counts.values().map(|count| count - 1).sum();
    let total_recipes = pool.len();
    let duplicate_percentage = if total_recipes == 0 {
        0.0
    } else {
        potential_duplicates as f64 / total_recipes as f64 * 100.0
    };

    DuplicateStats {
        total_recipes,
        potential_duplicates,
        duplicate_percentage,
    }
}

pub fn collection_stats<S>(store: &S, owner: Option<&str>) -> Result<DuplicateStats>
where
    S: RecipeStore + ?Sized,
{
    let pool = store.fetch_eligible(owner)?;
    Ok(duplicate_stats(&pool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladle_core::{Ingredient, Instruction};

    fn cookie_recipe(title: &str) -> Recipe {
        let mut recipe = Recipe::new(title);
        recipe.ingredients = vec![
            Ingredient::new("flour"),
            Ingredient::new("sugar"),
            Ingredient::new("butter"),
            Ingredient::new("chocolate chips"),
        ];
        recipe.instructions = vec![
            Instruction::new(1, "Cream the butter and sugar"),
            Instruction::new(2, "Fold in the chips and bake"),
        ];
        recipe.servings = Some(24);
        recipe.cooking_time = Some(25);
        recipe
    }

    fn pool_of(recipes: Vec<Recipe>) -> Vec<RecipeCard> {
        recipes.into_iter().map(RecipeCard::new).collect()
    }

    #[test]
    fn empty_pool_reports_no_duplicates() {
        let report =
            detect_duplicates(&cookie_recipe("Anything"), &[], &DetectOptions::default());
        assert!(!report.has_duplicates);
        assert_eq!(report.total_duplicates, 0);
        assert!(report.duplicates.is_empty());
        assert_eq!(report.highest_score, 0.0);
    }

    #[test]
    fn exact_title_wins_over_other_signals() {
        // Identical content: exact title, ingredients and fingerprint all
        // match, but the first detector in the fixed order claims the id.
        let pool = pool_of(vec![cookie_recipe("Chocolate Chip Cookies")]);
        let report = detect_duplicates(
            &cookie_recipe("Chocolate Chip Cookies"),
            &pool,
            &DetectOptions::default(),
        );

        assert_eq!(report.total_duplicates, 1);
        let top = &report.duplicates[0];
        assert_eq!(top.match_type, MatchType::ExactTitle);
        assert_eq!(top.similarity_score, 1.0);
        assert_eq!(top.confidence, Confidence::High);
    }

    #[test]
    fn fuzzy_title_respects_both_thresholds() {
        // "best chocolate chip cookies" vs "chocolate chip cookies":
        // distance 5 over 27 chars, similarity ~0.815.
        let mut existing = Recipe::new("Chocolate Chip Cookies");
        existing.ingredients = vec![Ingredient::new("something else entirely")];
        let pool = pool_of(vec![existing]);

        let candidate = Recipe::new("Best Chocolate Chip Cookies");

        let report = detect_duplicates(&candidate, &pool, &DetectOptions::default());
        assert_eq!(report.total_duplicates, 1);
        assert_eq!(report.duplicates[0].match_type, MatchType::FuzzyTitle);
        assert!(report.duplicates[0].similarity_score >= 0.8);
        assert_eq!(report.duplicates[0].confidence, Confidence::Medium);

        let strict = DetectOptions::default().with_threshold(0.95);
        let report = detect_duplicates(&candidate, &pool, &strict);
        assert!(!report.has_duplicates);
    }

    #[test]
    fn fuzzy_title_below_floor_is_not_reported() {
        let pool = pool_of(vec![Recipe::new("Beef Wellington")]);
        let report = detect_duplicates(
            &Recipe::new("Banana Bread"),
            &pool,
            &DetectOptions::default().with_threshold(0.0),
        );
        assert!(!report.has_duplicates);
    }

    #[test]
    fn ingredient_overlap_reports_jaccard_score() {
        // 3 shared of 4 distinct names, titles and sources unrelated.
        let mut existing = Recipe::new("Grandma's Classic Batch");
        existing.ingredients = vec![
            Ingredient::new("flour"),
            Ingredient::new("sugar"),
            Ingredient::new("eggs"),
        ];
        let mut candidate = Recipe::new("Weeknight Quick Mix");
        candidate.ingredients = vec![
            Ingredient::new("flour"),
            Ingredient::new("sugar"),
            Ingredient::new("eggs"),
            Ingredient::new("vanilla"),
        ];

        let report =
            detect_duplicates(&candidate, &pool_of(vec![existing]), &DetectOptions::default());
        assert_eq!(report.total_duplicates, 1);
        assert_eq!(
            report.duplicates[0].match_type,
            MatchType::IngredientSimilarity
        );
        assert_eq!(report.duplicates[0].similarity_score, 0.75);
        assert_eq!(report.duplicates[0].confidence, Confidence::Medium);
    }

    #[test]
    fn source_url_matches_normalized_urls_only() {
        let mut existing = Recipe::new("Pie, Saved");
        existing.source = Some("https://EXAMPLE.com/Recipes/Pie/?utm=1#top".to_string());
        let pool = pool_of(vec![existing]);

        let mut candidate = Recipe::new("Totally Different Name");
        candidate.source = Some("https://example.com/recipes/pie".to_string());

        let report = detect_duplicates(&candidate, &pool, &DetectOptions::default());
        assert_eq!(report.total_duplicates, 1);
        assert_eq!(report.duplicates[0].match_type, MatchType::SourceUrl);
        assert_eq!(report.duplicates[0].similarity_score, 1.0);

        // No source on the candidate: the detector stays silent.
        let candidate = Recipe::new("Totally Different Name");
        let report = detect_duplicates(&candidate, &pool, &DetectOptions::default());
        assert!(!report.has_duplicates);
    }

    #[test]
    fn fingerprint_catches_renamed_field_order() {
        let mut existing = cookie_recipe("Cookies");
        existing.ingredients.reverse();
        let pool = pool_of(vec![existing]);

        // Same content, ingredient order shuffled; disable the title and
        // ingredient detectors to isolate the fingerprint signal.
        let options = DetectOptions {
            check_exact_title: false,
            check_fuzzy_title: false,
            check_ingredients: false,
            check_source_url: false,
            ..DetectOptions::default()
        };
        let report = detect_duplicates(&cookie_recipe("Cookies"), &pool, &options);
        assert_eq!(report.total_duplicates, 1);
        assert_eq!(
            report.duplicates[0].match_type,
            MatchType::ContentFingerprint
        );
    }

    #[test]
    fn one_entry_per_existing_recipe() {
        // Same recipe twice in the pool, candidate matches both on several
        // signals: report carries one entry per pool id.
        let a = cookie_recipe("Chocolate Chip Cookies");
        let b = cookie_recipe("Chocolate Chip Cookies");
        let pool = pool_of(vec![a, b]);

        let report = detect_duplicates(
            &cookie_recipe("Chocolate Chip Cookies"),
            &pool,
            &DetectOptions::default(),
        );
        assert_eq!(report.total_duplicates, 2);
        let mut ids: Vec<Uuid> = report.duplicates.iter().map(|m| m.recipe.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn report_is_sorted_descending() {
        // "weeknight cookies ii" is a fuzzy-title hit (~0.85) while the
        // other pool entry is an exact-title hit at 1.0.
        let mut near = Recipe::new("Weeknight Cookies II");
        near.ingredients = vec![Ingredient::new("oats")];
        let exact = cookie_recipe("Weeknight Cookies");

        let pool = pool_of(vec![near, exact]);
        let report = detect_duplicates(
            &cookie_recipe("Weeknight Cookies"),
            &pool,
            &DetectOptions::default(),
        );

        assert_eq!(report.total_duplicates, 2);
        assert_eq!(report.duplicates[0].similarity_score, 1.0);
        assert!(report.duplicates[1].similarity_score < 1.0);
        assert_eq!(report.highest_score, 1.0);
    }

    #[test]
    fn disabled_detectors_do_not_run() {
        let pool = pool_of(vec![cookie_recipe("Chocolate Chip Cookies")]);
        let options = DetectOptions {
            check_exact_title: false,
            check_fuzzy_title: false,
            check_ingredients: false,
            check_source_url: false,
            check_fingerprint: false,
            similarity_threshold: 0.0,
        };
        let report = detect_duplicates(
            &cookie_recipe("Chocolate Chip Cookies"),
            &pool,
            &options,
        );
        assert!(!report.has_duplicates);
    }

    #[test]
    fn stats_count_extra_titles() {
        let titles = ["X", "X", "X", "Y", "Y", "Z"];
        let pool = pool_of(titles.iter().map(|t| Recipe::new(*t)).collect());

        let stats = duplicate_stats(&pool);
        assert_eq!(stats.total_recipes, 6);
        assert_eq!(stats.potential_duplicates, 3);
        assert_eq!(stats.duplicate_percentage, 50.0);
    }

    #[test]
    fn stats_empty_pool_is_zero() {
        let stats = duplicate_stats(&[]);
        assert_eq!(stats.total_recipes, 0);
        assert_eq!(stats.potential_duplicates, 0);
        assert_eq!(stats.duplicate_percentage, 0.0);
    }

    #[test]
    fn match_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MatchType::ExactTitle).unwrap(),
            "\"exact_title\""
        );
        assert_eq!(MatchType::ContentFingerprint.to_string(), "content_fingerprint");
    }
}
