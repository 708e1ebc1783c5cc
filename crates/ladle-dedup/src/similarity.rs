//! Similarity primitives: graded string similarity, set overlap, and an
//! exact content fingerprint.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use ladle_core::Recipe;

use crate::normalize::{normalize_ingredients, normalize_text};

/// Levenshtein-based similarity in [0, 1]:
/// `1 - distance / max(len(a), len(b))`, and 1.0 when both are empty.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Jaccard index of two normalized-name sets. An empty union scores 0.0:
/// two recipes with no ingredients are not duplicates by this measure.
pub fn ingredient_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}

/// SHA-256 over a canonical rendering of the recipe content. Digest
/// equality is an exact-match signal, not a graded one.
///
/// Ingredient names are sorted before hashing, so two recipes that differ
/// only in ingredient list order fingerprint identically; title and
/// instruction order remain significant.
pub fn content_fingerprint(recipe: &Recipe) -> String {
    let title = normalize_text(&recipe.title);
    let ingredients = normalize_ingredients(&recipe.ingredients).join("|");
    let instructions = recipe
        .instructions
        .iter()
        .map(|step| normalize_text(&step.instruction))
        .collect::<Vec<_>>()
        .join("|");
    let servings = recipe.servings.map(|n| n.to_string()).unwrap_or_default();
    let cooking_time = recipe
        .cooking_time
        .map(|n| n.to_string())
        .unwrap_or_default();

    let canonical = format!("{title}\n{ingredients}\n{instructions}\n{servings}\n{cooking_time}");

    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}
