//! Text, URL and ingredient canonicalization.
//!
//! Every comparison in the engine happens on normalized forms so that
//! casing, punctuation and field order never affect a verdict. All
//! functions here are pure and never fail; malformed input degrades to a
//! defined fallback instead of erroring.

use ladle_core::Ingredient;
use url::Url;

/// Lowercase, strip punctuation (anything that is not alphanumeric, `_`
/// or whitespace), and collapse whitespace runs to single spaces.
/// Idempotent.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a URL to `scheme://host/path`, lowercased, dropping query
/// string, fragment and any trailing slash. Input that does not parse as
/// a URL is returned trimmed and lowercased instead, so the source_url
/// detector simply fails to match rather than erroring.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            let path = url.path().trim_end_matches('/');
            format!("{}://{}{}", url.scheme(), host, path).to_lowercase()
        }
        Err(_) => raw.trim().to_lowercase(),
    }
}

/// Normalized ingredient names, sorted so that list order cannot affect
/// set comparison or fingerprinting downstream.
pub fn normalize_ingredients(ingredients: &[Ingredient]) -> Vec<String> {
    let mut names: Vec<String> = ingredients
        .iter()
        .map(|ingredient| normalize_text(&ingredient.name))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lowercases_and_strips_punctuation() {
        assert_eq!(
            normalize_text("  Grandma's BEST Chocolate-Chip Cookies!  "),
            "grandmas best chocolatechip cookies"
        );
    }

    #[test]
    fn text_collapses_whitespace_runs() {
        assert_eq!(normalize_text("a\t b\n\n  c"), "a b c");
    }

    #[test]
    fn text_is_idempotent() {
        let once = normalize_text("Crème Brûlée, the (best)  one");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn text_empty_stays_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("  !!!  "), "");
    }

    #[test]
    fn url_strips_query_fragment_and_case() {
        assert_eq!(
            normalize_url("https://EXAMPLE.com/Recipe?x=1#y"),
            "https://example.com/recipe"
        );
    }

    #[test]
    fn url_strips_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/recipes/pie/"),
            "https://example.com/recipes/pie"
        );
        assert_eq!(normalize_url("https://example.com/"), "https://example.com");
    }

    #[test]
    fn url_unparseable_falls_back_to_lowercased_input() {
        assert_eq!(normalize_url("  Not A URL  "), "not a url");
    }

    #[test]
    fn ingredients_are_normalized_and_sorted() {
        let list = vec![
            Ingredient::new("Sugar"),
            Ingredient::new("all-purpose FLOUR"),
            Ingredient::new("Butter (softened)"),
        ];
        assert_eq!(
            normalize_ingredients(&list),
            vec!["allpurpose flour", "butter softened", "sugar"]
        );
    }

    #[test]
    fn ingredient_order_does_not_matter() {
        let a = vec![Ingredient::new("salt"), Ingredient::new("pepper")];
        let b = vec![Ingredient::new("pepper"), Ingredient::new("salt")];
        assert_eq!(normalize_ingredients(&a), normalize_ingredients(&b));
    }
}
