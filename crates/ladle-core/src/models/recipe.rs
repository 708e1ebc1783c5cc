use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single ingredient line. Only the name is required; quantity and unit
/// stay optional because scraped and hand-entered recipes often omit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
            unit: None,
            notes: None,
        }
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// A numbered preparation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub step: u32,
    pub instruction: String,

    /// Minutes this step takes, when the recipe states it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<u32>,

    /// Oven/pan temperature in degrees, when stated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Instruction {
    pub fn new(step: u32, instruction: impl Into<String>) -> Self {
        Self {
            step,
            instruction: instruction.into(),
            time: None,
            temperature: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DietaryFlags {
    pub vegetarian: bool,
    pub vegan: bool,
    pub gluten_free: bool,
    pub dairy_free: bool,
    pub nut_free: bool,
}

/// Recipe content: the candidate form handed to duplicate detection,
/// and the payload nested inside a persisted [`RecipeCard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub ingredients: Vec<Ingredient>,

    #[serde(default)]
    pub instructions: Vec<Instruction>,

    /// Total cooking time in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,

    /// URL the recipe was saved from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub dietary: DietaryFlags,
}

impl Recipe {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            cooking_time: None,
            servings: None,
            source: None,
            dietary: DietaryFlags::default(),
        }
    }
}

/// A persisted recipe: content plus identity, ownership and the
/// soft-delete marker. Rows with `deleted_at` set are invisible to
/// listing and duplicate detection until restored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCard {
    pub id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    pub recipe: Recipe,
}

impl RecipeCard {
    pub fn new(recipe: Recipe) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            recipe,
        }
    }

    pub fn with_owner(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Compact row for CLI listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummaryView {
    pub id: Uuid,
    pub title: String,
    pub servings: Option<u32>,
    pub cooking_time: Option<u32>,
    pub source: Option<String>,
    pub ingredient_count: usize,
    pub deleted: bool,
}

impl From<&RecipeCard> for RecipeSummaryView {
    fn from(card: &RecipeCard) -> Self {
        Self {
            id: card.id,
            title: card.recipe.title.clone(),
            servings: card.recipe.servings,
            cooking_time: card.recipe.cooking_time,
            source: card.recipe.source.clone(),
            ingredient_count: card.recipe.ingredients.len(),
            deleted: card.is_deleted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_card_new() {
        let card = RecipeCard::new(Recipe::new("Chocolate Chip Cookies"));
        assert_eq!(card.recipe.title, "Chocolate Chip Cookies");
        assert!(card.user_id.is_none());
        assert!(!card.is_deleted());
        assert!(card.recipe.ingredients.is_empty());
    }

    #[test]
    fn test_recipe_json_roundtrip() {
        let mut recipe = Recipe::new("Pancakes");
        recipe.ingredients = vec![
            Ingredient::new("flour").with_quantity(2.0).with_unit("cup"),
            Ingredient::new("eggs").with_quantity(2.0),
        ];
        recipe.instructions = vec![
            Instruction::new(1, "Mix dry ingredients"),
            Instruction::new(2, "Fold in eggs and milk"),
        ];
        recipe.servings = Some(4);
        recipe.cooking_time = Some(20);
        recipe.dietary.vegetarian = true;

        let card = RecipeCard::new(recipe).with_owner("user-1");
        let json = serde_json::to_string_pretty(&card).unwrap();
        let restored: RecipeCard = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id, card.id);
        assert_eq!(restored.recipe.title, "Pancakes");
        assert_eq!(restored.recipe.ingredients.len(), 2);
        assert_eq!(restored.recipe.instructions.len(), 2);
        assert_eq!(restored.recipe.servings, Some(4));
        assert_eq!(restored.user_id.as_deref(), Some("user-1"));
        assert!(restored.recipe.dietary.vegetarian);
    }

    #[test]
    fn test_summary_view_from_card() {
        let mut recipe = Recipe::new("Soup");
        recipe.ingredients.push(Ingredient::new("carrot"));
        recipe.source = Some("https://example.com/soup".to_string());

        let card = RecipeCard::new(recipe);
        let view = RecipeSummaryView::from(&card);
        assert_eq!(view.title, "Soup");
        assert_eq!(view.ingredient_count, 1);
        assert!(!view.deleted);
    }
}
