use std::sync::MutexGuard;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::error::{LadleError, Result};
use crate::models::{DietaryFlags, Ingredient, Instruction, Recipe, RecipeCard, RecipeSummaryView};

use super::Repository;

pub trait RecipeRepository: Repository<Entity = RecipeCard, Id = Uuid> {
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<RecipeSummaryView>>;
    fn count(&self) -> Result<usize>;
    fn count_deleted(&self) -> Result<usize>;
    fn search_title(&self, query: &str, limit: usize) -> Result<Vec<RecipeSummaryView>>;

    /// Non-deleted recipes, optionally restricted to one owner, oldest first.
    fn list_eligible(&self, owner: Option<&str>) -> Result<Vec<RecipeCard>>;

    /// Resolve ids to non-deleted recipes; unresolvable ids are absent.
    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<RecipeCard>>;

    fn soft_delete(&self, id: &Uuid) -> Result<RecipeCard>;
    fn restore(&self, id: &Uuid) -> Result<RecipeCard>;
}

pub struct SqliteRecipeRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

const CARD_COLUMNS: &str = "id, user_id, title, description, ingredients, instructions,
            cooking_time, servings, source, dietary, created_at, updated_at, deleted_at";

impl<'a> SqliteRecipeRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<RecipeCard> {
        let id_str: String = row.get(0)?;
        let ingredients_str: String = row.get(4)?;
        let instructions_str: String = row.get(5)?;
        let dietary_str: String = row.get(9)?;

        let ingredients: Vec<Ingredient> =
            serde_json::from_str(&ingredients_str).unwrap_or_default();
        let instructions: Vec<Instruction> =
            serde_json::from_str(&instructions_str).unwrap_or_default();
        let dietary: DietaryFlags = serde_json::from_str(&dietary_str).unwrap_or_default();

        Ok(RecipeCard {
            id: parse_uuid(0, &id_str)?,
            user_id: row.get(1)?,
            created_at: parse_timestamp(10, row.get(10)?)?,
            updated_at: parse_timestamp(11, row.get(11)?)?,
            deleted_at: row
                .get::<_, Option<String>>(12)?
                .map(|s| parse_timestamp(12, s))
                .transpose()?,
            recipe: Recipe {
                title: row.get(2)?,
                description: row.get(3)?,
                ingredients,
                instructions,
                cooking_time: row.get(6)?,
                servings: row.get(7)?,
                source: row.get(8)?,
                dietary,
            },
        })
    }

    fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<RecipeSummaryView> {
        let id_str: String = row.get(0)?;
        let ingredients_str: String = row.get(4)?;
        let ingredients: Vec<Ingredient> =
            serde_json::from_str(&ingredients_str).unwrap_or_default();
        let deleted: Option<String> = row.get(5)?;

        Ok(RecipeSummaryView {
            id: parse_uuid(0, &id_str)?,
            title: row.get(1)?,
            servings: row.get(2)?,
            cooking_time: row.get(3)?,
            source: row.get(6)?,
            ingredient_count: ingredients.len(),
            deleted: deleted.is_some(),
        })
    }

    fn fetch_card(&self, id: &Uuid) -> Result<RecipeCard> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {CARD_COLUMNS} FROM recipes WHERE id = ?1"))?;

        stmt.query_row(params![id.to_string()], Self::row_to_card)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => LadleError::RecipeNotFound(id.to_string()),
                other => LadleError::Database(other),
            })
    }
}

fn parse_uuid(idx: usize, s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(idx: usize, s: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl<'a> Repository for SqliteRecipeRepository<'a> {
    type Entity = RecipeCard;
    type Id = Uuid;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        match self.fetch_card(id) {
            Ok(card) => Ok(Some(card)),
            Err(LadleError::RecipeNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, card: &Self::Entity) -> Result<()> {
        let ingredients_json = serde_json::to_string(&card.recipe.ingredients)?;
        let instructions_json = serde_json::to_string(&card.recipe.instructions)?;
        let dietary_json = serde_json::to_string(&card.recipe.dietary)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO recipes
                (id, user_id, title, description, ingredients, instructions,
                 cooking_time, servings, source, dietary, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                card.id.to_string(),
                card.user_id,
                card.recipe.title,
                card.recipe.description,
                ingredients_json,
                instructions_json,
                card.recipe.cooking_time,
                card.recipe.servings,
                card.recipe.source,
                dietary_json,
                card.created_at.to_rfc3339(),
                card.updated_at.to_rfc3339(),
                card.deleted_at.map(|dt| dt.to_rfc3339()),
            ],
        )?;

        Ok(())
    }

    /// Hard delete. The application flow soft-deletes; this backs `--purge`.
    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM recipes WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }
}

impl<'a> RecipeRepository for SqliteRecipeRepository<'a> {
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<RecipeSummaryView>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, servings, cooking_time, ingredients, deleted_at, source
             FROM recipes WHERE deleted_at IS NULL
             ORDER BY updated_at DESC LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_summary)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn count_deleted(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE deleted_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn search_title(&self, query: &str, limit: usize) -> Result<Vec<RecipeSummaryView>> {
        let pattern = format!("%{query}%");
        let mut stmt = self.conn.prepare(
            "SELECT id, title, servings, cooking_time, ingredients, deleted_at, source
             FROM recipes WHERE deleted_at IS NULL AND title LIKE ?1
             ORDER BY updated_at DESC LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![pattern, limit as i64], Self::row_to_summary)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn list_eligible(&self, owner: Option<&str>) -> Result<Vec<RecipeCard>> {
        let cards = match owner {
            Some(user_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {CARD_COLUMNS} FROM recipes
                     WHERE deleted_at IS NULL AND user_id = ?1
                     ORDER BY created_at ASC"
                ))?;
                let rows = stmt.query_map(params![user_id], Self::row_to_card)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {CARD_COLUMNS} FROM recipes
                     WHERE deleted_at IS NULL
                     ORDER BY created_at ASC"
                ))?;
                let rows = stmt.query_map([], Self::row_to_card)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        Ok(cards)
    }

    fn find_many(&self, ids: &[Uuid]) -> Result<Vec<RecipeCard>> {
        let mut cards = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(card) = self.find_by_id(id)?
                && !card.is_deleted()
            {
                cards.push(card);
            }
        }
        Ok(cards)
    }

    fn soft_delete(&self, id: &Uuid) -> Result<RecipeCard> {
        let mut card = self.fetch_card(id)?;
        if card.is_deleted() {
            return Err(LadleError::RecipeNotFound(id.to_string()));
        }

        let now = Utc::now();
        card.deleted_at = Some(now);
        card.updated_at = now;
        self.save(&card)?;
        Ok(card)
    }

    fn restore(&self, id: &Uuid) -> Result<RecipeCard> {
        let mut card = self.fetch_card(id)?;
        card.deleted_at = None;
        card.touch();
        self.save(&card)?;
        Ok(card)
    }
}
