mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{Migration, get_applied_versions, run_migrations};
pub use schema::{SCHEMA_VERSION, apply_pragmas};

use std::path::Path;

use uuid::Uuid;

use crate::error::{LadleError, Result};
use crate::models::{RecipeCard, RecipeSummaryView};
use crate::storage::RecipeStore;
use crate::storage::repositories::{RecipeRepository, Repository, SqliteRecipeRepository};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    fn repo(&self) -> SqliteRecipeRepository<'_> {
        SqliteRecipeRepository::new(self.pool.get_connection())
    }

    pub fn upsert_recipe(&self, card: &RecipeCard) -> Result<()> {
        self.repo().save(card)
    }

    pub fn get_recipe(&self, id: &str) -> Result<RecipeCard> {
        let uuid = Uuid::parse_str(id).map_err(|_| LadleError::RecipeNotFound(id.to_string()))?;
        self.repo()
            .find_by_id(&uuid)?
            .ok_or_else(|| LadleError::RecipeNotFound(id.to_string()))
    }

    pub fn list_recipes(&self, limit: usize, offset: usize) -> Result<Vec<RecipeSummaryView>> {
        self.repo().list(limit, offset)
    }

    pub fn count_recipes(&self) -> Result<usize> {
        self.repo().count()
    }

    pub fn count_deleted_recipes(&self) -> Result<usize> {
        self.repo().count_deleted()
    }

    pub fn search_recipes(&self, query: &str, limit: usize) -> Result<Vec<RecipeSummaryView>> {
        self.repo().search_title(query, limit)
    }

    pub fn soft_delete_recipe(&self, id: &str) -> Result<RecipeCard> {
        let uuid = Uuid::parse_str(id).map_err(|_| LadleError::RecipeNotFound(id.to_string()))?;
        self.repo().soft_delete(&uuid)
    }

    pub fn restore_recipe(&self, id: &str) -> Result<RecipeCard> {
        let uuid = Uuid::parse_str(id).map_err(|_| LadleError::RecipeNotFound(id.to_string()))?;
        self.repo().restore(&uuid)
    }

    pub fn purge_recipe(&self, id: &str) -> Result<()> {
        let uuid = Uuid::parse_str(id).map_err(|_| LadleError::RecipeNotFound(id.to_string()))?;
        if !self.repo().delete(&uuid)? {
            return Err(LadleError::RecipeNotFound(id.to_string()));
        }
        Ok(())
    }
}

impl RecipeStore for Database {
    fn fetch_eligible(&self, owner: Option<&str>) -> Result<Vec<RecipeCard>> {
        self.repo().list_eligible(owner)
    }

    fn resolve_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RecipeCard>> {
        self.repo().find_many(ids)
    }

    fn soft_delete(&self, id: &Uuid) -> Result<RecipeCard> {
        self.repo().soft_delete(id)
    }
}
