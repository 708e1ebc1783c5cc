pub mod config;
pub mod error;
pub mod models;
pub mod storage;

pub use config::{AppConfig, CoreConfig, DedupConfig};
pub use error::{ExitCode, LadleError, Result};
pub use models::*;

pub use storage::RecipeStore;
pub use storage::database::{ConnectionPool, Database, open_database, open_in_memory};
pub use storage::repositories::{RecipeRepository, Repository, SqliteRecipeRepository};
