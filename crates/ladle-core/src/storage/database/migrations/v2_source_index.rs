use rusqlite::Connection;

use super::Migration;
use crate::error::Result;
use crate::storage::database::schema;

pub struct V2SourceIndex;

impl Migration for V2SourceIndex {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Index recipes.source for duplicate lookups by origin URL"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        schema::create_source_index(conn)?;
        Ok(())
    }
}
