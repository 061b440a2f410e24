//! Statement-list repository.
//!
//! A `TableSchema` describes a table by name plus the idempotent DDL that
//! creates or migrates it (`CREATE TABLE IF NOT EXISTS`, `ALTER TABLE ... ADD
//! COLUMN IF NOT EXISTS`, ...). Components that only need their table to
//! exist can register one of these instead of writing a `Repository` impl.

use async_trait::async_trait;

use crate::lifecycle::service::BoxError;
use crate::storage::database::Database;
use crate::storage::registry::Repository;

#[derive(Debug, Clone)]
pub struct TableSchema {
    table: String,
    statements: Vec<String>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            statements: Vec::new(),
        }
    }

    /// Append a statement. Statements run in the order they were added.
    pub fn statement(mut self, sql: impl Into<String>) -> Self {
        self.statements.push(sql.into());
        self
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }
}

#[async_trait]
impl Repository for TableSchema {
    fn table_name(&self) -> &str {
        &self.table
    }

    async fn initialize_storage(&self, db: &Database) -> Result<(), BoxError> {
        for (step, sql) in self.statements.iter().enumerate() {
            sqlx::query(sql)
                .execute(db.pool())
                .await
                .map_err(|e| format!("statement {} failed: {}", step, e))?;
        }
        Ok(())
    }
}
