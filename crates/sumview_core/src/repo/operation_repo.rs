//! Operation repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `operations` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `get_operation` folds missing rows to `Ok(None)`.
//! - Mutating a missing row is reported as `RepoError::NotFound`.

use crate::db::DbError;
use crate::model::operation::{Operation, OperationId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const OPERATION_SELECT_SQL: &str = "SELECT id, operand_a, operand_b FROM operations";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for operation persistence and query paths.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(OperationId),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "operation not found: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for operation record access.
///
/// Writes exist for seeding and out-of-band administration; the reactive
/// binding layer only ever reads.
pub trait OperationRepository {
    /// Inserts a record with explicit operands; storage assigns the id.
    fn insert_operation(&self, operand_a: i64, operand_b: i64) -> RepoResult<OperationId>;
    /// Overwrites the operands of an existing record.
    fn update_operation(&self, operation: &Operation) -> RepoResult<()>;
    /// Reads one record by id; absent ids are `Ok(None)`.
    fn get_operation(&self, id: OperationId) -> RepoResult<Option<Operation>>;
    /// Lists all records ordered by id.
    fn list_operations(&self) -> RepoResult<Vec<Operation>>;
    /// Removes one record by id.
    fn delete_operation(&self, id: OperationId) -> RepoResult<()>;
}

/// SQLite-backed operation repository.
pub struct SqliteOperationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOperationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OperationRepository for SqliteOperationRepository<'_> {
    fn insert_operation(&self, operand_a: i64, operand_b: i64) -> RepoResult<OperationId> {
        self.conn.execute(
            "INSERT INTO operations (operand_a, operand_b) VALUES (?1, ?2);",
            params![operand_a, operand_b],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_operation(&self, operation: &Operation) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE operations SET operand_a = ?1, operand_b = ?2 WHERE id = ?3;",
            params![operation.operand_a, operation.operand_b, operation.id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(operation.id));
        }

        Ok(())
    }

    fn get_operation(&self, id: OperationId) -> RepoResult<Option<Operation>> {
        let operation = self
            .conn
            .query_row(
                &format!("{OPERATION_SELECT_SQL} WHERE id = ?1;"),
                params![id],
                parse_operation_row,
            )
            .optional()?;

        Ok(operation)
    }

    fn list_operations(&self) -> RepoResult<Vec<Operation>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OPERATION_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut operations = Vec::new();

        while let Some(row) = rows.next()? {
            operations.push(parse_operation_row(row)?);
        }

        Ok(operations)
    }

    fn delete_operation(&self, id: OperationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM operations WHERE id = ?1;", params![id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_operation_row(row: &Row<'_>) -> rusqlite::Result<Operation> {
    Ok(Operation {
        id: row.get("id")?,
        operand_a: row.get("operand_a")?,
        operand_b: row.get("operand_b")?,
    })
}
