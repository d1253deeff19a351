pub mod memory;
pub mod model;
pub mod postgres;

use async_trait::async_trait;
use std::fmt::{Debug, Display};

pub use memory::MemorySession;
pub use model::{AttrDef, TableDef, TupleValue};
pub use postgres::PostgresSession;

pub enum DestinationError {
    SchemaNotFound(String),
    TableNotFound(String),
    InvalidConnection(String),
    SyntaxError(String),
    ExecError(String),
    IoError(std::io::Error),
}

impl Display for DestinationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DestinationError::SchemaNotFound(name) => {
                write!(f, "no valid schema found for '{}'", name)
            }
            DestinationError::TableNotFound(name) => {
                write!(f, "no valid table found for '{}'", name)
            }
            DestinationError::InvalidConnection(err) => {
                write!(f, "invalid connection details: {}", err)
            }
            DestinationError::SyntaxError(err) => {
                write!(f, "syntax error: {}", err)
            }
            DestinationError::ExecError(err) => {
                write!(f, "execution failed: {}", err)
            }
            DestinationError::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl Debug for DestinationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for DestinationError {}

impl From<std::io::Error> for DestinationError {
    fn from(err: std::io::Error) -> Self {
        DestinationError::IoError(err)
    }
}

/// The minimal capability set the applier needs from the destination:
/// utility SQL and DML inside the ambient transaction, catalog lookups,
/// tuple-level writes, and transaction control.
#[async_trait]
pub trait DestinationSession: Send {
    /// Execute a utility statement (DDL, catalog maintenance).
    async fn exec_utility(&mut self, sql: &str) -> Result<(), DestinationError>;

    /// Execute parameterless DML, returning the affected row count.
    async fn exec_dml(&mut self, sql: &str) -> Result<u64, DestinationError>;

    /// Look up a table and copy its descriptor.
    async fn lookup_table(&mut self, schema: &str, table: &str)
        -> Result<TableDef, DestinationError>;

    /// Tuple-level insert of one row. Values are ordered by attribute
    /// position.
    async fn tuple_insert(
        &mut self,
        table: &TableDef,
        row: &[TupleValue],
    ) -> Result<u64, DestinationError>;

    /// Tuple-level update; `old` identifies the row by its key columns.
    async fn tuple_update(
        &mut self,
        table: &TableDef,
        old: &[TupleValue],
        new: &[TupleValue],
    ) -> Result<u64, DestinationError>;

    /// Tuple-level delete; `old` identifies the row by its key columns.
    async fn tuple_delete(
        &mut self,
        table: &TableDef,
        old: &[TupleValue],
    ) -> Result<u64, DestinationError>;

    async fn begin(&mut self) -> Result<(), DestinationError>;
    async fn commit(&mut self) -> Result<(), DestinationError>;
    async fn rollback(&mut self) -> Result<(), DestinationError>;
}
