//! Storage seam for the loader
//!
//! A [`TableStore`] hands out one [`StoreSession`] per load. A session is a
//! single transaction: nothing written through it is visible until
//! [`StoreSession::commit`], and [`StoreSession::close`] rolls back whatever
//! was not committed before releasing the connection.

use async_trait::async_trait;

use super::{TableRef, WriteMode};
use crate::normalize::{Cell, ColumnDef};

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Session has no open transaction")]
    NoTransaction,
}

/// Something rows can be loaded into
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Open a connection and start a transaction
    async fn connect(&self) -> StoreResult<Box<dyn StoreSession>>;

    /// Human-readable destination for logs; must not contain credentials
    fn describe(&self) -> String;
}

/// One open connection with one transaction
#[async_trait]
pub trait StoreSession: Send {
    /// Create (or drop and recreate) the destination table for `mode`
    async fn prepare(
        &mut self,
        table: &TableRef,
        columns: &[ColumnDef],
        mode: WriteMode,
    ) -> StoreResult<()>;

    /// Insert one batch of rows, returning how many were written
    async fn insert_batch(
        &mut self,
        table: &TableRef,
        columns: &[ColumnDef],
        rows: &[Vec<Cell>],
    ) -> StoreResult<u64>;

    /// Make everything written in this session durable
    async fn commit(&mut self) -> StoreResult<()>;

    /// Roll back anything uncommitted and release the connection
    async fn close(self: Box<Self>) -> StoreResult<()>;
}
