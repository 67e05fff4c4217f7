// Job Listing Loader
//
// Writes a normalized table into a relational store:
// - Connect: one session (connection + transaction) per load
// - Prepare: drop/recreate (replace) or create-if-missing (append)
// - Write: rows in fixed-size batches
// - Commit, then Close; Close runs whether or not the write succeeded
//
// Failures are logged with the destination table and returned as LoadError.
// Nothing here retries.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::{MemoryStore, MemoryTable};
pub use postgres::PgStore;
pub use store::{StoreError, StoreResult, StoreSession, TableStore};

use jobfeed_common::JobfeedError;
use std::sync::Arc;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, info_span, warn, Dispatch, Instrument};

use crate::normalize::NormalizedTable;

/// Rows submitted to the store per batch
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default namespace for destination tables
pub const DEFAULT_SCHEMA: &str = "public";

/// Destination table, qualified by schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Table in [`DEFAULT_SCHEMA`]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(DEFAULT_SCHEMA, name)
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

impl std::str::FromStr for TableRef {
    type Err = JobfeedError;

    /// Accepts `name` or `schema.name`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || JobfeedError::invalid_setting("table", s);
        match s.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => {
                Ok(Self::new(schema, name))
            },
            Some(_) => Err(invalid()),
            None if !s.is_empty() => Ok(Self::named(s)),
            None => Err(invalid()),
        }
    }
}

/// What happens to existing rows in the destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Drop and recreate the table, then write
    Replace,
    /// Insert into the table, creating it if absent
    #[default]
    Append,
}

impl std::str::FromStr for WriteMode {
    type Err = JobfeedError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(WriteMode::Replace),
            "append" => Ok(WriteMode::Append),
            _ => Err(JobfeedError::invalid_setting("write mode", s)),
        }
    }
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Replace => write!(f, "replace"),
            WriteMode::Append => write!(f, "append"),
        }
    }
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub rows_written: u64,
    pub table: TableRef,
    pub mode: WriteMode,
}

/// Result type for loads
pub type Result<T> = std::result::Result<T, LoadError>;

/// A load that did not commit
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to connect to the database for {table}: {source}")]
    Connect { table: TableRef, source: StoreError },

    #[error("Failed to prepare table {table}: {source}")]
    Prepare { table: TableRef, source: StoreError },

    #[error("Failed to write batch {batch} to {table}: {source}")]
    Write {
        table: TableRef,
        batch: usize,
        source: StoreError,
    },

    #[error("Failed to commit rows to {table}: {source}")]
    Commit { table: TableRef, source: StoreError },
}

impl LoadError {
    /// Destination the failed load was aimed at
    pub fn table(&self) -> &TableRef {
        match self {
            LoadError::Connect { table, .. }
            | LoadError::Prepare { table, .. }
            | LoadError::Write { table, .. }
            | LoadError::Commit { table, .. } => table,
        }
    }
}

/// Writes normalized tables into a [`TableStore`]
pub struct Loader {
    store: Arc<dyn TableStore>,
    chunk_size: usize,
    dispatch: Dispatch,
}

impl Loader {
    /// Loader with the default chunk size, logging to the current subscriber
    pub fn new(store: impl TableStore + 'static) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
        }
    }

    /// Rows per batch; zero is treated as one
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Send this loader's log events to `dispatch`
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Write `table` to `destination` under `mode`.
    ///
    /// The connection is always closed before this returns. Failures are
    /// logged here and returned; they never panic.
    pub async fn load(
        &self,
        table: &NormalizedTable,
        destination: &TableRef,
        mode: WriteMode,
    ) -> Result<LoadResult> {
        let dispatch = self.dispatch.clone();

        async move {
            let span = info_span!("load", table = %destination, %mode);
            let outcome = self
                .connect_and_write(table, destination, mode)
                .instrument(span.clone())
                .await;

            span.in_scope(|| match &outcome {
                Ok(result) => info!(
                    rows_written = result.rows_written,
                    "Data uploaded successfully to {}", destination
                ),
                Err(e) => error!(table = %destination, error = %e, "Error uploading data"),
            });
            outcome
        }
        .with_subscriber(dispatch)
        .await
    }

    async fn connect_and_write(
        &self,
        table: &NormalizedTable,
        destination: &TableRef,
        mode: WriteMode,
    ) -> Result<LoadResult> {
        info!(database = %self.store.describe(), "Attempting to connect to the database for uploading data");

        let mut session = self.store.connect().await.map_err(|source| LoadError::Connect {
            table: destination.clone(),
            source,
        })?;

        let written = self.write(session.as_mut(), table, destination, mode).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close database connection cleanly");
        }

        Ok(LoadResult {
            rows_written: written?,
            table: destination.clone(),
            mode,
        })
    }

    async fn write(
        &self,
        session: &mut dyn StoreSession,
        table: &NormalizedTable,
        destination: &TableRef,
        mode: WriteMode,
    ) -> Result<u64> {
        let columns = table.schema();

        info!(rows = table.row_count(), columns = columns.len(), "Uploading data to table: {}", destination);

        session
            .prepare(destination, &columns, mode)
            .await
            .map_err(|source| LoadError::Prepare {
                table: destination.clone(),
                source,
            })?;

        let total_batches = table.row_count().div_ceil(self.chunk_size);
        let mut written = 0;

        for (idx, batch) in table.rows().chunks(self.chunk_size).enumerate() {
            debug!(batch = idx + 1, total_batches, rows = batch.len(), "Writing batch");

            written += session
                .insert_batch(destination, &columns, batch)
                .await
                .map_err(|source| LoadError::Write {
                    table: destination.clone(),
                    batch: idx + 1,
                    source,
                })?;
        }

        session.commit().await.map_err(|source| LoadError::Commit {
            table: destination.clone(),
            source,
        })?;

        Ok(written)
    }
}
