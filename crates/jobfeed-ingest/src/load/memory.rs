// In-process table store
//
// Same transactional contract as the Postgres store: writes are staged per
// session and only published on commit. Used for `--dry-run` and in tests,
// where it can also be told to fail on connect or on a given batch.
//
// Inserts follow the table's existing columns the way Postgres does: an
// unknown column or a value type the column cannot take fails the batch,
// and columns the insert does not name are filled with nulls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::store::{StoreError, StoreResult, StoreSession, TableStore};
use super::{TableRef, WriteMode};
use crate::normalize::{Cell, ColumnDef, ColumnType};

/// Contents of one in-memory table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTable {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Cell>>,
}

type Tables = HashMap<TableRef, MemoryTable>;

/// Shared in-memory store; clones see the same tables
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    open_sessions: Arc<AtomicUsize>,
    fail_connect: Option<String>,
    fail_on_batch: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `connect` fails with `message`
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.fail_connect = Some(message.into());
        self
    }

    /// The `batch`-th insert (1-based) of each session fails
    pub fn failing_on_batch(mut self, batch: usize) -> Self {
        self.fail_on_batch = Some(batch);
        self
    }

    /// Committed contents of a table
    pub fn table(&self, table: &TableRef) -> Option<MemoryTable> {
        lock(&self.tables).ok()?.get(table).cloned()
    }

    /// Committed row count of a table
    pub fn row_count(&self, table: &TableRef) -> Option<usize> {
        self.table(table).map(|t| t.rows.len())
    }

    /// Sessions opened and not yet closed
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn connect(&self) -> StoreResult<Box<dyn StoreSession>> {
        if let Some(message) = &self.fail_connect {
            return Err(StoreError::Unavailable(message.clone()));
        }

        self.open_sessions.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemorySession {
            tables: Arc::clone(&self.tables),
            open_sessions: Arc::clone(&self.open_sessions),
            staged: HashMap::new(),
            batches: 0,
            fail_on_batch: self.fail_on_batch,
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemorySession {
    tables: Arc<Mutex<Tables>>,
    open_sessions: Arc<AtomicUsize>,
    staged: Tables,
    batches: usize,
    fail_on_batch: Option<usize>,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn prepare(
        &mut self,
        table: &TableRef,
        columns: &[ColumnDef],
        mode: WriteMode,
    ) -> StoreResult<()> {
        let existing = match mode {
            WriteMode::Replace => None,
            WriteMode::Append => lock(&self.tables)?.get(table).cloned(),
        };

        let staged = existing.unwrap_or_else(|| MemoryTable {
            columns: columns.to_vec(),
            rows: Vec::new(),
        });
        self.staged.insert(table.clone(), staged);
        Ok(())
    }

    async fn insert_batch(
        &mut self,
        table: &TableRef,
        columns: &[ColumnDef],
        rows: &[Vec<Cell>],
    ) -> StoreResult<u64> {
        self.batches += 1;
        if self.fail_on_batch == Some(self.batches) {
            return Err(StoreError::Unavailable(format!(
                "batch {} rejected",
                self.batches
            )));
        }

        let staged = self.staged.get_mut(table).ok_or_else(|| {
            StoreError::Unavailable(format!("table {} was not prepared", table))
        })?;

        let targets = columns
            .iter()
            .map(|incoming| target_column(table, staged, incoming))
            .collect::<StoreResult<Vec<_>>>()?;

        let width = staged.columns.len();
        for row in rows {
            let mut stored = vec![Cell::Null; width];
            for ((idx, target_type), cell) in targets.iter().zip(row) {
                stored[*idx] = store_cell(*target_type, cell);
            }
            staged.rows.push(stored);
        }
        Ok(rows.len() as u64)
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let mut tables = lock(&self.tables)?;
        tables.extend(self.staged.drain());
        Ok(())
    }

    async fn close(self: Box<Self>) -> StoreResult<()> {
        self.open_sessions.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Position and type of the existing column an incoming column writes to
fn target_column(
    table: &TableRef,
    staged: &MemoryTable,
    incoming: &ColumnDef,
) -> StoreResult<(usize, ColumnType)> {
    let idx = staged
        .columns
        .iter()
        .position(|c| c.name == incoming.name)
        .ok_or_else(|| {
            StoreError::Unavailable(format!(
                "column \"{}\" of relation {} does not exist",
                incoming.name, table
            ))
        })?;

    let existing = staged.columns[idx].column_type;
    if !assignable(incoming.column_type, existing) {
        return Err(StoreError::Unavailable(format!(
            "column \"{}\" is of type {} but expression is of type {}",
            incoming.name, existing, incoming.column_type
        )));
    }
    Ok((idx, existing))
}

/// Postgres assignment casts between the column types used here
fn assignable(from: ColumnType, to: ColumnType) -> bool {
    from == to
        || to == ColumnType::Text
        || matches!(
            (from, to),
            (ColumnType::Integer, ColumnType::Float) | (ColumnType::Float, ColumnType::Integer)
        )
}

fn store_cell(target: ColumnType, cell: &Cell) -> Cell {
    match (target, cell) {
        (_, Cell::Null) => Cell::Null,
        (ColumnType::Text, Cell::Text(_)) => cell.clone(),
        (ColumnType::Text, other) => other.to_text().map(Cell::Text).unwrap_or(Cell::Null),
        _ => cell.clone(),
    }
}

fn lock(tables: &Mutex<Tables>) -> StoreResult<MutexGuard<'_, Tables>> {
    tables
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
}
