//! Loader integration tests against the in-memory store
//!
//! Cover write modes, batching, rollback on a failed batch, and the
//! logged-but-returned handling of an unreachable store.

mod common;

use common::{sample_document, CapturedLogs};
use jobfeed_ingest::load::{LoadError, Loader, MemoryStore, TableRef, WriteMode};
use jobfeed_ingest::normalize::{normalize, Cell, NormalizedTable};
use serde_json::json;

fn jobs() -> TableRef {
    TableRef::new("public", "jobs")
}

fn numbered_rows(n: i64) -> NormalizedTable {
    NormalizedTable::from_rows(
        vec!["JobTitle".into(), "CompanyId".into()],
        (0..n)
            .map(|i| vec![Cell::Text(format!("job {}", i)), Cell::Integer(i)])
            .collect(),
    )
}

// ============================================================================
// Write modes
// ============================================================================

#[tokio::test]
async fn test_append_twice_doubles_rows() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone());
    let table = normalize(sample_document()).unwrap();

    loader.load(&table, &jobs(), WriteMode::Append).await.unwrap();
    loader.load(&table, &jobs(), WriteMode::Append).await.unwrap();

    assert_eq!(store.row_count(&jobs()), Some(2 * table.row_count()));
}

#[tokio::test]
async fn test_replace_is_idempotent() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone());
    let table = normalize(sample_document()).unwrap();

    for _ in 0..3 {
        let result = loader.load(&table, &jobs(), WriteMode::Replace).await.unwrap();
        assert_eq!(result.rows_written, table.row_count() as u64);
    }

    assert_eq!(store.row_count(&jobs()), Some(table.row_count()));
}

#[tokio::test]
async fn test_replace_after_append_discards_old_rows() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone());

    loader.load(&numbered_rows(7), &jobs(), WriteMode::Append).await.unwrap();
    loader.load(&numbered_rows(2), &jobs(), WriteMode::Replace).await.unwrap();

    assert_eq!(store.row_count(&jobs()), Some(2));
}

#[tokio::test]
async fn test_tables_are_kept_apart() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone());
    let staging = TableRef::new("staging", "jobs");

    loader.load(&numbered_rows(3), &jobs(), WriteMode::Append).await.unwrap();
    loader.load(&numbered_rows(1), &staging, WriteMode::Append).await.unwrap();

    assert_eq!(store.row_count(&jobs()), Some(3));
    assert_eq!(store.row_count(&staging), Some(1));
}

#[tokio::test]
async fn test_empty_table_creates_empty_destination() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone());

    let result = loader
        .load(&numbered_rows(0), &jobs(), WriteMode::Replace)
        .await
        .unwrap();

    assert_eq!(result.rows_written, 0);
    assert_eq!(store.row_count(&jobs()), Some(0));
}

#[tokio::test]
async fn test_append_run_with_unparsable_numbers_after_real_ones() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone());

    let priced = normalize(json!({
        "response": [{"title": "a", "salaryInsights": "85000", "applicants": 3, "listedAt": "2024-05-01 10:00:00"}]
    }))
    .unwrap();
    let unpriced = normalize(json!({
        "response": [{"title": "b", "salaryInsights": "n/a", "applicants": "n/a", "listedAt": "soon"}]
    }))
    .unwrap();

    loader.load(&priced, &jobs(), WriteMode::Append).await.unwrap();
    loader.load(&unpriced, &jobs(), WriteMode::Append).await.unwrap();

    assert_eq!(store.row_count(&jobs()), Some(2));
}

#[tokio::test]
async fn test_append_with_incompatible_column_type_fails() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone());
    let numbers = NormalizedTable::from_rows(vec!["Score".into()], vec![vec![Cell::Float(1.5)]]);
    let words = NormalizedTable::from_rows(vec!["Score".into()], vec![vec![Cell::Text("high".into())]]);

    loader.load(&numbers, &jobs(), WriteMode::Append).await.unwrap();
    let result = loader.load(&words, &jobs(), WriteMode::Append).await;

    assert!(matches!(result, Err(LoadError::Write { batch: 1, .. })));
    assert_eq!(store.row_count(&jobs()), Some(1));
    assert_eq!(store.open_sessions(), 0);
}

// ============================================================================
// Batching
// ============================================================================

#[tokio::test]
async fn test_rows_are_written_in_chunks() {
    let store = MemoryStore::new();
    let loader = Loader::new(store.clone()).with_chunk_size(2);

    let result = loader
        .load(&numbered_rows(5), &jobs(), WriteMode::Replace)
        .await
        .unwrap();

    assert_eq!(result.rows_written, 5);
    assert_eq!(result.table, jobs());
    assert_eq!(result.mode, WriteMode::Replace);

    let stored = store.table(&jobs()).unwrap();
    let ids: Vec<_> = stored.rows.iter().map(|r| r[1].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_failed_batch_rolls_back_everything() {
    let store = MemoryStore::new();
    Loader::new(store.clone())
        .load(&numbered_rows(3), &jobs(), WriteMode::Append)
        .await
        .unwrap();

    let failing = store.clone().failing_on_batch(2);
    let result = Loader::new(failing)
        .with_chunk_size(2)
        .load(&numbered_rows(5), &jobs(), WriteMode::Replace)
        .await;

    match result {
        Err(LoadError::Write { batch, table, .. }) => {
            assert_eq!(batch, 2);
            assert_eq!(table, jobs());
        },
        other => panic!("expected a write error, got {:?}", other),
    }

    // The replace never committed, so the earlier rows survive untouched.
    assert_eq!(store.row_count(&jobs()), Some(3));
    assert_eq!(store.open_sessions(), 0);
}

// ============================================================================
// Unreachable store
// ============================================================================

#[tokio::test]
async fn test_connect_failure_is_returned_and_logged() {
    let logs = CapturedLogs::default();
    let store = MemoryStore::new().failing_connect("connection refused");
    let loader = Loader::new(store.clone()).with_dispatch(logs.dispatch());
    let table = normalize(sample_document()).unwrap();

    let result = loader.load(&table, &jobs(), WriteMode::Append).await;

    let err = result.unwrap_err();
    assert!(matches!(err, LoadError::Connect { .. }));
    assert_eq!(err.table(), &jobs());
    assert!(err.to_string().contains("connection refused"));

    let output = logs.contents();
    assert!(output.contains("ERROR"), "missing error event: {}", output);
    assert!(output.contains("Error uploading data"));
    assert!(output.contains("public.jobs"));
    assert!(output.contains("connection refused"));

    assert_eq!(store.open_sessions(), 0);
    assert_eq!(store.row_count(&jobs()), None);
}

#[tokio::test]
async fn test_successful_load_is_logged() {
    let logs = CapturedLogs::default();
    let loader = Loader::new(MemoryStore::new()).with_dispatch(logs.dispatch());

    loader
        .load(&numbered_rows(4), &jobs(), WriteMode::Replace)
        .await
        .unwrap();

    let output = logs.contents();
    assert!(output.contains("Data uploaded successfully to public.jobs"));
    assert!(output.contains("rows_written=4"));
}
