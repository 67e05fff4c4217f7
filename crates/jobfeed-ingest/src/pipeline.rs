// Job Listing Pipeline Orchestration
//
// One run, strictly in order:
// - Retrieve the raw document (API or saved file), optionally keep a copy
// - Normalize it into a table
// - Optionally export the table to CSV
// - Load the table into the store
//
// Retrieval, schema and export failures abort the run before anything is
// written. A load failure does not: it is logged by the loader and carried
// back in the report.

use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::export::{self, ExportError};
use crate::fetch::{self, FetchError, Fetcher};
use crate::load::{LoadError, LoadResult, Loader, TableRef, WriteMode};
use crate::normalize::{Normalizer, SchemaError};

/// Result type for pipeline runs
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures that stop a run before the load step
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to retrieve job listings: {0}")]
    Fetch(#[from] FetchError),

    #[error("Unexpected response shape: {0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to export CSV: {0}")]
    Export(#[from] ExportError),
}

/// Where the raw document comes from
pub enum DocumentSource {
    /// Live search API request
    Api(Fetcher),
    /// Previously saved response
    File(PathBuf),
}

impl DocumentSource {
    async fn retrieve(&self) -> fetch::Result<Value> {
        match self {
            DocumentSource::Api(fetcher) => fetcher.fetch().await,
            DocumentSource::File(path) => fetch::read_document(path).await,
        }
    }
}

/// Summary of a completed run
#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub rows: usize,
    pub columns: usize,
    /// Rows written to CSV, when an export was requested
    pub exported: Option<usize>,
    pub load: std::result::Result<LoadResult, LoadError>,
}

impl PipelineReport {
    pub fn loaded(&self) -> bool {
        self.load.is_ok()
    }
}

/// Fetch, normalize, export and load job listings
pub struct JobPipeline {
    source: DocumentSource,
    normalizer: Normalizer,
    loader: Loader,
    destination: TableRef,
    mode: WriteMode,
    export_path: Option<PathBuf>,
    raw_copy_path: Option<PathBuf>,
}

impl JobPipeline {
    pub fn new(
        source: DocumentSource,
        loader: Loader,
        destination: TableRef,
        mode: WriteMode,
    ) -> Self {
        Self {
            source,
            normalizer: Normalizer::default(),
            loader,
            destination,
            mode,
            export_path: None,
            raw_copy_path: None,
        }
    }

    /// Also write the normalized table to `path` as CSV
    pub fn with_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    /// Keep a copy of the raw document at `path`
    pub fn with_raw_copy(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw_copy_path = Some(path.into());
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Run the pipeline once
    pub async fn run(&self) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", %run_id);

        async {
            info!(destination = %self.destination, mode = %self.mode, "Pipeline started");

            let outcome = self.execute(run_id).await;
            match &outcome {
                Ok(report) => info!(rows = report.rows, loaded = report.loaded(), "Pipeline finished"),
                Err(e) => error!(error = %e, "Pipeline aborted before load"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, run_id: Uuid) -> Result<PipelineReport> {
        let document = self.source.retrieve().await?;

        if let Some(path) = &self.raw_copy_path {
            fetch::save_document(&document, path).await?;
        }

        let table = self.normalizer.normalize(document)?;

        let exported = match &self.export_path {
            Some(path) => Some(export::write_csv(&table, path)?),
            None => None,
        };

        let load = self.loader.load(&table, &self.destination, self.mode).await;

        Ok(PipelineReport {
            run_id,
            rows: table.row_count(),
            columns: table.column_count(),
            exported,
            load,
        })
    }
}
