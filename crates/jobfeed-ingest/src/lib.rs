//! Jobfeed Ingest Library
//!
//! Pulls job listings from a search API, flattens them into a typed table
//! and loads the table into PostgreSQL.
//!
//! # Modules
//!
//! - **fetch**: search API client and raw document replay
//! - **normalize**: flattening, renaming, type coercion, pruning
//! - **export**: CSV export
//! - **load**: transactional, batched table loads behind a store trait
//! - **pipeline**: one ordered run of all of the above
//!
//! # Example
//!
//! ```no_run
//! use jobfeed_ingest::load::{Loader, PgStore, TableRef, WriteMode};
//! use jobfeed_ingest::pipeline::{DocumentSource, JobPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let loader = Loader::new(PgStore::new("postgresql://localhost/jobs"));
//!     let pipeline = JobPipeline::new(
//!         DocumentSource::File("response.json".into()),
//!         loader,
//!         TableRef::named("new_linkedin_table"),
//!         WriteMode::Append,
//!     );
//!
//!     let report = pipeline.run().await?;
//!     println!("{} rows, loaded: {}", report.rows, report.loaded());
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod export;
pub mod fetch;
pub mod load;
pub mod normalize;
pub mod pipeline;

pub use config::Config;
pub use load::{LoadError, LoadResult, Loader, TableRef, WriteMode};
pub use normalize::{normalize, NormalizedTable, Normalizer};
pub use pipeline::{DocumentSource, JobPipeline, PipelineError, PipelineReport};
