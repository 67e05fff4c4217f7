//! jobfeed common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
//!
//! Shared error handling and logging setup for the jobfeed workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the workspace-wide [`JobfeedError`] and [`Result`] alias
//! - **Logging**: console/file tracing configuration with an explicit flush guard
//!
//! # Example
//!
//! ```no_run
//! use jobfeed_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("Script started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{JobfeedError, Result};
