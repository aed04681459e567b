//! Docload Library
//!
//! Bulk loader for newline-delimited JSON datasets targeting rate-limited,
//! MongoDB-compatible document stores (Azure Cosmos DB's MongoDB API in
//! production).
//!
//! # Pipeline
//!
//! - **decode**: one JSON object per input line, all-or-nothing, with a
//!   sibling `*_array.json` artifact
//! - **batch**: fixed-size, order-preserving partition of the decoded records
//! - **ingest**: per-batch insertion with duplicate-key tolerance and linear
//!   backoff under throttling
//! - **loader**: sequential orchestration across collection targets
//!
//! # Example
//!
//! ```no_run
//! use docload::config::LoaderConfig;
//! use docload::loader::{self, LoadOptions};
//! use docload::store::mongo::MongoStore;
//! use docload::types::CollectionTarget;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = LoaderConfig::from_env()?;
//!     config.set_uri("mongodb://localhost:27017/sample_mflix".to_string());
//!     config.validate()?;
//!
//!     let store = MongoStore::connect(&config).await?;
//!     let targets =
//!         vec![CollectionTarget::parse("movies", Path::new("./data"), config.batch_size)?];
//!
//!     let report = loader::run(&store, &targets, &LoadOptions::default()).await?;
//!     println!("{} documents inserted", report.total_inserted());
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod decode;
pub mod error;
pub mod ingest;
pub mod loader;
pub mod progress;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{LoadError, Result};
