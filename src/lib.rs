//! # tabsim - tabular datasets as contextual-bandit simulations
//!
//! tabsim turns labelled tables (inline rows, CSV files, OpenML datasets)
//! into reproducible contextual-bandit problems: every row becomes an
//! interaction whose context is the encoded feature vector and whose
//! actions are the dataset's distinct labels. Picking the row's own label
//! earns a reward of 1, anything else 0.
//!
//! ## Quick Start
//!
//! ```
//! use tabsim::context::ExecutionContext;
//! use tabsim::simulations::{Simulation as _, SimulationConfig};
//!
//! let config = SimulationConfig::from_json(r#"{
//!     "type": "classification",
//!     "from": {
//!         "format": "table",
//!         "table": [["a","b","c"], ["s1","2","3"], ["s2","5","6"]],
//!         "column_default": { "encoding": "factor" },
//!         "column_overrides": { "b": { "label": true, "encoding": "string" } }
//!     }
//! }"#)?;
//!
//! let simulation = config.build(&ExecutionContext::new())?;
//! assert_eq!(simulation.interactions().len(), 2);
//! # Ok::<(), tabsim::error::SimError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`preprocessing`]: encoders, column meta resolution and the table transformer
//! - [`loader`]: fetching, checksum verification and CSV parsing, plus OpenML
//! - [`simulations`]: interactions, the [`simulations::Simulation`] trait and its variants
//! - [`context`]: the cache, fetcher and policies every ingestion call runs under
//! - [`cache`]: none, in-memory and on-disk byte caches
//! - [`integrity`]: MD5/SHA-256 checksums
//! - [`config`]: persisted settings for the binary
//! - [`logging`]: subscriber setup for the binary
//! - [`error`]: error types and handling utilities
//!
//! ## Error Handling
//!
//! All fallible operations return [`error::Result`]. Configuration problems,
//! malformed tables, encoding failures and checksum mismatches are distinct
//! [`error::SimError`] variants so callers can tell "fix your config" apart
//! from "the download is broken".

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod integrity;
pub mod loader;
pub mod logging;
pub mod preprocessing;
pub mod simulations;
