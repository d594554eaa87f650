//! TemplateStore - plot and visual template records
//!
//! Stores the two linked configuration records that drive a visualization:
//! a plot template (which remote container holds an object's data) and a
//! visual template (how that plot is rendered). Lookups are batched: one call
//! reads both tables for an object in a single read transaction.
//!
//! # Example
//!
//! ```ignore
//! use templatestore::{BatchGet, TemplateStore};
//!
//! let mut store = TemplateStore::open("templates.db")?;
//! let pair = store.batch_get(&BatchGet::for_object("form-7", "plot-1", "visual-1"))?;
//! ```

pub mod cli;
pub mod config;
mod record;
mod store;

pub use record::{BatchGet, PlotKey, PlotTemplate, ReadConsistency, TemplatePair, VisualKey, VisualTemplate};
pub use store::{StoreError, TemplateStore};

/// Default database file name inside the data directory
pub const DEFAULT_DB_NAME: &str = "templates.db";
