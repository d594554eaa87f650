//! formplot - template-driven form data visualization
//!
//! A request names an object and the two templates that describe how to plot
//! it. formplot reads both templates in one batched lookup, checks they agree,
//! exchanges the caller's client credentials for a bearer token, fetches the
//! object's form entries, assembles them into a typed column table and binds
//! that table to an interactive visualization session.
//!
//! # Modules
//!
//! - [`repository`] - Template lookups against SQLite or a document-store gateway
//! - [`validate`] - Plot/visual template cross-validation
//! - [`auth`] - OAuth client-credentials exchange
//! - [`entity`] - Remote form entries fetcher
//! - [`dataset`] - Tabular assembly and cross-tabulation
//! - [`pipeline`] - The stages above, in order, with status classification
//! - [`viz`] - Session actor owning render state
//! - [`server`] - HTTP routes
//! - [`config`] - Configuration types and loading

pub mod auth;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod dataset;
pub mod entity;
pub mod fixtures;
pub mod palette;
pub mod pipeline;
pub mod repository;
pub mod server;
pub mod validate;
pub mod viz;

pub use config::Config;
pub use dataset::{AssemblyError, Dataset, FieldSchema, FieldSpec, NumericContract, assemble, assemble_with};
pub use pipeline::{Pipeline, PipelineError, PipelineRequest, StatusClass};
pub use viz::{SelectorChange, VizApp, VizManager};
