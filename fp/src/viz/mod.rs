//! Visualization sessions with the actor pattern
//!
//! VizManager owns all render state and processes selector changes via
//! channels; each served page addresses its own session by id.

mod document;
mod manager;
mod messages;

pub use document::{Glyph, Source, VizDocument, Widget};
pub use manager::VizManager;
pub use messages::{BindError, FillColor, SelectorChange, SessionId, SizeBy, VizApp, VizCommand, VizResponse};
