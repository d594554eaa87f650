//! Template records and batched lookup keys

use serde::{Deserialize, Serialize};

/// How a table participates in a batched read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadConsistency {
    /// Read must observe every write acknowledged before it started
    Strong,
    /// Whatever the backend offers by default (possibly eventually consistent)
    #[default]
    Default,
}

impl ReadConsistency {
    pub fn is_strong(self) -> bool {
        matches!(self, ReadConsistency::Strong)
    }
}

/// Describes how an object's data should be plotted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotTemplate {
    pub object_id: String,
    pub plot_id: String,
    /// Scopes which remote form the object's entries live in
    pub container_id: String,
}

/// Describes how a plot is visually rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualTemplate {
    pub object_id: String,
    pub visual_id: String,
    /// Must reference a `PlotTemplate::plot_id` for the same object
    pub plot_template_id: String,
    pub container_id: String,
}

/// Composite key of the plot template table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotKey {
    pub object_id: String,
    pub plot_id: String,
}

/// Composite key of the visual template table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualKey {
    pub object_id: String,
    pub visual_id: String,
}

/// A single batched read against both template tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGet {
    pub plot: PlotKey,
    pub plot_read: ReadConsistency,
    pub visual: VisualKey,
    pub visual_read: ReadConsistency,
}

impl BatchGet {
    /// Lookup for one object: plot table read strongly, visual table with defaults
    pub fn for_object(
        object_id: impl Into<String>,
        plot_id: impl Into<String>,
        visual_id: impl Into<String>,
    ) -> Self {
        let object_id = object_id.into();
        Self {
            plot: PlotKey {
                object_id: object_id.clone(),
                plot_id: plot_id.into(),
            },
            plot_read: ReadConsistency::Strong,
            visual: VisualKey {
                object_id,
                visual_id: visual_id.into(),
            },
            visual_read: ReadConsistency::Default,
        }
    }
}

/// Raw result of a batched read: zero-or-one record per table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePair {
    pub plot: Option<PlotTemplate>,
    pub visual: Option<VisualTemplate>,
}
