//! Visualization manager messages
//!
//! Commands, selector changes and errors for the session actor.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::document::VizDocument;
use crate::dataset::{AssemblyError, Dataset};

/// Identifies one served page's render state; time-ordered
pub type SessionId = Uuid;

/// Errors from binding data to a session or changing its state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("Dataset has no column '{column}'")]
    MissingColumn { column: String },

    #[error("Column '{column}' is not numeric")]
    NotNumeric { column: String },

    #[error("Selector '{selector}' is not available on {app} sessions")]
    UnsupportedSelector { selector: String, app: &'static str },

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: f64, end: f64 },

    #[error(transparent)]
    Dataset(AssemblyError),

    #[error("Visualization worker is not running")]
    ChannelError,
}

impl From<AssemblyError> for BindError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::NotNumeric { column } => BindError::NotNumeric { column },
            AssemblyError::MissingColumn { column } => BindError::MissingColumn { column },
            other => BindError::Dataset(other),
        }
    }
}

/// Response from visualization operations
pub type VizResponse<T> = Result<T, BindError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillColor {
    #[default]
    Red,
    Green,
}

impl FillColor {
    pub fn as_str(self) -> &'static str {
        match self {
            FillColor::Red => "red",
            FillColor::Green => "green",
        }
    }
}

/// Which numeric column drives point size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBy {
    #[default]
    U,
    V,
}

impl SizeBy {
    pub fn column(self) -> &'static str {
        match self {
            SizeBy::U => "u",
            SizeBy::V => "v",
        }
    }
}

/// A widget value change sent from a page
///
/// Wire form: `{"selector": "fill_color", "value": "green"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "selector", content = "value", rename_all = "snake_case")]
pub enum SelectorChange {
    FillColor(FillColor),
    SizeBy(SizeBy),
    Range((f64, f64)),
}

impl SelectorChange {
    pub fn name(&self) -> &'static str {
        match self {
            SelectorChange::FillColor(_) => "fill_color",
            SelectorChange::SizeBy(_) => "size_by",
            SelectorChange::Range(_) => "range",
        }
    }
}

/// What a new session renders
#[derive(Debug, Clone)]
pub enum VizApp {
    /// Points at (`x`, `y`) sized by `u` or `v`
    Scatter { dataset: Dataset },
    /// Row counts stacked by `color` per `group`, filterable on a numeric column
    Bar {
        dataset: Dataset,
        group: String,
        color: String,
        filter_column: String,
    },
}

impl VizApp {
    pub fn name(&self) -> &'static str {
        match self {
            VizApp::Scatter { .. } => "scatter",
            VizApp::Bar { .. } => "bar",
        }
    }
}

/// Commands sent to the VizManager actor
#[derive(Debug)]
pub enum VizCommand {
    Open {
        app: VizApp,
        reply: oneshot::Sender<VizResponse<(SessionId, VizDocument)>>,
    },
    Render {
        id: SessionId,
        reply: oneshot::Sender<VizResponse<VizDocument>>,
    },
    Select {
        id: SessionId,
        change: SelectorChange,
        reply: oneshot::Sender<VizResponse<VizDocument>>,
    },
    Close {
        id: SessionId,
        reply: oneshot::Sender<VizResponse<()>>,
    },
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_wire_format() {
        let change: SelectorChange = serde_json::from_value(json!({"selector": "fill_color", "value": "green"})).unwrap();
        assert_eq!(change, SelectorChange::FillColor(FillColor::Green));

        let change: SelectorChange = serde_json::from_value(json!({"selector": "size_by", "value": "v"})).unwrap();
        assert_eq!(change, SelectorChange::SizeBy(SizeBy::V));

        let change: SelectorChange = serde_json::from_value(json!({"selector": "range", "value": [2, 8.5]})).unwrap();
        assert_eq!(change, SelectorChange::Range((2.0, 8.5)));
    }

    #[test]
    fn test_unknown_selector_values_rejected() {
        assert!(serde_json::from_value::<SelectorChange>(json!({"selector": "fill_color", "value": "blue"})).is_err());
        assert!(serde_json::from_value::<SelectorChange>(json!({"selector": "zoom", "value": 2})).is_err());
    }
}
