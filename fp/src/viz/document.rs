//! Session render state and the documents rendered from it

use serde::Serialize;
use tracing::debug;

use super::messages::{BindError, FillColor, SelectorChange, SessionId, SizeBy, VizApp};
use crate::dataset::{Crosstab, Dataset, RangeFilter, crosstab};
use crate::palette::palette_for;

const SCATTER_COLUMNS: [&str; 4] = ["x", "y", "u", "v"];

const SLIDER_START: f64 = 0.0;
const SLIDER_END: f64 = 10.0;
const SLIDER_STEP: f64 = 0.1;
const SLIDER_VALUE: (f64, f64) = (1.0, 9.0);

/// Data backing the rendered glyphs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Source {
    Table(Dataset),
    Stacks(Crosstab),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Glyph {
    Circle {
        x: String,
        y: String,
        size: String,
        fill_color: FillColor,
        line_color: Option<String>,
    },
    #[serde(rename = "vbar_stack")]
    VBarStack {
        x: String,
        stackers: Vec<String>,
        colors: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Select {
        selector: String,
        title: String,
        options: Vec<String>,
        value: String,
    },
    RangeSlider {
        selector: String,
        title: String,
        start: f64,
        end: f64,
        step: f64,
        value: (f64, f64),
    },
}

/// Everything a page needs to draw one session's current state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VizDocument {
    pub session_id: SessionId,
    pub app: &'static str,
    pub source: Source,
    pub glyph: Glyph,
    pub widgets: Vec<Widget>,
}

/// Render state owned by the manager, one per session
#[derive(Debug)]
pub(crate) enum Session {
    Scatter {
        dataset: Dataset,
        fill_color: FillColor,
        size_by: SizeBy,
    },
    Bar {
        dataset: Dataset,
        group: String,
        color: String,
        filter_column: String,
        range: Option<(f64, f64)>,
    },
}

impl Session {
    /// Bind a dataset, checking the columns the app draws from
    pub(crate) fn open(app: VizApp) -> Result<Self, BindError> {
        debug!(app = app.name(), "Session::open: called");
        match app {
            VizApp::Scatter { dataset } => {
                for column in SCATTER_COLUMNS {
                    if dataset.column(column).is_none() {
                        return Err(BindError::MissingColumn {
                            column: column.to_string(),
                        });
                    }
                }
                for size in [SizeBy::U, SizeBy::V] {
                    if !dataset.is_numeric(size.column()) {
                        return Err(BindError::NotNumeric {
                            column: size.column().to_string(),
                        });
                    }
                }
                Ok(Session::Scatter {
                    dataset,
                    fill_color: FillColor::default(),
                    size_by: SizeBy::default(),
                })
            }
            VizApp::Bar {
                dataset,
                group,
                color,
                filter_column,
            } => {
                for column in [&group, &color, &filter_column] {
                    if dataset.column(column).is_none() {
                        return Err(BindError::MissingColumn { column: column.clone() });
                    }
                }
                if !dataset.is_numeric(&filter_column) {
                    return Err(BindError::NotNumeric { column: filter_column });
                }
                Ok(Session::Bar {
                    dataset,
                    group,
                    color,
                    filter_column,
                    range: None,
                })
            }
        }
    }

    fn app(&self) -> &'static str {
        match self {
            Session::Scatter { .. } => "scatter",
            Session::Bar { .. } => "bar",
        }
    }

    /// Apply a widget change to this session only
    pub(crate) fn apply(&mut self, change: SelectorChange) -> Result<(), BindError> {
        debug!(app = self.app(), ?change, "Session::apply: called");
        match (self, change) {
            (Session::Scatter { fill_color, .. }, SelectorChange::FillColor(value)) => *fill_color = value,
            (Session::Scatter { size_by, .. }, SelectorChange::SizeBy(value)) => *size_by = value,
            (Session::Bar { range, .. }, SelectorChange::Range((start, end))) => {
                if !(start.is_finite() && end.is_finite()) || start > end {
                    return Err(BindError::InvalidRange { start, end });
                }
                *range = Some((start, end));
            }
            (session, change) => {
                return Err(BindError::UnsupportedSelector {
                    selector: change.name().to_string(),
                    app: session.app(),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn render(&self, session_id: SessionId) -> Result<VizDocument, BindError> {
        match self {
            Session::Scatter {
                dataset,
                fill_color,
                size_by,
            } => Ok(VizDocument {
                session_id,
                app: self.app(),
                source: Source::Table(dataset.clone()),
                glyph: Glyph::Circle {
                    x: "x".to_string(),
                    y: "y".to_string(),
                    size: size_by.column().to_string(),
                    fill_color: *fill_color,
                    line_color: None,
                },
                widgets: vec![
                    Widget::Select {
                        selector: "fill_color".to_string(),
                        title: "Fill color".to_string(),
                        options: vec!["red".to_string(), "green".to_string()],
                        value: fill_color.as_str().to_string(),
                    },
                    Widget::Select {
                        selector: "size_by".to_string(),
                        title: "Size by".to_string(),
                        options: vec!["u".to_string(), "v".to_string()],
                        value: size_by.column().to_string(),
                    },
                ],
            }),
            Session::Bar {
                dataset,
                group,
                color,
                filter_column,
                range,
            } => {
                let filter = range.map(|(low, high)| RangeFilter {
                    column: filter_column.clone(),
                    low,
                    high,
                });
                let table = crosstab(dataset, group, color, filter.as_ref())?;
                let colors = palette_for(table.categories.len());
                Ok(VizDocument {
                    session_id,
                    app: self.app(),
                    glyph: Glyph::VBarStack {
                        x: group.clone(),
                        stackers: table.categories.clone(),
                        colors,
                    },
                    source: Source::Stacks(table),
                    widgets: vec![Widget::RangeSlider {
                        selector: "range".to_string(),
                        title: filter_column.clone(),
                        start: SLIDER_START,
                        end: SLIDER_END,
                        step: SLIDER_STEP,
                        value: range.unwrap_or(SLIDER_VALUE),
                    }],
                })
            }
        }
    }
}
