//! SQLite-backed template store

use std::fs;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use thiserror::Error;
use tracing::{debug, info};

use crate::record::{BatchGet, PlotTemplate, TemplatePair, VisualTemplate};

/// Errors from template store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template not found: {0}")]
    NotFound(String),
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS plot_templates (
    object_id    TEXT NOT NULL,
    plot_id      TEXT NOT NULL,
    container_id TEXT NOT NULL,
    updated_at   INTEGER NOT NULL,
    PRIMARY KEY (object_id, plot_id)
);
CREATE TABLE IF NOT EXISTS visual_templates (
    object_id        TEXT NOT NULL,
    visual_id        TEXT NOT NULL,
    plot_template_id TEXT NOT NULL,
    container_id     TEXT NOT NULL,
    updated_at       INTEGER NOT NULL,
    PRIMARY KEY (object_id, visual_id)
);
";

const SELECT_PLOT: &str = "SELECT object_id, plot_id, container_id FROM plot_templates";
const SELECT_VISUAL: &str = "SELECT object_id, visual_id, plot_template_id, container_id FROM visual_templates";

fn plot_from_row(row: &Row<'_>) -> rusqlite::Result<PlotTemplate> {
    Ok(PlotTemplate {
        object_id: row.get(0)?,
        plot_id: row.get(1)?,
        container_id: row.get(2)?,
    })
}

fn visual_from_row(row: &Row<'_>) -> rusqlite::Result<VisualTemplate> {
    Ok(VisualTemplate {
        object_id: row.get(0)?,
        visual_id: row.get(1)?,
        plot_template_id: row.get(2)?,
        container_id: row.get(3)?,
    })
}

/// Template store holding the plot and visual template tables
pub struct TemplateStore {
    conn: Connection,
}

impl TemplateStore {
    /// Open or create a store at the given database path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        debug!(?path, "Opened template store");
        Self::init(conn)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Read both tables for one object in a single read transaction
    ///
    /// SQLite reads always observe committed writes, so `Strong` and `Default`
    /// behave identically here; the levels are only logged.
    pub fn batch_get(&mut self, request: &BatchGet) -> Result<TemplatePair, StoreError> {
        debug!(
            object_id = %request.plot.object_id,
            plot_id = %request.plot.plot_id,
            visual_id = %request.visual.visual_id,
            plot_read = ?request.plot_read,
            visual_read = ?request.visual_read,
            "batch_get: called"
        );
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

        let plot = tx
            .query_row(
                &format!("{SELECT_PLOT} WHERE object_id = ?1 AND plot_id = ?2"),
                params![request.plot.object_id, request.plot.plot_id],
                plot_from_row,
            )
            .optional()?;

        let visual = tx
            .query_row(
                &format!("{SELECT_VISUAL} WHERE object_id = ?1 AND visual_id = ?2"),
                params![request.visual.object_id, request.visual.visual_id],
                visual_from_row,
            )
            .optional()?;

        tx.commit()?;
        debug!(plot_found = plot.is_some(), visual_found = visual.is_some(), "batch_get: done");
        Ok(TemplatePair { plot, visual })
    }

    /// Insert or replace a plot template
    pub fn put_plot(&self, plot: &PlotTemplate) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO plot_templates (object_id, plot_id, container_id, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(object_id, plot_id) DO UPDATE SET
                 container_id = excluded.container_id,
                 updated_at = excluded.updated_at",
            params![
                plot.object_id,
                plot.plot_id,
                plot.container_id,
                chrono::Utc::now().timestamp_millis()
            ],
        )?;
        info!(object_id = %plot.object_id, plot_id = %plot.plot_id, "Stored plot template");
        Ok(())
    }

    /// Insert or replace a visual template
    pub fn put_visual(&self, visual: &VisualTemplate) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO visual_templates (object_id, visual_id, plot_template_id, container_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(object_id, visual_id) DO UPDATE SET
                 plot_template_id = excluded.plot_template_id,
                 container_id = excluded.container_id,
                 updated_at = excluded.updated_at",
            params![
                visual.object_id,
                visual.visual_id,
                visual.plot_template_id,
                visual.container_id,
                chrono::Utc::now().timestamp_millis()
            ],
        )?;
        info!(object_id = %visual.object_id, visual_id = %visual.visual_id, "Stored visual template");
        Ok(())
    }

    /// Delete a plot template
    pub fn delete_plot(&self, object_id: &str, plot_id: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM plot_templates WHERE object_id = ?1 AND plot_id = ?2",
            params![object_id, plot_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("plot template {object_id}/{plot_id}")));
        }
        Ok(())
    }

    /// Delete a visual template
    pub fn delete_visual(&self, object_id: &str, visual_id: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM visual_templates WHERE object_id = ?1 AND visual_id = ?2",
            params![object_id, visual_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("visual template {object_id}/{visual_id}")));
        }
        Ok(())
    }

    /// List plot templates, optionally for one object
    pub fn list_plots(&self, object_id: Option<&str>) -> Result<Vec<PlotTemplate>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_PLOT} WHERE ?1 IS NULL OR object_id = ?1 ORDER BY object_id, plot_id"
        ))?;
        let rows = stmt.query_map(params![object_id], plot_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// List visual templates, optionally for one object
    pub fn list_visuals(&self, object_id: Option<&str>) -> Result<Vec<VisualTemplate>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_VISUAL} WHERE ?1 IS NULL OR object_id = ?1 ORDER BY object_id, visual_id"
        ))?;
        let rows = stmt.query_map(params![object_id], visual_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
