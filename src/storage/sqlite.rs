//! SQLite storage backend

use super::traits::{DiscourseStore, OpenStore, StorageError, StorageResult};
use crate::graph::{DiscourseUnit, EdgeKind, ExtractionStrategy, GraphEdge, StepNode};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed discourse store.
///
/// Single database file with tables for units, steps, and edges.
/// Thread-safe via an internal mutex on the connection; the mutex also makes
/// every `replace_steps` call the only writer for its duration, which
/// together with the transaction gives the per-page atomicity guarantee.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Discourse units, one per page
            CREATE TABLE IF NOT EXISTS units (
                page_ref TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                theme TEXT NOT NULL,
                main_question TEXT NOT NULL,
                strategy TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Argumentation steps, replaced wholesale per page
            CREATE TABLE IF NOT EXISTS steps (
                page_ref TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                step_type TEXT NOT NULL,
                label TEXT NOT NULL,
                speaker TEXT,
                content_preview TEXT,
                parent_sequence INTEGER,
                PRIMARY KEY (page_ref, sequence)
            );

            -- Derived edges, recomputed with every step rewrite
            CREATE TABLE IF NOT EXISTS edges (
                page_ref TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                PRIMARY KEY (page_ref, source_id, target_id, kind)
            );

            CREATE INDEX IF NOT EXISTS idx_steps_page ON steps(page_ref);
            CREATE INDEX IF NOT EXISTS idx_edges_page ON edges(page_ref);
            CREATE INDEX IF NOT EXISTS idx_edges_kind ON edges(page_ref, kind);

            PRAGMA foreign_keys = ON;

            -- WAL keeps readers unblocked during page rewrites
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    fn row_to_unit(row: &rusqlite::Row<'_>) -> rusqlite::Result<(DiscourseUnit, String, String)> {
        Ok((
            DiscourseUnit {
                page_ref: row.get(0)?,
                title: row.get(1)?,
                summary: row.get(2)?,
                theme: row.get(3)?,
                main_question: row.get(4)?,
                strategy: ExtractionStrategy::parse(&row.get::<_, String>(5)?),
                // Timestamps filled in after rfc3339 parsing
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            row.get(6)?,
            row.get(7)?,
        ))
    }

    fn unit_from_row(raw: (DiscourseUnit, String, String)) -> StorageResult<DiscourseUnit> {
        let (mut unit, created, updated) = raw;
        unit.created_at = Self::parse_timestamp(&created)?;
        unit.updated_at = Self::parse_timestamp(&updated)?;
        Ok(unit)
    }

    fn row_to_step(row: &rusqlite::Row<'_>) -> rusqlite::Result<StepNode> {
        Ok(StepNode {
            page_ref: row.get(0)?,
            sequence: row.get(1)?,
            step_type: crate::graph::StepType::from_raw(&row.get::<_, String>(2)?),
            label: row.get(3)?,
            speaker: row.get(4)?,
            content_preview: row.get(5)?,
            parent_sequence: row.get(6)?,
        })
    }
}

const UNIT_COLUMNS: &str =
    "page_ref, title, summary, theme, main_question, strategy, created_at, updated_at";

impl DiscourseStore for SqliteStore {
    fn upsert_unit(&self, unit: &DiscourseUnit) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        // created_at survives the conflict path; everything else is overwritten.
        conn.execute(
            r#"
            INSERT INTO units (page_ref, title, summary, theme, main_question,
                               strategy, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(page_ref) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                theme = excluded.theme,
                main_question = excluded.main_question,
                strategy = excluded.strategy,
                updated_at = excluded.updated_at
            "#,
            params![
                unit.page_ref,
                unit.title,
                unit.summary,
                unit.theme,
                unit.main_question,
                unit.strategy.as_str(),
                unit.created_at.to_rfc3339(),
                unit.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn unit(&self, page_ref: &str) -> StorageResult<Option<DiscourseUnit>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM units WHERE page_ref = ?1", UNIT_COLUMNS),
                params![page_ref],
                Self::row_to_unit,
            )
            .optional()?;
        raw.map(Self::unit_from_row).transpose()
    }

    fn list_units(&self) -> StorageResult<Vec<DiscourseUnit>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM units ORDER BY page_ref", UNIT_COLUMNS))?;
        let rows = stmt.query_map([], Self::row_to_unit)?;
        let mut units = Vec::new();
        for row in rows {
            units.push(Self::unit_from_row(row?)?);
        }
        Ok(units)
    }

    fn delete_unit(&self, page_ref: &str) -> StorageResult<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM edges WHERE page_ref = ?1", params![page_ref])?;
        tx.execute("DELETE FROM steps WHERE page_ref = ?1", params![page_ref])?;
        let deleted = tx.execute("DELETE FROM units WHERE page_ref = ?1", params![page_ref])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn replace_steps(
        &self,
        page_ref: &str,
        steps: &[StepNode],
        edges: &[GraphEdge],
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM edges WHERE page_ref = ?1", params![page_ref])?;
        tx.execute("DELETE FROM steps WHERE page_ref = ?1", params![page_ref])?;

        {
            let mut insert_step = tx.prepare(
                r#"
                INSERT INTO steps (page_ref, sequence, step_type, label,
                                   speaker, content_preview, parent_sequence)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for step in steps {
                insert_step.execute(params![
                    step.page_ref,
                    step.sequence,
                    step.step_type.as_str(),
                    step.label,
                    step.speaker,
                    step.content_preview,
                    step.parent_sequence,
                ])?;
            }

            let mut insert_edge = tx.prepare(
                "INSERT OR IGNORE INTO edges (page_ref, source_id, target_id, kind)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for edge in edges {
                insert_edge.execute(params![
                    page_ref,
                    edge.source,
                    edge.target,
                    edge.kind.as_str(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn steps_for_page(&self, page_ref: &str) -> StorageResult<Vec<StepNode>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT page_ref, sequence, step_type, label, speaker,
                   content_preview, parent_sequence
            FROM steps WHERE page_ref = ?1 ORDER BY sequence
            "#,
        )?;
        let rows = stmt.query_map(params![page_ref], Self::row_to_step)?;
        let mut steps = Vec::new();
        for row in rows {
            steps.push(row?);
        }
        Ok(steps)
    }

    fn edges_for_page(&self, page_ref: &str) -> StorageResult<Vec<GraphEdge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source_id, target_id, kind FROM edges
             WHERE page_ref = ?1 ORDER BY kind, source_id, target_id",
        )?;
        let rows = stmt.query_map(params![page_ref], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut edges = Vec::new();
        for row in rows {
            let (source, target, kind) = row?;
            // Unknown kinds would mean schema drift; skip rather than fail reads.
            if let Some(kind) = EdgeKind::parse(&kind) {
                edges.push(GraphEdge { source, target, kind });
            }
        }
        Ok(edges)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}
