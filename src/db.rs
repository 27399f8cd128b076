// 🗄️ Enrollment audit log - SQLite + WAL
//
// One row per committed engine outcome and per waitlist promotion, keyed by
// the student, the index and the course code it touched so each can be
// queried on its own. The log is append-only and never replayed to rebuild
// state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::{ChangeOutcome, DropOutcome, Placement, SwapOutcome};
use crate::notify::{Notifier, PromotionEvent};

/// Actor recorded for promotions, which no user asked for directly
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnrollmentEvent {
    pub event_id: String,
    pub recorded_at: DateTime<Utc>,
    pub kind: String,
    pub student_id: String,
    pub index_number: String,
    pub course_code: String,
    pub details: serde_json::Value,
    pub actor: String,
}

impl EnrollmentEvent {
    pub fn new(
        kind: &str,
        student_id: &str,
        index_number: &str,
        course_code: &str,
        details: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            kind: kind.to_string(),
            student_id: student_id.to_string(),
            index_number: index_number.to_string(),
            course_code: course_code.to_string(),
            details,
            actor: actor.to_string(),
        }
    }

    pub fn course_added(
        student_id: &str,
        index_number: &str,
        course_code: &str,
        placement: Placement,
        actor: &str,
    ) -> Self {
        Self::new(
            "course_added",
            student_id,
            index_number,
            course_code,
            serde_json::json!({ "placement": placement }),
            actor,
        )
    }

    pub fn course_dropped(
        student_id: &str,
        index_number: &str,
        course_code: &str,
        outcome: &DropOutcome,
        actor: &str,
    ) -> Self {
        Self::new(
            "course_dropped",
            student_id,
            index_number,
            course_code,
            serde_json::json!({
                "dropped": outcome.dropped,
                "promoted": outcome.promotions.len(),
            }),
            actor,
        )
    }

    /// Keyed by the index the student moved to
    pub fn index_changed(
        student_id: &str,
        course_code: &str,
        outcome: &ChangeOutcome,
        actor: &str,
    ) -> Self {
        Self::new(
            "index_changed",
            student_id,
            &outcome.to_index,
            course_code,
            serde_json::json!({
                "from": outcome.from_index,
                "promoted": outcome.promotions.len(),
            }),
            actor,
        )
    }

    /// Keyed by the initiating student and the index they now hold
    pub fn index_swapped(course_code: &str, outcome: &SwapOutcome, actor: &str) -> Self {
        Self::new(
            "index_swapped",
            &outcome.student_a,
            &outcome.index_a,
            course_code,
            serde_json::json!({
                "peer": outcome.student_b,
                "peer_index": outcome.index_b,
            }),
            actor,
        )
    }

    pub fn promoted(event: &PromotionEvent) -> Self {
        let mut audit = Self::new(
            "waitlist_promoted",
            &event.student_id,
            &event.index_number,
            &event.course_code,
            serde_json::Value::Null,
            SYSTEM_ACTOR,
        );
        audit.recorded_at = event.promoted_at;
        audit
    }
}

/// Which column an audit query filters on
#[derive(Debug, Clone, Copy)]
pub enum EventFilter<'a> {
    Student(&'a str),
    Index(&'a str),
    Course(&'a str),
}

impl EventFilter<'_> {
    fn column(&self) -> &'static str {
        match self {
            EventFilter::Student(_) => "student_id",
            EventFilter::Index(_) => "index_number",
            EventFilter::Course(_) => "course_code",
        }
    }

    fn value(&self) -> &str {
        match self {
            EventFilter::Student(value) | EventFilter::Index(value) | EventFilter::Course(value) => {
                value
            }
        }
    }
}

pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open audit log {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(AuditLog { conn })
    }

    pub fn record(&self, event: &EnrollmentEvent) -> Result<()> {
        insert_event(&self.conn, event)
    }

    /// Newest first
    pub fn events(&self, filter: EventFilter<'_>) -> Result<Vec<EnrollmentEvent>> {
        query_events(&self.conn, filter)
    }

    /// How many times each kind of change hit a course, e.g. drops vs adds
    pub fn kind_counts_for_course(&self, course_code: &str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*) FROM enrollment_events
             WHERE course_code = ?1
             GROUP BY kind
             ORDER BY kind",
        )?;

        let counts = stmt
            .query_map(params![course_code], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM enrollment_events", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl Notifier for AuditLog {
    fn notify(&mut self, event: &PromotionEvent) -> Result<()> {
        self.record(&EnrollmentEvent::promoted(event))
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // In-memory databases report "memory" and keep it
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS enrollment_events (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            recorded_at TEXT NOT NULL,
            kind TEXT NOT NULL,
            student_id TEXT NOT NULL,
            index_number TEXT NOT NULL,
            course_code TEXT NOT NULL,
            details TEXT NOT NULL,
            actor TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_enrollment_student ON enrollment_events(student_id);
        CREATE INDEX IF NOT EXISTS idx_enrollment_index ON enrollment_events(index_number);
        CREATE INDEX IF NOT EXISTS idx_enrollment_course ON enrollment_events(course_code);",
    )
    .context("Failed to create audit tables")?;

    Ok(())
}

pub fn insert_event(conn: &Connection, event: &EnrollmentEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO enrollment_events (
            event_id, recorded_at, kind, student_id, index_number, course_code, details, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.event_id,
            event.recorded_at.to_rfc3339(),
            event.kind,
            event.student_id,
            event.index_number,
            event.course_code,
            event.details.to_string(),
            event.actor,
        ],
    )
    .with_context(|| format!("Failed to record {} for {}", event.kind, event.student_id))?;

    Ok(())
}

/// Insertion order, newest first
pub fn query_events(conn: &Connection, filter: EventFilter<'_>) -> Result<Vec<EnrollmentEvent>> {
    let sql = format!(
        "SELECT event_id, recorded_at, kind, student_id, index_number, course_code, details, actor
         FROM enrollment_events
         WHERE {} = ?1
         ORDER BY seq DESC",
        filter.column()
    );

    let mut stmt = conn.prepare(&sql)?;
    let events = stmt
        .query_map(params![filter.value()], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<EnrollmentEvent> {
    let recorded_at: String = row.get(1)?;
    let details: String = row.get(6)?;

    Ok(EnrollmentEvent {
        event_id: row.get(0)?,
        recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?
            .with_timezone(&Utc),
        kind: row.get(2)?,
        student_id: row.get(3)?,
        index_number: row.get(4)?,
        course_code: row.get(5)?,
        details: serde_json::from_str(&details)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?,
        actor: row.get(7)?,
    })
}
