//! SQLite-backed implementation of the MeetingRecordRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use meetbridge_core::MeetingRecordRepository;
use meetbridge_domain::{
    AttendingStatus, BridgeError, MeetingRecord, Participant, RecordKind, Result,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, instrument};

use super::manager::DbManager;
use crate::errors::InfraError;

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// SQLite implementation of MeetingRecordRepository.
pub struct SqliteMeetingRecordRepository {
    db: Arc<DbManager>,
}

impl SqliteMeetingRecordRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace a full record with its participant rows. Used by
    /// record ingestion, not part of the port.
    pub fn upsert_record(&self, record: &MeetingRecord) -> Result<()> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;

        tx.execute(
            "INSERT INTO meeting_records (kind, name, subject, starts_at, ends_at, remote_event_id, meeting_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (kind, name) DO UPDATE SET
                subject = excluded.subject,
                starts_at = excluded.starts_at,
                ends_at = excluded.ends_at,
                remote_event_id = excluded.remote_event_id,
                meeting_url = excluded.meeting_url",
            params![
                record.kind.as_str(),
                record.name,
                record.subject,
                record.starts_at.map(format_datetime),
                record.ends_at.map(format_datetime),
                record.remote_event_id,
                record.meeting_url,
            ],
        )
        .map_err(InfraError::from)?;

        replace_participants(&tx, record)?;
        tx.commit().map_err(InfraError::from)?;
        Ok(())
    }

    fn load_record(
        &self,
        conn: &Connection,
        kind: RecordKind,
        name: &str,
    ) -> Result<Option<MeetingRecord>> {
        let row = conn
            .query_row(
                "SELECT kind, name, subject, starts_at, ends_at, remote_event_id, meeting_url
                 FROM meeting_records WHERE kind = ?1 AND name = ?2",
                params![kind.as_str(), name],
                map_record_row,
            )
            .optional()
            .map_err(InfraError::from)?;

        let Some(mut record) = row else {
            return Ok(None);
        };
        record.participants = self.load_participants(conn, kind, name)?;
        Ok(Some(record))
    }

    fn load_participants(
        &self,
        conn: &Connection,
        kind: RecordKind,
        name: &str,
    ) -> Result<Vec<Participant>> {
        let mut stmt = conn
            .prepare(
                "SELECT email, attending FROM participants
                 WHERE kind = ?1 AND record_name = ?2 ORDER BY position",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![kind.as_str(), name], |row| {
                let email: String = row.get(0)?;
                let attending: Option<String> = row.get(1)?;
                Ok(Participant {
                    email,
                    attending: attending.as_deref().and_then(AttendingStatus::parse),
                })
            })
            .map_err(InfraError::from)?;

        let mut participants = Vec::new();
        for row in rows {
            participants.push(row.map_err(InfraError::from)?);
        }
        Ok(participants)
    }
}

#[async_trait]
impl MeetingRecordRepository for SqliteMeetingRecordRepository {
    #[instrument(skip(self))]
    async fn find_by_remote_event_id(
        &self,
        remote_event_id: &str,
    ) -> Result<Option<MeetingRecord>> {
        let conn = self.db.get_connection()?;
        let key = conn
            .query_row(
                "SELECT kind, name FROM meeting_records WHERE remote_event_id = ?1 LIMIT 1",
                params![remote_event_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(InfraError::from)?;

        let Some((kind, name)) = key else {
            debug!(remote_event_id, "no record tracks this remote event");
            return Ok(None);
        };
        let kind = parse_kind(&kind)?;
        self.load_record(&conn, kind, &name)
    }

    async fn load(&self, kind: RecordKind, name: &str) -> Result<MeetingRecord> {
        let conn = self.db.get_connection()?;
        self.load_record(&conn, kind, name)?
            .ok_or_else(|| BridgeError::NotFound(format!("{} {name}", kind.label())))
    }

    #[instrument(skip(self, record), fields(kind = record.kind.as_str(), name = %record.name))]
    async fn save_participants(&self, record: &MeetingRecord) -> Result<()> {
        let mut conn = self.db.get_connection()?;
        let tx = conn.transaction().map_err(InfraError::from)?;
        replace_participants(&tx, record)?;
        tx.commit().map_err(InfraError::from)?;
        Ok(())
    }

    async fn set_remote_link(
        &self,
        kind: RecordKind,
        name: &str,
        remote_event_id: Option<&str>,
        meeting_url: Option<&str>,
    ) -> Result<()> {
        let conn = self.db.get_connection()?;
        let updated = conn
            .execute(
                "UPDATE meeting_records SET remote_event_id = ?1, meeting_url = ?2
                 WHERE kind = ?3 AND name = ?4",
                params![remote_event_id, meeting_url, kind.as_str(), name],
            )
            .map_err(InfraError::from)?;

        if updated == 0 {
            return Err(BridgeError::NotFound(format!("{} {name}", kind.label())));
        }
        Ok(())
    }
}

fn replace_participants(conn: &Connection, record: &MeetingRecord) -> Result<()> {
    conn.execute(
        "DELETE FROM participants WHERE kind = ?1 AND record_name = ?2",
        params![record.kind.as_str(), record.name],
    )
    .map_err(InfraError::from)?;

    for (position, participant) in record.participants.iter().enumerate() {
        conn.execute(
            "INSERT INTO participants (kind, record_name, position, email, attending)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.kind.as_str(),
                record.name,
                position as i64,
                participant.email,
                participant.attending.map(|s| s.as_str()),
            ],
        )
        .map_err(InfraError::from)?;
    }
    Ok(())
}

fn map_record_row(row: &Row<'_>) -> rusqlite::Result<MeetingRecord> {
    let kind: String = row.get(0)?;
    let starts_at: Option<String> = row.get(3)?;
    let ends_at: Option<String> = row.get(4)?;
    Ok(MeetingRecord {
        kind: RecordKind::parse(&kind).unwrap_or(RecordKind::Event),
        name: row.get(1)?,
        subject: row.get(2)?,
        starts_at: starts_at.as_deref().and_then(parse_datetime),
        ends_at: ends_at.as_deref().and_then(parse_datetime),
        remote_event_id: row.get(5)?,
        meeting_url: row.get(6)?,
        participants: Vec::new(),
    })
}

fn parse_kind(value: &str) -> Result<RecordKind> {
    RecordKind::parse(value)
        .ok_or_else(|| BridgeError::Database(format!("unknown record kind: {value}")))
}

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).ok()
}
