//! Local meeting record model
//!
//! A meeting record is a business record (an event or a project) that owns
//! zero-or-one remote calendar event with an attached Teams meeting link.
//! Participant RSVP status is mutated by the reconciler from remote truth.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Attendee response state on a local participant row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendingStatus {
    Yes,
    No,
    Maybe,
}

impl AttendingStatus {
    /// Map a Graph attendee `status.response` value onto a local status.
    ///
    /// `none`, `notResponded`, `organizer` and anything unrecognized map to
    /// `None`: those responses never overwrite an existing local status.
    pub fn from_graph_response(response: &str) -> Option<Self> {
        match response.to_ascii_lowercase().as_str() {
            "accepted" => Some(Self::Yes),
            "declined" => Some(Self::No),
            "tentative" => Some(Self::Maybe),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::Maybe => "Maybe",
        }
    }

    /// Parse the stored string form back into a status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Yes" => Some(Self::Yes),
            "No" => Some(Self::No),
            "Maybe" => Some(Self::Maybe),
            _ => None,
        }
    }
}

/// Kinds of business records that can own a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Event,
    Project,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Project => "project",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "event" => Some(Self::Event),
            "project" => Some(Self::Project),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::Project => "Project",
        }
    }

    /// Working-hours defaults applied to midnight-anchored datetimes.
    ///
    /// Projects carry date-only bounds, so they get a 09:00-17:30 working
    /// day; events default to a 09:00 start.
    fn default_start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
    }

    fn default_end_time(&self) -> NaiveTime {
        match self {
            Self::Event => NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            Self::Project => NaiveTime::from_hms_opt(17, 30, 0).unwrap_or_default(),
        }
    }

    /// Anchor a start datetime to this kind's working hours when it sits at
    /// midnight (a date-only value in the source record).
    pub fn anchor_start(&self, dt: NaiveDateTime) -> NaiveDateTime {
        anchor(dt, self.default_start_time())
    }

    /// Anchor an end datetime the same way.
    pub fn anchor_end(&self, dt: NaiveDateTime) -> NaiveDateTime {
        anchor(dt, self.default_end_time())
    }
}

fn anchor(dt: NaiveDateTime, default_time: NaiveTime) -> NaiveDateTime {
    if dt.time() == NaiveTime::MIN {
        dt.date().and_time(default_time)
    } else {
        dt
    }
}

/// Participant sub-record of a meeting record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub email: String,
    pub attending: Option<AttendingStatus>,
}

/// A business record that owns an optional remote meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub kind: RecordKind,
    /// Local key, unique per kind.
    pub name: String,
    pub subject: Option<String>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    /// Remote calendar-event identifier, used to correlate inbound
    /// notifications back to this record.
    pub remote_event_id: Option<String>,
    /// Teams join link of the created meeting.
    pub meeting_url: Option<String>,
    pub participants: Vec<Participant>,
}

impl MeetingRecord {
    /// Subject used for the remote event, falling back to a generated one.
    pub fn resolved_subject(&self) -> String {
        match self.subject.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => format!("{} Meeting: {}", self.kind.label(), self.name),
        }
    }
}
