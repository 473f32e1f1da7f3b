//! # Meetbridge Core
//!
//! Pure application services and port interfaces.
//!
//! This crate contains:
//! - Port traits the infrastructure implements (token provider, calendar
//!   API, record store)
//! - The RSVP reconciler (webhook-driven background merge)
//! - The subscription manager (renew-then-recreate self-healing)
//! - The interactive meeting service (create/update/reschedule/delete)
//!
//! ## Architecture
//! - Depends only on `meetbridge-domain`
//! - No I/O: all effects go through ports

pub mod meetings;
pub mod ports;
pub mod reconcile;
pub mod resource;
pub mod subscription;

#[cfg(test)]
mod test_support;

pub use meetings::{
    validate_meeting_time, AttendeeInfo, DeleteOutcome, MeetingDetails, MeetingOutcome,
    MeetingService, MeetingShape, MeetingTimeReport,
};
pub use ports::{
    AccessTokenProvider, CalendarApi, MeetingRecordRepository, SettingsStore, UserLinkRepository,
};
pub use reconcile::{ReconcileOutcome, RsvpReconciler};
pub use resource::ResourceRef;
pub use subscription::{EnsureOutcome, SubscriptionManager};
