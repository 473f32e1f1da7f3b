//! # Meetbridge Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The Microsoft Graph HTTP client
//! - Token storage and OAuth grant handling
//! - SQLite repositories (records, participants, settings, user links)
//! - The cron-based subscription renewal scheduler
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `meetbridge-core`
//! - Contains all "impure" code (I/O, clock, network)

pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod graph;
pub mod scheduling;

// Re-export commonly used items
pub use auth::*;
pub use database::*;
pub use errors::InfraError;
pub use graph::*;
pub use scheduling::*;
