//! Microsoft Graph integration

pub mod client;

pub use client::GraphClient;
