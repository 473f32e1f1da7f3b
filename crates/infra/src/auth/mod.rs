//! OAuth token handling

pub mod token_provider;

pub use token_provider::SettingsTokenProvider;
