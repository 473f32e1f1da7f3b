//! SQLite persistence

pub mod manager;
pub mod record_repository;
pub mod settings_repository;
pub mod user_link_repository;

pub use manager::DbManager;
pub use record_repository::SqliteMeetingRecordRepository;
pub use settings_repository::SqliteSettingsStore;
pub use user_link_repository::SqliteUserLinkRepository;
