//! Wiring helpers for route tests: a real SQLite database in a temp dir and
//! a Graph client pointed at a wiremock server.

use std::sync::Arc;

use chrono::Utc;
use meetbridge_core::{MeetingService, RsvpReconciler, SettingsStore, SubscriptionManager};
use meetbridge_domain::{
    GraphConfig, MeetingRecord, SETTING_ACCESS_TOKEN, SETTING_TOKEN_EXPIRY,
};
use meetbridge_infra::{
    DbManager, GraphClient, SettingsTokenProvider, SqliteMeetingRecordRepository,
    SqliteSettingsStore, SqliteUserLinkRepository,
};
use tempfile::TempDir;
use wiremock::MockServer;

use crate::state::AppState;

pub struct TestEnv {
    pub state: AppState,
    pub settings: Arc<SqliteSettingsStore>,
    pub records: Arc<SqliteMeetingRecordRepository>,
    pub links: Arc<SqliteUserLinkRepository>,
    _dir: TempDir,
}

impl TestEnv {
    /// Store a token valid long past the refresh buffer.
    pub async fn seed_tokens(&self) {
        self.settings
            .set(SETTING_ACCESS_TOKEN, "test-token")
            .await
            .expect("token stored");
        self.settings
            .set(SETTING_TOKEN_EXPIRY, &(Utc::now().timestamp() + 3600).to_string())
            .await
            .expect("expiry stored");
    }

    pub fn seed_record(&self, record: &MeetingRecord) {
        self.records.upsert_record(record).expect("record stored");
    }
}

pub async fn test_env(server: &MockServer) -> TestEnv {
    let dir = TempDir::new().expect("temp dir");
    let db = Arc::new(DbManager::new(dir.path().join("test.db"), 4).expect("db created"));
    db.run_migrations().expect("migrations run");

    let records = Arc::new(SqliteMeetingRecordRepository::new(db.clone()));
    let settings = Arc::new(SqliteSettingsStore::new(db.clone()));
    let links = Arc::new(SqliteUserLinkRepository::new(db));

    let graph_config = GraphConfig {
        api_base: server.uri(),
        tenant_id: "tenant-1".to_string(),
        client_id: "client-1".to_string(),
        client_secret: "secret-1".to_string(),
        redirect_uri: "https://bridge.example.com/callback".to_string(),
    };
    let auth = Arc::new(
        SettingsTokenProvider::with_endpoints(settings.clone(), graph_config, server.uri(), None)
            .expect("provider builds"),
    );
    let api = Arc::new(GraphClient::new(server.uri()).expect("client builds"));

    let reconciler = Arc::new(RsvpReconciler::new(
        auth.clone(),
        api.clone(),
        records.clone(),
        server.uri(),
    ));
    let subscriptions = Arc::new(SubscriptionManager::new(
        auth.clone(),
        api.clone(),
        settings.clone(),
        "https://bridge.example.com/webhook/graph",
    ));
    let meetings =
        Arc::new(MeetingService::new(auth.clone(), api, records.clone(), links.clone()));

    TestEnv {
        state: AppState { reconciler, subscriptions, meetings, auth },
        settings,
        records,
        links,
        _dir: dir,
    }
}
