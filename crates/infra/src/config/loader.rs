//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `MEETBRIDGE_DB_PATH`: Database file path
//! - `MEETBRIDGE_DB_POOL_SIZE`: Connection pool size
//! - `MEETBRIDGE_GRAPH_API_BASE`: Graph API base URL (optional)
//! - `MEETBRIDGE_TENANT_ID`: Azure AD tenant id
//! - `MEETBRIDGE_CLIENT_ID`: OAuth application id
//! - `MEETBRIDGE_CLIENT_SECRET`: OAuth client secret
//! - `MEETBRIDGE_REDIRECT_URI`: OAuth redirect URI
//! - `MEETBRIDGE_BIND_ADDR`: Webhook server bind address (optional)
//! - `MEETBRIDGE_PUBLIC_BASE_URL`: Public base URL notifications are sent to
//! - `MEETBRIDGE_RENEWAL_CRON`: Renewal cron expression (optional)
//! - `MEETBRIDGE_RENEWAL_ENABLED`: Whether renewal runs (true/false, optional)

use std::path::{Path, PathBuf};

use meetbridge_domain::{
    BridgeError, Config, DatabaseConfig, GraphConfig, RenewalConfig, Result, WebhookConfig,
    GRAPH_API_BASE,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `BridgeError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `BridgeError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("MEETBRIDGE_DB_PATH")?;
    let db_pool_size = env_var("MEETBRIDGE_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| BridgeError::Config(format!("Invalid pool size: {}", e)))
    })?;

    let api_base =
        std::env::var("MEETBRIDGE_GRAPH_API_BASE").unwrap_or_else(|_| GRAPH_API_BASE.to_string());
    let tenant_id = env_var("MEETBRIDGE_TENANT_ID")?;
    let client_id = env_var("MEETBRIDGE_CLIENT_ID")?;
    let client_secret = env_var("MEETBRIDGE_CLIENT_SECRET")?;
    let redirect_uri = env_var("MEETBRIDGE_REDIRECT_URI")?;

    let bind_addr =
        std::env::var("MEETBRIDGE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let public_base_url = env_var("MEETBRIDGE_PUBLIC_BASE_URL")?;

    let cron_expression =
        std::env::var("MEETBRIDGE_RENEWAL_CRON").unwrap_or_else(|_| "0 0 3 * * *".to_string());
    let renewal_enabled = env_bool("MEETBRIDGE_RENEWAL_ENABLED", true);

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        graph: GraphConfig { api_base, tenant_id, client_id, client_secret, redirect_uri },
        webhook: WebhookConfig { bind_addr, public_base_url },
        renewal: RenewalConfig { cron_expression, enabled: renewal_enabled },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `BridgeError::Config` if the file is missing, unparseable, or
/// incomplete.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BridgeError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BridgeError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BridgeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content; format is detected by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BridgeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BridgeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(BridgeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, up to two parent levels, and the
/// executable's directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("meetbridge.json"),
            cwd.join("meetbridge.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("meetbridge.json"),
                exe_dir.join("meetbridge.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| BridgeError::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
