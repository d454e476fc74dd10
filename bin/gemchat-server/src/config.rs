//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use gemchat_core::gemini::DEFAULT_BASE_URL;

/// Runtime configuration for gemchat-server.
///
/// Every field has a default so the server starts without any environment
/// variables set; only `GEMINI_KEY` is needed for replies to succeed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind (default: `"0.0.0.0"`).
    pub bind_host: String,

    /// TCP port, overridable through `PORT` (default: `7860`).
    pub port: u16,

    /// Gemini API key. Empty means every upstream call will be rejected.
    pub api_key: String,

    /// Base URL of the Gemini REST API.
    pub api_base: String,

    /// Total timeout for one upstream generation call.
    pub upstream_timeout: Duration,

    /// Model used when the form omits one.
    pub default_model: String,

    /// Directory where uploaded files are written.
    pub upload_dir: PathBuf,

    /// Request body cap in MiB.
    pub max_upload_mb: usize,

    /// Sessions idle for longer than this are forgotten.
    pub session_ttl: Duration,

    /// Maximum number of live sessions kept in memory.
    pub max_sessions: usize,

    /// Comma-separated CORS allow list; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// When set, logs are also written to a daily rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_host: env_or("GEMCHAT_BIND", "0.0.0.0"),
            port: parse_env("PORT", 7860),
            api_key: env_or("GEMINI_KEY", ""),
            api_base: env_or("GEMCHAT_API_BASE", DEFAULT_BASE_URL),
            upstream_timeout: Duration::from_secs(parse_env("GEMCHAT_UPSTREAM_TIMEOUT_SECS", 300)),
            default_model: env_or("GEMCHAT_DEFAULT_MODEL", gemchat_core::MODELS[0]),
            upload_dir: PathBuf::from(env_or("GEMCHAT_UPLOAD_DIR", "uploads")),
            max_upload_mb: parse_env("GEMCHAT_MAX_UPLOAD_MB", 100),
            session_ttl: Duration::from_secs(parse_env("GEMCHAT_SESSION_TTL_SECS", 86_400)),
            max_sessions: parse_env("GEMCHAT_MAX_SESSIONS", 1024),
            cors_allowed_origins: std::env::var("GEMCHAT_CORS_ORIGINS").ok().filter(|v| !v.trim().is_empty()),
            enable_docs: parse_bool("GEMCHAT_ENABLE_DOCS", true),
            log_level: env_or("GEMCHAT_LOG", "info"),
            log_json: parse_bool("GEMCHAT_LOG_JSON", false),
            log_dir: std::env::var("GEMCHAT_LOG_DIR").ok().filter(|v| !v.is_empty()).map(PathBuf::from),
        }
    }

    /// `host:port` string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".into(),
            port: 7860,
            api_key: String::new(),
            api_base: DEFAULT_BASE_URL.into(),
            upstream_timeout: Duration::from_secs(300),
            default_model: gemchat_core::MODELS[0].into(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_mb: 100,
            session_ttl: Duration::from_secs(86_400),
            max_sessions: 1024,
            cors_allowed_origins: None,
            enable_docs: true,
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
