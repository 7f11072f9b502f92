//! Environment-driven configuration for the transdoc daemon

use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "~/.transdoc/transdoc.db";
const DEFAULT_CONTENT_ROOT: &str = "~/.transdoc/content";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub http_port: u16,
    pub content_root: PathBuf,
    pub max_attempts: i32,
    pub stall_threshold_minutes: i64,
    pub batch_concurrency: usize,
    pub provider_api_key: Option<String>,
    pub provider_base_url: String,
    pub provider_model: String,
    pub provider_timeout_secs: u64,
    pub font_url: String,
    pub font_cache_dir: Option<PathBuf>,
    pub log_format: String,
    /// Seconds between scheduled batch runs; 0 disables the trigger
    pub process_interval_secs: u64,
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("TRANSDOC_DB_PATH")
            .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());
        let content_root = std::env::var("TRANSDOC_CONTENT_ROOT")
            .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_CONTENT_ROOT).into_owned());

        Self {
            db_path,
            http_port: env_parse("TRANSDOC_HTTP_PORT", 8089),
            content_root: PathBuf::from(content_root),
            max_attempts: env_parse("TRANSDOC_MAX_ATTEMPTS", 3),
            stall_threshold_minutes: env_parse("TRANSDOC_STALL_THRESHOLD_MINUTES", 30),
            batch_concurrency: env_parse("TRANSDOC_BATCH_CONCURRENCY", 2),
            provider_api_key: std::env::var("TRANSDOC_PROVIDER_API_KEY").ok(),
            provider_base_url: env_string(
                "TRANSDOC_PROVIDER_BASE_URL",
                "https://api.openai.com/v1",
            ),
            provider_model: env_string("TRANSDOC_PROVIDER_MODEL", "gpt-4o-mini"),
            provider_timeout_secs: env_parse("TRANSDOC_PROVIDER_TIMEOUT_SECS", 60),
            font_url: env_string(
                "TRANSDOC_FONT_URL",
                "https://github.com/googlefonts/noto-fonts/raw/main/hinted/ttf/NotoSansArabic/NotoSansArabic-Regular.ttf",
            ),
            font_cache_dir: std::env::var("TRANSDOC_FONT_CACHE_DIR").ok().map(PathBuf::from),
            log_format: env_string("TRANSDOC_LOG_FORMAT", "pretty"),
            process_interval_secs: env_parse("TRANSDOC_PROCESS_INTERVAL_SECS", 0),
        }
    }
}
