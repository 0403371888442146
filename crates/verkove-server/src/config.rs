use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub(crate) fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    /// Largest accepted image upload.
    pub max_upload_bytes: usize,
    /// Largest accepted request body of any kind.
    pub max_body_bytes: usize,
    pub log_json: bool,
    pub shutdown_drain: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let data_dir = verkove_core::data_dir();
        let uploads_dir = env::var_os("VERKOVE_UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("uploads"));
        Self {
            bind: env::var("VERKOVE_BIND").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            data_dir,
            uploads_dir,
            max_upload_bytes: env_usize("VERKOVE_MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            max_body_bytes: env_usize("VERKOVE_MAX_BODY_BYTES", 50 * 1024 * 1024),
            log_json: env_bool("VERKOVE_LOG_JSON", false),
            shutdown_drain: Duration::from_millis(env_u64("VERKOVE_SHUTDOWN_DRAIN_MS", 2000)),
        }
    }

    /// Configuration rooted at `data_dir`, for tests and embedding.
    pub fn rooted(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            bind: "127.0.0.1:0".to_string(),
            uploads_dir: data_dir.join("uploads"),
            data_dir,
            max_upload_bytes: 10 * 1024 * 1024,
            max_body_bytes: 50 * 1024 * 1024,
            log_json: false,
            shutdown_drain: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooted_config_places_uploads_under_data_dir() {
        let cfg = ServerConfig::rooted("/tmp/verkove-test");
        assert_eq!(cfg.uploads_dir, PathBuf::from("/tmp/verkove-test/uploads"));
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn unparseable_values_fall_back_to_defaults() {
        assert!(env_bool("VERKOVE_TEST_UNSET_BOOL", true));
        assert_eq!(env_u64("VERKOVE_TEST_UNSET_U64", 7), 7);
        assert_eq!(env_usize("VERKOVE_TEST_UNSET_USIZE", 9), 9);
    }
}
