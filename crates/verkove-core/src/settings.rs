// --- AI Settings ---

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    /// Text completion model
    pub model: String,
    /// Image-capable generation model
    pub image_model: String,
    /// Override for the provider's REST endpoint
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    /// Total attempts per provider call; 1 means no retry
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            base_url: None,
            timeout_ms: 60_000,
            max_attempts: 1,
            retry_backoff_ms: 250,
        }
    }
}

impl AiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Overlay `VERKOVE_AI_*` variables (and `GEMINI_API_KEY`) on top of
    /// whatever was read from disk.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        if let Some(provider) = non_empty("VERKOVE_AI_PROVIDER") {
            self.provider = provider;
        }
        if let Some(key) = non_empty("VERKOVE_AI_API_KEY").or_else(|| non_empty("GEMINI_API_KEY")) {
            self.api_key = key;
        }
        if let Some(model) = non_empty("VERKOVE_AI_MODEL") {
            self.model = model;
        }
        if let Some(model) = non_empty("VERKOVE_IMAGE_MODEL") {
            self.image_model = model;
        }
        if let Some(url) = non_empty("VERKOVE_AI_BASE_URL") {
            self.base_url = Some(url);
        }
        if let Some(ms) = non_empty("VERKOVE_AI_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.timeout_ms = ms;
        }
        if let Some(retries) = non_empty("VERKOVE_AI_MAX_RETRIES").and_then(|v| v.parse::<u32>().ok()) {
            self.max_attempts = retries.saturating_add(1);
        }
    }
}

fn settings_path(dir: &Path) -> PathBuf {
    dir.join("settings.json")
}

/// Read `settings.json` from `dir`, falling back to defaults when it is
/// missing or unreadable.
pub fn read_settings(dir: &Path) -> AiSettings {
    let path = settings_path(dir);
    if !path.exists() {
        return AiSettings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Whether a real provider can be called. Ollama runs without a key.
pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_key_is_not_configured() {
        assert!(!ai_configured(&AiSettings::default()));
        let ollama = AiSettings {
            provider: "ollama".to_string(),
            ..AiSettings::default()
        };
        assert!(ai_configured(&ollama));
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("VERKOVE_AI_TIMEOUT_MS", "1500"),
            ("VERKOVE_AI_MAX_RETRIES", "2"),
            ("VERKOVE_AI_MODEL", " "),
        ]
        .into_iter()
        .collect();
        let mut settings = AiSettings::default();
        settings.apply_vars(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.timeout(), Duration::from_millis(1500));
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.model, "gemini-2.0-flash");
        assert!(ai_configured(&settings));
    }

    #[test]
    fn settings_file_is_read_and_garbage_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_settings(dir.path()).provider, "google");

        fs::write(
            settings_path(dir.path()),
            r#"{"apiKey":"k","model":"gemini-2.5-flash"}"#,
        )
        .unwrap();
        let settings = read_settings(dir.path());
        assert_eq!(settings.api_key, "k");
        assert_eq!(settings.model, "gemini-2.5-flash");
        assert_eq!(settings.provider, "google");

        fs::write(settings_path(dir.path()), "not json").unwrap();
        assert!(read_settings(dir.path()).api_key.is_empty());
    }
}
