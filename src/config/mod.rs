//! Configuration reading and data directory paths.

pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

use paths::get_data_dir;

/// Environment variable that replaces the `apiKey` setting.
pub const API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";

/// Environment variable pointing at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "VOICE_SPEAK_CONFIG";

/// speak_config.json shape. Every field is optional; the CLI flags win
/// over anything set here.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakConfig {
    /// Synthesis provider: "translate" (default) or "cloud".
    #[serde(default)]
    pub provider: Option<String>,
    /// API key for the cloud provider.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL override for the selected provider.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Google domain suffix used by the translate provider ("com", "co.uk", ...).
    #[serde(default)]
    pub tld: Option<String>,
    #[serde(default)]
    pub slow: Option<bool>,
    #[serde(default)]
    pub speaking_rate: Option<f64>,
    /// External player program; the built-in device player is used when unset.
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for SpeakConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("tld", &self.tld)
            .field("slow", &self.slow)
            .field("speaking_rate", &self.speaking_rate)
            .field("player", &self.player)
            .field("volume", &self.volume)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Read the config file (or defaults) and apply environment overrides.
///
/// A missing file is normal; an unreadable or malformed one is logged and
/// ignored so synthesis is never blocked by a bad config.
pub fn read_speak_config() -> SpeakConfig {
    let path = get_config_path();
    let mut config = match load_from(&path) {
        Ok(Some(config)) => config,
        Ok(None) => SpeakConfig::default(),
        Err(e) => {
            warn!("{:#}", e);
            SpeakConfig::default()
        }
    };
    apply_env(&mut config, std::env::var(API_KEY_ENV).ok());
    config
}

/// Load a config file. Returns `Ok(None)` when the file does not exist.
pub fn load_from(path: &Path) -> anyhow::Result<Option<SpeakConfig>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(config))
}

/// Path to speak_config.json.
pub fn get_config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| get_data_dir().join("speak_config.json"))
}

fn apply_env(config: &mut SpeakConfig, api_key: Option<String>) {
    if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
        config.api_key = Some(key);
    }
}
