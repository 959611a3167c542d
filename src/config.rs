//! Configuration types.
//!
//! Settings are layered: defaults, then the JSON settings file, then
//! `TAROT_ORACLE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::llm::Provider;
use crate::locale::Locale;
use crate::responder::llm::DEFAULT_MAX_TOOL_ITERATIONS;
use crate::responder::{LlmResponderConfig, MockConfig};

/// Which responder answers messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderMode {
    #[default]
    Mock,
    Real,
}

impl ResponderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Real => "real",
        }
    }
}

impl std::fmt::Display for ResponderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResponderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "real" | "llm" => Ok(Self::Real),
            other => Err(ConfigError::InvalidValue {
                key: "mode".to_string(),
                message: format!("unknown mode '{}', expected mock or real", other),
            }),
        }
    }
}

/// Oracle configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub mode: ResponderMode,
    pub provider: Provider,
    pub api_key: Option<SecretString>,
    /// Empty means the provider's default model.
    pub model: String,
    pub locale: Locale,
    /// Write the API key to the settings file on save.
    pub persist_keys: bool,
    /// Mock pause before answering.
    pub thinking_delay: Duration,
    /// Mock pause between typed characters.
    pub char_delay: Duration,
    pub max_tool_iterations: usize,
    pub settings_path: PathBuf,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let mock = MockConfig::default();
        Self {
            mode: ResponderMode::default(),
            provider: Provider::default(),
            api_key: None,
            model: String::new(),
            locale: Locale::default(),
            persist_keys: false,
            thinking_delay: mock.thinking_delay,
            char_delay: mock.char_delay,
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
            settings_path: PathBuf::from(".tarot-oracle/settings.json"),
        }
    }
}

/// On-disk shape of the settings file. Absent fields keep their defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<ResponderMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    locale: Option<Locale>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    persist_keys: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

impl OracleConfig {
    /// Load from the settings file and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let settings_path = lookup("TAROT_ORACLE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
                PathBuf::from(home).join(".tarot-oracle/settings.json")
            });

        let mut config = Self {
            locale: lookup("LANG").map(|l| Locale::detect(&l)).unwrap_or_default(),
            settings_path,
            ..Self::default()
        };

        if config.settings_path.exists() {
            let path = config.settings_path.clone();
            config.apply_file(&path)?;
        }

        if let Some(mode) = lookup("TAROT_ORACLE_MODE") {
            config.mode = mode.parse()?;
        }
        if let Some(provider) = lookup("TAROT_ORACLE_PROVIDER") {
            config.provider = provider.parse()?;
        }
        if let Some(key) = lookup("TAROT_ORACLE_API_KEY").filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(SecretString::from(key));
        }
        if let Some(model) = lookup("TAROT_ORACLE_MODEL") {
            config.model = model;
        }
        if let Some(locale) = lookup("TAROT_ORACLE_LOCALE") {
            config.locale = locale.parse().map_err(|message| ConfigError::InvalidValue {
                key: "locale".to_string(),
                message,
            })?;
        }
        if let Some(ms) = lookup("TAROT_ORACLE_THINKING_MS").and_then(|s| s.parse().ok()) {
            config.thinking_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = lookup("TAROT_ORACLE_CHAR_MS").and_then(|s| s.parse().ok()) {
            config.char_delay = Duration::from_millis(ms);
        }

        debug!(
            mode = %config.mode,
            provider = %config.provider,
            locale = %config.locale,
            path = %config.settings_path.display(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let file: SettingsFile = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        if let Some(mode) = file.mode {
            self.mode = mode;
        }
        if let Some(provider) = file.provider {
            self.provider = provider;
        }
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(locale) = file.locale {
            self.locale = locale;
        }
        if let Some(persist) = file.persist_keys {
            self.persist_keys = persist;
        }
        if let Some(key) = file.api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(SecretString::from(key));
        }
        Ok(())
    }

    /// Write the settings file. The API key is only written when
    /// `persist_keys` is set.
    pub fn save(&self) -> Result<(), ConfigError> {
        let file = SettingsFile {
            mode: Some(self.mode),
            provider: Some(self.provider),
            model: Some(self.model.clone()).filter(|m| !m.is_empty()),
            locale: Some(self.locale),
            persist_keys: Some(self.persist_keys),
            api_key: self
                .api_key
                .as_ref()
                .filter(|_| self.persist_keys)
                .map(|k| k.expose_secret().to_string()),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(dir) = self.settings_path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.settings_path, json)?;
        info!(path = %self.settings_path.display(), "Settings saved");
        Ok(())
    }

    /// Delete the settings file. Missing files are fine.
    pub fn clear(&self) -> Result<(), ConfigError> {
        match std::fs::remove_file(&self.settings_path) {
            Ok(()) => {
                info!(path = %self.settings_path.display(), "Settings cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn mock_config(&self) -> MockConfig {
        MockConfig {
            thinking_delay: self.thinking_delay,
            char_delay: self.char_delay,
        }
    }

    pub fn responder_config(&self) -> LlmResponderConfig {
        LlmResponderConfig {
            provider: self.provider,
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            locale: self.locale,
            max_tool_iterations: self.max_tool_iterations,
        }
    }
}
