use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{env, fs, path::Path, path::PathBuf};
use tracing::warn;

const APP_NAME: &str = "cadprompt";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const KEY_ENV_VARS: [&str; 2] = ["CADPROMPT_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `openai` or `local`; `local` never contacts the network.
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            max_tokens: 200,
            temperature: 0.1,
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// The credential to use, environment first. `None` selects the local
    /// fallback interpreter.
    pub fn api_key(&self) -> Option<String> {
        if self.provider == "local" {
            return None;
        }
        KEY_ENV_VARS
            .iter()
            .filter_map(|var| env::var(var).ok())
            .chain(self.api_key.clone())
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub debug: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub behavior: BehaviorConfig,
    /// Per-action default overrides, e.g. `[schema.create_box] length = 20.0`.
    pub schema: BTreeMap<String, BTreeMap<String, f64>>,
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("config.toml")
}

pub fn load_config() -> Config {
    load_config_from(&get_config_path())
}

pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Config::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config, using defaults");
            Config::default()
        }
    }
}

pub fn save_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    save_config_to(config, &get_config_path())
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.llm.max_tokens, 200);
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[llm]\nmodel = \"gpt-4o-mini\"\n\n[schema.create_gear]\nnumber_of_teeth = 32\n",
        )
        .unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.behavior.debug);
        assert_eq!(config.schema["create_gear"]["number_of_teeth"], 32.0);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[llm\nmodel = ").unwrap();
        assert_eq!(load_config_from(&path), Config::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.behavior.debug = true;
        config.llm.api_key = Some("sk-saved".to_string());

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn local_provider_never_yields_a_key() {
        let llm = LlmConfig {
            provider: "local".to_string(),
            api_key: Some("sk-ignored".to_string()),
            ..LlmConfig::default()
        };
        assert_eq!(llm.api_key(), None);
    }

    #[test]
    fn configured_key_is_used_when_env_is_unset() {
        let llm = LlmConfig {
            api_key: Some("  sk-config  ".to_string()),
            ..LlmConfig::default()
        };
        if KEY_ENV_VARS.iter().all(|v| env::var(v).is_err()) {
            assert_eq!(llm.api_key().as_deref(), Some("sk-config"));
        } else {
            assert!(llm.api_key().is_some());
        }
    }
}
