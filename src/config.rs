use crate::error::{Error, Result};
use crate::logging;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "CHATTER_GUILD_CONFIG";
const CONFIG_FILE_NAME: &str = "chatter_guild.json";
const LLM_CONFIG_FILE_NAME: &str = "llm_config.json";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    /// Override for the player profile location.
    pub profile_path: Option<PathBuf>,
    /// Explicit location of the LLM config file.
    pub llm_config_path: Option<PathBuf>,
}

/// Tunables for scoring, sessions and Musical Chairs matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Token memory is cleared once it holds more than this many tokens.
    pub token_memory_capacity: usize,
    /// Exponential smoothing factor for archetype blending.
    pub blend_alpha: f64,
    pub turns_per_round: u32,
    pub sets_to_win: u32,
    pub role_draw_attempts: u32,
    pub partner_timeout_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            token_memory_capacity: 200,
            blend_alpha: 0.15,
            turns_per_round: 8,
            sets_to_win: 3,
            role_draw_attempts: 50,
            partner_timeout_secs: 15,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        if self.token_memory_capacity == 0 {
            return Err(Error::config("token_memory_capacity must be at least 1"));
        }
        if !(self.blend_alpha > 0.0 && self.blend_alpha <= 1.0) {
            return Err(Error::config(format!(
                "blend_alpha must be in (0, 1], got {}",
                self.blend_alpha
            )));
        }
        if self.turns_per_round < 2 {
            return Err(Error::config("turns_per_round must be at least 2"));
        }
        if self.sets_to_win < 1 {
            return Err(Error::config("sets_to_win must be at least 1"));
        }
        if self.role_draw_attempts < 1 {
            return Err(Error::config("role_draw_attempts must be at least 1"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load from `$CHATTER_GUILD_CONFIG` or `./chatter_guild.json`.
    /// Returns `Default` if the file is missing, unparseable or invalid.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                logging::log_session(
                    None,
                    &format!("No config file at {}, using defaults", path.display()),
                );
                return Self::default();
            }
        };

        let config: AppConfig = match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                logging::log_error(
                    None,
                    &format!("Failed to parse config at {}: {}. Using defaults", path.display(), e),
                );
                return Self::default();
            }
        };

        if let Err(e) = config.game.validate() {
            logging::log_error(None, &format!("{}. Using default game settings", e));
            return Self {
                game: GameConfig::default(),
                ..config
            };
        }

        logging::log_session(None, &format!("Loaded config from {}", path.display()));
        config
    }

    /// Resolved profile location (override or `~/.chatter_guild/player_profile.json`).
    pub fn profile_path(&self) -> PathBuf {
        self.profile_path
            .clone()
            .unwrap_or_else(|| logging::data_dir().join("player_profile.json"))
    }
}

/// Connection settings for the LLM partner (`llm_config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub endpoint: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            api_key: String::new(),
            endpoint: String::new(),
            max_tokens: 300,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
            && !self.provider.trim().is_empty()
            && !self.endpoint.trim().is_empty()
    }

    /// Search the explicit path, the executable's directory, then the
    /// working directory. The first readable and valid config wins.
    pub fn load(explicit: Option<&Path>) -> Option<Self> {
        let mut search_paths: Vec<PathBuf> = Vec::new();
        if let Some(path) = explicit {
            search_paths.push(path.to_path_buf());
        }
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            search_paths.push(dir.join(LLM_CONFIG_FILE_NAME));
        }
        search_paths.push(PathBuf::from(LLM_CONFIG_FILE_NAME));

        search_paths.iter().find_map(|path| Self::load_file(path))
    }

    fn load_file(path: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str::<LlmConfig>(&json) {
            Ok(config) if config.is_valid() => Some(config),
            Ok(_) => {
                logging::log_partner(
                    None,
                    &format!("LLM config at {} is incomplete, ignoring", path.display()),
                );
                None
            }
            Err(e) => {
                logging::log_error(
                    None,
                    &format!("Failed to parse LLM config at {}: {}", path.display(), e),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_game_config() {
        let config = GameConfig::default();
        assert_eq!(config.token_memory_capacity, 200);
        assert_eq!(config.turns_per_round, 8);
        assert_eq!(config.sets_to_win, 3);
        assert_eq!(config.role_draw_attempts, 50);
        assert!((config.blend_alpha - 0.15).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = GameConfig {
            turns_per_round: 1,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            blend_alpha: 0.0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = AppConfig::load_from(Path::new("/nonexistent/chatter_guild.json"));
        assert_eq!(config.game.turns_per_round, 8);
        assert!(config.profile_path.is_none());
    }

    #[test]
    fn test_config_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatter_guild.json");
        std::fs::write(&path, r#"{"game": {"sets_to_win": 2}, "profile_path": "/tmp/p.db"}"#)
            .unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.game.sets_to_win, 2);
        assert_eq!(config.game.turns_per_round, 8);
        assert_eq!(config.profile_path(), PathBuf::from("/tmp/p.db"));
    }

    #[test]
    fn test_config_invalid_game_section_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatter_guild.json");
        std::fs::write(&path, r#"{"game": {"sets_to_win": 0}}"#).unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.game.sets_to_win, 3);
    }

    #[test]
    fn test_llm_config_requires_key_provider_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm_config.json");

        std::fs::write(&path, r#"{"provider": "openai", "api_key": ""}"#).unwrap();
        assert!(LlmConfig::load_file(&path).is_none());

        std::fs::write(
            &path,
            r#"{"provider": "openai", "model": "gpt-4o", "api_key": "sk-test", "endpoint": "http://localhost/v1/chat/completions"}"#,
        )
        .unwrap();
        let config = LlmConfig::load_file(&path).unwrap();
        assert_eq!(config.max_tokens, 300);
        assert!((config.temperature - 0.7).abs() < 1e-6);
    }
}
