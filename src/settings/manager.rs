use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::AppError;

/// Environment variable that overrides `api.api_key`
pub const API_KEY_ENV: &str = "VOICE_RECORDER_API_KEY";

/// Environment variable that overrides `api.base_url`
pub const BASE_URL_ENV: &str = "VOICE_RECORDER_BASE_URL";

/// Main settings structure containing all application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub budgets: TokenBudgets,
}

/// Remote endpoint settings shared by transcription and completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_sixty")]
    pub transcription_connect_timeout_secs: u64,
    #[serde(default = "default_sixty")]
    pub transcription_read_timeout_secs: u64,
    #[serde(default = "default_thirty")]
    pub completion_connect_timeout_secs: u64,
    #[serde(default = "default_sixty")]
    pub completion_read_timeout_secs: u64,
}

/// Completion models per surface
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    /// Summaries, naming, todos, document summaries
    pub text_model: String,
    /// Free-form chat
    pub chat_model: String,
    /// Image-grounded chat
    pub vision_model: String,
}

/// `max_tokens` budget for each completion task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenBudgets {
    pub summary: u32,
    pub smart_name: u32,
    pub todos: u32,
    pub document: u32,
    pub chat: u32,
    pub vision: u32,
}

fn default_base_url() -> String {
    "https://api.siliconflow.cn/v1".to_string()
}

fn default_transcription_model() -> String {
    "FunAudioLLM/SenseVoiceSmall".to_string()
}

fn default_sixty() -> u64 {
    60
}

fn default_thirty() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            transcription_model: default_transcription_model(),
            transcription_connect_timeout_secs: default_sixty(),
            transcription_read_timeout_secs: default_sixty(),
            completion_connect_timeout_secs: default_thirty(),
            completion_read_timeout_secs: default_sixty(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            text_model: "deepseek-ai/DeepSeek-V3".to_string(),
            chat_model: "Qwen/Qwen3-8B".to_string(),
            vision_model: "Qwen/Qwen2.5-VL-7B-Instruct".to_string(),
        }
    }
}

impl Default for TokenBudgets {
    fn default() -> Self {
        Self {
            summary: 2000,
            smart_name: 30,
            todos: 500,
            document: 2000,
            chat: 1500,
            vision: 1500,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            models: ModelSettings::default(),
            budgets: TokenBudgets::default(),
        }
    }
}

/// Manages settings persistence and provides thread-safe access
pub struct SettingsManager {
    settings_path: PathBuf,
    current_settings: Arc<RwLock<Settings>>,
}

impl SettingsManager {
    /// Creates a new SettingsManager with a custom settings path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The settings directory cannot be created
    /// - The settings file cannot be read or written
    pub fn new_with_path(settings_path: PathBuf) -> Result<Self, AppError> {
        if let Some(parent) = settings_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Config(format!("Failed to create settings directory: {}", e))
                })?;
            }
        }

        let manager = Self {
            settings_path: settings_path.clone(),
            current_settings: Arc::new(RwLock::new(Settings::default())),
        };

        let settings = if settings_path.exists() {
            manager.load_from_file()?
        } else {
            let defaults = Settings::default();
            manager.save_to_file(&defaults)?;
            defaults
        };

        *manager
            .current_settings
            .write()
            .map_err(|e| AppError::Config(format!("Failed to acquire write lock: {}", e)))? =
            settings;

        Ok(manager)
    }

    /// Returns the effective settings: the stored values with environment
    /// overrides applied on top.
    pub fn get(&self) -> Settings {
        let mut settings = match self.current_settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        apply_env_overrides(&mut settings);
        settings
    }

    /// Returns the settings as stored on disk, without environment overrides
    pub fn get_stored(&self) -> Settings {
        match self.current_settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Updates settings (validates, persists to disk, then updates in-memory)
    ///
    /// Ordering:
    /// 1. Validate settings
    /// 2. Persist to disk
    /// 3. Update in-memory state only if persist succeeded
    ///
    /// If an error occurs, in-memory state remains unchanged.
    pub fn update(&self, settings: Settings) -> Result<(), AppError> {
        Self::validate(&settings)?;

        self.save_to_file(&settings)?;

        *self
            .current_settings
            .write()
            .map_err(|e| AppError::Config(format!("Failed to acquire write lock: {}", e)))? =
            settings;

        tracing::info!("Settings: Updated {}", self.settings_path.display());
        Ok(())
    }

    /// Validates settings schema and constraints
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - base_url is not an http(s) URL
    /// - any model name is empty
    /// - any token budget is zero
    /// - any timeout is outside 1..=600 seconds
    pub fn validate(settings: &Settings) -> Result<(), AppError> {
        let base_url = settings.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "Base URL must start with http:// or https://, got '{}'",
                settings.api.base_url
            )));
        }

        let models = [
            ("transcription_model", &settings.api.transcription_model),
            ("text_model", &settings.models.text_model),
            ("chat_model", &settings.models.chat_model),
            ("vision_model", &settings.models.vision_model),
        ];
        for (name, value) in models {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{} cannot be empty", name)));
            }
        }

        let budgets = &settings.budgets;
        let all_budgets = [
            ("summary", budgets.summary),
            ("smart_name", budgets.smart_name),
            ("todos", budgets.todos),
            ("document", budgets.document),
            ("chat", budgets.chat),
            ("vision", budgets.vision),
        ];
        for (name, value) in all_budgets {
            if value == 0 {
                return Err(AppError::Config(format!(
                    "Token budget '{}' must be greater than 0",
                    name
                )));
            }
        }

        let api = &settings.api;
        let timeouts = [
            ("transcription_connect_timeout_secs", api.transcription_connect_timeout_secs),
            ("transcription_read_timeout_secs", api.transcription_read_timeout_secs),
            ("completion_connect_timeout_secs", api.completion_connect_timeout_secs),
            ("completion_read_timeout_secs", api.completion_read_timeout_secs),
        ];
        for (name, value) in timeouts {
            if !(1..=600).contains(&value) {
                return Err(AppError::Config(format!(
                    "{} must be between 1 and 600 seconds, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Loads settings from disk
    ///
    /// If the file contains invalid JSON or values that fail [`Self::validate`],
    /// logs a warning and returns defaults.
    fn load_from_file(&self) -> Result<Settings, AppError> {
        let contents = std::fs::read_to_string(&self.settings_path)
            .map_err(|e| AppError::Config(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Settings: Failed to parse settings JSON: {}. Using defaults.", e);
                return Ok(Settings::default());
            }
        };

        if let Err(e) = Self::validate(&settings) {
            tracing::warn!("Settings: Stored settings are invalid: {}. Using defaults.", e);
            return Ok(Settings::default());
        }

        Ok(settings)
    }

    /// Saves settings to disk atomically (temporary file + rename)
    fn save_to_file(&self, settings: &Settings) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Config(format!("Failed to serialize settings: {}", e)))?;

        let temp_path = self.settings_path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| {
            AppError::Config(format!("Failed to write temporary settings file: {}", e))
        })?;

        std::fs::rename(&temp_path, &self.settings_path)
            .map_err(|e| AppError::Config(format!("Failed to rename settings file: {}", e)))?;

        Ok(())
    }
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            settings.api.api_key = key.trim().to_string();
        }
    }
    if let Ok(url) = std::env::var(BASE_URL_ENV) {
        if !url.trim().is_empty() {
            settings.api.base_url = url.trim().to_string();
        }
    }
}
