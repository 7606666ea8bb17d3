use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::clients::telegram::DEFAULT_API_URL;
use crate::core::clients::validate_endpoint;
use crate::core::error_log::DEFAULT_ERROR_LOG;

pub const CONFIG_ENV: &str = "SPEND_NOTIFY_CONFIG";
pub const BOT_TOKEN_ENV: &str = "SPEND_NOTIFY_BOT_TOKEN";
pub const AWS_KEY_ENV: &str = "SPEND_NOTIFY_AWS_KEY";
pub const AWS_SECRET_ENV: &str = "SPEND_NOTIFY_AWS_SECRET";
pub const GROUP_ID_ENV: &str = "SPEND_NOTIFY_GROUP_ID";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Missing required setting '{0}'")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    #[serde(default)]
    pub bot_token: String,
    /// Group or channel id; TOML may give it as a string or an integer.
    #[serde(default, deserialize_with = "string_or_int")]
    pub chat_id: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsSettings {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Alternative Cost Explorer endpoint (VPC endpoint, proxy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

fn default_region() -> String {
    // Cost Explorer is served from us-east-1 only.
    "us-east-1".to_string()
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: default_region(),
            endpoint_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

fn default_error_log() -> PathBuf {
    PathBuf::from(DEFAULT_ERROR_LOG)
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            error_log: default_error_log(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

fn string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(id) => id.to_string(),
        Raw::Str(id) => id,
    })
}

pub const TEMPLATE: &str = r#"# spend-notify configuration

[telegram]
# Bot token from @BotFather
bot_token = ""
# Destination group id, e.g. "-1001234567890"
chat_id = ""
# api_url = "https://api.telegram.org"

[aws]
# Key pair allowed to call ce:GetCostAndUsage
access_key_id = ""
secret_access_key = ""
# region = "us-east-1"
# endpoint_url = "https://ce.us-east-1.amazonaws.com"

[report]
# Failures are appended here
# error_log = "errors.txt"
"#;

impl AppConfig {
    /// Get the config file path: `SPEND_NOTIFY_CONFIG`, else under XDG_CONFIG_HOME.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("spend-notify").join("config.toml")
    }

    /// Load config from `path` (or the default path), then apply environment
    /// overrides. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        let mut config = Self::load_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Override secrets from `lookup` (the process environment in production).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get(BOT_TOKEN_ENV) {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get(GROUP_ID_ENV) {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get(AWS_KEY_ENV) {
            self.aws.access_key_id = v;
        }
        if let Some(v) = get(AWS_SECRET_ENV) {
            self.aws.secret_access_key = v;
        }
    }

    /// Write the commented template to `path`. Refuses to overwrite.
    pub fn write_template(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .and_then(|mut file| std::io::Write::write_all(&mut file, TEMPLATE.as_bytes()))
    }

    /// Fail on the first missing secret needed to query costs.
    pub fn require_aws(&self) -> Result<&AwsSettings, ConfigError> {
        if self.aws.access_key_id.is_empty() {
            return Err(ConfigError::Missing("aws.access_key_id"));
        }
        if self.aws.secret_access_key.is_empty() {
            return Err(ConfigError::Missing("aws.secret_access_key"));
        }
        Ok(&self.aws)
    }

    /// Fail on the first missing secret needed to deliver the report.
    pub fn require_telegram(&self) -> Result<&TelegramSettings, ConfigError> {
        if self.telegram.bot_token.is_empty() {
            return Err(ConfigError::Missing("telegram.bot_token"));
        }
        if self.telegram.chat_id.is_empty() {
            return Err(ConfigError::Missing("telegram.chat_id"));
        }
        Ok(&self.telegram)
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.telegram.bot_token.is_empty() {
            issues.push(format!("telegram.bot_token is empty (or set {})", BOT_TOKEN_ENV));
        }
        if self.telegram.chat_id.is_empty() {
            issues.push(format!("telegram.chat_id is empty (or set {})", GROUP_ID_ENV));
        }
        if let Err(e) = validate_endpoint(&self.telegram.api_url, "telegram.api_url") {
            issues.push(e.to_string());
        }
        if self.aws.access_key_id.is_empty() {
            issues.push(format!("aws.access_key_id is empty (or set {})", AWS_KEY_ENV));
        }
        if self.aws.secret_access_key.is_empty() {
            issues.push(format!("aws.secret_access_key is empty (or set {})", AWS_SECRET_ENV));
        }
        if let Some(url) = &self.aws.endpoint_url {
            if let Err(e) = validate_endpoint(url, "aws.endpoint_url") {
                issues.push(e.to_string());
            }
        }
        if self.aws.region.trim().is_empty() {
            issues.push("aws.region is empty".to_string());
        }
        if self.report.error_log.as_os_str().is_empty() {
            issues.push("report.error_log is empty".to_string());
        }
        issues
    }
}
