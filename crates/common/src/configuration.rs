use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::consts::{
    DEFAULT_BIND_ADDRESS, DEFAULT_LINK_BUTTON_CLASS, DEFAULT_MAX_RETRIES, DEFAULT_URL_ALLOWLIST,
};
use crate::errors::ConfigError;
use crate::masking::MaskingConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub masking: Option<MaskingConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// How a URL's origin is compared against the allowlist.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UrlMatchMode {
    /// Same scheme and either the same host or a subdomain of the allowed host.
    #[default]
    Origin,
    /// Allowed when the entry is a substring of the URL's `scheme://authority`.
    Substring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default = "default_true")]
    pub preprocessing_enabled: bool,
    #[serde(default = "default_true")]
    pub postprocessing_enabled: bool,
    #[serde(default = "default_true")]
    pub checker_enabled: bool,
    #[serde(default = "default_url_allowlist")]
    pub url_allowlist: Vec<String>,
    #[serde(default)]
    pub url_match: UrlMatchMode,
    #[serde(default = "default_link_button_class")]
    pub link_button_class: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            preprocessing_enabled: true,
            postprocessing_enabled: true,
            checker_enabled: true,
            url_allowlist: default_url_allowlist(),
            url_match: UrlMatchMode::default(),
            link_button_class: default_link_button_class(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on drafts requested when postprocessing asks for a regeneration.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Console,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_url_allowlist() -> Vec<String> {
    DEFAULT_URL_ALLOWLIST.iter().map(|s| s.to_string()).collect()
}

fn default_link_button_class() -> String {
    DEFAULT_LINK_BUTTON_CLASS.to_string()
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

/// `"true"` in any case enables a flag; every other value disables it.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

impl Configuration {
    /// Load the YAML configuration at `path`. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "no configuration file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup, using the deployment's variable names.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(allowlist) = lookup("URL_ALLOWLIST") {
            self.processing.url_allowlist = allowlist
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = lookup("PREPROCESSING_ENABLED") {
            self.processing.preprocessing_enabled = parse_flag(&value);
        }
        if let Some(value) = lookup("POSTPROCESSING_ENABLED") {
            self.processing.postprocessing_enabled = parse_flag(&value);
        }
        if let Some(value) = lookup("CHECKER_ENABLED") {
            self.processing.checker_enabled = parse_flag(&value);
        }
        if let Some(value) = lookup("AGENT_MAX_RETRIES") {
            self.agent.max_retries = value.trim().parse().map_err(|e| {
                ConfigError::Invalid(format!("AGENT_MAX_RETRIES={value}: {e}"))
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.trim().to_lowercase();
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = match format.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "console" | "text" | "pretty" => LogFormat::Console,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "LOG_FORMAT must be `json` or `console`, got `{other}`"
                    )))
                }
            };
        }
        if let Some(bind_address) = lookup("BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_retries must be at least 1".to_string(),
            ));
        }

        let malformed: Vec<&str> = self
            .processing
            .url_allowlist
            .iter()
            .filter(|entry| !is_origin(entry))
            .map(String::as_str)
            .collect();
        if !malformed.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "url_allowlist entries must be http(s) origins: {}",
                malformed.join(", ")
            )));
        }

        Ok(())
    }
}

fn is_origin(entry: &str) -> bool {
    match url::Url::parse(entry) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some()
                && url.path() == "/"
                && url.query().is_none()
                && url.fragment().is_none()
        }
        Err(_) => false,
    }
}
