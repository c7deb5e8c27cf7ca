use crate::forwarder::ForwarderConfig;
use anyhow::{Result, anyhow};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Relay configuration, loaded from CLI, environment, or a TOML config file
///
/// Example configuration file content
/// # Thumbnail Relay Configuration
///
/// listen_on_port = 8080
///
/// # Image generation API (both required)
/// api_url = "https://api.freepik.com/v1/ai/text-to-image/flux-dev"
/// api_key = "FPSX..."
///
/// # Outbound timeouts in seconds
/// request_timeout_secs = 30
/// connect_timeout_secs = 10
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "RELAY_PORT", default_value_t = 8080)]
    #[serde(default = "default_port")]
    pub listen_on_port: u16,

    /// Image generation endpoint requests are forwarded to
    #[arg(long, env = "FREEPIK_API_URL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// API key sent as the x-freepik-api-key header
    #[arg(long, env = "FREEPIK_API_KEY", hide_env_values = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Total timeout of one outbound call, in seconds
    #[arg(long, env = "RELAY_REQUEST_TIMEOUT", default_value_t = 30)]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout of one outbound call, in seconds
    #[arg(long, env = "RELAY_CONNECT_TIMEOUT", default_value_t = 10)]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Configuration file path (values given on the command line win)
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_on_port: default_port(),
            api_url: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            config: None,
        }
    }
}

impl Config {
    /// Load configuration from CLI args, optionally merging with a config file
    pub fn load() -> Result<Self> {
        let mut config = Config::parse();

        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(Path::new(config_path))?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Merge with file config, CLI args take precedence
    ///
    /// A CLI or env value equal to its default cannot be told apart from an
    /// unset one, so the file value wins in that case.
    fn merge_with_file(mut self, file_config: Config) -> Self {
        if self.listen_on_port == default_port() {
            self.listen_on_port = file_config.listen_on_port;
        }
        if self.request_timeout_secs == default_request_timeout_secs() {
            self.request_timeout_secs = file_config.request_timeout_secs;
        }
        if self.connect_timeout_secs == default_connect_timeout_secs() {
            self.connect_timeout_secs = file_config.connect_timeout_secs;
        }

        if self.api_url.is_none() {
            self.api_url = file_config.api_url;
        }
        if self.api_key.is_none() {
            self.api_key = file_config.api_key;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let api_url = self
            .api_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("API URL is required (--api-url or FREEPIK_API_URL)"))?;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(anyhow!("API URL must start with http:// or https://"));
        }

        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(anyhow!("API key is required (--api-key or FREEPIK_API_KEY)"));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be greater than zero"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("Connect timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Settings for the payload forwarder. Fails when a required value is missing.
    pub fn forwarder_config(&self) -> Result<ForwarderConfig> {
        self.validate()?;

        Ok(ForwarderConfig {
            api_url: self.api_url.clone().unwrap_or_default(),
            api_key: self.api_key.clone().unwrap_or_default(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        })
    }
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}
