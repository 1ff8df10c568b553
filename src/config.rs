//! Runtime settings.
//!
//! Resolution order, later wins:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. the YAML file named by `--config`
//! 3. individual CLI flags or their environment variables

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    pub source_url: String,
    pub rashifal_url: String,
    pub tts_url: String,
    pub tts_locale: String,
    pub tts_voice: String,
    pub tts_client_ip: Option<String>,
    pub refresh_interval_secs: u64,
    pub rashifal_interval_secs: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".to_string(),
            source_url: "https://www.hamropatro.com/".to_string(),
            rashifal_url: "https://www.hamropatro.com/rashifal".to_string(),
            tts_url: "https://app.micmonster.com/restapi/create".to_string(),
            tts_locale: "ne-NP".to_string(),
            tts_voice: "ne-NP-SagarNeural".to_string(),
            tts_client_ip: None,
            refresh_interval_secs: 900,
            rashifal_interval_secs: 6 * 60 * 60,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the config file and then the CLI.
    #[instrument(level = "info", skip_all)]
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_cli(cli);
        settings.validate()?;
        info!(
            bind_addr = %settings.bind_addr,
            source_url = %settings.source_url,
            refresh_interval_secs = settings.refresh_interval_secs,
            rashifal_interval_secs = settings.rashifal_interval_secs,
            "Resolved settings"
        );
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: display,
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        let overrides = [
            (&mut self.bind_addr, &cli.bind_addr),
            (&mut self.source_url, &cli.source_url),
            (&mut self.rashifal_url, &cli.rashifal_url),
            (&mut self.tts_url, &cli.tts_url),
            (&mut self.tts_locale, &cli.tts_locale),
            (&mut self.tts_voice, &cli.tts_voice),
        ];
        for (slot, value) in overrides {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        if cli.tts_client_ip.is_some() {
            self.tts_client_ip = cli.tts_client_ip.clone();
        }
        if let Some(secs) = cli.refresh_interval_secs {
            self.refresh_interval_secs = secs;
        }
        if let Some(secs) = cli.rashifal_interval_secs {
            self.rashifal_interval_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("refresh_interval_secs"));
        }
        if self.rashifal_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval("rashifal_interval_secs"));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn rashifal_interval(&self) -> Duration {
        Duration::from_secs(self.rashifal_interval_secs)
    }
}
