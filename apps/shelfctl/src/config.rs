//! CLI configuration.
//!
//! Credentials and the API base URL come from
//! `~/.config/shelf/shelfctl.toml`, overridable through the
//! `SHELF_CLIENT_ID` / `SHELF_CLIENT_SECRET` / `SHELF_BASE_URL`
//! environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shelf_client::Credentials;

const DEFAULT_BASE_URL: &str = "https://open-api.shelfdrive.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: default_base_url(),
        }
    }
}

impl CliConfig {
    /// Loads the config file if present, then applies environment
    /// overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(id) = std::env::var("SHELF_CLIENT_ID") {
            self.client_id = id;
        }
        if let Ok(secret) = std::env::var("SHELF_CLIENT_SECRET") {
            self.client_secret = secret;
        }
        if let Ok(url) = std::env::var("SHELF_BASE_URL") {
            self.base_url = url;
        }
    }

    /// Returns API credentials, or an actionable error when they are
    /// not configured.
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            anyhow::bail!(
                "client credentials not configured; set them in \
                 ~/.config/shelf/shelfctl.toml:\n\n\
                 client_id = \"xxxxx\"\n\
                 client_secret = \"xxxxx\"\n\n\
                 or export SHELF_CLIENT_ID=xxxxx SHELF_CLIENT_SECRET=xxxxx"
            );
        }
        Ok(Credentials {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        })
    }
}

fn config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("shelf")
            .join("shelfctl.toml"),
    )
}
