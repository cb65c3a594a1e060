//! Client configuration
//! Handles loading the config file and applying environment overrides

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::session::ColumnPolicy;

/// Connection settings for one ESM instance
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the ESM, scheme included (e.g. `https://esm:8443`)
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub login: String,

    #[serde(default)]
    pub password: String,

    /// Check the validity of the server certificate
    #[serde(default = "default_verify")]
    pub verify: bool,

    #[serde(default)]
    pub proxies: ProxyConfig,

    /// Resource id of the default active list
    #[serde(default)]
    pub list_id: Option<String>,

    /// How batch entries with keys beyond the first entry's columns are treated
    #[serde(default)]
    pub column_policy: ColumnPolicy,

    /// Upper bound on the logout call made at teardown
    #[serde(default = "default_logout_timeout")]
    pub logout_timeout_secs: u64,
}

fn default_verify() -> bool {
    true
}

fn default_logout_timeout() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            login: String::new(),
            password: String::new(),
            verify: default_verify(),
            proxies: ProxyConfig::default(),
            list_id: None,
            column_policy: ColumnPolicy::default(),
            logout_timeout_secs: default_logout_timeout(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("verify", &self.verify)
            .field("proxies", &self.proxies)
            .field("list_id", &self.list_id)
            .field("column_policy", &self.column_policy)
            .field("logout_timeout_secs", &self.logout_timeout_secs)
            .finish()
    }
}

/// Proxy URLs per scheme, e.g. `http: "http://127.0.0.1:8080"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub http: Option<String>,
    #[serde(default)]
    pub https: Option<String>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            login: login.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_list_id(mut self, list_id: impl Into<String>) -> Self {
        self.list_id = Some(list_id.into());
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_proxies(mut self, proxies: ProxyConfig) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn with_column_policy(mut self, column_policy: ColumnPolicy) -> Self {
        self.column_policy = column_policy;
        self
    }

    /// Load config from the default location or specified path.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// file that was asked for explicitly is an error. Environment
    /// overrides are applied afterwards.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let (config_path, explicit) = Self::config_path(path)?;

        let mut config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path).map_err(|e| {
                Error::Configuration(format!("failed to read {:?}: {}", config_path, e))
            })?;
            let config: ClientConfig = serde_yaml::from_str(&raw).map_err(|e| {
                Error::Configuration(format!("failed to parse {:?}: {}", config_path, e))
            })?;
            debug!("Loaded config from {:?}", config_path);
            config
        } else if explicit {
            return Err(Error::Configuration(format!(
                "config file not found: {:?}",
                config_path
            )));
        } else {
            info!("No config file at {:?}, using defaults", config_path);
            ClientConfig::default()
        };

        config.apply_env();
        Ok(config)
    }

    /// Override fields from `ESM_URL`, `ESM_LOGIN`, `ESM_PASSWORD` and `ESM_LIST_ID`
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("ESM_URL") {
            self.url = url;
        }
        if let Ok(login) = std::env::var("ESM_LOGIN") {
            self.login = login;
        }
        if let Ok(password) = std::env::var("ESM_PASSWORD") {
            self.password = password;
        }
        if let Ok(list_id) = std::env::var("ESM_LIST_ID") {
            self.list_id = Some(list_id);
        }
    }

    /// URL, login and password must all be present before logging in
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::Configuration(
                "Please provide the URL of your ArcSight ESM".to_string(),
            ));
        }
        if self.login.is_empty() || self.password.is_empty() {
            return Err(Error::Configuration(
                "Please provide your login and password".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the config file path and whether it was chosen explicitly
    fn config_path(path: Option<&str>) -> Result<(PathBuf, bool)> {
        // Check env override first
        if let Ok(env_path) = std::env::var("ESM_LISTS_CONFIG") {
            return Ok((PathBuf::from(env_path), true));
        }

        if let Some(p) = path {
            return Ok((PathBuf::from(p), true));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Configuration("Cannot find home directory".to_string()))?;
        Ok((home.join(".esm-lists").join("config.yml"), false))
    }
}
