//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `DD_*`
//! environment variables, and merging file configurations with proper
//! precedence rules. Combining the layers with command-line flags is left to
//! the front end.

use crate::error::DomainDetailsError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Name of the per-directory and XDG config files.
const CONFIG_FILE_NAME: &str = "domaindetails.toml";

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// json = true
///
/// [endpoints]
/// whois_api_url = "https://api.domaindetails.io"
///
/// [cache]
/// dir = "/var/cache/domaindetails"
///
/// [timeouts]
/// rdap = "10s"
/// whois = "15s"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Upstream service locations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<EndpointsConfig>,

    /// Bootstrap cache location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,

    /// Per-request timeouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<TimeoutsConfig>,
}

/// Default values for the global CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EndpointsConfig {
    /// IANA bootstrap document URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_url: Option<String>,

    /// WHOIS aggregation API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_api_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheConfig {
    /// Directory holding the bootstrap snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Timeouts as strings, e.g. "10s", "2m" or bare seconds.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TimeoutsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rdap: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Home directory, for the global config file
    home_dir: Option<PathBuf>,
    /// XDG config root (`$XDG_CONFIG_HOME` or `~/.config`)
    xdg_config_dir: Option<PathBuf>,
    /// Directory searched for a local config file
    working_dir: PathBuf,
}

impl ConfigManager {
    /// Create a configuration manager for the current user and directory.
    pub fn new() -> Self {
        let home_dir = dirs::home_dir();
        let xdg_config_dir = env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home_dir.as_ref().map(|home| home.join(".config")));

        Self {
            home_dir,
            xdg_config_dir,
            working_dir: PathBuf::from("."),
        }
    }

    /// Create a configuration manager searching explicit locations.
    pub fn with_search_roots(
        home_dir: Option<PathBuf>,
        xdg_config_dir: Option<PathBuf>,
        working_dir: PathBuf,
    ) -> Self {
        Self {
            home_dir,
            xdg_config_dir,
            working_dir,
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if reading, parsing or validation
    /// fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainDetailsError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainDetailsError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainDetailsError::config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            DomainDetailsError::config(format!(
                "Failed to parse TOML configuration {}: {}",
                path.display(),
                e
            ))
        })?;

        // Validate the loaded configuration
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Later files override earlier ones field by field:
    /// 1. `$XDG_CONFIG_HOME/domaindetails/config.toml`
    /// 2. `~/.domaindetails.toml`
    /// 3. `./domaindetails.toml`
    ///
    /// A file that exists but fails to load is skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();

        for path in self.candidate_paths() {
            if !path.exists() {
                continue;
            }

            match self.load_file(&path) {
                Ok(config) => {
                    debug!("Loaded configuration from {}", path.display());
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => warn!("Ignoring configuration file: {}", e),
            }
        }

        merged_config
    }

    /// Config file locations, lowest precedence first.
    fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(xdg) = &self.xdg_config_dir {
            paths.push(xdg.join("domaindetails").join("config.toml"));
        }
        if let Some(home) = &self.home_dir {
            paths.push(home.join(format!(".{}", CONFIG_FILE_NAME)));
        }
        paths.push(self.working_dir.join(CONFIG_FILE_NAME));

        paths
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: merge_section(lower.defaults, higher.defaults, |l, h| DefaultsConfig {
                json: h.json.or(l.json),
                raw: h.raw.or(l.raw),
                verbose: h.verbose.or(l.verbose),
            }),
            endpoints: merge_section(lower.endpoints, higher.endpoints, |l, h| EndpointsConfig {
                bootstrap_url: h.bootstrap_url.or(l.bootstrap_url),
                whois_api_url: h.whois_api_url.or(l.whois_api_url),
            }),
            cache: merge_section(lower.cache, higher.cache, |l, h| CacheConfig {
                dir: h.dir.or(l.dir),
            }),
            timeouts: merge_section(lower.timeouts, higher.timeouts, |l, h| TimeoutsConfig {
                rdap: h.rdap.or(l.rdap),
                whois: h.whois.or(l.whois),
                bootstrap: h.bootstrap.or(l.bootstrap),
            }),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainDetailsError> {
        if let Some(endpoints) = &config.endpoints {
            for (key, url) in [
                ("bootstrap_url", &endpoints.bootstrap_url),
                ("whois_api_url", &endpoints.whois_api_url),
            ] {
                if let Some(url) = url {
                    if !is_http_url(url) {
                        return Err(DomainDetailsError::config(format!(
                            "Invalid {} '{}'. Must start with http:// or https://",
                            key, url
                        )));
                    }
                }
            }
        }

        if let Some(cache) = &config.cache {
            if cache.dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
                return Err(DomainDetailsError::config(
                    "Cache directory cannot be empty",
                ));
            }
        }

        if let Some(timeouts) = &config.timeouts {
            for (key, value) in [
                ("rdap", &timeouts.rdap),
                ("whois", &timeouts.whois),
                ("bootstrap", &timeouts.bootstrap),
            ] {
                if let Some(value) = value {
                    if parse_timeout(value).is_none() {
                        return Err(DomainDetailsError::config(format!(
                            "Invalid {} timeout '{}'. Use format like '5s', '30s', '2m'",
                            key, value
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_section<T>(lower: Option<T>, higher: Option<T>, merge: impl FnOnce(T, T) -> T) -> Option<T> {
    match (lower, higher) {
        (Some(lower), Some(higher)) => Some(merge(lower, higher)),
        (lower, higher) => higher.or(lower),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via DD_* environment
/// variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub json: Option<bool>,
    pub raw: Option<bool>,
    pub verbose: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    pub bootstrap_url: Option<String>,
    pub whois_api_url: Option<String>,
    pub rdap_timeout: Option<Duration>,
    pub whois_timeout: Option<Duration>,
    pub config: Option<PathBuf>,
}

/// Load configuration from the process environment.
///
/// Parses all DD_* environment variables. Invalid values are logged as
/// warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_with(|key| env::var(key).ok())
}

/// Load configuration from an arbitrary variable source.
pub fn load_env_config_with<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    let flag = |key: &str| -> Option<bool> {
        let val = lookup(key)?;
        let parsed = parse_bool(&val);
        if parsed.is_none() {
            warn!("Invalid {}='{}', use true/false", key, val);
        }
        parsed
    };

    let text = |key: &str| -> Option<String> {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let url = |key: &str| -> Option<String> {
        let val = text(key)?;
        if is_http_url(&val) {
            Some(val)
        } else {
            warn!("Invalid {}='{}', must start with http:// or https://", key, val);
            None
        }
    };

    let timeout = |key: &str| -> Option<Duration> {
        let val = text(key)?;
        let parsed = parse_timeout(&val);
        if parsed.is_none() {
            warn!("Invalid {}='{}', use format like '5s', '30s', '2m'", key, val);
        }
        parsed
    };

    env_config.json = flag("DD_JSON");
    env_config.raw = flag("DD_RAW");
    env_config.verbose = flag("DD_VERBOSE");
    env_config.cache_dir = text("DD_CACHE_DIR").map(PathBuf::from);
    env_config.bootstrap_url = url("DD_BOOTSTRAP_URL");
    env_config.whois_api_url = url("DD_WHOIS_API_URL");
    env_config.rdap_timeout = timeout("DD_RDAP_TIMEOUT");
    env_config.whois_timeout = timeout("DD_WHOIS_TIMEOUT");
    env_config.config = text("DD_CONFIG").map(PathBuf::from);

    env_config
}

/// Parse a boolean flag value ("true", "1", "yes", "on" and their negations).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into a duration.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(s) = timeout_str.strip_suffix('s') {
        s.parse::<u64>().ok()
    } else if let Some(m) = timeout_str.strip_suffix('m') {
        m.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    }?;

    (secs > 0).then(|| Duration::from_secs(secs))
}
