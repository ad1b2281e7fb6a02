// ABOUTME: Configuration types and parsing for molt.yml.
// ABOUTME: Handles YAML parsing, endpoint entries, and interval settings.

use crate::error::{Error, Result};
use crate::update::PassSettings;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "molt.yml";
pub const CONFIG_FILENAME_ALT: &str = "molt.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".molt/config.yml";

pub const DEFAULT_ENDPOINT: &str = "unix:///var/run/docker.sock";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Daemon endpoints to watch. Each endpoint gets its own pass schedule
    /// and its own counter entries.
    #[serde(deserialize_with = "deserialize_endpoints")]
    pub endpoints: NonEmpty<EndpointConfig>,

    /// Only consider running containers whose name matches this filter.
    #[serde(default)]
    pub monitor: Option<String>,

    /// Time between passes.
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Bound on every individual daemon call.
    #[serde(default = "default_api_timeout", with = "humantime_serde")]
    pub api_timeout: Duration,

    /// Grace period handed to the daemon when stopping a container.
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    /// Bound on image pulls.
    #[serde(default = "default_pull_timeout", with = "humantime_serde")]
    pub pull_timeout: Duration,

    /// How many containers may be evaluated concurrently within a pass.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pull the latest image before resolving its digest.
    #[serde(default = "default_pull")]
    pub pull: bool,

    /// Host identifier used in report events. Defaults to the machine
    /// hostname.
    #[serde(default)]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Unix socket path (optionally `unix://`-prefixed) or a `tcp://`
    /// address.
    pub address: String,
}

fn default_interval() -> Duration {
    Duration::from_secs(300)
}

fn default_api_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_pull_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_concurrency() -> usize {
    1
}

fn default_pull() -> bool {
    true
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The host identifier for report events.
    pub fn host(&self) -> String {
        self.hostname.clone().unwrap_or_else(|| {
            gethostname::gethostname()
                .to_string_lossy()
                .into_owned()
        })
    }

    /// Materialize the tunables the update core needs for a pass.
    pub fn pass_settings(&self) -> PassSettings {
        PassSettings {
            name_filter: self.monitor.clone(),
            api_timeout: self.api_timeout,
            stop_timeout: self.stop_timeout,
            pull_timeout: self.pull_timeout,
            concurrency: self.concurrency,
            pull: self.pull,
        }
    }

    pub fn template() -> Self {
        Config {
            endpoints: NonEmpty::new(EndpointConfig {
                address: DEFAULT_ENDPOINT.to_string(),
            }),
            monitor: None,
            interval: default_interval(),
            api_timeout: default_api_timeout(),
            stop_timeout: default_stop_timeout(),
            pull_timeout: default_pull_timeout(),
            concurrency: default_concurrency(),
            pull: default_pull(),
            hostname: None,
        }
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let config = Config::template();
    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"endpoints:
  - {}
interval: 5m
# monitor: my-app
"#,
        config.endpoints.first().address
    )
}

// Custom deserializers

fn deserialize_endpoints<'de, D>(
    deserializer: D,
) -> std::result::Result<NonEmpty<EndpointConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<EndpointEntry> = Vec::deserialize(deserializer)?;
    let endpoints = values
        .into_iter()
        .map(EndpointEntry::into_endpoint_config)
        .collect::<Vec<_>>();

    NonEmpty::from_vec(endpoints)
        .ok_or_else(|| serde::de::Error::custom("at least one endpoint is required"))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EndpointEntry {
    Simple(String),
    Detailed(EndpointConfig),
}

impl EndpointEntry {
    fn into_endpoint_config(self) -> EndpointConfig {
        match self {
            EndpointEntry::Simple(address) => EndpointConfig { address },
            EndpointEntry::Detailed(c) => c,
        }
    }
}
