use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name used under the platform config directory
const APP_DIR: &str = "transcript-extractor";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where and how transcripts are written
    pub output: OutputConfig,

    /// HTTP client and retry settings
    pub network: NetworkConfig,

    /// Web front end settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory (current working directory if not set)
    pub directory: Option<PathBuf>,

    /// How segment texts are joined in the written file
    pub separator: SegmentSeparator,
}

/// Joiner placed between consecutive segment texts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentSeparator {
    /// One segment per line
    #[default]
    Newline,
    /// Single running paragraph
    Space,
}

impl SegmentSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentSeparator::Newline => "\n",
            SegmentSeparator::Space => " ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent to the provider
    pub user_agent: String,

    /// Accept-Language header sent to the provider
    pub accept_language: String,

    /// Retry policy for transient failures
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per provider call, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds
    pub initial_delay_ms: u64,

    /// Factor applied to the delay after each failed attempt
    pub backoff_multiplier: f64,

    /// Upper bound for a single delay, in milliseconds
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the web front end to
    pub host: String,

    /// Port to bind the web front end to
    pub port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            separator: SegmentSeparator::Newline,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            accept_language: "en-US".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 8_000,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default locations.
    ///
    /// A missing file at a default location is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Ok(path) if path.exists() => path,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config from {}", path.display());

        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, or to the default location
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join(APP_DIR).join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let retry = &self.network.retry;
        if retry.max_attempts == 0 {
            anyhow::bail!("network.retry.max_attempts must be at least 1");
        }
        if !retry.backoff_multiplier.is_finite() || retry.backoff_multiplier < 1.0 {
            anyhow::bail!("network.retry.backoff_multiplier must be a number >= 1.0");
        }
        if self.network.timeout_secs == 0 {
            anyhow::bail!("network.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Output directory, defaulting to the current working directory
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Output Directory: {}", self.output_dir().display());
        println!("  Segment Separator: {:?}", self.output.separator);
        println!("  Request Timeout: {}s", self.network.timeout_secs);
        println!("  Accept-Language: {}", self.network.accept_language);
        println!(
            "  Retry: {} attempts, {}ms initial delay, x{} backoff (max {}ms)",
            self.network.retry.max_attempts,
            self.network.retry.initial_delay_ms,
            self.network.retry.backoff_multiplier,
            self.network.retry.max_delay_ms
        );
        println!("  Server: {}:{}", self.server.host, self.server.port);
    }
}
