use serde::Deserialize;
use std::path::Path;

/// Config file looked up in the working directory when CONFIG_FILE is not set.
pub const DEFAULT_CONFIG_FILE: &str = "ibtop.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampling: SamplingConfig,
    pub discovery: DiscoveryConfig,
    pub display: DisplayConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_ms: u64,
    /// Raw samples kept per counter; rate series have one fewer entry.
    pub window_size: usize,
    /// Divisor applied to byte deltas (1_000_000 gives the "Mbps" column).
    pub scale: u64,
    pub rate_basis: RateBasis,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            window_size: 20,
            scale: 1_000_000,
            rate_basis: RateBasis::Tick,
        }
    }
}

/// Which rate the display shows: raw since-last-tick delta or per elapsed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateBasis {
    #[default]
    Tick,
    Elapsed,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub registry_path: String,
    /// Substring an adapter name must contain to be considered.
    pub driver_filter: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            registry_path: crate::discovery::DEFAULT_REGISTRY_PATH.into(),
            driver_filter: "mlx".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub format: DisplayFormat,
    pub sort_by_interface: bool,
    /// Frames buffered for the display task (a slow terminal skips frames).
    pub broadcast_capacity: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: DisplayFormat::Table,
            sort_by_interface: true,
            broadcast_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// How often to log sampler stats (ticks, per-device failures) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: 60,
        }
    }
}

impl AppConfig {
    /// CONFIG_FILE if set (must exist), else ibtop.toml if present, else defaults.
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var("CONFIG_FILE") {
            let s = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("config file {}: {}", path, e))?;
            return Self::load_from_str(&s);
        }
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            let s = std::fs::read_to_string(DEFAULT_CONFIG_FILE)?;
            return Self::load_from_str(&s);
        }
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.sampling.interval_ms > 0,
            "sampling.interval_ms must be > 0, got {}",
            self.sampling.interval_ms
        );
        anyhow::ensure!(
            self.sampling.window_size >= 2,
            "sampling.window_size must be >= 2, got {}",
            self.sampling.window_size
        );
        anyhow::ensure!(
            self.sampling.scale > 0,
            "sampling.scale must be > 0, got {}",
            self.sampling.scale
        );
        anyhow::ensure!(
            !self.discovery.registry_path.is_empty(),
            "discovery.registry_path must be non-empty"
        );
        anyhow::ensure!(
            !self.discovery.driver_filter.is_empty(),
            "discovery.driver_filter must be non-empty"
        );
        anyhow::ensure!(
            self.display.broadcast_capacity > 0,
            "display.broadcast_capacity must be > 0, got {}",
            self.display.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
