// Per-tick output handed to the presentation sink

use serde::{Deserialize, Serialize};

/// Windowed throughput for one tracked device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceThroughput {
    pub controller: String,
    pub interface: String,
    /// Scaled deltas across the inbound window (window size - 1 entries).
    pub rx_series: Vec<u64>,
    pub tx_series: Vec<u64>,
    /// Delta between the two most recent samples, divided by the scale.
    pub rx_rate: f64,
    pub tx_rate: f64,
    /// Same delta normalized by elapsed seconds between the two samples.
    #[serde(default)]
    pub rx_rate_per_sec: Option<f64>,
    #[serde(default)]
    pub tx_rate_per_sec: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughputFrame {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub devices: Vec<DeviceThroughput>,
}
