// Discovered adapter identity

use serde::{Deserialize, Serialize};

/// One InfiniBand adapter and the network interface that exposes its ethtool counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Driver-assigned instance name, e.g. `mlx5_0`.
    pub controller: String,
    /// Kernel network interface, e.g. `ib0`.
    pub interface: String,
}

impl Device {
    pub fn new(controller: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            interface: interface.into(),
        }
    }
}
