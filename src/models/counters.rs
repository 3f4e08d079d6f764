// Counter snapshot decoded from one GSTRINGS/GSTATS exchange

use serde::{Deserialize, Serialize};

/// Physical-layer byte counters the sampler keeps windows for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackedCounter {
    InboundPhyBytes,
    OutboundPhyBytes,
}

impl TrackedCounter {
    pub const ALL: [TrackedCounter; 2] = [
        TrackedCounter::InboundPhyBytes,
        TrackedCounter::OutboundPhyBytes,
    ];

    /// Name of the counter in the driver's ETH_SS_STATS string table.
    pub fn kernel_name(self) -> &'static str {
        match self {
            TrackedCounter::InboundPhyBytes => "rx_bytes_phy",
            TrackedCounter::OutboundPhyBytes => "tx_bytes_phy",
        }
    }
}

/// Name/value pairs in string-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    entries: Vec<(String, u64)>,
}

impl CounterSnapshot {
    pub fn new(entries: Vec<(String, u64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn tracked(&self, counter: TrackedCounter) -> Option<u64> {
        self.get(counter.kernel_name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

impl FromIterator<(String, u64)> for CounterSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
