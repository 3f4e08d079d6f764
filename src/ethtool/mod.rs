// ethtool statistics client: GSSET_INFO -> GSTRINGS -> GSTATS against one interface.
// Strings and values carry no identifiers on the wire; they pair by position.

mod ioctl;
pub mod wire;

pub use ioctl::{IFNAMSIZ, IoctlTransport, SIOCETHTOOL};

use crate::error::CounterError;
use crate::models::CounterSnapshot;
use tracing::instrument;

/// Delivers one ethtool command buffer to the kernel for `interface`, in place.
pub trait Transport: Send + Sync {
    fn exchange(&self, interface: &str, buf: &mut [u8]) -> std::io::Result<()>;
}

pub struct EthtoolClient<T> {
    transport: T,
}

impl<T: Transport> EthtoolClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(
        &self,
        interface: &str,
        phase: &'static str,
        buf: &mut [u8],
    ) -> Result<(), CounterError> {
        self.transport
            .exchange(interface, buf)
            .map_err(|source| CounterError::Query {
                interface: interface.to_string(),
                phase,
                source,
            })
    }

    /// Number of entries in `set_id`; 0 if the adapter does not support the set.
    pub fn string_set_len(&self, interface: &str, set_id: u32) -> Result<u32, CounterError> {
        let mut buf = wire::sset_info_request(set_id);
        self.send(interface, "sset_info", &mut buf)?;
        Ok(wire::sset_info_count(&buf))
    }

    pub fn string_set(
        &self,
        interface: &str,
        set_id: u32,
        count: u32,
    ) -> Result<Vec<String>, CounterError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut buf = wire::gstrings_request(set_id, count);
        self.send(interface, "gstrings", &mut buf)?;
        let actual = wire::gstrings_len(&buf);
        if actual != count {
            return Err(CounterError::Malformed {
                interface: interface.to_string(),
                phase: "gstrings",
                expected: count,
                actual,
            });
        }
        Ok(wire::gstrings_names(&buf, count))
    }

    pub fn stats(&self, interface: &str, count: u32) -> Result<Vec<u64>, CounterError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut buf = wire::gstats_request(count);
        self.send(interface, "gstats", &mut buf)?;
        let actual = wire::gstats_len(&buf);
        if actual != count {
            return Err(CounterError::Malformed {
                interface: interface.to_string(),
                phase: "gstats",
                expected: count,
                actual,
            });
        }
        Ok(wire::gstats_values(&buf, count))
    }

    /// All ETH_SS_STATS counters of `interface`, in string-table order.
    #[instrument(level = "debug", skip(self), fields(operation = "read_counters"))]
    pub fn read_counters(&self, interface: &str) -> Result<CounterSnapshot, CounterError> {
        if ioctl::ifr_name(interface).is_none() {
            return Err(CounterError::InterfaceName {
                interface: interface.to_string(),
            });
        }
        let count = self.string_set_len(interface, wire::ETH_SS_STATS)?;
        let names = self.string_set(interface, wire::ETH_SS_STATS, count)?;
        let values = self.stats(interface, count)?;
        Ok(names.into_iter().zip(values).collect())
    }
}
