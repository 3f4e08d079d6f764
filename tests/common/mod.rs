// Shared test helpers: a fake SIOCETHTOOL kernel and a temp /sys/class/infiniband tree.
#![allow(dead_code)]

use ibtop::ethtool::Transport;
use ibtop::ethtool::wire::{ETH_GSTRING_LEN, ETHTOOL_GSSET_INFO, ETHTOOL_GSTATS, ETHTOOL_GSTRINGS};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

const ENODEV: i32 = 19;
const EINVAL: i32 = 22;
const EOPNOTSUPP: i32 = 95;

#[derive(Debug, Clone, Default)]
pub struct FakeNic {
    pub names: Vec<String>,
    pub values: Vec<u64>,
    /// Clear the set mask in GSSET_INFO replies.
    pub unsupported: bool,
    /// Count reported by GSSET_INFO instead of names.len().
    pub advertised: Option<u32>,
    /// Fail every exchange with EOPNOTSUPP.
    pub fail: bool,
}

impl FakeNic {
    pub fn phy(rx: u64, tx: u64) -> Self {
        Self {
            names: vec!["rx_bytes_phy".into(), "tx_bytes_phy".into()],
            values: vec![rx, tx],
            ..Default::default()
        }
    }
}

#[derive(Default)]
pub struct FakeTransport {
    nics: Mutex<HashMap<String, FakeNic>>,
    calls: Mutex<Vec<(String, u32)>>,
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn write_u32(buf: &mut [u8], offset: usize, v: u32) {
    buf[offset..offset + 4].copy_from_slice(&v.to_ne_bytes());
}

impl FakeTransport {
    pub fn with_nic(interface: &str, nic: FakeNic) -> Self {
        let t = Self::default();
        t.set_nic(interface, nic);
        t
    }

    pub fn set_nic(&self, interface: &str, nic: FakeNic) {
        self.nics.lock().unwrap().insert(interface.to_string(), nic);
    }

    pub fn set_values(&self, interface: &str, values: Vec<u64>) {
        if let Some(nic) = self.nics.lock().unwrap().get_mut(interface) {
            nic.values = values;
        }
    }

    /// (interface, ethtool command) for every exchange, in order.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, interface: &str) -> usize {
        self.calls().iter().filter(|(i, _)| i == interface).count()
    }
}

impl Transport for FakeTransport {
    fn exchange(&self, interface: &str, buf: &mut [u8]) -> std::io::Result<()> {
        let cmd = read_u32(buf, 0);
        self.calls.lock().unwrap().push((interface.to_string(), cmd));
        let nics = self.nics.lock().unwrap();
        let nic = nics
            .get(interface)
            .ok_or_else(|| std::io::Error::from_raw_os_error(ENODEV))?;
        if nic.fail {
            return Err(std::io::Error::from_raw_os_error(EOPNOTSUPP));
        }
        match cmd {
            ETHTOOL_GSSET_INFO => {
                if nic.unsupported {
                    buf[8..16].copy_from_slice(&0u64.to_ne_bytes());
                } else {
                    let count = nic.advertised.unwrap_or(nic.names.len() as u32);
                    write_u32(buf, 16, count);
                }
            }
            // Like the kernel, GSTRINGS/GSTATS write every current entry whatever the
            // header asks for; a buffer that is too small panics on the slice.
            ETHTOOL_GSTRINGS => {
                for (i, name) in nic.names.iter().enumerate() {
                    let off = 12 + i * ETH_GSTRING_LEN;
                    let bytes = name.as_bytes();
                    buf[off..off + bytes.len()].copy_from_slice(bytes);
                }
                write_u32(buf, 8, nic.names.len() as u32);
            }
            ETHTOOL_GSTATS => {
                for (i, v) in nic.values.iter().enumerate() {
                    let off = 8 + i * 8;
                    buf[off..off + 8].copy_from_slice(&v.to_ne_bytes());
                }
                write_u32(buf, 4, nic.values.len() as u32);
            }
            _ => return Err(std::io::Error::from_raw_os_error(EINVAL)),
        }
        Ok(())
    }
}

/// Adds `<root>/<controller>/device/net/<interface>/operstate`.
pub fn add_device(root: &Path, controller: &str, interface: &str, operstate: &str) {
    let dir = root
        .join(controller)
        .join("device")
        .join("net")
        .join(interface);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("operstate"), format!("{operstate}\n")).unwrap();
}
