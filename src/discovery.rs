// InfiniBand adapter discovery via /sys/class/infiniband.
// <root>/<controller>/device/net/<interface>/operstate

use crate::error::{DeviceError, DiscoveryError};
use crate::models::Device;
use std::path::Path;
use tracing::instrument;

pub const DEFAULT_REGISTRY_PATH: &str = "/sys/class/infiniband";

/// Adapters under `root` whose name contains `driver_filter` and whose interface is up.
/// A missing registry yields an empty list.
#[instrument(fields(operation = "discover"))]
pub fn discover(root: &Path, driver_filter: &str) -> Result<Vec<Device>, DiscoveryError> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %root.display(), "InfiniBand registry not present");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(DiscoveryError::Registry {
                path: root.to_path_buf(),
                source,
            });
        }
    };

    let mut controllers: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(driver_filter))
        .collect();
    controllers.sort();

    let mut devices = Vec::with_capacity(controllers.len());
    for controller in controllers {
        match resolve_device(root, &controller) {
            Ok(Some(device)) => devices.push(device),
            Ok(None) => {
                tracing::debug!(device = %controller, "interface not up, skipping");
            }
            Err(e) => {
                tracing::warn!(error = %e, device = %controller, "device resolution failed");
            }
        }
    }
    Ok(devices)
}

/// Resolve the single bound interface and keep the device only when operstate is `up`.
fn resolve_device(root: &Path, controller: &str) -> Result<Option<Device>, DeviceError> {
    let net_dir = root.join(controller).join("device").join("net");
    let interface = bound_interface(&net_dir, controller)?;
    let state_path = net_dir.join(&interface).join("operstate");
    let state = std::fs::read_to_string(&state_path).map_err(|source| DeviceError::Io {
        controller: controller.to_string(),
        path: state_path.clone(),
        source,
    })?;
    if state.trim() == "up" {
        Ok(Some(Device::new(controller, interface)))
    } else {
        Ok(None)
    }
}

fn bound_interface(net_dir: &Path, controller: &str) -> Result<String, DeviceError> {
    let io_err = |source| DeviceError::Io {
        controller: controller.to_string(),
        path: net_dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(net_dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    match names.len() {
        0 => Err(DeviceError::NoInterface {
            controller: controller.to_string(),
        }),
        1 => Ok(names.remove(0)),
        _ => {
            names.sort();
            Err(DeviceError::MultipleInterfaces {
                controller: controller.to_string(),
                found: names,
            })
        }
    }
}
