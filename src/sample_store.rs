// Per-device sliding windows of raw counter values and the rates derived from them.

use crate::error::StoreError;
use crate::models::{CounterSnapshot, Device, DeviceThroughput, TrackedCounter};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Fixed-capacity FIFO of raw counter values. Always exactly `capacity` long once seeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    values: VecDeque<u64>,
}

impl SampleWindow {
    /// Seed with `capacity` copies of the first observed value so the first deltas are zero.
    pub fn seeded(value: u64, capacity: usize) -> Self {
        Self {
            values: std::iter::repeat_n(value, capacity).collect(),
        }
    }

    pub fn push(&mut self, value: u64) {
        self.values.pop_front();
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.values.iter().copied()
    }

    /// Adjacent differences, oldest first. Counters that went backwards give 0.
    pub fn deltas(&self) -> impl Iterator<Item = u64> + '_ {
        self.values
            .iter()
            .zip(self.values.iter().skip(1))
            .map(|(prev, next)| next.saturating_sub(*prev))
    }

    pub fn latest_delta(&self) -> u64 {
        self.deltas().last().unwrap_or(0)
    }
}

#[derive(Debug)]
struct DeviceWindows {
    device: Device,
    rx: SampleWindow,
    tx: SampleWindow,
    last_seen: Instant,
    /// Seconds between the two most recent observations.
    last_elapsed: Option<f64>,
}

impl DeviceWindows {
    fn window(&self, counter: TrackedCounter) -> &SampleWindow {
        match counter {
            TrackedCounter::InboundPhyBytes => &self.rx,
            TrackedCounter::OutboundPhyBytes => &self.tx,
        }
    }
}

/// Owns every tracked device's windows; mutated only by the sampling loop.
#[derive(Debug)]
pub struct SampleStore {
    window_size: usize,
    scale: u64,
    devices: HashMap<String, DeviceWindows>,
}

fn tracked_pair(device: &Device, snapshot: &CounterSnapshot) -> Result<(u64, u64), StoreError> {
    let get = |counter: TrackedCounter| {
        snapshot
            .tracked(counter)
            .ok_or_else(|| StoreError::MissingCounter {
                controller: device.controller.clone(),
                counter,
            })
    };
    Ok((
        get(TrackedCounter::InboundPhyBytes)?,
        get(TrackedCounter::OutboundPhyBytes)?,
    ))
}

impl SampleStore {
    pub fn new(window_size: usize, scale: u64) -> Self {
        Self {
            window_size: window_size.max(2),
            scale: scale.max(1),
            devices: HashMap::new(),
        }
    }

    pub fn is_tracked(&self, controller: &str) -> bool {
        self.devices.contains_key(controller)
    }

    /// Seed both tracked windows from `snapshot`, replacing any previous windows.
    pub fn initialize(
        &mut self,
        device: &Device,
        snapshot: &CounterSnapshot,
    ) -> Result<(), StoreError> {
        let (rx, tx) = tracked_pair(device, snapshot)?;
        self.devices.insert(
            device.controller.clone(),
            DeviceWindows {
                device: device.clone(),
                rx: SampleWindow::seeded(rx, self.window_size),
                tx: SampleWindow::seeded(tx, self.window_size),
                last_seen: Instant::now(),
                last_elapsed: None,
            },
        );
        Ok(())
    }

    /// Append one sample per tracked counter. A snapshot missing either counter drops the
    /// device from tracking rather than inserting a placeholder value.
    pub fn update(&mut self, device: &Device, snapshot: &CounterSnapshot) -> Result<(), StoreError> {
        if !self.is_tracked(&device.controller) {
            return Err(StoreError::NotTracked {
                controller: device.controller.clone(),
            });
        }
        let (rx, tx) = match tracked_pair(device, snapshot) {
            Ok(pair) => pair,
            Err(e) => {
                self.devices.remove(&device.controller);
                return Err(e);
            }
        };
        let Some(windows) = self.devices.get_mut(&device.controller) else {
            return Err(StoreError::NotTracked {
                controller: device.controller.clone(),
            });
        };
        let now = Instant::now();
        windows.last_elapsed = Some(now.duration_since(windows.last_seen).as_secs_f64());
        windows.last_seen = now;
        windows.rx.push(rx);
        windows.tx.push(tx);
        Ok(())
    }

    /// `update` for tracked devices, `initialize` otherwise.
    pub fn observe(&mut self, device: &Device, snapshot: &CounterSnapshot) -> Result<(), StoreError> {
        if self.is_tracked(&device.controller) {
            self.update(device, snapshot)
        } else {
            self.initialize(device, snapshot)
        }
    }

    pub fn window(&self, controller: &str, counter: TrackedCounter) -> Option<&SampleWindow> {
        self.devices.get(controller).map(|w| w.window(counter))
    }

    /// Scaled deltas over the current window (window size - 1 entries), truncated.
    pub fn rate_series(&self, controller: &str, counter: TrackedCounter) -> Option<Vec<u64>> {
        let window = self.window(controller, counter)?;
        Some(window.deltas().map(|d| d / self.scale).collect())
    }

    /// Delta between the two most recent samples divided by the scale, not time-normalized.
    pub fn latest_rate(&self, controller: &str, counter: TrackedCounter) -> Option<f64> {
        let window = self.window(controller, counter)?;
        Some(window.latest_delta() as f64 / self.scale as f64)
    }

    /// `latest_rate` per elapsed second; None until a device has two observations.
    pub fn latest_rate_per_second(&self, controller: &str, counter: TrackedCounter) -> Option<f64> {
        let windows = self.devices.get(controller)?;
        let elapsed = windows.last_elapsed.filter(|s| *s > 0.0)?;
        let delta = windows.window(counter).latest_delta();
        Some(delta as f64 / self.scale as f64 / elapsed)
    }

    /// Current throughput of one tracked device.
    pub fn throughput(&self, controller: &str) -> Option<DeviceThroughput> {
        let windows = self.devices.get(controller)?;
        let rx = TrackedCounter::InboundPhyBytes;
        let tx = TrackedCounter::OutboundPhyBytes;
        Some(DeviceThroughput {
            controller: windows.device.controller.clone(),
            interface: windows.device.interface.clone(),
            rx_series: self.rate_series(controller, rx)?,
            tx_series: self.rate_series(controller, tx)?,
            rx_rate: self.latest_rate(controller, rx)?,
            tx_rate: self.latest_rate(controller, tx)?,
            rx_rate_per_sec: self.latest_rate_per_second(controller, rx),
            tx_rate_per_sec: self.latest_rate_per_second(controller, tx),
        })
    }
}
