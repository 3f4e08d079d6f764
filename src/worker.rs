// Sampling loop: read every device's counters each tick, feed the sample store,
// broadcast a ThroughputFrame to the display.

use crate::ethtool::{EthtoolClient, Transport};
use crate::models::{Device, ThroughputFrame};
use crate::sample_store::SampleStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Rate limit for "no receivers" message (avoid logging every tick when nothing is listening)
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

/// Client, devices, channels, and shutdown for the worker.
pub struct WorkerDeps<T> {
    pub client: Arc<EthtoolClient<T>>,
    pub devices: Arc<Vec<Device>>,
    pub tx: broadcast::Sender<ThroughputFrame>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing and window config.
pub struct WorkerConfig {
    pub sample_interval_ms: u64,
    pub window_size: usize,
    pub scale: u64,
    /// How often to log sampler stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Outcome counts of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub sampled: usize,
    pub failed: usize,
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                operation = "get_timestamp",
                "system time error"
            );
            0
        })
}

/// One sampling pass over `devices`, in order. Failures are isolated per device.
///
/// Only devices sampled in this pass are reported. A device whose query fails
/// keeps its window for the next pass but is left out of the frame.
pub fn sample_tick<T: Transport>(
    client: &EthtoolClient<T>,
    devices: &[Device],
    store: &mut SampleStore,
) -> (ThroughputFrame, TickStats) {
    let mut stats = TickStats::default();
    let mut reported = Vec::with_capacity(devices.len());
    for device in devices {
        let snapshot = match client.read_counters(&device.interface) {
            Ok(s) => s,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(
                    error = %e,
                    device = %device.controller,
                    interface = %device.interface,
                    operation = "read_counters",
                    "counter query failed"
                );
                continue;
            }
        };
        if let Err(e) = store.observe(device, &snapshot) {
            stats.failed += 1;
            tracing::warn!(
                error = %e,
                device = %device.controller,
                interface = %device.interface,
                operation = "observe",
                "device excluded from windowed tracking"
            );
            continue;
        }
        stats.sampled += 1;
        reported.extend(store.throughput(&device.controller));
    }

    let frame = ThroughputFrame {
        timestamp: now_millis(),
        devices: reported,
    };
    (frame, stats)
}

pub fn spawn<T: Transport + 'static>(
    deps: WorkerDeps<T>,
    config: WorkerConfig,
) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        client,
        devices,
        tx,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        sample_interval_ms,
        window_size,
        scale,
        stats_log_interval_secs,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);
    let worker_span = tracing::span!(
        tracing::Level::DEBUG,
        "worker",
        sample_interval_ms,
        devices = devices.len()
    );

    let task = async move {
        let mut tick = interval(Duration::from_millis(sample_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Moved into the blocking task each tick and handed back, so it has one writer.
        let mut store = Some(SampleStore::new(window_size, scale));
        let mut ticks_total: u64 = 0;
        let mut failures_total: u64 = 0;
        let mut last_no_receivers_warn: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let Some(mut owned) = store.take() else {
                        break;
                    };
                    let client = client.clone();
                    let devices = devices.clone();
                    let joined = tokio::task::spawn_blocking(move || {
                        let (frame, stats) = sample_tick(&*client, &devices, &mut owned);
                        (owned, frame, stats)
                    })
                    .await;
                    let (owned, frame, stats) = match joined {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                operation = "sample_tick",
                                "sampling task failed"
                            );
                            break;
                        }
                    };
                    store = Some(owned);
                    ticks_total += 1;
                    failures_total += stats.failed as u64;

                    if tx.send(frame).is_err() {
                        let should_warn = last_no_receivers_warn
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                        if should_warn {
                            tracing::debug!(
                                operation = "broadcast_frame",
                                "No display attached; broadcast channel has no receivers"
                            );
                            last_no_receivers_warn = Some(Instant::now());
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        devices = devices.len(),
                        ticks_total,
                        failures_total,
                        "sampler stats"
                    );
                }
            }
        }
    };
    tokio::spawn(task.instrument(worker_span))
}
