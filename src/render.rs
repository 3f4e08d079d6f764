// Display task: consumes ThroughputFrames and prints a table or JSON lines to stdout.

use crate::config::{DisplayConfig, DisplayFormat, RateBasis};
use crate::models::{DeviceThroughput, ThroughputFrame};
use std::fmt::Write as _;
use std::io::Write as _;
use tokio::sync::broadcast;

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Bars scaled between the series min and max; a flat series is all lowest bars.
pub fn sparkline(values: &[u64]) -> String {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };
    let span = max - min;
    values
        .iter()
        .map(|v| {
            if span == 0 {
                return SPARK_BARS[0];
            }
            let idx = ((v - min) as u128 * (SPARK_BARS.len() as u128 - 1) / span as u128) as usize;
            SPARK_BARS[idx]
        })
        .collect()
}

fn rate_pair(d: &DeviceThroughput, basis: RateBasis) -> (f64, f64) {
    match basis {
        RateBasis::Tick => (d.rx_rate, d.tx_rate),
        RateBasis::Elapsed => (
            d.rx_rate_per_sec.unwrap_or(0.0),
            d.tx_rate_per_sec.unwrap_or(0.0),
        ),
    }
}

/// Text table of one frame, one row per device.
pub fn render_table(frame: &ThroughputFrame, basis: RateBasis, sort_by_interface: bool) -> String {
    let mut out = String::new();
    if frame.devices.is_empty() {
        out.push_str("no active InfiniBand devices\n");
        return out;
    }
    let mut rows: Vec<&DeviceThroughput> = frame.devices.iter().collect();
    if sort_by_interface {
        rows.sort_by(|a, b| a.interface.cmp(&b.interface));
    }
    let _ = writeln!(
        out,
        "{:<12} {:<12} {:<20} {:<20} {:>32}",
        "Device", "Net", "RX", "TX", "Throughput"
    );
    for d in rows {
        let (rx, tx) = rate_pair(d, basis);
        let _ = writeln!(
            out,
            "{:<12} {:<12} {:<20} {:<20} {:>32}",
            d.controller,
            d.interface,
            sparkline(&d.rx_series),
            sparkline(&d.tx_series),
            format!("{rx:.2} / {tx:.2} Mbps"),
        );
    }
    out
}

fn present(frame: &ThroughputFrame, config: &DisplayConfig, basis: RateBasis) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    match config.format {
        DisplayFormat::Table => {
            let table = render_table(frame, basis, config.sort_by_interface);
            write!(stdout, "{CLEAR_SCREEN}{table}")?;
        }
        DisplayFormat::Json => {
            serde_json::to_writer(&mut stdout, frame)?;
            writeln!(stdout)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

/// Spawns the display task; it exits when the worker drops its sender.
pub fn spawn(
    mut rx: broadcast::Receiver<ThroughputFrame>,
    config: DisplayConfig,
    basis: RateBasis,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(frame) => {
                    if let Err(e) = present(&frame, &config, basis) {
                        tracing::warn!(error = %e, operation = "present", "display write failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "display lagged, skipping frames");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("Display shutting down");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(controller: &str, interface: &str) -> DeviceThroughput {
        DeviceThroughput {
            controller: controller.into(),
            interface: interface.into(),
            rx_series: vec![0, 4, 8],
            tx_series: vec![1, 1, 1],
            rx_rate: 8.0,
            tx_rate: 0.5,
            rx_rate_per_sec: Some(80.0),
            tx_rate_per_sec: None,
        }
    }

    #[test]
    fn sparkline_spans_min_to_max() {
        assert_eq!(sparkline(&[0, 7, 14]), "▁▄█");
    }

    #[test]
    fn sparkline_flat_and_empty() {
        assert_eq!(sparkline(&[5, 5, 5]), "▁▁▁");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn table_sorts_by_interface_and_formats_rates() {
        let frame = ThroughputFrame {
            timestamp: 0,
            devices: vec![device("mlx5_1", "ib1"), device("mlx5_0", "ib0")],
        };
        let table = render_table(&frame, RateBasis::Tick, true);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Device"));
        assert!(lines[1].starts_with("mlx5_0"));
        assert!(lines[2].contains("8.00 / 0.50 Mbps"));
    }

    #[test]
    fn table_elapsed_basis_uses_normalized_rates() {
        let frame = ThroughputFrame {
            timestamp: 0,
            devices: vec![device("mlx5_0", "ib0")],
        };
        let table = render_table(&frame, RateBasis::Elapsed, false);
        assert!(table.contains("80.00 / 0.00 Mbps"));
    }

    #[test]
    fn table_without_devices() {
        let frame = ThroughputFrame {
            timestamp: 0,
            devices: vec![],
        };
        assert_eq!(
            render_table(&frame, RateBasis::Tick, true),
            "no active InfiniBand devices\n"
        );
    }
}
