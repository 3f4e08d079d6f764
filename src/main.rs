use anyhow::Result;
use ibtop::*;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to the display
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        interval_ms = app_config.sampling.interval_ms,
        window_size = app_config.sampling.window_size,
        "starting ibtop"
    );

    let devices = discovery::discover(
        Path::new(&app_config.discovery.registry_path),
        &app_config.discovery.driver_filter,
    )
    .unwrap_or_else(|e| {
        tracing::warn!(error = %e, operation = "discover", "device discovery failed");
        Vec::new()
    });
    tracing::info!(
        devices = ?devices.iter().map(|d| format!("{}/{}", d.controller, d.interface)).collect::<Vec<_>>(),
        "discovered active devices"
    );

    let transport = ethtool::IoctlTransport::open()
        .map_err(|e| anyhow::anyhow!("ethtool control socket: {}", e))?;
    let client = Arc::new(ethtool::EthtoolClient::new(transport));

    let (tx, rx) =
        broadcast::channel::<models::ThroughputFrame>(app_config.display.broadcast_capacity);
    let display_handle = render::spawn(
        rx,
        app_config.display.clone(),
        app_config.sampling.rate_basis,
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            client,
            devices: Arc::new(devices),
            tx,
            shutdown_rx,
        },
        worker::WorkerConfig {
            sample_interval_ms: app_config.sampling.interval_ms,
            window_size: app_config.sampling.window_size,
            scale: app_config.sampling.scale,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    // The worker owns the only sender; the display exits once it is gone.
    let _ = worker_handle.await;
    let _ = display_handle.await;

    Ok(())
}
