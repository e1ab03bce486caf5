// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDC device daemon
//!
//! Announces the device with WS-Discovery and runs the WS-Eventing
//! subscription manager until Ctrl-C:
//! - Hello on start, Bye on stop
//! - Probe / Resolve answered on the discovery port
//! - expired subscriptions swept periodically
//!
//! # Usage
//!
//! ```bash
//! # Defaults: generated endpoint reference, 239.255.255.250:3702
//! sdc-device
//!
//! # Stable identity and transport address
//! sdc-device --endpoint-reference urn:uuid:3f1c... --xaddr http://10.0.0.5:8080/device
//!
//! # Full configuration file
//! sdc-device --config device.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sdc_host::{
    DeviceConfig, DiscoveryHost, HostError, Report, ReportAction, SubscriptionManager,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// SDC device - WS-Discovery target and WS-Eventing source
#[derive(Parser, Debug)]
#[command(name = "sdc-device")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint reference announced in Hello (overrides the config file)
    #[arg(short, long)]
    endpoint_reference: Option<String>,

    /// Transport address of the hosting service (repeatable)
    #[arg(short, long = "xaddr")]
    xaddrs: Vec<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Expired-subscription sweep period in seconds
    #[arg(long)]
    sweep_interval: Option<u64>,

    /// Emit a demo EpisodicMetricReport every N seconds
    #[arg(long)]
    report_interval: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long, default_value = "false")]
    dump_config: bool,
}

/// Config file (or defaults) with command line overrides applied.
fn load_config(args: &Args) -> Result<DeviceConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            DeviceConfig::from_file(path)?
        }
        None => DeviceConfig::default(),
    };

    if let Some(epr) = &args.endpoint_reference {
        config.endpoint_reference = Some(epr.clone());
    }
    if !args.xaddrs.is_empty() {
        config.xaddrs = args.xaddrs.clone();
    }
    if let Some(secs) = args.sweep_interval {
        config.eventing.sweep_interval_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(&args)?;
    // Pin the generated identity so a dumped config reproduces it.
    let identity = config.identity();
    config.endpoint_reference = Some(identity.endpoint_reference.clone());

    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("+----------------------------------------------------+");
    info!(
        "|       SDC Device v{}                              |",
        env!("CARGO_PKG_VERSION")
    );
    info!("+----------------------------------------------------+");
    info!("|  EPR:    {:40} |", identity.endpoint_reference);
    info!(
        "|  Group:  {:40} |",
        format!(
            "{}:{}",
            config.discovery.multicast_address, config.discovery.port
        )
    );
    info!("|  XAddrs: {:40} |", identity.xaddrs.join(" "));
    info!(
        "|  Sweep:  {:40} |",
        format!("{}s", config.eventing.sweep_interval_secs)
    );
    info!("+----------------------------------------------------+");

    let manager = Arc::new(SubscriptionManager::new(config.eventing.clone())?);
    let sweeper = manager.spawn_sweeper(config.eventing.sweep_interval());

    // start() waits for the reactor thread and stop() joins it.
    let mut host = DiscoveryHost::new(identity, config.discovery.clone());
    let mut host = tokio::task::spawn_blocking(move || {
        host.start()?;
        Ok::<_, HostError>(host)
    })
    .await??;

    let reporter = args.report_interval.map(|secs| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            let mut mdib_version: u64 = 0;
            loop {
                ticker.tick().await;
                mdib_version += 1;
                let payload = format!(
                    r#"<msg:EpisodicMetricReport xmlns:msg="http://standards.ieee.org/downloads/11073/11073-10207-2017/message" MdibVersion="{}"/>"#,
                    mdib_version
                );
                let queued =
                    manager.fire_event(&Report::new(ReportAction::EpisodicMetric, payload));
                tracing::debug!("Demo report {} queued for {} subscribers", mdib_version, queued);
            }
        })
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping device...");

    if let Some(reporter) = reporter {
        reporter.abort();
    }
    sweeper.abort();

    let ended = manager.shutdown(Duration::from_secs(5)).await;
    info!("{} subscriptions ended", ended);

    match tokio::task::spawn_blocking(move || host.stop()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Discovery host did not stop cleanly: {}", e),
        Err(e) => warn!("Discovery host stop task failed: {}", e),
    }

    info!("SDC device stopped");
    Ok(())
}
