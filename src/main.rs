//! openWB MQTT bridge - Main Entry Point

use clap::{Parser, Subcommand};
use openwb_bridge::bridge::{
    Bridge, PropertyWriteHandle, DEFAULT_TICK_PERIOD, EVENT_CHANNEL_CAPACITY,
};
use openwb_bridge::config::BridgeConfig;
use openwb_bridge::error::{BridgeError, BridgeResult};
use openwb_bridge::observability::{env_format, init_logging, resolve_level};
use openwb_bridge::property::LocalPropertyBus;
use openwb_bridge::transport::mqtt::{client_id, MqttClient, ReconnectSupervisor};
use std::path::{Path, PathBuf};
use std::process;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration, Instant};
use tracing::{error, info, Instrument};

/// Configuration files tried when no `--config` is given
const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "openwb-bridge.toml",
    "config/openwb-bridge.toml",
    "config.toml",
];

/// Bridge between an openWB wallbox on MQTT and a property service
#[derive(Parser)]
#[command(name = "openwb-bridge")]
#[command(about = "Bridge openWB MQTT telemetry and commands to a property service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Seconds to wait before exiting after a startup failure
    #[arg(long, value_name = "SECS", default_value_t = 60, env = "OPENWB_FAILURE_DELAY")]
    failure_delay_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let failure_delay = Duration::from_secs(cli.failure_delay_secs);

    let config = load_configuration(cli.config.as_deref());

    let config_level = config
        .as_ref()
        .ok()
        .and_then(|config| config.bridge.log_level.clone());
    let env_level = std::env::var("LOG_LEVEL").ok();
    let (format, include_spans) = env_format();
    init_logging(
        resolve_level(cli.verbose, config_level.as_deref(), env_level.as_deref()),
        format,
        include_spans,
    );

    info!("Starting openWB bridge v{}", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            delay_exit(failure_delay).await;
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_bridge(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    match result {
        Ok(()) => info!("Application shutdown complete"),
        Err(e @ BridgeError::LivenessTimeout { .. }) => {
            error!("Bridge stopped: {}", e);
            process::exit(1);
        }
        Err(e) => {
            error!("Bridge failed: {}", e);
            delay_exit(failure_delay).await;
            process::exit(1);
        }
    }
}

/// Keep a supervisor from restarting a broken setup in a hot loop
async fn delay_exit(delay: Duration) {
    if !delay.is_zero() {
        info!("Exiting in {}s", delay.as_secs());
        sleep(delay).await;
    }
}

fn load_configuration(config_path: Option<&Path>) -> BridgeResult<BridgeConfig> {
    if let Some(path) = config_path {
        return Ok(BridgeConfig::load_from_file(path)?);
    }

    DEFAULT_CONFIG_PATHS
        .iter()
        .map(|path| Path::new(*path))
        .find(|path| path.exists())
        .ok_or_else(|| {
            openwb_bridge::ConfigError::InvalidConfig(format!(
                "No configuration file found. Provide one with -c/--config or create {}",
                DEFAULT_CONFIG_PATHS[0]
            ))
        })
        .and_then(BridgeConfig::load_from_file)
        .map_err(BridgeError::from)
}

async fn run_bridge(config: BridgeConfig) -> BridgeResult<()> {
    let identity = config.identity();
    let namespace = config.namespace();
    let service_name = identity.service_name();
    info!(
        service = %service_name,
        broker = %config.mqtt.broker_url,
        prefix = namespace.prefix(),
        "Bridge starting"
    );

    let mut mqtt = MqttClient::new(
        &client_id(identity.device_instance),
        &config.mqtt,
        &namespace,
        ReconnectSupervisor::new(config.reconnect_delay()),
    )?;

    // Consumer writes and broker messages share one channel into the loop
    let (events_tx, mut events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let bus = LocalPropertyBus::new(service_name.clone())
        .with_writer(PropertyWriteHandle::new(events_tx.clone()));
    let service = bus.clone();
    let mut bridge = Bridge::new(
        namespace,
        &identity,
        bus,
        mqtt.publisher(),
        config.liveness_timeout(),
        Instant::now(),
    )?;
    info!(
        service = %service.service_name(),
        properties = service.snapshot().len(),
        "Property service ready"
    );

    mqtt.start(events_tx)?;

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    let result = tokio::select! {
        result = bridge
            .run(&mut events_rx, DEFAULT_TICK_PERIOD)
            .instrument(openwb_bridge::bridge_span!(service = %service_name)) => result,
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
            Ok(())
        }
    };

    if let Err(e) = mqtt.disconnect().await {
        error!("Error during MQTT disconnect: {}", e);
    }
    result
}

fn handle_config_command(config: &BridgeConfig, show: bool) -> BridgeResult<()> {
    if show {
        match toml::to_string_pretty(config) {
            Ok(text) => {
                println!("Current configuration:");
                println!("{text}");
            }
            Err(e) => error!("Failed to render configuration: {}", e),
        }
    }

    info!("Configuration validation complete");
    Ok(())
}
