//! AWS IoT MQTT test harness - Main Entry Point
//!
//! Reads single-key commands from stdin and drives one MQTT-over-TLS
//! connection to AWS IoT.

use awsiot_harness::config::HarnessConfig;
use awsiot_harness::harness::commands::INVALID_KEY;
use awsiot_harness::harness::{usage_banner, ClientWrapper, KeyCommand, OpensslFingerprint};
use awsiot_harness::observability::{init_default_logging, EventLog, TracingLog};
use awsiot_harness::transport::mqtt::RumqttcConnector;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

/// Time given to the driver task to flush the DISCONNECT before exiting
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

type Client = ClientWrapper<RumqttcConnector>;

/// Interactive MQTT test client for AWS IoT
#[derive(Parser)]
#[command(name = "awsiot-harness")]
#[command(about = "Interactive MQTT-over-TLS test client for AWS IoT")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session
    Run,
    /// Validate configuration
    Config {
        /// Show the resolved configuration
        #[arg(long)]
        show: bool,
    },
}

/// What the key loop does after a command
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging(cli.verbose);

    debug!("Starting awsiot-harness v{}", env!("CARGO_PKG_VERSION"));

    let config = match HarnessConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_session(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_session(config: HarnessConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log: Arc<dyn EventLog> = Arc::new(TracingLog);

    let mut client = ClientWrapper::new(
        RumqttcConnector::new(),
        config.wrapper_options(),
        &OpensslFingerprint::new(),
        log.clone(),
    )?;

    println!(
        "{}",
        usage_banner(
            &config.broker.endpoint,
            &config.topics.subscribe,
            &config.topics.publish,
        )
    );

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                debug!("Received SIGINT");
                break;
            }
            _ = sigterm.recv() => {
                debug!("Received SIGTERM");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if dispatch(&mut client, log.as_ref(), &config, &line).await == Flow::Exit {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        log.log("Error:", Some(e.to_string().as_str()));
                        shutdown(&client).await;
                        process::exit(1);
                    }
                }
            }
        }
    }

    shutdown(&client).await;
    info!("Session finished");
    Ok(())
}

async fn dispatch(
    client: &mut Client,
    log: &dyn EventLog,
    config: &HarnessConfig,
    line: &str,
) -> Flow {
    match KeyCommand::parse(line) {
        Some(KeyCommand::Connect) => {
            log.log("Connecting to AWS IoT...", None);
            client.connect(&config.broker.endpoint).await;
        }
        Some(KeyCommand::Disconnect) => {
            log.log("Disconnecting from AWS IoT...", None);
            client.end();
        }
        Some(KeyCommand::Subscribe) => client.subscribe().await,
        Some(KeyCommand::Publish) => {
            client
                .publish(&config.topics.publish, &config.topics.message)
                .await
        }
        Some(KeyCommand::Quit) => {
            log.log("Exiting...", None);
            return Flow::Exit;
        }
        None => log.log(INVALID_KEY, None),
    }
    Flow::Continue
}

/// End the connection and let the driver task flush the DISCONNECT
async fn shutdown(client: &Client) {
    if client.is_connected() {
        client.end();
        sleep(SHUTDOWN_GRACE).await;
    }
}

fn handle_config_command(
    config: &HarnessConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", config.to_toml_string()?);
    }

    info!("Configuration validation complete");
    Ok(())
}
