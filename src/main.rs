//! Binary entrypoint for the smsweather CLI.
//!
//! Commands:
//! - `start [--port <path>] [--baud <rate>]` - open the modem and answer SMS until Ctrl-C
//! - `init` - write a starter `config.toml`
//! - `forecast <LAT> <LON>` - print the forecast text a sender would receive
//!
//! See the library crate docs for module-level details: `smsweather::`.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use smsweather::config::Config;
use smsweather::metrics;
use smsweather::modem::Modem;
use smsweather::responder::Responder;
use smsweather::weather::{ForecastProvider, MeteoblueService};

#[derive(Parser)]
#[command(name = "smsweather")]
#[command(about = "Answers SMS coordinate requests with a weather forecast")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the modem and answer unread messages
    Start {
        /// Modem serial port (e.g., /dev/ttyS0); overrides the config file
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate; overrides the config file
        #[arg(short, long)]
        baud: Option<u32>,
    },
    /// Write a default configuration file
    Init,
    /// Print the forecast reply for a coordinate pair
    Forecast {
        /// Latitude in decimal degrees (south negative)
        #[arg(allow_hyphen_values = true)]
        lat: String,
        /// Longitude in decimal degrees (west negative)
        #[arg(allow_hyphen_values = true)]
        lon: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Forecast { lat, lon } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let mut service = MeteoblueService::new(config.weather);
            if !service.is_configured() {
                warn!("Weather lookups are disabled or have no API key");
            }
            println!("{}", service.format_forecast(lat.trim(), lon.trim()).await);
        }
        Commands::Start { port, baud } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting smsweather v{}", env!("CARGO_PKG_VERSION"));

            let port = port.unwrap_or_else(|| config.modem.port.clone());
            let baud = baud.unwrap_or(config.modem.baud_rate);
            let modem = Modem::open_serial(&port, baud, config.modem.timeout(), config.timing.clone())
                .with_context(|| format!("Failed to open modem on {}", port))?
                .with_verify_send(config.modem.verify_send);

            let forecast = MeteoblueService::new(config.weather.clone());
            if !forecast.is_configured() {
                warn!("Weather lookups are disabled or have no API key; coordinate requests will get the failure text");
            }

            let mut responder = Responder::new(modem, forecast);
            tokio::select! {
                _ = responder.run() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                }
            }
            responder.modem_mut().close();
            info!("Shutdown: {}", metrics::snapshot());
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Mutex::new(f);
        // Mirror to the console only when someone is watching it
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
