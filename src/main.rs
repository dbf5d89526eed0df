//! Composition root.
//!
//! Early, config-driven initialization: configuration and the log router
//! come up before anything else, and any failure on that path exits with
//! code 1 after a Critical event. Normal shutdown flushes every sink and
//! exits 0.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use weathercast::config::load_config;
use weathercast::logging::event::{Level, LogEvent};
use weathercast::logging::Router;
use weathercast::HttpServer;

const SOURCE: &str = "weathercast.startup";

#[derive(Parser, Debug)]
#[command(name = "weathercast", about = "Minimal forecast API with structured log routing")]
struct Cli {
    /// Path to the base configuration file.
    #[arg(long, default_value = "weathercast.toml")]
    config: PathBuf,

    /// Environment name selecting the overlay file
    /// (also read from WEATHERCAST_ENVIRONMENT).
    #[arg(long)]
    environment: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let environment = cli
        .environment
        .or_else(|| std::env::var("WEATHERCAST_ENVIRONMENT").ok());

    // The router does not exist yet on this path; failures go straight to
    // stderr before the process aborts.
    let config = match load_config(&cli.config, environment.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("weathercast: CRITICAL: configuration error: {}", e);
            return ExitCode::from(1);
        }
    };

    let log = match Router::configure(&config.logging).await {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("weathercast: CRITICAL: log router startup failed: {}", e);
            return ExitCode::from(1);
        }
    };

    log.emit(
        LogEvent::new(Level::Information, SOURCE, "configuration loaded")
            .with_property("bind_address", config.listener.bind_address.clone())
            .with_property("sinks", config.logging.sinks.len())
            .with_property(
                "environment",
                environment.unwrap_or_else(|| "default".to_string()),
            ),
    );

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            log.emit(
                LogEvent::new(
                    Level::Critical,
                    SOURCE,
                    format!("failed to bind {}: {}", config.listener.bind_address, e),
                ),
            );
            log.flush_and_close().await;
            return ExitCode::from(1);
        }
    };

    let server = HttpServer::new(&config, log.clone());
    match server.run(listener).await {
        Ok(()) => {
            log.emit(LogEvent::new(Level::Information, SOURCE, "shutdown complete"));
            log.flush_and_close().await;
            ExitCode::SUCCESS
        }
        Err(e) => {
            log.emit(LogEvent::new(
                Level::Critical,
                SOURCE,
                format!("server terminated abnormally: {}", e),
            ));
            log.flush_and_close().await;
            ExitCode::from(1)
        }
    }
}
