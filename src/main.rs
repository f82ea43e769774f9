use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use infokiosk::config::Config;
use infokiosk::feeds;
use infokiosk::logging;
use infokiosk::server::{self, AppState};

struct Args {
    config_path: Option<PathBuf>,
    port: Option<u16>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        config_path: None,
        port: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("infokiosk {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    parsed.config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse() {
                        Ok(port) => parsed.port = Some(port),
                        Err(_) => {
                            eprintln!("Error: --port requires a number");
                            std::process::exit(1);
                        }
                    }
                    i += 1;
                } else {
                    eprintln!("Error: --port requires a number argument");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}

fn print_help() {
    println!(
        r#"infokiosk - content service for a touchscreen information kiosk

USAGE:
    infokiosk [OPTIONS]

OPTIONS:
    --config, -c PATH   Path to config file
    --port, -p PORT     Override the configured listen port
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    INFOKIOSK_LOG       Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/infokiosk/config.toml"#
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    // Initialize logging (uses journald on Linux, file fallback otherwise)
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    // Load configuration
    let mut config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let state = AppState::new(&config);

    // Open the store up front so first-run seeding happens before traffic;
    // on failure handlers answer with a soft storage error until a retry
    if let Err(e) = state.store.db().await {
        warn!("Store unavailable at startup: {}", e);
    }

    // Background ticker refresh
    let refresh = Duration::from_secs(config.feeds.refresh_interval_secs);
    tokio::spawn(feeds::ticker::run_refresh_loop(
        state.store.clone(),
        state.chain.clone(),
        state.ticker.clone(),
        refresh,
    ));

    server::serve(&config, state).await
}
