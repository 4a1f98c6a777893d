use clap::Parser;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use error::StartupError;

#[derive(Parser, Debug)]
#[command(name = "brezbaze")]
#[command(about = "Answers every HTTP request with a fixed greeting", long_about = None)]
struct Cli {
    /// Config file path, extension optional
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config)?;
    logger::init(&cfg).map_err(StartupError::from)?;

    // Worker threads follow `server.workers`, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(StartupError::from)?;

    runtime.block_on(async_main(cfg))?;
    Ok(())
}

async fn async_main(cfg: config::Config) -> Result<(), StartupError> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    let state = Arc::new(config::AppState::new(&cfg));
    let active_connections = Arc::new(AtomicUsize::new(0));
    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown))?;

    logger::log_server_start(&addr, &cfg);

    server::server_loop::run(listener, state, active_connections, shutdown).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_path() {
        let cli = Cli::try_parse_from(["brezbaze"]).unwrap();
        assert_eq!(cli.config, "config");

        let cli = Cli::try_parse_from(["brezbaze", "--config", "/etc/brezbaze"]).unwrap();
        assert_eq!(cli.config, "/etc/brezbaze");

        let cli = Cli::try_parse_from(["brezbaze", "-c", "local"]).unwrap();
        assert_eq!(cli.config, "local");

        let cli = Cli::try_parse_from(["brezbaze", "--config=prod"]).unwrap();
        assert_eq!(cli.config, "prod");
    }

    #[test]
    fn test_cli_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["brezbaze", "--config"]).is_err());
        assert!(Cli::try_parse_from(["brezbaze", "--port", "80"]).is_err());
    }
}
