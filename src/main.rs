use clap::Parser;
use std::path::Path;
use std::sync::Arc;

use imgdrop::config::{AppState, Args, Config};
use imgdrop::{logger, server, storage};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cfg = Config::load_from(&args.config)?;
    let addr = cfg.get_socket_addr()?;

    if args.validate {
        println!("Configuration OK: {} (listening on {addr})", args.config);
        return Ok(());
    }

    logger::init(&cfg)?;

    // Storage must exist before anything is served
    let storage_dir = Path::new(&cfg.storage.dir);
    match storage::bootstrap(storage_dir) {
        Ok(outcome) => logger::log_storage_ready(storage_dir, outcome),
        Err(e) => {
            logger::log_error(&format!("Failed to prepare storage directory: {e}"));
            std::process::exit(1);
        }
    }

    // Create Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, addr))
}

async fn async_main(
    cfg: Config,
    addr: std::net::SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = server::create_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run(listener, state, server::shutdown_signal()))
        .await;
    Ok(())
}
