//! Remesh - standalone update queue with debug server
//!
//! Hosts an update scheduler behind the JSON-lines debug server so the queue
//! can be fed and drained from outside (e.g. `nc 127.0.0.1 9743`).

use std::path::PathBuf;
use std::sync::Arc;

use remesh::core::logging;
use remesh::debug::QueueDebugHandler;
use remesh::update::{RegionCoalescer, UpdateConfig, UpdateScheduler};

fn main() {
    logging::init();
    log::info!("Remesh starting...");

    let args: Vec<String> = std::env::args().collect();

    let config = match parse_config_arg(&args) {
        Some(path) => match UpdateConfig::load_sync(&path) {
            Ok(config) => {
                log::info!("Loaded update config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => UpdateConfig::default(),
    };
    let port = parse_port_arg(&args).unwrap_or(remesh_debug::DEFAULT_PORT);

    log::info!(
        "Chunk size {}, column {}..={}, admission {}, cap {:?}",
        config.chunk_size,
        config.column_min_y,
        config.column_max_y,
        config.admission.name(),
        config.max_pending
    );

    let scheduler = match UpdateScheduler::new(config) {
        Ok(scheduler) => Arc::new(scheduler),
        Err(e) => {
            log::error!("Invalid update config: {}", e);
            std::process::exit(1);
        }
    };
    let coalescer = RegionCoalescer::new(scheduler);

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let handler = Arc::new(tokio::sync::Mutex::new(QueueDebugHandler::new(coalescer)));
        let _server = remesh_debug::DebugServer::start(handler, port);
        log::info!("Debug server started on port {}", port);
        // Keep runtime alive forever
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
    });
}

/// Parse --config argument from command line
fn parse_config_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if args[i] == "--config" || args[i] == "-c" {
            if let Some(path) = args.get(i + 1) {
                return Some(PathBuf::from(path));
            }
        }
    }
    None
}

/// Parse --port argument from command line
fn parse_port_arg(args: &[String]) -> Option<u16> {
    for i in 0..args.len() {
        if args[i] == "--port" || args[i] == "-p" {
            if let Some(port) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                return Some(port);
            }
        }
    }
    None
}
