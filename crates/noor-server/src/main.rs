//! Noor: verse search and reference-linking server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use noor_server::{build_router, seed, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn resolve_data_dir() -> PathBuf {
    std::env::var("NOOR_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn data_dir_arg(args: &[String], idx: usize) -> PathBuf {
    args.get(idx)
        .map(PathBuf::from)
        .unwrap_or_else(resolve_data_dir)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--validate" | "validate" => {
                let config = noor_core::NoorConfig::from_env(data_dir_arg(&args, 2))?;
                let report = seed::validate(&config.data_paths.db);
                seed::print_report(&report);
                std::process::exit(if report.db_valid { 0 } else { 1 });
            }
            "--import" | "import" => {
                // No path: everything queued in the data directory's imports/.
                let config = noor_core::NoorConfig::from_env(data_dir_arg(&args, 3))?;
                let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
                let source = args
                    .get(2)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| config.data_paths.imports.clone());
                let report = if source.is_dir() {
                    seed::import_dir(&config.data_paths.db, &source, busy_timeout)
                } else {
                    seed::import_file(&config.data_paths.db, &source, busy_timeout)
                };
                seed::print_report(&report);
                std::process::exit(if report.errors.is_empty() { 0 } else { 1 });
            }
            "--help" | "-h" | "help" => {
                println!("Noor — verse search and reference-linking server");
                println!();
                println!("Usage: noor [command]");
                println!();
                println!("Commands:");
                println!("  (none)                       Start the server");
                println!("  import [path] [data-dir]     Import verses from a JSON seed file, or every");
                println!("                               .json file in a directory (default: data/imports)");
                println!("  validate [data-dir]          Validate existing database");
                println!("  help                         Show this help message");
                println!();
                println!("Environment:");
                println!("  PORT, NOOR_DATA_DIR, NOOR_TOP_K, NOOR_RECORD_UNANSWERED,");
                println!("  NOOR_BUSY_TIMEOUT_MS, RUST_LOG");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'noor help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = noor_core::NoorConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = AppState::open(config)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    let state = Arc::new(state);

    // Build the index before accepting requests; a failure leaves it to the first search.
    let warm = state.clone();
    match tokio::task::spawn_blocking(move || warm.search.rebuild()).await? {
        Ok(status) => info!(
            "Search index ready: {} verses, {} terms",
            status.indexed_verses, status.vocabulary_size
        ),
        Err(e) => warn!("Initial index build failed, will retry on first search: {}", e),
    }

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Noor server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
