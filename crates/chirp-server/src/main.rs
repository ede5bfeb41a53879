mod config;

use clap::Parser;
use tracing::{info, warn};

use chirp_api::routes::RouterOptions;
use chirp_api::{AppStateInner, router};
use chirp_db::Database;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "chirpy", about = "Chirpy micro-blogging API server")]
struct Cli {
    /// Wipe the database on startup and expose POST /api/reset.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set CHIRPY_* directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirpy=debug,chirp_api=debug,chirp_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    if cli.debug {
        warn!("Debug mode: wiping {}", config.db_path.display());
        db.reset()?;
    }

    let state = AppStateInner::new(db, &config.jwt_secret, config.polka_key.clone());
    let app = router(
        state,
        RouterOptions {
            static_dir: &config.static_dir,
            debug: cli.debug,
        },
    );

    info!(
        "Serving files from {} on {}",
        config.static_dir.display(),
        config.addr
    );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix. A handler that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C handler unavailable: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let which = tokio::select! {
        () = interrupt => "interrupt",
        () = terminate => "terminate",
    };
    info!(signal = which, "Stopping Chirpy; draining in-flight requests");
}
