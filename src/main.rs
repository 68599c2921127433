use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pakt_license::config::Config;
use pakt_license::handlers;
use pakt_license::service::LicenseService;
use pakt_license::state::AppState;
use pakt_license::store::{LicenseStore, MemoryStore, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "pakt-license")]
#[command(about = "PAKT license key and device activation service")]
struct Cli {
    /// Keep licenses in memory instead of DATABASE_PATH (dev mode only, lost on exit)
    #[arg(long)]
    memory: bool,

    /// Create a license for this email at startup and log its key (dev mode only)
    #[arg(long, value_name = "EMAIL")]
    seed_email: Option<String>,
}

fn open_store(cli: &Cli, config: &Config) -> Arc<dyn LicenseStore> {
    if cli.memory {
        if config.dev_mode {
            tracing::info!("IN-MEMORY MODE: licenses will be lost on exit");
            return Arc::new(MemoryStore::new());
        }
        tracing::warn!("--memory flag ignored: not in dev mode (set PAKT_ENV=dev)");
    }

    let store = SqliteStore::open(&config.database_path).unwrap_or_else(|e| {
        tracing::error!("Failed to open license store at {}: {}", config.database_path, e);
        std::process::exit(1);
    });
    tracing::info!("Using license store: {}", config.database_path);
    Arc::new(store)
}

/// Issues one license so a fresh dev setup has something to activate.
fn seed_license(service: &LicenseService, email: &str) {
    match service.create_license(Some(email), "dev_seed") {
        Ok(key) => {
            tracing::info!("============================================");
            tracing::info!("DEV LICENSE CREATED");
            tracing::info!("Email: {}", email);
            tracing::info!("Key:   {}", key);
            tracing::info!("============================================");
        }
        Err(e) => tracing::error!("Failed to seed dev license: {}", e),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pakt_license=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let store = open_store(&cli, &config);
    let service = LicenseService::new(store).with_max_devices(config.max_devices);
    tracing::info!("Device limit per license: {}", service.max_devices());

    if let Some(ref email) = cli.seed_email {
        if config.dev_mode {
            seed_license(&service, email);
        } else {
            tracing::warn!("--seed-email ignored: not in dev mode (set PAKT_ENV=dev)");
        }
    }

    if config.stripe_webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set: webhook payloads are accepted unverified");
    }

    let state = AppState::new(service).with_stripe_secret(config.stripe_webhook_secret.as_deref());
    let app = handlers::app(state, &config);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("PAKT license server listening on {}", addr);

    // Connect info is required for per-IP rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
