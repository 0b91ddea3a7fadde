use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drinks_api::auth::{KeySet, TokenSigner, TokenVerifier};
use drinks_api::config::AppConfig;
use drinks_api::database::{DatabaseManager, DrinkStore, MemoryDrinkStore, PgDrinkStore};
use drinks_api::{router, AppState};

#[derive(Parser)]
#[command(name = "drinks-api")]
#[command(about = "Coffee shop menu API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
        #[arg(long, help = "Keep drinks in memory instead of Postgres")]
        memory: bool,
    },

    #[command(about = "Create the drinks table")]
    InitDb {
        #[arg(long, help = "Drop existing drinks first and seed a sample drink")]
        reset: bool,
    },

    #[command(about = "Mint a signed token for local development")]
    Token {
        #[arg(long, help = "RSA private key (PEM)")]
        key: PathBuf,
        #[arg(long, help = "Key id published in the JWKS")]
        kid: String,
        #[arg(long = "permission", help = "Permission to grant, repeatable")]
        permissions: Vec<String>,
        #[arg(long, default_value = "local-dev")]
        subject: String,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH0_DOMAIN, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("drinks_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    tracing::info!("Starting drinks API in {:?} mode", config.environment);

    match cli.command.unwrap_or(Command::Serve { port: None, memory: false }) {
        Command::Serve { port, memory } => serve(config, port, memory).await,
        Command::InitDb { reset } => init_db(config, reset).await,
        Command::Token { key, kid, permissions, subject, hours } => {
            mint_token(config, key, kid, permissions, subject, hours)
        }
    }
}

async fn serve(config: AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let issuer = config.security.issuer()?;
    let keys = KeySet::load(&config.security.jwks_source()?)
        .await
        .context("failed to load token verification keys")?;
    let verifier = TokenVerifier::new(keys, &issuer, &config.security.audience);

    let drinks: Arc<dyn DrinkStore> = if memory {
        tracing::warn!("Using in-memory drink storage, nothing will be persisted");
        Arc::new(MemoryDrinkStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        let store = PgDrinkStore::new(pool);
        store.ensure_schema().await?;
        Arc::new(store)
    };

    let app = router(
        AppState::new(drinks, verifier),
        &config.server,
        &config.security,
    );

    let bind_addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Drinks API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn init_db(config: AppConfig, reset: bool) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    let store = PgDrinkStore::new(pool);

    if reset {
        let seeded = store.reset().await?;
        println!("Drinks table reset, seeded '{}' (id {})", seeded.title, seeded.id);
    } else {
        store.ensure_schema().await?;
        println!("Drinks table ready");
    }
    Ok(())
}

fn mint_token(
    config: AppConfig,
    key: PathBuf,
    kid: String,
    permissions: Vec<String>,
    subject: String,
    hours: i64,
) -> anyhow::Result<()> {
    let pem = std::fs::read(&key).with_context(|| format!("failed to read {}", key.display()))?;
    let signer = TokenSigner::from_rsa_pem(&pem, kid, config.security.issuer()?, config.security.audience)?;

    let permissions: Vec<&str> = permissions.iter().map(String::as_str).collect();
    let token = signer.sign(&subject, &permissions, chrono::Duration::hours(hours))?;
    println!("{}", token);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
