mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use parley_api::auth::{AppState, AppStateInner};
use parley_chat::ChatService;
use parley_crypto::{AesGcmCodec, PlainCodec, TextCodec};
use parley_db::Database;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_dev_secret() {
        warn!("PARLEY_JWT_SECRET not set, using the development secret");
    }

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let codec: Arc<dyn TextCodec> = match &config.message_key {
        Some(key) => Arc::new(AesGcmCodec::from_base64(key)?),
        None => {
            warn!("PARLEY_MESSAGE_KEY not set, message bodies are stored as plaintext");
            Arc::new(PlainCodec)
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        chat: ChatService::new(db, codec),
        jwt_secret: config.jwt_secret.clone(),
    });

    let app = parley_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Parley server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
