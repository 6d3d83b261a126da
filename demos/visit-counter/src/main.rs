//! Visit Counter
//!
//! Small axum server that keeps a per-browser visit count in a Redis-backed
//! session.
//!
//! # Usage
//!
//! ```bash
//! # Start Redis
//! docker run --rm -p 6379:6379 redis:7
//!
//! # Run server
//! SESSION_SECRET=dev-secret cargo run -p visit-counter
//!
//! # Visit twice, then log out
//! curl -c jar -b jar http://127.0.0.1:3000/
//! curl -c jar -b jar http://127.0.0.1:3000/
//! curl -c jar -b jar http://127.0.0.1:3000/logout
//! ```

mod config;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use config::Config;
use redistore::{SessionError, SessionStore, StoreConfig, Value};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_NAME: &str = "visits";

type AppState = Arc<SessionStore>;

/// Session failures surface as 500s.
struct AppError(SessionError);

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        Self(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Session handling failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "session unavailable").into_response()
    }
}

async fn visit(
    State(store): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, String), AppError> {
    let loaded = store.load(&headers, SESSION_NAME).await?;
    if let Some(error) = &loaded.cookie_error {
        tracing::debug!(error = %error, "Ignoring invalid session cookie");
    }
    let mut session = loaded.into_session();

    let count = session.get("count").and_then(Value::as_i64).unwrap_or(0) + 1;
    session.insert("count", count);

    let previous = session
        .take_flashes()
        .into_iter()
        .filter_map(|flash| flash.as_str().map(ToString::to_string))
        .collect::<Vec<_>>();
    session.add_flash(format!("visit #{count} recorded"));

    let mut response_headers = HeaderMap::new();
    store.save(&mut session, &mut response_headers).await?;

    let mut body = format!("Visits: {count}\n");
    for message in previous {
        body.push_str(&format!("Flash: {message}\n"));
    }

    Ok((response_headers, body))
}

async fn logout(
    State(store): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, &'static str), AppError> {
    let mut session = store.load(&headers, SESSION_NAME).await?.into_session();
    session.options_mut().max_age = Some(-1);

    let mut response_headers = HeaderMap::new();
    store.save(&mut session, &mut response_headers).await?;

    Ok((response_headers, "Logged out\n"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,visit_counter=debug,redistore=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        redis = %config.redis_url,
        bind_addr = %config.bind_addr,
        encrypted = config.session_block_key.is_some(),
        "Configuration loaded"
    );

    let store_config = StoreConfig::new()
        .with_key_prefix(config.key_prefix.clone())
        .with_max_length(config.max_length);
    let cache = redistore::RedisCache::new(&config.redis_url).await?;
    let store = SessionStore::with_config(cache, config.key_pairs().as_slice(), store_config).await?;

    let app = Router::new()
        .route("/", get(visit))
        .route("/logout", get(logout))
        .with_state(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Visit counter listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down gracefully...");
        })
        .await?;

    Ok(())
}
