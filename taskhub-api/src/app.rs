/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhub_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = taskhub_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, routes};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::{
    auth::{
        middleware::{require_service_token, TOKEN_HEADER},
        service_token::ServiceToken,
    },
    crypto::card::CardCipher,
    ledger::Ledger,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token every protected request must present
    pub service_token: ServiceToken,

    /// Cipher for stored card numbers
    pub cipher: CardCipher,

    /// Money movement service
    pub ledger: Ledger,
}

impl AppState {
    /// Creates new application state
    ///
    /// # Errors
    ///
    /// Fails when the configured encryption key or IV is unusable.
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let cipher = config.card_cipher()?;
        let service_token = ServiceToken::new(config.auth.api_key.clone());
        let ledger = Ledger::new(db.clone(), config.payments.commission_rate);

        Ok(Self {
            db,
            config: Arc::new(config),
            service_token,
            cipher,
            ledger,
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                      # Health check (public)
/// ├── /webhook/monobank/:user_id   # Payment provider callback (public)
/// └── (service token required)
///     ├── /users
///     ├── /tasks
///     ├── /executors
///     ├── /chats
///     ├── /group-messages
///     ├── /balance
///     ├── /transactions
///     ├── /payments
///     ├── /withdrawals
///     ├── /warnings
///     ├── /tickets
///     └── /reviews
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Service token check (protected routes only)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/webhook/monobank/:user_id", post(routes::webhook::monobank));

    let protected_routes = Router::new()
        .nest("/users", routes::users::router())
        .nest("/tasks", routes::tasks::router())
        .nest("/executors", routes::executors::router())
        .nest("/chats", routes::chats::router())
        .nest("/group-messages", routes::group_messages::router())
        .nest("/balance", routes::balance::router())
        .nest("/transactions", routes::transactions::router())
        .nest("/payments", routes::payments::router())
        .nest("/withdrawals", routes::withdrawals::router())
        .nest("/warnings", routes::warnings::router())
        .nest("/tickets", routes::tickets::router())
        .nest("/reviews", routes::reviews::router())
        .route_layer(axum::middleware::from_fn_with_state(
            state.service_token.clone(),
            require_service_token,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(TOKEN_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}
