//! FinTrack Web Server
//!
//! Axum-based REST API for the FinTrack personal finance backend.
//!
//! - Transactions are stored synchronously and categorized in the background
//! - Budget and forecast endpoints are read-only queries
//! - New beta testers are relayed to the operator on a timer
//! - Sanitized error responses (`{"error": "..."}`)

use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use fintrack_core::{
    AIBackend, CategoryClassifier, Database, NotificationParser, TelegramNotifier, TesterNotifier,
};

mod handlers;
mod queue;
mod scheduler;

pub use queue::{ClassificationJob, ClassificationQueue};
pub use scheduler::{start_tester_notifier, NotifierHandle, TesterNotifierConfig};

/// Default number of classifications allowed in flight at once
pub const DEFAULT_CLASSIFY_WORKERS: usize = 4;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Concurrency limit for background classification
    pub classify_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            classify_workers: DEFAULT_CLASSIFY_WORKERS,
        }
    }
}

impl ServerConfig {
    /// Read `FINTRACK_ALLOWED_ORIGINS` and `FINTRACK_CLASSIFY_WORKERS`
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("FINTRACK_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let classify_workers = std::env::var("FINTRACK_CLASSIFY_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(DEFAULT_CLASSIFY_WORKERS);

        Self {
            allowed_origins,
            classify_workers,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub parser: NotificationParser,
    pub queue: ClassificationQueue,
}

/// Create the router with a classifier configured from the environment
pub fn create_router(db: Database, config: ServerConfig) -> anyhow::Result<Router> {
    let classifier = CategoryClassifier::from_env();
    match classifier.backend() {
        Some(client) => info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => info!(
            "ℹ️  AI backend not configured (set OPENAI_API_KEY or OLLAMA_HOST); using keyword rules"
        ),
    }
    create_router_with_options(db, config, classifier)
}

/// Create the router with an explicit classifier
///
/// Spawns the classification worker, so this must run inside a tokio runtime.
/// The worker stops once the router (and with it every queue handle) is dropped.
pub fn create_router_with_options(
    db: Database,
    config: ServerConfig,
    classifier: CategoryClassifier,
) -> anyhow::Result<Router> {
    let parser = NotificationParser::new()?;
    let queue = ClassificationQueue::start(db.clone(), classifier, config.classify_workers);

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        parser,
        queue,
    });

    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    let app = Router::new()
        .route("/health", get(handlers::health))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/notification",
            post(handlers::create_transaction_from_notification),
        )
        // Budget and planning
        .route("/budget/daily", get(handlers::get_daily_budget))
        .route("/plan/forecast", post(handlers::forecast))
        // Users
        .route("/users", post(handlers::create_user))
        // Beta testers
        .route(
            "/testers",
            get(handlers::list_testers).post(handlers::register_tester),
        )
        .route("/testers/emails", get(handlers::list_tester_emails))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Start the server with configuration read from the environment
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::from_env()).await
}

/// Start the server with custom configuration
///
/// Runs until Ctrl-C, then drains in-flight requests and stops the
/// tester notifier.
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_ai_connection().await;

    let notifier = start_notifier_if_configured(&db);

    let app = create_router(db, config)?;
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = notifier {
        handle.shutdown().await;
    }
    info!("Server stopped");

    Ok(())
}

fn start_notifier_if_configured(db: &Database) -> Option<NotifierHandle> {
    let Some(config) = TesterNotifierConfig::from_env() else {
        info!("ℹ️  Tester notifier disabled (FINTRACK_TESTER_CHECK_INTERVAL=0)");
        return None;
    };
    let Some(telegram) = TelegramNotifier::from_env() else {
        info!("ℹ️  Tester notifier not configured (set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID)");
        return None;
    };

    let notifier = TesterNotifier::new(db.clone(), Arc::new(telegram));
    Some(start_tester_notifier(notifier, config))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, run until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match fintrack_core::AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend not reachable at {}; keyword rules will be used until it is",
                    client.host()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured, classifying with keyword rules");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unprocessable(msg: &str) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();

        // Domain errors carry a client-safe message and their own status
        if let Some(domain) = err.downcast_ref::<fintrack_core::Error>() {
            match domain {
                fintrack_core::Error::NotFound(msg) => return Self::not_found(msg),
                fintrack_core::Error::Conflict(msg) => return Self::conflict(msg),
                fintrack_core::Error::Validation(msg) => return Self::unprocessable(msg),
                _ => {}
            }
        }

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

/// Malformed JSON bodies are 422 with the extractor's explanation
pub(crate) fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::unprocessable(&rejection.body_text())
}

/// Missing or malformed query parameters are 422
pub(crate) fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::unprocessable(&rejection.body_text())
}

#[cfg(test)]
mod tests;
