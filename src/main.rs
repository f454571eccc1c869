//! BookTrack Server - Personal Book Collection Tracker
//!
//! Server-rendered Rust web application for tracking personal book
//! collections, with a public cross-user library.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use booktrack_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "booktrack_server={},tower_http=debug",
            config.logging.level
        )
        .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BookTrack Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.github.clone());

    // Create application state
    let state = AppState::new(config, services);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        // Public pages
        .route("/", get(api::pages::home))
        .route("/library", get(api::pages::library))
        // Authentication
        .route("/auth/login", get(api::auth::login_form))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/register", get(api::auth::register_form))
        .route("/auth/register", post(api::auth::register))
        .route("/auth/github", get(api::auth::github))
        .route("/auth/github/callback", get(api::auth::github_callback))
        .route("/auth/logout", get(api::auth::logout))
        // Book collection (owner-scoped)
        .route("/books/dashboard", get(api::books::dashboard))
        .route("/books/add", get(api::books::add_form))
        .route("/books", post(api::books::create))
        .route("/books/:id/edit", get(api::books::edit_form))
        .route("/books/:id", put(api::books::update))
        .route("/books/:id", delete(api::books::delete))
        // Operational probes
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        .with_state(state)
        .layer(middleware::from_fn(api::method_override))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}
