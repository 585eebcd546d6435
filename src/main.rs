// src/main.rs

use compliance_portal::config::Config;
use compliance_portal::db;
use compliance_portal::routes;
use compliance_portal::state::AppState;
use compliance_portal::utils::hash::hash_password;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env included)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily("logs", "portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = db::connect_with_retry(&config.database_url).await?;
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Creates the first administrator when ADMIN_ACCOUNT and ADMIN_PASSWORD are set
/// and neither the id nor the account exists yet.
async fn seed_admin_user(
    pool: &SqlitePool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(account), Some(password)) = (&config.admin_account, &config.admin_password) else {
        return Ok(());
    };

    let existing: Option<String> =
        sqlx::query_scalar("SELECT id FROM users WHERE id = ? OR account = ?")
            .bind(&config.admin_id)
            .bind(account)
            .fetch_optional(pool)
            .await?;

    if existing.is_none() {
        tracing::info!("Seeding admin user: {}", account);
        let hashed_password = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, account, password_hash, role, status, real_name, created_at)
            VALUES (?, ?, ?, 'ADMIN', 'ACTIVE', ?, ?)
            "#,
        )
        .bind(&config.admin_id)
        .bind(account)
        .bind(hashed_password)
        .bind(&config.admin_name)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;
        tracing::info!("Admin user created successfully.");
    }
    Ok(())
}
