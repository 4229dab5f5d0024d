use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use db_pool::{create_pool, DbConfig};
use social_service::config::{Config, CorsConfig, StorageBackend};
use social_service::handlers;
use social_service::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use social_service::repository::Store;
use social_service::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn build_cors(config: &CorsConfig) -> Cors {
    let cors = if config.allows_any() {
        Cors::default().allow_any_origin()
    } else {
        // "null" is a legal Origin value (file:// pages) that is not a URI
        let origins = config.allowed_origins.clone();
        Cors::default().allowed_origin_fn(move |origin, _req| {
            origins.iter().any(|allowed| origin.as_bytes() == allowed.as_bytes())
        })
    };

    cors.allow_any_method().allow_any_header().max_age(3600)
}

async fn build_store(config: &Config) -> Result<Store> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on restart");
            Ok(Store::in_memory())
        }
        StorageBackend::Postgres => {
            let db_config = DbConfig::from_env("social-service").map_err(anyhow::Error::msg)?;
            db_config.log_config();

            let pool = create_pool(db_config)
                .await
                .context("Failed to connect to database")?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations applied");

            Ok(Store::postgres(pool))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Starting social-service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Environment: {}, storage: {}",
        config.app.env, config.storage
    );

    crypto_core::jwt::initialize_jwt_keys(&config.jwt.private_key_pem, &config.jwt.public_key_pem)
        .context("Failed to initialize JWT keys")?;

    let store = build_store(&config).await?;
    let state = web::Data::new(AppState::new(store));

    let bind_address = config.bind_address();
    let cors_config = config.cors.clone();
    info!("HTTP server listening on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware)
            .wrap(build_cors(&cors_config))
            .wrap(MetricsMiddleware)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind HTTP server to {}", bind_address))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("social-service stopped");
    Ok(())
}
