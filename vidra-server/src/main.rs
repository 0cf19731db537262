//! # Vidra Server
//!
//! Account-facing backend for the Vidra streaming platform.
//!
//! ## Overview
//!
//! The server exposes the stateful half of the product surface:
//!
//! - **Watch Progress**: per-episode progress reports and bulk clearing
//! - **Continue Watching**: resume-point resolution across seasons, with
//!   season metadata fetched from TMDB only when it can change the answer
//! - **Family Plans**: slot accounting, invite lifecycle, member management
//! - **Trial Expiry**: a periodic sweep clearing lapsed trials and
//!   dissolving their families
//!
//! ## Architecture
//!
//! Built on Axum over PostgreSQL. Authentication and payment webhooks are
//! handled by upstream services; this process trusts the gateway-forwarded
//! user id and never sees credentials.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidra_core::{
    application::unit_of_work::AppUnitOfWork,
    database::postgres::PostgresDatabase,
    family::service::FamilyService,
    providers::{TitleMetadataProvider, TmdbSeasonProvider},
    resume::service::ResumeService,
};

use vidra_server::{
    infra::{app_state::AppState, config::Config},
    jobs::expiry::spawn_expiry_job,
    routes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.tmdb_api_key.is_empty() {
        warn!("No TMDB_API_KEY configured - resume resolution will run without season boundaries");
    }

    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set")?;

    let database = PostgresDatabase::connect(&database_url, config.database_max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    database.migrate().await.context("Failed to run migrations")?;

    let unit_of_work = Arc::new(AppUnitOfWork::from_postgres(&database));

    let metadata: Arc<dyn TitleMetadataProvider> = Arc::new(
        TmdbSeasonProvider::new(config.tmdb_api_key.clone(), config.metadata_timeout)
            .context("Failed to build metadata client")?,
    );

    let resume = Arc::new(ResumeService::new(
        unit_of_work.watch_records.clone(),
        metadata,
    ));
    let family = Arc::new(FamilyService::new(
        unit_of_work.users.clone(),
        unit_of_work.families.clone(),
        chrono::Duration::days(config.invite_ttl_days),
    ));

    let expiry_job = spawn_expiry_job(family.clone(), config.expiry_sweep_interval);

    let state = AppState {
        unit_of_work,
        resume,
        family,
        config: Arc::new(config.clone()),
    };

    let cors = build_cors_layer(&config);
    let app = routes::create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("Invalid server address")?;

    info!(%addr, dev_mode = config.dev_mode, "vidra-server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind server address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    expiry_job.abort();

    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        // Dev-friendly default; deployments set CORS_ALLOWED_ORIGINS.
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install shutdown handler");
    }
    info!("shutdown signal received");
}
