use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use nutriwise_core::catalog::{CatalogStore, StaticCatalog};
use nutriwise_core::domain::contract::ProfileRequest;
use nutriwise_core::domain::stack::Stack;
use nutriwise_core::domain::supplement::SupplementCandidate;
use nutriwise_core::stack::{build_stack, StackOptions};
use nutriwise_core::storage::catalog::PgCatalog;
use nutriwise_core::storage::stacks::StoredStack;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = nutriwise_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();
    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match nutriwise_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState::new(pool, StackOptions::from_env());
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/candidates", get(list_candidates))
        .route("/stacks", post(create_stack))
        .route("/stacks/latest", get(get_latest_stack))
        .route("/stacks/:stack_id", get(get_stack_by_id))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    static_catalog: Arc<StaticCatalog>,
    stack_options: StackOptions,
}

impl AppState {
    fn new(pool: Option<PgPool>, stack_options: StackOptions) -> Self {
        Self {
            pool,
            static_catalog: Arc::new(StaticCatalog::default()),
            stack_options,
        }
    }

    /// The DB catalog when it has rows, otherwise the built-in one.
    async fn load_catalog(&self) -> anyhow::Result<(&'static str, Vec<SupplementCandidate>)> {
        if let Some(pool) = &self.pool {
            let store = PgCatalog::new(pool.clone());
            let candidates = store.list_candidates().await?;
            if !candidates.is_empty() {
                return Ok((store.store_name(), candidates));
            }
            tracing::warn!("supplement_candidates is empty; using built-in catalog");
        }

        let candidates = self.static_catalog.list_candidates().await?;
        Ok((self.static_catalog.store_name(), candidates))
    }
}

#[derive(Debug, Serialize)]
struct ApiCatalog {
    catalog_source: &'static str,
    candidates: Vec<SupplementCandidate>,
}

#[derive(Debug, Serialize)]
struct ApiStack {
    stack_id: Option<Uuid>,
    catalog_source: &'static str,
    stack: Stack,
}

async fn list_candidates(State(state): State<AppState>) -> Result<Json<ApiCatalog>, StatusCode> {
    let (catalog_source, candidates) = state.load_catalog().await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(ApiCatalog {
        catalog_source,
        candidates,
    }))
}

async fn create_stack(
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<ApiStack>, StatusCode> {
    let profile = request.validate_and_into_profile().map_err(|e| {
        tracing::info!(error = %e, "rejected profile");
        StatusCode::BAD_REQUEST
    })?;

    let (catalog_source, candidates) = state.load_catalog().await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let stack = build_stack(&profile, &candidates, &state.stack_options);

    let mut stack_id = None;
    if let Some(pool) = &state.pool {
        match nutriwise_core::storage::stacks::persist_stack(pool, &profile, catalog_source, &stack)
            .await
        {
            Ok(id) => stack_id = Some(id),
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "persist stack failed; returning unsaved stack");
            }
        }
    }

    tracing::info!(
        ?stack_id,
        catalog_source,
        items = stack.supplements.len(),
        total_monthly_cost = stack.total_monthly_cost,
        "stack built"
    );

    Ok(Json(ApiStack {
        stack_id,
        catalog_source,
        stack,
    }))
}

async fn get_latest_stack(State(state): State<AppState>) -> Result<Json<StoredStack>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let stored = nutriwise_core::storage::stacks::fetch_stack(pool, None)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(stored))
}

async fn get_stack_by_id(
    State(state): State<AppState>,
    Path(stack_id): Path<String>,
) -> Result<Json<StoredStack>, StatusCode> {
    let Some(pool) = &state.pool else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let stack_id = Uuid::parse_str(&stack_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let stored = nutriwise_core::storage::stacks::fetch_stack(pool, Some(stack_id))
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(stored))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &nutriwise_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
