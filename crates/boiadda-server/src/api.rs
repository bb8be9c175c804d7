use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use boiadda_lending::Lending;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub lending: Arc<Lending>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(health_check))
        .route("/readyz", get(readiness_check))
        .route("/info", get(app_info))
        .merge(routes::auth::router())
        .merge(routes::catalog::router())
        .merge(routes::lending::router())
        .merge(routes::admin::router())
        .merge(routes::notifications::router())
        .merge(routes::dashboard::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and run the HTTP API server.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "HTTP API listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[derive(Serialize)]
struct RootResponse {
    msg: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct InfoResponse {
    name: String,
    version: &'static str,
    loan_period_days: i64,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        msg: "Welcome to the BoiAdda Library API.",
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    // Probe the database before reporting ready.
    state
        .lending
        .database()
        .map_err(|_| ApiError::NotReady)?
        .count_users()
        .map_err(|_| ApiError::NotReady)?;

    Ok(Json(HealthResponse {
        status: "ready",
        timestamp: Utc::now(),
    }))
}

async fn app_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        loan_period_days: state.lending.loan_period_days(),
    })
}
