use crate::app_config::AppConfig;
use crate::cboe::cboe_commands::{analyze_fetched, BatchEntry};
use crate::cboe::{config, CboeClient};
use crate::gex::{analyze_snapshot, GexReport, GexSettings};
use crate::utility::AggregateTimer;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GexQuery {
    pub symbol: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, start_time: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }

    fn err(error: impl std::fmt::Display, start_time: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    client: Arc<CboeClient>,
    cache: Arc<RwLock<HashMap<String, (GexReport, Instant)>>>,
    settings: GexSettings,
    batch_symbols: Arc<Vec<String>>,
    max_concurrent: usize,
}

const CACHE_DURATION: Duration = Duration::from_secs(config::REPORT_CACHE_SECS);

impl AppState {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(CboeClient::new()?),
            cache: Arc::new(RwLock::new(HashMap::new())),
            settings: cfg.settings,
            batch_symbols: Arc::new(cfg.batch_symbols.clone()),
            max_concurrent: cfg.max_concurrent,
        })
    }

    async fn cached(&self, symbol: &str) -> Option<GexReport> {
        let cache = self.cache.read().await;
        cache
            .get(symbol)
            .filter(|(_, cached_at)| cached_at.elapsed() < CACHE_DURATION)
            .map(|(report, _)| report.clone())
    }

    async fn store(&self, report: &GexReport) {
        let mut cache = self.cache.write().await;
        cache.insert(report.underlying.clone(), (report.clone(), Instant::now()));
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /api/health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/gex?symbol=SPX - Gamma exposure report for one underlying
async fn get_gex(
    State(app_state): State<AppState>,
    Query(query): Query<GexQuery>,
) -> Result<Json<ApiResponse<GexReport>>, StatusCode> {
    let start_time = Instant::now();
    let symbol = query.symbol.trim().trim_start_matches('_').to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if let Some(report) = app_state.cached(&symbol).await {
        return Ok(Json(ApiResponse::ok(report, start_time)));
    }

    let snapshot = match app_state.client.fetch_snapshot(&symbol).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "fetch failed");
            return Ok(Json(ApiResponse::err(format!("{:#}", e), start_time)));
        }
    };

    let today = Local::now().date_naive();
    match analyze_snapshot(&snapshot, today, &app_state.settings) {
        Ok(report) => {
            app_state.store(&report).await;
            Ok(Json(ApiResponse::ok(report, start_time)))
        }
        Err(e) => Ok(Json(ApiResponse::err(e, start_time))),
    }
}

/// GET /api/gex/batch - Summary over the configured symbols
async fn get_gex_batch(State(app_state): State<AppState>) -> Json<ApiResponse<Vec<BatchEntry>>> {
    let start_time = Instant::now();
    let symbols = app_state.batch_symbols.as_ref().clone();

    let fetched = Arc::clone(&app_state.client)
        .fetch_all_snapshots(symbols.clone(), app_state.max_concurrent)
        .await;

    let mut timings = AggregateTimer::new("api batch analysis");
    let today = Local::now().date_naive();
    let outcomes = analyze_fetched(&symbols, fetched, today, &app_state.settings, &mut timings);
    timings.summary();

    let mut entries = Vec::with_capacity(outcomes.len());
    for (entry, report) in outcomes {
        if let Some(report) = report {
            app_state.store(&report).await;
        }
        entries.push(entry);
    }

    Json(ApiResponse::ok(entries, start_time))
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/gex", get(get_gex))
        .route("/api/gex/batch", get(get_gex_batch))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server(cfg: &AppConfig) -> Result<()> {
    let app = router(AppState::new(cfg)?);

    let addr = format!("127.0.0.1:{}", cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "gex api server listening");
    println!("🚀 GEX API Server running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET  /api/health");
    println!("   GET  /api/gex?symbol=SPX");
    println!("   GET  /api/gex/batch");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}
