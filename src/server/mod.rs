//! Read-only HTTP layer over a published dive log.
//!
//! Handlers never mutate the model they read. Re-import replaces the
//! published model with a single atomic swap, so a request observes either
//! the fully-old or the fully-new model, never a mix; a failed rebuild
//! leaves the previous model in effect.

pub mod views;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::builder;
use crate::model::DiveLog;
use views::{DiveFull, DiveHead, SiteFull, SiteHead, TripView};

/// Shared server state: the published model and the import source used by
/// the rebuild endpoint.
#[derive(Clone)]
pub struct AppState {
    log: Arc<RwLock<Arc<DiveLog>>>,
    source: PathBuf,
}

impl AppState {
    /// Publish `log` as the initial model for a server reading `source`.
    pub fn new(log: DiveLog, source: PathBuf) -> Self {
        Self { log: Arc::new(RwLock::new(Arc::new(log))), source }
    }

    /// A consistent snapshot of the currently published model.
    fn snapshot(&self) -> Arc<DiveLog> {
        match self.log.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still holds a complete model; the write that
            // panicked never published a partial one.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Atomically replace the published model.
    fn publish(&self, log: DiveLog) {
        let fresh = Arc::new(log);
        match self.log.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/data/0", get(fetch_all))
        .route("/data/sites", get(fetch_sites))
        .route("/data/sites/:id", get(fetch_site))
        .route("/data/trips", get(fetch_trips))
        .route("/data/dives", get(fetch_dives))
        .route("/data/dives/:id", get(fetch_dive))
        .route("/data/tags", get(fetch_tags))
        .route("/action/rebuild", post(rebuild))
        .with_state(state)
}

/// Bind `addr` and serve requests until the process exits.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, router(state)).await
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Dump the whole published model in one response. Debugging surface; the
/// per-collection endpoints are the intended read path.
async fn fetch_all(State(state): State<AppState>) -> Json<serde_json::Value> {
    let log = state.snapshot();
    Json(serde_json::json!({
        "metadata": log.metadata(),
        "sites": log.sites(),
        "trips": log.trips(),
        "dives": log.dives(),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    headonly: bool,
    #[serde(default)]
    reverse: bool,
    tag: Option<String>,
}

/// Parse and bound-check a request identifier: 1-based, at most `max`.
fn checked_id(raw: &str, max: u32) -> Option<u32> {
    raw.parse::<u32>().ok().filter(|id| *id >= 1 && *id <= max)
}

async fn fetch_sites(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let log = state.snapshot();

    if query.headonly {
        let mut heads: Vec<SiteHead> = log.sites().iter().map(SiteHead::new).collect();
        heads.sort_by(|a, b| a.name.cmp(&b.name));
        Json(serde_json::json!(heads))
    } else {
        let sites: Vec<SiteFull> =
            log.sites().iter().map(|s| SiteFull::new(s, &log)).collect();
        Json(serde_json::json!(sites))
    }
}

async fn fetch_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SiteFull>, StatusCode> {
    let log = state.snapshot();
    let id = checked_id(&id, log.highest_site_id()).ok_or(StatusCode::BAD_REQUEST)?;
    let site = log.site(id).ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Json(SiteFull::new(site, &log)))
}

async fn fetch_trips(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<TripView>> {
    let log = state.snapshot();

    let mut trips: Vec<TripView> =
        log.trips().iter().map(|t| TripView::new(t, &log)).collect();

    // Newest-first is the default presentation; `reverse=true` restores
    // encounter order.
    if !query.reverse {
        trips.reverse();
        for trip in &mut trips {
            trip.linked_dives.reverse();
        }
    }

    Json(trips)
}

async fn fetch_dives(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let log = state.snapshot();
    let tag = query.tag.as_deref().unwrap_or("");

    if query.headonly {
        let heads: Vec<DiveHead> = log
            .dives()
            .iter()
            .filter_map(|d| log.site(d.dive_site_id).map(|s| DiveHead::new(d, s)))
            .collect();
        Json(serde_json::json!(heads))
    } else {
        let dives: Vec<DiveFull> = log
            .dives()
            .iter()
            .filter(|d| d.is_tagged_with(tag))
            .filter_map(|d| {
                log.site(d.dive_site_id)
                    .map(|s| DiveFull::new(d, s, log.highest_dive_id()))
            })
            .collect();
        Json(serde_json::json!(dives))
    }
}

async fn fetch_dive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DiveFull>, StatusCode> {
    let log = state.snapshot();
    let id = checked_id(&id, log.highest_dive_id()).ok_or(StatusCode::BAD_REQUEST)?;
    let dive = log.dive(id).ok_or(StatusCode::BAD_REQUEST)?;
    let site = log
        .site(dive.dive_site_id)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(DiveFull::new(dive, site, log.highest_dive_id())))
}

async fn fetch_tags(State(state): State<AppState>) -> Json<HashMap<String, u32>> {
    let log = state.snapshot();

    let mut tags: HashMap<String, u32> = HashMap::new();
    for dive in log.dives() {
        for tag in &dive.tags {
            *tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    Json(tags)
}

#[derive(Debug, Clone, Serialize)]
struct RebuildResponse {
    sites: u32,
    trips: u32,
    dives: u32,
}

/// Re-import the configured source and atomically publish the new model.
async fn rebuild(
    State(state): State<AppState>,
) -> Result<Json<RebuildResponse>, (StatusCode, String)> {
    let source = state.source.clone();
    let result = tokio::task::spawn_blocking(move || builder::import_file(&source))
        .await
        .map_err(|e| {
            (StatusCode::INTERNAL_SERVER_ERROR, format!("rebuild task failed: {e}"))
        })?;

    match result {
        Ok(fresh) => {
            let response = RebuildResponse {
                sites: fresh.highest_site_id(),
                trips: fresh.highest_trip_id(),
                dives: fresh.highest_dive_id(),
            };
            state.publish(fresh);
            info!("rebuilt model from {}", state.source.display());
            Ok(Json(response))
        }
        Err(e) => {
            // The previous model stays published.
            error!("rebuild failed, keeping current model: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("rebuild failed: {e}")))
        }
    }
}
