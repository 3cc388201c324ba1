use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use formats::{CameraSummary, Coordinate, CountryCatalog, CountrySummary, DatasetFingerprint};
use foundation::math::Vec3;
use scene::camera::SELECTION_ALTITUDE;
use scene::{search_countries, CameraPose, GlobeContext};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{error_response, AppState};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

pub(crate) async fn list_countries(State(state): State<AppState>) -> Response {
    let set = state.catalog.read().countries();
    let out: Vec<CountrySummary> = set.iter().map(CountrySummary::from_record).collect();
    Json(out).into_response()
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    reloaded: bool,
    fingerprint: String,
    count: usize,
}

/// Re-reads the dataset file. Hashing and parsing run outside the catalog
/// lock; the write lock is held only to swap in the new catalog.
pub(crate) async fn reload_countries(State(state): State<AppState>) -> Response {
    let path = state.countries_path.as_ref();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("failed to read {}: {err}", path.display());
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to read {}: {err}", path.display()),
            );
        }
    };

    let fingerprint = DatasetFingerprint::of(&bytes);
    let unchanged = {
        let catalog = state.catalog.read();
        (catalog.fingerprint() == &fingerprint).then(|| ReloadResponse {
            reloaded: false,
            fingerprint: fingerprint.to_string(),
            count: catalog.countries().len(),
        })
    };
    if let Some(resp) = unchanged {
        return Json(resp).into_response();
    }

    let parsed = match tokio::task::spawn_blocking(move || CountryCatalog::from_bytes(&bytes)).await {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("country parse task failed: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "country parse task failed");
        }
    };
    let next = match parsed {
        Ok(next) => next,
        Err(err) => {
            warn!("country reload failed: {err}");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string());
        }
    };

    let count = next.countries().len();
    let reloaded = state.catalog.write().replace_with(next);
    if reloaded {
        info!("country dataset reloaded from {}", path.display());
    }
    Json(ReloadResponse {
        reloaded,
        fingerprint: fingerprint.to_string(),
        count,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocateRequest {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Serialize)]
struct LocateResponse {
    country: Option<CountrySummary>,
    coordinate: Option<Coordinate>,
    camera: Option<CameraSummary>,
}

/// Resolves a point on the globe to the country under it, with the camera
/// pose a client should fly to.
pub(crate) async fn locate(State(state): State<AppState>, Json(req): Json<LocateRequest>) -> Response {
    let set = state.catalog.read().countries();
    let mut ctx = GlobeContext::new();

    let Some(hit) = ctx.select_at_point(&set, Vec3::new(req.x, req.y, req.z)) else {
        return Json(LocateResponse {
            country: None,
            coordinate: None,
            camera: None,
        })
        .into_response();
    };

    let country = CountrySummary::from_record(hit.record());
    let coordinate = Coordinate::from(hit.coordinate());
    let camera = ctx.view.target_for(&ctx.selection).map(Into::into);
    Json(LocateResponse {
        country: Some(country),
        coordinate: Some(coordinate),
        camera,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

pub(crate) async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);
    let set = state.catalog.read().countries();
    let out: Vec<CountrySummary> = search_countries(&set, &params.q, limit)
        .iter()
        .map(|m| {
            CountrySummary::from(m)
                .with_camera(CameraPose::looking_at(m.hit.record().centroid, SELECTION_ALTITUDE))
        })
        .collect();
    Json(out).into_response()
}
