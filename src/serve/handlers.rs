//! Request handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use panomapper::geocode::Geocoder;
use panomapper::{AreaDetections, GeoPoint, Session};

/// Application state shared across handlers
pub struct AppState {
    pub session: Session,
    pub geocoder: Geocoder,
    pub name_property: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    tiles: usize,
    detections: usize,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        tiles: state.session.tile_count(),
        detections: state.session.detection_count(),
    })
}

#[derive(Deserialize)]
pub struct DetectionsQueryParams {
    /// Free-text address
    text: String,
}

/// Detections around a geocoded address
pub async fn detections_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DetectionsQueryParams>,
) -> Result<Json<AreaDetections>, (StatusCode, String)> {
    let point = state.geocoder.geocode(&params.text).await.map_err(|e| {
        error!("Geocoding {:?} failed: {}", params.text, e);
        (StatusCode::BAD_GATEWAY, e.to_string())
    })?;

    let Some(point) = point else {
        warn!("Address not found: {:?}", params.text);
        return Err((
            StatusCode::NOT_FOUND,
            format!("address not found: {}", params.text),
        ));
    };

    let area = state.session.query(Some(point));
    debug!(
        "{:?}: {} tiles, {} detections",
        params.text,
        area.tiles.len(),
        area.detections.features.len()
    );
    Ok(Json(area))
}

#[derive(Deserialize)]
pub struct NeighborhoodQueryParams {
    #[serde(rename = "point.lat")]
    point_lat: f64,
    #[serde(rename = "point.lon")]
    point_lon: f64,
}

/// Detections around explicit coordinates
pub async fn neighborhood_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NeighborhoodQueryParams>,
) -> Result<Json<AreaDetections>, (StatusCode, String)> {
    let point = GeoPoint::new(params.point_lat, params.point_lon);
    if !point.is_finite() || !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lon)
    {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("invalid coordinates ({}, {})", point.lat, point.lon),
        ));
    }

    Ok(Json(state.session.query(Some(point))))
}

#[derive(Serialize)]
pub struct TileResponse {
    line: Option<i64>,
    row: Option<i64>,
    feature: geojson::Feature,
}

/// A single catalog tile with its grid position
pub async fn tile_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TileResponse>, (StatusCode, String)> {
    let tile = state
        .session
        .tile(&name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown tile {}", name)))?;

    let position = state.session.resolver().convention().parse(&tile.name).ok();

    Ok(Json(TileResponse {
        line: position.map(|(line, _)| line),
        row: position.map(|(_, row)| row),
        feature: tile.to_feature(&state.name_property),
    }))
}
