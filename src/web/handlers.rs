//! HTTP request handlers.

use super::{AppState, Assets};
use crate::model::{parse_timestamp, TimeRange};
use crate::view::{
    parse_date, render_devices_fragment, render_map_fragment, render_page, DeviceFilter, KindFilter,
    MapViewport, RangeEdge, TimeError, TimeOfDay, ViewMode,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::Deserialize;

// ============================================================================
// Page and fragments
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Measured width of the map container, in CSS pixels.
    pub width: Option<f64>,
    #[serde(default)]
    pub search: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl PageQuery {
    fn viewport(&self) -> MapViewport {
        self.width.map_or_else(MapViewport::unmeasured, MapViewport::measured)
    }

    fn filter(&self) -> Result<DeviceFilter, String> {
        let kind = match self.kind.as_deref() {
            Some(s) => s.parse()?,
            None => KindFilter::All,
        };
        Ok(DeviceFilter::new(self.search.clone(), kind))
    }
}

pub async fn handle_index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> impl IntoResponse {
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    let snapshot = state.controller.snapshot().await;
    let selector = state.controller.selector().await;

    Html(render_page(
        &snapshot,
        &selector,
        &query.viewport(),
        &filter,
        state.controller.poll_interval().as_millis(),
    ))
    .into_response()
}

pub async fn handle_map_fragment(State(state): State<AppState>, Query(query): Query<PageQuery>) -> impl IntoResponse {
    let snapshot = state.controller.snapshot().await;
    Html(render_map_fragment(&snapshot, &query.viewport()))
}

pub async fn handle_devices_fragment(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    let snapshot = state.controller.snapshot().await;
    Html(render_devices_fragment(&snapshot, &filter)).into_response()
}

// ============================================================================
// API: View state
// ============================================================================

pub async fn handle_get_state(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.snapshot().await)
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: ViewMode,
}

pub async fn handle_set_mode(State(state): State<AppState>, Json(req): Json<ModeRequest>) -> impl IntoResponse {
    state.controller.set_view_mode(req.mode).await;
    Json(state.controller.snapshot().await)
}

pub async fn handle_set_time_range(State(state): State<AppState>, Json(range): Json<TimeRange>) -> impl IntoResponse {
    state.controller.set_time_range(range).await;
    Json(state.controller.snapshot().await)
}

#[derive(Debug, Deserialize)]
pub struct EdgeEditRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl EdgeEditRequest {
    fn parse(&self) -> Result<(Option<NaiveDate>, Option<TimeOfDay>), TimeError> {
        let date = self.date.as_deref().map(parse_date).transpose()?;
        let time = self.time.as_deref().map(|t| t.parse::<TimeOfDay>()).transpose()?;
        Ok((date, time))
    }
}

pub async fn handle_edit_time_range(
    State(state): State<AppState>,
    Path(edge): Path<String>,
    Json(req): Json<EdgeEditRequest>,
) -> impl IntoResponse {
    let edge = match edge.as_str() {
        "start" => RangeEdge::Start,
        "end" => RangeEdge::End,
        _ => return (StatusCode::NOT_FOUND, "Unknown range edge").into_response(),
    };

    match req.parse() {
        Ok((date, time)) => {
            state.controller.edit_time_range(edge, date, time).await;
            Json(state.controller.snapshot().await).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

pub async fn handle_get_notices(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.drain_notices().await)
}

// ============================================================================
// API: Devices
// ============================================================================

pub async fn handle_get_devices(State(state): State<AppState>, Query(query): Query<PageQuery>) -> impl IntoResponse {
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    let snapshot = state.controller.snapshot().await;
    let devices: Vec<_> = filter.apply(&snapshot.devices).into_iter().cloned().collect();
    Json(devices).into_response()
}

pub async fn handle_get_device(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.controller.service().get_device_by_id(&id).await {
        Some(device) => Json(device).into_response(),
        None => (StatusCode::NOT_FOUND, "Device not found").into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub start_time: String,
    pub end_time: String,
}

pub async fn handle_get_historical_positions(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let (start, end) = match (parse_timestamp(&query.start_time), parse_timestamp(&query.end_time)) {
        (Some(start), Some(end)) => (start, end),
        _ => return (StatusCode::BAD_REQUEST, "Invalid startTime or endTime").into_response(),
    };
    Json(state.controller.service().get_historical_positions(start, end).await).into_response()
}

pub async fn handle_select_device(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    if state.controller.select_device(&id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_asset(Path(path): Path<String>) -> impl IntoResponse {
    match Assets::get(&path) {
        Some(file) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                file.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

pub async fn handle_favicon() -> impl IntoResponse {
    // Return a simple SVG favicon
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <rect x="8" y="8" width="84" height="84" rx="8" fill="none" stroke="#1eaedb" stroke-width="6"/>
        <rect x="18" y="18" width="14" height="14" fill="#1eaedb"/>
        <circle cx="62" cy="58" r="10" fill="#8b5cf6"/>
        <path d="M30 70 L45 55 L62 58" stroke="#8b5cf6" stroke-width="4" stroke-dasharray="6,6" fill="none"/>
    </svg>"##;

    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}
