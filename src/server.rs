use crate::config::{AppConfig, MapConfig};
use crate::error::Error;
use crate::export;
use crate::filter::Selection;
use crate::processing::Atlas;
use crate::render::{self, SiteMarker};
use crate::types::Site;
use crate::upload::{self, SiteFormat};
use anyhow::Result;
use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

const UPLOAD_FIELD: &str = "file";

/// Shared, read-only server state. A failed boundary load is kept as its
/// message so the server stays up and reports it on every map request.
pub struct AppState {
    pub atlas: std::result::Result<Atlas, String>,
    pub map: MapConfig,
}

impl AppState {
    fn atlas(&self) -> std::result::Result<&Atlas, ApiError> {
        self.atlas
            .as_ref()
            .map_err(|msg| ApiError(Error::DataLoad(msg.clone())))
    }
}

#[derive(Deserialize, Default)]
pub struct SelectionParams {
    zone: Option<String>,
    district: Option<String>,
}

impl SelectionParams {
    fn selection(&self) -> Selection {
        Selection::from_params(self.zone.as_deref(), self.district.as_deref())
    }
}

#[derive(Serialize)]
pub struct OptionsResponse {
    zones: Vec<String>,
    districts: Vec<String>,
}

pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            e if e.is_data_load() => StatusCode::SERVICE_UNAVAILABLE,
            Error::Upload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(%status, error = %self.0, "request failed");
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(state: Arc<AppState>, static_dir: Option<&std::path::Path>) -> Router {
    let app = Router::new()
        .route("/api/options", get(options_handler))
        .route("/api/map", get(map_handler))
        .route("/api/districts", get(districts_handler))
        .route("/api/sites", post(sites_handler))
        .route("/api/export/xlsx", post(export_xlsx_handler))
        .route("/api/export/kmz", post(export_kmz_handler));

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn start_server(config: AppConfig, atlas: std::result::Result<Atlas, Error>) -> Result<()> {
    let atlas = atlas.map_err(|e| {
        tracing::warn!(error = %e, "serving without district data");
        match e {
            Error::DataLoad(cause) => cause,
            other => other.to_string(),
        }
    });

    let state = Arc::new(AppState {
        atlas,
        map: config.map.clone(),
    });

    let app = router(state, config.server.static_dir.as_deref());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn options_handler(State(state): State<Arc<AppState>>) -> Result<Json<OptionsResponse>, ApiError> {
    let atlas = state.atlas()?;
    Ok(Json(OptionsResponse {
        zones: atlas.zone_options(),
        districts: atlas.district_options(),
    }))
}

async fn map_handler(State(state): State<Arc<AppState>>) -> Json<MapConfig> {
    Json(state.map.clone())
}

async fn districts_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let atlas = state.atlas()?;
    let selection = params.selection();
    Ok(Json(render::district_collection(atlas.select_districts(&selection))))
}

/// Reads the uploaded site list from the multipart `file` field.
async fn read_upload(mut multipart: Multipart) -> Result<Vec<Site>, ApiError> {
    let bad = |msg: String| ApiError(Error::Upload(msg));
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let format = SiteFormat::from_file_name(field.file_name().unwrap_or_default());
        let bytes = field.bytes().await.map_err(|e| bad(e.to_string()))?;
        return Ok(upload::parse_sites(&bytes, format)?);
    }
    Err(bad(format!("missing multipart field '{UPLOAD_FIELD}'")))
}

async fn located_sites(
    state: &AppState,
    params: &SelectionParams,
    multipart: Multipart,
) -> Result<Vec<Site>, ApiError> {
    let atlas = state.atlas()?;
    let sites = read_upload(multipart).await?;
    Ok(atlas.locate_sites(sites, &params.selection()))
}

async fn sites_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
    multipart: Multipart,
) -> Result<Json<Vec<SiteMarker>>, ApiError> {
    let sites = located_sites(&state, &params, multipart).await?;
    Ok(Json(render::site_markers(&sites)))
}

fn attachment(bytes: Vec<u8>, mime: &'static str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn export_xlsx_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let sites = located_sites(&state, &params, multipart).await?;
    let bytes = export::write_xlsx(&sites)?;
    Ok(attachment(bytes, export::XLSX_MIME, export::XLSX_FILE_NAME))
}

async fn export_kmz_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let sites = located_sites(&state, &params, multipart).await?;
    let bytes = export::write_kmz(&sites)?;
    Ok(attachment(bytes, export::KMZ_MIME, export::KMZ_FILE_NAME))
}
