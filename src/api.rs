/// HTTP surface for the ticket analyzer
///
/// - `POST /group`   group raw vectors (with optional tags or texts)
/// - `POST /analyze` full pipeline over ticket rows, online or offline
/// - `GET  /health`
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::distance::compute_distances;
use crate::entity_extractor::{extract_all, EntityTags};
use crate::error::GroupingError;
use crate::group_builder::{build_groups, Group};
use crate::grouping::meaningful_groups;
use crate::grouping_config::GroupingConfig;
use crate::pipeline::{load_report, AnalysisReport, TicketPipeline};
use crate::ticket_loader::Ticket;

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: TicketPipeline,
    pub offline_results_path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct GroupRequest {
    pub vectors: Vec<Vec<f32>>,
    #[serde(default)]
    pub entity_tags: Option<Vec<EntityTags>>,
    #[serde(default)]
    pub texts: Option<Vec<String>>,
    pub max_distance: Option<f64>,
    pub asset_boost: Option<f64>,
    pub min_group_size: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub groups: Vec<Group>,
    pub meaningful_groups: Vec<Group>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Online,
    Offline,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Spreadsheet rows, column header → cell value
    pub tickets: Vec<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub mode: AnalysisMode,
    #[serde(default)]
    pub config: Option<GroupingConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

impl From<GroupingError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: GroupingError) -> Self {
        api_error(StatusCode::BAD_REQUEST, err.to_string())
    }
}

/// Middleware to log incoming requests
async fn log_request_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    info!("📥 {} {}", method, uri);
    let response = next.run(req).await;
    info!("📤 {} {} → {}", method, uri, response.status());

    response
}

pub fn router(state: Arc<AppState>) -> Router {
    // Configure CORS to allow requests from any origin (dashboards, notebooks)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/group", post(group_handler))
        .route("/analyze", post(analyze_handler))
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(log_request_middleware))
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn group_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GroupRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<GroupResponse>, ApiError> {
    let Json(payload) = payload.map_err(|err| {
        tracing::error!("Failed to parse JSON request: {}", err);
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON request body: {}", err),
        )
    })?;

    let defaults = state.pipeline.config();
    let max_distance = payload.max_distance.unwrap_or(defaults.max_distance);
    let asset_boost = payload.asset_boost.unwrap_or(defaults.asset_boost);
    let min_group_size = payload.min_group_size.unwrap_or(defaults.min_group_size);

    let n = payload.vectors.len();
    let entity_tags = match (payload.entity_tags, payload.texts) {
        (Some(tags), _) => tags,
        (None, Some(texts)) => extract_all(&texts),
        (None, None) => vec![EntityTags::new(); n],
    };

    let distances = compute_distances(&payload.vectors)?;
    let groups = build_groups(&distances, &entity_tags, max_distance, asset_boost)?;
    info!("🔗 Grouped {} vectors into {} groups", n, groups.len());

    Ok(Json(GroupResponse {
        meaningful_groups: meaningful_groups(groups.clone(), min_group_size),
        groups,
    }))
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let Json(payload) = payload.map_err(|err| {
        tracing::error!("Failed to parse JSON request: {}", err);
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON request body: {}", err),
        )
    })?;

    let tickets: Vec<Ticket> = payload
        .tickets
        .iter()
        .map(|row| Ticket::from_fields(&stringify_row(row)))
        .collect();

    if tickets.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No tickets provided"));
    }

    let config = payload
        .config
        .unwrap_or_else(|| state.pipeline.config().clone());
    info!("📊 Analysing {} tickets ({:?} mode)", tickets.len(), payload.mode);

    let result = match payload.mode {
        AnalysisMode::Online => state.pipeline.run_with_config(&tickets, &config).await,
        AnalysisMode::Offline => {
            let saved = load_report(&state.offline_results_path).map_err(|e| {
                api_error(
                    StatusCode::NOT_FOUND,
                    format!("Offline results unavailable: {:#}", e),
                )
            })?;
            state.pipeline.run_offline(&tickets, &config, &saved).await
        }
    };

    result.map(Json).map_err(|e| {
        tracing::error!("Analysis failed: {:#}", e);
        match e.downcast_ref::<GroupingError>() {
            Some(grouping) => api_error(StatusCode::BAD_REQUEST, grouping.to_string()),
            None => api_error(StatusCode::BAD_GATEWAY, format!("{:#}", e)),
        }
    })
}

/// Spreadsheet cells arrive as arbitrary JSON; treat them as text
fn stringify_row(row: &HashMap<String, serde_json::Value>) -> HashMap<String, String> {
    row.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}
