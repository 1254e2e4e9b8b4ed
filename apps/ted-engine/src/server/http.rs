//! REST endpoints over the calculated series.
//!
//! The decomposition output is computed once per data load and treated
//! as immutable here; handlers only merge it with tree metadata and
//! serialize. NaN values serialize as JSON null.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::decomposition::{DecompositionResult, Frequency, PeriodValue};
use crate::series::{DisplayMode, SeriesTree};

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    tree: Arc<SeriesTree>,
    result: Arc<DecompositionResult>,
}

impl AppState {
    /// New state over a tree and its calculated series.
    #[must_use]
    pub fn new(tree: Arc<SeriesTree>, result: Arc<DecompositionResult>) -> Self {
        Self { tree, result }
    }
}

/// Create the Axum router with all endpoints.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/series", get(get_series))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Query parameters for the series endpoint.
#[derive(Debug, Deserialize)]
struct SeriesQuery {
    /// Frequency code, `"Q"` or `"Y"`.
    freq: String,
}

/// One node's metadata and calculated data, as rendered clients need it.
#[derive(Debug, Serialize)]
pub struct SeriesEntry {
    /// Node name.
    pub name: String,
    /// Display label.
    pub label: String,
    /// Resolved `#rrggbb` color.
    pub color: String,
    /// Distance from the root, for indentation.
    pub depth: usize,
    /// Child names, in display order.
    pub children: Vec<String>,
    /// Display modes to suppress.
    pub hide: Vec<DisplayMode>,
    /// Period records, ascending.
    pub data: Vec<PeriodValue>,
}

/// Calculated series for every node at one frequency, tree pre-order.
async fn get_series(
    State(state): State<AppState>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<Vec<SeriesEntry>>, ApiError> {
    let frequency: Frequency = query.freq.parse().map_err(ApiError::bad_request)?;

    let by_name: HashMap<&str, &Vec<PeriodValue>> = state
        .result
        .series(frequency)
        .iter()
        .map(|s| (s.name.as_str(), &s.data))
        .collect();

    let mut entries = Vec::with_capacity(state.tree.nodes().len());
    for node in state.tree.nodes() {
        let data = by_name.get(node.name.as_str()).ok_or_else(|| {
            ApiError::internal(format!("no calculated series for '{}'", node.name))
        })?;
        entries.push(SeriesEntry {
            name: node.name.clone(),
            label: node.label.clone(),
            color: node.color.clone(),
            depth: node.depth,
            children: node.children.clone(),
            hide: node.hide.clone(),
            data: (*data).clone(),
        });
    }
    Ok(Json(entries))
}

/// API error response wrapper.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

/// Error body shape.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::decomposition::{DecompositionEngine, DecompositionSettings, RawBundle};
    use crate::series::{SeriesDefinition, SeriesTree};

    fn make_state() -> AppState {
        let defs = vec![
            SeriesDefinition::loaded("gdp", "GDP")
                .color("#7cb5ec")
                .children(vec![SeriesDefinition::loaded("gde", "GDE").color("#434348")]),
        ];
        let tree = SeriesTree::build(&defs).unwrap();

        let mut bundle = RawBundle::default();
        bundle.yearly.periods = vec!["2001".to_string(), "2002".to_string()];
        bundle.quarterly.periods = (0..8)
            .map(|i| format!("{}Q{}", 2001 + i / 4, i % 4 + 1))
            .collect();
        for name in ["gdp", "gde"] {
            bundle
                .yearly
                .real
                .insert(name.to_string(), vec![400.0, 408.0]);
            bundle
                .yearly
                .nominal
                .insert(name.to_string(), vec![420.0, 440.0]);
            bundle
                .quarterly
                .real
                .insert(name.to_string(), vec![100.0; 8]);
            bundle
                .quarterly
                .nominal
                .insert(name.to_string(), vec![105.0; 8]);
        }

        let engine = DecompositionEngine::new(
            tree.clone(),
            DecompositionSettings {
                base_year: 2002,
                aggregate: "gde".to_string(),
            },
        );
        let result = engine.decompose(&bundle).unwrap();
        AppState::new(Arc::new(tree), Arc::new(result))
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(make_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_series_yearly() {
        let app = create_router(make_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/series?freq=Y")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let entries: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entries[0]["name"], "gdp");
        assert_eq!(entries[0]["depth"], 0);
        assert_eq!(entries[1]["name"], "gde");
        assert_eq!(entries[1]["data"][1]["t"], "2002");
        // First-year growth has no trailing history and lands as null.
        assert!(entries[0]["data"][0]["growth"].is_null());
    }

    #[tokio::test]
    async fn test_get_series_rejects_unknown_frequency() {
        let app = create_router(make_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/series?freq=M")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
