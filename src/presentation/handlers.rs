// HTTP request handlers
use crate::application::session_controller::ConnectOutcome;
use crate::domain::connection::ConnectionConfig;
use crate::domain::log_entry::LevelFilter;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize, Default)]
pub struct LogQuery {
    pub level: Option<String>,
    pub search: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/session", post(connect).delete(disconnect))
        .route("/snapshot", get(snapshot))
        .route("/logs", get(logs))
        .route("/advisory", post(advisory))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Run the boot sequence for a submitted connection form
pub async fn connect(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ConnectionConfig>,
) -> Response {
    match state.controller.connect(config).await {
        ConnectOutcome::Connected => Json(state.controller.snapshot()).into_response(),
        ConnectOutcome::Cancelled => (
            StatusCode::CONFLICT,
            "session was disconnected before it finished connecting",
        )
            .into_response(),
    }
}

pub async fn disconnect(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.controller.disconnect();
    Json(state.controller.snapshot())
}

pub async fn snapshot(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.controller.snapshot())
}

/// Filtered view of the session log
pub async fn logs(
    Query(query): Query<LogQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let filter = match query.level.as_deref().unwrap_or("ALL").parse::<LevelFilter>() {
        Ok(filter) => filter,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let search = query.search.unwrap_or_default();

    Json(state.controller.logs(filter, &search)).into_response()
}

pub async fn advisory(State(state): State<Arc<AppState>>) -> Response {
    match state.controller.request_advisory().await {
        Some(result) => Json(result).into_response(),
        None => (StatusCode::CONFLICT, "no connected session").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::advisory_client::AdvisoryClient;
    use crate::application::session::HistorySeed;
    use crate::application::session_controller::SessionController;
    use crate::application::simulator::Simulator;
    use std::time::Duration;

    fn state() -> Arc<AppState> {
        let controller = SessionController::new(
            Simulator::default(),
            AdvisoryClient::new(None, Duration::from_secs(1), Duration::ZERO),
            HistorySeed {
                capacity: 50,
                points: 60,
                interval_ms: 10_000,
            },
            0.0,
        );
        Arc::new(AppState {
            controller: Arc::new(controller),
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "ok");
    }

    #[tokio::test]
    async fn test_unknown_level_is_bad_request() {
        let query = LogQuery {
            level: Some("DEBUG".to_string()),
            search: None,
        };
        let response = logs(Query(query), State(state())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_advisory_without_session_conflicts() {
        let response = advisory(State(state())).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_connect_returns_snapshot() {
        let state = state();
        let config = ConnectionConfig {
            kind: crate::domain::connection::ConnectionType::Lan,
            address: "10.0.0.5".to_string(),
            port: Some("9000".to_string()),
            api_key: None,
        };

        let response = connect(State(state.clone()), Json(config)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = advisory(State(state.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);

        state.controller.disconnect();
    }
}
