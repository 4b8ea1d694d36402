//! HTTP adapter: axum routes over the prediction service.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::PredictionService;
use crate::domain::fill_missing_bmi;
use crate::ports::{FeatureScaler, RiskModel};
use crate::CardioriskError;

/// Error body returned by every failing route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub n_features: usize,
}

fn error_response(status: StatusCode, error: &str, details: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

impl IntoResponse for CardioriskError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            error_response(StatusCode::BAD_REQUEST, "Invalid input", self.to_string())
        } else {
            tracing::error!("Prediction failed: {}", self);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Prediction failed",
                self.to_string(),
            )
        }
    }
}

/// Score one patient.
///
/// `Bmi` is derived from height and weight when the client omits it.
async fn predict<S, M>(
    State(service): State<Arc<PredictionService<S, M>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    S: FeatureScaler + 'static,
    M: RiskModel + 'static,
{
    let Json(mut payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Malformed JSON",
                rejection.body_text(),
            )
        }
    };

    if fill_missing_bmi(&mut payload) {
        tracing::debug!("Bmi derived from height and weight");
    }

    match service.respond(&payload) {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health<S, M>(State(service): State<Arc<PredictionService<S, M>>>) -> Json<HealthResponse>
where
    S: FeatureScaler + 'static,
    M: RiskModel + 'static,
{
    Json(HealthResponse {
        status: "ok".to_string(),
        model: service.model_kind().to_string(),
        n_features: service.n_features(),
    })
}

/// Create the API router
pub fn create_router<S, M>(service: Arc<PredictionService<S, M>>) -> Router
where
    S: FeatureScaler + 'static,
    M: RiskModel + 'static,
{
    Router::new()
        .route("/predict", post(predict::<S, M>))
        .route("/health", get(health::<S, M>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Start the server and run until Ctrl-C.
///
/// # Errors
/// Returns an error if the address cannot be bound.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Cardiorisk listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("Ctrl-C handler unavailable; shutdown only by termination");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested");
        })
        .await
}
