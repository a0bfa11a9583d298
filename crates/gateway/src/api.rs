//! Request handlers and wire types.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use plandesk_core::error::Error;
use plandesk_core::question::{BenefitPlan, Question};

use crate::SharedState;

pub const LIVENESS_MESSAGE: &str = "Benefits assistant backend is running!";

// --- Wire types ---

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunRequest {
    pub preferences: String,
    #[serde(default)]
    pub plans: Vec<BenefitPlan>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub result: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A pipeline failure rendered as `{"error": ...}` with a mapped status.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::CompletionFailed(_) => StatusCode::BAD_GATEWAY,
            Error::HistoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self.0, "Request failed");
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// --- Handlers ---

pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: LIVENESS_MESSAGE.into(),
    })
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn ask_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    info!(user_id = %payload.user_id, question_len = payload.question.len(), "Question received");

    let question = Question::new(payload.question, payload.user_id);
    let answer = state.controller.answer(&question).await?;

    info!(user_id = %question.user_id, stage = answer.stage.number(), "Question answered");
    Ok(Json(AskResponse {
        answer: answer.text,
    }))
}

pub async fn run_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    info!(plans = payload.plans.len(), "Plan recommendation requested");

    let recommendation = state
        .advisor
        .recommend(&payload.preferences, &payload.plans)
        .await
        .map_err(Error::from)?;

    Ok(Json(RunResponse {
        result: recommendation.result,
    }))
}
