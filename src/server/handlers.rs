use super::types::{
    CalculateRequest, CalculateResponse, ErrorResponse, RecognitionResult, SolveStepsRequest,
    SolveStepsResponse, StatusResponse, VisionRequest,
};
use crate::{
    Error, Result,
    inference::MathSolver,
    store::{ImagePayload, ImageStore},
};
use axum::{extract::State, http::StatusCode, response::Json};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub solver: Arc<MathSolver>,
    pub store: Arc<ImageStore>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn failure(context: &str, e: &Error) -> ApiError {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    error!("{}: {}", context, e);
    (
        status,
        Json(ErrorResponse {
            error: context.to_string(),
            details: e.to_string(),
        }),
    )
}

fn image_payload(raw: Option<&str>) -> Result<ImagePayload> {
    match raw {
        Some(raw) => ImagePayload::parse(raw),
        None => Err(Error::invalid_image("imageBase64 is required")),
    }
}

pub async fn health() -> Json<StatusResponse> {
    info!("Test endpoint hit");
    Json(StatusResponse {
        status: "Server is running".to_string(),
    })
}

pub async fn vision(
    State(state): State<AppState>,
    Json(request): Json<VisionRequest>,
) -> std::result::Result<Json<RecognitionResult>, (StatusCode, Json<RecognitionResult>)> {
    info!("Vision endpoint hit");

    let outcome = match image_payload(request.image_base64.as_deref()) {
        Ok(image) => state.solver.recognize(&image).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(text) => {
            info!("Extracted text: {}", text);
            Ok(Json(RecognitionResult::Success { text }))
        }
        Err(e) => {
            let (status, Json(body)) = failure("Failed to process vision request", &e);
            Err((status, Json(body.into())))
        }
    }
}

pub async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateRequest>,
) -> std::result::Result<Json<CalculateResponse>, ApiError> {
    const CONTEXT: &str = "Failed to process calculation";

    let image = image_payload(request.image_base64.as_deref()).map_err(|e| failure(CONTEXT, &e))?;

    match state.solver.solve(&image, &request.ocr_text).await {
        Ok(description) => {
            info!("Solved {:?} as {:?}", request.ocr_text, description);
            Ok(Json(CalculateResponse { description }))
        }
        Err(e) => Err(failure(CONTEXT, &e)),
    }
}

pub async fn solve_steps(
    State(state): State<AppState>,
    Json(request): Json<SolveStepsRequest>,
) -> std::result::Result<Json<SolveStepsResponse>, ApiError> {
    const CONTEXT: &str = "Failed to generate solution steps";

    let image = image_payload(request.image_base64.as_deref()).map_err(|e| failure(CONTEXT, &e))?;

    match state.solver.explain(&image).await {
        Ok(steps) => Ok(Json(SolveStepsResponse { steps })),
        Err(e) => Err(failure(CONTEXT, &e)),
    }
}
