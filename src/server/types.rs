use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub ocr_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStepsRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Outcome of a recognition request, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognitionResult {
    Success {
        text: String,
    },
    Error {
        message: String,
        error: String,
        details: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SolveStepsResponse {
    pub steps: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

impl From<ErrorResponse> for RecognitionResult {
    fn from(body: ErrorResponse) -> Self {
        Self::Error {
            message: body.details.clone(),
            error: body.error,
            details: body.details,
        }
    }
}
