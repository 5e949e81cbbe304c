use serde::{Deserialize, Serialize};

/// Body of `POST /predict/`
#[derive(Debug, Deserialize, Serialize)]
pub struct PredictRequest {
    /// Path to an image readable by the server
    pub image_path: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictResponse {
    pub predicted_class: String,
}

/// Body of every error response
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}
