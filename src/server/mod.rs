//! The user-facing JSON web server that listens for prediction requests

use crate::error::PredictError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use tracing::*;

pub mod protocol;
pub mod routes;

impl actix_web::error::ResponseError for PredictError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("prediction failed: {self}");
        } else {
            warn!("rejected prediction: {self}");
        }

        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .json(protocol::ErrorDetail {
                detail: self.to_string(),
            })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::NotFound(_) => StatusCode::NOT_FOUND,
            PredictError::ShapeMismatch { .. } | PredictError::IndexOutOfBounds { .. } => {
                StatusCode::BAD_REQUEST
            }
            PredictError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
