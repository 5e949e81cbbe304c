use super::protocol::{ErrorDetail, PredictRequest, PredictResponse};
use crate::error::PredictError;
use crate::service::Predictor;
use actix_web::{error, post, web, HttpResponse, Responder};
use tracing::*;

type Result<T> = std::result::Result<T, PredictError>;

/// Classify the image named in the request body
#[post("/predict/")]
pub async fn predict(
    req: web::Json<PredictRequest>,
    state: web::Data<Predictor>,
) -> Result<impl Responder> {
    let image_path = req.into_inner().image_path;
    debug!("got prediction request for {image_path}");

    // Decode and forward pass are blocking
    let predicted_class = web::block(move || state.predict(&image_path))
        .await
        .map_err(PredictError::failed)??;

    info!("finished serving prediction request");
    Ok(web::Json(PredictResponse { predicted_class }))
}

/// Reject malformed bodies with a `{"detail": ...}` body and 422
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        warn!("malformed prediction request: {detail}");
        let resp = HttpResponse::UnprocessableEntity().json(ErrorDetail { detail });
        error::InternalError::from_response(err, resp).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test::{labels, predictor, FixedScores, TempImage};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    fn request(image_path: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/predict/")
            .set_json(PredictRequest {
                image_path: image_path.into(),
            })
    }

    #[actix_web::test]
    async fn test_predict_ok() {
        let mut scores = vec![0.001; 196];
        scores[195] = 0.8;
        let data = web::Data::new(predictor(FixedScores(scores), labels(196)));
        let app = test::init_service(App::new().app_data(data).service(predict)).await;
        let path = TempImage::png("route-ok.png");

        let resp = test::call_service(&app, request(path.path()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: PredictResponse = test::read_body_json(resp).await;
        assert_eq!(body.predicted_class, "class 195");
    }

    #[actix_web::test]
    async fn test_predict_not_found() {
        let data = web::Data::new(predictor(FixedScores(vec![1.0; 196]), labels(196)));
        let app = test::init_service(App::new().app_data(data).service(predict)).await;

        let resp = test::call_service(&app, request("/nonexistent/file.jpg").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorDetail = test::read_body_json(resp).await;
        assert_eq!(body.detail, "Image file not found: /nonexistent/file.jpg");
    }

    #[actix_web::test]
    async fn test_predict_label_mismatch() {
        let data = web::Data::new(predictor(FixedScores(vec![1.0; 5]), labels(196)));
        let app = test::init_service(App::new().app_data(data).service(predict)).await;
        let path = TempImage::png("route-mismatch.png");

        for _ in 0..2 {
            let resp = test::call_service(&app, request(path.path()).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: ErrorDetail = test::read_body_json(resp).await;
            assert!(body.detail.starts_with("ValueError: Prediction output shape mismatch"));
            assert!(body.detail.ends_with("but got: (1, 5)"));
        }
    }

    #[actix_web::test]
    async fn test_predict_corrupt_image() {
        let path = TempImage::raw("route-corrupt.png", b"\x89PNG but not really");
        let data = web::Data::new(predictor(FixedScores(vec![1.0]), labels(1)));
        let app = test::init_service(App::new().app_data(data).service(predict)).await;

        let resp = test::call_service(&app, request(path.path()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorDetail = test::read_body_json(resp).await;
        assert!(body.detail.starts_with("Prediction failed: "));
    }

    #[actix_web::test]
    async fn test_malformed_body() {
        let data = web::Data::new(predictor(FixedScores(vec![1.0]), labels(1)));
        let app = test::init_service(
            App::new()
                .app_data(data)
                .app_data(json_config())
                .service(predict),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/predict/")
            .set_json(serde_json::json!({ "path": "car.jpg" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorDetail = test::read_body_json(resp).await;
        assert!(body.detail.contains("image_path"));
    }
}
