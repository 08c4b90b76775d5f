//! HTTP front-end.
//!
//! A small actix-web app exposing the inference service: an HTML form at
//! `/`, a prediction endpoint at `/predict` accepting form or JSON bodies,
//! and a `/health` probe. Responses from `/predict` always carry a
//! `success` flag so form clients can branch without inspecting the status
//! code.

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{middleware, web, App, Either, HttpResponse, HttpServer, Responder};
use serde_json::json;

use crate::application::InferenceService;
use crate::CardioscopeError;

/// Shared state handed to every handler.
pub struct AppState {
    pub service: Arc<InferenceService>,
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Cardioscope - CVD Risk Assessment</title>
<style>
body { font-family: sans-serif; max-width: 640px; margin: 2em auto; }
label { display: block; margin-top: 0.6em; }
input, select { width: 12em; }
button { margin-top: 1em; padding: 0.4em 1.2em; }
.disclaimer { margin-top: 2em; font-size: 0.85em; color: #666; }
</style>
</head>
<body>
<h1>Cardiovascular Risk Assessment</h1>
<form method="post" action="/predict">
<label>Gender (0 female, 1 male) <input name="gender" value="0"></label>
<label>Height (cm) <input name="height" value="170"></label>
<label>Weight (kg) <input name="weight" value="70"></label>
<label>Systolic BP <input name="ap_hi" value="120"></label>
<label>Diastolic BP <input name="ap_lo" value="80"></label>
<label>Cholesterol (1-3) <input name="cholesterol" value="1"></label>
<label>Glucose (1-3) <input name="gluc" value="1"></label>
<label>Smoker (0/1) <input name="smoke" value="0"></label>
<label>Alcohol (0/1) <input name="alco" value="0"></label>
<label>Physically active (0/1) <input name="active" value="1"></label>
<label>Age (years) <input name="Age_Year" value="45"></label>
<button type="submit">Assess</button>
</form>
<p class="disclaimer">Educational tool only. Not a medical device and not a
substitute for professional medical advice.</p>
</body>
</html>
"#;

async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "model_loaded": state.service.is_available(),
        "probabilistic": state.service.is_probabilistic(),
    }))
}

async fn predict(
    state: web::Data<AppState>,
    body: Either<web::Form<HashMap<String, String>>, web::Json<HashMap<String, serde_json::Value>>>,
) -> impl Responder {
    // JSON bodies carry numbers; normalize everything to the string
    // key-values the parsing path expects.
    let values = match body {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json
            .into_inner()
            .into_iter()
            .map(|(k, v)| {
                let s = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, s)
            })
            .collect(),
    };
    let input = match crate::domain::PatientInput::from_key_values(&values) {
        Ok(input) => input,
        Err(message) => return failure(&CardioscopeError::Validation(message)),
    };

    match state.service.assess(&input) {
        Ok(assessment) => HttpResponse::Ok().json(json!({
            "success": true,
            "prediction": assessment.prediction.predicted_class,
            "probability": assessment.prediction.probability_percent,
            "risk_tier": assessment.risk_tier.map(|t| t.to_string()),
            "recommendations": assessment.recommendations,
        })),
        Err(err) => failure(&err),
    }
}

fn failure(err: &CardioscopeError) -> HttpResponse {
    let body = json!({ "success": false, "error": err.to_string() });
    match err {
        CardioscopeError::Validation(_) | CardioscopeError::Inference(_) => {
            HttpResponse::BadRequest().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

/// Register routes on an actix `App`. Split out so tests can build the app
/// without binding a socket.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        .route("/predict", web::post().to(predict));
}

/// Run the HTTP server until shutdown.
pub async fn serve(bind: &str, service: Arc<InferenceService>) -> std::io::Result<()> {
    tracing::info!(%bind, "starting HTTP front-end");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(AppState {
                service: service.clone(),
            }))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};

    use crate::adapters::artifact::{LinearModel, StandardScaler};
    use crate::ports::ModelHandle;

    fn probabilistic_service() -> Arc<InferenceService> {
        // z = (ap_hi - 120) / 10 against the identity scaler.
        let mut coef = vec![0.0; crate::domain::FEATURE_COUNT];
        coef[3] = 0.1;
        let model = LinearModel::new(coef, -12.0);
        Arc::new(InferenceService::from_parts(
            ModelHandle::Probabilistic(Box::new(model)),
            Box::new(StandardScaler::identity()),
        ))
    }

    async fn post_form(
        service: Arc<InferenceService>,
        form: &[(&str, &str)],
    ) -> (StatusCode, serde_json::Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState { service }))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_form(form)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: serde_json::Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_predict_defaults() {
        let (status, body) = post_form(probabilistic_service(), &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["prediction"], 1);
        assert_eq!(body["probability"], 50.0);
        assert_eq!(body["risk_tier"], "MODERATE");
    }

    #[actix_web::test]
    async fn test_predict_accepts_json_numbers() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    service: probabilistic_service(),
                }))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({"ap_hi": 130, "ap_lo": 80}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        // z = 1 -> p = 0.731... -> 73.1%
        assert_eq!(body["probability"], 73.1);
        assert_eq!(body["risk_tier"], "HIGH");
    }

    #[actix_web::test]
    async fn test_predict_rejects_reversed_pressure() {
        let form = [("ap_hi", "80"), ("ap_lo", "120")];
        let (status, body) = post_form(probabilistic_service(), &form).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("invalid patient input"));
    }

    #[actix_web::test]
    async fn test_predict_rejects_unparseable_field() {
        let form = [("height", "tall")];
        let (status, body) = post_form(probabilistic_service(), &form).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_predict_unavailable_model() {
        let service = Arc::new(InferenceService::unavailable());
        let (status, body) = post_form(service, &[]).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_health_reports_capability() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    service: probabilistic_service(),
                }))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_loaded"], true);
        assert_eq!(body["probabilistic"], true);
    }

    #[actix_web::test]
    async fn test_index_serves_form() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppState {
                    service: probabilistic_service(),
                }))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("Age_Year"));
    }
}
