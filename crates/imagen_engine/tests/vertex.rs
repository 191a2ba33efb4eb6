use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use imagen_engine::{
    AspectRatio, BackendError, GenerationJob, GenerationRequest, GenerationSettings, ImageBackend,
    VertexBackend, VertexSettings,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREDICT_PATH: &str =
    "/v1/projects/test-project/locations/us-central1/publishers/google/models/imagen-test:predict";

fn settings_for(server: &MockServer) -> VertexSettings {
    VertexSettings {
        project_id: "test-project".to_string(),
        model_id: "imagen-test".to_string(),
        api_base: Some(server.uri()),
        access_token: Some("test-token".to_string()),
        ..VertexSettings::default()
    }
}

fn request(prompt: &str, variations: u8, aspect: AspectRatio) -> GenerationRequest {
    let job = GenerationJob {
        index: 0,
        prompt: prompt.to_string(),
        total: 1,
    };
    GenerationRequest::for_job(&job, &GenerationSettings::new(variations, aspect, 1))
}

#[tokio::test]
async fn predict_sends_parameters_and_decodes_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "instances": [{"prompt": "a red fox"}],
            "parameters": {
                "sampleCount": 2,
                "aspectRatio": "16:9",
                "safetySetting": "block_some",
                "personGeneration": "allow_adult"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "predictions": [
                {"bytesBase64Encoded": STANDARD.encode(b"first"), "mimeType": "image/png"},
                {"bytesBase64Encoded": STANDARD.encode(b"second"), "mimeType": "image/png"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = VertexBackend::connect(&settings_for(&server)).unwrap();
    assert_eq!(backend.model_name(), "imagen-test");

    let images = backend
        .generate(&request("a red fox", 2, AspectRatio::Widescreen))
        .await
        .expect("generate ok");
    let bytes: Vec<&[u8]> = images.iter().map(|img| img.bytes.as_slice()).collect();
    assert_eq!(bytes, vec![&b"first"[..], &b"second"[..]]);
}

#[tokio::test]
async fn empty_predictions_mean_zero_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let backend = VertexBackend::connect(&settings_for(&server)).unwrap();
    let images = backend
        .generate(&request("filtered", 3, AspectRatio::Square))
        .await
        .unwrap();
    assert!(images.is_empty());
}

#[tokio::test]
async fn http_errors_are_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(body_partial_json(json!({"instances": [{"prompt": "denied"}]})))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .and(body_partial_json(json!({"instances": [{"prompt": "busy"}]})))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
        .mount(&server)
        .await;

    let backend = VertexBackend::connect(&settings_for(&server)).unwrap();

    let err = backend
        .generate(&request("denied", 1, AspectRatio::Square))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Auth(ref msg) if msg.contains("permission denied")));

    let err = backend
        .generate(&request("busy", 1, AspectRatio::Square))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BackendError::HttpStatus {
            status: 429,
            body: "quota".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let backend = VertexBackend::connect(&settings_for(&server)).unwrap();
    let err = backend
        .generate(&request("x", 1, AspectRatio::Square))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PREDICT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"predictions": []})),
        )
        .mount(&server)
        .await;

    let settings = VertexSettings {
        request_timeout: Duration::from_millis(50),
        ..settings_for(&server)
    };
    let backend = VertexBackend::connect(&settings).unwrap();
    let err = backend
        .generate(&request("x", 1, AspectRatio::Square))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Timeout(_)));
}
