use std::process::Command;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use imagen_logging::{imagen_debug, imagen_info, imagen_warn};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{BackendError, GeneratedImage, GenerationRequest, ImageBackend};

#[derive(Debug, Clone)]
pub struct VertexSettings {
    pub project_id: String,
    pub location: String,
    pub model_id: String,
    /// Overrides `https://{location}-aiplatform.googleapis.com`.
    pub api_base: Option<String>,
    /// Explicit bearer token; skips the environment and gcloud lookups.
    pub access_token: Option<String>,
    pub access_token_env: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for VertexSettings {
    fn default() -> Self {
        Self {
            project_id: "my-imagen-generator".to_string(),
            location: "us-central1".to_string(),
            model_id: "imagen-3.0-generate-002".to_string(),
            api_base: None,
            access_token: None,
            access_token_env: "GOOGLE_ACCESS_TOKEN".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl VertexSettings {
    pub fn predict_url(&self) -> Result<Url, BackendError> {
        if self.project_id.trim().is_empty() {
            return Err(BackendError::Config("project id is empty".into()));
        }
        let base = match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        };
        let raw = format!(
            "{base}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.project_id, self.location, self.model_id
        );
        Url::parse(&raw).map_err(|err| BackendError::Config(format!("{raw}: {err}")))
    }
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: [Instance<'a>; 1],
    parameters: Parameters<'a>,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    sample_count: u8,
    aspect_ratio: &'a str,
    safety_setting: &'a str,
    person_generation: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

/// Imagen on Vertex AI via the REST `:predict` endpoint.
#[derive(Debug, Clone)]
pub struct VertexBackend {
    client: reqwest::Client,
    url: Url,
    token: String,
    model_id: String,
}

impl VertexBackend {
    /// Validates the settings, obtains an access token and builds the HTTP client.
    /// Blocking: may run `gcloud`.
    pub fn connect(settings: &VertexSettings) -> Result<Self, BackendError> {
        let url = settings.predict_url()?;
        let token = resolve_access_token(settings)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::Network(err.to_string()))?;

        imagen_info!(
            "Vertex backend configured project={} location={} model={}",
            settings.project_id,
            settings.location,
            settings.model_id
        );
        Ok(Self {
            client,
            url,
            token,
            model_id: settings.model_id.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ImageBackend for VertexBackend {
    fn model_name(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedImage>, BackendError> {
        let body = PredictRequest {
            instances: [Instance {
                prompt: &request.prompt,
            }],
            parameters: Parameters {
                sample_count: request.number_of_images,
                aspect_ratio: request.aspect_ratio.as_str(),
                safety_setting: request.safety_filter_level.as_str(),
                person_generation: request.person_generation.as_str(),
            },
        };
        let payload = serde_json::to_vec(&body)
            .map_err(|err| BackendError::InvalidResponse(err.to_string()))?;

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => BackendError::Auth(format!("{status}: {body}")),
                code => BackendError::HttpStatus { status: code, body },
            });
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: PredictResponse = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::InvalidResponse(err.to_string()))?;
        decode_predictions(parsed.predictions)
    }
}

fn decode_predictions(predictions: Vec<Prediction>) -> Result<Vec<GeneratedImage>, BackendError> {
    let mut images = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        let Some(encoded) = prediction.bytes_base64_encoded else {
            // Safety-filtered samples come back without image data.
            imagen_debug!(
                "Skipping prediction without image data: {:?}",
                prediction.rai_filtered_reason
            );
            continue;
        };
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|err| BackendError::InvalidResponse(format!("base64: {err}")))?;
        let mime = prediction
            .mime_type
            .unwrap_or_else(|| "image/png".to_string());
        images.push(GeneratedImage::new(bytes, mime));
    }
    Ok(images)
}

fn resolve_access_token(settings: &VertexSettings) -> Result<String, BackendError> {
    if let Some(token) = settings.access_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }
    if let Ok(token) = std::env::var(&settings.access_token_env) {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    imagen_warn!(
        "{} is not set; asking gcloud for an access token",
        settings.access_token_env
    );
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .map_err(|err| BackendError::Auth(format!("could not run gcloud: {err}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BackendError::Auth(format!(
            "gcloud auth print-access-token failed: {}",
            stderr.trim()
        )));
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(BackendError::Auth("gcloud returned an empty token".into()));
    }
    Ok(token)
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout(err.to_string());
    }
    BackendError::Network(err.to_string())
}
