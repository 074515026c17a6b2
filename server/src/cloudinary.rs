use crate::config::AppConfig;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";
pub const IMAGE_FOLDER: &str = "image-uploads";
pub const VIDEO_FOLDER: &str = "video-uploads";
// requested at ingestion so the provider stores a normalized rendition
pub const VIDEO_TRANSFORMATION: &str = "q_auto,f_mp4";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider rejected upload (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub resource_type: ResourceType,
    pub folder: &'static str,
    pub transformation: Option<&'static str>,
}

impl UploadOptions {
    pub fn image() -> Self {
        Self {
            resource_type: ResourceType::Image,
            folder: IMAGE_FOLDER,
            transformation: None,
        }
    }

    pub fn video() -> Self {
        Self {
            resource_type: ResourceType::Video,
            folder: VIDEO_FOLDER,
            transformation: Some(VIDEO_TRANSFORMATION),
        }
    }
}

/// Metadata the provider returns for a completed upload.
#[derive(Debug, Deserialize)]
pub struct UploadResult {
    pub public_id: String,
    pub bytes: u64,
    #[serde(default)]
    pub duration: Option<f64>,
    pub secure_url: String,
}

/// Thin client for the provider's signed upload API. One buffered call per
/// request; no retries, no explicit timeout beyond client defaults.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryClient {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// None unless all three credentials are configured.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        match (
            config.cloudinary_cloud_name.as_ref(),
            config.cloudinary_api_key.as_ref(),
            config.cloudinary_api_secret.as_ref(),
        ) {
            (Some(cloud), Some(key), Some(secret)) => Some(Self::new(cloud, key, secret)),
            _ => None,
        }
    }

    // tests point this at a stub server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: String,
        options: UploadOptions,
    ) -> Result<UploadResult, ProviderError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut params: Vec<(&str, String)> = vec![
            ("folder", options.folder.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        if let Some(t) = options.transformation {
            params.push(("transformation", t.to_string()));
        }
        let signature = sign_params(&params, &self.api_secret);

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(filename))
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (name, value) in params {
            form = form.text(name, value);
        }

        let url = format!(
            "{}/v1_1/{}/{}/upload",
            self.base_url,
            self.cloud_name,
            options.resource_type.as_str()
        );

        let response = self.http.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected { status, body });
        }

        Ok(response.json::<UploadResult>().await?)
    }
}

/// Signature over the alphabetically sorted params joined with `&`, with
/// the API secret appended, hex-encoded SHA-256. The `file`, `api_key` and
/// `signature` fields are excluded by construction.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by_key(|(name, _)| *name);

    let joined = sorted
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
