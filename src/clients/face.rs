//! Capability contracts for the external face-analysis sidecar, plus the
//! HTTP client implementing them.
//!
//! The engine never touches pixels itself: landmark extraction and embedding
//! comparison happen in a separate service, reached over JSON.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FaceApiConfig;

#[derive(Debug, Error)]
pub enum FaceApiError {
    /// Raised only when detection enforcement was requested and no face was
    /// found in either image.
    #[error("No face detected in image")]
    DetectionFailed,

    #[error("Face API request failed: {0}")]
    Http(String),

    #[error("Face API returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Eye centers in image-pixel coordinates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EyeCenters {
    pub left: (f64, f64),
    pub right: (f64, f64),
}

impl EyeCenters {
    /// Euclidean separation of the two eye centers, in pixels.
    #[must_use]
    pub fn separation(&self) -> f64 {
        let dx = self.left.0 - self.right.0;
        let dy = self.left.1 - self.right.1;
        dx.hypot(dy)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchResult {
    pub distance: f64,
    pub verified: bool,
}

/// Locates facial landmarks in a captured image.
#[async_trait]
pub trait FaceGeometry: Send + Sync {
    /// Returns the eye centers of the first detected face, or `None` when no
    /// face is found. Never errors on an undetectable face.
    async fn locate_eyes(&self, image: &[u8]) -> Result<Option<EyeCenters>, FaceApiError>;
}

/// Compares two face images and reports embedding distance.
#[async_trait]
pub trait FaceMatcher: Send + Sync {
    /// With `enforce_detection`, a missing face in either image fails with
    /// [`FaceApiError::DetectionFailed`]; without it the sidecar yields a
    /// best-effort distance.
    async fn compare(
        &self,
        captured: &[u8],
        reference: &[u8],
        enforce_detection: bool,
    ) -> Result<MatchResult, FaceApiError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

#[derive(Serialize)]
struct LandmarksRequest<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
struct LandmarksResponse {
    eyes: Option<EyeCenters>,
}

#[derive(Serialize)]
struct CompareRequest<'a> {
    img1: &'a str,
    img2: &'a str,
    enforce_detection: bool,
}

#[derive(Deserialize)]
struct CompareResponse {
    distance: Option<f64>,
    verified: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

pub struct FaceApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl FaceApiClient {
    pub fn new(config: &FaceApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds.into(),
            ))
            .user_agent("Rollcall/0.1")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build face API client: {e}"))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FaceGeometry for FaceApiClient {
    async fn locate_eyes(&self, image: &[u8]) -> Result<Option<EyeCenters>, FaceApiError> {
        let encoded = BASE64.encode(image);
        let url = format!("{}/landmarks", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&LandmarksRequest { image: &encoded })
            .send()
            .await
            .map_err(|e| FaceApiError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FaceApiError::Http(format!(
                "landmarks endpoint returned {}",
                response.status()
            )));
        }

        let body: LandmarksResponse = response
            .json()
            .await
            .map_err(|e| FaceApiError::InvalidResponse(e.to_string()))?;

        Ok(body.eyes)
    }
}

#[async_trait]
impl FaceMatcher for FaceApiClient {
    async fn compare(
        &self,
        captured: &[u8],
        reference: &[u8],
        enforce_detection: bool,
    ) -> Result<MatchResult, FaceApiError> {
        let img1 = BASE64.encode(captured);
        let img2 = BASE64.encode(reference);
        let url = format!("{}/verify", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&CompareRequest {
                img1: &img1,
                img2: &img2,
                enforce_detection,
            })
            .send()
            .await
            .map_err(|e| FaceApiError::Http(e.to_string()))?;

        let status = response.status();
        let body: CompareResponse = response
            .json()
            .await
            .map_err(|e| FaceApiError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            if enforce_detection && error.contains("no face") {
                return Err(FaceApiError::DetectionFailed);
            }
            return Err(FaceApiError::Http(error));
        }

        if !status.is_success() {
            return Err(FaceApiError::Http(format!(
                "verify endpoint returned {status}"
            )));
        }

        match (body.distance, body.verified) {
            (Some(distance), Some(verified)) => Ok(MatchResult { distance, verified }),
            _ => Err(FaceApiError::InvalidResponse(
                "verify response missing distance/verified".to_string(),
            )),
        }
    }
}
