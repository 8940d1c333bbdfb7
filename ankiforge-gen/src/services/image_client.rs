//! Pollinations image generation client
//!
//! Images are requested by putting the prompt in the URL path and saved as
//! `<sanitized word>.jpg` in the images folder. An existing file is reused
//! without contacting the service.
//!
//! A download is tried a fixed number of times with a fixed pause in between.
//! Network errors, error statuses, empty bodies and bodies that do not sniff
//! as an image all count as a failed attempt. Filesystem errors do not.

use crate::services::ImageGenerator;
use crate::utils::{retry_transient, RetryPolicy, Transient};
use ankiforge_common::config::{ImageConfig, ImageQuality};
use async_trait::async_trait;
use reqwest::Url;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("ankiforge/", env!("CARGO_PKG_VERSION"));
const IMAGE_EXTENSION: &str = "jpg";

/// Prepended to every concept; the model otherwise likes to render the word itself
const NO_TEXT_INSTRUCTIONS: &str = "IMPORTANT: No text, no words, no letters, no numbers, no symbols, \
no signs, no labels, no typography of any kind. Pure visual concept only. ";

/// Image client errors
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Empty response body")]
    EmptyBody,

    #[error("Response is not an image (detected: {0})")]
    NotAnImage(String),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image generation failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl Transient for ImageError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ImageError::NetworkError(_)
                | ImageError::HttpStatus(_)
                | ImageError::EmptyBody
                | ImageError::NotAnImage(_)
        )
    }
}

/// Pollinations API client
pub struct PollinationsClient {
    http_client: reqwest::Client,
    base_url: String,
    output_dir: PathBuf,
    quality: ImageQuality,
    retry_policy: RetryPolicy,
}

impl PollinationsClient {
    /// Create a client saving into `output_dir` (created if missing)
    pub fn new(output_dir: PathBuf, config: &ImageConfig) -> Result<Self, ImageError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ImageError::NetworkError(e.to_string()))?;

        std::fs::create_dir_all(&output_dir)?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            output_dir,
            quality: config.quality,
            retry_policy: RetryPolicy::fixed(
                config.max_retries,
                Duration::from_millis(config.retry_delay_ms),
            ),
        })
    }

    /// Where the image for `word` is (or would be) stored
    pub fn image_path(&self, word: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", sanitize_filename(word), IMAGE_EXTENSION))
    }

    pub fn image_exists(&self, word: &str) -> bool {
        self.image_path(word).exists()
    }

    /// Request URL for an (already enhanced) prompt
    pub fn build_image_url(&self, prompt: &str) -> Result<Url, ImageError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ImageError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ImageError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(prompt);

        let size = self.quality.dimension().to_string();
        url.query_pairs_mut()
            .append_pair("width", &size)
            .append_pair("height", &size)
            .append_pair("nologo", "true");

        Ok(url)
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, ImageError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ImageError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ImageError::NetworkError(e.to_string()))?;

        if body.is_empty() {
            return Err(ImageError::EmptyBody);
        }

        match infer::get(&body) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(body.to_vec()),
            Some(kind) => Err(ImageError::NotAnImage(kind.mime_type().to_string())),
            None => Err(ImageError::NotAnImage("unknown".to_string())),
        }
    }
}

#[async_trait]
impl ImageGenerator for PollinationsClient {
    async fn generate_image(
        &self,
        word: &str,
        visual_concept: &str,
    ) -> Result<PathBuf, ImageError> {
        let output_path = self.image_path(word);

        if output_path.exists() {
            tracing::info!(path = %output_path.display(), "Image already exists, reusing");
            return Ok(output_path);
        }

        let url = self.build_image_url(&enhance_concept(visual_concept))?;
        tracing::debug!(word = %word, url = %url, "Requesting image");

        let bytes = retry_transient("image download", self.retry_policy, |attempt| {
            tracing::info!(
                word = %word,
                attempt,
                max_attempts = self.retry_policy.max_attempts,
                "Generating image"
            );
            self.download(&url)
        })
        .await
        .map_err(|failure| {
            if failure.error.is_transient() {
                ImageError::RetriesExhausted {
                    attempts: failure.attempts,
                    last_error: failure.error.to_string(),
                }
            } else {
                failure.error
            }
        })?;

        write_image(&output_path, &bytes).await?;
        tracing::info!(path = %output_path.display(), bytes = bytes.len(), "Image saved");

        Ok(output_path)
    }
}

/// Save via a temp file so an interrupted write is never mistaken for a finished image
async fn write_image(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let partial = path.with_extension(format!("{}.part", IMAGE_EXTENSION));
    tokio::fs::write(&partial, bytes).await?;
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    Ok(())
}

/// Prompt with the no-text instructions prepended
pub fn enhance_concept(concept: &str) -> String {
    format!("{}{}", NO_TEXT_INSTRUCTIONS, concept)
}

/// File stem for a word: lowercase, spaces to `_`, only alphanumerics, `_` and `-`
///
/// Words with no usable characters get `word_<hash prefix>` instead.
pub fn sanitize_filename(word: &str) -> String {
    let safe: String = word
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if safe.is_empty() {
        let digest = Sha256::digest(word.as_bytes());
        let hex: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
        return format!("word_{}", hex);
    }

    safe
}
