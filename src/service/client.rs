use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audio::AudioBlob;
use crate::config::{AnswerConfig, TranscriptionConfig};
use crate::error::ServiceError;

/// Remote answer-generation service
#[async_trait::async_trait]
pub trait AnswerService: Send + Sync {
    /// Send one composed prompt and return the decoded JSON response
    async fn ask(&self, prompt: &str) -> Result<Value, ServiceError>;
}

/// Remote transcription service
#[async_trait::async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Upload one recording and return the decoded JSON response
    async fn transcribe(&self, audio: AudioBlob) -> Result<Value, ServiceError>;
}

/// Answer service reached with `GET endpoint?q=<prompt>`
#[derive(Clone)]
pub struct HttpAnswerClient {
    client: Client,
    config: AnswerConfig,
}

impl HttpAnswerClient {
    pub fn new(config: AnswerConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl AnswerService for HttpAnswerClient {
    async fn ask(&self, prompt: &str) -> Result<Value, ServiceError> {
        debug!("Querying answer service ({} chars)", prompt.len());

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[(self.config.query_param.as_str(), prompt)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Error statuses can still carry an answer body
            warn!("Answer service returned {}", status);
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Transcription service reached with a multipart POST
#[derive(Clone)]
pub struct HttpTranscriptionClient {
    client: Client,
    config: TranscriptionConfig,
}

impl HttpTranscriptionClient {
    pub fn new(config: TranscriptionConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl TranscriptionService for HttpTranscriptionClient {
    async fn transcribe(&self, audio: AudioBlob) -> Result<Value, ServiceError> {
        info!(
            "Uploading {} ({} bytes, {}ms) for transcription",
            audio.file_name,
            audio.bytes.len(),
            audio.duration_ms
        );

        let part = Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.mime_type)?;
        let form = Form::new().part(self.config.field_name.clone(), part);

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
