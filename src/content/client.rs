use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::{Config, ContentConfig};

use super::api_types::{ApiGenerateRequest, ApiGenerateResponse};

/// How the remote model should shape its reply.
#[derive(Debug, Clone)]
pub enum ReplyMode {
  /// Strict JSON conforming to the given response schema.
  Json { schema: Value },
  /// Free text backed by web search; links come back as grounding references.
  Grounded,
}

/// A single instruction for the content API.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
  pub prompt: String,
  pub mode: ReplyMode,
  pub temperature: Option<f32>,
}

/// A `{url, title}` pair returned by a search-grounded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingLink {
  pub url: String,
  pub title: String,
}

/// What came back from the content API.
#[derive(Debug, Clone, Default)]
pub struct ContentReply {
  pub text: Option<String>,
  pub grounding: Vec<GroundingLink>,
}

/// Errors from talking to the content API.
#[derive(Debug, Error)]
pub enum ContentError {
  /// Network failure, timeout, or an undecodable body.
  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with a non-success status.
  #[error("API returned {status}: {body}")]
  Status { status: u16, body: String },

  /// The client was built without credentials.
  #[error("no API key configured; set SILVERSAGE_API_KEY or GEMINI_API_KEY")]
  MissingApiKey,

  /// The key contains characters that cannot go into a header.
  #[error("API key is not a valid header value")]
  InvalidApiKey,
}

/// The remote content interface the storefront relies on.
pub trait ContentApi: Send + Sync {
  fn generate<'a>(
    &'a self,
    request: &'a GenerateRequest,
  ) -> BoxFuture<'a, Result<ContentReply, ContentError>>;
}

/// Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
  client: reqwest::Client,
  endpoint: String,
  model: String,
}

impl GeminiClient {
  pub fn new(config: &ContentConfig) -> Result<Self, ContentError> {
    let api_key = Config::get_api_key().ok_or(ContentError::MissingApiKey)?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let mut key_header =
      HeaderValue::from_str(&api_key).map_err(|_| ContentError::InvalidApiKey)?;
    key_header.set_sensitive(true);
    headers.insert("x-goog-api-key", key_header);

    let client = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;

    let endpoint = format!(
      "{}/models/{}:generateContent",
      config.base_url.trim_end_matches('/'),
      config.model
    );

    Ok(Self {
      client,
      endpoint,
      model: config.model.clone(),
    })
  }

  #[instrument(skip(self, request), fields(model = %self.model))]
  async fn send(&self, request: &GenerateRequest) -> Result<ContentReply, ContentError> {
    let body = ApiGenerateRequest::from(request);
    let response = self.client.post(&self.endpoint).json(&body).send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(ContentError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let parsed: ApiGenerateResponse = response.json().await?;
    let reply = parsed.into_reply();
    debug!(
      text_len = reply.text.as_ref().map_or(0, String::len),
      links = reply.grounding.len(),
      "Content API replied"
    );
    Ok(reply)
  }
}

impl ContentApi for GeminiClient {
  fn generate<'a>(
    &'a self,
    request: &'a GenerateRequest,
  ) -> BoxFuture<'a, Result<ContentReply, ContentError>> {
    Box::pin(self.send(request))
  }
}
