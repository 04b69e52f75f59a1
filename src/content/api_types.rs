//! Serde types matching the Gemini `generateContent` wire format.
//!
//! These types are separate from the client-facing request/reply types so the
//! rest of the crate never sees provider-specific field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{ContentReply, GenerateRequest, GroundingLink, ReplyMode};

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGenerateRequest {
  pub contents: Vec<ApiContent>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub generation_config: Option<ApiGenerationConfig>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub tools: Vec<ApiTool>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ApiContent {
  #[serde(default)]
  pub parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ApiPart {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiGenerationConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response_mime_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub response_schema: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTool {
  pub google_search: ApiGoogleSearch,
}

#[derive(Debug, Serialize)]
pub struct ApiGoogleSearch {}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiGenerateResponse {
  #[serde(default)]
  pub candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCandidate {
  #[serde(default)]
  pub content: Option<ApiContent>,
  #[serde(default)]
  pub grounding_metadata: Option<ApiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroundingMetadata {
  #[serde(default)]
  pub grounding_chunks: Vec<ApiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
pub struct ApiGroundingChunk {
  pub web: Option<ApiWebChunk>,
}

#[derive(Debug, Deserialize)]
pub struct ApiWebChunk {
  pub uri: Option<String>,
  pub title: Option<String>,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&GenerateRequest> for ApiGenerateRequest {
  fn from(request: &GenerateRequest) -> Self {
    let contents = vec![ApiContent {
      parts: vec![ApiPart {
        text: Some(request.prompt.clone()),
      }],
    }];

    match &request.mode {
      ReplyMode::Json { schema } => ApiGenerateRequest {
        contents,
        generation_config: Some(ApiGenerationConfig {
          response_mime_type: Some("application/json".to_string()),
          response_schema: Some(schema.clone()),
          temperature: request.temperature,
        }),
        tools: Vec::new(),
      },
      // Search grounding and a response schema cannot be combined
      ReplyMode::Grounded => ApiGenerateRequest {
        contents,
        generation_config: request.temperature.map(|t| ApiGenerationConfig {
          temperature: Some(t),
          ..Default::default()
        }),
        tools: vec![ApiTool {
          google_search: ApiGoogleSearch {},
        }],
      },
    }
  }
}

impl ApiGenerateResponse {
  /// Collapse the first candidate into a reply.
  ///
  /// Text parts are concatenated; grounding chunks without a URI or title are
  /// dropped.
  pub fn into_reply(self) -> ContentReply {
    let Some(candidate) = self.candidates.into_iter().next() else {
      return ContentReply::default();
    };

    let text: String = candidate
      .content
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();

    let grounding = candidate
      .grounding_metadata
      .map(|m| m.grounding_chunks)
      .unwrap_or_default()
      .into_iter()
      .filter_map(|chunk| {
        let web = chunk.web?;
        Some(GroundingLink {
          url: web.uri?,
          title: web.title?,
        })
      })
      .collect();

    ContentReply {
      text: (!text.is_empty()).then_some(text),
      grounding,
    }
  }
}
