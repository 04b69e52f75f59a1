//! Remote content generation.

pub mod api_types;
pub mod client;
#[cfg(test)]
pub mod fake;

pub use client::{
  ContentApi, ContentError, ContentReply, GeminiClient, GenerateRequest, GroundingLink, ReplyMode,
};
