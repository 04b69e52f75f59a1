//! Turning model output into domain records.

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::ImageConfig;

use super::types::Product;

/// The remote text could not be read as the expected JSON array.
#[derive(Debug, Error)]
#[error("malformed response: {reason}")]
pub struct MalformedResponse {
  pub reason: String,
  /// The text as received, kept for diagnosis
  pub raw: String,
}

/// Locate the JSON array inside a reply that may carry prose or code fences.
///
/// Prefers the span from the first `[` to the last `]`. Without one, strips a
/// leading ```` ```json ```` or ```` ``` ```` fence and a trailing ```` ``` ````.
pub fn extract_json_payload(text: &str) -> &str {
  if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
    if start < end {
      return &text[start..=end];
    }
  }

  let trimmed = text.trim();
  let unfenced = trimmed
    .strip_prefix("```json")
    .or_else(|| trimmed.strip_prefix("```"))
    .unwrap_or(trimmed);
  unfenced.strip_suffix("```").unwrap_or(unfenced).trim()
}

/// The reply text, or an error when the API sent none.
pub fn require_text(text: Option<&str>) -> Result<&str, MalformedResponse> {
  text.ok_or_else(|| MalformedResponse {
    reason: "response carried no text".to_string(),
    raw: String::new(),
  })
}

/// Parse a list of records out of a model reply.
pub fn normalize<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, MalformedResponse> {
  serde_json::from_str(extract_json_payload(text)).map_err(|e| MalformedResponse {
    reason: e.to_string(),
    raw: text.to_string(),
  })
}

/// Parse products and attach locally resolved images and ids.
pub fn normalize_products(
  text: &str,
  images: &ImageResolver,
) -> Result<Vec<Product>, MalformedResponse> {
  let mut products: Vec<Product> = normalize(text)?;
  for product in &mut products {
    product.image_url = images.resolve(&product.brand, &product.name, &product.category);
    if product.id.trim().is_empty() {
      let digest = product_digest(&product.brand, &product.name, &product.category);
      product.id = hex::encode(&digest[..8]);
    }
  }
  Ok(products)
}

/// SHA-256 over the trimmed, lower-cased `{brand, name, category}` triple.
fn product_digest(brand: &str, name: &str, category: &str) -> [u8; 32] {
  let mut hasher = Sha256::new();
  for part in [brand, name, category] {
    hasher.update(part.trim().to_lowercase().as_bytes());
    // Unit separator keeps ("ab", "c") apart from ("a", "bc")
    hasher.update([0x1fu8]);
  }

  let mut digest = [0u8; 32];
  digest.copy_from_slice(&hasher.finalize());
  digest
}

/// Maps a product onto a fixed pool of stock images.
///
/// Remote image URLs are never used; the same product always lands on the
/// same image.
#[derive(Debug, Clone)]
pub struct ImageResolver {
  base_url: String,
  pool_size: u32,
}

impl ImageResolver {
  pub fn new(config: &ImageConfig) -> Self {
    Self {
      base_url: config.base_url.trim_end_matches('/').to_string(),
      pool_size: config.pool_size.max(1),
    }
  }

  /// Index into the image pool for a product.
  pub fn index(&self, brand: &str, name: &str, category: &str) -> u32 {
    let digest = product_digest(brand, name, category);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % u64::from(self.pool_size)) as u32
  }

  pub fn resolve(&self, brand: &str, name: &str, category: &str) -> String {
    format!(
      "{}/silversage-{}/400/400",
      self.base_url,
      self.index(brand, name, category)
    )
  }
}
