//! Cache keys for storefront queries.

use crate::cache::CacheKey;

use super::types::{Category, Region};

/// Query key types for storefront operations.
#[derive(Clone, Debug)]
pub enum StorefrontQuery<'a> {
  /// Curated product search
  Products {
    query: &'a str,
    region: Region,
    category: Option<Category>,
  },
  /// Places to buy a named product
  BuyingOptions { product: &'a str, region: Region },
  /// Market and care trends for a region
  Insights { region: Region },
  /// Support services near a location
  LocalResources { location: &'a str, region: Region },
}

impl StorefrontQuery<'_> {
  pub fn cache_key(&self) -> CacheKey {
    match self {
      Self::Products {
        query,
        region,
        category,
      } => CacheKey::build(
        "products",
        &[
          Some(*query),
          Some(region.label()),
          category.map(Category::label),
        ],
      ),
      Self::BuyingOptions { product, region } => {
        CacheKey::build("buying", &[Some(*product), Some(region.label())])
      }
      Self::Insights { region } => CacheKey::build("insights", &[Some(region.label())]),
      Self::LocalResources { location, region } => {
        CacheKey::build("resources", &[Some(*location), Some(region.label())])
      }
    }
  }

  pub fn description(&self) -> String {
    match self {
      Self::Products {
        query,
        region,
        category,
      } => match category {
        Some(c) => format!("products '{}' in {} ({})", query, c, region),
        None => format!("products '{}' ({})", query, region),
      },
      Self::BuyingOptions { product, region } => {
        format!("buying options for '{}' ({})", product, region)
      }
      Self::Insights { region } => format!("insights ({})", region),
      Self::LocalResources { location, region } => {
        format!("local resources near '{}' ({})", location, region)
      }
    }
  }
}
