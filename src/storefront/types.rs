use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market the storefront is curating for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Region {
  #[default]
  #[serde(rename = "us")]
  #[value(name = "us")]
  UnitedStates,
  #[serde(rename = "eu")]
  #[value(name = "eu")]
  Europe,
  #[serde(rename = "kr")]
  #[value(name = "kr")]
  SouthKorea,
  #[serde(rename = "jp")]
  #[value(name = "jp")]
  Japan,
  #[serde(rename = "au")]
  #[value(name = "au")]
  Australia,
}

impl Region {
  /// Human-readable name, used in prompts and cache keys
  pub fn label(self) -> &'static str {
    match self {
      Region::UnitedStates => "United States",
      Region::Europe => "Europe",
      Region::SouthKorea => "South Korea",
      Region::Japan => "Japan",
      Region::Australia => "Australia",
    }
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Storefront aisle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Category {
  Holiday,
  Mobility,
  Cognition,
  Tech,
  Home,
  Wellness,
  Luxury,
}

impl Category {
  pub const ALL: [Category; 7] = [
    Category::Holiday,
    Category::Mobility,
    Category::Cognition,
    Category::Tech,
    Category::Home,
    Category::Wellness,
    Category::Luxury,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Category::Holiday => "Holiday Gift Guide",
      Category::Mobility => "Mobility & Access",
      Category::Cognition => "Brain Health & Memory",
      Category::Tech => "Assistive Tech",
      Category::Home => "Home & Living",
      Category::Wellness => "Wellness & Supplements",
      Category::Luxury => "Luxury Care",
    }
  }

  /// Parse either the short name (`mobility`) or the label, ignoring case.
  pub fn parse(input: &str) -> Option<Category> {
    let input = input.trim();
    Category::ALL.into_iter().find(|c| {
      c.label().eq_ignore_ascii_case(input)
        || c
          .to_possible_value()
          .is_some_and(|v| v.get_name().eq_ignore_ascii_case(input))
    })
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// A curated product listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  #[serde(default)]
  pub id: String,
  pub name: String,
  pub brand: String,
  pub description: String,
  pub price: String,
  pub currency: String,
  pub category: String,
  pub reasoning: String,
  /// Always resolved locally; whatever the remote call sends is replaced
  #[serde(default)]
  pub image_url: String,
}

/// A place to buy a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyingOption {
  pub title: String,
  pub url: String,
  /// Retailer host without a leading `www.`
  pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityLevel {
  High,
  Medium,
  Niche,
}

/// A thematic market or care trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsight {
  pub title: String,
  pub description: String,
  pub opportunity_level: OpportunityLevel,
  #[serde(default)]
  pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
  Government,
  #[serde(rename = "Non-Profit")]
  NonProfit,
  #[serde(rename = "Support Group")]
  SupportGroup,
}

impl fmt::Display for ResourceType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ResourceType::Government => "Government",
      ResourceType::NonProfit => "Non-Profit",
      ResourceType::SupportGroup => "Support Group",
    })
  }
}

/// A local support service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalResource {
  pub name: String,
  pub description: String,
  /// Phone number or website
  pub contact_info: String,
  #[serde(rename = "type")]
  pub resource_type: ResourceType,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_category_parse() {
    assert_eq!(Category::parse("mobility"), Some(Category::Mobility));
    assert_eq!(Category::parse(" Assistive Tech "), Some(Category::Tech));
    assert_eq!(Category::parse("HOLIDAY"), Some(Category::Holiday));
    assert_eq!(Category::parse("gardening"), None);
  }

  #[test]
  fn test_region_serde_uses_short_codes() {
    let region: Region = serde_yaml::from_str("kr").unwrap();
    assert_eq!(region, Region::SouthKorea);
    assert_eq!(region.to_string(), "South Korea");
  }

  #[test]
  fn test_local_resource_wire_names() {
    let resource: LocalResource = serde_json::from_str(
      r#"{"name":"Area Agency on Aging","description":"Help","contactInfo":"555-0100","type":"Non-Profit"}"#,
    )
    .unwrap();
    assert_eq!(resource.resource_type, ResourceType::NonProfit);
    assert_eq!(resource.contact_info, "555-0100");
  }
}
