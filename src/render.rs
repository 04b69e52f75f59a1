//! Plain-text rendering for the CLI and the browse session.

use std::fmt::Write;

use crate::commands::COMMANDS;
use crate::storefront::types::{
  BuyingOption, Category, LocalResource, MarketInsight, OpportunityLevel, Product, Region,
};

const WIDTH: usize = 76;

/// Truncate a string to a maximum length in characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Session header: market and active aisle
pub fn header(region: Region, category: Option<Category>) -> String {
  let aisle = category.map(Category::label).unwrap_or("All aisles");
  format!("SilverSage | {} | {}", region, aisle)
}

pub fn products(products: &[Product]) -> String {
  if products.is_empty() {
    return "No products found.\n".to_string();
  }

  let mut out = String::new();
  for (i, product) in products.iter().enumerate() {
    let _ = writeln!(
      out,
      "{:>2}. {} {}  {} {}",
      i + 1,
      product.brand,
      product.name,
      product.price,
      product.currency
    );
    let _ = writeln!(out, "    {}", truncate(&product.description, WIDTH));
    let _ = writeln!(out, "    Why: {}", truncate(&product.reasoning, WIDTH - 5));
    let _ = writeln!(out, "    Image: {}", product.image_url);
  }
  out
}

pub fn buying_options(options: &[BuyingOption]) -> String {
  if options.is_empty() {
    return "No places to buy found.\n".to_string();
  }

  let mut out = String::new();
  for option in options {
    let _ = writeln!(out, "  {:<20} {}", option.source, truncate(&option.title, 54));
    let _ = writeln!(out, "    {}", option.url);
  }
  out
}

fn opportunity_label(level: OpportunityLevel) -> &'static str {
  match level {
    OpportunityLevel::High => "HIGH",
    OpportunityLevel::Medium => "MEDIUM",
    OpportunityLevel::Niche => "NICHE",
  }
}

pub fn insights(insights: &[MarketInsight]) -> String {
  if insights.is_empty() {
    return "No insights available.\n".to_string();
  }

  let mut out = String::new();
  for insight in insights {
    let _ = writeln!(
      out,
      "[{}] {}",
      opportunity_label(insight.opportunity_level),
      insight.title
    );
    let _ = writeln!(out, "  {}", truncate(&insight.description, WIDTH));
    if !insight.tags.is_empty() {
      let tags: Vec<String> = insight.tags.iter().map(|t| format!("#{}", t)).collect();
      let _ = writeln!(out, "  {}", tags.join(" "));
    }
  }
  out
}

pub fn local_resources(resources: &[LocalResource]) -> String {
  if resources.is_empty() {
    return "No local resources found.\n".to_string();
  }

  let mut out = String::new();
  for resource in resources {
    let _ = writeln!(out, "{} ({})", resource.name, resource.resource_type);
    let _ = writeln!(out, "  {}", truncate(&resource.description, WIDTH));
    let _ = writeln!(out, "  Contact: {}", resource.contact_info);
  }
  out
}

/// Command list for the browse session
pub fn help() -> String {
  let mut out = String::from("Commands:\n");
  for cmd in COMMANDS {
    let _ = writeln!(out, "  {:<24} {}", cmd.usage, cmd.description);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storefront::types::ResourceType;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("café crème brûlée", 7), "café...");
  }

  #[test]
  fn test_header() {
    assert_eq!(
      header(Region::Japan, Some(Category::Mobility)),
      "SilverSage | Japan | Mobility & Access"
    );
    assert!(header(Region::UnitedStates, None).ends_with("All aisles"));
  }

  #[test]
  fn test_empty_lists() {
    assert_eq!(products(&[]), "No products found.\n");
    assert_eq!(buying_options(&[]), "No places to buy found.\n");
    assert_eq!(insights(&[]), "No insights available.\n");
    assert_eq!(local_resources(&[]), "No local resources found.\n");
  }

  #[test]
  fn test_product_listing() {
    let product = Product {
      id: "p1".to_string(),
      name: "EZ Fold-N-Go".to_string(),
      brand: "Stander".to_string(),
      description: "Lightweight folding walker".to_string(),
      price: "149".to_string(),
      currency: "USD".to_string(),
      category: "Mobility".to_string(),
      reasoning: "Looks like furniture, not equipment".to_string(),
      image_url: "https://picsum.photos/seed/silversage-3/400/400".to_string(),
    };

    let out = products(&[product]);
    assert!(out.starts_with(" 1. Stander EZ Fold-N-Go  149 USD\n"));
    assert!(out.contains("Why: Looks like furniture"));
  }

  #[test]
  fn test_insight_and_resource_listing() {
    let insight = MarketInsight {
      title: "Smart Home".to_string(),
      description: "d".to_string(),
      opportunity_level: OpportunityLevel::High,
      tags: vec!["iot".to_string(), "safety".to_string()],
    };
    assert_eq!(insights(&[insight]), "[HIGH] Smart Home\n  d\n  #iot #safety\n");

    let resource = LocalResource {
      name: "Area Agency on Aging".to_string(),
      description: "Services".to_string(),
      contact_info: "555-0100".to_string(),
      resource_type: ResourceType::NonProfit,
    };
    assert!(local_resources(&[resource]).starts_with("Area Agency on Aging (Non-Profit)\n"));
  }

  #[test]
  fn test_help_lists_every_command() {
    let out = help();
    for cmd in COMMANDS {
      assert!(out.contains(cmd.usage));
    }
  }
}
