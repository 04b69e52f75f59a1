//! Instructions and response schemas sent to the content API.

use serde_json::{json, Value};

use crate::content::{GenerateRequest, ReplyMode};

use super::types::{Category, Region};

const PRODUCT_COUNT: usize = 6;
const INSIGHT_COUNT: usize = 3;
const RESOURCE_COUNT: usize = 5;

/// Query used when the shopper submits an empty search box.
pub fn default_product_query(category: Option<Category>) -> String {
  match category {
    Some(c) => format!("best {} products", c.label()),
    None => "best products for aging parents".to_string(),
  }
}

/// Gift-season framing applies to the gift guide and to gift or deal searches.
pub fn is_holiday_context(query: &str, category: Option<Category>) -> bool {
  let query = query.to_lowercase();
  category == Some(Category::Holiday) || query.contains("black friday") || query.contains("gift")
}

pub fn products(query: &str, region: Region, category: Option<Category>) -> GenerateRequest {
  let holiday = is_holiday_context(query, category);
  let category_clause = category
    .map(|c| format!(" in the category of {}", c.label()))
    .unwrap_or_default();
  let holiday_focus = if holiday {
    "\n3. Gift-ability and holiday appeal. Favor items that are popular for Black Friday or make excellent gifts for aging parents."
  } else {
    ""
  };

  let prompt = format!(
    "You are a high-end curator for \"SilverSage\".\n\
     The user is looking for: \"{query}\"{category_clause}.\n\n\
     List REAL, EXISTING products from established brands available in {region}. \
     Do not invent fictional product names.\n\n\
     Find {PRODUCT_COUNT} distinct, high-quality products.\n\
     Focus on:\n\
     1. Design aesthetics (must not look medical).\n\
     2. Premium quality and durability.{holiday_focus}\n\n\
     Price: estimate the real market price in {region} currency."
  );

  let reasoning = if holiday {
    "Why this makes a great gift or deal."
  } else {
    "Why this fits the SilverSage aesthetic."
  };

  let schema = json!({
    "type": "ARRAY",
    "items": {
      "type": "OBJECT",
      "properties": {
        "id": { "type": "STRING" },
        "name": { "type": "STRING", "description": "Specific model name" },
        "brand": { "type": "STRING", "description": "Real brand name" },
        "description": { "type": "STRING" },
        "price": { "type": "STRING" },
        "currency": { "type": "STRING" },
        "category": { "type": "STRING" },
        "reasoning": { "type": "STRING", "description": reasoning },
      },
      "required": ["id", "name", "brand", "description", "price", "currency", "category", "reasoning"],
    },
  });

  GenerateRequest {
    prompt,
    mode: ReplyMode::Json { schema },
    // Lower temperature keeps product names factual
    temperature: Some(0.3),
  }
}

pub fn buying_options(product: &str, region: Region) -> GenerateRequest {
  GenerateRequest {
    prompt: format!(
      "Find purchase pages for \"{product}\" in {region}. \
       Prioritize major retailers like Amazon, Walmart, or direct manufacturer sites."
    ),
    mode: ReplyMode::Grounded,
    temperature: None,
  }
}

pub fn insights(region: Region) -> GenerateRequest {
  let prompt = format!(
    "Act as a strategy consultant for the \"Longevity Economy\" in {region}.\n\
     Generate {INSIGHT_COUNT} specific product niches and care trends for aging adults \
     that matter right now, with seasonal tips for caregivers."
  );

  GenerateRequest {
    prompt,
    mode: ReplyMode::Json {
      schema: insight_schema(),
    },
    temperature: None,
  }
}

pub fn local_resources(location: &str, region: Region) -> GenerateRequest {
  let prompt = format!(
    "List up to {RESOURCE_COUNT} real support resources for older adults and their caregivers \
     near \"{location}\" in {region}: government agencies, non-profits, and support groups. \
     Include a phone number or website for each. Only list organizations that exist."
  );

  let schema = json!({
    "type": "ARRAY",
    "items": {
      "type": "OBJECT",
      "properties": {
        "name": { "type": "STRING" },
        "description": { "type": "STRING" },
        "contactInfo": { "type": "STRING", "description": "Phone or website" },
        "type": { "type": "STRING", "enum": ["Government", "Non-Profit", "Support Group"] },
      },
      "required": ["name", "description", "contactInfo", "type"],
    },
  });

  GenerateRequest {
    prompt,
    mode: ReplyMode::Json { schema },
    temperature: None,
  }
}

fn insight_schema() -> Value {
  json!({
    "type": "ARRAY",
    "items": {
      "type": "OBJECT",
      "properties": {
        "title": { "type": "STRING" },
        "description": { "type": "STRING" },
        "opportunityLevel": { "type": "STRING", "enum": ["High", "Medium", "Niche"] },
        "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
      },
      "required": ["title", "description", "opportunityLevel", "tags"],
    },
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_query() {
    assert_eq!(
      default_product_query(Some(Category::Mobility)),
      "best Mobility & Access products"
    );
    assert_eq!(default_product_query(None), "best products for aging parents");
  }

  #[test]
  fn test_holiday_context() {
    assert!(is_holiday_context("walkers", Some(Category::Holiday)));
    assert!(is_holiday_context("Black Friday deals", None));
    assert!(is_holiday_context("gift ideas for grandpa", Some(Category::Tech)));
    assert!(!is_holiday_context("walkers", Some(Category::Mobility)));
  }

  #[test]
  fn test_product_prompt_mentions_gifts_only_in_holiday_context() {
    let holiday = products("anything", Region::Japan, Some(Category::Holiday));
    let plain = products("canes", Region::Japan, Some(Category::Mobility));

    assert!(holiday.prompt.contains("Gift-ability"));
    assert!(!plain.prompt.contains("Gift-ability"));
    assert!(plain.prompt.contains("in the category of Mobility & Access"));
    assert!(plain.prompt.contains("Japan"));

    let ReplyMode::Json { schema } = plain.mode else {
      panic!("products use schema mode");
    };
    assert_eq!(schema["items"]["required"].as_array().unwrap().len(), 8);
  }

  #[test]
  fn test_buying_options_are_grounded() {
    let request = buying_options("Bose SoundLink", Region::Australia);
    assert!(matches!(request.mode, ReplyMode::Grounded));
    assert!(request.prompt.contains("\"Bose SoundLink\" in Australia"));
  }
}
