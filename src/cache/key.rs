//! Deterministic cache keys built from operation arguments.

use std::fmt;

/// Prefix shared by every key this crate writes.
pub const KEY_NAMESPACE: &str = "silversage";

/// Bumped whenever the shape of cached values changes, so entries written by
/// an older build are never read back as the new shape.
pub const KEY_VERSION: &str = "v1";

/// Segment used for an argument that was not supplied at all.
pub const ABSENT_ARG: &str = "~none";

/// Segment used for an argument that was supplied but is blank after trimming.
pub const BLANK_ARG: &str = "~empty";

const DELIMITER: char = '_';

/// A normalized cache key of the form
/// `<namespace>_<version>_<operation>_<arg>_<arg>...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
  /// Build a key for `operation` from positional arguments.
  ///
  /// Arguments are trimmed and lower-cased, so keys are insensitive to case
  /// and surrounding whitespace. Positions are significant.
  pub fn build(operation: &str, args: &[Option<&str>]) -> Self {
    let mut key = format!("{KEY_NAMESPACE}{DELIMITER}{KEY_VERSION}{DELIMITER}{operation}");
    for arg in args {
      key.push(DELIMITER);
      key.push_str(&normalize_arg(*arg));
    }
    Self(key)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Normalize one argument into a key segment.
///
/// `%`, `_` and `~` are percent-escaped so an argument can never forge a
/// delimiter or a sentinel.
fn normalize_arg(arg: Option<&str>) -> String {
  let Some(arg) = arg else {
    return ABSENT_ARG.to_string();
  };

  let trimmed = arg.trim();
  if trimmed.is_empty() {
    return BLANK_ARG.to_string();
  }

  let mut out = String::with_capacity(trimmed.len());
  for c in trimmed.to_lowercase().chars() {
    match c {
      '%' => out.push_str("%25"),
      '_' => out.push_str("%5f"),
      '~' => out.push_str("%7e"),
      _ => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_key_layout() {
    let key = CacheKey::build("products", &[Some("Walkers"), Some("United States"), None]);
    assert_eq!(key.as_str(), "silversage_v1_products_walkers_united states_~none");
  }

  #[test]
  fn test_case_and_whitespace_insensitive() {
    let a = CacheKey::build("products", &[Some("  Smart Canes "), Some("Japan")]);
    let b = CacheKey::build("products", &[Some("smart canes"), Some("JAPAN  ")]);
    assert_eq!(a, b);
  }

  #[test]
  fn test_stable_across_calls() {
    let args = [Some("Hearing aids"), None];
    assert_eq!(
      CacheKey::build("products", &args),
      CacheKey::build("products", &args)
    );
  }

  #[test]
  fn test_absent_and_blank_are_distinct() {
    let absent = CacheKey::build("products", &[Some("q"), None]);
    let blank = CacheKey::build("products", &[Some("q"), Some("   ")]);
    let empty = CacheKey::build("products", &[Some("q"), Some("")]);

    assert_ne!(absent, blank);
    // Empty and whitespace-only are the same normalized argument
    assert_eq!(blank, empty);
    assert!(!blank.as_str().ends_with(DELIMITER));
  }

  #[test]
  fn test_positions_are_not_sorted() {
    let a = CacheKey::build("op", &[Some("x"), Some("y")]);
    let b = CacheKey::build("op", &[Some("y"), Some("x")]);
    assert_ne!(a, b);
  }

  #[test]
  fn test_delimiter_in_argument_does_not_collide() {
    let a = CacheKey::build("op", &[Some("a_b"), Some("c")]);
    let b = CacheKey::build("op", &[Some("a"), Some("b_c")]);
    assert_ne!(a, b);
  }

  #[test]
  fn test_sentinel_cannot_be_forged() {
    let forged = CacheKey::build("op", &[Some("~none")]);
    let absent = CacheKey::build("op", &[None]);
    assert_ne!(forged, absent);
  }

  #[test]
  fn test_operation_separates_keys() {
    let a = CacheKey::build("insights", &[Some("japan")]);
    let b = CacheKey::build("products", &[Some("japan")]);
    assert_ne!(a, b);
  }
}
