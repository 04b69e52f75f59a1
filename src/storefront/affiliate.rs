//! Affiliate tagging and ranking for outbound retailer links.

use serde::Deserialize;
use url::Url;

use super::types::BuyingOption;

/// Most buying options ever shown for one product.
pub const MAX_BUYING_OPTIONS: usize = 4;

/// How to tag links for one retailer.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AffiliateRule {
  /// Display name of the retailer
  pub retailer: String,
  /// Matched as a substring of the URL host
  pub domain: String,
  /// Query parameter that carries the partner id
  pub param: String,
  pub partner_id: String,
  /// Preferred partners are listed before other retailers
  #[serde(default)]
  pub preferred: bool,
}

impl AffiliateRule {
  fn matches(&self, url: &Url) -> bool {
    url
      .host_str()
      .is_some_and(|host| host.to_ascii_lowercase().contains(&self.domain.to_ascii_lowercase()))
  }

  /// Set the partner parameter, dropping any earlier values for it.
  fn apply(&self, url: &mut Url) {
    let retained: Vec<(String, String)> = url
      .query_pairs()
      .filter(|(name, _)| name != self.param.as_str())
      .map(|(name, value)| (name.into_owned(), value.into_owned()))
      .collect();

    url
      .query_pairs_mut()
      .clear()
      .extend_pairs(retained)
      .append_pair(&self.param, &self.partner_id);
  }
}

/// Ordered affiliate rules. The first rule whose domain matches a URL is the
/// only one applied to it.
#[derive(Debug, Clone)]
pub struct AffiliateLinks {
  rules: Vec<AffiliateRule>,
}

impl AffiliateLinks {
  pub fn new(rules: Vec<AffiliateRule>) -> Self {
    Self { rules }
  }

  fn rule_for(&self, url: &Url) -> Option<&AffiliateRule> {
    self.rules.iter().find(|rule| rule.matches(url))
  }

  /// Tag `url` with the matching retailer's partner id.
  ///
  /// URLs with no matching rule, and URLs that fail to parse, come back
  /// unchanged.
  pub fn rewrite(&self, url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
      return url.to_string();
    };

    match self.rule_for(&parsed) {
      Some(rule) => {
        rule.apply(&mut parsed);
        parsed.into()
      }
      None => url.to_string(),
    }
  }

  /// Whether `url` belongs to a preferred retailer.
  pub fn is_preferred_partner(&self, url: &str) -> bool {
    Url::parse(url)
      .ok()
      .and_then(|parsed| self.rule_for(&parsed).map(|rule| rule.preferred))
      .unwrap_or(false)
  }

  /// Move preferred-partner options to the front, keeping relative order
  /// within each group, and keep at most [`MAX_BUYING_OPTIONS`].
  pub fn rank(&self, options: Vec<BuyingOption>) -> Vec<BuyingOption> {
    let (mut ranked, others): (Vec<_>, Vec<_>) = options
      .into_iter()
      .partition(|option| self.is_preferred_partner(&option.url));

    ranked.extend(others);
    ranked.truncate(MAX_BUYING_OPTIONS);
    ranked
  }
}

/// Retailer host for display, without a leading `www.`.
pub fn source_name(url: &str) -> Option<String> {
  let parsed = Url::parse(url).ok()?;
  let host = parsed.host_str()?;
  Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}
