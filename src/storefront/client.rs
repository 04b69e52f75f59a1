//! Storefront client that wraps the content API with caching and race guards.

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheLayer, CacheResult, CacheSource, CacheStorage, DEFAULT_TTL_MINUTES};
use crate::config::Config;
use crate::content::{ContentApi, ContentError};
use crate::query::{Delivery, LatestQuery, QueryState, RequestId};

use super::affiliate::{source_name, AffiliateLinks};
use super::cache::StorefrontQuery;
use super::normalize::{
  normalize, normalize_products, require_text, ImageResolver, MalformedResponse,
};
use super::prompts;
use super::types::{BuyingOption, Category, LocalResource, MarketInsight, Product, Region};

/// Why a remote lookup produced nothing.
#[derive(Debug, thiserror::Error)]
enum FetchError {
  #[error(transparent)]
  Remote(#[from] ContentError),
  #[error(transparent)]
  Malformed(#[from] MalformedResponse),
}

/// Operation families; each has its own request epoch and visible state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
  Products,
  BuyingOptions,
  Insights,
  LocalResources,
}

/// Storefront operations with transparent caching and latest-wins state.
///
/// Plain operations (`search_products`, ...) return data and never fail;
/// failures are logged and come back as an empty list. The `refresh_*`
/// variants additionally publish their result to the family's visible state,
/// unless a newer request of the same family was dispatched in the meantime.
pub struct Storefront {
  api: Arc<dyn ContentApi>,
  cache: CacheLayer,
  links: AffiliateLinks,
  images: ImageResolver,

  products_query: LatestQuery<Vec<Product>>,
  buying_options_query: LatestQuery<Vec<BuyingOption>>,
  insights_query: LatestQuery<Vec<MarketInsight>>,
  local_resources_query: LatestQuery<Vec<LocalResource>>,
}

impl Storefront {
  pub fn new(config: &Config, api: Arc<dyn ContentApi>, storage: Arc<dyn CacheStorage>) -> Self {
    let ttl = Some(config.cache.ttl_minutes)
      .filter(|minutes| *minutes > 0)
      .and_then(Duration::try_minutes)
      .unwrap_or_else(|| {
        warn!(ttl_minutes = config.cache.ttl_minutes, "Unusable cache TTL, using the default");
        Duration::minutes(DEFAULT_TTL_MINUTES)
      });
    let cache = CacheLayer::new(storage).with_ttl(ttl);

    Self {
      api,
      cache,
      links: AffiliateLinks::new(config.affiliates.clone()),
      images: ImageResolver::new(&config.images),
      products_query: LatestQuery::new(),
      buying_options_query: LatestQuery::new(),
      insights_query: LatestQuery::new(),
      local_resources_query: LatestQuery::new(),
    }
  }

  /// Search for curated products.
  ///
  /// A blank query falls back to a category-based default before the cache
  /// key is built.
  pub async fn search_products(
    &self,
    query: &str,
    region: Region,
    category: Option<Category>,
  ) -> Vec<Product> {
    let query = if query.trim().is_empty() {
      prompts::default_product_query(category)
    } else {
      query.to_string()
    };

    let key = StorefrontQuery::Products {
      query: &query,
      region,
      category,
    };

    self
      .cached(&key, || async {
        let reply = self
          .api
          .generate(&prompts::products(&query, region, category))
          .await?;
        let text = require_text(reply.text.as_deref())?;
        Ok::<_, FetchError>(normalize_products(text, &self.images)?)
      })
      .await
  }

  /// Find places to buy a product, partner links first.
  pub async fn buying_options(&self, product_name: &str, region: Region) -> Vec<BuyingOption> {
    let key = StorefrontQuery::BuyingOptions {
      product: product_name,
      region,
    };

    self
      .cached(&key, || async {
        let reply = self
          .api
          .generate(&prompts::buying_options(product_name, region))
          .await?;

        let options = reply
          .grounding
          .into_iter()
          .filter_map(|link| {
            let Some(source) = source_name(&link.url) else {
              debug!(url = %link.url, "Skipping grounding link with unparseable URL");
              return None;
            };
            Some(BuyingOption {
              url: self.links.rewrite(&link.url),
              title: link.title,
              source,
            })
          })
          .collect();

        Ok::<_, FetchError>(self.links.rank(options))
      })
      .await
  }

  /// Thematic market and care insights for a region.
  pub async fn insights(&self, region: Region) -> Vec<MarketInsight> {
    let key = StorefrontQuery::Insights { region };

    self
      .cached(&key, || async {
        let reply = self.api.generate(&prompts::insights(region)).await?;
        Ok::<_, FetchError>(normalize(require_text(reply.text.as_deref())?)?)
      })
      .await
  }

  /// Support services near a location.
  pub async fn local_resources(&self, location: &str, region: Region) -> Vec<LocalResource> {
    let key = StorefrontQuery::LocalResources { location, region };

    self
      .cached(&key, || async {
        let reply = self
          .api
          .generate(&prompts::local_resources(location, region))
          .await?;
        Ok::<_, FetchError>(normalize(require_text(reply.text.as_deref())?)?)
      })
      .await
  }

  /// Cache-first lookup that turns every failure into an empty list.
  async fn cached<T, F, Fut>(&self, key: &StorefrontQuery<'_>, fetch: F) -> Vec<T>
  where
    T: serde::Serialize + serde::de::DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<Vec<T>, FetchError>>,
  {
    let description = key.description();

    match self.cache.fetch_list(&key.cache_key(), fetch).await {
      Ok(CacheResult {
        data,
        source: CacheSource::Cache,
        cached_at,
      }) => {
        debug!(query = %description, ?cached_at, count = data.len(), "Served from cache");
        data
      }
      Ok(CacheResult { data, .. }) => {
        info!(query = %description, count = data.len(), "Fetched from content API");
        data
      }
      Err(FetchError::Malformed(e)) => {
        warn!(query = %description, reason = %e.reason, "Malformed content API response");
        debug!(raw = %e.raw, "Raw response");
        Vec::new()
      }
      Err(FetchError::Remote(e)) => {
        warn!(query = %description, error = %e, "Content API request failed");
        Vec::new()
      }
    }
  }

  // ==========================================================================
  // Race-guarded refreshes
  // ==========================================================================

  /// Start a request for `family`, superseding every earlier one.
  ///
  /// Call this where the request is dispatched, then pass the id to the
  /// matching `refresh_*` wherever the work runs.
  pub fn begin(&self, family: Family) -> RequestId {
    match family {
      Family::Products => self.products_query.begin(),
      Family::BuyingOptions => self.buying_options_query.begin(),
      Family::Insights => self.insights_query.begin(),
      Family::LocalResources => self.local_resources_query.begin(),
    }
  }

  #[instrument(skip(self))]
  pub async fn refresh_products(
    &self,
    id: RequestId,
    query: &str,
    region: Region,
    category: Option<Category>,
  ) -> Delivery {
    self
      .products_query
      .run_with(id, self.search_products(query, region, category))
      .await
  }

  #[instrument(skip(self))]
  pub async fn refresh_buying_options(
    &self,
    id: RequestId,
    product_name: &str,
    region: Region,
  ) -> Delivery {
    self
      .buying_options_query
      .run_with(id, self.buying_options(product_name, region))
      .await
  }

  #[instrument(skip(self))]
  pub async fn refresh_insights(&self, id: RequestId, region: Region) -> Delivery {
    self.insights_query.run_with(id, self.insights(region)).await
  }

  #[instrument(skip(self))]
  pub async fn refresh_local_resources(
    &self,
    id: RequestId,
    location: &str,
    region: Region,
  ) -> Delivery {
    self
      .local_resources_query
      .run_with(id, self.local_resources(location, region))
      .await
  }

  pub fn products_state(&self) -> QueryState<Vec<Product>> {
    self.products_query.snapshot()
  }

  pub fn buying_options_state(&self) -> QueryState<Vec<BuyingOption>> {
    self.buying_options_query.snapshot()
  }

  pub fn insights_state(&self) -> QueryState<Vec<MarketInsight>> {
    self.insights_query.snapshot()
  }

  pub fn local_resources_state(&self) -> QueryState<Vec<LocalResource>> {
    self.local_resources_query.snapshot()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStorage;
  use crate::content::fake::{products_named, text, FakeApi};
  use crate::content::{ContentReply, GroundingLink};

  /// Which of the marker words appears in the prompt.
  fn marker(prompt: &str) -> &'static str {
    ["first", "second", "third"]
      .into_iter()
      .find(|m| prompt.contains(m))
      .unwrap_or("other")
  }

  fn storefront(api: Arc<FakeApi>) -> Arc<Storefront> {
    let storage = Arc::new(MemoryStorage::new(1024 * 1024));
    Arc::new(Storefront::new(&Config::default(), api, storage))
  }

  #[tokio::test]
  async fn test_identical_search_is_served_from_cache() {
    let (api, _started) = FakeApi::new(|req| products_named(marker(&req.prompt)));
    let storefront = storefront(api.clone());

    let first = storefront
      .search_products("first walkers", Region::Japan, Some(Category::Mobility))
      .await;
    let second = storefront
      .search_products("  FIRST Walkers ", Region::Japan, Some(Category::Mobility))
      .await;

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_changed_filter_is_a_new_query() {
    let (api, _started) = FakeApi::new(|req| products_named(marker(&req.prompt)));
    let storefront = storefront(api.clone());

    storefront
      .search_products("canes", Region::UnitedStates, Some(Category::Mobility))
      .await;
    storefront
      .search_products("canes", Region::UnitedStates, None)
      .await;
    storefront
      .search_products("canes", Region::Europe, None)
      .await;

    assert_eq!(api.calls(), 3);
  }

  #[tokio::test]
  async fn test_products_get_local_images() {
    let (api, _started) = FakeApi::new(|req| products_named(marker(&req.prompt)));
    let storefront = storefront(api);

    let products = storefront
      .search_products("first", Region::UnitedStates, None)
      .await;
    assert!(products[0].image_url.starts_with("https://picsum.photos/seed/silversage-"));
  }

  #[tokio::test]
  async fn test_blank_query_uses_category_default() {
    let (api, mut started) = FakeApi::new(|_| text("[]"));
    let storefront = storefront(api.clone());

    storefront
      .search_products("   ", Region::UnitedStates, Some(Category::Mobility))
      .await;
    let prompt = started.recv().await.unwrap();
    assert!(prompt.contains("\"best Mobility & Access products\""));

    // The default query and its explicit spelling share a cache entry
    storefront
      .search_products(
        "best mobility & access products",
        Region::UnitedStates,
        Some(Category::Mobility),
      )
      .await;
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_empty_result_is_cached() {
    let (api, _started) = FakeApi::new(|_| text("[]"));
    let storefront = storefront(api.clone());

    assert!(storefront.insights(Region::Australia).await.is_empty());
    assert!(storefront.insights(Region::Australia).await.is_empty());
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_remote_failure_yields_empty_and_is_retried() {
    let (api, _started) = FakeApi::new(|_| {
      Err(ContentError::Status {
        status: 503,
        body: "unavailable".to_string(),
      })
    });
    let storefront = storefront(api.clone());

    assert!(storefront.insights(Region::Europe).await.is_empty());
    assert!(storefront.insights(Region::Europe).await.is_empty());
    assert_eq!(api.calls(), 2);
  }

  #[tokio::test]
  async fn test_malformed_reply_yields_empty_and_is_retried() {
    let (api, _started) = FakeApi::new(|_| text("I'm sorry, I can't list resources."));
    let storefront = storefront(api.clone());

    assert!(storefront
      .local_resources("Springfield", Region::UnitedStates)
      .await
      .is_empty());
    assert!(storefront
      .local_resources("Springfield", Region::UnitedStates)
      .await
      .is_empty());
    assert_eq!(api.calls(), 2);
  }

  #[tokio::test]
  async fn test_unusable_ttl_falls_back_to_default() {
    let (api, _started) = FakeApi::new(|_| text("[]"));
    let mut config = Config::default();
    config.cache.ttl_minutes = -1;
    let storefront = Storefront::new(&config, api.clone(), Arc::new(MemoryStorage::new(1024 * 1024)));

    storefront.insights(Region::Japan).await;
    storefront.insights(Region::Japan).await;
    assert_eq!(api.calls(), 1);

    config.cache.ttl_minutes = i64::MAX;
    let (api, _started) = FakeApi::new(|_| text("[]"));
    let storefront = Storefront::new(&config, api.clone(), Arc::new(MemoryStorage::new(1024 * 1024)));
    storefront.insights(Region::Japan).await;
    storefront.insights(Region::Japan).await;
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_reply_without_text_is_not_cached() {
    let (api, _started) = FakeApi::new(|_| Ok(ContentReply::default()));
    let storefront = storefront(api.clone());

    for _ in 0..2 {
      assert!(storefront.insights(Region::SouthKorea).await.is_empty());
      assert!(storefront
        .search_products("grab bars", Region::SouthKorea, None)
        .await
        .is_empty());
      assert!(storefront
        .local_resources("Seoul", Region::SouthKorea)
        .await
        .is_empty());
    }
    assert_eq!(api.calls(), 6);
  }

  #[tokio::test]
  async fn test_local_resources_and_insights_parse() {
    let (api, _started) = FakeApi::new(|req| {
      if req.prompt.contains("support resources") {
        text(
          r#"Sure! [{"name":"Area Agency on Aging","description":"Services","contactInfo":"555-0100","type":"Government"}]"#,
        )
      } else {
        text(r#"[{"title":"Fall detection","description":"d","opportunityLevel":"Niche","tags":[]}]"#)
      }
    });
    let storefront = storefront(api);

    let resources = storefront
      .local_resources("Springfield, IL", Region::UnitedStates)
      .await;
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].name, "Area Agency on Aging");

    let insights = storefront.insights(Region::UnitedStates).await;
    assert_eq!(insights[0].title, "Fall detection");
  }

  #[tokio::test]
  async fn test_buying_options_tagged_ranked_and_truncated() {
    let link = |url: &str| GroundingLink {
      url: url.to_string(),
      title: format!("Buy at {url}"),
    };
    let links = vec![
      link("https://www.bestbuy.com/site/1"),
      link("https://www.amazon.com/dp/B01?tag=other-20"),
      link("not a url"),
      link("https://www.costco.com/p/2"),
      link("https://www.walmart.com/ip/3"),
      link("https://www.target.com/p/4"),
    ];
    let (api, _started) = FakeApi::new(move |_| {
      Ok(ContentReply {
        text: Some("Here are some stores.".to_string()),
        grounding: links.clone(),
      })
    });
    let storefront = storefront(api.clone());

    let options = storefront
      .buying_options("Stander EZ Fold-N-Go", Region::UnitedStates)
      .await;
    let urls: Vec<&str> = options.iter().map(|o| o.url.as_str()).collect();
    assert_eq!(
      urls,
      vec![
        "https://www.amazon.com/dp/B01?tag=silversage-20",
        "https://www.walmart.com/ip/3?sourceid=1234567",
        "https://www.bestbuy.com/site/1",
        "https://www.costco.com/p/2",
      ]
    );
    assert_eq!(options[0].source, "amazon.com");

    storefront
      .buying_options("stander ez fold-n-go", Region::UnitedStates)
      .await;
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
  async fn test_only_latest_search_reaches_visible_state() {
    let (api, _started) = FakeApi::new(|req| products_named(marker(&req.prompt)));
    let gate1 = api.gate("first");
    let gate2 = api.gate("second");
    let gate3 = api.gate("third");
    let storefront = storefront(api.clone());

    // Ids are taken at dispatch, so the spawns need no pacing
    let spawn = |query: &'static str| {
      let id = storefront.begin(Family::Products);
      let storefront = storefront.clone();
      tokio::spawn(async move {
        storefront
          .refresh_products(id, query, Region::UnitedStates, Some(Category::Holiday))
          .await
      })
    };

    let h1 = spawn("first gifts");
    let h2 = spawn("second gifts");
    let h3 = spawn("third gifts");

    // 2 resolves before 1, then 3
    gate2.send(()).unwrap();
    assert!(!h2.await.unwrap().is_applied());
    gate1.send(()).unwrap();
    assert!(!h1.await.unwrap().is_applied());

    let state = storefront.products_state();
    assert!(state.loading);
    assert!(state.data.is_none());

    gate3.send(()).unwrap();
    assert!(h3.await.unwrap().is_applied());

    let state = storefront.products_state();
    assert!(!state.loading);
    assert_eq!(state.data.unwrap()[0].name, "third");

    // Superseded results were still cached
    let first = storefront
      .search_products("first gifts", Region::UnitedStates, Some(Category::Holiday))
      .await;
    assert_eq!(first[0].name, "first");
    assert_eq!(api.calls(), 3);
  }

  #[tokio::test]
  async fn test_families_do_not_block_each_other() {
    let (api, mut started) = FakeApi::new(|req| {
      if req.prompt.contains("Longevity Economy") {
        text(r#"[{"title":"t","description":"d","opportunityLevel":"High","tags":["x"]}]"#)
      } else {
        products_named(marker(&req.prompt))
      }
    });
    let gate = api.gate("first");
    let storefront = storefront(api);

    let pending = {
      let id = storefront.begin(Family::Products);
      let storefront = storefront.clone();
      tokio::spawn(async move {
        storefront
          .refresh_products(id, "first", Region::Japan, None)
          .await
      })
    };
    started.recv().await.unwrap();

    let id = storefront.begin(Family::Insights);
    assert!(storefront.refresh_insights(id, Region::Japan).await.is_applied());
    assert_eq!(storefront.insights_state().data.unwrap().len(), 1);
    assert!(storefront.products_state().loading);

    gate.send(()).unwrap();
    assert!(pending.await.unwrap().is_applied());
    assert!(!storefront.products_state().loading);
  }
}
