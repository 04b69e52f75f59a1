use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::storefront::affiliate::AffiliateRule;
use crate::storefront::types::Region;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub content: ContentConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub images: ImageConfig,
  /// Affiliate rules, consulted in order; the first matching rule wins
  #[serde(default = "default_affiliates")]
  pub affiliates: Vec<AffiliateRule>,
  /// Region used when a command does not name one
  #[serde(default)]
  pub default_region: Region,
  #[serde(default)]
  pub log: LogConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      content: ContentConfig::default(),
      cache: CacheConfig::default(),
      images: ImageConfig::default(),
      affiliates: default_affiliates(),
      default_region: Region::default(),
      log: LogConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  #[serde(default = "default_model")]
  pub model: String,
  /// Upper bound on a single remote call
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ContentConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      model: default_model(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
  /// Process-local store, gone when the program exits
  #[default]
  Memory,
  /// SQLite file under the user data directory
  Sqlite,
  /// Caching disabled
  None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub backend: CacheBackend,
  #[serde(default = "default_ttl_minutes")]
  pub ttl_minutes: i64,
  /// Quota for the memory backend, in bytes of keys plus values
  #[serde(default = "default_max_bytes")]
  pub max_bytes: usize,
  /// Database file for the sqlite backend (default: $XDG_DATA_HOME/silversage/cache.db)
  #[serde(default)]
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend: CacheBackend::default(),
      ttl_minutes: default_ttl_minutes(),
      max_bytes: default_max_bytes(),
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
  #[serde(default = "default_image_base_url")]
  pub base_url: String,
  /// Number of distinct images products are spread over
  #[serde(default = "default_pool_size")]
  pub pool_size: u32,
}

impl Default for ImageConfig {
  fn default() -> Self {
    Self {
      base_url: default_image_base_url(),
      pool_size: default_pool_size(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
  /// Write logs to this file instead of stderr
  pub file: Option<PathBuf>,
}

fn default_base_url() -> String {
  "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
  "gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_ttl_minutes() -> i64 {
  crate::cache::DEFAULT_TTL_MINUTES
}

fn default_max_bytes() -> usize {
  5 * 1024 * 1024
}

fn default_image_base_url() -> String {
  "https://picsum.photos/seed".to_string()
}

fn default_pool_size() -> u32 {
  48
}

fn default_affiliates() -> Vec<AffiliateRule> {
  vec![
    AffiliateRule {
      retailer: "amazon".to_string(),
      domain: "amazon".to_string(),
      param: "tag".to_string(),
      partner_id: "silversage-20".to_string(),
      preferred: true,
    },
    AffiliateRule {
      retailer: "walmart".to_string(),
      domain: "walmart".to_string(),
      param: "sourceid".to_string(),
      partner_id: "1234567".to_string(),
      preferred: true,
    },
  ]
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./silversage.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/silversage/config.yaml
  ///
  /// Falls back to built-in defaults when no file is found.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => {
        debug!("No configuration file found, using defaults");
        Ok(Self::default())
      }
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("silversage.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("silversage").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    config
      .validate()
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))?;
    Ok(config)
  }

  /// Reject values that would break the cache at startup.
  fn validate(&self) -> Result<()> {
    let ttl = self.cache.ttl_minutes;
    if ttl < 1 || chrono::Duration::try_minutes(ttl).is_none() {
      return Err(eyre!("cache.ttl_minutes must be a positive number of minutes, got {}", ttl));
    }
    Ok(())
  }

  /// Get the content API key from environment variables.
  ///
  /// Checks SILVERSAGE_API_KEY first, then GEMINI_API_KEY as fallback.
  pub fn get_api_key() -> Option<String> {
    std::env::var("SILVERSAGE_API_KEY")
      .or_else(|_| std::env::var("GEMINI_API_KEY"))
      .ok()
      .filter(|key| !key.trim().is_empty())
  }
}
