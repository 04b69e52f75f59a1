//! SilverSage storefront: curated products, buying options, market insights,
//! and local support resources, backed by the content API.

pub mod affiliate;
pub mod cache;
pub mod client;
pub mod normalize;
pub mod prompts;
pub mod types;

pub use client::Storefront;
