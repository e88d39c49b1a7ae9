//! # adrelay
//!
//! A read-heavy ad-targeting decision service. Given a per-request tuple
//! (country, os, app, optional state, ...) it returns the currently-active
//! advertising campaigns whose targeting rules admit the request, serving
//! from a two-tier cache so the source of truth sees a fraction of the
//! request load.
//!
//! ## Architecture
//!
//! - [`dimensions`] — pluggable per-dimension processors behind an explicit
//!   registry; country, os and app are built in, state (country-dependent),
//!   device type, age group and time of day ship as extensions.
//! - [`matcher`] — include-union / exclude-veto evaluation of a campaign's
//!   rule set, dispatched per dimension through the registry.
//! - [`cache`] — a process-local LRU tier over an optional shared Redis
//!   tier, composed behind one typed interface with counters and health.
//! - [`repository`] — the source-of-truth seam plus the cache-aware wrapper
//!   that materializes snapshots and inverted indexes asynchronously.
//! - [`service`] — the hot-path orchestrator the transport layer calls.
//! - [`api`] — the axum transport: `GET /v1/delivery` and `GET /health`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use adrelay::cache::{CacheConfig, HybridCache};
//! use adrelay::dimensions::DimensionRegistry;
//! use adrelay::models::DeliveryRequest;
//! use adrelay::repository::{CachedRepository, MemoryRepository};
//! use adrelay::DeliveryService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(DimensionRegistry::with_builtins());
//!     let config = CacheConfig::builder().enable_redis(false).build();
//!     let cache = Arc::new(HybridCache::new(config).await?);
//!
//!     let source = Arc::new(MemoryRepository::sample());
//!     let repository = Arc::new(CachedRepository::new(source, cache, Arc::clone(&registry)));
//!     let service = DeliveryService::new(repository, registry);
//!
//!     let request = DeliveryRequest::new("US", "Android", "com.any");
//!     for campaign in service.get_campaigns(&request).await? {
//!         println!("{} -> {}", campaign.cid, campaign.cta);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod dimensions;
pub mod error;
pub mod matcher;
pub mod models;
pub mod repository;
pub mod service;

// Re-export the main types for convenience
pub use error::{CacheError, CacheResult, DeliveryError};
pub use matcher::CampaignMatcher;
pub use service::DeliveryService;
