use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adrelay::api::{ApiServer, ApiServerConfig, AppState};
use adrelay::cache::{start_auto_sweep, CacheConfig, HybridCache};
use adrelay::config::AppConfig;
use adrelay::dimensions::{
    AgeGroupProcessor, DeviceTypeProcessor, DimensionRegistry, StateProcessor, TimeOfDayProcessor,
};
use adrelay::repository::{CachedRepository, MemoryRepository};
use adrelay::DeliveryService;

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = AppConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("adrelay={}", app_config.log_level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting adrelay ({} environment)", app_config.env);

    // Dimension registry: built-ins plus the extension processors. This is
    // the only place registration happens; everything downstream reads.
    let mut registry = DimensionRegistry::with_builtins();
    registry.register(Arc::new(StateProcessor::new()));
    registry.register(Arc::new(DeviceTypeProcessor));
    registry.register(Arc::new(AgeGroupProcessor));
    registry.register(Arc::new(TimeOfDayProcessor));
    let registry = Arc::new(registry);

    let cache_config = CacheConfig::from_env();
    let sweep_interval = cache_config.sweep_interval;
    let cache = Arc::new(HybridCache::new(cache_config).await?);

    if let Some(memory) = cache.memory_tier() {
        tokio::spawn(start_auto_sweep(memory, sweep_interval));
    }
    let _listener = cache.spawn_invalidation_listener();

    let source = Arc::new(MemoryRepository::sample());
    let repository = Arc::new(CachedRepository::new(
        source,
        Arc::clone(&cache),
        Arc::clone(&registry),
    ));
    let service = Arc::new(DeliveryService::new(repository, registry));

    let state = Arc::new(AppState { service, cache });
    let server = ApiServer::new(ApiServerConfig {
        port: app_config.port,
        ..Default::default()
    });
    server.start(state).await
}
