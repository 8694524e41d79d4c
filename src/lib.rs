pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;
pub mod storage;

use std::sync::Arc;

use services::{BookingService, ShowService};
use storage::{PgStore, Store};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub cache: cache::CacheService,
    pub shows: ShowService,
    pub bookings: BookingService,
}

impl AppState {
    /// Connects postgres and redis, runs the migrations and wires the services.
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        let cache = cache::CacheService::connect(
            config.redis.url.as_deref(),
            config.redis.seat_map_ttl_secs,
        )
        .await;
        if !cache.is_enabled() {
            tracing::info!("Seat cache disabled");
        }

        let store: Arc<dyn Store> = Arc::new(PgStore::new(db.pool));
        Ok(Self::with_store(config, store, cache))
    }

    /// Wires the services over an arbitrary store.
    pub fn with_store(config: config::Config, store: Arc<dyn Store>, cache: cache::CacheService) -> Arc<Self> {
        let shows = ShowService::new(store.clone());
        let bookings = BookingService::new(store, config.booking);
        Arc::new(Self { config, cache, shows, bookings })
    }
}
