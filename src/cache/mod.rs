use crate::redis_client::RedisClient;
use tracing::warn;

pub mod seats;

/// Read-through cache for show seat maps. Without redis every call is a
/// no-op and readers go straight to the store.
#[derive(Clone)]
pub struct CacheService {
    redis: Option<RedisClient>,
    seat_map_ttl_secs: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, seat_map_ttl_secs: u64) -> Self {
        Self { redis: Some(redis), seat_map_ttl_secs }
    }

    pub fn disabled() -> Self {
        Self { redis: None, seat_map_ttl_secs: 0 }
    }

    /// Connects when a URL is configured; a failed connection disables the cache.
    pub async fn connect(url: Option<&str>, seat_map_ttl_secs: u64) -> Self {
        let Some(url) = url else {
            return Self::disabled();
        };
        match RedisClient::new(url).await {
            Ok(redis) => Self::new(redis, seat_map_ttl_secs),
            Err(e) => {
                warn!("Redis unavailable, seat cache disabled: {:?}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }
}
