use crate::cache::CacheService;
use crate::models::ShowSeat;
use redis::AsyncCommands;
use tracing::{debug, warn};

// Счётчик поколений карты мест; растёт при каждой инвалидации
fn generation_key(show_id: i64) -> String {
    format!("show:{}:seats:gen", show_id)
}

// Карта мест хранится под ключом своего поколения
fn seat_map_key(show_id: i64, generation: u64) -> String {
    format!("show:{}:seats:{}", show_id, generation)
}

impl CacheService {
    /// Текущее поколение карты мест. Читать до загрузки мест из базы:
    /// запись, начатая до инвалидации, попадёт в уже мёртвое поколение.
    pub async fn seat_generation(&self, show_id: i64) -> Option<u64> {
        let redis = self.redis.as_ref()?;
        let mut conn = redis.conn.clone();

        let generation: redis::RedisResult<Option<u64>> = conn.get(generation_key(show_id)).await;
        match generation {
            Ok(generation) => Some(generation.unwrap_or(0)),
            Err(e) => {
                warn!("seat cache generation read failed for show {}: {:?}", show_id, e);
                None
            }
        }
    }

    pub async fn get_seat_map(&self, show_id: i64, generation: u64) -> Option<Vec<ShowSeat>> {
        let redis = self.redis.as_ref()?;
        let mut conn = redis.conn.clone();

        let data: Option<String> = match conn.get(seat_map_key(show_id, generation)).await {
            Ok(data) => data,
            Err(e) => {
                warn!("seat cache read failed for show {}: {:?}", show_id, e);
                return None;
            }
        };

        // Битый кеш просто игнорируем
        data.and_then(|json| serde_json::from_str(&json).ok())
    }

    pub async fn put_seat_map(&self, show_id: i64, generation: u64, seats: &[ShowSeat]) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        let data = match serde_json::to_string(seats) {
            Ok(data) => data,
            Err(e) => {
                warn!("seat map for show {} not serializable: {:?}", show_id, e);
                return;
            }
        };
        let mut conn = redis.conn.clone();
        let result: redis::RedisResult<()> = conn
            .set_ex(seat_map_key(show_id, generation), data, self.seat_map_ttl_secs)
            .await;
        if let Err(e) = result {
            warn!("seat cache write failed for show {}: {:?}", show_id, e);
        }
    }

    // Вызывается после каждого коммита, меняющего места. Старое поколение
    // доживает до TTL, но его уже никто не читает.
    pub async fn invalidate_seats(&self, show_id: i64) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        let mut conn = redis.conn.clone();
        let result: redis::RedisResult<u64> = conn.incr(generation_key(show_id), 1).await;
        match result {
            Ok(generation) => debug!("Seats cache for show {} moved to generation {}", show_id, generation),
            Err(e) => warn!("seat cache invalidation failed for show {}: {:?}", show_id, e),
        }
    }
}
