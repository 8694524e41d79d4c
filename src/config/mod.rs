use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub booking: BookingConfig,
}

// Настройки приложения
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

// Формат логов: человекочитаемый или JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

// Настройки базы данных
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_secs: u64,
}

// Redis опционален: без REDIS_URL кеш карты мест выключен
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub seat_map_ttl_secs: u64,
}

// Настройки JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

// Бизнес-настройки бронирования
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingConfig {
    /// Отменять подтверждённую бронь, у которой при изменении убрали последнее место
    pub cancel_empty_bookings: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Собирает конфигурацию из произвольного источника ключей (для тестов)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            app: AppConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parse("PORT", or_default("PORT", "8000"))?,
                environment: or_default("ENVIRONMENT", "development"),
                rust_log: or_default("RUST_LOG", "cinema_booking=debug,tower_http=debug"),
                log_format: parse("LOG_FORMAT", or_default("LOG_FORMAT", "pretty"))?,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                pool_size: parse("DB_POOL_SIZE", or_default("DB_POOL_SIZE", "20"))?,
                acquire_timeout_secs: parse(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    or_default("DB_ACQUIRE_TIMEOUT_SECS", "5"),
                )?,
            },
            redis: RedisConfig {
                url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
                seat_map_ttl_secs: parse(
                    "SEAT_CACHE_TTL_SECS",
                    or_default("SEAT_CACHE_TTL_SECS", "60"),
                )?,
            },
            jwt: JwtConfig {
                secret: lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            },
            booking: BookingConfig {
                cancel_empty_bookings: parse(
                    "CANCEL_EMPTY_BOOKINGS",
                    or_default("CANCEL_EMPTY_BOOKINGS", "false"),
                )?,
            },
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.app.port, 8000);
        assert_eq!(config.app.log_format, LogFormat::Pretty);
        assert_eq!(config.database.pool_size, 20);
        assert!(config.redis.url.is_none());
        assert!(!config.booking.cancel_empty_bookings);
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn invalid_port_is_reported_with_its_value() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();

        match err {
            ConfigError::Invalid { key, value } => {
                assert_eq!(key, "PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
            ("LOG_FORMAT", "JSON"),
            ("REDIS_URL", "redis://127.0.0.1/"),
            ("CANCEL_EMPTY_BOOKINGS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.app.log_format, LogFormat::Json);
        assert_eq!(config.redis.url.as_deref(), Some("redis://127.0.0.1/"));
        assert!(config.booking.cancel_empty_bookings);
    }

    #[test]
    fn token_lifetime_is_not_read() {
        // Сервис только проверяет токены, срок жизни задаёт выпускающий
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/cinema"),
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRES_IN_HOURS", "forever"),
        ]))
        .unwrap();

        assert_eq!(config.jwt.secret, "secret");
    }
}
