use anyhow::{Context, Result};
use std::{str::FromStr, time::Duration};

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub booking: BookingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: required("DATABASE_HOST")?,
            port: required("DATABASE_PORT")?.parse::<u16>()?,
            username: required("DATABASE_USERNAME")?,
            password: required("DATABASE_PASSWORD")?,
            database: required("DATABASE_NAME")?,
        };
        let redis = RedisConfig {
            host: required("REDIS_HOST")?,
            port: required("REDIS_PORT")?.parse::<u16>()?,
        };
        let server = ServerConfig {
            port: optional("SERVER_PORT", 8080)?,
        };
        let scheduler = SchedulerConfig {
            sweep_interval: Duration::from_secs(optional("SWEEP_INTERVAL_SECS", 60)?),
            record_timeout: Duration::from_secs(optional("SWEEP_RECORD_TIMEOUT_SECS", 10)?),
        };
        let booking = BookingConfig {
            payment_window_minutes: optional("PAYMENT_WINDOW_MINUTES", 30)?,
            conversation_window_minutes: optional("CONVERSATION_WINDOW_MINUTES", 30)?,
            utc_offset_hours: optional("BOOKING_UTC_OFFSET_HOURS", 7)?,
        };
        Ok(Self {
            database,
            redis,
            server,
            scheduler,
            booking,
        })
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("環境変数 {key} が設定されていません"))
}

fn optional<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .with_context(|| format!("環境変数 {key} の値が不正です: {v}")),
        Err(_) => Ok(default),
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub sweep_interval: Duration,
    // 1 レコードの処理にかけてよい最大時間
    pub record_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct BookingConfig {
    pub payment_window_minutes: i64,
    pub conversation_window_minutes: i64,
    pub utc_offset_hours: i32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            payment_window_minutes: 30,
            conversation_window_minutes: 30,
            utc_offset_hours: 7,
        }
    }
}
