use chrono::{DateTime, SubsecRound, Utc};
use shared::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};
use sqlx::{postgres::PgConnectOptions, PgPool};

pub mod model;

fn make_pg_connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .password(&cfg.password)
        .database(&cfg.database)
}

#[derive(Clone)]
pub struct ConnectionPool(PgPool);

impl ConnectionPool {
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }

    pub fn inner_ref(&self) -> &PgPool {
        &self.0
    }

    pub async fn begin(&self) -> AppResult<sqlx::Transaction<'_, sqlx::Postgres>> {
        self.0.begin().await.map_err(AppError::TransactionError)
    }
}

pub fn connect_database_with(cfg: &DatabaseConfig) -> ConnectionPool {
    ConnectionPool(PgPool::connect_lazy_with(make_pg_connect_options(cfg)))
}

// 時刻の列は TIMESTAMP(3)。書き込む前にミリ秒へ切り捨て、
// Rust 側の比較と SQL 側の比較が同じ結果になるようにする
pub fn to_column_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn column_precision_never_moves_an_instant_later() {
        let base = Utc.with_ymd_and_hms(2024, 5, 10, 3, 30, 0).unwrap();
        let at = base + Duration::nanoseconds(1_999_600);

        let truncated = to_column_precision(at);
        assert_eq!(truncated, base + Duration::milliseconds(1));
        assert!(truncated <= at);
        assert_eq!(to_column_precision(truncated), truncated);
    }
}
