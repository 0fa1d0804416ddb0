use shared::error::{AppError, AppResult};
use std::str::FromStr;

pub mod booking;
pub mod conversation;
pub mod order;
pub mod payment;

// TEXT 列に保存したステータス文字列を enum に戻す
pub(crate) fn parse_status<T: FromStr>(value: &str, column: &str) -> AppResult<T> {
    value
        .parse::<T>()
        .map_err(|_| AppError::ConversionEntityError(format!("{column} の値が不正です: {value}")))
}
