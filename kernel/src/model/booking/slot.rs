use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use shared::error::AppError;

// 予約日 + 予約時刻（現地時刻）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl BookingSlot {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    // "HH:MM" または "HH:MM:SS"
    pub fn parse(date: NaiveDate, time: &str) -> Result<Self, AppError> {
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|_| {
                AppError::UnprocessableEntity(format!("予約時刻の形式が不正です: {time}"))
            })?;
        Ok(Self { date, time })
    }

    // 固定オフセットの現地時刻を UTC の絶対時刻に変換する
    // 予約作成時に一度だけ計算し、bookings.scheduled_at に保存する
    pub fn starts_at(&self, offset: FixedOffset) -> DateTime<Utc> {
        let local = NaiveDateTime::new(self.date, self.time);
        let utc = local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, Utc)
    }
}

pub fn utc_offset(hours: i32) -> Result<FixedOffset, AppError> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| AppError::ConversionEntityError(format!("UTC オフセットが不正です: {hours}")))
}
