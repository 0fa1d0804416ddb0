use chrono::{DateTime, Duration, NaiveDate, Utc};
use garde::Validate;
use kernel::model::{
    booking::{
        event::CreateBooking,
        generate_reference_number,
        slot::{utc_offset, BookingSlot},
        Booking, BookingStylist, BOOKING_NUMBER_PREFIX,
    },
    conversation::ConversationClosed,
    id::{BookingId, ConversationId, StylistId, UserId},
    payment::{payment_deadline, transfer_amount},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::{
    config::BookingConfig,
    error::{AppError, AppResult},
};

use super::payment::PaymentResponse;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[garde(skip)]
    pub stylist_id: StylistId,
    #[garde(skip)]
    pub booking_date: NaiveDate,
    // "HH:MM" または "HH:MM:SS"
    #[garde(length(min = 5, max = 8))]
    pub booking_time: String,
    #[garde(range(min = 1))]
    pub amount: i64,
    #[garde(length(min = 1, max = 64))]
    pub provider: Option<String>,
}

impl CreateBookingRequest {
    pub fn into_event<R: Rng + ?Sized>(
        self,
        customer_id: UserId,
        config: &BookingConfig,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> AppResult<CreateBooking> {
        let CreateBookingRequest {
            stylist_id,
            booking_date,
            booking_time,
            amount,
            provider,
        } = self;

        let slot = BookingSlot::parse(booking_date, &booking_time)?;
        let scheduled_at = slot.starts_at(utc_offset(config.utc_offset_hours)?);
        if scheduled_at <= now {
            return Err(AppError::UnprocessableEntity(format!(
                "予約日時 {booking_date} {booking_time} はすでに過ぎています。"
            )));
        }

        Ok(CreateBooking::new(
            generate_reference_number(BOOKING_NUMBER_PREFIX, now, rng),
            customer_id,
            stylist_id,
            slot,
            scheduled_at,
            amount,
            transfer_amount(amount, rng),
            provider,
            payment_deadline(now, Duration::minutes(config.payment_window_minutes)),
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStylistResponse {
    pub stylist_id: StylistId,
    pub user_id: UserId,
    pub brand_name: Option<String>,
}

impl From<BookingStylist> for BookingStylistResponse {
    fn from(value: BookingStylist) -> Self {
        let BookingStylist {
            stylist_id,
            user_id,
            brand_name,
        } = value;
        Self {
            stylist_id,
            user_id,
            brand_name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub customer_id: UserId,
    pub stylist: BookingStylistResponse,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub is_reviewed: bool,
    pub payment: Option<PaymentResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(value: Booking) -> Self {
        let Booking {
            booking_id,
            booking_number,
            customer_id,
            stylist,
            booking_date,
            booking_time,
            scheduled_at,
            status,
            is_reviewed,
            payment,
            created_at,
        } = value;
        Self {
            booking_id,
            booking_number,
            customer_id,
            stylist: stylist.into(),
            booking_date,
            booking_time: booking_time.format("%H:%M").to_string(),
            scheduled_at,
            status: status.to_string(),
            is_reviewed,
            payment: payment.map(PaymentResponse::from),
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub items: Vec<BookingResponse>,
}

impl From<Vec<Booking>> for BookingsResponse {
    fn from(value: Vec<Booking>) -> Self {
        Self {
            items: value.into_iter().map(BookingResponse::from).collect(),
        }
    }
}

// 予約終了・返金の結果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingClosedResponse {
    pub booking_id: BookingId,
    pub conversation_id: Option<ConversationId>,
    pub status: String,
    pub credited_amount: Option<i64>,
}

impl From<ConversationClosed> for BookingClosedResponse {
    fn from(value: ConversationClosed) -> Self {
        let ConversationClosed {
            booking_id,
            conversation_id,
            booking_status,
            credited_amount,
        } = value;
        Self {
            booking_id,
            conversation_id,
            status: booking_status.to_string(),
            credited_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    fn request(time: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            stylist_id: StylistId::new(1),
            booking_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            booking_time: time.into(),
            amount: 150_000,
            provider: Some("bank_transfer".into()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 9, 0, 0, 0).unwrap()
    }

    #[test]
    fn builds_pending_booking_event() {
        let mut rng = StdRng::seed_from_u64(1);
        let event = request("10:00")
            .into_event(UserId::new(7), &BookingConfig::default(), now(), &mut rng)
            .unwrap();

        assert!(event.booking_number.starts_with("STLST"));
        assert_eq!(event.customer_id, UserId::new(7));
        assert_eq!(
            event.scheduled_at,
            Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap()
        );
        assert_eq!(event.payment_deadline, now() + Duration::minutes(30));
        assert!((150_000..151_000).contains(&event.transfer_amount));
    }

    #[rstest]
    #[case("9am")]
    #[case("25:00")]
    fn rejects_unparseable_time(#[case] time: &str) {
        let mut rng = StdRng::seed_from_u64(1);
        let res = request(time).into_event(UserId::new(7), &BookingConfig::default(), now(), &mut rng);
        assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));
    }

    #[test]
    fn rejects_slot_in_the_past() {
        let mut rng = StdRng::seed_from_u64(1);
        let late = Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap();
        let res = request("10:00").into_event(UserId::new(7), &BookingConfig::default(), late, &mut rng);
        assert!(matches!(res, Err(AppError::UnprocessableEntity(_))));
    }

    #[rstest]
    #[case("10:00", 150_000, None, true)]
    #[case("10:00", 0, None, false)]
    #[case("1", 150_000, None, false)]
    #[case("10:00", 150_000, Some(""), false)]
    fn validates_request(
        #[case] time: &str,
        #[case] amount: i64,
        #[case] provider: Option<&str>,
        #[case] valid: bool,
    ) {
        let mut req = request(time);
        req.amount = amount;
        req.provider = provider.map(String::from);
        assert_eq!(req.validate(&()).is_ok(), valid);
    }
}
