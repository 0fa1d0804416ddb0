use crate::model::{
    auth::Identity,
    id::{BookingId, StylistId, UserId},
    payment::Payment,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rand::Rng;

pub mod event;
pub mod slot;
pub mod status;

use status::BookingStatus;

pub const BOOKING_NUMBER_PREFIX: &str = "STLST";

#[derive(Debug)]
pub struct Booking {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub customer_id: UserId,
    pub stylist: BookingStylist,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub is_reviewed: bool,
    pub payment: Option<Payment>,
    pub created_at: DateTime<Utc>,
}

// 利用者が予約に対して行う操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    View,
    ConfirmPayment,
    Accept,
    End,
    Refund,
}

impl Booking {
    // 予約の当事者（顧客またはスタイリスト）かどうか
    pub fn involves(&self, user_id: UserId) -> bool {
        self.customer_id == user_id || self.stylist.user_id == user_id
    }

    pub fn permits(&self, identity: &Identity, action: BookingAction) -> bool {
        let is_customer = self.customer_id == identity.user_id;
        let is_stylist = self.stylist.user_id == identity.user_id;
        match action {
            BookingAction::View | BookingAction::End => {
                identity.is_admin() || self.involves(identity.user_id)
            }
            BookingAction::ConfirmPayment => identity.is_admin(),
            // 承諾できるのは担当スタイリスト本人だけ
            BookingAction::Accept => is_stylist,
            BookingAction::Refund => identity.is_admin() || is_customer,
        }
    }
}

#[derive(Debug)]
pub struct BookingStylist {
    pub stylist_id: StylistId,
    pub user_id: UserId,
    pub brand_name: Option<String>,
}

// 人が読むための予約番号・注文番号
// 例: STLST17153216005821 = 接頭辞 + UNIX 秒 + 4 桁の乱数
pub fn generate_reference_number<R: Rng + ?Sized>(
    prefix: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> String {
    let random_part: u16 = rng.gen_range(1000..10000);
    format!("{prefix}{}{random_part}", now.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    #[test]
    fn reference_number_layout() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let number = generate_reference_number(BOOKING_NUMBER_PREFIX, now, &mut rng);

        let rest = number.strip_prefix("STLST").unwrap();
        let (ts, random) = rest.split_at(rest.len() - 4);
        assert_eq!(ts, now.timestamp().to_string());
        let random: u16 = random.parse().unwrap();
        assert!((1000..10000).contains(&random));
    }

    fn booking() -> Booking {
        let at = Utc.with_ymd_and_hms(2024, 5, 10, 3, 0, 0).unwrap();
        Booking {
            booking_id: BookingId::new(1),
            booking_number: "STLST17153100001234".into(),
            customer_id: UserId::new(1),
            stylist: BookingStylist {
                stylist_id: StylistId::new(1),
                user_id: UserId::new(2),
                brand_name: None,
            },
            booking_date: at.date_naive(),
            booking_time: at.time(),
            scheduled_at: at,
            status: BookingStatus::Pending,
            is_reviewed: false,
            payment: None,
            created_at: at,
        }
    }

    #[rstest]
    #[case(1, Role::Customer, BookingAction::View, true)]
    #[case(2, Role::Stylist, BookingAction::View, true)]
    #[case(9, Role::Customer, BookingAction::View, false)]
    #[case(9, Role::Admin, BookingAction::View, true)]
    #[case(1, Role::Customer, BookingAction::ConfirmPayment, false)]
    #[case(9, Role::Admin, BookingAction::ConfirmPayment, true)]
    #[case(2, Role::Stylist, BookingAction::Accept, true)]
    #[case(1, Role::Customer, BookingAction::Accept, false)]
    #[case(9, Role::Admin, BookingAction::Accept, false)]
    #[case(2, Role::Stylist, BookingAction::End, true)]
    #[case(1, Role::Customer, BookingAction::Refund, true)]
    #[case(2, Role::Stylist, BookingAction::Refund, false)]
    #[case(9, Role::Admin, BookingAction::Refund, true)]
    fn booking_permissions(
        #[case] user_id: i64,
        #[case] role: Role,
        #[case] action: BookingAction,
        #[case] expected: bool,
    ) {
        let identity = Identity {
            user_id: UserId::new(user_id),
            role,
        };
        assert_eq!(booking().permits(&identity, action), expected);
    }
}
