use crate::model::conversation::CloseReason;
use shared::error::AppError;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    WaitingConfirmation,
    Accepted,
    Scheduled,
    Ongoing,
    Done,
    Cancelled,
    Refunded,
}

// 予約ステータスを動かすきっかけ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTransition {
    // 支払いが確認された
    PaymentConfirmed,
    // スタイリストが予約を承諾した
    Accept,
    // 支払期限を過ぎても支払いが pending のまま
    PaymentExpired,
    // 承諾済みかつ支払済みになり、会話が開かれる
    Schedule,
    // 予約枠の開始時刻になった
    Start,
    // 会話を閉じる（期限切れ・手動終了・返金）
    Close(CloseReason),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("予約ステータス {from} に対して {transition:?} は実行できません。")]
pub struct TransitionError {
    pub from: BookingStatus,
    pub transition: BookingTransition,
}

impl From<TransitionError> for AppError {
    fn from(value: TransitionError) -> Self {
        AppError::Conflict(value.to_string())
    }
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Refunded)
    }

    // 遷移グラフ上の位置。正しい遷移でこの値が減ることはない
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::WaitingConfirmation => 1,
            Self::Accepted => 2,
            Self::Scheduled => 3,
            Self::Ongoing => 4,
            Self::Done | Self::Cancelled | Self::Refunded => 5,
        }
    }

    pub fn apply(self, transition: BookingTransition) -> Result<BookingStatus, TransitionError> {
        if !transition.sources().contains(&self) {
            return Err(TransitionError {
                from: self,
                transition,
            });
        }
        // スタイリストが支払い前に承諾していた場合、支払確認でステータスは変わらない
        if transition == BookingTransition::PaymentConfirmed && self == Self::Accepted {
            return Ok(self);
        }
        Ok(transition.target())
    }
}

impl BookingTransition {
    pub fn sources(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Self::PaymentConfirmed => &[Pending, Accepted],
            Self::Accept => &[Pending, WaitingConfirmation],
            Self::PaymentExpired => &[Pending, Accepted, Scheduled],
            Self::Schedule => &[Accepted],
            Self::Start => &[Scheduled],
            Self::Close(CloseReason::Expired | CloseReason::Manual) => &[Scheduled, Ongoing],
            Self::Close(CloseReason::Refund) => {
                &[Pending, WaitingConfirmation, Accepted, Scheduled, Ongoing]
            }
        }
    }

    pub fn target(self) -> BookingStatus {
        match self {
            Self::PaymentConfirmed => BookingStatus::WaitingConfirmation,
            Self::Accept => BookingStatus::Accepted,
            Self::PaymentExpired => BookingStatus::Cancelled,
            Self::Schedule => BookingStatus::Scheduled,
            Self::Start => BookingStatus::Ongoing,
            Self::Close(CloseReason::Refund) => BookingStatus::Refunded,
            Self::Close(_) => BookingStatus::Done,
        }
    }

    // SQL の `status = ANY($n)` に渡す形
    pub fn source_names(self) -> Vec<String> {
        self.sources().iter().map(|s| s.to_string()).collect()
    }
}
