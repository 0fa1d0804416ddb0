pub mod booking;
pub mod conversation;
pub mod payment;
