pub mod booking;
pub mod conversation;
pub mod order;
pub mod payment;
