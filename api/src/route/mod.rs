pub mod booking;
pub mod conversation;
pub mod health;
pub mod order;
pub mod v1;
