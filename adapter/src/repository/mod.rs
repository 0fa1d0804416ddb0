pub mod auth;
pub mod booking;
pub mod conversation;
pub mod health;
pub mod order;
pub mod payment;
