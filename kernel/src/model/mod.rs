pub mod auth;
pub mod booking;
pub mod conversation;
pub mod id;
pub mod order;
pub mod payment;
pub mod role;
