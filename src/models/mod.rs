pub mod dispatch;
pub mod fcm;
pub mod health;
pub mod message;
pub mod retry;
pub mod topology;
pub mod validation;
