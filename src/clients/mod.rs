pub mod fcm;
pub mod health;
pub mod rbmq;
pub mod sender;
