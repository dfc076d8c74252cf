pub mod channel;
pub mod context;
pub mod message;
pub mod reply;
