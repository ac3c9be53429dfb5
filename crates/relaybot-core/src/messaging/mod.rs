//! Messenger-facing model and port (Telegram today).

pub mod port;
pub mod throttled;
pub mod types;
