//! Adapters: configuration, logging and SMTP delivery

pub mod aliases;
pub mod email;
pub mod logging;
pub mod secrets;
pub mod version;
