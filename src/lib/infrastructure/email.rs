//! Email adapters

pub mod parameters;
pub mod smtp;
