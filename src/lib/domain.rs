//! Domain logic, independent of how configuration arrives or mail leaves

pub mod notifications;
