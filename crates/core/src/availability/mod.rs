//! Recurring availability: rule expansion and persistence

pub mod expander;
pub mod ports;
pub mod service;

pub use service::AvailabilityService;
