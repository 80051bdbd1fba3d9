//! Booking engine and the postpone/cancel workflow

pub mod ports;
pub mod service;

pub use service::BookingService;
