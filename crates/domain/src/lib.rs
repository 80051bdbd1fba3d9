//! # Lexbook Domain
//!
//! Business domain types and models for Lexbook.
//!
//! This crate contains:
//! - Domain data types (AvailabilityRule, Slot, Booking, Wallet, etc.)
//! - Domain error types and Result definitions
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Lexbook crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use errors::*;
pub use types::*;
