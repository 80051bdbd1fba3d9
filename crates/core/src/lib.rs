//! # Lexbook Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The slot expander (recurrence -> concrete slots)
//! - Port/adapter interfaces (traits)
//! - The availability, booking and sweeper services
//!
//! ## Architecture Principles
//! - Only depends on `lexbook-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod availability;
pub mod booking;
pub mod clock;
pub mod sweeper;
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use availability::expander::expand;
pub use availability::ports::RuleRepository;
pub use availability::AvailabilityService;
pub use booking::ports::{BookingRepository, NotificationSender, SlotRepository, WalletLedger};
pub use booking::BookingService;
pub use clock::Clock;
pub use sweeper::{SweepReport, SweeperService};
