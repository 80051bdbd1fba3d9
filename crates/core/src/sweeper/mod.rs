//! Expiration sweeper

pub mod service;

pub use service::{SweepReport, SweeperService};
