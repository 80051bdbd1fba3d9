//! Domain data types

pub mod availability;
pub mod booking;
pub mod notification;
pub mod slot;
pub mod status;
pub mod wallet;

pub use availability::{AvailabilityRule, Frequency, NewAvailabilityRule};
pub use booking::{Booking, BookingRequest, CancelTarget};
pub use notification::{NewNotification, NotificationKind};
pub use slot::{Slot, SlotPatch};
pub use status::AppointmentStatus;
pub use wallet::{TransactionDirection, Wallet, WalletTransaction};
