//! Time-slot allocation and the cron-style lifecycle scans.

pub mod jobs;
pub mod slots;

pub use jobs::{spawn_scans, AdScans, SingleFlight};
pub use slots::{SlotAllocator, TimeSlotAvailability};
