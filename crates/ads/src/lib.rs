//! Ad promotion subsystem: request/approval state machine, ServiceAd
//! lifecycle, external ads, payments, and performance analytics.

pub mod analytics;
pub mod service;
pub mod store;

pub use service::AdService;
pub use store::AdStore;
