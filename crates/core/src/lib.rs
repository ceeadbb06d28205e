pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;
pub mod validate;

pub use config::AppConfig;
pub use error::{AdError, AdResult};
