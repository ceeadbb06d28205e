//! GraphQL surface over the ad service and slot allocator.

pub mod resolvers;
pub mod schema;
pub mod server;
pub mod types;

pub use schema::{create_schema, AdSchema, AppContext};
