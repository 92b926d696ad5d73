//! Common types for the tiffin order-fulfillment system.
//!
//! This crate defines the shared vocabulary of the workspace: typed
//! identifiers, domain entities, the lifecycle and payment enumerations with
//! their pinned serialized spellings, the error taxonomy every operation
//! returns, and the storage/validation plumbing types the other crates build
//! on.

/// Request and response types crossing the service boundary.
pub mod api;
/// Cart and cart-line types.
pub mod cart;
/// Catalog types: food items and their categories.
pub mod catalog;
/// Delivery agent, availability, and assignment types.
pub mod dispatch;
/// The shared error taxonomy.
pub mod errors;
/// Typed entity identifiers.
pub mod ids;
/// Order, order-item, status, payment, and actor-role types.
pub mod order;
/// Customer and restaurant profile types.
pub mod profile;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage namespace definitions.
pub mod storage;
/// Validation framework for TOML backend configuration.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use cart::*;
pub use catalog::*;
pub use dispatch::*;
pub use errors::*;
pub use ids::*;
pub use order::*;
pub use profile::*;
pub use registry::*;
pub use storage::*;
pub use validation::*;
