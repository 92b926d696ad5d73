//! Core orchestration for the tiffin order-fulfillment system.
//!
//! This crate holds the two pieces that sit above the individual services:
//! the role-keyed order lifecycle (the transition table plus the machine
//! that applies transitions to stored orders) and the engine builder that
//! assembles storage, locks, and all fulfillment services from a parsed
//! configuration.

pub mod engine;
pub mod state;

pub use engine::{EngineBuilder, EngineError, FulfillmentEngine};
pub use state::{AgentEffect, OrderLifecycle, StatusMachine};
