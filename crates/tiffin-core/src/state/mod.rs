//! Order lifecycle state management.

pub mod lifecycle;
pub mod machine;

pub use lifecycle::{AgentEffect, OrderLifecycle};
pub use machine::StatusMachine;
