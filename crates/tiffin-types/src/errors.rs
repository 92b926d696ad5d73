//! The shared error taxonomy returned at every operation boundary.
//!
//! Every fulfillment operation fails with exactly one of these variants.
//! Rejections leave all entities in their pre-call state; nothing inside the
//! core retries or swallows a failure. The `Conflict` and `Forbidden`
//! variants carry short fixed reason codes that callers can match on.

use crate::order::{ActorRole, OrderStatus};
use thiserror::Error;

/// Errors surfaced by the fulfillment core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
	/// A referenced entity does not exist.
	#[error("{entity} not found: {id}")]
	NotFound {
		/// What kind of entity was looked up ("customer", "order", ...).
		entity: &'static str,
		/// The identifier that failed to resolve.
		id: String,
	},
	/// The requested status change is not reachable from the current status
	/// for the acting role. Order and agent state are left untouched.
	#[error("invalid transition from {from} to {requested} for {actor}")]
	InvalidTransition {
		from: OrderStatus,
		requested: OrderStatus,
		actor: ActorRole,
	},
	/// The actor exists but is not authorized for the target entity.
	#[error("forbidden: {0}")]
	Forbidden(&'static str),
	/// A business rule rejected the operation.
	#[error("conflict: {0}")]
	Conflict(&'static str),
	/// An internal consistency check failed. Signals a bug rather than a
	/// legitimate business rejection.
	#[error("invariant violated: {0}")]
	Invariant(String),
	/// A persistence fault with no domain translation.
	#[error("storage fault: {0}")]
	Storage(String),
}

impl DomainError {
	/// A missing entity of the given kind.
	pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
		DomainError::NotFound {
			entity,
			id: id.to_string(),
		}
	}

	/// A failed internal consistency check.
	pub fn invariant(detail: impl Into<String>) -> Self {
		DomainError::Invariant(detail.into())
	}

	/// A persistence fault that could not be translated.
	pub fn storage(err: impl std::fmt::Display) -> Self {
		DomainError::Storage(err.to_string())
	}
}

/// Reason codes used by [`DomainError::Forbidden`] and
/// [`DomainError::Conflict`]. Collected here so services and tests spell
/// them identically.
pub mod reason {
	/// Restaurant acting on an order it does not own.
	pub const NOT_OWNER: &str = "not-owner";
	/// Agent acting on an order not assigned to it.
	pub const NOT_ASSIGNED: &str = "not-assigned";
	/// Cart line from a different restaurant than the cart's.
	pub const CROSS_RESTAURANT: &str = "cross-restaurant";
	/// Add requested with a non-positive quantity.
	pub const INVALID_QUANTITY: &str = "invalid-quantity";
	/// Placement attempted on a cart with no lines.
	pub const EMPTY_CART: &str = "empty-cart";
	/// Assignment attempted while the order is not PREPARED.
	pub const NOT_READY: &str = "not-ready";
	/// Assignment attempted on an already-assigned order.
	pub const ALREADY_ASSIGNED: &str = "already-assigned";
	/// Assignment attempted with an agent that is not AVAILABLE.
	pub const AGENT_UNAVAILABLE: &str = "agent-unavailable";
	/// Manual AVAILABLE toggle while an active assignment exists.
	pub const ACTIVE_DELIVERY: &str = "active-delivery";
	/// Manual IN_DELIVERY toggle without an active assignment.
	pub const NO_ACTIVE_ASSIGNMENT: &str = "no-active-assignment";
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn not_found_names_entity_and_id() {
		let err = DomainError::not_found("order", "abc");
		assert_eq!(err.to_string(), "order not found: abc");
	}

	#[test]
	fn invalid_transition_names_all_parts() {
		let err = DomainError::InvalidTransition {
			from: OrderStatus::Pending,
			requested: OrderStatus::Delivered,
			actor: ActorRole::Restaurant,
		};
		assert_eq!(
			err.to_string(),
			"invalid transition from PENDING to DELIVERED for RESTAURANT"
		);
	}

	#[test]
	fn conflict_carries_reason_code() {
		let err = DomainError::Conflict(reason::EMPTY_CART);
		assert_eq!(err.to_string(), "conflict: empty-cart");
	}
}
