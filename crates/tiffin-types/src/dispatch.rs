//! Delivery agent and assignment types.
//!
//! An assignment binds one order to one delivery agent, created once while
//! the order is PREPARED and never reassigned. Assignments are stored keyed
//! by order id, which makes at-most-one-assignment-per-order structural
//! rather than a checked rule.

use crate::ids::{AgentId, OrderId, RestaurantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a delivery agent can take new work.
///
/// AVAILABLE is only legal while the agent has no assignment on a
/// non-terminal order; the dispatch service enforces the coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
	/// Free to be assigned a new order.
	Available,
	/// Currently carrying out a delivery.
	InDelivery,
	/// Not working; never auto-assigned.
	Offline,
}

impl fmt::Display for AvailabilityStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AvailabilityStatus::Available => "AVAILABLE",
			AvailabilityStatus::InDelivery => "IN_DELIVERY",
			AvailabilityStatus::Offline => "OFFLINE",
		};
		write!(f, "{}", s)
	}
}

/// A registered delivery agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAgent {
	/// Unique agent identifier.
	pub id: AgentId,
	/// Display name.
	pub name: String,
	/// Contact email.
	pub email: String,
	/// Contact phone number.
	pub phone: String,
	/// Current availability. Mutated by pickup/delivery side effects, by
	/// assignment, and by manual toggles.
	pub availability: AvailabilityStatus,
}

/// The binding of one order to one delivery agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAssignment {
	/// The assigned order. Also the storage key of the assignment.
	pub order_id: OrderId,
	/// The agent carrying the order.
	pub agent_id: AgentId,
	/// The restaurant the order was placed against.
	pub restaurant_id: RestaurantId,
	/// Moment the assignment was created.
	pub assigned_at: DateTime<Utc>,
}

/// Fields needed to register a delivery agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
	pub name: String,
	pub email: String,
	pub phone: String,
}
