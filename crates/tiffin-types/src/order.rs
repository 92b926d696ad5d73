//! Order types for the fulfillment system.
//!
//! An order is created exactly once from a cart snapshot and is immutable
//! afterwards except for its lifecycle status and the delivery-assignment
//! link. Item names and prices are copied out of the catalog at placement
//! time so later menu edits can never change what was sold.

use crate::ids::{AgentId, CustomerId, FoodItemId, OrderId, RestaurantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an order.
///
/// The serialized spelling of every variant is part of the public vocabulary
/// and must not change. Transitions between statuses are governed by the
/// role-keyed transition table in the core crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Initial status of every freshly placed order.
	Pending,
	/// The restaurant accepted the order and is preparing it.
	Preparing,
	/// Preparation finished; the order can be assigned and picked up.
	Prepared,
	/// A delivery agent (or the restaurant, handing over manually) has the order.
	PickedUp,
	/// The order is on its way to the customer.
	OutForDelivery,
	/// Terminal: the order reached the customer.
	Delivered,
	/// Terminal: the restaurant cancelled the order.
	Cancelled,
}

impl OrderStatus {
	/// All statuses, in lifecycle order.
	pub fn all() -> [OrderStatus; 7] {
		[
			OrderStatus::Pending,
			OrderStatus::Preparing,
			OrderStatus::Prepared,
			OrderStatus::PickedUp,
			OrderStatus::OutForDelivery,
			OrderStatus::Delivered,
			OrderStatus::Cancelled,
		]
	}

	/// Returns true for statuses no transition may leave.
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			OrderStatus::Pending => "PENDING",
			OrderStatus::Preparing => "PREPARING",
			OrderStatus::Prepared => "PREPARED",
			OrderStatus::PickedUp => "PICKED_UP",
			OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
			OrderStatus::Delivered => "DELIVERED",
			OrderStatus::Cancelled => "CANCELLED",
		};
		write!(f, "{}", s)
	}
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
	Card,
	CashOnDelivery,
	Upi,
}

impl fmt::Display for PaymentType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			PaymentType::Card => "CARD",
			PaymentType::CashOnDelivery => "CASH_ON_DELIVERY",
			PaymentType::Upi => "UPI",
		};
		write!(f, "{}", s)
	}
}

/// The capacity in which a status-changing request is made.
///
/// The transition table is keyed by this role: the same target status can be
/// legal for one role and illegal for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
	/// The restaurant that owns the order.
	Restaurant,
	/// The delivery agent assigned to the order.
	DeliveryAgent,
}

impl fmt::Display for ActorRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ActorRole::Restaurant => "RESTAURANT",
			ActorRole::DeliveryAgent => "DELIVERY_AGENT",
		};
		write!(f, "{}", s)
	}
}

/// One line of an order: the permanent snapshot of a cart line.
///
/// Name and unit price are captured from the catalog at placement time and
/// never updated, regardless of later menu changes or deletions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
	/// The catalog item this line was snapshotted from.
	pub food_item_id: FoodItemId,
	/// Item name at the moment of placement.
	pub name: String,
	/// Unit price at the moment of placement.
	pub price_per_item: Decimal,
	/// Number of units ordered. Always at least one.
	pub quantity: u32,
}

impl OrderItem {
	/// Price of the whole line (unit price times quantity).
	pub fn line_total(&self) -> Decimal {
		self.price_per_item * Decimal::from(self.quantity)
	}
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique order identifier.
	pub id: OrderId,
	/// Customer the order belongs to.
	pub customer_id: CustomerId,
	/// Restaurant the order was placed against. Derived from the cart items
	/// at creation; every item snapshot references this restaurant.
	pub restaurant_id: RestaurantId,
	/// Current lifecycle status.
	pub status: OrderStatus,
	/// Moment the order was placed.
	pub order_date: DateTime<Utc>,
	/// Where the order is to be delivered.
	pub delivery_address: String,
	/// Payment method chosen at placement.
	pub payment_type: PaymentType,
	/// Sum of all line totals, computed once at placement and never
	/// recomputed.
	pub total_amount: Decimal,
	/// Snapshotted lines, in cart order.
	pub items: Vec<OrderItem>,
	/// The assigned delivery agent, if any. Written in the same atomic
	/// batch that creates the delivery assignment.
	pub assigned_agent: Option<AgentId>,
	/// Timestamp of the last status or assignment change.
	pub updated_at: DateTime<Utc>,
}
