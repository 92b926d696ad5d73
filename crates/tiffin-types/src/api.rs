//! Request and response types crossing the service boundary.
//!
//! Responses are assembled from entities plus explicit lookups (customer,
//! restaurant and agent names); they are plain data and never written back
//! to storage. Field names serialize in camelCase; the enum vocabulary keeps
//! its fixed SCREAMING_SNAKE_CASE spellings.

use crate::cart::Cart;
use crate::dispatch::{AvailabilityStatus, DeliveryAgent, DeliveryAssignment};
use crate::ids::{AgentId, CustomerId, FoodItemId, OrderId, RestaurantId};
use crate::order::{Order, OrderItem, OrderStatus, PaymentType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request to convert a customer's cart into an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
	/// Customer whose cart is being placed.
	pub customer_id: CustomerId,
	/// Where the order should be delivered.
	pub delivery_address: String,
	/// How the customer pays.
	pub payment_type: PaymentType,
}

/// One cart line enriched with the item's current catalog name and price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
	pub food_item_id: FoodItemId,
	/// Current catalog name (not a snapshot).
	pub name: String,
	/// Current catalog unit price (not a snapshot).
	pub price: Decimal,
	pub quantity: u32,
}

/// View of a customer's cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
	pub customer_id: CustomerId,
	/// Restaurant of the current lines; absent for an empty cart.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub restaurant_id: Option<RestaurantId>,
	pub items: Vec<CartLine>,
	/// Estimated value at current catalog prices. The authoritative amount
	/// is computed at placement time.
	pub total_value: Decimal,
}

impl CartResponse {
	/// Builds the view from a cart and its resolved lines.
	pub fn from_cart(cart: &Cart, items: Vec<CartLine>) -> Self {
		let total_value = items
			.iter()
			.map(|line| line.price * Decimal::from(line.quantity))
			.sum();
		Self {
			customer_id: cart.customer_id,
			restaurant_id: cart.restaurant_id,
			items,
			total_value,
		}
	}
}

/// View of a placed order, with names joined in for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
	pub order_id: OrderId,
	pub customer_id: CustomerId,
	pub customer_name: String,
	pub restaurant_id: RestaurantId,
	pub restaurant_name: String,
	pub status: OrderStatus,
	pub order_date: DateTime<Utc>,
	pub delivery_address: String,
	pub payment_type: PaymentType,
	pub total_amount: Decimal,
	/// The permanent item snapshots taken at placement.
	pub items: Vec<OrderItem>,
	/// Present once a delivery agent has been assigned.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivery_agent_id: Option<AgentId>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub delivery_agent_name: Option<String>,
}

impl OrderResponse {
	/// Builds the view from an order and the names resolved for it.
	pub fn from_order(
		order: &Order,
		customer_name: String,
		restaurant_name: String,
		agent: Option<(AgentId, String)>,
	) -> Self {
		let (delivery_agent_id, delivery_agent_name) = match agent {
			Some((id, name)) => (Some(id), Some(name)),
			None => (None, None),
		};
		Self {
			order_id: order.id,
			customer_id: order.customer_id,
			customer_name,
			restaurant_id: order.restaurant_id,
			restaurant_name,
			status: order.status,
			order_date: order.order_date,
			delivery_address: order.delivery_address.clone(),
			payment_type: order.payment_type,
			total_amount: order.total_amount,
			items: order.items.clone(),
			delivery_agent_id,
			delivery_agent_name,
		}
	}
}

/// View of a delivery agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
	pub agent_id: AgentId,
	pub name: String,
	pub availability: AvailabilityStatus,
}

impl From<&DeliveryAgent> for AgentResponse {
	fn from(agent: &DeliveryAgent) -> Self {
		Self {
			agent_id: agent.id,
			name: agent.name.clone(),
			availability: agent.availability,
		}
	}
}

/// View of a delivery assignment, including the order's current status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
	pub order_id: OrderId,
	pub agent_id: AgentId,
	pub restaurant_id: RestaurantId,
	pub assigned_at: DateTime<Utc>,
	pub order_status: OrderStatus,
}

impl AssignmentResponse {
	/// Builds the view from an assignment and its order's current status.
	pub fn from_assignment(assignment: &DeliveryAssignment, order_status: OrderStatus) -> Self {
		Self {
			order_id: assignment.order_id,
			agent_id: assignment.agent_id,
			restaurant_id: assignment.restaurant_id,
			assigned_at: assignment.assigned_at,
			order_status,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cart_response_totals_current_prices() {
		let cart = Cart::empty(CustomerId::new());
		let items = vec![
			CartLine {
				food_item_id: FoodItemId::new(),
				name: "Idli".to_string(),
				price: Decimal::new(50, 0),
				quantity: 2,
			},
			CartLine {
				food_item_id: FoodItemId::new(),
				name: "Filter Coffee".to_string(),
				price: Decimal::new(30, 0),
				quantity: 1,
			},
		];
		let response = CartResponse::from_cart(&cart, items);
		assert_eq!(response.total_value, Decimal::new(130, 0));
	}

	#[test]
	fn order_response_serializes_camel_case() {
		let order = Order {
			id: OrderId::new(),
			customer_id: CustomerId::new(),
			restaurant_id: RestaurantId::new(),
			status: OrderStatus::Pending,
			order_date: Utc::now(),
			delivery_address: "12 MG Road".to_string(),
			payment_type: PaymentType::Upi,
			total_amount: Decimal::new(130, 0),
			items: vec![],
			assigned_agent: None,
			updated_at: Utc::now(),
		};
		let response =
			OrderResponse::from_order(&order, "Asha".to_string(), "Udupi Grand".to_string(), None);
		let json = serde_json::to_string(&response).unwrap();
		assert!(json.contains("\"orderId\""));
		assert!(json.contains("\"totalAmount\""));
		assert!(json.contains("\"PENDING\""));
		assert!(json.contains("\"UPI\""));
		assert!(!json.contains("deliveryAgentId"));
	}
}
