//! A scripted fulfillment round.
//!
//! Seeds a customer, a restaurant with a small menu, and a delivery agent,
//! then walks one order from cart to delivered against the configured
//! backend. Each run seeds fresh entities, so repeated runs against a file
//! backend accumulate history rather than colliding.

use rust_decimal::Decimal;
use tiffin_core::FulfillmentEngine;
use tiffin_types::{
	AgentProfile, AvailabilityStatus, CustomerProfile, DomainError, FoodCategory, FoodItemSpec,
	OrderStatus, PaymentType, PlaceOrderRequest, RestaurantProfile,
};
use tracing::{info, warn};

/// Runs one end-to-end fulfillment round against the engine.
pub async fn run(engine: &FulfillmentEngine) -> Result<(), DomainError> {
	let directory = engine.directory();

	let customer = directory
		.create_customer(CustomerProfile {
			name: "Asha".to_string(),
			email: "asha@example.com".to_string(),
			phone: "9000000001".to_string(),
			address: "12 MG Road".to_string(),
		})
		.await?;
	let restaurant = directory
		.create_restaurant(RestaurantProfile {
			name: "Udupi Grand".to_string(),
			email: "udupi@example.com".to_string(),
			phone: "9000000002".to_string(),
			address: "4 Brigade Road".to_string(),
		})
		.await?;
	let idli = directory
		.add_food_item(
			restaurant.id,
			FoodItemSpec {
				name: "Idli".to_string(),
				description: "Steamed rice cakes with chutney".to_string(),
				price: Decimal::new(50, 0),
				category: FoodCategory::Veg,
				image_url: None,
			},
		)
		.await?;
	let coffee = directory
		.add_food_item(
			restaurant.id,
			FoodItemSpec {
				name: "Filter Coffee".to_string(),
				description: "South Indian filter coffee".to_string(),
				price: Decimal::new(30, 0),
				category: FoodCategory::Veg,
				image_url: None,
			},
		)
		.await?;
	let agent = directory
		.create_agent(AgentProfile {
			name: "Ravi".to_string(),
			email: "ravi@example.com".to_string(),
			phone: "9000000003".to_string(),
		})
		.await?;
	engine
		.dispatch()
		.update_availability(agent.id, AvailabilityStatus::Available)
		.await?;
	info!(
		customer = %customer.name,
		restaurant = %restaurant.name,
		agent = %agent.name,
		"Seeded demo data"
	);

	engine.carts().add_item(customer.id, idli.id, 2).await?;
	let cart = engine.carts().add_item(customer.id, coffee.id, 1).await?;
	info!(lines = cart.items.len(), total = %cart.total_value, "Filled cart");

	let order = engine
		.orders()
		.place_order(PlaceOrderRequest {
			customer_id: customer.id,
			delivery_address: customer.address.clone(),
			payment_type: PaymentType::Upi,
		})
		.await?;
	info!(
		order_id = %order.order_id,
		total = %order.total_amount,
		status = %order.status,
		"Placed order"
	);

	for status in [OrderStatus::Preparing, OrderStatus::Prepared] {
		let view = engine
			.lifecycle()
			.restaurant_update(restaurant.id, order.order_id, status)
			.await?;
		info!(order_id = %view.order_id, status = %view.status, "Restaurant updated order");
	}

	let assignment = engine
		.dispatch()
		.assign(restaurant.id, order.order_id, agent.id)
		.await?;
	info!(
		order_id = %assignment.order_id,
		agent_id = %assignment.agent_id,
		"Assigned delivery agent"
	);

	// While the delivery is live the agent cannot toggle itself AVAILABLE.
	match engine
		.dispatch()
		.update_availability(agent.id, AvailabilityStatus::Available)
		.await
	{
		Err(DomainError::Conflict(code)) => {
			info!(code, "Manual availability toggle rejected as expected");
		},
		Ok(_) => warn!("availability toggle unexpectedly succeeded mid-delivery"),
		Err(other) => return Err(other),
	}

	for status in [
		OrderStatus::PickedUp,
		OrderStatus::OutForDelivery,
		OrderStatus::Delivered,
	] {
		let view = engine
			.lifecycle()
			.agent_update(agent.id, order.order_id, status)
			.await?;
		info!(order_id = %view.order_id, status = %view.status, "Agent updated order");
	}

	let freed = directory.agent(agent.id).await?;
	info!(agent = %freed.name, availability = %freed.availability, "Delivery complete");

	Ok(())
}
