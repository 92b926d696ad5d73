//! Cart types for the fulfillment system.
//!
//! A cart is the customer's mutable pre-order selection. It is owned by
//! exactly one customer and stored keyed by that customer's id. All lines
//! must reference food items of a single restaurant; the owning restaurant is
//! tracked on the cart itself so the invariant can be checked without
//! chasing catalog records.

use crate::ids::{CustomerId, FoodItemId, RestaurantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a cart: a food item and how many of it the customer wants.
///
/// A stored line always has quantity of at least one; setting a quantity to
/// zero or below removes the line instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
	/// The catalog item this line refers to.
	pub food_item_id: FoodItemId,
	/// Number of units. Always at least one.
	pub quantity: u32,
}

/// A customer's active cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
	/// The customer who owns this cart.
	pub customer_id: CustomerId,
	/// The restaurant all current lines belong to. `None` exactly when the
	/// cart is empty; set when the first line is added and cleared when the
	/// last line goes away.
	pub restaurant_id: Option<RestaurantId>,
	/// The lines, in insertion order, keyed uniquely by food item.
	pub items: Vec<CartItem>,
	/// Timestamp of the last mutation.
	pub updated_at: DateTime<Utc>,
}

impl Cart {
	/// Creates an empty cart for the given customer.
	pub fn empty(customer_id: CustomerId) -> Self {
		Self {
			customer_id,
			restaurant_id: None,
			items: Vec::new(),
			updated_at: Utc::now(),
		}
	}

	/// Returns true when the cart holds no lines.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Finds the line for a food item, if present.
	pub fn line(&self, food_item_id: FoodItemId) -> Option<&CartItem> {
		self.items.iter().find(|i| i.food_item_id == food_item_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_cart_has_no_restaurant() {
		let cart = Cart::empty(CustomerId::new());
		assert!(cart.is_empty());
		assert!(cart.restaurant_id.is_none());
	}

	#[test]
	fn line_lookup_by_food_item() {
		let food = FoodItemId::new();
		let mut cart = Cart::empty(CustomerId::new());
		cart.items.push(CartItem {
			food_item_id: food,
			quantity: 2,
		});
		assert_eq!(cart.line(food).unwrap().quantity, 2);
		assert!(cart.line(FoodItemId::new()).is_none());
	}
}
