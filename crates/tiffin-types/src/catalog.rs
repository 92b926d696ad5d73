//! Catalog types: the food items restaurants sell.
//!
//! The catalog is the source of current names and prices. Orders snapshot
//! these fields at placement; a later catalog edit changes future carts and
//! orders only.

use crate::ids::{FoodItemId, RestaurantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dietary category of a food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodCategory {
	Veg,
	NonVeg,
}

impl fmt::Display for FoodCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			FoodCategory::Veg => "VEG",
			FoodCategory::NonVeg => "NON_VEG",
		};
		write!(f, "{}", s)
	}
}

/// One item on a restaurant's menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
	/// Unique item identifier.
	pub id: FoodItemId,
	/// The restaurant that owns and sells this item.
	pub restaurant_id: RestaurantId,
	/// Current display name.
	pub name: String,
	/// Current description shown to customers.
	pub description: String,
	/// Current unit price.
	pub price: Decimal,
	/// Dietary category.
	pub category: FoodCategory,
	/// Optional image for menu display.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
}

/// Fields needed to create or replace a menu item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemSpec {
	pub name: String,
	pub description: String,
	pub price: Decimal,
	pub category: FoodCategory,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn category_spellings_are_pinned() {
		assert_eq!(
			serde_json::to_string(&FoodCategory::Veg).unwrap(),
			"\"VEG\""
		);
		assert_eq!(
			serde_json::to_string(&FoodCategory::NonVeg).unwrap(),
			"\"NON_VEG\""
		);
	}
}
