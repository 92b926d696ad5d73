//! Storage namespace definitions.
//!
//! Every stored entity lives under a fixed namespace; the composite key is
//! `"namespace:id"`. Using an enum instead of bare strings keeps call sites
//! typo-proof and gives one place to enumerate everything the store holds.

use std::fmt;
use std::str::FromStr;

/// Namespaces for stored entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Customer profiles, keyed by customer id.
	Customers,
	/// Restaurant profiles, keyed by restaurant id.
	Restaurants,
	/// Delivery agents, keyed by agent id.
	Agents,
	/// Menu items, keyed by food item id.
	FoodItems,
	/// Carts, keyed by the owning customer's id (one cart per customer).
	Carts,
	/// Orders, keyed by order id.
	Orders,
	/// Delivery assignments, keyed by order id (one assignment per order).
	Assignments,
}

impl StorageKey {
	/// Returns the namespace string used to build storage keys.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Customers => "customers",
			StorageKey::Restaurants => "restaurants",
			StorageKey::Agents => "agents",
			StorageKey::FoodItems => "food_items",
			StorageKey::Carts => "carts",
			StorageKey::Orders => "orders",
			StorageKey::Assignments => "assignments",
		}
	}

	/// Returns all namespaces.
	pub fn all() -> impl Iterator<Item = StorageKey> {
		[
			StorageKey::Customers,
			StorageKey::Restaurants,
			StorageKey::Agents,
			StorageKey::FoodItems,
			StorageKey::Carts,
			StorageKey::Orders,
			StorageKey::Assignments,
		]
		.into_iter()
	}
}

impl fmt::Display for StorageKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for StorageKey {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"customers" => Ok(StorageKey::Customers),
			"restaurants" => Ok(StorageKey::Restaurants),
			"agents" => Ok(StorageKey::Agents),
			"food_items" => Ok(StorageKey::FoodItems),
			"carts" => Ok(StorageKey::Carts),
			"orders" => Ok(StorageKey::Orders),
			"assignments" => Ok(StorageKey::Assignments),
			other => Err(format!("unknown storage namespace: {}", other)),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_through_from_str() {
		for key in StorageKey::all() {
			assert_eq!(key.as_str().parse::<StorageKey>().unwrap(), key);
		}
	}

	#[test]
	fn rejects_unknown_namespace() {
		assert!("payments".parse::<StorageKey>().is_err());
	}
}
