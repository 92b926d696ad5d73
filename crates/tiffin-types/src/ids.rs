//! Typed identifiers for the fulfillment domain.
//!
//! Every entity is addressed by an opaque UUID wrapped in its own newtype so
//! that a customer id can never be passed where an order id is expected.
//! Relations between entities are expressed through these ids rather than
//! object references; any navigation is an explicit repository lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error returned when parsing an identifier from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError(String);

impl fmt::Display for ParseIdError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "invalid identifier: {}", self.0)
	}
}

impl std::error::Error for ParseIdError {}

macro_rules! entity_id {
	($(#[$doc:meta])* $name:ident) => {
		$(#[$doc])*
		#[derive(
			Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Mints a fresh random identifier.
			pub fn new() -> Self {
				Self(Uuid::new_v4())
			}

			/// Wraps an existing UUID.
			pub fn from_uuid(uuid: Uuid) -> Self {
				Self(uuid)
			}
		}

		impl Default for $name {
			fn default() -> Self {
				Self::new()
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				self.0.fmt(f)
			}
		}

		impl FromStr for $name {
			type Err = ParseIdError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s)
					.map(Self)
					.map_err(|_| ParseIdError(s.to_string()))
			}
		}
	};
}

entity_id!(
	/// Identifies a customer.
	CustomerId
);
entity_id!(
	/// Identifies a restaurant.
	RestaurantId
);
entity_id!(
	/// Identifies a delivery agent.
	AgentId
);
entity_id!(
	/// Identifies a food item in a restaurant's menu.
	FoodItemId
);
entity_id!(
	/// Identifies a placed order.
	OrderId
);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_round_trip_through_display_and_parse() {
		let id = OrderId::new();
		let parsed: OrderId = id.to_string().parse().unwrap();
		assert_eq!(id, parsed);
	}

	#[test]
	fn parse_rejects_garbage() {
		assert!("not-a-uuid".parse::<CustomerId>().is_err());
	}

	#[test]
	fn serde_is_transparent() {
		let id = FoodItemId::new();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{}\"", id));
	}
}
