//! Customer and restaurant profiles.
//!
//! Profiles carry the basic identity fields the fulfillment core needs for
//! authorization and response assembly. Credential issuance and
//! authentication live outside this system; nothing here stores secrets.

use crate::ids::{CustomerId, RestaurantId};
use serde::{Deserialize, Serialize};

/// A registered customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
	/// Unique customer identifier.
	pub id: CustomerId,
	/// Display name.
	pub name: String,
	/// Contact email.
	pub email: String,
	/// Contact phone number.
	pub phone: String,
	/// Default delivery address.
	pub address: String,
}

/// A registered restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
	/// Unique restaurant identifier.
	pub id: RestaurantId,
	/// Display name.
	pub name: String,
	/// Contact email.
	pub email: String,
	/// Contact phone number.
	pub phone: String,
	/// Street address of the restaurant.
	pub address: String,
}

/// Fields needed to register a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
	pub name: String,
	pub email: String,
	pub phone: String,
	pub address: String,
}

/// Fields needed to register a restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantProfile {
	pub name: String,
	pub email: String,
	pub phone: String,
	pub address: String,
}
