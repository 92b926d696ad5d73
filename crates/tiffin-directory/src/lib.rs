//! Identity directory for the tiffin fulfillment system.
//!
//! This crate registers and resolves the parties of the fulfillment flow:
//! customers, restaurants, delivery agents, and the menu catalog restaurants
//! sell from. Every other service resolves the ids it receives through this
//! directory before acting, so "referenced entity exists" checks live in one
//! place. The directory also assembles order views, joining current display
//! names onto the immutable order snapshots.

use std::sync::Arc;
use tiffin_storage::{StorageBatch, StorageError, StorageService};
use tiffin_types::{
	reason, AgentId, AgentProfile, AgentResponse, AvailabilityStatus, Cart, Customer, CustomerId,
	CustomerProfile, DeliveryAgent, DomainError, FoodItem, FoodItemId, FoodItemSpec, Order,
	OrderResponse, Restaurant, RestaurantId, RestaurantProfile, StorageKey,
};
use tracing::{debug, info};

/// Maps a failed entity read to the shared error vocabulary.
fn lookup_error(entity: &'static str, id: impl std::fmt::Display, err: StorageError) -> DomainError {
	match err {
		StorageError::NotFound => DomainError::not_found(entity, id),
		other => DomainError::Storage(other.to_string()),
	}
}

/// Registration and lookup for customers, restaurants, agents, and menus.
///
/// The directory owns the profile and catalog namespaces. It never touches
/// orders or assignments; it only reads them when assembling views.
pub struct DirectoryService {
	/// Persistent storage for all directory-owned entities.
	storage: Arc<StorageService>,
}

impl DirectoryService {
	/// Creates a new DirectoryService backed by the given storage.
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Registers a customer and provisions their (empty) cart in one commit.
	pub async fn create_customer(&self, profile: CustomerProfile) -> Result<Customer, DomainError> {
		let customer = Customer {
			id: CustomerId::new(),
			name: profile.name,
			email: profile.email,
			phone: profile.phone,
			address: profile.address,
		};
		let cart = Cart::empty(customer.id);

		let mut batch = StorageBatch::new();
		batch
			.put(
				StorageKey::Customers.as_str(),
				&customer.id.to_string(),
				&customer,
			)
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		batch
			.put(StorageKey::Carts.as_str(), &customer.id.to_string(), &cart)
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		self.storage
			.commit(batch)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		info!(customer_id = %customer.id, name = %customer.name, "Registered customer");
		Ok(customer)
	}

	/// Registers a restaurant.
	pub async fn create_restaurant(
		&self,
		profile: RestaurantProfile,
	) -> Result<Restaurant, DomainError> {
		let restaurant = Restaurant {
			id: RestaurantId::new(),
			name: profile.name,
			email: profile.email,
			phone: profile.phone,
			address: profile.address,
		};
		self.storage
			.store(
				StorageKey::Restaurants.as_str(),
				&restaurant.id.to_string(),
				&restaurant,
			)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		info!(restaurant_id = %restaurant.id, name = %restaurant.name, "Registered restaurant");
		Ok(restaurant)
	}

	/// Registers a delivery agent. Agents start OFFLINE and must toggle
	/// themselves AVAILABLE before they can take assignments.
	pub async fn create_agent(&self, profile: AgentProfile) -> Result<DeliveryAgent, DomainError> {
		let agent = DeliveryAgent {
			id: AgentId::new(),
			name: profile.name,
			email: profile.email,
			phone: profile.phone,
			availability: AvailabilityStatus::Offline,
		};
		self.storage
			.store(StorageKey::Agents.as_str(), &agent.id.to_string(), &agent)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		info!(agent_id = %agent.id, name = %agent.name, "Registered delivery agent");
		Ok(agent)
	}

	/// Looks up a customer by id.
	pub async fn customer(&self, id: CustomerId) -> Result<Customer, DomainError> {
		self.storage
			.retrieve(StorageKey::Customers.as_str(), &id.to_string())
			.await
			.map_err(|e| lookup_error("customer", id, e))
	}

	/// Looks up a restaurant by id.
	pub async fn restaurant(&self, id: RestaurantId) -> Result<Restaurant, DomainError> {
		self.storage
			.retrieve(StorageKey::Restaurants.as_str(), &id.to_string())
			.await
			.map_err(|e| lookup_error("restaurant", id, e))
	}

	/// Looks up a delivery agent by id.
	pub async fn agent(&self, id: AgentId) -> Result<DeliveryAgent, DomainError> {
		self.storage
			.retrieve(StorageKey::Agents.as_str(), &id.to_string())
			.await
			.map_err(|e| lookup_error("delivery agent", id, e))
	}

	/// Lists all registered delivery agents, sorted by name.
	pub async fn agents(&self) -> Result<Vec<AgentResponse>, DomainError> {
		let mut agents: Vec<DeliveryAgent> = self
			.storage
			.retrieve_all(StorageKey::Agents.as_str())
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		agents.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(agents.iter().map(AgentResponse::from).collect())
	}

	/// Lists delivery agents currently in the given availability state.
	pub async fn agents_by_availability(
		&self,
		availability: AvailabilityStatus,
	) -> Result<Vec<AgentResponse>, DomainError> {
		let mut agents = self.agents().await?;
		agents.retain(|agent| agent.availability == availability);
		Ok(agents)
	}

	/// Adds a food item to a restaurant's menu.
	pub async fn add_food_item(
		&self,
		restaurant_id: RestaurantId,
		spec: FoodItemSpec,
	) -> Result<FoodItem, DomainError> {
		// The owning restaurant must exist before it can sell anything.
		self.restaurant(restaurant_id).await?;

		let item = FoodItem {
			id: FoodItemId::new(),
			restaurant_id,
			name: spec.name,
			description: spec.description,
			price: spec.price,
			category: spec.category,
			image_url: spec.image_url,
		};
		self.storage
			.store(StorageKey::FoodItems.as_str(), &item.id.to_string(), &item)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		debug!(
			restaurant_id = %restaurant_id,
			food_item_id = %item.id,
			name = %item.name,
			"Added menu item"
		);
		Ok(item)
	}

	/// Looks up a food item by id.
	pub async fn food_item(&self, id: FoodItemId) -> Result<FoodItem, DomainError> {
		self.storage
			.retrieve(StorageKey::FoodItems.as_str(), &id.to_string())
			.await
			.map_err(|e| lookup_error("food item", id, e))
	}

	/// Replaces the mutable fields of a menu item.
	///
	/// Only the owning restaurant may edit an item; the edit changes future
	/// carts and orders only, since orders snapshot name and price at
	/// placement.
	pub async fn update_food_item(
		&self,
		restaurant_id: RestaurantId,
		food_item_id: FoodItemId,
		spec: FoodItemSpec,
	) -> Result<FoodItem, DomainError> {
		let existing = self.food_item(food_item_id).await?;
		if existing.restaurant_id != restaurant_id {
			return Err(DomainError::Forbidden(reason::NOT_OWNER));
		}

		let updated = FoodItem {
			id: existing.id,
			restaurant_id: existing.restaurant_id,
			name: spec.name,
			description: spec.description,
			price: spec.price,
			category: spec.category,
			image_url: spec.image_url,
		};
		self.storage
			.update(
				StorageKey::FoodItems.as_str(),
				&food_item_id.to_string(),
				&updated,
			)
			.await
			.map_err(|e| lookup_error("food item", food_item_id, e))?;

		debug!(food_item_id = %food_item_id, "Updated menu item");
		Ok(updated)
	}

	/// Removes a menu item. Only the owning restaurant may remove it.
	///
	/// Existing carts may still reference the removed id; placement re-resolves
	/// every line and surfaces the dangling reference there.
	pub async fn remove_food_item(
		&self,
		restaurant_id: RestaurantId,
		food_item_id: FoodItemId,
	) -> Result<(), DomainError> {
		let existing = self.food_item(food_item_id).await?;
		if existing.restaurant_id != restaurant_id {
			return Err(DomainError::Forbidden(reason::NOT_OWNER));
		}

		self.storage
			.remove(StorageKey::FoodItems.as_str(), &food_item_id.to_string())
			.await
			.map_err(|e| lookup_error("food item", food_item_id, e))?;

		debug!(food_item_id = %food_item_id, "Removed menu item");
		Ok(())
	}

	/// Lists a restaurant's current menu, sorted by item name.
	pub async fn menu(&self, restaurant_id: RestaurantId) -> Result<Vec<FoodItem>, DomainError> {
		self.restaurant(restaurant_id).await?;

		let mut items: Vec<FoodItem> = self
			.storage
			.retrieve_all(StorageKey::FoodItems.as_str())
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		items.retain(|item| item.restaurant_id == restaurant_id);
		items.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(items)
	}

	/// Assembles the display view of an order, resolving the current
	/// customer, restaurant, and (if assigned) agent names.
	pub async fn order_response(&self, order: &Order) -> Result<OrderResponse, DomainError> {
		let customer = self.customer(order.customer_id).await?;
		let restaurant = self.restaurant(order.restaurant_id).await?;
		let agent = match order.assigned_agent {
			Some(agent_id) => {
				let agent = self.agent(agent_id).await?;
				Some((agent.id, agent.name))
			},
			None => None,
		};
		Ok(OrderResponse::from_order(
			order,
			customer.name,
			restaurant.name,
			agent,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use rust_decimal::Decimal;
	use tiffin_storage::implementations::memory::MemoryStorage;
	use tiffin_types::{FoodCategory, OrderId, OrderStatus, PaymentType};

	fn directory() -> (DirectoryService, Arc<StorageService>) {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		(DirectoryService::new(storage.clone()), storage)
	}

	fn customer_profile(name: &str) -> CustomerProfile {
		CustomerProfile {
			name: name.to_string(),
			email: format!("{}@example.com", name.to_lowercase()),
			phone: "9000000001".to_string(),
			address: "12 MG Road".to_string(),
		}
	}

	fn restaurant_profile(name: &str) -> RestaurantProfile {
		RestaurantProfile {
			name: name.to_string(),
			email: format!("{}@example.com", name.to_lowercase()),
			phone: "9000000002".to_string(),
			address: "4 Brigade Road".to_string(),
		}
	}

	fn item_spec(name: &str, price: i64) -> FoodItemSpec {
		FoodItemSpec {
			name: name.to_string(),
			description: format!("{} from the daily menu", name),
			price: Decimal::new(price, 0),
			category: FoodCategory::Veg,
			image_url: None,
		}
	}

	#[tokio::test]
	async fn registering_customer_provisions_empty_cart() {
		let (directory, storage) = directory();
		let customer = directory
			.create_customer(customer_profile("Asha"))
			.await
			.unwrap();

		let cart: Cart = storage
			.retrieve(StorageKey::Carts.as_str(), &customer.id.to_string())
			.await
			.unwrap();
		assert!(cart.is_empty());
		assert_eq!(cart.customer_id, customer.id);
	}

	#[tokio::test]
	async fn unknown_customer_is_not_found() {
		let (directory, _) = directory();
		let err = directory.customer(CustomerId::new()).await.unwrap_err();
		assert!(matches!(
			err,
			DomainError::NotFound {
				entity: "customer",
				..
			}
		));
	}

	#[tokio::test]
	async fn menu_lists_only_own_items_sorted() {
		let (directory, _) = directory();
		let udupi = directory
			.create_restaurant(restaurant_profile("Udupi Grand"))
			.await
			.unwrap();
		let other = directory
			.create_restaurant(restaurant_profile("Punjabi Dhaba"))
			.await
			.unwrap();

		directory
			.add_food_item(udupi.id, item_spec("Masala Dosa", 80))
			.await
			.unwrap();
		directory
			.add_food_item(udupi.id, item_spec("Filter Coffee", 30))
			.await
			.unwrap();
		directory
			.add_food_item(other.id, item_spec("Dal Makhani", 160))
			.await
			.unwrap();

		let menu = directory.menu(udupi.id).await.unwrap();
		let names: Vec<&str> = menu.iter().map(|item| item.name.as_str()).collect();
		assert_eq!(names, vec!["Filter Coffee", "Masala Dosa"]);
	}

	#[tokio::test]
	async fn adding_item_requires_registered_restaurant() {
		let (directory, _) = directory();
		let err = directory
			.add_food_item(RestaurantId::new(), item_spec("Masala Dosa", 80))
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			DomainError::NotFound {
				entity: "restaurant",
				..
			}
		));
	}

	#[tokio::test]
	async fn foreign_restaurant_cannot_edit_item() {
		let (directory, _) = directory();
		let owner = directory
			.create_restaurant(restaurant_profile("Udupi Grand"))
			.await
			.unwrap();
		let intruder = directory
			.create_restaurant(restaurant_profile("Punjabi Dhaba"))
			.await
			.unwrap();
		let item = directory
			.add_food_item(owner.id, item_spec("Masala Dosa", 80))
			.await
			.unwrap();

		let err = directory
			.update_food_item(intruder.id, item.id, item_spec("Masala Dosa", 90))
			.await
			.unwrap_err();
		assert_eq!(err, DomainError::Forbidden(reason::NOT_OWNER));

		let err = directory
			.remove_food_item(intruder.id, item.id)
			.await
			.unwrap_err();
		assert_eq!(err, DomainError::Forbidden(reason::NOT_OWNER));
	}

	#[tokio::test]
	async fn removed_item_disappears_from_menu() {
		let (directory, _) = directory();
		let restaurant = directory
			.create_restaurant(restaurant_profile("Udupi Grand"))
			.await
			.unwrap();
		let item = directory
			.add_food_item(restaurant.id, item_spec("Masala Dosa", 80))
			.await
			.unwrap();

		directory
			.remove_food_item(restaurant.id, item.id)
			.await
			.unwrap();
		assert!(directory.menu(restaurant.id).await.unwrap().is_empty());

		let err = directory
			.remove_food_item(restaurant.id, item.id)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			DomainError::NotFound {
				entity: "food item",
				..
			}
		));
	}

	#[tokio::test]
	async fn update_replaces_price_and_name() {
		let (directory, _) = directory();
		let restaurant = directory
			.create_restaurant(restaurant_profile("Udupi Grand"))
			.await
			.unwrap();
		let item = directory
			.add_food_item(restaurant.id, item_spec("Masala Dosa", 80))
			.await
			.unwrap();

		let updated = directory
			.update_food_item(restaurant.id, item.id, item_spec("Mysore Masala Dosa", 95))
			.await
			.unwrap();
		assert_eq!(updated.name, "Mysore Masala Dosa");
		assert_eq!(updated.price, Decimal::new(95, 0));

		let reloaded = directory.food_item(item.id).await.unwrap();
		assert_eq!(reloaded.name, "Mysore Masala Dosa");
	}

	#[tokio::test]
	async fn agents_filtered_by_availability() {
		let (directory, storage) = directory();
		let ravi = directory
			.create_agent(AgentProfile {
				name: "Ravi".to_string(),
				email: "ravi@example.com".to_string(),
				phone: "9000000003".to_string(),
			})
			.await
			.unwrap();
		directory
			.create_agent(AgentProfile {
				name: "Sunil".to_string(),
				email: "sunil@example.com".to_string(),
				phone: "9000000004".to_string(),
			})
			.await
			.unwrap();

		// Agents register OFFLINE; flip one to AVAILABLE directly in storage.
		let mut available = directory.agent(ravi.id).await.unwrap();
		available.availability = AvailabilityStatus::Available;
		storage
			.store(
				StorageKey::Agents.as_str(),
				&available.id.to_string(),
				&available,
			)
			.await
			.unwrap();

		let listed = directory
			.agents_by_availability(AvailabilityStatus::Available)
			.await
			.unwrap();
		assert_eq!(listed.len(), 1);
		assert_eq!(listed[0].name, "Ravi");

		let all = directory.agents().await.unwrap();
		assert_eq!(all.len(), 2);
	}

	#[tokio::test]
	async fn order_response_joins_current_names() {
		let (directory, _) = directory();
		let customer = directory
			.create_customer(customer_profile("Asha"))
			.await
			.unwrap();
		let restaurant = directory
			.create_restaurant(restaurant_profile("Udupi Grand"))
			.await
			.unwrap();

		let order = Order {
			id: OrderId::new(),
			customer_id: customer.id,
			restaurant_id: restaurant.id,
			status: OrderStatus::Pending,
			order_date: Utc::now(),
			delivery_address: "12 MG Road".to_string(),
			payment_type: PaymentType::Upi,
			total_amount: Decimal::new(130, 0),
			items: vec![],
			assigned_agent: None,
			updated_at: Utc::now(),
		};

		let view = directory.order_response(&order).await.unwrap();
		assert_eq!(view.customer_name, "Asha");
		assert_eq!(view.restaurant_name, "Udupi Grand");
		assert!(view.delivery_agent_id.is_none());
	}
}
