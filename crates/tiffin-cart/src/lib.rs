//! Cart management for the tiffin fulfillment system.
//!
//! This crate owns the mutable pre-order state: one cart per customer, all
//! lines from a single restaurant. Every mutation is a locked
//! read-modify-write on the customer's cart record, so concurrent calls for
//! the same customer serialize while different customers proceed
//! independently. Views re-resolve each line against the current catalog;
//! nothing in the cart is a snapshot.

use chrono::Utc;
use std::sync::Arc;
use tiffin_directory::DirectoryService;
use tiffin_storage::{AggregateLocks, StorageError, StorageService};
use tiffin_types::{
	reason, Cart, CartItem, CartLine, CartResponse, CustomerId, DomainError, FoodItemId,
	StorageKey,
};
use tracing::{debug, instrument};

/// Maps a failed entity read to the shared error vocabulary.
fn lookup_error(entity: &'static str, id: impl std::fmt::Display, err: StorageError) -> DomainError {
	match err {
		StorageError::NotFound => DomainError::not_found(entity, id),
		other => DomainError::Storage(other.to_string()),
	}
}

/// Manages per-customer carts.
///
/// Mutations take the customer's cart lock before loading, so two adds for
/// the same customer can never both read the same stale cart. Catalog and
/// customer lookups happen outside the lock; they are read-only.
pub struct CartService {
	storage: Arc<StorageService>,
	directory: Arc<DirectoryService>,
	locks: Arc<AggregateLocks>,
}

impl CartService {
	/// Creates a new CartService.
	pub fn new(
		storage: Arc<StorageService>,
		directory: Arc<DirectoryService>,
		locks: Arc<AggregateLocks>,
	) -> Self {
		Self {
			storage,
			directory,
			locks,
		}
	}

	/// Returns the customer's cart with current catalog names and prices.
	pub async fn get_cart(&self, customer_id: CustomerId) -> Result<CartResponse, DomainError> {
		self.directory.customer(customer_id).await?;
		let cart = self.load(customer_id).await?;
		self.respond(cart).await
	}

	/// Adds a quantity of a food item to the customer's cart.
	///
	/// An existing line for the item accumulates; a new line is appended only
	/// when it keeps the cart single-restaurant. The first line pins the
	/// cart's restaurant.
	#[instrument(skip_all, fields(customer_id = %customer_id, food_item_id = %food_item_id))]
	pub async fn add_item(
		&self,
		customer_id: CustomerId,
		food_item_id: FoodItemId,
		quantity: i32,
	) -> Result<CartResponse, DomainError> {
		if quantity <= 0 {
			return Err(DomainError::Conflict(reason::INVALID_QUANTITY));
		}
		self.directory.customer(customer_id).await?;
		let item = self.directory.food_item(food_item_id).await?;

		let _guard = self
			.locks
			.acquire(StorageKey::Carts.as_str(), &customer_id.to_string())
			.await;

		let mut cart = self.load_or_empty(customer_id).await?;
		match cart.items.iter().position(|l| l.food_item_id == food_item_id) {
			Some(position) => {
				let line = &mut cart.items[position];
				line.quantity = line.quantity.saturating_add(quantity as u32);
			},
			None => {
				match cart.restaurant_id {
					Some(current) if current != item.restaurant_id => {
						return Err(DomainError::Conflict(reason::CROSS_RESTAURANT));
					},
					Some(_) => {},
					None => cart.restaurant_id = Some(item.restaurant_id),
				}
				cart.items.push(CartItem {
					food_item_id,
					quantity: quantity as u32,
				});
			},
		}
		cart.updated_at = Utc::now();
		self.store(&cart).await?;

		debug!(
			customer_id = %customer_id,
			food_item_id = %food_item_id,
			quantity = quantity,
			"Added cart line"
		);
		self.respond(cart).await
	}

	/// Sets the exact quantity of an existing line.
	///
	/// A quantity of zero or below removes the line; the line must exist
	/// either way.
	pub async fn update_quantity(
		&self,
		customer_id: CustomerId,
		food_item_id: FoodItemId,
		quantity: i32,
	) -> Result<CartResponse, DomainError> {
		self.directory.customer(customer_id).await?;

		let _guard = self
			.locks
			.acquire(StorageKey::Carts.as_str(), &customer_id.to_string())
			.await;

		let mut cart = self.load(customer_id).await?;
		let position = cart
			.items
			.iter()
			.position(|l| l.food_item_id == food_item_id)
			.ok_or_else(|| DomainError::not_found("cart item", food_item_id))?;

		if quantity <= 0 {
			cart.items.remove(position);
			if cart.items.is_empty() {
				cart.restaurant_id = None;
			}
		} else {
			cart.items[position].quantity = quantity as u32;
		}
		cart.updated_at = Utc::now();
		self.store(&cart).await?;

		debug!(
			customer_id = %customer_id,
			food_item_id = %food_item_id,
			quantity = quantity,
			"Updated cart line"
		);
		self.respond(cart).await
	}

	/// Removes a line from the cart. The line must exist.
	pub async fn remove_item(
		&self,
		customer_id: CustomerId,
		food_item_id: FoodItemId,
	) -> Result<CartResponse, DomainError> {
		self.directory.customer(customer_id).await?;

		let _guard = self
			.locks
			.acquire(StorageKey::Carts.as_str(), &customer_id.to_string())
			.await;

		let mut cart = self.load(customer_id).await?;
		let position = cart
			.items
			.iter()
			.position(|l| l.food_item_id == food_item_id)
			.ok_or_else(|| DomainError::not_found("cart item", food_item_id))?;

		cart.items.remove(position);
		if cart.items.is_empty() {
			cart.restaurant_id = None;
		}
		cart.updated_at = Utc::now();
		self.store(&cart).await?;

		debug!(customer_id = %customer_id, food_item_id = %food_item_id, "Removed cart line");
		self.respond(cart).await
	}

	/// Empties the cart. Clearing an already-empty cart succeeds.
	pub async fn clear(&self, customer_id: CustomerId) -> Result<CartResponse, DomainError> {
		self.directory.customer(customer_id).await?;

		let _guard = self
			.locks
			.acquire(StorageKey::Carts.as_str(), &customer_id.to_string())
			.await;

		let mut cart = self.load(customer_id).await?;
		cart.items.clear();
		cart.restaurant_id = None;
		cart.updated_at = Utc::now();
		self.store(&cart).await?;

		debug!(customer_id = %customer_id, "Cleared cart");
		self.respond(cart).await
	}

	/// Loads the customer's cart record.
	async fn load(&self, customer_id: CustomerId) -> Result<Cart, DomainError> {
		self.storage
			.retrieve(StorageKey::Carts.as_str(), &customer_id.to_string())
			.await
			.map_err(|e| lookup_error("cart", customer_id, e))
	}

	/// Loads the cart record, falling back to an empty cart when none is
	/// stored yet.
	async fn load_or_empty(&self, customer_id: CustomerId) -> Result<Cart, DomainError> {
		match self
			.storage
			.retrieve(StorageKey::Carts.as_str(), &customer_id.to_string())
			.await
		{
			Ok(cart) => Ok(cart),
			Err(StorageError::NotFound) => Ok(Cart::empty(customer_id)),
			Err(e) => Err(DomainError::Storage(e.to_string())),
		}
	}

	async fn store(&self, cart: &Cart) -> Result<(), DomainError> {
		self.storage
			.store(
				StorageKey::Carts.as_str(),
				&cart.customer_id.to_string(),
				cart,
			)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))
	}

	/// Resolves every line against the current catalog and builds the view.
	///
	/// A line whose food item has since been removed surfaces as `NotFound`,
	/// the same way placement would fail for it.
	async fn respond(&self, cart: Cart) -> Result<CartResponse, DomainError> {
		let mut lines = Vec::with_capacity(cart.items.len());
		for line in &cart.items {
			let item = self.directory.food_item(line.food_item_id).await?;
			lines.push(CartLine {
				food_item_id: line.food_item_id,
				name: item.name,
				price: item.price,
				quantity: line.quantity,
			});
		}
		Ok(CartResponse::from_cart(&cart, lines))
	}
}
