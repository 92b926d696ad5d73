//! Order placement and order queries for the tiffin fulfillment system.
//!
//! Placement converts a customer's cart into an immutable order: every line
//! is re-resolved against the catalog and snapshotted (name and unit price),
//! the total is computed once, and the order plus the emptied cart are
//! committed in a single atomic batch. A placement that fails for any reason
//! leaves the cart exactly as it was.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tiffin_directory::DirectoryService;
use tiffin_storage::{AggregateLocks, StorageBatch, StorageError, StorageService};
use tiffin_types::{
	reason, Cart, CustomerId, DomainError, Order, OrderId, OrderItem, OrderResponse, OrderStatus,
	PlaceOrderRequest, RestaurantId, StorageKey,
};
use tracing::{info, instrument};

/// Maps a failed entity read to the shared error vocabulary.
fn lookup_error(entity: &'static str, id: impl std::fmt::Display, err: StorageError) -> DomainError {
	match err {
		StorageError::NotFound => DomainError::not_found(entity, id),
		other => DomainError::Storage(other.to_string()),
	}
}

/// Creates orders from carts and answers order queries.
///
/// Placement holds the customer's cart lock for its whole read-snapshot-commit
/// sequence, so a concurrent cart mutation can never slip between the snapshot
/// and the commit that clears the cart.
pub struct OrderService {
	storage: Arc<StorageService>,
	directory: Arc<DirectoryService>,
	locks: Arc<AggregateLocks>,
}

impl OrderService {
	/// Creates a new OrderService.
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

	/// Converts the customer's cart into a PENDING order.
	///
	/// Every cart line is snapshotted with the food item's current catalog
	/// name and price; a line whose item has been removed fails the whole
	/// placement with `NotFound`. The order write and the cart clear commit
	/// together or not at all.
	#[instrument(skip_all, fields(customer_id = %request.customer_id))]
	pub async fn place_order(
		&self,
		request: PlaceOrderRequest,
	) -> Result<OrderResponse, DomainError> {
		let customer = self.directory.customer(request.customer_id).await?;

		let _guard = self
			.locks
			.acquire(StorageKey::Carts.as_str(), &request.customer_id.to_string())
			.await;

		let cart: Cart = self
			.storage
			.retrieve(StorageKey::Carts.as_str(), &request.customer_id.to_string())
			.await
			.map_err(|e| lookup_error("cart", request.customer_id, e))?;
		if cart.is_empty() {
			return Err(DomainError::Conflict(reason::EMPTY_CART));
		}
		let restaurant_id = cart.restaurant_id.ok_or_else(|| {
			DomainError::invariant("non-empty cart carries no restaurant")
		})?;
		let restaurant = self.directory.restaurant(restaurant_id).await?;

		let mut items = Vec::with_capacity(cart.items.len());
		for line in &cart.items {
			let food = self.directory.food_item(line.food_item_id).await?;
			if food.restaurant_id != restaurant_id {
				return Err(DomainError::invariant(format!(
					"cart line {} belongs to restaurant {}, cart pinned to {}",
					line.food_item_id, food.restaurant_id, restaurant_id
				)));
			}
			items.push(OrderItem {
				food_item_id: line.food_item_id,
				name: food.name,
				price_per_item: food.price,
				quantity: line.quantity,
			});
		}
		let total_amount: Decimal = items.iter().map(|item| item.line_total()).sum();

		let now = Utc::now();
		let order = Order {
			id: OrderId::new(),
			customer_id: request.customer_id,
			restaurant_id,
			status: OrderStatus::Pending,
			order_date: now,
			delivery_address: request.delivery_address,
			payment_type: request.payment_type,
			total_amount,
			items,
			assigned_agent: None,
			updated_at: now,
		};
		let emptied = Cart {
			customer_id: cart.customer_id,
			restaurant_id: None,
			items: Vec::new(),
			updated_at: now,
		};

		let mut batch = StorageBatch::new();
		batch
			.put(StorageKey::Orders.as_str(), &order.id.to_string(), &order)
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		batch
			.put(
				StorageKey::Carts.as_str(),
				&emptied.customer_id.to_string(),
				&emptied,
			)
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		self.storage
			.commit(batch)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		info!(
			order_id = %order.id,
			customer_id = %order.customer_id,
			restaurant_id = %order.restaurant_id,
			total_amount = %order.total_amount,
			"Placed order"
		);
		Ok(OrderResponse::from_order(
			&order,
			customer.name,
			restaurant.name,
			None,
		))
	}

	/// Returns the view of a single order.
	pub async fn order(&self, order_id: OrderId) -> Result<OrderResponse, DomainError> {
		let order = self.load(order_id).await?;
		self.directory.order_response(&order).await
	}

	/// Returns an order view scoped to its owning customer.
	///
	/// An order that exists but belongs to someone else is reported as
	/// `NotFound`, not as forbidden; foreign orders stay invisible.
	pub async fn order_for_customer(
		&self,
		customer_id: CustomerId,
		order_id: OrderId,
	) -> Result<OrderResponse, DomainError> {
		self.directory.customer(customer_id).await?;
		let order = self.load(order_id).await?;
		if order.customer_id != customer_id {
			return Err(DomainError::not_found("order", order_id));
		}
		self.directory.order_response(&order).await
	}

	/// Lists a customer's orders, most recent first.
	pub async fn orders_by_customer(
		&self,
		customer_id: CustomerId,
	) -> Result<Vec<OrderResponse>, DomainError> {
		self.directory.customer(customer_id).await?;
		self.order_views(|order| order.customer_id == customer_id)
			.await
	}

	/// Lists a restaurant's orders, most recent first.
	pub async fn orders_by_restaurant(
		&self,
		restaurant_id: RestaurantId,
	) -> Result<Vec<OrderResponse>, DomainError> {
		self.directory.restaurant(restaurant_id).await?;
		self.order_views(|order| order.restaurant_id == restaurant_id)
			.await
	}

	async fn load(&self, order_id: OrderId) -> Result<Order, DomainError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), &order_id.to_string())
			.await
			.map_err(|e| lookup_error("order", order_id, e))
	}

	/// Scans the order namespace, keeps matches, and assembles views sorted
	/// by placement time (newest first).
	async fn order_views<F>(&self, keep: F) -> Result<Vec<OrderResponse>, DomainError>
	where
		F: Fn(&Order) -> bool,
	{
		let mut orders: Vec<Order> = self
			.storage
			.retrieve_all(StorageKey::Orders.as_str())
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		orders.retain(|order| keep(order));
		orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));

		let mut views = Vec::with_capacity(orders.len());
		for order in &orders {
			views.push(self.directory.order_response(order).await?);
		}
		Ok(views)
	}
}
