//! Transition execution against stored orders.
//!
//! [`OrderLifecycle`] decides which transitions are legal; this service
//! applies them. Every update resolves the acting party, serializes on the
//! order's lock, re-checks authorization against the stored order, validates
//! the requested change, and commits the status write together with any
//! agent availability side effect as one batch. Locks are taken order first,
//! then agent, matching the dispatch service, so the two never deadlock
//! against each other.

use chrono::Utc;
use std::sync::Arc;
use tiffin_directory::DirectoryService;
use tiffin_storage::{AggregateLocks, StorageBatch, StorageError, StorageService};
use tiffin_types::{
	reason, ActorRole, AgentId, DomainError, Order, OrderId, OrderResponse, OrderStatus,
	RestaurantId, StorageKey,
};
use tracing::{info, instrument};

use crate::state::lifecycle::{AgentEffect, OrderLifecycle};

/// Maps a failed entity read to the shared error vocabulary.
fn lookup_error(entity: &'static str, id: impl std::fmt::Display, err: StorageError) -> DomainError {
	match err {
		StorageError::NotFound => DomainError::not_found(entity, id),
		other => DomainError::Storage(other.to_string()),
	}
}

/// Applies role-checked status transitions to orders.
pub struct StatusMachine {
	storage: Arc<StorageService>,
	directory: Arc<DirectoryService>,
	locks: Arc<AggregateLocks>,
}

impl StatusMachine {
	/// Creates a new StatusMachine.
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

	/// Applies a status change requested by a restaurant.
	///
	/// The restaurant must own the order; the change must be a restaurant row
	/// in the transition table. On rejection the order is left untouched.
	#[instrument(skip_all, fields(order_id = %order_id, new_status = %new_status))]
	pub async fn restaurant_update(
		&self,
		restaurant_id: RestaurantId,
		order_id: OrderId,
		new_status: OrderStatus,
	) -> Result<OrderResponse, DomainError> {
		self.directory.restaurant(restaurant_id).await?;

		let _order_guard = self
			.locks
			.acquire(StorageKey::Orders.as_str(), &order_id.to_string())
			.await;
		let order = self.load_order(order_id).await?;
		if order.restaurant_id != restaurant_id {
			return Err(DomainError::Forbidden(reason::NOT_OWNER));
		}

		let effect = OrderLifecycle::validate(order.status, ActorRole::Restaurant, new_status)?;
		self.commit_status(order, new_status, effect, None).await
	}

	/// Applies a status change requested by a delivery agent.
	///
	/// The agent must be the one assigned to the order; the change must be an
	/// agent row in the transition table. Pickup and delivery rows carry the
	/// availability side effects defined in [`AgentEffect`].
	#[instrument(skip_all, fields(order_id = %order_id, new_status = %new_status))]
	pub async fn agent_update(
		&self,
		agent_id: AgentId,
		order_id: OrderId,
		new_status: OrderStatus,
	) -> Result<OrderResponse, DomainError> {
		self.directory.agent(agent_id).await?;

		let _order_guard = self
			.locks
			.acquire(StorageKey::Orders.as_str(), &order_id.to_string())
			.await;
		let order = self.load_order(order_id).await?;
		if order.assigned_agent != Some(agent_id) {
			return Err(DomainError::Forbidden(reason::NOT_ASSIGNED));
		}

		let effect = OrderLifecycle::validate(order.status, ActorRole::DeliveryAgent, new_status)?;
		self.commit_status(order, new_status, effect, Some(agent_id))
			.await
	}

	/// Writes the new status, and the agent side effect when one applies, as
	/// a single batch. The caller holds the order lock.
	async fn commit_status(
		&self,
		mut order: Order,
		new_status: OrderStatus,
		effect: AgentEffect,
		acting_agent: Option<AgentId>,
	) -> Result<OrderResponse, DomainError> {
		let from = order.status;
		order.status = new_status;
		order.updated_at = Utc::now();

		let mut batch = StorageBatch::new();
		batch
			.put(StorageKey::Orders.as_str(), &order.id.to_string(), &order)
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		match acting_agent {
			Some(agent_id) if effect != AgentEffect::None => {
				let _agent_guard = self
					.locks
					.acquire(StorageKey::Agents.as_str(), &agent_id.to_string())
					.await;
				let mut agent = self.directory.agent(agent_id).await?;
				if let Some(next) = effect.apply(agent.availability) {
					agent.availability = next;
					batch
						.put(StorageKey::Agents.as_str(), &agent_id.to_string(), &agent)
						.map_err(|e| DomainError::Storage(e.to_string()))?;
					info!(
						agent_id = %agent_id,
						availability = %next,
						"Agent availability follows order transition"
					);
				}
				self.storage
					.commit(batch)
					.await
					.map_err(|e| DomainError::Storage(e.to_string()))?;
			},
			_ => {
				self.storage
					.commit(batch)
					.await
					.map_err(|e| DomainError::Storage(e.to_string()))?;
			},
		}

		info!(order_id = %order.id, from = %from, to = %new_status, "Order status changed");
		self.directory.order_response(&order).await
	}

	async fn load_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), &order_id.to_string())
			.await
			.map_err(|e| lookup_error("order", order_id, e))
	}
}
