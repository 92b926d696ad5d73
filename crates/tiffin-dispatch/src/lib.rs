//! Delivery assignment coordination for the tiffin fulfillment system.
//!
//! This crate matches prepared orders to available delivery agents and owns
//! manual agent availability changes. An assignment is created exactly once
//! per order and never reassigned; creating it, linking it to the order, and
//! flipping the agent to IN_DELIVERY commit as one atomic batch. Locks are
//! taken order first, then agent, the same order the status machine uses, so
//! the two can never deadlock against each other.

use chrono::Utc;
use std::sync::Arc;
use tiffin_directory::DirectoryService;
use tiffin_storage::{AggregateLocks, StorageBatch, StorageError, StorageService};
use tiffin_types::{
	reason, AgentId, AgentResponse, AssignmentResponse, AvailabilityStatus, DeliveryAssignment,
	DomainError, Order, OrderId, OrderStatus, RestaurantId, StorageKey,
};
use tracing::{info, instrument};

/// Maps a failed entity read to the shared error vocabulary.
fn lookup_error(entity: &'static str, id: impl std::fmt::Display, err: StorageError) -> DomainError {
	match err {
		StorageError::NotFound => DomainError::not_found(entity, id),
		other => DomainError::Storage(other.to_string()),
	}
}

/// Coordinates delivery assignments and manual availability changes.
///
/// Every mutation here serializes per agent (and per order for assignment),
/// so an agent can never be assigned two orders concurrently or toggled
/// AVAILABLE while an assignment is mid-creation.
pub struct DispatchService {
	storage: Arc<StorageService>,
	directory: Arc<DirectoryService>,
	locks: Arc<AggregateLocks>,
}

impl DispatchService {
	/// Creates a new DispatchService.
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

	/// Assigns a prepared order to an available delivery agent.
	///
	/// Preconditions, checked in this order after all three ids resolve:
	/// the restaurant owns the order, the order is PREPARED, the order has no
	/// assignment yet, and the agent is AVAILABLE. On success the assignment
	/// record, the order's agent link, and the agent's IN_DELIVERY status are
	/// committed together; any precondition failure applies nothing.
	#[instrument(skip_all, fields(order_id = %order_id, agent_id = %agent_id))]
	pub async fn assign(
		&self,
		restaurant_id: RestaurantId,
		order_id: OrderId,
		agent_id: AgentId,
	) -> Result<AssignmentResponse, DomainError> {
		self.directory.restaurant(restaurant_id).await?;

		let _order_guard = self
			.locks
			.acquire(StorageKey::Orders.as_str(), &order_id.to_string())
			.await;
		let mut order = self.load_order(order_id).await?;

		let _agent_guard = self
			.locks
			.acquire(StorageKey::Agents.as_str(), &agent_id.to_string())
			.await;
		let mut agent = self.directory.agent(agent_id).await?;

		if order.restaurant_id != restaurant_id {
			return Err(DomainError::Forbidden(reason::NOT_OWNER));
		}
		if order.status != OrderStatus::Prepared {
			return Err(DomainError::Conflict(reason::NOT_READY));
		}
		if order.assigned_agent.is_some() {
			return Err(DomainError::Conflict(reason::ALREADY_ASSIGNED));
		}
		if agent.availability != AvailabilityStatus::Available {
			return Err(DomainError::Conflict(reason::AGENT_UNAVAILABLE));
		}

		let now = Utc::now();
		let assignment = DeliveryAssignment {
			order_id,
			agent_id,
			restaurant_id,
			assigned_at: now,
		};
		order.assigned_agent = Some(agent_id);
		order.updated_at = now;
		agent.availability = AvailabilityStatus::InDelivery;

		let mut batch = StorageBatch::new();
		batch
			.put(
				StorageKey::Assignments.as_str(),
				&order_id.to_string(),
				&assignment,
			)
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		batch
			.put(StorageKey::Orders.as_str(), &order_id.to_string(), &order)
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		batch
			.put(StorageKey::Agents.as_str(), &agent_id.to_string(), &agent)
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		self.storage
			.commit(batch)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		info!(
			order_id = %order_id,
			agent_id = %agent_id,
			restaurant_id = %restaurant_id,
			"Assigned delivery agent"
		);
		Ok(AssignmentResponse::from_assignment(&assignment, order.status))
	}

	/// Manually changes an agent's availability.
	///
	/// AVAILABLE is rejected while the agent holds an assignment on any
	/// non-terminal order; IN_DELIVERY is rejected without one; OFFLINE is
	/// unconditional.
	#[instrument(skip_all, fields(agent_id = %agent_id, new_status = %new_status))]
	pub async fn update_availability(
		&self,
		agent_id: AgentId,
		new_status: AvailabilityStatus,
	) -> Result<AgentResponse, DomainError> {
		let _agent_guard = self
			.locks
			.acquire(StorageKey::Agents.as_str(), &agent_id.to_string())
			.await;
		let mut agent = self.directory.agent(agent_id).await?;

		match new_status {
			AvailabilityStatus::Available => {
				if self.has_active_assignment(agent_id).await? {
					return Err(DomainError::Conflict(reason::ACTIVE_DELIVERY));
				}
			},
			AvailabilityStatus::InDelivery => {
				if !self.has_active_assignment(agent_id).await? {
					return Err(DomainError::Conflict(reason::NO_ACTIVE_ASSIGNMENT));
				}
			},
			AvailabilityStatus::Offline => {},
		}

		agent.availability = new_status;
		self.storage
			.store(StorageKey::Agents.as_str(), &agent_id.to_string(), &agent)
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;

		info!(agent_id = %agent_id, availability = %new_status, "Updated agent availability");
		Ok(AgentResponse::from(&agent))
	}

	/// Lists an agent's assignments, most recent first, with each order's
	/// current status joined in.
	pub async fn assignments_for_agent(
		&self,
		agent_id: AgentId,
	) -> Result<Vec<AssignmentResponse>, DomainError> {
		self.directory.agent(agent_id).await?;

		let mut assignments = self.assignments_of(agent_id).await?;
		assignments.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at));

		let mut views = Vec::with_capacity(assignments.len());
		for assignment in &assignments {
			let order = self.load_order(assignment.order_id).await?;
			views.push(AssignmentResponse::from_assignment(assignment, order.status));
		}
		Ok(views)
	}

	/// Returns true when the agent holds an assignment whose order is still
	/// non-terminal.
	///
	/// Assigned orders only reach a terminal status through the DELIVERED
	/// transition, which serializes on the agent lock held by our callers, so
	/// the unlocked order reads here cannot race an active-to-terminal flip.
	async fn has_active_assignment(&self, agent_id: AgentId) -> Result<bool, DomainError> {
		for assignment in self.assignments_of(agent_id).await? {
			let order = self.load_order(assignment.order_id).await?;
			if !order.status.is_terminal() {
				return Ok(true);
			}
		}
		Ok(false)
	}

	async fn assignments_of(
		&self,
		agent_id: AgentId,
	) -> Result<Vec<DeliveryAssignment>, DomainError> {
		let mut assignments: Vec<DeliveryAssignment> = self
			.storage
			.retrieve_all(StorageKey::Assignments.as_str())
			.await
			.map_err(|e| DomainError::Storage(e.to_string()))?;
		assignments.retain(|assignment| assignment.agent_id == agent_id);
		Ok(assignments)
	}

	async fn load_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), &order_id.to_string())
			.await
			.map_err(|e| lookup_error("order", order_id, e))
	}
}
