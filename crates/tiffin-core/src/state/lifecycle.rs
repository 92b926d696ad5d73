//! The role-keyed order transition table.
//!
//! Every legal status change is one row here: (current status, acting role)
//! maps to the reachable target statuses plus the availability side effect
//! the change carries for the acting agent. Anything not in the table is an
//! invalid transition. Terminal statuses have no rows, so nothing can leave
//! them.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tiffin_types::{ActorRole, AvailabilityStatus, DomainError, OrderStatus};

/// Availability side effect attached to a transition row.
///
/// Effects are conditional on the agent's current availability: pickup after
/// an assignment finds the agent already IN_DELIVERY and changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEffect {
	/// The transition does not touch agent availability.
	None,
	/// Pickup by the agent: AVAILABLE becomes IN_DELIVERY.
	StartDelivery,
	/// Delivery completed: IN_DELIVERY becomes AVAILABLE.
	FinishDelivery,
}

impl AgentEffect {
	/// Returns the availability the agent should move to, or `None` when the
	/// agent's current availability does not match the effect's precondition.
	pub fn apply(&self, current: AvailabilityStatus) -> Option<AvailabilityStatus> {
		match (self, current) {
			(AgentEffect::StartDelivery, AvailabilityStatus::Available) => {
				Some(AvailabilityStatus::InDelivery)
			},
			(AgentEffect::FinishDelivery, AvailabilityStatus::InDelivery) => {
				Some(AvailabilityStatus::Available)
			},
			_ => None,
		}
	}
}

type TransitionRow = (Vec<OrderStatus>, AgentEffect);

static TRANSITIONS: Lazy<HashMap<(OrderStatus, ActorRole), TransitionRow>> = Lazy::new(|| {
	let mut table = HashMap::new();
	table.insert(
		(OrderStatus::Pending, ActorRole::Restaurant),
		(
			vec![OrderStatus::Preparing, OrderStatus::Cancelled],
			AgentEffect::None,
		),
	);
	table.insert(
		(OrderStatus::Preparing, ActorRole::Restaurant),
		(
			vec![OrderStatus::Prepared, OrderStatus::Cancelled],
			AgentEffect::None,
		),
	);
	// Manual hand-off by the restaurant; no agent is involved.
	table.insert(
		(OrderStatus::Prepared, ActorRole::Restaurant),
		(vec![OrderStatus::PickedUp], AgentEffect::None),
	);
	table.insert(
		(OrderStatus::Prepared, ActorRole::DeliveryAgent),
		(vec![OrderStatus::PickedUp], AgentEffect::StartDelivery),
	);
	table.insert(
		(OrderStatus::PickedUp, ActorRole::DeliveryAgent),
		(vec![OrderStatus::OutForDelivery], AgentEffect::None),
	);
	table.insert(
		(OrderStatus::OutForDelivery, ActorRole::DeliveryAgent),
		(vec![OrderStatus::Delivered], AgentEffect::FinishDelivery),
	);
	table
});

/// Read-only view of the transition table.
pub struct OrderLifecycle;

impl OrderLifecycle {
	/// Returns the statuses the given role may move an order to from `from`.
	/// Empty for terminal statuses and for roles with no row.
	pub fn allowed_targets(from: OrderStatus, actor: ActorRole) -> &'static [OrderStatus] {
		TRANSITIONS
			.get(&(from, actor))
			.map(|(targets, _)| targets.as_slice())
			.unwrap_or(&[])
	}

	/// Returns true when the table contains the requested transition.
	pub fn can_transition(from: OrderStatus, actor: ActorRole, to: OrderStatus) -> bool {
		Self::allowed_targets(from, actor).contains(&to)
	}

	/// Validates one requested transition and returns the availability side
	/// effect its row carries. Order and agent state are never touched here;
	/// rejection means the caller applies nothing.
	pub fn validate(
		from: OrderStatus,
		actor: ActorRole,
		to: OrderStatus,
	) -> Result<AgentEffect, DomainError> {
		match TRANSITIONS.get(&(from, actor)) {
			Some((targets, effect)) if targets.contains(&to) => Ok(*effect),
			_ => Err(DomainError::InvalidTransition {
				from,
				requested: to,
				actor,
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Every legal (from, actor, to) triple. The sweep below checks that the
	/// table accepts exactly these and nothing else.
	fn legal_transitions() -> Vec<(OrderStatus, ActorRole, OrderStatus)> {
		vec![
			(
				OrderStatus::Pending,
				ActorRole::Restaurant,
				OrderStatus::Preparing,
			),
			(
				OrderStatus::Pending,
				ActorRole::Restaurant,
				OrderStatus::Cancelled,
			),
			(
				OrderStatus::Preparing,
				ActorRole::Restaurant,
				OrderStatus::Prepared,
			),
			(
				OrderStatus::Preparing,
				ActorRole::Restaurant,
				OrderStatus::Cancelled,
			),
			(
				OrderStatus::Prepared,
				ActorRole::Restaurant,
				OrderStatus::PickedUp,
			),
			(
				OrderStatus::Prepared,
				ActorRole::DeliveryAgent,
				OrderStatus::PickedUp,
			),
			(
				OrderStatus::PickedUp,
				ActorRole::DeliveryAgent,
				OrderStatus::OutForDelivery,
			),
			(
				OrderStatus::OutForDelivery,
				ActorRole::DeliveryAgent,
				OrderStatus::Delivered,
			),
		]
	}

	#[test]
	fn table_accepts_exactly_the_legal_triples() {
		let legal = legal_transitions();
		for from in OrderStatus::all() {
			for actor in [ActorRole::Restaurant, ActorRole::DeliveryAgent] {
				for to in OrderStatus::all() {
					let expected = legal.contains(&(from, actor, to));
					assert_eq!(
						OrderLifecycle::can_transition(from, actor, to),
						expected,
						"{from} -> {to} as {actor}"
					);
					assert_eq!(OrderLifecycle::validate(from, actor, to).is_ok(), expected);
				}
			}
		}
	}

	#[test]
	fn rejection_reports_all_three_parts() {
		let err = OrderLifecycle::validate(
			OrderStatus::Pending,
			ActorRole::DeliveryAgent,
			OrderStatus::Delivered,
		)
		.unwrap_err();
		assert_eq!(
			err,
			DomainError::InvalidTransition {
				from: OrderStatus::Pending,
				requested: OrderStatus::Delivered,
				actor: ActorRole::DeliveryAgent,
			}
		);
	}

	#[test]
	fn terminal_statuses_have_no_exits() {
		for status in [OrderStatus::Delivered, OrderStatus::Cancelled] {
			for actor in [ActorRole::Restaurant, ActorRole::DeliveryAgent] {
				assert!(OrderLifecycle::allowed_targets(status, actor).is_empty());
			}
		}
	}

	#[test]
	fn pickup_by_agent_starts_delivery() {
		let effect = OrderLifecycle::validate(
			OrderStatus::Prepared,
			ActorRole::DeliveryAgent,
			OrderStatus::PickedUp,
		)
		.unwrap();
		assert_eq!(effect, AgentEffect::StartDelivery);
		assert_eq!(
			effect.apply(AvailabilityStatus::Available),
			Some(AvailabilityStatus::InDelivery)
		);
		// Already IN_DELIVERY after an assignment: pickup changes nothing.
		assert_eq!(effect.apply(AvailabilityStatus::InDelivery), None);
	}

	#[test]
	fn pickup_by_restaurant_carries_no_effect() {
		let effect = OrderLifecycle::validate(
			OrderStatus::Prepared,
			ActorRole::Restaurant,
			OrderStatus::PickedUp,
		)
		.unwrap();
		assert_eq!(effect, AgentEffect::None);
	}

	#[test]
	fn delivery_frees_the_agent() {
		let effect = OrderLifecycle::validate(
			OrderStatus::OutForDelivery,
			ActorRole::DeliveryAgent,
			OrderStatus::Delivered,
		)
		.unwrap();
		assert_eq!(effect, AgentEffect::FinishDelivery);
		assert_eq!(
			effect.apply(AvailabilityStatus::InDelivery),
			Some(AvailabilityStatus::Available)
		);
		assert_eq!(effect.apply(AvailabilityStatus::Offline), None);
	}

	#[test]
	fn none_effect_never_changes_availability() {
		for current in [
			AvailabilityStatus::Available,
			AvailabilityStatus::InDelivery,
			AvailabilityStatus::Offline,
		] {
			assert_eq!(AgentEffect::None.apply(current), None);
		}
	}
}
