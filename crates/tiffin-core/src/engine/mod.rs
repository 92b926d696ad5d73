//! Engine assembly.
//!
//! The [`EngineBuilder`] turns a parsed configuration plus a set of storage
//! factories into a running [`FulfillmentEngine`]: it creates the primary
//! storage backend, validates the backend's configuration against the schema
//! the backend itself exposes, and wires every fulfillment service on top of
//! one shared storage service and one shared lock registry.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tiffin_cart::CartService;
use tiffin_config::Config;
use tiffin_directory::DirectoryService;
use tiffin_dispatch::DispatchService;
use tiffin_order::OrderService;
use tiffin_storage::{AggregateLocks, StorageFactory, StorageService};
use tracing::info;

use crate::state::StatusMachine;

/// Errors that can occur while assembling the engine.
#[derive(Debug, Error)]
pub enum EngineError {
	/// Error that occurs during engine configuration.
	#[error("Configuration error: {0}")]
	Config(String),
	/// Error that occurs while creating the storage backend.
	#[error("Storage error: {0}")]
	Storage(String),
}

/// The assembled fulfillment core.
///
/// Owns one service instance per concern, all sharing the same storage
/// service and lock registry so cross-service invariants (the dispatch and
/// transition lock ordering in particular) hold process-wide.
pub struct FulfillmentEngine {
	config: Config,
	storage: Arc<StorageService>,
	directory: Arc<DirectoryService>,
	carts: Arc<CartService>,
	orders: Arc<OrderService>,
	dispatch: Arc<DispatchService>,
	lifecycle: Arc<StatusMachine>,
}

impl std::fmt::Debug for FulfillmentEngine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FulfillmentEngine")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

impl FulfillmentEngine {
	/// The configuration the engine was built from.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The shared typed storage service.
	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	/// Registration and lookup of customers, restaurants, agents and menus.
	pub fn directory(&self) -> &Arc<DirectoryService> {
		&self.directory
	}

	/// Cart reads and mutations.
	pub fn carts(&self) -> &Arc<CartService> {
		&self.carts
	}

	/// Order placement and order views.
	pub fn orders(&self) -> &Arc<OrderService> {
		&self.orders
	}

	/// Delivery assignment and agent availability.
	pub fn dispatch(&self) -> &Arc<DispatchService> {
		&self.dispatch
	}

	/// Role-checked order status transitions.
	pub fn lifecycle(&self) -> &Arc<StatusMachine> {
		&self.lifecycle
	}
}

/// Builder for the fulfillment engine.
pub struct EngineBuilder {
	config: Config,
	storage_factories: HashMap<String, StorageFactory>,
}

impl EngineBuilder {
	/// Creates a builder from a parsed configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			storage_factories: HashMap::new(),
		}
	}

	/// Registers a storage backend factory under its implementation name.
	pub fn with_storage_factory(mut self, name: &str, factory: StorageFactory) -> Self {
		self.storage_factories.insert(name.to_string(), factory);
		self
	}

	/// Builds the engine.
	///
	/// Creates the configured primary storage backend, validates its
	/// configuration against the schema the backend exposes, and wires the
	/// services. Fails when the primary names an unregistered implementation
	/// or the backend rejects its configuration.
	pub fn build(self) -> Result<FulfillmentEngine, EngineError> {
		let primary = self.config.storage.primary.clone();
		let factory = self.storage_factories.get(&primary).ok_or_else(|| {
			EngineError::Config(format!("Unknown storage backend: {}", primary))
		})?;

		let backend_config = self
			.config
			.storage
			.implementations
			.get(&primary)
			.cloned()
			.unwrap_or_else(|| toml::Value::Table(toml::map::Map::new()));

		let backend = factory(&backend_config).map_err(|e| {
			EngineError::Storage(format!(
				"Failed to create storage backend '{}': {}",
				primary, e
			))
		})?;
		backend.config_schema().validate(&backend_config).map_err(|e| {
			EngineError::Config(format!(
				"Invalid configuration for storage backend '{}': {}",
				primary, e
			))
		})?;
		info!(component = "storage", implementation = %primary, "Loaded storage backend");

		let storage = Arc::new(StorageService::new(backend));
		let locks = Arc::new(AggregateLocks::new());
		let directory = Arc::new(DirectoryService::new(storage.clone()));
		let carts = Arc::new(CartService::new(
			storage.clone(),
			directory.clone(),
			locks.clone(),
		));
		let orders = Arc::new(OrderService::new(
			storage.clone(),
			directory.clone(),
			locks.clone(),
		));
		let dispatch = Arc::new(DispatchService::new(
			storage.clone(),
			directory.clone(),
			locks.clone(),
		));
		let lifecycle = Arc::new(StatusMachine::new(
			storage.clone(),
			directory.clone(),
			locks,
		));

		Ok(FulfillmentEngine {
			config: self.config,
			storage,
			directory,
			carts,
			orders,
			dispatch,
			lifecycle,
		})
	}
}
