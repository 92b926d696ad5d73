//! Storage module for the tiffin fulfillment system.
//!
//! This crate is the repository capability the domain services build on. It
//! provides a low-level byte-oriented backend trait with pluggable
//! implementations (in-memory, file-based), a typed service with JSON
//! serialization on top of it, all-or-nothing write batches for the
//! cross-entity commits the order lifecycle needs, and the per-aggregate
//! lock registry that serializes read-modify-write sequences.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tiffin_types::{ConfigSchema, ImplementationRegistry};

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub mod locks;

pub use locks::AggregateLocks;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
	/// Create or overwrite the value at `key`.
	Put { key: String, value: Vec<u8> },
	/// Remove the value at `key`. The key must exist; a batch containing a
	/// delete of a missing key fails with `NotFound` before any effect.
	Delete { key: String },
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the fulfillment system. It provides basic key-value
/// operations plus atomic multi-key batches; keys are
/// `"namespace:id"` composites.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, creating or overwriting the key.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	///
	/// Deleting a key that does not exist fails with `NotFound`; callers
	/// rely on that to detect misuse, so it must never be a silent no-op.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists the ids stored under a namespace.
	async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StorageError>;

	/// Applies a batch of writes atomically: either every operation takes
	/// effect or none does, and no concurrent reader observes a partially
	/// applied batch.
	async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
///
/// This trait extends the base ImplementationRegistry to specify that
/// storage implementations must provide a StorageFactory.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations, used by the service binary to register everything it
/// can wire.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// A set of typed writes committed as one atomic unit.
///
/// Values are serialized when added, so a batch that fails to build leaves
/// nothing to roll back. An empty batch commits trivially.
#[derive(Default)]
pub struct StorageBatch {
	ops: Vec<WriteOp>,
}

impl StorageBatch {
	/// Creates an empty batch.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a create-or-overwrite of a serializable value.
	pub fn put<T: Serialize>(
		&mut self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<&mut Self, StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.ops.push(WriteOp::Put {
			key: format!("{}:{}", namespace, id),
			value: bytes,
		});
		Ok(self)
	}

	/// Adds a delete. The key must exist at commit time.
	pub fn delete(&mut self, namespace: &str, id: &str) -> &mut Self {
		self.ops.push(WriteOp::Delete {
			key: format!("{}:{}", namespace, id),
		});
		self
	}

	/// Returns the number of queued operations.
	pub fn len(&self) -> usize {
		self.ops.len()
	}

	/// Returns true when no operations are queued.
	pub fn is_empty(&self) -> bool {
		self.ops.is_empty()
	}

	fn into_ops(self) -> Vec<WriteOp> {
		self.ops
	}
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with
/// automatic JSON serialization/deserialization.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores a serializable value, creating or overwriting it.
	///
	/// The namespace and id are combined to form a unique key.
	/// The data is serialized to JSON before storage.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	///
	/// The namespace and id are combined to form the lookup key.
	/// The retrieved bytes are deserialized from JSON.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes = self.backend.get_bytes(&key).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves every value stored under a namespace.
	///
	/// Entries deleted between the key listing and the read are skipped
	/// rather than failing the whole scan.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let ids = self.backend.list_keys(namespace).await?;
		let mut values = Vec::with_capacity(ids.len());
		for id in ids {
			let key = format!("{}:{}", namespace, id);
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => {
					let value = serde_json::from_slice(&bytes)
						.map_err(|e| StorageError::Serialization(e.to_string()))?;
					values.push(value);
				},
				Err(StorageError::NotFound) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(values)
	}

	/// Removes a value from storage.
	///
	/// The namespace and id are combined to form the key to delete.
	/// Removing a missing key fails with `NotFound`.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		self.backend.delete(&key).await
	}

	/// Updates an existing value in storage.
	///
	/// This method first checks if the key exists, then updates the value.
	/// Returns an error if the key doesn't exist, making it semantically
	/// different from store() which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);

		// Check if the key exists first
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}

		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Checks if a value exists in storage.
	///
	/// The namespace and id are combined to form the lookup key.
	/// Returns true if the key exists, false otherwise.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		let key = format!("{}:{}", namespace, id);
		self.backend.exists(&key).await
	}

	/// Commits a batch of writes as one atomic unit.
	pub async fn commit(&self, batch: StorageBatch) -> Result<(), StorageError> {
		self.backend.apply(batch.into_ops()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use super::implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Record {
		id: String,
		value: i64,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	#[tokio::test]
	async fn store_and_retrieve_typed_value() {
		let storage = service();
		let record = Record {
			id: "a".to_string(),
			value: 7,
		};
		storage.store("orders", "a", &record).await.unwrap();

		let loaded: Record = storage.retrieve("orders", "a").await.unwrap();
		assert_eq!(loaded, record);
	}

	#[tokio::test]
	async fn retrieve_missing_is_not_found() {
		let storage = service();
		let result = storage.retrieve::<Record>("orders", "absent").await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn update_requires_existing_key() {
		let storage = service();
		let record = Record {
			id: "a".to_string(),
			value: 1,
		};
		let result = storage.update("orders", "a", &record).await;
		assert!(matches!(result, Err(StorageError::NotFound)));

		storage.store("orders", "a", &record).await.unwrap();
		let updated = Record {
			id: "a".to_string(),
			value: 2,
		};
		storage.update("orders", "a", &updated).await.unwrap();
		let loaded: Record = storage.retrieve("orders", "a").await.unwrap();
		assert_eq!(loaded.value, 2);
	}

	#[tokio::test]
	async fn remove_missing_key_is_not_found() {
		let storage = service();
		let result = storage.remove("orders", "absent").await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn retrieve_all_scans_one_namespace() {
		let storage = service();
		for (id, value) in [("a", 1), ("b", 2)] {
			let record = Record {
				id: id.to_string(),
				value,
			};
			storage.store("orders", id, &record).await.unwrap();
		}
		storage
			.store(
				"carts",
				"c",
				&Record {
					id: "c".to_string(),
					value: 3,
				},
			)
			.await
			.unwrap();

		let mut orders: Vec<Record> = storage.retrieve_all("orders").await.unwrap();
		orders.sort_by(|a, b| a.id.cmp(&b.id));
		assert_eq!(orders.len(), 2);
		assert_eq!(orders[0].id, "a");
		assert_eq!(orders[1].id, "b");
	}

	#[tokio::test]
	async fn commit_applies_all_writes() {
		let storage = service();
		let existing = Record {
			id: "old".to_string(),
			value: 0,
		};
		storage.store("carts", "old", &existing).await.unwrap();

		let mut batch = StorageBatch::new();
		batch
			.put(
				"orders",
				"new",
				&Record {
					id: "new".to_string(),
					value: 9,
				},
			)
			.unwrap();
		batch.delete("carts", "old");
		storage.commit(batch).await.unwrap();

		assert!(storage.exists("orders", "new").await.unwrap());
		assert!(!storage.exists("carts", "old").await.unwrap());
	}

	#[tokio::test]
	async fn commit_with_missing_delete_applies_nothing() {
		let storage = service();
		let mut batch = StorageBatch::new();
		batch
			.put(
				"orders",
				"new",
				&Record {
					id: "new".to_string(),
					value: 9,
				},
			)
			.unwrap();
		batch.delete("carts", "absent");

		let result = storage.commit(batch).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
		assert!(!storage.exists("orders", "new").await.unwrap());
	}
}
