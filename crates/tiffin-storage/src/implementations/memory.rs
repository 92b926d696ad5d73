//! In-memory storage backend implementation for the fulfillment system.
//!
//! This module provides a memory-based implementation of the StorageInterface
//! trait, useful for testing and development scenarios where persistence is
//! not required.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry, WriteOp};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tiffin_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use tokio::sync::RwLock;

/// In-memory storage implementation.
///
/// This implementation stores data in a HashMap in memory, providing fast
/// access but no persistence across restarts. Batches are applied under a
/// single write guard, so readers only ever observe the state before or
/// after a whole batch.
pub struct MemoryStorage {
	/// The in-memory store protected by a read-write lock.
	store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		match store.remove(key) {
			Some(_) => Ok(()),
			None => Err(StorageError::NotFound),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}

	async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let prefix = format!("{}:", namespace);
		let store = self.store.read().await;
		Ok(store
			.keys()
			.filter_map(|key| key.strip_prefix(&prefix))
			.map(|id| id.to_string())
			.collect())
	}

	async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;

		// Validate before mutating so a failing batch applies nothing.
		for op in &batch {
			if let WriteOp::Delete { key } = op {
				if !store.contains_key(key) {
					return Err(StorageError::NotFound);
				}
			}
		}

		for op in batch {
			match op {
				WriteOp::Put { key, value } => {
					store.insert(key, value);
				},
				WriteOp::Delete { key } => {
					store.remove(&key);
				},
			}
		}
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - None required for memory storage
pub fn create_storage(_config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry entry for the memory backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		// Test set and get
		let key = "orders:test_key";
		let value = b"test_value".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value);

		// Test exists
		assert!(storage.exists(key).await.unwrap());

		// Test delete
		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());

		// Test get after delete
		let result = storage.get_bytes(key).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_overwrite() {
		let storage = MemoryStorage::new();

		let key = "orders:overwrite_key";
		let value1 = b"value1".to_vec();
		let value2 = b"value2".to_vec();

		// Set initial value
		storage.set_bytes(key, value1.clone()).await.unwrap();
		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value1);

		// Overwrite with new value
		storage.set_bytes(key, value2.clone()).await.unwrap();
		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value2);
	}

	#[tokio::test]
	async fn test_delete_missing_key_fails() {
		let storage = MemoryStorage::new();
		let result = storage.delete("orders:absent").await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_list_keys_filters_by_namespace() {
		let storage = MemoryStorage::new();
		storage.set_bytes("orders:a", b"1".to_vec()).await.unwrap();
		storage.set_bytes("orders:b", b"2".to_vec()).await.unwrap();
		storage.set_bytes("carts:c", b"3".to_vec()).await.unwrap();

		let mut ids = storage.list_keys("orders").await.unwrap();
		ids.sort();
		assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
	}

	#[tokio::test]
	async fn test_batch_applies_atomically() {
		let storage = MemoryStorage::new();
		storage
			.set_bytes("carts:c1", b"cart".to_vec())
			.await
			.unwrap();

		let batch = vec![
			WriteOp::Put {
				key: "orders:o1".to_string(),
				value: b"order".to_vec(),
			},
			WriteOp::Delete {
				key: "carts:c1".to_string(),
			},
		];
		storage.apply(batch).await.unwrap();

		assert!(storage.exists("orders:o1").await.unwrap());
		assert!(!storage.exists("carts:c1").await.unwrap());
	}

	#[tokio::test]
	async fn test_failing_batch_applies_nothing() {
		let storage = MemoryStorage::new();

		let batch = vec![
			WriteOp::Put {
				key: "orders:o1".to_string(),
				value: b"order".to_vec(),
			},
			WriteOp::Delete {
				key: "carts:missing".to_string(),
			},
		];
		let result = storage.apply(batch).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
		assert!(!storage.exists("orders:o1").await.unwrap());
	}
}
