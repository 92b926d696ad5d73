//! File-based storage backend implementation for the fulfillment system.
//!
//! This module stores each record as one JSON file under a per-namespace
//! directory, providing simple persistence without external dependencies.
//! Individual writes go through a temp-file-then-rename sequence; batches
//! additionally take a store-wide write guard so no in-process reader
//! observes a partially applied batch.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry, WriteOp};
use async_trait::async_trait;
use std::path::PathBuf;
use tiffin_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use tokio::fs;
use tokio::sync::RwLock;

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory; each namespace gets a subdirectory of it.
	base_path: PathBuf,
	/// Guards batch application against concurrent readers and writers.
	guard: RwLock<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at the given path.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			guard: RwLock::new(()),
		}
	}

	/// Splits a `"namespace:id"` composite key into its parts.
	fn split_key(key: &str) -> Result<(&str, &str), StorageError> {
		key.split_once(':')
			.ok_or_else(|| StorageError::Backend(format!("malformed key: {}", key)))
	}

	/// Converts a storage key to a filesystem-safe file path.
	fn record_path(&self, key: &str) -> Result<PathBuf, StorageError> {
		let (namespace, id) = Self::split_key(key)?;
		// Sanitize the id so it cannot escape the namespace directory.
		let safe_id = id.replace(['/', ':', '\\'], "_");
		Ok(self
			.base_path
			.join(namespace)
			.join(format!("{}.json", safe_id)))
	}

	/// Writes a value via a temp file and rename.
	async fn write_record(&self, path: &PathBuf, value: &[u8]) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		Ok(())
	}

	async fn remove_record(&self, path: &PathBuf) -> Result<(), StorageError> {
		match fs::remove_file(path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let _read = self.guard.read().await;
		let path = self.record_path(key)?;

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let _read = self.guard.read().await;
		let path = self.record_path(key)?;
		self.write_record(&path, &value).await
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let _read = self.guard.read().await;
		let path = self.record_path(key)?;
		self.remove_record(&path).await
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let _read = self.guard.read().await;
		let path = self.record_path(key)?;
		fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn list_keys(&self, namespace: &str) -> Result<Vec<String>, StorageError> {
		let _read = self.guard.read().await;
		let dir = self.base_path.join(namespace);

		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut ids = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() == Some(std::ffi::OsStr::new("json")) {
				match path.file_stem().and_then(|s| s.to_str()) {
					Some(stem) => ids.push(stem.to_string()),
					None => {
						tracing::debug!("Skipping file {:?}: name is not valid UTF-8", path);
					},
				}
			}
		}
		Ok(ids)
	}

	async fn apply(&self, batch: Vec<WriteOp>) -> Result<(), StorageError> {
		let _write = self.guard.write().await;

		// Resolve paths and validate deletes before touching anything so a
		// failing batch applies nothing.
		let mut resolved = Vec::with_capacity(batch.len());
		for op in batch {
			match op {
				WriteOp::Put { key, value } => {
					let path = self.record_path(&key)?;
					resolved.push((path, Some(value)));
				},
				WriteOp::Delete { key } => {
					let path = self.record_path(&key)?;
					let present = fs::try_exists(&path)
						.await
						.map_err(|e| StorageError::Backend(e.to_string()))?;
					if !present {
						return Err(StorageError::NotFound);
					}
					resolved.push((path, None));
				},
			}
		}

		for (path, value) in resolved {
			match value {
				Some(bytes) => self.write_record(&path, &bytes).await?,
				None => self.remove_record(&path).await?,
			}
		}
		Ok(())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(s) if !s.is_empty() => Ok(()),
						_ => Err("storage_path must not be empty".to_string()),
					}
				}),
			],
			vec![],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for the per-namespace record files
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| StorageError::Configuration("storage_path is required".to_string()))?;

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry entry for the file backend.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
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
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		let key = "orders:test_key";
		let value = b"test_value".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_values_survive_reopen() {
		let dir = tempfile::tempdir().unwrap();
		{
			let storage = FileStorage::new(dir.path().to_path_buf());
			storage
				.set_bytes("carts:c1", b"persisted".to_vec())
				.await
				.unwrap();
		}

		let reopened = FileStorage::new(dir.path().to_path_buf());
		let value = reopened.get_bytes("carts:c1").await.unwrap();
		assert_eq!(value, b"persisted".to_vec());
	}

	#[tokio::test]
	async fn test_delete_missing_key_fails() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());
		assert!(matches!(
			storage.delete("orders:absent").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_list_keys_reads_namespace_directory() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

		storage.set_bytes("orders:a", b"1".to_vec()).await.unwrap();
		storage.set_bytes("orders:b", b"2".to_vec()).await.unwrap();
		storage.set_bytes("carts:c", b"3".to_vec()).await.unwrap();

		let mut ids = storage.list_keys("orders").await.unwrap();
		ids.sort();
		assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
		assert!(storage.list_keys("assignments").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_failing_batch_applies_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().to_path_buf());

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

	#[tokio::test]
	async fn test_missing_storage_path_is_rejected() {
		let config: toml::Value = "other = 1".parse().unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));
	}
}
