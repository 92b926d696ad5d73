//! Configuration module for the tiffin fulfillment system.
//!
//! This module provides structures and utilities for managing service configuration.
//! It supports loading configuration from TOML files and provides validation to ensure
//! all required configuration values are properly set. Values may reference environment
//! variables with `${VAR}` or `${VAR:-default}` placeholders, which are resolved before
//! parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the fulfillment service.
///
/// This structure contains all configuration sections required for the service
/// to operate: the service identity and the storage backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	#[serde(default = "default_service_id")]
	pub id: String,
}

/// Returns the default service identifier.
fn default_service_id() -> String {
	"tiffin".to_string()
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	#[serde(default = "default_storage_primary")]
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	/// Each implementation has its own configuration format stored as raw TOML values.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

/// Returns the default storage implementation name.
///
/// The in-memory backend needs no parameters, so it is the default when a
/// configuration file does not select a backend explicitly.
fn default_storage_primary() -> String {
	"memory".to_string()
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS attacks
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// This method performs validation across all configuration sections:
	/// - Ensures the service ID is not empty
	/// - Validates that a primary storage backend is specified
	/// - Checks that the primary backend has a configuration entry when any
	///   backend-specific configuration is present
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self.storage.implementations.is_empty()
			&& !self
				.storage
				.implementations
				.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// This allows configuration to be parsed from TOML strings using the standard
/// string parsing interface. Environment variables are resolved and the
/// configuration is automatically validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_env_var_resolution() {
		// Set up test environment variables
		std::env::set_var("TIFFIN_TEST_HOST", "localhost");
		std::env::set_var("TIFFIN_TEST_PORT", "5432");

		let input = "host = \"${TIFFIN_TEST_HOST}:${TIFFIN_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		// Clean up
		std::env::remove_var("TIFFIN_TEST_HOST");
		std::env::remove_var("TIFFIN_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${TIFFIN_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${TIFFIN_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("TIFFIN_MISSING_VAR"));
	}

	#[test]
	fn test_parse_minimal_config() {
		let config_str = r#"
[service]
id = "tiffin-test"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.service.id, "tiffin-test");
		assert_eq!(config.storage.primary, "memory");
		assert!(config.storage.implementations.contains_key("memory"));
	}

	#[test]
	fn test_defaults_applied() {
		let config_str = r#"
[service]

[storage]
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.service.id, "tiffin");
		assert_eq!(config.storage.primary, "memory");
		assert!(config.storage.implementations.is_empty());
	}

	#[test]
	fn test_unknown_primary_rejected() {
		let config_str = r#"
[service]
id = "tiffin-test"

[storage]
primary = "file"
[storage.implementations.memory]
"#;

		let result: Result<Config, ConfigError> = config_str.parse();
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Primary storage 'file' not found"));
	}

	#[test]
	fn test_empty_service_id_rejected() {
		let config_str = r#"
[service]
id = ""

[storage]
primary = "memory"
"#;

		let result: Result<Config, ConfigError> = config_str.parse();
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn test_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");

		let config_str = r#"
[service]
id = "${TIFFIN_FILE_TEST_ID:-from-file}"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;
		std::fs::write(&path, config_str).unwrap();

		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();
		assert_eq!(config.service.id, "from-file");
	}
}
