//! Main entry point for the tiffin fulfillment service.
//!
//! This binary wires the pluggable storage backends into the fulfillment
//! engine and, once the engine is built, runs a scripted fulfillment round
//! so a configured deployment can be exercised end to end from the command
//! line.

use clap::Parser;
use std::path::PathBuf;
use tiffin_config::Config;
use tiffin_core::{EngineBuilder, FulfillmentEngine};

mod demo;

/// Command-line arguments for the fulfillment service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the fulfillment service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the fulfillment engine with all storage backends
/// 5. Runs one scripted fulfillment round against the engine
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started tiffin service");

	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = build_engine(config)?;
	demo::run(&engine).await?;

	tracing::info!("Stopped tiffin service");
	Ok(())
}

/// Builds the fulfillment engine with every storage backend this binary
/// knows how to wire.
fn build_engine(config: Config) -> Result<FulfillmentEngine, Box<dyn std::error::Error>> {
	let mut builder = EngineBuilder::new(config);
	for (name, factory) in tiffin_storage::get_all_implementations() {
		builder = builder.with_storage_factory(name, factory);
	}
	Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Creates a minimal test configuration for unit testing
	fn create_test_config() -> Config {
		r#"
[service]
id = "tiffin-test"

[storage]
primary = "memory"

[storage.implementations.memory]
"#
		.parse()
		.unwrap()
	}

	#[test]
	fn test_args_default_values() {
		let args = Args {
			config: PathBuf::from("config.toml"),
			log_level: "info".to_string(),
		};

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_build_engine_with_minimal_config() {
		let engine = build_engine(create_test_config());
		assert!(engine.is_ok(), "Failed to build engine: {:?}", engine.err());
		assert_eq!(engine.unwrap().config().service.id, "tiffin-test");
	}

	#[test]
	fn test_build_engine_rejects_unknown_backend() {
		let config: Config = r#"
[service]
id = "tiffin-test"

[storage]
primary = "postgres"

[storage.implementations.postgres]
"#
		.parse()
		.unwrap();

		let result = build_engine(config);
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn test_config_loads_from_file() {
		let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
		let config_path = temp_dir.path().join("test_config.toml");

		let config_content = r#"
[service]
id = "tiffin-file-test"

[storage]
primary = "file"

[storage.implementations.file]
storage_path = "./data/storage"
"#;
		std::fs::write(&config_path, config_content).expect("Failed to write config");

		let config = Config::from_file(&config_path.to_string_lossy())
			.await
			.expect("Failed to load config");
		assert_eq!(config.service.id, "tiffin-file-test");
		assert_eq!(config.storage.primary, "file");
	}

	#[tokio::test]
	async fn test_demo_round_completes_on_memory_backend() {
		let engine = build_engine(create_test_config()).unwrap();
		demo::run(&engine).await.unwrap();
	}
}
