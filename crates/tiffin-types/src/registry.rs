//! Registry trait for self-registering implementations.
//!
//! Pluggable backends (currently storage) register themselves under the name
//! used in configuration files together with a factory function, so the
//! service binary can wire implementations without knowing them up front.

/// Base trait for implementation registries.
///
/// Each backend module provides a `Registry` struct implementing this trait,
/// declaring the configuration name the backend answers to and the factory
/// that builds it.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "memory" for `storage.primary = "memory"`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory function for this implementation.
	fn factory() -> Self::Factory;
}
