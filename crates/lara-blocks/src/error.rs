//! Block system error types.
//!
//! Errors raised while processing stored content are recoverable and are
//! logged rather than returned. The error types here surface only from
//! developer-time operations (registration, settings, discovery setup) and
//! from the individual collaborator boundaries (render callbacks, migration
//! steps), whose failures the orchestrators catch.

use thiserror::Error;

/// Result type for block system operations.
pub type BlockResult<T> = Result<T, BlockError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type returned by render callbacks.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type returned by migration steps.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Top-level block system errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BlockError {
	/// Block type registration failed.
	#[error(transparent)]
	Registry(#[from] RegistryError),

	/// Settings could not be loaded or are invalid.
	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// A migration could not be registered.
	#[error(transparent)]
	Migration(#[from] MigrationError),
}

/// Block type registration errors.
///
/// These are programming mistakes and are raised to the caller of
/// `register` instead of being logged.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
	/// Block type identifier does not match `^[a-z][a-z0-9-]*$`.
	#[error("invalid block type '{0}': must match ^[a-z][a-z0-9-]*$")]
	InvalidType(String),

	/// The `contexts` field is missing, empty or not a list of known contexts.
	#[error("invalid contexts for block type '{block_type}': {reason}")]
	InvalidContexts {
		/// Block type being registered.
		block_type: String,
		/// What is wrong with the contexts.
		reason: String,
	},

	/// The `defaultProps` field is not a JSON object.
	#[error("invalid default props for block type '{0}': must be an object")]
	InvalidDefaultProps(String),

	/// The `supports` field is not an object of booleans.
	#[error("invalid supports for block type '{0}': must be an object of booleans")]
	InvalidSupports(String),

	/// The definition itself is not a JSON object or lacks required fields.
	#[error("invalid block definition: {0}")]
	InvalidDefinition(String),
}

/// Errors raised by a render callback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
	/// A required prop is missing or has the wrong shape.
	#[error("invalid prop '{prop}': {reason}")]
	InvalidProp {
		/// Property name.
		prop: String,
		/// What is wrong with it.
		reason: String,
	},

	/// Template rendering failed.
	#[error("template error: {0}")]
	Template(String),

	/// Generic render failure with a custom message.
	#[error("{0}")]
	Custom(String),
}

impl From<tera::Error> for RenderError {
	fn from(err: tera::Error) -> Self {
		// Tera hides the useful part of the message in the source chain
		let mut message = err.to_string();
		let mut source = std::error::Error::source(&err);
		while let Some(cause) = source {
			message.push_str(": ");
			message.push_str(&cause.to_string());
			source = cause.source();
		}
		Self::Template(message)
	}
}

/// Errors raised by migration steps or while loading migration files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MigrationError {
	/// A transform could not be applied to the given props.
	#[error("migration {from} -> {to} failed: {message}")]
	StepFailed {
		/// Source version.
		from: String,
		/// Target version.
		to: String,
		/// Failure message.
		message: String,
	},

	/// A migration file could not be parsed.
	#[error("invalid migration file {path}: {message}")]
	InvalidFile {
		/// File path.
		path: String,
		/// Parse error message.
		message: String,
	},

	/// A migration does not move the version forward.
	#[error("migration for '{block_type}' must move forward: {from} -> {to}")]
	NotForward {
		/// Block type.
		block_type: String,
		/// Source version.
		from: String,
		/// Target version.
		to: String,
	},

	/// Generic migration error with a custom message.
	#[error("{0}")]
	Custom(String),
}

/// Settings loading errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
	/// TOML parsing error.
	#[error("TOML parse error: {0}")]
	TomlParse(String),

	/// Settings file could not be read.
	#[error("failed to read settings file {path}: {source}")]
	Read {
		/// File path.
		path: String,
		/// Underlying IO error.
		#[source]
		source: std::io::Error,
	},

	/// A setting has an invalid value.
	#[error("invalid setting '{key}': {reason}")]
	InvalidValue {
		/// Setting key.
		key: String,
		/// Why the value is invalid.
		reason: String,
	},
}

impl From<toml::de::Error> for SettingsError {
	fn from(err: toml::de::Error) -> Self {
		Self::TomlParse(err.to_string())
	}
}
