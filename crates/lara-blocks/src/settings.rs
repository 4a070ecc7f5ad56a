//! Block system settings.
//!
//! Settings are read from TOML. Every field has a default, so an empty
//! file is valid:
//!
//! ```toml
//! blocks_dirs = ["resources/blocks", "themes/acme/blocks"]
//! default_context = "page"
//! builtin_blocks = true
//!
//! [migrations]
//! strict = false
//!
//! [time_to_read]
//! words_per_minute = 200
//! ```

use crate::context::BlockContext;
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default reading speed of the `time-to-read` block.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Top-level block settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlocksSettings {
	/// Directories scanned for filesystem blocks, in override order.
	pub blocks_dirs: Vec<PathBuf>,

	/// Context used when a caller does not name one.
	pub default_context: BlockContext,

	/// Whether the built-in block types are registered.
	pub builtin_blocks: bool,

	/// Migration behaviour.
	pub migrations: MigrationSettings,

	/// `time-to-read` block defaults.
	pub time_to_read: TimeToReadSettings,
}

impl Default for BlocksSettings {
	fn default() -> Self {
		Self {
			blocks_dirs: Vec::new(),
			default_context: BlockContext::Page,
			builtin_blocks: true,
			migrations: MigrationSettings::default(),
			time_to_read: TimeToReadSettings::default(),
		}
	}
}

/// Migration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationSettings {
	/// Stamp migrated blocks with the last version reached instead of the
	/// current version.
	pub strict: bool,
}

/// `time-to-read` settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeToReadSettings {
	/// Reading speed used when a block does not set `wordsPerMinute`.
	pub words_per_minute: u32,
}

impl Default for TimeToReadSettings {
	fn default() -> Self {
		Self {
			words_per_minute: DEFAULT_WORDS_PER_MINUTE,
		}
	}
}

impl BlocksSettings {
	/// Load settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns error if the file cannot be read, parsed, or validated.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
			path: path.display().to_string(),
			source: e,
		})?;

		let mut settings = Self::from_toml_str(&content)?;

		// Relative block directories are relative to the settings file
		if let Some(base) = path.parent() {
			for dir in &mut settings.blocks_dirs {
				if dir.is_relative() {
					*dir = base.join(&*dir);
				}
			}
		}
		Ok(settings)
	}

	/// Parse settings from a TOML string.
	pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(content)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Checks value ranges.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.time_to_read.words_per_minute == 0 {
			return Err(SettingsError::InvalidValue {
				key: "time_to_read.words_per_minute".to_string(),
				reason: "must be greater than zero".to_string(),
			});
		}
		Ok(())
	}

	/// Adds a blocks directory.
	pub fn with_blocks_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.blocks_dirs.push(dir.into());
		self
	}

	/// Sets strict migration stamping.
	pub fn with_strict_migrations(mut self, strict: bool) -> Self {
		self.migrations.strict = strict;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	fn test_empty_document_uses_defaults() {
		let settings = BlocksSettings::from_toml_str("").unwrap();
		assert_eq!(settings, BlocksSettings::default());
		assert!(settings.builtin_blocks);
		assert_eq!(settings.time_to_read.words_per_minute, 200);
	}

	#[rstest]
	fn test_full_document() {
		let settings = BlocksSettings::from_toml_str(
			r#"
blocks_dirs = ["a", "b"]
default_context = "email"
builtin_blocks = false

[migrations]
strict = true

[time_to_read]
words_per_minute = 250
"#,
		)
		.unwrap();

		assert_eq!(settings.blocks_dirs, vec![PathBuf::from("a"), PathBuf::from("b")]);
		assert_eq!(settings.default_context, BlockContext::Email);
		assert!(!settings.builtin_blocks);
		assert!(settings.migrations.strict);
		assert_eq!(settings.time_to_read.words_per_minute, 250);
	}

	#[rstest]
	#[case("default_context = \"print\"")]
	#[case("unknown_key = 1")]
	#[case("[time_to_read]\nwords_per_minute = -5")]
	#[case("blocks_dirs = ")]
	fn test_parse_errors(#[case] content: &str) {
		assert!(matches!(
			BlocksSettings::from_toml_str(content),
			Err(SettingsError::TomlParse(_))
		));
	}

	#[rstest]
	fn test_zero_words_per_minute_is_rejected() {
		let err = BlocksSettings::from_toml_str("[time_to_read]\nwords_per_minute = 0").unwrap_err();
		assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "time_to_read.words_per_minute"));
	}

	#[rstest]
	fn test_from_file_resolves_relative_dirs() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("blocks.toml");
		std::fs::write(&path, "blocks_dirs = [\"blocks\", \"/abs/blocks\"]").unwrap();

		// Act
		let settings = BlocksSettings::from_file(&path).unwrap();

		// Assert
		assert_eq!(settings.blocks_dirs[0], dir.path().join("blocks"));
		assert_eq!(settings.blocks_dirs[1], PathBuf::from("/abs/blocks"));
	}

	#[rstest]
	fn test_from_file_missing() {
		let err = BlocksSettings::from_file("/definitely/missing/blocks.toml").unwrap_err();
		assert!(matches!(err, SettingsError::Read { .. }));
	}
}
