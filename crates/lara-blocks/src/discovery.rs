//! Startup discovery of filesystem blocks.
//!
//! Each configured blocks directory holds one subdirectory per block type:
//!
//! ```text
//! blocks/
//! └── hero/
//!     ├── block.json              definition (type, label, version, ...)
//!     ├── render.html             Tera render template
//!     └── migrations/
//!         ├── v1_0_0_to_v1_1_0.json
//!         └── v1_1_0_to_v2_0_0.json
//! ```
//!
//! Every file is optional. Directories are scanned once, in order; a block
//! type found in a later directory replaces the earlier entry entirely.
//! Files that cannot be read or parsed are logged and skipped.

use crate::migration::{MigrationStep, load_migration_file};
use crate::registry::{BlockTypeDefinition, is_valid_block_type};
use crate::template::TemplateBlock;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Definition file name.
pub const DEFINITION_FILE: &str = "block.json";

/// Render template file name.
pub const TEMPLATE_FILE: &str = "render.html";

/// Migrations subdirectory name.
pub const MIGRATIONS_DIR: &str = "migrations";

/// Everything found for one block type.
#[derive(Debug)]
pub struct DiscoveredBlock {
	/// Block type (the directory name).
	pub block_type: String,
	/// Directory the block was found in.
	pub dir: PathBuf,
	/// Parsed `block.json`, if present and valid.
	pub definition: Option<BlockTypeDefinition>,
	/// Compiled `render.html`, if present and valid.
	pub template: Option<Arc<TemplateBlock>>,
	/// Migration steps, sorted by file name.
	pub migrations: Vec<MigrationStep>,
}

/// Scans blocks directories.
#[derive(Debug, Default)]
pub struct BlockDiscovery;

impl BlockDiscovery {
	/// Scans `dirs` in order and returns the discovered blocks.
	///
	/// Missing directories are skipped. The result keeps first-seen order of
	/// block types.
	pub fn scan<P: AsRef<Path>>(dirs: &[P]) -> IndexMap<String, DiscoveredBlock> {
		let mut found = IndexMap::new();

		for dir in dirs {
			let dir = dir.as_ref();
			let entries = match fs::read_dir(dir) {
				Ok(entries) => entries,
				Err(e) => {
					tracing::debug!(path = %dir.display(), error = %e, "skipping blocks directory");
					continue;
				}
			};

			let mut block_dirs: Vec<PathBuf> = entries
				.filter_map(Result::ok)
				.map(|entry| entry.path())
				.filter(|path| path.is_dir())
				.collect();
			block_dirs.sort();

			for block_dir in block_dirs {
				let Some(name) = block_dir.file_name().and_then(|n| n.to_str()) else {
					continue;
				};
				if !is_valid_block_type(name) {
					tracing::debug!(path = %block_dir.display(), "directory name is not a block type, skipping");
					continue;
				}

				let block = Self::scan_block(name, &block_dir);
				if found.contains_key(name) {
					tracing::debug!(block_type = %name, path = %block_dir.display(), "block overridden by later directory");
				}
				found.insert(name.to_string(), block);
			}
		}

		tracing::debug!(count = found.len(), "block discovery finished");
		found
	}

	/// Scans a single block directory.
	pub fn scan_block(block_type: &str, dir: &Path) -> DiscoveredBlock {
		DiscoveredBlock {
			block_type: block_type.to_string(),
			dir: dir.to_path_buf(),
			definition: Self::load_definition(block_type, &dir.join(DEFINITION_FILE)),
			template: Self::load_template(block_type, &dir.join(TEMPLATE_FILE)),
			migrations: Self::load_migrations(block_type, &dir.join(MIGRATIONS_DIR)),
		}
	}

	fn load_definition(block_type: &str, path: &Path) -> Option<BlockTypeDefinition> {
		if !path.is_file() {
			return None;
		}

		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "cannot read block definition");
				return None;
			}
		};
		let mut value: JsonValue = match serde_json::from_str(&content) {
			Ok(value) => value,
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "invalid block definition JSON");
				return None;
			}
		};

		// The directory name is the type unless the file names one itself
		if let Some(obj) = value.as_object_mut() {
			match obj.get("type").and_then(JsonValue::as_str) {
				None => {
					obj.insert("type".to_string(), JsonValue::from(block_type));
				}
				Some(declared) if declared != block_type => {
					tracing::warn!(
						path = %path.display(),
						block_type = %block_type,
						declared = %declared,
						"block definition type does not match its directory"
					);
					return None;
				}
				Some(_) => {}
			}
		}

		match BlockTypeDefinition::from_json(&value).and_then(|def| def.validate().map(|()| def)) {
			Ok(definition) => Some(definition),
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "invalid block definition");
				None
			}
		}
	}

	fn load_template(block_type: &str, path: &Path) -> Option<Arc<TemplateBlock>> {
		if !path.is_file() {
			return None;
		}

		let source = match fs::read_to_string(path) {
			Ok(source) => source,
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "cannot read block template");
				return None;
			}
		};
		match TemplateBlock::from_source(block_type, &source) {
			Ok(template) => Some(Arc::new(template)),
			Err(e) => {
				tracing::warn!(path = %path.display(), error = %e, "invalid block template");
				None
			}
		}
	}

	fn load_migrations(block_type: &str, dir: &Path) -> Vec<MigrationStep> {
		let Ok(entries) = fs::read_dir(dir) else {
			return Vec::new();
		};

		let mut files: Vec<PathBuf> = entries
			.filter_map(Result::ok)
			.map(|entry| entry.path())
			.filter(|path| path.is_file())
			.collect();
		files.sort();

		let mut steps = Vec::new();
		for path in files {
			match load_migration_file(block_type, &path) {
				Ok(Some(step)) => steps.push(step),
				Ok(None) => {
					tracing::debug!(path = %path.display(), "not a migration file, skipping");
				}
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "invalid migration file");
				}
			}
		}
		steps
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::block::Props;
	use crate::context::BlockContext;
	use crate::resolver::RenderBlock;
	use rstest::rstest;
	use tempfile::TempDir;

	fn write(path: &Path, content: &str) {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).unwrap();
		}
		fs::write(path, content).unwrap();
	}

	#[rstest]
	fn test_scan_full_block() {
		// Arrange
		let root = TempDir::new().unwrap();
		let hero = root.path().join("hero");
		write(
			&hero.join(DEFINITION_FILE),
			r#"{"label": "Hero", "version": "1.1.0", "contexts": ["page"]}"#,
		);
		write(&hero.join(TEMPLATE_FILE), "<h1>{{ title }}</h1>");
		write(
			&hero.join("migrations/v1_0_0_to_v1_1_0.json"),
			r#"{"operations": [{"op": "rename", "from": "heading", "to": "title"}]}"#,
		);

		// Act
		let found = BlockDiscovery::scan(&[root.path()]);

		// Assert
		let block = &found["hero"];
		let definition = block.definition.as_ref().unwrap();
		assert_eq!(definition.block_type, "hero");
		assert_eq!(definition.version, "1.1.0");
		assert_eq!(block.migrations.len(), 1);

		let mut props = Props::new();
		props.insert("title".to_string(), "Hi".into());
		let out = block
			.template
			.as_ref()
			.unwrap()
			.render(&props, BlockContext::Page, None)
			.unwrap();
		assert_eq!(out.as_deref(), Some("<h1>Hi</h1>"));
	}

	#[rstest]
	fn test_later_directory_overrides() {
		let base = TempDir::new().unwrap();
		let theme = TempDir::new().unwrap();
		write(&base.path().join("hero/render.html"), "base");
		write(&base.path().join("cta/render.html"), "cta");
		write(&theme.path().join("hero/render.html"), "theme");

		let found = BlockDiscovery::scan(&[base.path(), theme.path()]);

		assert_eq!(found.len(), 2);
		assert!(found["hero"].dir.starts_with(theme.path()));
		assert!(found["cta"].dir.starts_with(base.path()));
	}

	#[rstest]
	fn test_invalid_files_are_skipped() {
		let root = TempDir::new().unwrap();
		let block = root.path().join("broken");
		write(&block.join(DEFINITION_FILE), "{not json");
		write(&block.join(TEMPLATE_FILE), "{% if %}");
		write(&block.join("migrations/v1_0_0_to_v1_1_0.json"), "[]");
		write(&block.join("migrations/notes.txt"), "ignored");

		let found = BlockDiscovery::scan(&[root.path()]);

		let block = &found["broken"];
		assert!(block.definition.is_none());
		assert!(block.template.is_none());
		assert!(block.migrations.is_empty());
	}

	#[rstest]
	fn test_mismatched_definition_type_is_skipped() {
		let root = TempDir::new().unwrap();
		write(&root.path().join("hero/block.json"), r#"{"type": "banner"}"#);

		let found = BlockDiscovery::scan(&[root.path()]);

		assert!(found["hero"].definition.is_none());
	}

	#[rstest]
	fn test_non_block_directories_are_ignored() {
		let root = TempDir::new().unwrap();
		write(&root.path().join("Not_A_Block/render.html"), "x");
		write(&root.path().join("README.md"), "docs");

		let found = BlockDiscovery::scan(&[root.path(), Path::new("/definitely/missing")]);

		assert!(found.is_empty());
	}
}
