//! Lazy block schema migration.
//!
//! Stored blocks carry the schema version their props were written for.
//! [`BlockMigrator`] upgrades them on read, one block at a time, by walking
//! the migration steps registered for the block type from the stored
//! version to the type's current version.
//!
//! # Path search
//!
//! Steps are sorted by `from` version. Starting at the stored version, the
//! walk repeatedly takes the first unused step whose `from` equals the
//! current walking version and advances to its `to`. A step is used at most
//! once per path, so cyclic or duplicated step sets terminate. The walk
//! stops when the walking version reaches the target, or when no step
//! continues it (a partial path, still applied).
//!
//! # Stamping
//!
//! By default a migrated block is stamped with the current version even if
//! the path was partial or a step failed, so rendering never waits on
//! missing migrations. With strict mode the block is stamped with the last
//! version actually reached, and the walk stops at the first failing step.

use crate::block::{CHILDREN_KEY, StoredBlock};
use crate::error::MigrationResult;
use crate::migration::MigrationStep;
use crate::registry::BlockRegistry;
use crate::version::{DEFAULT_VERSION, compare_versions, is_older};
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Steps chosen for one `(block type, from, to)` upgrade.
#[derive(Debug, Clone)]
pub struct MigrationPath {
	/// Steps in application order.
	pub steps: Vec<MigrationStep>,
	/// Whether the steps reach the target version.
	pub complete: bool,
	/// Version the walk ended on.
	pub reached: String,
}

/// One step applied or skipped during a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
	/// Source version.
	pub from: String,
	/// Target version.
	pub to: String,
}

/// A step whose transform failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedStep {
	/// Source version.
	pub from: String,
	/// Target version.
	pub to: String,
	/// Error message of the transform.
	pub error: String,
}

/// Outcome of migrating a single block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
	/// Block type.
	pub block_type: String,
	/// Version the block was stored with.
	pub from_version: String,
	/// Version the block was stamped with.
	pub to_version: String,
	/// Steps whose transforms were applied.
	pub applied: Vec<StepRecord>,
	/// Steps whose transforms failed.
	pub failed: Vec<FailedStep>,
	/// Whether the path reached the target version.
	pub complete: bool,
}

impl MigrationReport {
	fn unchanged(block: &StoredBlock) -> Self {
		Self {
			block_type: block.block_type.clone(),
			from_version: block.version.clone(),
			to_version: block.version.clone(),
			applied: Vec::new(),
			failed: Vec::new(),
			complete: true,
		}
	}

	/// Returns true when every step of a complete path was applied.
	pub fn is_fully_migrated(&self) -> bool {
		self.complete && self.failed.is_empty()
	}
}

/// A block found behind its type's current version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMigration {
	/// Location of the block, e.g. `2` or `0.children.1.0`.
	pub path: String,
	/// Block instance id.
	pub id: String,
	/// Block type.
	pub block_type: String,
	/// Stored version.
	pub version: String,
	/// Current version of the type.
	pub current_version: String,
}

type PathKey = (String, String, String);

/// Upgrades stored blocks to their types' current schema versions.
pub struct BlockMigrator {
	registry: Arc<BlockRegistry>,
	steps: RwLock<HashMap<String, Vec<MigrationStep>>>,
	versions: RwLock<HashMap<String, String>>,
	paths: RwLock<HashMap<PathKey, Arc<MigrationPath>>>,
	strict: bool,
}

impl BlockMigrator {
	/// Creates a migrator reading current versions from `registry`.
	pub fn new(registry: Arc<BlockRegistry>) -> Self {
		Self {
			registry,
			steps: RwLock::new(HashMap::new()),
			versions: RwLock::new(HashMap::new()),
			paths: RwLock::new(HashMap::new()),
			strict: false,
		}
	}

	/// Enables or disables strict stamping.
	pub fn with_strict(mut self, strict: bool) -> Self {
		self.strict = strict;
		self
	}

	/// Returns true if strict stamping is enabled.
	pub fn is_strict(&self) -> bool {
		self.strict
	}

	/// Registers a migration step.
	///
	/// Cached paths of the step's block type are dropped.
	pub fn register_migration(&self, step: MigrationStep) -> MigrationResult<()> {
		step.validate()?;
		tracing::debug!(
			block_type = %step.block_type,
			from = %step.from,
			to = %step.to,
			"registered block migration"
		);
		let block_type = step.block_type.clone();
		self.steps
			.write()
			.entry(block_type.clone())
			.or_default()
			.push(step);
		self.paths.write().retain(|(t, _, _), _| *t != block_type);
		Ok(())
	}

	/// Returns the `(from, to)` pairs registered for a type, sorted by `from`.
	pub fn migrations_for(&self, block_type: &str) -> Vec<(String, String)> {
		let mut pairs: Vec<_> = self
			.steps
			.read()
			.get(block_type)
			.map(|steps| {
				steps
					.iter()
					.map(|s| (s.from.clone(), s.to.clone()))
					.collect()
			})
			.unwrap_or_default();
		pairs.sort_by(|a, b| compare_versions(&a.0, &b.0));
		pairs
	}

	/// Returns the current schema version of a type.
	///
	/// Read from the type's registered definition, or `1.0.0` when the type
	/// is unknown. Cached per type until [`Self::clear_cache`].
	pub fn current_version(&self, block_type: &str) -> String {
		if let Some(version) = self.versions.read().get(block_type) {
			return version.clone();
		}
		let version = self
			.registry
			.version_of(block_type)
			.unwrap_or_else(|| DEFAULT_VERSION.to_string());
		self.versions
			.write()
			.insert(block_type.to_string(), version.clone());
		version
	}

	/// Returns true if the block is older than its type's current version.
	pub fn needs_migration(&self, block: &StoredBlock) -> bool {
		is_older(&block.version, &self.current_version(&block.block_type))
	}

	/// Computes (or fetches) the migration path between two versions.
	pub fn find_path(&self, block_type: &str, from: &str, to: &str) -> Arc<MigrationPath> {
		let key = (block_type.to_string(), from.to_string(), to.to_string());
		if let Some(path) = self.paths.read().get(&key) {
			return Arc::clone(path);
		}

		let path = Arc::new(self.search_path(block_type, from, to));
		if !path.complete {
			tracing::warn!(
				block_type = %block_type,
				from = %from,
				to = %to,
				reached = %path.reached,
				"incomplete migration path"
			);
		}
		self.paths.write().insert(key, Arc::clone(&path));
		path
	}

	fn search_path(&self, block_type: &str, from: &str, to: &str) -> MigrationPath {
		let mut candidates = self.steps.read().get(block_type).cloned().unwrap_or_default();
		// Stable, so equal `from` versions keep registration order
		candidates.sort_by(|a, b| compare_versions(&a.from, &b.from));

		let mut used = vec![false; candidates.len()];
		let mut steps = Vec::new();
		let mut current = from.to_string();

		loop {
			if compare_versions(&current, to) != Ordering::Less {
				return MigrationPath {
					steps,
					complete: true,
					reached: current,
				};
			}

			let next = candidates.iter().enumerate().find(|(i, step)| {
				!used[*i] && compare_versions(&step.from, &current) == Ordering::Equal
			});
			let Some((index, step)) = next else {
				return MigrationPath {
					steps,
					complete: false,
					reached: current,
				};
			};

			used[index] = true;
			current = step.to.clone();
			steps.push(step.clone());
		}
	}

	/// Migrates a single block, ignoring nested children.
	///
	/// Blocks already at (or past) the current version are returned as-is.
	pub fn migrate_block(&self, block: &StoredBlock) -> StoredBlock {
		self.migrate_block_with_report(block).0
	}

	/// Migrates a single block and reports what happened.
	pub fn migrate_block_with_report(&self, block: &StoredBlock) -> (StoredBlock, MigrationReport) {
		let target = self.current_version(&block.block_type);
		if !is_older(&block.version, &target) {
			return (block.clone(), MigrationReport::unchanged(block));
		}

		let path = self.find_path(&block.block_type, &block.version, &target);
		let mut props = block.props.clone();
		let mut applied = Vec::new();
		let mut failed = Vec::new();
		let mut reached = block.version.clone();

		for step in &path.steps {
			match step.apply(&props) {
				Ok(next) => {
					props = next;
					reached = step.to.clone();
					applied.push(StepRecord {
						from: step.from.clone(),
						to: step.to.clone(),
					});
				}
				Err(e) => {
					tracing::warn!(
						block_type = %block.block_type,
						block_id = %block.id,
						from = %step.from,
						to = %step.to,
						error = %e,
						"migration step failed, skipping"
					);
					failed.push(FailedStep {
						from: step.from.clone(),
						to: step.to.clone(),
						error: e.to_string(),
					});
					if self.strict {
						break;
					}
				}
			}
		}

		let stamped = if self.strict { reached } else { target };
		let report = MigrationReport {
			block_type: block.block_type.clone(),
			from_version: block.version.clone(),
			to_version: stamped.clone(),
			applied,
			failed,
			complete: path.complete,
		};
		let migrated = StoredBlock {
			version: stamped,
			props,
			..block.clone()
		};
		(migrated, report)
	}

	/// Migrates blocks and, recursively, their nested column children.
	pub fn migrate_blocks(&self, blocks: &[StoredBlock]) -> Vec<StoredBlock> {
		let mut migrated = 0;
		blocks
			.iter()
			.map(|block| self.migrate_tree(block, &mut migrated))
			.collect()
	}

	/// Migrates the `blocks` list of a design document in place.
	///
	/// Entries that are not stored blocks are left untouched, as is every
	/// other field of the document. Returns the number of blocks migrated,
	/// nested children included.
	pub fn migrate_design(&self, design: &mut JsonValue) -> usize {
		let mut migrated = 0;
		if let Some(JsonValue::Array(blocks)) = design.get_mut("blocks") {
			for entry in blocks.iter_mut() {
				self.migrate_value(entry, &mut migrated);
			}
		}
		migrated
	}

	fn migrate_tree(&self, block: &StoredBlock, migrated: &mut usize) -> StoredBlock {
		let mut block = if self.needs_migration(block) {
			*migrated += 1;
			self.migrate_block(block)
		} else {
			block.clone()
		};

		if let Some(JsonValue::Array(columns)) = block.props.get_mut(CHILDREN_KEY) {
			for column in columns.iter_mut() {
				if let JsonValue::Array(children) = column {
					for child in children.iter_mut() {
						self.migrate_value(child, migrated);
					}
				}
			}
		}
		block
	}

	fn migrate_value(&self, value: &mut JsonValue, migrated: &mut usize) {
		let Ok(block) = serde_json::from_value::<StoredBlock>(value.clone()) else {
			return;
		};
		let before = *migrated;
		let next = self.migrate_tree(&block, migrated);
		if *migrated == before {
			return;
		}
		match serde_json::to_value(&next) {
			Ok(updated) => *value = updated,
			Err(e) => {
				tracing::warn!(block_type = %block.block_type, error = %e, "could not serialize migrated block");
			}
		}
	}

	/// Lists blocks behind their type's current version, nested ones included.
	///
	/// Read-only diagnostics; nothing is migrated.
	pub fn blocks_needing_migration(&self, blocks: &[StoredBlock]) -> Vec<PendingMigration> {
		let mut pending = Vec::new();
		for (index, block) in blocks.iter().enumerate() {
			self.collect_pending(block, index.to_string(), &mut pending);
		}
		pending
	}

	fn collect_pending(&self, block: &StoredBlock, path: String, pending: &mut Vec<PendingMigration>) {
		let current = self.current_version(&block.block_type);
		if is_older(&block.version, &current) {
			pending.push(PendingMigration {
				path: path.clone(),
				id: block.id.clone(),
				block_type: block.block_type.clone(),
				version: block.version.clone(),
				current_version: current,
			});
		}

		let Some(JsonValue::Array(columns)) = block.props.get(CHILDREN_KEY) else {
			return;
		};
		for (col, column) in columns.iter().enumerate() {
			let JsonValue::Array(children) = column else {
				continue;
			};
			for (row, child) in children.iter().enumerate() {
				if let Ok(child) = serde_json::from_value::<StoredBlock>(child.clone()) {
					self.collect_pending(&child, format!("{path}.{CHILDREN_KEY}.{col}.{row}"), pending);
				}
			}
		}
	}

	/// Drops cached current versions and paths.
	pub fn clear_cache(&self) {
		self.versions.write().clear();
		self.paths.write().clear();
	}
}

impl fmt::Debug for BlockMigrator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BlockMigrator")
			.field("block_types", &self.steps.read().keys().collect::<Vec<_>>())
			.field("strict", &self.strict)
			.field("cached_paths", &self.paths.read().len())
			.finish()
	}
}
