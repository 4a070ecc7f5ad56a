//! Block migration steps.
//!
//! A [`MigrationStep`] is one edge `from -> to` in a block type's version
//! graph, carrying a pure transform of the block's props. Steps come from
//! two places:
//!
//! - code: [`MigrationStep::new`] with a closure, usually exported by a
//!   [`crate::package::BlockPackage`];
//! - migration files: `<blocks_dir>/<type>/migrations/v1_0_0_to_v1_1_0.json`,
//!   holding a list of declarative [`PropOperation`]s.
//!
//! # Migration file format
//!
//! ```json
//! {
//!   "operations": [
//!     { "op": "set_default", "key": "align", "value": "left" },
//!     { "op": "rename", "from": "title", "to": "text" },
//!     { "op": "remove", "key": "legacyFlag" },
//!     { "op": "set", "key": "level", "value": 2 },
//!     { "op": "move_into", "keys": ["color", "padding"], "target": "style" }
//!   ]
//! }
//! ```
//!
//! Operations apply in order.

use crate::block::Props;
use crate::error::{MigrationError, MigrationResult};
use crate::version::{compare_versions, parse_migration_stem};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Pure props transform of a migration step.
pub type TransformFn = dyn Fn(&Props) -> MigrationResult<Props> + Send + Sync;

/// A single version-to-version props transform for one block type.
#[derive(Clone)]
pub struct MigrationStep {
	/// Block type the step applies to.
	pub block_type: String,
	/// Source version.
	pub from: String,
	/// Target version.
	pub to: String,
	transform: Arc<TransformFn>,
}

impl MigrationStep {
	/// Creates a step from a transform closure.
	pub fn new<F>(
		block_type: impl Into<String>,
		from: impl Into<String>,
		to: impl Into<String>,
		transform: F,
	) -> Self
	where
		F: Fn(&Props) -> MigrationResult<Props> + Send + Sync + 'static,
	{
		Self {
			block_type: block_type.into(),
			from: from.into(),
			to: to.into(),
			transform: Arc::new(transform),
		}
	}

	/// Creates a step that applies declarative operations in order.
	pub fn from_operations(
		block_type: impl Into<String>,
		from: impl Into<String>,
		to: impl Into<String>,
		operations: Vec<PropOperation>,
	) -> Self {
		let from = from.into();
		let to = to.into();
		let (step_from, step_to) = (from.clone(), to.clone());
		Self::new(block_type, from, to, move |props| {
			let mut next = props.clone();
			for op in &operations {
				op.apply(&mut next).map_err(|message| MigrationError::StepFailed {
					from: step_from.clone(),
					to: step_to.clone(),
					message,
				})?;
			}
			Ok(next)
		})
	}

	/// Runs the transform.
	pub fn apply(&self, props: &Props) -> MigrationResult<Props> {
		(self.transform)(props)
	}

	/// Checks that the step moves the version strictly forward.
	pub fn validate(&self) -> MigrationResult<()> {
		if compare_versions(&self.from, &self.to) != Ordering::Less {
			return Err(MigrationError::NotForward {
				block_type: self.block_type.clone(),
				from: self.from.clone(),
				to: self.to.clone(),
			});
		}
		Ok(())
	}
}

impl fmt::Debug for MigrationStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MigrationStep")
			.field("block_type", &self.block_type)
			.field("from", &self.from)
			.field("to", &self.to)
			.finish_non_exhaustive()
	}
}

/// Declarative props operation used by migration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PropOperation {
	/// Sets a key, overwriting any existing value.
	Set {
		/// Key to set.
		key: String,
		/// New value.
		value: JsonValue,
	},
	/// Sets a key only when it is absent.
	SetDefault {
		/// Key to set.
		key: String,
		/// Default value.
		value: JsonValue,
	},
	/// Renames a key. Absent keys are left alone.
	Rename {
		/// Existing key.
		from: String,
		/// New key.
		to: String,
	},
	/// Removes a key.
	Remove {
		/// Key to remove.
		key: String,
	},
	/// Moves keys into a nested object, creating it when absent.
	MoveInto {
		/// Keys to move.
		keys: Vec<String>,
		/// Key of the nested object.
		target: String,
	},
}

impl PropOperation {
	fn apply(&self, props: &mut Props) -> Result<(), String> {
		match self {
			Self::Set { key, value } => {
				props.insert(key.clone(), value.clone());
			}
			Self::SetDefault { key, value } => {
				if !props.contains_key(key) {
					props.insert(key.clone(), value.clone());
				}
			}
			Self::Rename { from, to } => {
				if let Some(value) = props.remove(from) {
					props.insert(to.clone(), value);
				}
			}
			Self::Remove { key } => {
				props.remove(key);
			}
			Self::MoveInto { keys, target } => {
				let mut nested = match props.remove(target) {
					None => Props::new(),
					Some(JsonValue::Object(map)) => map,
					Some(other) => {
						let message = format!("'{target}' is not an object");
						props.insert(target.clone(), other);
						return Err(message);
					}
				};
				for key in keys {
					if let Some(value) = props.remove(key) {
						nested.insert(key.clone(), value);
					}
				}
				props.insert(target.clone(), JsonValue::Object(nested));
			}
		}
		Ok(())
	}
}

#[derive(Debug, Deserialize)]
struct MigrationFile {
	operations: Vec<PropOperation>,
}

/// Loads a migration file for a block type.
///
/// Returns `Ok(None)` when the file name does not encode a migration
/// (`v{from}_to_v{to}.json`); such files are ignored.
pub fn load_migration_file(block_type: &str, path: &Path) -> MigrationResult<Option<MigrationStep>> {
	if path.extension().and_then(|e| e.to_str()) != Some("json") {
		return Ok(None);
	}
	let Some((from, to)) = path
		.file_stem()
		.and_then(|s| s.to_str())
		.and_then(parse_migration_stem)
	else {
		return Ok(None);
	};

	let invalid = |message: String| MigrationError::InvalidFile {
		path: path.display().to_string(),
		message,
	};

	let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
	let file: MigrationFile = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

	let step = MigrationStep::from_operations(block_type, from, to, file.operations);
	step.validate()?;
	Ok(Some(step))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use tempfile::TempDir;

	fn props(value: JsonValue) -> Props {
		value.as_object().cloned().unwrap()
	}

	fn ops(value: JsonValue) -> Vec<PropOperation> {
		serde_json::from_value(value).unwrap()
	}

	#[rstest]
	#[case(json!([{"op": "set", "key": "b", "value": 2}]), json!({"a": 1, "b": 2}))]
	#[case(json!([{"op": "set_default", "key": "a", "value": 9}]), json!({"a": 1}))]
	#[case(json!([{"op": "set_default", "key": "z", "value": 9}]), json!({"a": 1, "z": 9}))]
	#[case(json!([{"op": "rename", "from": "a", "to": "c"}]), json!({"c": 1}))]
	#[case(json!([{"op": "rename", "from": "missing", "to": "c"}]), json!({"a": 1}))]
	#[case(json!([{"op": "remove", "key": "a"}]), json!({}))]
	#[case(
		json!([{"op": "move_into", "keys": ["a", "missing"], "target": "style"}]),
		json!({"style": {"a": 1}})
	)]
	fn test_operations(#[case] operations: JsonValue, #[case] expected: JsonValue) {
		let step = MigrationStep::from_operations("x", "1.0.0", "1.1.0", ops(operations));

		let out = step.apply(&props(json!({"a": 1}))).unwrap();

		assert_eq!(JsonValue::Object(out), expected);
	}

	#[rstest]
	fn test_operations_apply_in_order() {
		let step = MigrationStep::from_operations(
			"x",
			"1.0.0",
			"1.1.0",
			ops(json!([
				{"op": "rename", "from": "a", "to": "b"},
				{"op": "set_default", "key": "b", "value": 100}
			])),
		);

		let out = step.apply(&props(json!({"a": 1}))).unwrap();
		assert_eq!(out["b"], 1);
	}

	#[rstest]
	fn test_move_into_non_object_fails() {
		let step = MigrationStep::from_operations(
			"x",
			"1.0.0",
			"1.1.0",
			ops(json!([{"op": "move_into", "keys": ["a"], "target": "style"}])),
		);

		let err = step.apply(&props(json!({"a": 1, "style": "red"}))).unwrap_err();

		assert!(matches!(err, MigrationError::StepFailed { .. }));
		assert!(err.to_string().contains("1.0.0 -> 1.1.0"));
	}

	#[rstest]
	#[case("1.0.0", "1.1.0", true)]
	#[case("1.1.0", "1.1.0", false)]
	#[case("2.0.0", "1.1.0", false)]
	fn test_validate_forward(#[case] from: &str, #[case] to: &str, #[case] ok: bool) {
		let step = MigrationStep::new("x", from, to, |p| Ok(p.clone()));
		assert_eq!(step.validate().is_ok(), ok);
	}

	#[rstest]
	fn test_load_migration_file() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("v1_0_0_to_v1_1_0.json");
		fs::write(
			&path,
			r#"{"operations": [{"op": "set", "key": "b", "value": 2}]}"#,
		)
		.unwrap();

		// Act
		let step = load_migration_file("x", &path).unwrap().unwrap();

		// Assert
		assert_eq!(step.block_type, "x");
		assert_eq!(step.from, "1.0.0");
		assert_eq!(step.to, "1.1.0");
		assert_eq!(step.apply(&Props::new()).unwrap()["b"], 2);
	}

	#[rstest]
	#[case("README.json")]
	#[case("v1_0_0_to_v1_1_0.txt")]
	#[case("notes.md")]
	fn test_load_ignores_non_migration_names(#[case] name: &str) {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join(name);
		fs::write(&path, "{}").unwrap();

		assert!(load_migration_file("x", &path).unwrap().is_none());
	}

	#[rstest]
	fn test_load_rejects_malformed_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("v1_0_0_to_v1_1_0.json");
		fs::write(&path, r#"{"operations": [{"op": "explode"}]}"#).unwrap();

		let err = load_migration_file("x", &path).unwrap_err();
		assert!(matches!(err, MigrationError::InvalidFile { .. }));
	}

	#[rstest]
	fn test_load_rejects_backward_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("v2_0_0_to_v1_0_0.json");
		fs::write(&path, r#"{"operations": []}"#).unwrap();

		let err = load_migration_file("x", &path).unwrap_err();
		assert!(matches!(err, MigrationError::NotForward { .. }));
	}
}
