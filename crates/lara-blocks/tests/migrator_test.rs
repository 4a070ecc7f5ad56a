//! Tests for lazy block migrations

use lara_blocks::block::{Props, StoredBlock};
use lara_blocks::engine::BlockEngine;
use lara_blocks::error::MigrationError;
use lara_blocks::migration::MigrationStep;
use lara_blocks::registry::BlockTypeDefinition;
use lara_blocks::settings::BlocksSettings;
use lara_blocks::version::compare_versions;
use rstest::{fixture, rstest};
use serde_json::{Value as JsonValue, json};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn props(value: JsonValue) -> Props {
	value.as_object().cloned().unwrap()
}

fn write(path: &Path, content: &str) {
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(path, content).unwrap();
}

/// A `hero` block directory at 2.0.0 with migrations 1.0.0 -> 1.1.0 -> 2.0.0.
#[fixture]
fn hero_dir() -> TempDir {
	let dir = TempDir::new().unwrap();
	let hero = dir.path().join("hero");
	write(&hero.join("block.json"), r#"{"type":"hero","label":"Hero","version":"2.0.0"}"#);
	write(
		&hero.join("migrations/v1_0_0_to_v1_1_0.json"),
		r#"{"operations":[{"op":"rename","from":"title","to":"text"}]}"#,
	);
	write(
		&hero.join("migrations/v1_1_0_to_v2_0_0.json"),
		r#"{"operations":[
			{"op":"set_default","key":"align","value":"left"},
			{"op":"move_into","keys":["color"],"target":"style"}
		]}"#,
	);
	write(&hero.join("migrations/README.md"), "not a migration");
	dir
}

fn engine_for(dir: &TempDir, strict: bool) -> BlockEngine {
	let settings = BlocksSettings::default()
		.with_blocks_dir(dir.path())
		.with_strict_migrations(strict);
	BlockEngine::builder(settings)
		.without_registered_packages()
		.build()
		.unwrap()
}

#[rstest]
fn test_file_migrations_chain_to_current_version(hero_dir: TempDir) {
	// Arrange
	let engine = engine_for(&hero_dir, false);
	let block = StoredBlock::new("h1", "hero").with_props(props(json!({"title": "Hi", "color": "red"})));

	// Act
	let (migrated, report) = engine.migrate_block_with_report(&block);

	// Assert
	assert_eq!(migrated.version, "2.0.0");
	assert_eq!(
		JsonValue::Object(migrated.props),
		json!({"text": "Hi", "align": "left", "style": {"color": "red"}})
	);
	assert_eq!(report.applied.len(), 2);
	assert!(report.is_fully_migrated());
}

#[rstest]
fn test_migration_is_idempotent(hero_dir: TempDir) {
	let engine = engine_for(&hero_dir, false);
	let block = StoredBlock::new("h1", "hero").with_props(props(json!({"title": "Hi"})));

	let once = engine.migrate_block(&block);
	let twice = engine.migrate_block(&once);

	assert_eq!(once, twice);
}

#[rstest]
#[case("1.0.0")]
#[case("1.1.0")]
#[case("2.0.0")]
#[case("3.0.0")]
fn test_migration_never_lowers_version(hero_dir: TempDir, #[case] version: &str) {
	let engine = engine_for(&hero_dir, false);
	let block = StoredBlock::new("h1", "hero").with_version(version);

	let migrated = engine.migrate_block(&block);

	assert_ne!(compare_versions(&migrated.version, version), Ordering::Less);
}

#[rstest]
fn test_failing_step_default_and_strict(hero_dir: TempDir) {
	// Arrange: `style` already holds a string, so move_into fails
	let block = StoredBlock::new("h1", "hero")
		.with_props(props(json!({"title": "Hi", "color": "red", "style": "bold"})));

	// Act
	let (lenient, lenient_report) = engine_for(&hero_dir, false).migrate_block_with_report(&block);
	let (strict, strict_report) = engine_for(&hero_dir, true).migrate_block_with_report(&block);

	// Assert
	assert_eq!(lenient.version, "2.0.0");
	assert_eq!(lenient.props["text"], "Hi");
	assert_eq!(lenient_report.failed.len(), 1);
	assert!(!lenient_report.is_fully_migrated());

	assert_eq!(strict.version, "1.1.0");
	assert_eq!(strict.props["text"], "Hi");
	assert_eq!(strict_report.failed.len(), 1);
}

#[rstest]
fn test_missing_step_is_reported_as_incomplete() {
	// Arrange
	let engine = BlockEngine::builder(BlocksSettings {
		builtin_blocks: false,
		..BlocksSettings::default()
	})
	.without_registered_packages()
	.definition(BlockTypeDefinition::builder("card").version("3.0.0").build())
	.migration(MigrationStep::new("card", "1.0.0", "2.0.0", |p| Ok(p.clone())))
	.build()
	.unwrap();

	// Act
	let (migrated, report) = engine.migrate_block_with_report(&StoredBlock::new("c", "card"));

	// Assert
	assert!(!report.complete);
	assert_eq!(report.applied.len(), 1);
	assert_eq!(migrated.version, "3.0.0");
}

#[rstest]
fn test_backward_step_is_rejected() {
	let engine = BlockEngine::builder(BlocksSettings::default())
		.without_registered_packages()
		.build()
		.unwrap();

	let result = engine.register_migration(MigrationStep::new("card", "2.0.0", "1.0.0", |p| Ok(p.clone())));

	assert!(matches!(result, Err(MigrationError::NotForward { .. })));
}

#[rstest]
fn test_migrate_design_updates_nested_children(hero_dir: TempDir) {
	// Arrange
	let engine = engine_for(&hero_dir, false);
	let mut design = json!({
		"blocks": [
			{"id": "row", "type": "columns", "props": {"children": [
				[{"id": "h1", "type": "hero", "version": "1.0.0", "props": {"title": "Nested"}}],
				[]
			]}},
			{"id": "h2", "type": "hero", "props": {"title": "Top"}, "locked": true}
		]
	});

	// Act
	let pending = engine.blocks_needing_migration(
		&serde_json::from_value::<Vec<StoredBlock>>(design["blocks"].clone()).unwrap(),
	);
	let migrated = engine.migrate_design(&mut design);

	// Assert
	let paths: Vec<_> = pending.iter().map(|p| p.path.as_str()).collect();
	assert_eq!(paths, vec!["0.children.0.0", "1"]);
	assert!(migrated >= 2);
	let nested = &design["blocks"][0]["props"]["children"][0][0];
	assert_eq!(nested["version"], "2.0.0");
	assert_eq!(nested["props"]["text"], "Nested");
	assert_eq!(design["blocks"][1]["locked"], true);
	assert_eq!(design["blocks"][1]["props"]["text"], "Top");
}

#[rstest]
fn test_chain_of_file_migrations_adds_then_renames() {
	// Arrange
	let dir = TempDir::new().unwrap();
	write(&dir.path().join("x/block.json"), r#"{"version":"1.2.0"}"#);
	write(
		&dir.path().join("x/migrations/v1_0_0_to_v1_1_0.json"),
		r#"{"operations":[{"op":"set","key":"b","value":2}]}"#,
	);
	write(
		&dir.path().join("x/migrations/v1_1_0_to_v1_2_0.json"),
		r#"{"operations":[{"op":"rename","from":"a","to":"c"}]}"#,
	);
	let engine = engine_for(&dir, false);
	let block: StoredBlock =
		serde_json::from_value(json!({"id": "x1", "type": "x", "version": "1.0.0", "props": {"a": 1}}))
			.unwrap();

	// Act
	let migrated = engine.migrate_block(&block);

	// Assert
	assert_eq!(migrated.version, "1.2.0");
	assert_eq!(JsonValue::Object(migrated.props), json!({"b": 2, "c": 1}));
}
