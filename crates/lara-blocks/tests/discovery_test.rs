//! Tests for filesystem block directories wired through the engine

use lara_blocks::context::BlockContext;
use lara_blocks::engine::BlockEngine;
use lara_blocks::settings::BlocksSettings;
use rstest::rstest;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(path, content).unwrap();
}

fn bare() -> BlocksSettings {
	BlocksSettings {
		builtin_blocks: false,
		..BlocksSettings::default()
	}
}

fn build(settings: BlocksSettings) -> BlockEngine {
	BlockEngine::builder(settings)
		.without_registered_packages()
		.build()
		.unwrap()
}

#[rstest]
fn test_template_block_renders_from_directory() {
	// Arrange
	let dir = TempDir::new().unwrap();
	write(
		&dir.path().join("callout/block.json"),
		r#"{"label":"Callout","category":"layout","version":"1.2.0"}"#,
	);
	write(
		&dir.path().join("callout/render.html"),
		r#"<aside class="callout callout-{{ context }}" id="{{ block_id }}">{{ text }}</aside>"#,
	);
	let engine = build(bare().with_blocks_dir(dir.path()));

	// Act
	let html = engine.process_content(
		r#"<div data-lara-block="callout" data-block-id="c1" data-props='{"text":"a < b"}'></div>"#,
		BlockContext::Email,
	);

	// Assert
	assert_eq!(html, r#"<aside class="callout callout-email" id="c1">a &lt; b</aside>"#);
	let definition = engine.registry().get("callout").unwrap();
	assert_eq!(definition.label, "Callout");
	assert_eq!(definition.category, "layout");
	assert_eq!(engine.migrator().current_version("callout"), "1.2.0");
}

#[rstest]
fn test_later_directory_overrides_earlier() {
	// Arrange
	let base = TempDir::new().unwrap();
	let theme = TempDir::new().unwrap();
	write(&base.path().join("card/render.html"), "<div>base</div>");
	write(&base.path().join("note/render.html"), "<div>note</div>");
	write(&theme.path().join("card/render.html"), "<div>theme</div>");
	let settings = bare().with_blocks_dir(base.path()).with_blocks_dir(theme.path());

	// Act
	let engine = build(settings);
	let html = engine.process_content(
		r#"<div data-lara-block="card"></div><div data-lara-block="note"></div>"#,
		BlockContext::Page,
	);

	// Assert
	assert_eq!(html, "<div>theme</div><div>note</div>");
}

#[rstest]
fn test_malformed_files_are_skipped() {
	// Arrange
	let dir = TempDir::new().unwrap();
	write(&dir.path().join("broken/block.json"), "{ not json");
	write(&dir.path().join("broken/render.html"), "{% if %}");
	write(&dir.path().join("wrong/block.json"), r#"{"type":"other"}"#);
	write(&dir.path().join("Bad_Name/render.html"), "<p>x</p>");

	// Act
	let engine = build(bare().with_blocks_dir(dir.path()));

	// Assert
	assert!(engine.registry().is_empty());
	let content = r#"<div data-lara-block="broken"></div>"#;
	assert_eq!(engine.process_content(content, BlockContext::Page), content);
}

#[rstest]
fn test_missing_directory_is_ignored() {
	let engine = build(bare().with_blocks_dir("/nonexistent/lara/blocks"));
	assert!(engine.registry().is_empty());
}

#[cfg(feature = "builtin")]
#[rstest]
fn test_theme_template_overrides_builtin_block() {
	// Arrange
	let theme = TempDir::new().unwrap();
	write(
		&theme.path().join("heading/render.html"),
		r#"<h{{ level }} class="acme">{{ text }}</h{{ level }}>"#,
	);
	let settings = BlocksSettings::default().with_blocks_dir(theme.path());

	// Act
	let engine = build(settings);
	let html = engine.process_content(
		r#"<div data-lara-block="heading" data-props='{"text":"Hello","level":3}'></div>"#,
		BlockContext::Page,
	);

	// Assert
	assert_eq!(html, r#"<h3 class="acme">Hello</h3>"#);
	assert_eq!(engine.registry().get("heading").unwrap().label, "Heading");
}

#[rstest]
fn test_settings_file_resolves_relative_dirs() {
	// Arrange
	let root = TempDir::new().unwrap();
	write(&root.path().join("blocks/quote/render.html"), "<q>{{ text }}</q>");
	write(
		&root.path().join("lara.toml"),
		"blocks_dirs = [\"blocks\"]\nbuiltin_blocks = false\n",
	);

	// Act
	let settings = BlocksSettings::from_file(root.path().join("lara.toml")).unwrap();
	let engine = build(settings);

	// Assert
	let html = engine.process_content(
		r#"<div data-lara-block="quote" data-props='{"text":"hi"}'></div>"#,
		BlockContext::Page,
	);
	assert_eq!(html, "<q>hi</q>");
}
