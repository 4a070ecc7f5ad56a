//! Tests for block packages submitted at compile time

use lara_blocks::prelude::*;
use lara_blocks::package::registered_packages;
use rstest::rstest;

struct PullQuote;

impl BlockPackage for PullQuote {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder("pull-quote")
			.label("Pull quote")
			.category("text")
			.build()
	}

	fn render(
		&self,
		props: &Props,
		_context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let text = props.get("text").and_then(|v| v.as_str()).unwrap_or_default();
		Ok(Some(format!("<blockquote>{text}</blockquote>")))
	}
}

fn pull_quote() -> Box<dyn BlockPackage> {
	Box::new(PullQuote)
}

register_block_package!("pull-quote", pull_quote);

fn bare() -> BlocksSettings {
	BlocksSettings {
		builtin_blocks: false,
		..BlocksSettings::default()
	}
}

#[rstest]
fn test_submitted_package_is_collected() {
	assert!(registered_packages().any(|r| r.name == "pull-quote"));
}

#[rstest]
fn test_engine_installs_submitted_packages() {
	// Arrange
	let engine = BlockEngine::new(bare()).unwrap();

	// Act
	let html = engine.process_content(
		r#"<div data-lara-block="pull-quote" data-props='{"text":"Less is more"}'></div>"#,
		BlockContext::Page,
	);

	// Assert
	assert!(engine.registry().has("pull-quote"));
	assert_eq!(html, "<blockquote>Less is more</blockquote>");
}

#[rstest]
fn test_submitted_packages_can_be_skipped() {
	let engine = BlockEngine::builder(bare())
		.without_registered_packages()
		.build()
		.unwrap();

	assert!(!engine.registry().has("pull-quote"));
}
