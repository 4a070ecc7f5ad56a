//! Tera-backed render callbacks.
//!
//! A `render.html` file found next to a block's `block.json` becomes a
//! [`TemplateBlock`]. The template is compiled once, when it is loaded, and
//! rendered with the block's props as top-level variables plus:
//!
//! - `context`: `"email"`, `"page"` or `"campaign"`
//! - `block_id`: the marker's instance id, or an empty string
//!
//! Autoescaping is on, so prop values are HTML-escaped unless a template
//! opts out with `| safe`. A template that renders only whitespace declines
//! to render, leaving the marker as-is.

use crate::block::Props;
use crate::context::BlockContext;
use crate::error::{RenderError, RenderResult};
use crate::resolver::RenderBlock;
use serde_json::Value as JsonValue;
use std::fmt;
use tera::{Context, Tera};

/// A block render callback backed by a single Tera template.
pub struct TemplateBlock {
	name: String,
	tera: Tera,
}

impl TemplateBlock {
	/// Compiles a template for a block type.
	///
	/// The block type becomes part of the template name so Tera error
	/// messages identify the block.
	pub fn from_source(block_type: &str, source: &str) -> RenderResult<Self> {
		let name = format!("{block_type}/render.html");
		let mut tera = Tera::default();
		tera.add_raw_template(&name, source)?;
		Ok(Self { name, tera })
	}

	/// Template name (`<type>/render.html`).
	pub fn name(&self) -> &str {
		&self.name
	}

	fn build_context(props: &Props, context: BlockContext, block_id: Option<&str>) -> Context {
		let mut vars = props.clone();
		vars.insert("context".to_string(), JsonValue::from(context.as_str()));
		vars.insert(
			"block_id".to_string(),
			JsonValue::from(block_id.unwrap_or_default()),
		);
		// A JSON object always converts
		Context::from_value(JsonValue::Object(vars)).unwrap_or_default()
	}
}

impl RenderBlock for TemplateBlock {
	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let ctx = Self::build_context(props, context, block_id);
		let output = self
			.tera
			.render(&self.name, &ctx)
			.map_err(RenderError::from)?;

		if output.trim().is_empty() {
			return Ok(None);
		}
		Ok(Some(output))
	}
}

impl fmt::Debug for TemplateBlock {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateBlock").field("name", &self.name).finish()
	}
}
