//! Content rendering.
//!
//! [`BlockRenderer::process_content`] replaces every block marker in a
//! content buffer with the output of the block's render callback. The pass
//! never fails: a marker without a callback, or whose callback errors or
//! declines, is left exactly as it was.

use crate::block::Props;
use crate::context::BlockContext;
use crate::resolver::BlockRenderCallbackResolver;
use crate::scanner::ContentBlockScanner;
use crate::text::word_count;
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::sync::Arc;

/// Block type that receives the document word count.
pub const TIME_TO_READ_BLOCK: &str = "time-to-read";

/// Block type that renders legacy markdown markers.
pub const MARKDOWN_BLOCK: &str = "markdown";

/// Private prop carrying the document word count.
pub const WORD_COUNT_PROP: &str = "_wordCount";

#[derive(Debug)]
struct Replacement {
	start: usize,
	end: usize,
	html: String,
}

/// Renders block markers embedded in content.
#[derive(Debug)]
pub struct BlockRenderer {
	resolver: Arc<BlockRenderCallbackResolver>,
	scanner: ContentBlockScanner,
}

impl BlockRenderer {
	/// Creates a renderer resolving callbacks through `resolver`.
	pub fn new(resolver: Arc<BlockRenderCallbackResolver>) -> Self {
		Self {
			resolver,
			scanner: ContentBlockScanner::new(),
		}
	}

	/// Returns the resolver.
	pub fn resolver(&self) -> &Arc<BlockRenderCallbackResolver> {
		&self.resolver
	}

	/// Renders every marker in `content` for `context`.
	///
	/// Content without markers is returned unchanged. Output depends only on
	/// the input and the registered callbacks.
	pub fn process_content(&self, content: &str, context: BlockContext) -> String {
		let content = self.render_legacy_markdown(content, context);

		let markers = self.scanner.markers(&content);
		if markers.is_empty() {
			return content.into_owned();
		}

		let words = markers
			.iter()
			.any(|m| m.block_type == TIME_TO_READ_BLOCK)
			.then(|| word_count(&content));

		let mut replacements = Vec::new();
		for mut marker in markers {
			if marker.block_type == TIME_TO_READ_BLOCK
				&& let Some(words) = words
			{
				marker
					.props
					.insert(WORD_COUNT_PROP.to_string(), JsonValue::from(words));
			}

			let rendered = self.render_block(
				&marker.block_type,
				&marker.props,
				context,
				marker.id.as_deref(),
			);
			if let Some(html) = rendered {
				replacements.push(Replacement {
					start: marker.start,
					end: marker.end(),
					html,
				});
			}
		}

		splice(&content, replacements)
	}

	/// Renders one block through its resolved callback.
	///
	/// Returns `None` when there is no callback or the callback errors or
	/// declines; failures are logged.
	pub fn render_block(
		&self,
		block_type: &str,
		props: &Props,
		context: BlockContext,
		block_id: Option<&str>,
	) -> Option<String> {
		let Some(callback) = self.resolver.resolve(block_type) else {
			tracing::debug!(block_type = %block_type, "no render callback, leaving marker");
			return None;
		};

		match callback.render(props, context, block_id) {
			Ok(Some(html)) => Some(html),
			Ok(None) => {
				tracing::warn!(
					block_type = %block_type,
					context = %context,
					block_id = block_id.unwrap_or_default(),
					"block render returned nothing, leaving marker"
				);
				None
			}
			Err(e) => {
				tracing::warn!(
					block_type = %block_type,
					context = %context,
					block_id = block_id.unwrap_or_default(),
					error = %e,
					"block render failed, leaving marker"
				);
				None
			}
		}
	}

	fn render_legacy_markdown<'a>(&self, content: &'a str, context: BlockContext) -> Cow<'a, str> {
		let matches = self.scanner.scan_legacy_markdown(content);
		if matches.is_empty() {
			return Cow::Borrowed(content);
		}
		if self.resolver.resolve(MARKDOWN_BLOCK).is_none() {
			tracing::debug!("no markdown render callback, leaving legacy markers");
			return Cow::Borrowed(content);
		}

		let mut replacements = Vec::new();
		for legacy in matches {
			let mut props = Props::new();
			props.insert("url".to_string(), JsonValue::from(legacy.url));
			props.insert("showSource".to_string(), JsonValue::from(legacy.show_source));

			if let Some(html) = self.render_block(MARKDOWN_BLOCK, &props, context, None) {
				replacements.push(Replacement {
					start: legacy.start,
					end: legacy.start + legacy.length,
					html,
				});
			}
		}

		if replacements.is_empty() {
			return Cow::Borrowed(content);
		}
		Cow::Owned(splice(content, replacements))
	}
}

// Applies replacements last-first. A replacement inside another one is
// dropped, since the outer output already covers its range.
fn splice(content: &str, mut replacements: Vec<Replacement>) -> String {
	replacements.sort_by_key(|r| r.start);

	let mut kept: Vec<Replacement> = Vec::with_capacity(replacements.len());
	for replacement in replacements {
		if kept.last().is_some_and(|outer| replacement.start < outer.end) {
			continue;
		}
		kept.push(replacement);
	}

	let mut output = content.to_string();
	for replacement in kept.into_iter().rev() {
		output.replace_range(replacement.start..replacement.end, &replacement.html);
	}
	output
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{RenderError, RenderResult};
	use rstest::{fixture, rstest};

	#[fixture]
	fn renderer() -> BlockRenderer {
		let resolver = Arc::new(BlockRenderCallbackResolver::new());
		resolver.register(
			"upper",
			|props: &Props, _: BlockContext, _: Option<&str>| -> RenderResult<Option<String>> {
				let text = props.get("text").and_then(JsonValue::as_str).unwrap_or("none");
				Ok(Some(text.to_uppercase()))
			},
		);
		resolver.register(
			"failing",
			|_: &Props, _: BlockContext, _: Option<&str>| -> RenderResult<Option<String>> {
				Err(RenderError::Custom("boom".to_string()))
			},
		);
		resolver.register(
			"declining",
			|_: &Props, _: BlockContext, _: Option<&str>| -> RenderResult<Option<String>> {
				Ok(None)
			},
		);
		BlockRenderer::new(resolver)
	}

	#[rstest]
	fn test_replaces_marker(renderer: BlockRenderer) {
		let content = r#"<p>a</p><div data-lara-block="upper" data-props='{"text":"hi"}'></div><p>b</p>"#;

		let out = renderer.process_content(content, BlockContext::Page);

		assert_eq!(out, "<p>a</p>HI<p>b</p>");
	}

	#[rstest]
	#[case("failing")]
	#[case("declining")]
	#[case("unknown")]
	fn test_unrendered_marker_is_untouched(renderer: BlockRenderer, #[case] block_type: &str) {
		let content = format!(
			r#"<div data-lara-block="{block_type}" data-props='{{}}'>keep</div><div data-lara-block="upper" data-props='{{"text":"x"}}'></div>"#
		);

		let out = renderer.process_content(&content, BlockContext::Page);

		assert_eq!(
			out,
			format!(r#"<div data-lara-block="{block_type}" data-props='{{}}'>keep</div>X"#)
		);
	}

	#[rstest]
	fn test_invalid_props_render_with_empty_map(renderer: BlockRenderer) {
		let content = r#"<div data-lara-block="upper" data-props='{oops'></div>"#;
		assert_eq!(renderer.process_content(content, BlockContext::Page), "NONE");
	}

	#[rstest]
	fn test_outer_replacement_supersedes_inner(renderer: BlockRenderer) {
		let content = r#"<div data-lara-block="upper" data-props='{"text":"outer"}'><div data-lara-block="upper" data-props='{"text":"inner"}'></div></div>"#;

		assert_eq!(renderer.process_content(content, BlockContext::Page), "OUTER");
	}

	#[rstest]
	fn test_inner_rendered_when_outer_is_untouched(renderer: BlockRenderer) {
		let content = r#"<div data-lara-block="unknown" data-props='{}'><div data-lara-block="upper" data-props='{"text":"in"}'></div></div>"#;

		let out = renderer.process_content(content, BlockContext::Page);

		assert_eq!(out, r#"<div data-lara-block="unknown" data-props='{}'>IN</div>"#);
	}

	#[rstest]
	fn test_multibyte_content_offsets(renderer: BlockRenderer) {
		let content = r#"héllo <div data-lara-block="upper" data-props='{"text":"ä"}'></div> wörld"#;
		assert_eq!(
			renderer.process_content(content, BlockContext::Page),
			"héllo Ä wörld"
		);
	}

	#[test]
	fn test_splice_applies_back_to_front() {
		let replacements = vec![
			Replacement { start: 0, end: 1, html: "AAA".to_string() },
			Replacement { start: 4, end: 5, html: "E".to_string() },
		];
		assert_eq!(splice("abcde", replacements), "AAAbcdE");
	}
}
