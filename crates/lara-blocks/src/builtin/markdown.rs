use super::{escape_attr, prop_bool, prop_str, safe_url};
use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use crate::package::BlockPackage;
use crate::registry::BlockTypeDefinition;
use crate::renderer::MARKDOWN_BLOCK;
use pulldown_cmark::{Event, Options, Parser, html};
use std::fmt;
use std::sync::Arc;

/// Loads remote markdown for `markdown` blocks that only carry a `url`.
///
/// The block system performs no network access itself; hosts plug in a
/// source backed by their own storage or HTTP client.
pub trait MarkdownSource: Send + Sync {
	/// Returns the markdown at `url`, or `None` if it is unavailable.
	fn load(&self, url: &str) -> RenderResult<Option<String>>;
}

/// `markdown` block: inline `content`, or markdown loaded from `url`.
///
/// Raw HTML inside markdown is escaped. Without a [`MarkdownSource`] a
/// `url`-only block renders a placeholder carrying the URL for client-side
/// loading.
#[derive(Clone, Default)]
pub struct MarkdownBlock {
	source: Option<Arc<dyn MarkdownSource>>,
}

impl MarkdownBlock {
	/// Creates the block with an optional source for remote markdown.
	pub fn new(source: Option<Arc<dyn MarkdownSource>>) -> Self {
		Self { source }
	}

	fn source_link(url: &str, context: BlockContext) -> String {
		let href = escape_attr(url);
		if context.is_email() {
			format!(
				r#"<p style="margin:8px 0 0;font-family:Arial,Helvetica,sans-serif;font-size:12px;"><a href="{href}" style="color:#6b7280;">View source</a></p>"#
			)
		} else {
			format!(r#"<p class="lara-markdown-source"><a href="{href}">View source</a></p>"#)
		}
	}
}

/// Renders markdown to HTML with raw HTML escaped.
pub fn markdown_to_html(markdown: &str) -> String {
	let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
	let parser = Parser::new_ext(markdown, options).map(|event| match event {
		Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
		other => other,
	});

	let mut output = String::new();
	html::push_html(&mut output, parser);
	output
}

impl BlockPackage for MarkdownBlock {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder(MARKDOWN_BLOCK)
			.label("Markdown")
			.category("content")
			.icon("markdown")
			.contexts([BlockContext::Page, BlockContext::Campaign])
			.default_prop("content", "")
			.default_prop("showSource", false)
			.build()
	}

	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let url = match prop_str(props, "url") {
			Some(u) if !u.trim().is_empty() => Some(safe_url(props, "url")?),
			_ => None,
		};

		let inline = prop_str(props, "content").filter(|c| !c.trim().is_empty());
		let markdown = match (inline, &url, &self.source) {
			(Some(content), _, _) => Some(content.to_string()),
			(None, Some(url), Some(source)) => source.load(url)?,
			_ => None,
		};

		let mut html = match (markdown, &url) {
			(Some(markdown), _) => {
				format!(r#"<div class="lara-markdown">{}</div>"#, markdown_to_html(&markdown))
			}
			(None, Some(url)) => format!(
				r#"<div class="lara-markdown lara-markdown-remote" data-src="{}"></div>"#,
				escape_attr(url)
			),
			(None, None) => return Ok(None),
		};

		if prop_bool(props, "showSource")
			&& let Some(url) = &url
		{
			html.push_str(&Self::source_link(url, context));
		}
		Ok(Some(html))
	}
}

impl fmt::Debug for MarkdownBlock {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MarkdownBlock")
			.field("has_source", &self.source.is_some())
			.finish()
	}
}
