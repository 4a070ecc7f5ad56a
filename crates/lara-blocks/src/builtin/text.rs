use super::{align, escape_text, prop_str};
use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use crate::package::BlockPackage;
use crate::registry::BlockTypeDefinition;

/// `text` block: a plain-text paragraph. Blank lines split paragraphs and
/// single newlines become line breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBlock;

impl BlockPackage for TextBlock {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder("text")
			.label("Text")
			.category("text")
			.icon("paragraph")
			.default_prop("text", "")
			.default_prop("align", "left")
			.supports("align", true)
			.build()
	}

	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let text = prop_str(props, "text").unwrap_or_default().replace("\r\n", "\n");
		let align = align(props);

		let open = if context.is_email() {
			format!(
				r#"<p style="margin:0 0 12px;font-family:Arial,Helvetica,sans-serif;font-size:16px;line-height:1.5;text-align:{align};">"#
			)
		} else {
			format!(r#"<p class="lara-text lara-align-{align}">"#)
		};

		let html = text
			.split("\n\n")
			.map(str::trim)
			.filter(|p| !p.is_empty())
			.map(|p| format!("{open}{}</p>", escape_text(p).replace('\n', "<br>")))
			.collect::<String>();
		if html.is_empty() {
			return Ok(Some(format!("{open}</p>")));
		}
		Ok(Some(html))
	}
}
