use super::{align, color, escape_attr, escape_text, prop_str, safe_url};
use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use crate::package::BlockPackage;
use crate::registry::BlockTypeDefinition;

const DEFAULT_COLOR: &str = "#2563eb";

/// `button` block: a call-to-action link.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonBlock;

impl BlockPackage for ButtonBlock {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder("button")
			.label("Button")
			.category("actions")
			.icon("button")
			.default_prop("text", "Click here")
			.default_prop("url", "#")
			.default_prop("color", DEFAULT_COLOR)
			.supports("align", true)
			.supports("colors", true)
			.build()
	}

	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let url = escape_attr(&safe_url(props, "url")?);
		let text = escape_text(prop_str(props, "text").unwrap_or("Click here"));
		let align = align(props);
		let background = color(props, "color", DEFAULT_COLOR);

		let html = if context.is_email() {
			// Table wrapper keeps alignment in clients that ignore text-align on links
			format!(
				concat!(
					r#"<table role="presentation" width="100%" cellpadding="0" cellspacing="0" border="0"><tr><td align="{align}">"#,
					r#"<a href="{url}" style="display:inline-block;padding:12px 24px;background-color:{background};color:#ffffff;font-family:Arial,Helvetica,sans-serif;font-size:16px;text-decoration:none;border-radius:4px;">{text}</a>"#,
					"</td></tr></table>",
				),
				align = align,
				url = url,
				background = background,
				text = text,
			)
		} else {
			format!(
				r#"<div class="lara-button-wrap lara-align-{align}"><a class="lara-button" href="{url}" style="background-color:{background};">{text}</a></div>"#
			)
		};
		Ok(Some(html))
	}
}
