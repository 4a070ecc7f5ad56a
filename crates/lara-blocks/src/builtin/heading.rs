use super::{align, escape_text, prop_str, prop_u64};
use crate::block::Props;
use crate::context::BlockContext;
use crate::error::{RenderError, RenderResult};
use crate::package::BlockPackage;
use crate::registry::BlockTypeDefinition;

/// `heading` block: a single `h1`-`h6` element.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingBlock;

const EMAIL_FONT_SIZES: [u32; 6] = [32, 26, 22, 18, 16, 14];

impl BlockPackage for HeadingBlock {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder("heading")
			.label("Heading")
			.category("text")
			.icon("heading")
			.default_prop("text", "Heading")
			.default_prop("level", 2)
			.default_prop("align", "left")
			.supports("align", true)
			.supports("colors", false)
			.build()
	}

	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let level = prop_u64(props, "level").unwrap_or(2);
		if !(1..=6).contains(&level) {
			return Err(RenderError::InvalidProp {
				prop: "level".to_string(),
				reason: format!("expected 1-6, got {level}"),
			});
		}

		let text = escape_text(prop_str(props, "text").unwrap_or_default());
		let align = align(props);
		let html = if context.is_email() {
			let size = EMAIL_FONT_SIZES[(level - 1) as usize];
			format!(
				r#"<h{level} style="margin:0 0 12px;font-family:Arial,Helvetica,sans-serif;font-size:{size}px;line-height:1.3;text-align:{align};">{text}</h{level}>"#
			)
		} else {
			format!(r#"<h{level} class="lara-heading lara-align-{align}">{text}</h{level}>"#)
		};
		Ok(Some(html))
	}
}
