use super::color;
use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use crate::package::BlockPackage;
use crate::registry::BlockTypeDefinition;

const DEFAULT_COLOR: &str = "#e5e7eb";

/// `divider` block: a horizontal rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DividerBlock;

impl BlockPackage for DividerBlock {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder("divider")
			.label("Divider")
			.category("layout")
			.icon("divider")
			.default_prop("color", DEFAULT_COLOR)
			.supports("colors", true)
			.build()
	}

	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let line = color(props, "color", DEFAULT_COLOR);
		let html = if context.is_email() {
			format!(r#"<hr style="border:none;border-top:1px solid {line};margin:16px 0;">"#)
		} else {
			format!(r#"<hr class="lara-divider" style="border-color:{line};">"#)
		};
		Ok(Some(html))
	}
}
