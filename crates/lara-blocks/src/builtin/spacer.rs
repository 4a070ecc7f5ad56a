use super::prop_u64;
use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use crate::package::BlockPackage;
use crate::registry::BlockTypeDefinition;

const DEFAULT_HEIGHT: u64 = 24;
const MAX_HEIGHT: u64 = 400;

/// `spacer` block: fixed vertical whitespace, capped at 400 pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacerBlock;

impl BlockPackage for SpacerBlock {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder("spacer")
			.label("Spacer")
			.category("layout")
			.icon("spacer")
			.default_prop("height", DEFAULT_HEIGHT)
			.build()
	}

	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let height = prop_u64(props, "height")
			.unwrap_or(DEFAULT_HEIGHT)
			.min(MAX_HEIGHT);
		let html = if context.is_email() {
			format!(
				r#"<div style="height:{height}px;line-height:{height}px;font-size:1px;">&nbsp;</div>"#
			)
		} else {
			format!(r#"<div class="lara-spacer" style="height:{height}px;" aria-hidden="true"></div>"#)
		};
		Ok(Some(html))
	}
}
