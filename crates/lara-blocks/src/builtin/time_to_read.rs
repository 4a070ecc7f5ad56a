use super::{prop_bool, prop_u64};
use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use crate::package::BlockPackage;
use crate::registry::BlockTypeDefinition;
use crate::renderer::{TIME_TO_READ_BLOCK, WORD_COUNT_PROP};

/// Minutes needed to read `words` at `words_per_minute`, never less than one.
///
/// # Example
///
/// ```
/// use lara_blocks::builtin::reading_minutes;
///
/// assert_eq!(reading_minutes(4, 2), 2);
/// assert_eq!(reading_minutes(401, 200), 3);
/// assert_eq!(reading_minutes(0, 200), 1);
/// ```
pub fn reading_minutes(words: u64, words_per_minute: u64) -> u64 {
	words.div_ceil(words_per_minute.max(1)).max(1)
}

/// `time-to-read` block: estimated reading time of the surrounding content.
///
/// The renderer injects the document word count as `_wordCount`.
#[derive(Debug, Clone, Copy)]
pub struct TimeToReadBlock {
	words_per_minute: u32,
}

impl TimeToReadBlock {
	/// Creates the block with a default reading speed.
	pub fn new(words_per_minute: u32) -> Self {
		Self {
			words_per_minute: words_per_minute.max(1),
		}
	}
}

impl BlockPackage for TimeToReadBlock {
	fn definition(&self) -> BlockTypeDefinition {
		BlockTypeDefinition::builder(TIME_TO_READ_BLOCK)
			.label("Time to read")
			.category("content")
			.icon("clock")
			.contexts([BlockContext::Page, BlockContext::Campaign])
			.default_prop("wordsPerMinute", self.words_per_minute)
			.default_prop("displayAsRange", false)
			.build()
	}

	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		_block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		let words = prop_u64(props, WORD_COUNT_PROP).unwrap_or(0);
		let wpm = prop_u64(props, "wordsPerMinute")
			.filter(|w| *w > 0)
			.unwrap_or(u64::from(self.words_per_minute));
		let minutes = reading_minutes(words, wpm);

		let label = if prop_bool(props, "displayAsRange") {
			format!("{minutes}-{} min read", minutes + 1)
		} else {
			format!("{minutes} min read")
		};

		let html = if context.is_email() {
			format!(
				r#"<p style="margin:0 0 12px;font-family:Arial,Helvetica,sans-serif;font-size:14px;color:#6b7280;">{label}</p>"#
			)
		} else {
			format!(r#"<p class="lara-time-to-read">{label}</p>"#)
		};
		Ok(Some(html))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::{Value as JsonValue, json};

	#[rstest]
	#[case(json!({"_wordCount": 4, "wordsPerMinute": 2}), "2 min read")]
	#[case(json!({"_wordCount": 5, "wordsPerMinute": 2}), "3 min read")]
	#[case(json!({"_wordCount": 450}), "3 min read")]
	#[case(json!({"_wordCount": 450, "wordsPerMinute": 0}), "3 min read")]
	#[case(json!({}), "1 min read")]
	#[case(json!({"_wordCount": 400, "displayAsRange": true}), "2-3 min read")]
	fn test_time_to_read_label(#[case] props: JsonValue, #[case] expected: &str) {
		let props = props.as_object().cloned().unwrap();

		let out = TimeToReadBlock::new(200)
			.render(&props, BlockContext::Page, None)
			.unwrap()
			.unwrap();

		assert_eq!(out, format!(r#"<p class="lara-time-to-read">{expected}</p>"#));
	}

	#[rstest]
	fn test_definition_uses_configured_speed() {
		let definition = TimeToReadBlock::new(250).definition();
		assert_eq!(definition.default_props["wordsPerMinute"], 250);
		assert!(!definition.supports_context(BlockContext::Email));
	}
}
