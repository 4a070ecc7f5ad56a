//! Built-in block types.
//!
//! | Type           | Props                                                      |
//! |----------------|------------------------------------------------------------|
//! | `heading`      | `text`, `level` (1-6), `align`                             |
//! | `text`         | `text`, `align`                                            |
//! | `button`       | `text`, `url`, `color`, `align`                            |
//! | `divider`      | `color`                                                    |
//! | `spacer`       | `height` (pixels)                                          |
//! | `time-to-read` | `wordsPerMinute`, `displayAsRange`                         |
//! | `markdown`     | `content`, or `url` and `showSource`                       |
//!
//! Email output uses inline styles; page and campaign output uses
//! `lara-*` class names.

mod button;
mod divider;
mod heading;
mod markdown;
mod spacer;
mod text;
mod time_to_read;

pub use button::ButtonBlock;
pub use divider::DividerBlock;
pub use heading::HeadingBlock;
pub use markdown::{MarkdownBlock, MarkdownSource};
pub use spacer::SpacerBlock;
pub use text::TextBlock;
pub use time_to_read::{TimeToReadBlock, reading_minutes};

use crate::block::Props;
use crate::error::RenderError;
use crate::package::BlockPackage;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::{Arc, LazyLock};

static CSS_COLOR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?:#[0-9a-fA-F]{3,8}|[a-zA-Z]{3,20})$").expect("color pattern is valid")
});

/// Returns every built-in package.
pub fn packages(
	words_per_minute: u32,
	markdown_source: Option<Arc<dyn MarkdownSource>>,
) -> Vec<Arc<dyn BlockPackage>> {
	vec![
		Arc::new(HeadingBlock),
		Arc::new(TextBlock),
		Arc::new(ButtonBlock),
		Arc::new(DividerBlock),
		Arc::new(SpacerBlock),
		Arc::new(TimeToReadBlock::new(words_per_minute)),
		Arc::new(MarkdownBlock::new(markdown_source)),
	]
}

pub(crate) fn prop_str<'a>(props: &'a Props, key: &str) -> Option<&'a str> {
	props.get(key).and_then(JsonValue::as_str)
}

// Integers may arrive as numbers or numeric strings from older builders
pub(crate) fn prop_u64(props: &Props, key: &str) -> Option<u64> {
	match props.get(key)? {
		JsonValue::Number(n) => n
			.as_u64()
			.or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
		JsonValue::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

pub(crate) fn prop_bool(props: &Props, key: &str) -> bool {
	match props.get(key) {
		Some(JsonValue::Bool(b)) => *b,
		Some(JsonValue::String(s)) => s.eq_ignore_ascii_case("true") || s == "1",
		Some(JsonValue::Number(n)) => n.as_u64() == Some(1),
		_ => false,
	}
}

pub(crate) fn escape_text(value: &str) -> String {
	html_escape::encode_text(value).into_owned()
}

pub(crate) fn escape_attr(value: &str) -> String {
	html_escape::encode_double_quoted_attribute(value).into_owned()
}

pub(crate) fn align(props: &Props) -> &'static str {
	match prop_str(props, "align") {
		Some("center") => "center",
		Some("right") => "right",
		_ => "left",
	}
}

pub(crate) fn color<'a>(props: &'a Props, key: &str, fallback: &'a str) -> &'a str {
	prop_str(props, key)
		.filter(|c| CSS_COLOR.is_match(c))
		.unwrap_or(fallback)
}

pub(crate) fn safe_url(props: &Props, key: &str) -> Result<String, RenderError> {
	let url = prop_str(props, key)
		.map(str::trim)
		.filter(|u| !u.is_empty())
		.ok_or_else(|| RenderError::InvalidProp {
			prop: key.to_string(),
			reason: "missing".to_string(),
		})?;

	let scheme = url.split_once(':').map(|(scheme, _)| scheme.to_ascii_lowercase());
	match scheme.as_deref() {
		None | Some("http") | Some("https") | Some("mailto") | Some("tel") => Ok(url.to_string()),
		// `/path?a=b:c` has no scheme
		Some(s) if s.contains(['/', '?', '#']) => Ok(url.to_string()),
		Some(other) => Err(RenderError::InvalidProp {
			prop: key.to_string(),
			reason: format!("unsupported URL scheme '{other}'"),
		}),
	}
}
