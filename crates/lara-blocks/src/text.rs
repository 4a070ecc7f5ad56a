//! Visible-text helpers for derived block values.

use crate::scanner::{HtmlTokens, TokenKind};

/// Returns the visible text of an HTML fragment.
///
/// Comments and the bodies of script and style elements are dropped, tags
/// become spaces, entities are decoded and runs of whitespace collapse to a
/// single space.
pub fn visible_text(html: &str) -> String {
	let mut text = String::with_capacity(html.len());
	let mut pos = 0;
	let mut skipping: Option<&str> = None;
	for token in HtmlTokens::new(html) {
		if skipping.is_none() {
			text.push_str(&html[pos..token.start]);
			text.push(' ');
		}
		pos = token.end;
		match (skipping, token.kind) {
			(None, TokenKind::Open) if is_raw_text(token.name) => skipping = Some(token.name),
			(Some(name), TokenKind::Close) if token.name.eq_ignore_ascii_case(name) => {
				skipping = None;
			}
			_ => {}
		}
	}
	if skipping.is_none() {
		text.push_str(&html[pos..]);
	}

	let decoded = html_escape::decode_html_entities(&text);
	decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_raw_text(name: &str) -> bool {
	name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")
}

/// Counts the words of the visible text of an HTML fragment.
///
/// # Example
///
/// ```
/// use lara_blocks::text::word_count;
///
/// assert_eq!(word_count("<p>one two</p><p>three&nbsp;four</p>"), 4);
/// ```
pub fn word_count(html: &str) -> usize {
	visible_text(html).split_whitespace().count()
}
