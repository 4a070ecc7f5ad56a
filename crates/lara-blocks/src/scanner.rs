//! Block marker scanning.
//!
//! Markers are located with string scanning instead of an HTML parser so
//! that partially malformed fragments still render and large documents stay
//! cheap. The patterns below consume quoted attribute values as a unit
//! (`"…"` or `'…'` with backslash escapes), so a `>` or an escaped quote
//! inside a props payload never ends a tag early. The `regex` crate runs in
//! linear time, so large payloads cannot trigger catastrophic backtracking.
//!
//! # Marker format
//!
//! ```text
//! <div data-lara-block="<type>" [data-block-id="<id>"] data-props='<json>'> … </div>
//! ```
//!
//! The extent of a marker runs from its opening tag to the `</div>` that
//! balances it, so markers may contain other `div`s and other markers.
//! Comments are skipped whole (MSO conditional comments in email included),
//! and `div` pairs are matched in a single pass over the document.

use crate::block::{BlockMarker, decode_props};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Attribute carrying the block type.
pub const BLOCK_TYPE_ATTR: &str = "data-lara-block";
/// Attribute carrying the optional block instance id.
pub const BLOCK_ID_ATTR: &str = "data-block-id";
/// Attribute carrying the HTML-escaped JSON props.
pub const PROPS_ATTR: &str = "data-props";

/// Attribute marking a legacy block.
pub const LEGACY_TYPE_ATTR: &str = "data-block-type";
/// Attribute carrying the URL-encoded source of a legacy markdown block.
pub const LEGACY_URL_ATTR: &str = "data-url";
/// Attribute carrying the source-link flag of a legacy markdown block.
pub const LEGACY_SHOW_SOURCE_ATTR: &str = "data-show-source";

// One attribute-ish unit of a tag: a bare character, or a quoted value
// consumed whole.
const TAG_UNIT: &str = r#"(?:[^>"']|"[^"]*"|'(?:[^'\\]|\\.)*')"#;

// Group 1 is `/` on closing tags, group 2 the tag name. A comment opener
// matches without groups; its body is skipped by `HtmlTokens`.
static HTML_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(
		r#"(?is)<!--|<(/?)([a-z][a-z0-9:-]*)(?:[\s/]{TAG_UNIT}*)?>"#
	))
	.expect("tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"(?is)\s([a-z_:][-a-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'((?:[^'\\]|\\.)*)'|([^\s"'>]+)))?"#,
	)
	.expect("attribute pattern is valid")
});

/// Kind of an [`HtmlToken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
	Comment,
	Open,
	Close,
	SelfClosing,
}

/// A comment or tag located in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HtmlToken<'a> {
	pub(crate) kind: TokenKind,
	/// Tag name as written, empty for comments.
	pub(crate) name: &'a str,
	/// Full token text.
	pub(crate) text: &'a str,
	pub(crate) start: usize,
	pub(crate) end: usize,
}

/// Iterates over the comments and tags of `content` in document order.
///
/// An unterminated comment runs to the end of the content.
pub(crate) struct HtmlTokens<'a> {
	content: &'a str,
	pos: usize,
}

impl<'a> HtmlTokens<'a> {
	pub(crate) fn new(content: &'a str) -> Self {
		Self { content, pos: 0 }
	}
}

impl<'a> Iterator for HtmlTokens<'a> {
	type Item = HtmlToken<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let caps = HTML_TOKEN.captures_at(self.content, self.pos)?;
		let whole = caps.get(0)?;
		let start = whole.start();

		let Some(name) = caps.get(2) else {
			let body = whole.end();
			let end = self.content[body..]
				.find("-->")
				.map_or(self.content.len(), |i| body + i + 3);
			self.pos = end;
			return Some(HtmlToken {
				kind: TokenKind::Comment,
				name: "",
				text: &self.content[start..end],
				start,
				end,
			});
		};

		self.pos = whole.end();
		let kind = if caps.get(1).is_some_and(|slash| !slash.is_empty()) {
			TokenKind::Close
		} else if whole.as_str().ends_with("/>") {
			TokenKind::SelfClosing
		} else {
			TokenKind::Open
		};
		Some(HtmlToken {
			kind,
			name: name.as_str(),
			text: whole.as_str(),
			start,
			end: whole.end(),
		})
	}
}

/// An opening `div` tag and the offset just past its balancing `</div>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DivElement<'a> {
	tag: &'a str,
	start: usize,
	end: Option<usize>,
}

/// Pairs every `div` of the document with its closing tag in one pass.
///
/// Stray closing tags are ignored. Elements still open when the document
/// ends have no `end`.
fn div_elements(content: &str) -> Vec<DivElement<'_>> {
	let mut elements: Vec<DivElement<'_>> = Vec::new();
	let mut open = Vec::new();
	for token in HtmlTokens::new(content) {
		if !token.name.eq_ignore_ascii_case("div") {
			continue;
		}
		match token.kind {
			TokenKind::Open => {
				open.push(elements.len());
				elements.push(DivElement {
					tag: token.text,
					start: token.start,
					end: None,
				});
			}
			TokenKind::Close => {
				if let Some(index) = open.pop() {
					elements[index].end = Some(token.end);
				}
			}
			TokenKind::Comment | TokenKind::SelfClosing => {}
		}
	}
	elements
}

/// A block marker found in content, before its props are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
	/// Block type from the type attribute.
	pub block_type: String,
	/// Block id, if present.
	pub id: Option<String>,
	/// Raw `data-props` value (still HTML-escaped), if present.
	pub raw_props: Option<String>,
	/// Byte offset of the opening tag.
	pub start: usize,
	/// Byte length of the whole marker, closing tag included.
	pub length: usize,
}

impl MarkerMatch {
	/// Byte offset just past the closing tag.
	pub fn end(&self) -> usize {
		self.start + self.length
	}

	/// Decodes the props, yielding a located block marker.
	pub fn into_marker(self) -> BlockMarker {
		BlockMarker {
			props: decode_props(self.raw_props.as_deref()),
			block_type: self.block_type,
			id: self.id,
			start: self.start,
			length: self.length,
		}
	}
}

/// A legacy markdown marker found in content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMarkdownMatch {
	/// Decoded source URL.
	pub url: String,
	/// Whether the source link should be shown.
	pub show_source: bool,
	/// Byte offset of the opening tag.
	pub start: usize,
	/// Byte length of the whole marker.
	pub length: usize,
}

/// Locates block markers in HTML content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentBlockScanner;

impl ContentBlockScanner {
	/// Creates a scanner.
	pub fn new() -> Self {
		Self
	}

	/// Returns true if the content may contain a block marker.
	///
	/// A cheap substring test used as a fast path before scanning.
	pub fn may_contain_markers(content: &str) -> bool {
		content.contains(BLOCK_TYPE_ATTR)
	}

	/// Finds every balanced block marker in document order.
	///
	/// Markers whose closing tag cannot be found are skipped. Nested markers
	/// are reported as separate matches whose ranges lie inside their
	/// parent's range.
	pub fn scan(&self, content: &str) -> Vec<MarkerMatch> {
		if !Self::may_contain_markers(content) {
			return Vec::new();
		}

		let mut matches = Vec::new();
		for div in div_elements(content) {
			if !contains_ignore_ascii_case(div.tag, BLOCK_TYPE_ATTR) {
				continue;
			}
			let attrs = parse_attributes(div.tag);
			let Some(block_type) = attrs.get(BLOCK_TYPE_ATTR).map(|t| t.trim().to_string())
			else {
				continue;
			};
			if block_type.is_empty() {
				continue;
			}

			let Some(end) = div.end else {
				tracing::debug!(
					block_type = %block_type,
					offset = div.start,
					"skipping block marker without a matching closing tag"
				);
				continue;
			};

			matches.push(MarkerMatch {
				block_type,
				id: attrs.get(BLOCK_ID_ATTR).cloned().filter(|id| !id.is_empty()),
				raw_props: attrs.get(PROPS_ATTR).cloned(),
				start: div.start,
				length: end - div.start,
			});
		}

		matches
	}

	/// Finds every balanced block marker and decodes its props.
	pub fn markers(&self, content: &str) -> Vec<BlockMarker> {
		self.scan(content)
			.into_iter()
			.map(MarkerMatch::into_marker)
			.collect()
	}

	/// Finds every balanced legacy markdown marker in document order.
	pub fn scan_legacy_markdown(&self, content: &str) -> Vec<LegacyMarkdownMatch> {
		if !content.contains(LEGACY_TYPE_ATTR) {
			return Vec::new();
		}

		let mut matches = Vec::new();
		for div in div_elements(content) {
			if !contains_ignore_ascii_case(div.tag, LEGACY_TYPE_ATTR) {
				continue;
			}
			let attrs = parse_attributes(div.tag);
			if !attrs
				.get(LEGACY_TYPE_ATTR)
				.is_some_and(|t| t.trim().eq_ignore_ascii_case("markdown"))
			{
				continue;
			}
			let Some(end) = div.end else {
				continue;
			};

			let raw_url = attrs.get(LEGACY_URL_ATTR).map(String::as_str).unwrap_or("");
			let raw_url = html_escape::decode_html_entities(raw_url);
			let url = urlencoding::decode(&raw_url)
				.map(|u| u.into_owned())
				.unwrap_or_else(|_| raw_url.to_string());
			let show_source = attrs
				.get(LEGACY_SHOW_SOURCE_ATTR)
				.is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");

			matches.push(LegacyMarkdownMatch {
				url,
				show_source,
				start: div.start,
				length: end - div.start,
			});
		}

		matches
	}
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
	haystack
		.as_bytes()
		.windows(needle.len())
		.any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

/// Parses the attributes of an opening tag.
///
/// Names are lowercased and the first occurrence of a name wins. Values are
/// returned raw (entities are not decoded), except that backslash-escaped
/// single quotes inside single-quoted values are unescaped.
pub fn parse_attributes(tag: &str) -> HashMap<String, String> {
	let mut attrs = HashMap::new();
	for caps in ATTRIBUTE.captures_iter(tag) {
		let name = caps[1].to_ascii_lowercase();
		let value = if let Some(v) = caps.get(2) {
			v.as_str().to_string()
		} else if let Some(v) = caps.get(3) {
			v.as_str().replace("\\'", "'")
		} else if let Some(v) = caps.get(4) {
			v.as_str().to_string()
		} else {
			String::new()
		};
		attrs.entry(name).or_insert(value);
	}
	attrs
}
