//! Block data: stored blocks and located markers.

use crate::version::DEFAULT_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Property bag of a block.
pub type Props = serde_json::Map<String, JsonValue>;

/// Key holding nested column layouts inside a block's props.
pub const CHILDREN_KEY: &str = "children";

/// A block as persisted inside a design document (`design_json.blocks`).
///
/// Nested column layouts live in `props.children` as a list of columns,
/// each column being a list of stored blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlock {
	/// Stable instance identifier.
	#[serde(default)]
	pub id: String,

	/// Block type identifier.
	#[serde(rename = "type")]
	pub block_type: String,

	/// Schema version the props were written for.
	#[serde(default = "default_version")]
	pub version: String,

	/// Type-specific properties.
	#[serde(default)]
	pub props: Props,

	/// Other fields stored alongside the block, kept verbatim.
	#[serde(flatten)]
	pub extra: Props,
}

fn default_version() -> String {
	DEFAULT_VERSION.to_string()
}

impl StoredBlock {
	/// Creates a block at the default version with empty props.
	pub fn new(id: impl Into<String>, block_type: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			block_type: block_type.into(),
			version: default_version(),
			props: Props::new(),
			extra: Props::new(),
		}
	}

	/// Sets the stored version.
	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = version.into();
		self
	}

	/// Sets the props.
	pub fn with_props(mut self, props: Props) -> Self {
		self.props = props;
		self
	}
}

/// A block marker located in a content buffer.
///
/// `start` and `length` are byte offsets into the buffer that was scanned
/// and cover the opening tag through its matching closing tag.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMarker {
	/// Block type identifier.
	pub block_type: String,
	/// Optional instance identifier.
	pub id: Option<String>,
	/// Decoded props (empty when missing or invalid).
	pub props: Props,
	/// Byte offset of the opening tag.
	pub start: usize,
	/// Byte length of the full marker.
	pub length: usize,
}

impl BlockMarker {
	/// Byte offset just past the closing tag.
	pub fn end(&self) -> usize {
		self.start + self.length
	}
}

/// Decodes an HTML-escaped JSON props attribute.
///
/// Missing, undecodable or non-object input yields an empty map.
pub fn decode_props(raw: Option<&str>) -> Props {
	let Some(raw) = raw else {
		return Props::new();
	};
	let decoded = html_escape::decode_html_entities(raw);
	match serde_json::from_str::<JsonValue>(&decoded) {
		Ok(JsonValue::Object(map)) => map,
		Ok(_) => Props::new(),
		Err(e) => {
			tracing::debug!(error = %e, "block props are not valid JSON, using empty props");
			Props::new()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_stored_block_defaults() {
		let block: StoredBlock = serde_json::from_value(json!({"type": "heading"})).unwrap();
		assert_eq!(block.block_type, "heading");
		assert_eq!(block.version, "1.0.0");
		assert!(block.id.is_empty());
		assert!(block.props.is_empty());
	}

	#[test]
	fn test_stored_block_serializes_type_field() {
		let block = StoredBlock::new("b1", "button").with_version("1.2.0");
		let value = serde_json::to_value(&block).unwrap();
		assert_eq!(value["type"], "button");
		assert_eq!(value["version"], "1.2.0");
	}

	#[test]
	fn test_stored_block_keeps_unknown_fields() {
		let value = json!({"id": "b1", "type": "text", "styles": {"margin": 4}});
		let block: StoredBlock = serde_json::from_value(value).unwrap();
		assert_eq!(block.extra["styles"]["margin"], 4);

		let back = serde_json::to_value(&block).unwrap();
		assert_eq!(back["styles"]["margin"], 4);
		assert_eq!(back["version"], "1.0.0");
	}

	#[test]
	fn test_decode_props_handles_entities() {
		let props = decode_props(Some("{&quot;text&quot;:&quot;It&#039;s&quot;}"));
		assert_eq!(props["text"], "It's");
	}

	#[test]
	fn test_decode_props_invalid_json_is_empty() {
		assert!(decode_props(Some("{not json")).is_empty());
		assert!(decode_props(Some("[1,2]")).is_empty());
		assert!(decode_props(None).is_empty());
	}
}
