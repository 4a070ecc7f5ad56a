//! Block type registry.
//!
//! The registry holds the server-side catalog of block type definitions.
//! Builder tooling reads it to decide which blocks to offer in a context;
//! the migrator reads it for each type's current schema version.
//!
//! Registration is a developer-time contract: malformed definitions are
//! rejected with a [`RegistryError`] instead of being ignored.
//!
//! # Example
//!
//! ```
//! use lara_blocks::context::BlockContext;
//! use lara_blocks::registry::{BlockRegistry, BlockTypeDefinition};
//!
//! let registry = BlockRegistry::new();
//! registry
//!     .register(
//!         BlockTypeDefinition::builder("hero")
//!             .label("Hero")
//!             .category("layout")
//!             .contexts([BlockContext::Page])
//!             .build(),
//!     )
//!     .unwrap();
//!
//! assert!(registry.has("hero"));
//! assert!(registry.for_context(BlockContext::Email).is_empty());
//! ```

use crate::block::Props;
use crate::context::BlockContext;
use crate::error::{RegistryError, RegistryResult};
use crate::version::DEFAULT_VERSION;
use indexmap::IndexMap;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

static BLOCK_TYPE_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("block type pattern is valid"));

/// Category used when a definition does not name one.
pub const DEFAULT_CATEGORY: &str = "common";

/// Icon used when a definition does not name one.
pub const DEFAULT_ICON: &str = "block-default";

/// Returns true if `block_type` is a valid block type identifier.
pub fn is_valid_block_type(block_type: &str) -> bool {
	BLOCK_TYPE_PATTERN.is_match(block_type)
}

/// Static description of a pluggable block kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTypeDefinition {
	/// Block type identifier (`^[a-z][a-z0-9-]*$`).
	#[serde(rename = "type")]
	pub block_type: String,

	/// Human-readable label.
	#[serde(default)]
	pub label: String,

	/// Category used to group blocks in the builder palette.
	#[serde(default = "default_category")]
	pub category: String,

	/// Icon name.
	#[serde(default = "default_icon")]
	pub icon: String,

	/// Builder contexts that may offer this block.
	#[serde(default = "all_contexts")]
	pub contexts: BTreeSet<BlockContext>,

	/// Props a freshly inserted block starts with.
	#[serde(default)]
	pub default_props: Props,

	/// Feature toggles (alignment, spacing, colors, ...).
	#[serde(default)]
	pub supports: BTreeMap<String, bool>,

	/// Current schema version of the block's props.
	#[serde(default = "default_version")]
	pub version: String,
}

fn default_category() -> String {
	DEFAULT_CATEGORY.to_string()
}

fn default_icon() -> String {
	DEFAULT_ICON.to_string()
}

fn all_contexts() -> BTreeSet<BlockContext> {
	BlockContext::ALL.into_iter().collect()
}

fn default_version() -> String {
	DEFAULT_VERSION.to_string()
}

impl BlockTypeDefinition {
	/// Creates a builder for a definition.
	///
	/// Unset fields default to: label = type, category `common`, icon
	/// `block-default`, every context, no default props, no supports,
	/// version `1.0.0`.
	pub fn builder(block_type: impl Into<String>) -> BlockTypeDefinitionBuilder {
		BlockTypeDefinitionBuilder::new(block_type)
	}

	/// Creates a definition with all defaults.
	pub fn new(block_type: impl Into<String>) -> Self {
		Self::builder(block_type).build()
	}

	/// Parses a definition from raw JSON, checking field shapes first.
	///
	/// Shape errors are reported per field: `contexts` must be a non-empty
	/// list of known context names, `defaultProps` an object, `supports` an
	/// object of booleans.
	pub fn from_json(value: &JsonValue) -> RegistryResult<Self> {
		let Some(obj) = value.as_object() else {
			return Err(RegistryError::InvalidDefinition(
				"definition must be a JSON object".to_string(),
			));
		};

		let block_type = match obj.get("type") {
			Some(JsonValue::String(t)) => t.clone(),
			Some(_) => {
				return Err(RegistryError::InvalidDefinition(
					"'type' must be a string".to_string(),
				));
			}
			None => {
				return Err(RegistryError::InvalidDefinition(
					"missing 'type'".to_string(),
				));
			}
		};
		if !is_valid_block_type(&block_type) {
			return Err(RegistryError::InvalidType(block_type));
		}

		if let Some(contexts) = obj.get("contexts") {
			let JsonValue::Array(items) = contexts else {
				return Err(RegistryError::InvalidContexts {
					block_type,
					reason: "must be a list".to_string(),
				});
			};
			for item in items {
				let name = item.as_str().unwrap_or_default();
				if name.parse::<BlockContext>().is_err() {
					return Err(RegistryError::InvalidContexts {
						block_type,
						reason: format!("unknown context {item}"),
					});
				}
			}
		}

		if let Some(props) = obj.get("defaultProps") {
			if !props.is_object() {
				return Err(RegistryError::InvalidDefaultProps(block_type));
			}
		}

		if let Some(supports) = obj.get("supports") {
			let valid = supports
				.as_object()
				.is_some_and(|map| map.values().all(JsonValue::is_boolean));
			if !valid {
				return Err(RegistryError::InvalidSupports(block_type));
			}
		}

		let mut definition: Self = serde_json::from_value(value.clone())
			.map_err(|e| RegistryError::InvalidDefinition(e.to_string()))?;
		if definition.label.is_empty() {
			definition.label = definition.block_type.clone();
		}
		Ok(definition)
	}

	/// Checks the definition's invariants.
	pub fn validate(&self) -> RegistryResult<()> {
		if !is_valid_block_type(&self.block_type) {
			return Err(RegistryError::InvalidType(self.block_type.clone()));
		}
		if self.contexts.is_empty() {
			return Err(RegistryError::InvalidContexts {
				block_type: self.block_type.clone(),
				reason: "at least one context is required".to_string(),
			});
		}
		Ok(())
	}

	/// Returns true if the block may be offered in `context`.
	pub fn supports_context(&self, context: BlockContext) -> bool {
		self.contexts.contains(&context)
	}

	/// Returns the value of a feature toggle (false when absent).
	pub fn supports(&self, feature: &str) -> bool {
		self.supports.get(feature).copied().unwrap_or(false)
	}
}

/// Builder for [`BlockTypeDefinition`].
pub struct BlockTypeDefinitionBuilder {
	definition: BlockTypeDefinition,
	contexts_set: bool,
}

impl BlockTypeDefinitionBuilder {
	/// Creates a builder with default fields.
	pub fn new(block_type: impl Into<String>) -> Self {
		let block_type = block_type.into();
		Self {
			definition: BlockTypeDefinition {
				label: block_type.clone(),
				block_type,
				category: default_category(),
				icon: default_icon(),
				contexts: all_contexts(),
				default_props: Props::new(),
				supports: BTreeMap::new(),
				version: default_version(),
			},
			contexts_set: false,
		}
	}

	/// Sets the label.
	pub fn label(mut self, label: impl Into<String>) -> Self {
		self.definition.label = label.into();
		self
	}

	/// Sets the category.
	pub fn category(mut self, category: impl Into<String>) -> Self {
		self.definition.category = category.into();
		self
	}

	/// Sets the icon.
	pub fn icon(mut self, icon: impl Into<String>) -> Self {
		self.definition.icon = icon.into();
		self
	}

	/// Restricts the block to the given contexts.
	pub fn contexts(mut self, contexts: impl IntoIterator<Item = BlockContext>) -> Self {
		self.definition.contexts = contexts.into_iter().collect();
		self.contexts_set = true;
		self
	}

	/// Adds one context (the first call replaces the default of all contexts).
	pub fn context(mut self, context: BlockContext) -> Self {
		if !self.contexts_set {
			self.definition.contexts.clear();
			self.contexts_set = true;
		}
		self.definition.contexts.insert(context);
		self
	}

	/// Adds a default prop.
	pub fn default_prop(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.definition.default_props.insert(key.into(), value.into());
		self
	}

	/// Sets a feature toggle.
	pub fn supports(mut self, feature: impl Into<String>, enabled: bool) -> Self {
		self.definition.supports.insert(feature.into(), enabled);
		self
	}

	/// Sets the current schema version.
	pub fn version(mut self, version: impl Into<String>) -> Self {
		self.definition.version = version.into();
		self
	}

	/// Builds the definition. Validation happens on registration.
	pub fn build(self) -> BlockTypeDefinition {
		self.definition
	}
}

/// Hook applied to the result of [`BlockRegistry::for_context`].
///
/// Hooks may add or remove entries; they run in registration order.
pub type ContextFilterHook =
	Arc<dyn Fn(BlockContext, &mut IndexMap<String, BlockTypeDefinition>) + Send + Sync>;

/// Catalog of block type definitions, in registration order.
#[derive(Default)]
pub struct BlockRegistry {
	definitions: RwLock<IndexMap<String, BlockTypeDefinition>>,
	hooks: RwLock<Vec<ContextFilterHook>>,
}

impl BlockRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a definition, replacing any existing one of the same type.
	///
	/// A replaced definition keeps its original position in the catalog.
	pub fn register(&self, definition: BlockTypeDefinition) -> RegistryResult<()> {
		definition.validate()?;
		tracing::debug!(block_type = %definition.block_type, "registered block type");
		self.definitions
			.write()
			.insert(definition.block_type.clone(), definition);
		Ok(())
	}

	/// Parses and registers a raw JSON definition.
	pub fn register_json(&self, value: &JsonValue) -> RegistryResult<()> {
		self.register(BlockTypeDefinition::from_json(value)?)
	}

	/// Removes a definition, returning it if it was registered.
	pub fn unregister(&self, block_type: &str) -> Option<BlockTypeDefinition> {
		self.definitions.write().shift_remove(block_type)
	}

	/// Returns a definition by type.
	pub fn get(&self, block_type: &str) -> Option<BlockTypeDefinition> {
		self.definitions.read().get(block_type).cloned()
	}

	/// Returns every definition, in registration order.
	pub fn all(&self) -> IndexMap<String, BlockTypeDefinition> {
		self.definitions.read().clone()
	}

	/// Returns true if a definition is registered for the type.
	pub fn has(&self, block_type: &str) -> bool {
		self.definitions.read().contains_key(block_type)
	}

	/// Number of registered definitions.
	pub fn len(&self) -> usize {
		self.definitions.read().len()
	}

	/// Returns true if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.definitions.read().is_empty()
	}

	/// Adds a hook run on every [`Self::for_context`] result.
	pub fn add_context_filter<F>(&self, hook: F)
	where
		F: Fn(BlockContext, &mut IndexMap<String, BlockTypeDefinition>) + Send + Sync + 'static,
	{
		self.hooks.write().push(Arc::new(hook));
	}

	/// Returns the definitions available in a context, after filter hooks.
	pub fn for_context(&self, context: BlockContext) -> IndexMap<String, BlockTypeDefinition> {
		let mut filtered: IndexMap<String, BlockTypeDefinition> = self
			.definitions
			.read()
			.iter()
			.filter(|(_, def)| def.supports_context(context))
			.map(|(k, def)| (k.clone(), def.clone()))
			.collect();

		// Clone the hook list so hooks may call back into the registry
		let hooks = self.hooks.read().clone();
		for hook in hooks {
			hook(context, &mut filtered);
		}
		filtered
	}

	/// Groups definitions by category, optionally filtered by context.
	///
	/// Categories appear in the order their first block was registered, and
	/// blocks keep registration order within a category.
	pub fn by_category(
		&self,
		context: Option<BlockContext>,
	) -> IndexMap<String, Vec<BlockTypeDefinition>> {
		let definitions = match context {
			Some(context) => self.for_context(context),
			None => self.all(),
		};

		let mut grouped: IndexMap<String, Vec<BlockTypeDefinition>> = IndexMap::new();
		for (_, definition) in definitions {
			grouped
				.entry(definition.category.clone())
				.or_default()
				.push(definition);
		}
		grouped
	}

	/// Returns the current schema version declared for a type, if registered.
	pub fn version_of(&self, block_type: &str) -> Option<String> {
		self.definitions
			.read()
			.get(block_type)
			.map(|def| def.version.clone())
	}
}

impl std::fmt::Debug for BlockRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BlockRegistry")
			.field("definitions", &self.definitions.read().keys().collect::<Vec<_>>())
			.field("hooks", &self.hooks.read().len())
			.finish()
	}
}
