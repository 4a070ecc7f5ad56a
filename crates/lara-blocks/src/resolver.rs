//! Render callback resolution.
//!
//! A block type resolves to a render callback in priority order:
//!
//! 1. a callback registered explicitly with [`BlockRenderCallbackResolver::register`]
//!    (runtime or plugin override, checked on every call);
//! 2. a callback installed at startup: a block package's render function
//!    or a discovered `render.html` template (see [`crate::discovery`]);
//! 3. nothing, in which case the marker is left as-is.
//!
//! Lookups of step 2 are memoized per block type, including misses.

use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Turns a block's props into output HTML for a context.
///
/// Returning `Ok(None)` declines to render; the caller keeps the original
/// marker. Errors are treated the same way and logged.
///
/// Implemented for any closure of the same shape:
///
/// ```
/// use lara_blocks::block::Props;
/// use lara_blocks::context::BlockContext;
/// use lara_blocks::error::RenderResult;
/// use lara_blocks::resolver::RenderBlock;
///
/// let divider = |_: &Props, _: BlockContext, _: Option<&str>| -> RenderResult<Option<String>> {
///     Ok(Some("<hr>".to_string()))
/// };
/// assert_eq!(
///     divider.render(&Props::new(), BlockContext::Page, None).unwrap(),
///     Some("<hr>".to_string())
/// );
/// ```
pub trait RenderBlock: Send + Sync {
	/// Renders the block, or returns `None` to leave the marker untouched.
	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		block_id: Option<&str>,
	) -> RenderResult<Option<String>>;
}

impl<F> RenderBlock for F
where
	F: Fn(&Props, BlockContext, Option<&str>) -> RenderResult<Option<String>> + Send + Sync,
{
	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		self(props, context, block_id)
	}
}

/// Shared handle to a render callback.
pub type RenderCallback = Arc<dyn RenderBlock>;

/// Maps block types to render callbacks.
#[derive(Default)]
pub struct BlockRenderCallbackResolver {
	explicit: RwLock<HashMap<String, RenderCallback>>,
	discovered: RwLock<HashMap<String, RenderCallback>>,
	cache: RwLock<HashMap<String, Option<RenderCallback>>>,
}

impl BlockRenderCallbackResolver {
	/// Creates an empty resolver.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an explicit callback, overriding any discovered one.
	pub fn register<R>(&self, block_type: impl Into<String>, callback: R)
	where
		R: RenderBlock + 'static,
	{
		self.register_arc(block_type, Arc::new(callback));
	}

	/// Registers an already shared explicit callback.
	pub fn register_arc(&self, block_type: impl Into<String>, callback: RenderCallback) {
		let block_type = block_type.into();
		tracing::debug!(block_type = %block_type, "registered render callback");
		self.explicit.write().insert(block_type, callback);
	}

	/// Removes an explicit callback, returning true if one was registered.
	pub fn unregister(&self, block_type: &str) -> bool {
		self.explicit.write().remove(block_type).is_some()
	}

	/// Returns true if an explicit callback is registered for the type.
	pub fn has_explicit(&self, block_type: &str) -> bool {
		self.explicit.read().contains_key(block_type)
	}

	/// Adds a startup callback (block package or discovered template).
	///
	/// A later entry for the same type replaces the earlier one, and the
	/// cached lookup for the type is dropped.
	pub fn add_discovered(&self, block_type: impl Into<String>, callback: RenderCallback) {
		let block_type = block_type.into();
		self.cache.write().remove(&block_type);
		self.discovered.write().insert(block_type, callback);
	}

	/// Resolves the callback for a block type.
	pub fn resolve(&self, block_type: &str) -> Option<RenderCallback> {
		if let Some(callback) = self.explicit.read().get(block_type) {
			return Some(Arc::clone(callback));
		}

		if let Some(cached) = self.cache.read().get(block_type) {
			tracing::trace!(block_type = %block_type, hit = cached.is_some(), "render callback cache hit");
			return cached.clone();
		}

		let found = self.discovered.read().get(block_type).cloned();
		tracing::debug!(
			block_type = %block_type,
			found = found.is_some(),
			"resolved discovered render callback"
		);
		// Concurrent writers compute the same value, last write wins
		self.cache
			.write()
			.insert(block_type.to_string(), found.clone());
		found
	}

	/// Drops every memoized lookup.
	pub fn clear_cache(&self) {
		self.cache.write().clear();
	}

	/// Number of memoized lookups (hits and misses).
	pub fn cached_len(&self) -> usize {
		self.cache.read().len()
	}
}

impl fmt::Debug for BlockRenderCallbackResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BlockRenderCallbackResolver")
			.field("explicit", &self.explicit.read().keys().collect::<Vec<_>>())
			.field("discovered", &self.discovered.read().keys().collect::<Vec<_>>())
			.field("cached", &self.cache.read().len())
			.finish()
	}
}
