//! The block engine.
//!
//! [`BlockEngine`] owns the registry, the render callback resolver and the
//! migrator. Build one at startup and share it (behind an `Arc`) with
//! whatever renders or loads content; there is no global state.
//!
//! Startup installs block types in this order, later sources overriding
//! earlier ones for the same type:
//!
//! 1. built-in blocks (feature `builtin`, unless `builtin_blocks = false`);
//! 2. packages submitted with [`register_block_package!`](crate::register_block_package);
//! 3. packages added to the builder;
//! 4. filesystem blocks from `blocks_dirs`;
//! 5. definitions, callbacks and migrations added to the builder.
//!
//! Callbacks added in step 5 are explicit overrides: they win over every
//! other render source, including ones installed later at runtime.
//!
//! # Example
//!
//! ```
//! use lara_blocks::prelude::*;
//!
//! let engine = BlockEngine::builder(BlocksSettings::default())
//!     .render_callback(
//!         "greeting",
//!         |props: &Props, _: BlockContext, _: Option<&str>| -> RenderResult<Option<String>> {
//!             let name = props.get("name").and_then(|v| v.as_str()).unwrap_or("there");
//!             Ok(Some(format!("<p>Hello, {name}!</p>")))
//!         },
//!     )
//!     .build()
//!     .unwrap();
//!
//! let html = engine.process_content(
//!     r#"<div data-lara-block="greeting" data-props='{"name":"Ada"}'></div>"#,
//!     BlockContext::Page,
//! );
//! assert_eq!(html, "<p>Hello, Ada!</p>");
//! ```

use crate::block::StoredBlock;
use crate::context::BlockContext;
use crate::discovery::BlockDiscovery;
use crate::error::{BlockResult, MigrationResult, RegistryResult};
use crate::migration::MigrationStep;
use crate::migrator::{BlockMigrator, MigrationReport, PendingMigration};
use crate::package::{BlockPackage, PackageRenderer, registered_packages};
use crate::registry::{BlockRegistry, BlockTypeDefinition};
use crate::renderer::BlockRenderer;
use crate::resolver::{BlockRenderCallbackResolver, RenderBlock, RenderCallback};
use crate::settings::BlocksSettings;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "builtin")]
use crate::builtin::{self, MarkdownSource};

/// Owns the block system state for one application.
pub struct BlockEngine {
	settings: BlocksSettings,
	registry: Arc<BlockRegistry>,
	resolver: Arc<BlockRenderCallbackResolver>,
	renderer: BlockRenderer,
	migrator: BlockMigrator,
}

/// Builder for [`BlockEngine`].
pub struct BlockEngineBuilder {
	settings: BlocksSettings,
	packages: Vec<Arc<dyn BlockPackage>>,
	definitions: Vec<BlockTypeDefinition>,
	callbacks: Vec<(String, RenderCallback)>,
	migrations: Vec<MigrationStep>,
	collect_registered_packages: bool,
	#[cfg(feature = "builtin")]
	markdown_source: Option<Arc<dyn MarkdownSource>>,
}

impl BlockEngineBuilder {
	fn new(settings: BlocksSettings) -> Self {
		Self {
			settings,
			packages: Vec::new(),
			definitions: Vec::new(),
			callbacks: Vec::new(),
			migrations: Vec::new(),
			collect_registered_packages: true,
			#[cfg(feature = "builtin")]
			markdown_source: None,
		}
	}

	/// Adds a block package.
	pub fn package<P>(mut self, package: P) -> Self
	where
		P: BlockPackage + 'static,
	{
		self.packages.push(Arc::new(package));
		self
	}

	/// Adds a block type definition.
	pub fn definition(mut self, definition: BlockTypeDefinition) -> Self {
		self.definitions.push(definition);
		self
	}

	/// Adds an explicit render callback.
	pub fn render_callback<R>(mut self, block_type: impl Into<String>, callback: R) -> Self
	where
		R: RenderBlock + 'static,
	{
		self.callbacks.push((block_type.into(), Arc::new(callback)));
		self
	}

	/// Adds a migration step.
	pub fn migration(mut self, step: MigrationStep) -> Self {
		self.migrations.push(step);
		self
	}

	/// Skips packages submitted with `register_block_package!`.
	pub fn without_registered_packages(mut self) -> Self {
		self.collect_registered_packages = false;
		self
	}

	/// Sets the source used by the built-in `markdown` block for `url` props.
	#[cfg(feature = "builtin")]
	pub fn markdown_source<S>(mut self, source: S) -> Self
	where
		S: MarkdownSource + 'static,
	{
		self.markdown_source = Some(Arc::new(source));
		self
	}

	/// Builds the engine.
	///
	/// # Errors
	///
	/// Returns an error if settings are invalid, or if a package or builder
	/// definition or migration is malformed. Malformed filesystem blocks are
	/// logged and skipped instead.
	pub fn build(self) -> BlockResult<BlockEngine> {
		self.settings.validate()?;

		let registry = Arc::new(BlockRegistry::new());
		let resolver = Arc::new(BlockRenderCallbackResolver::new());
		let migrator = BlockMigrator::new(Arc::clone(&registry))
			.with_strict(self.settings.migrations.strict);

		let engine = BlockEngine {
			renderer: BlockRenderer::new(Arc::clone(&resolver)),
			settings: self.settings,
			registry,
			resolver,
			migrator,
		};

		#[cfg(feature = "builtin")]
		if engine.settings.builtin_blocks {
			let words_per_minute = engine.settings.time_to_read.words_per_minute;
			for package in builtin::packages(words_per_minute, self.markdown_source) {
				engine.install_package(package)?;
			}
		}

		if self.collect_registered_packages {
			for registration in registered_packages() {
				tracing::debug!(package = registration.name, "installing registered block package");
				engine.install_package(Arc::from((registration.factory)()))?;
			}
		}

		for package in self.packages {
			engine.install_package(package)?;
		}

		engine.install_discovered();

		for definition in self.definitions {
			engine.registry.register(definition)?;
		}
		for (block_type, callback) in self.callbacks {
			engine.resolver.register_arc(block_type, callback);
		}
		for step in self.migrations {
			engine.migrator.register_migration(step)?;
		}

		tracing::debug!(
			block_types = engine.registry.len(),
			strict_migrations = engine.migrator.is_strict(),
			"block engine ready"
		);
		Ok(engine)
	}
}

impl BlockEngine {
	/// Creates a builder.
	pub fn builder(settings: BlocksSettings) -> BlockEngineBuilder {
		BlockEngineBuilder::new(settings)
	}

	/// Creates an engine from settings alone.
	pub fn new(settings: BlocksSettings) -> BlockResult<Self> {
		Self::builder(settings).build()
	}

	fn install_package(&self, package: Arc<dyn BlockPackage>) -> BlockResult<()> {
		let definition = package.definition();
		let block_type = definition.block_type.clone();

		self.registry.register(definition)?;
		for step in package.migrations() {
			self.migrator.register_migration(step)?;
		}
		self.resolver
			.add_discovered(block_type, Arc::new(PackageRenderer(package)));
		Ok(())
	}

	fn install_discovered(&self) {
		let discovered = BlockDiscovery::scan(&self.settings.blocks_dirs);
		for (block_type, block) in discovered {
			if let Some(definition) = block.definition {
				// Already validated during discovery
				if let Err(e) = self.registry.register(definition) {
					tracing::warn!(block_type = %block_type, error = %e, "skipping discovered definition");
				}
			}
			if let Some(template) = block.template {
				self.resolver.add_discovered(block_type.clone(), template);
			}
			for step in block.migrations {
				if let Err(e) = self.migrator.register_migration(step) {
					tracing::warn!(block_type = %block_type, error = %e, "skipping discovered migration");
				}
			}
		}
	}

	/// Settings the engine was built with.
	pub fn settings(&self) -> &BlocksSettings {
		&self.settings
	}

	/// Block type registry.
	pub fn registry(&self) -> &BlockRegistry {
		&self.registry
	}

	/// Render callback resolver.
	pub fn resolver(&self) -> &BlockRenderCallbackResolver {
		&self.resolver
	}

	/// Content renderer.
	pub fn renderer(&self) -> &BlockRenderer {
		&self.renderer
	}

	/// Block migrator.
	pub fn migrator(&self) -> &BlockMigrator {
		&self.migrator
	}

	/// Registers a block type definition at runtime.
	pub fn register_block(&self, definition: BlockTypeDefinition) -> RegistryResult<()> {
		self.registry.register(definition)?;
		// Current versions may have changed
		self.migrator.clear_cache();
		Ok(())
	}

	/// Registers a block package at runtime.
	pub fn register_package<P>(&self, package: P) -> BlockResult<()>
	where
		P: BlockPackage + 'static,
	{
		self.install_package(Arc::new(package))?;
		self.migrator.clear_cache();
		Ok(())
	}

	/// Registers an explicit render callback, overriding every other source.
	pub fn register_render_callback<R>(&self, block_type: impl Into<String>, callback: R)
	where
		R: RenderBlock + 'static,
	{
		self.resolver.register(block_type, callback);
	}

	/// Registers a migration step at runtime.
	pub fn register_migration(&self, step: MigrationStep) -> MigrationResult<()> {
		self.migrator.register_migration(step)
	}

	/// Renders every block marker in `content`.
	pub fn process_content(&self, content: &str, context: BlockContext) -> String {
		self.renderer.process_content(content, context)
	}

	/// Renders every block marker in `content` for the default context.
	pub fn process_content_default(&self, content: &str) -> String {
		self.renderer
			.process_content(content, self.settings.default_context)
	}

	/// Migrates a single block.
	pub fn migrate_block(&self, block: &StoredBlock) -> StoredBlock {
		self.migrator.migrate_block(block)
	}

	/// Migrates a single block and reports the steps taken.
	pub fn migrate_block_with_report(&self, block: &StoredBlock) -> (StoredBlock, MigrationReport) {
		self.migrator.migrate_block_with_report(block)
	}

	/// Migrates blocks, nested children included.
	pub fn migrate_blocks(&self, blocks: &[StoredBlock]) -> Vec<StoredBlock> {
		self.migrator.migrate_blocks(blocks)
	}

	/// Migrates the `blocks` list of a design document in place.
	pub fn migrate_design(&self, design: &mut JsonValue) -> usize {
		self.migrator.migrate_design(design)
	}

	/// Lists blocks behind their type's current version.
	pub fn blocks_needing_migration(&self, blocks: &[StoredBlock]) -> Vec<PendingMigration> {
		self.migrator.blocks_needing_migration(blocks)
	}

	/// Drops every lazily filled cache.
	pub fn clear_caches(&self) {
		self.resolver.clear_cache();
		self.migrator.clear_cache();
	}
}

impl fmt::Debug for BlockEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BlockEngine")
			.field("settings", &self.settings)
			.field("registry", &self.registry)
			.field("resolver", &self.resolver)
			.field("migrator", &self.migrator)
			.finish()
	}
}
