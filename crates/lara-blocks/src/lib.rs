//! Lara Blocks - Block-based content rendering for Lara
//!
//! Content built in the Lara page, email and campaign builders is stored as
//! HTML with embedded block markers, plus a JSON design document holding
//! each block's props and schema version. This crate turns markers into
//! rendered HTML and keeps stored blocks compatible as block schemas evolve.
//!
//! # Features
//!
//! - **Marker rendering**: markers are located by string scanning (no DOM),
//!   including nested markers, and replaced by their render callback output
//! - **Graceful degradation**: unknown types, bad props and failing
//!   callbacks leave the original markup in place
//! - **Lazy migrations**: stored blocks are upgraded on read along a path of
//!   version-to-version migration steps
//! - **Pluggable blocks**: block packages in code, or block directories
//!   holding `block.json`, a Tera `render.html` and JSON migration files
//! - **Built-in blocks**: heading, text, button, divider, spacer,
//!   time-to-read and markdown (with the `builtin` feature)
//!
//! # Marker format
//!
//! ```text
//! <div data-lara-block="heading" data-block-id="b1" data-props='{"text":"Hello"}'></div>
//! ```
//!
//! # Quick Start
//!
//! ```
//! # #[cfg(feature = "builtin")]
//! # {
//! use lara_blocks::prelude::*;
//!
//! let engine = BlockEngine::new(BlocksSettings::default()).unwrap();
//!
//! let html = engine.process_content(
//!     r#"<h1>News</h1><div data-lara-block="divider" data-props='{}'></div>"#,
//!     BlockContext::Page,
//! );
//! assert!(html.starts_with(r#"<h1>News</h1><hr class="lara-divider""#));
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//!                 ┌───────────────────────────┐
//!                 │        BlockEngine        │
//!                 └─────────────┬─────────────┘
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//! ┌──────▼──────┐   ┌───────────▼──────────┐   ┌───────▼──────┐
//! │BlockRegistry│   │    BlockRenderer     │   │ BlockMigrator│
//! └─────────────┘   │ scanner + resolver   │   │ path search  │
//!                   └──────────────────────┘   └──────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod block;
pub mod context;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod migration;
pub mod migrator;
pub mod package;
pub mod registry;
pub mod renderer;
pub mod resolver;
pub mod scanner;
pub mod settings;
pub mod template;
pub mod text;
pub mod version;

#[cfg(feature = "builtin")]
pub mod builtin;

/// Re-export commonly used types.
pub mod prelude {
	pub use crate::block::{BlockMarker, Props, StoredBlock};
	pub use crate::context::BlockContext;
	pub use crate::engine::{BlockEngine, BlockEngineBuilder};
	pub use crate::error::{
		BlockError, BlockResult, MigrationError, MigrationResult, RegistryError, RegistryResult,
		RenderError, RenderResult, SettingsError,
	};
	pub use crate::migration::{MigrationStep, PropOperation};
	pub use crate::migrator::{BlockMigrator, MigrationReport, PendingMigration};
	pub use crate::package::BlockPackage;
	pub use crate::register_block_package;
	pub use crate::registry::{BlockRegistry, BlockTypeDefinition};
	pub use crate::renderer::BlockRenderer;
	pub use crate::resolver::{BlockRenderCallbackResolver, RenderBlock, RenderCallback};
	pub use crate::scanner::ContentBlockScanner;
	pub use crate::settings::BlocksSettings;

	#[cfg(feature = "builtin")]
	pub use crate::builtin::MarkdownSource;
}

// Re-export inventory for block package registration
pub use inventory;
