//! # Lara
//!
//! Block-based content rendering and migration for the Lara CMS.
//!
//! Pages, emails and campaigns are stored as HTML containing block markers.
//! Lara renders those markers through registered block types and upgrades
//! stored block props between schema versions when they are read.
//!
//! ## Feature Flags
//!
//! - `full` (default) - Everything below
//! - `blocks` - Block registry, renderer and migrator
//! - `builtin-blocks` - Built-in block types (heading, text, button, divider,
//!   spacer, time-to-read, markdown)
//!
//! ## Quick Example
//!
//! ```
//! # #[cfg(feature = "builtin-blocks")]
//! # {
//! use lara::prelude::*;
//!
//! let engine = BlockEngine::new(BlocksSettings::default()).unwrap();
//! let html = engine.process_content(
//! 	r#"<div data-lara-block="heading" data-props='{"text":"Hi","level":2}'></div>"#,
//! 	BlockContext::Page,
//! );
//! assert!(html.contains("Hi</h2>"));
//! # }
//! ```

#[cfg(feature = "blocks")]
pub use lara_blocks as blocks;

#[cfg(feature = "blocks")]
pub use lara_blocks::{
	context::BlockContext,
	engine::{BlockEngine, BlockEngineBuilder},
	error::BlockError,
	register_block_package,
	settings::BlocksSettings,
};

/// Re-export commonly used types.
pub mod prelude {
	#[cfg(feature = "blocks")]
	pub use lara_blocks::prelude::*;
}
