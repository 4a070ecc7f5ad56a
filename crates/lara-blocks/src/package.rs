//! Statically linked block packages.
//!
//! A block package bundles everything a block type needs: its definition,
//! its render function and its migrations. Packages are registered with a
//! [`crate::engine::BlockEngineBuilder`], or at compile time with
//! [`register_block_package!`](crate::register_block_package), which the
//! engine collects on startup.
//!
//! # Example
//!
//! ```
//! use lara_blocks::prelude::*;
//!
//! struct Quote;
//!
//! impl BlockPackage for Quote {
//!     fn definition(&self) -> BlockTypeDefinition {
//!         BlockTypeDefinition::builder("quote")
//!             .label("Quote")
//!             .version("1.1.0")
//!             .build()
//!     }
//!
//!     fn render(
//!         &self,
//!         props: &Props,
//!         _context: BlockContext,
//!         _block_id: Option<&str>,
//!     ) -> RenderResult<Option<String>> {
//!         let text = props.get("text").and_then(|v| v.as_str()).unwrap_or_default();
//!         Ok(Some(format!("<blockquote>{text}</blockquote>")))
//!     }
//!
//!     fn migrations(&self) -> Vec<MigrationStep> {
//!         vec![MigrationStep::new("quote", "1.0.0", "1.1.0", |props| {
//!             let mut next = props.clone();
//!             if let Some(body) = next.remove("body") {
//!                 next.insert("text".to_string(), body);
//!             }
//!             Ok(next)
//!         })]
//!     }
//! }
//!
//! let quote = Quote;
//! assert_eq!(quote.definition().version, "1.1.0");
//! assert_eq!(quote.migrations().len(), 1);
//! ```

use crate::block::Props;
use crate::context::BlockContext;
use crate::error::RenderResult;
use crate::migration::MigrationStep;
use crate::registry::BlockTypeDefinition;
use crate::resolver::RenderBlock;
use std::sync::Arc;

/// A block type shipped as code.
pub trait BlockPackage: Send + Sync {
	/// Definition registered in the block registry.
	fn definition(&self) -> BlockTypeDefinition;

	/// Renders a block of this type, or returns `None` to leave the marker.
	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		block_id: Option<&str>,
	) -> RenderResult<Option<String>>;

	/// Migration steps for older stored versions of this type.
	fn migrations(&self) -> Vec<MigrationStep> {
		Vec::new()
	}
}

/// Render callback that delegates to a package.
pub(crate) struct PackageRenderer(pub(crate) Arc<dyn BlockPackage>);

impl RenderBlock for PackageRenderer {
	fn render(
		&self,
		props: &Props,
		context: BlockContext,
		block_id: Option<&str>,
	) -> RenderResult<Option<String>> {
		self.0.render(props, context, block_id)
	}
}

/// Compile-time package registration entry.
///
/// Submitted with [`register_block_package!`](crate::register_block_package)
/// and collected by `inventory`.
pub struct BlockPackageRegistration {
	/// Package name, used in logs.
	pub name: &'static str,
	/// Creates the package.
	pub factory: fn() -> Box<dyn BlockPackage>,
}

inventory::collect!(BlockPackageRegistration);

/// Iterates over every compile-time registered package.
pub fn registered_packages() -> impl Iterator<Item = &'static BlockPackageRegistration> {
	inventory::iter::<BlockPackageRegistration>.into_iter()
}

/// Register a block package at compile time.
///
/// # Example
///
/// ```rust,ignore
/// use lara_blocks::register_block_package;
///
/// register_block_package!("quote", || Box::new(QuoteBlock));
/// ```
#[macro_export]
macro_rules! register_block_package {
	($name:expr, $factory:expr) => {
		$crate::inventory::submit! {
			$crate::package::BlockPackageRegistration {
				name: $name,
				factory: $factory,
			}
		}
	};
}
