//! Rendering contexts.
//!
//! A context decides which blocks a builder may offer and how a block
//! renders: email output favours inline styles, page and campaign output
//! uses class names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Builder context a block is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockContext {
	/// Email templates.
	Email,
	/// Web pages and posts.
	Page,
	/// Marketing campaigns.
	Campaign,
}

impl BlockContext {
	/// All known contexts, in declaration order.
	pub const ALL: [BlockContext; 3] = [Self::Email, Self::Page, Self::Campaign];

	/// Returns the wire name of the context.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Email => "email",
			Self::Page => "page",
			Self::Campaign => "campaign",
		}
	}

	/// Whether output should use inline styles instead of classes.
	pub fn is_email(&self) -> bool {
		matches!(self, Self::Email)
	}
}

impl Default for BlockContext {
	fn default() -> Self {
		Self::Page
	}
}

impl fmt::Display for BlockContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown context name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown block context: {0}")]
pub struct UnknownContext(pub String);

impl FromStr for BlockContext {
	type Err = UnknownContext;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"email" => Ok(Self::Email),
			"page" => Ok(Self::Page),
			"campaign" => Ok(Self::Campaign),
			other => Err(UnknownContext(other.to_string())),
		}
	}
}
