//! Dotted block schema versions.
//!
//! Block versions look like semver but are compared leniently: numeric per
//! segment, with missing segments treated as zero, so `1.2` and `1.2.0`
//! are equal. Stored content written by older builders does not always
//! carry three segments, which rules out strict semver parsing.

use std::cmp::Ordering;

/// Version assigned to blocks and block types that do not declare one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Compares two dotted version strings segment by segment.
///
/// A segment that is not a plain number compares by its leading digits
/// (`"2rc1"` counts as 2), and a segment without digits counts as 0.
///
/// # Example
///
/// ```
/// use lara_blocks::version::compare_versions;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_versions("1.2.0", "1.10.0"), Ordering::Less);
/// assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
/// ```
pub fn compare_versions(a: &str, b: &str) -> Ordering {
	let left = segments(a);
	let right = segments(b);
	let len = left.len().max(right.len());

	for i in 0..len {
		let l = left.get(i).copied().unwrap_or(0);
		let r = right.get(i).copied().unwrap_or(0);
		match l.cmp(&r) {
			Ordering::Equal => continue,
			other => return other,
		}
	}

	Ordering::Equal
}

/// Returns true when `a` is strictly older than `b`.
pub fn is_older(a: &str, b: &str) -> bool {
	compare_versions(a, b) == Ordering::Less
}

fn segments(version: &str) -> Vec<u64> {
	version
		.trim()
		.trim_start_matches(['v', 'V'])
		.split('.')
		.map(|segment| {
			let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
			digits.parse().unwrap_or(0)
		})
		.collect()
}

/// Converts a file-name version (`v1_0_0`) to dotted form (`1.0.0`).
///
/// Returns `None` if the stem does not start with `v` or contains anything
/// other than digits and underscores.
pub fn version_from_file_stem(stem: &str) -> Option<String> {
	let body = stem.strip_prefix('v')?;
	if body.is_empty()
		|| body.starts_with('_')
		|| body.ends_with('_')
		|| body.contains("__")
		|| !body.chars().all(|c| c.is_ascii_digit() || c == '_')
	{
		return None;
	}
	Some(body.replace('_', "."))
}

/// Parses a migration file stem of the form `v{from}_to_v{to}`.
///
/// # Example
///
/// ```
/// use lara_blocks::version::parse_migration_stem;
///
/// assert_eq!(
///     parse_migration_stem("v1_0_0_to_v1_1_0"),
///     Some(("1.0.0".to_string(), "1.1.0".to_string()))
/// );
/// assert_eq!(parse_migration_stem("README"), None);
/// ```
pub fn parse_migration_stem(stem: &str) -> Option<(String, String)> {
	let (from, to) = stem.split_once("_to_")?;
	Some((version_from_file_stem(from)?, version_from_file_stem(to)?))
}
