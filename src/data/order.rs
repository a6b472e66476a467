use std::cmp::Ordering;
use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::record::{ColumnKey, SystemRecord};

/// Speed keywords, fastest first.
pub const TIME_UNITS: &[&str] = &["second", "minute", "hour", "day", "week"];

/// Scale keywords, smallest first. `subcell` precedes `cell` so that
/// "subcellular" is not claimed by the shorter keyword.
pub const SCALE_UNITS: &[&str] = &["subcell", "cell", "organism", "population", "ecosystem"];

/// How the distinct values of a column are ordered top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueOrdering {
	/// Case-insensitive alphabetical.
	Lexicographic,
	/// By speed keyword, then `<`/`≤` before a bare `>`.
	Temporal,
	/// By scale keyword.
	Scale,
	/// input, others, output, power, then `none`.
	Role,
}

impl ValueOrdering {
	/// Ordering rule for a column key.
	pub fn for_column(column: &ColumnKey) -> Self {
		let key = column.as_str();
		if key.starts_with("temporality") {
			Self::Temporal
		} else if key.starts_with("scale") {
			Self::Scale
		} else if key.starts_with("role-") {
			Self::Role
		} else {
			Self::Lexicographic
		}
	}

	pub fn compare(self, a: &str, b: &str) -> Ordering {
		match self {
			Self::Lexicographic => locale_cmp(a, b),
			Self::Temporal => temporal_rank(a)
				.cmp(&temporal_rank(b))
				.then_with(|| locale_cmp(a, b)),
			Self::Scale => keyword_rank(a, SCALE_UNITS)
				.cmp(&keyword_rank(b, SCALE_UNITS))
				.then_with(|| locale_cmp(a, b)),
			Self::Role => role_bucket(a)
				.cmp(&role_bucket(b))
				.then_with(|| locale_cmp(a, b)),
		}
	}
}

/// Compares base letters case-insensitively, so "Érable" sorts with the
/// e's. Ties fall back to byte order to keep the order total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
	fold(a).cmp(fold(b)).then_with(|| a.cmp(b))
}

fn fold(s: &str) -> impl Iterator<Item = char> + '_ {
	s.nfd()
		.filter(|&c| !is_combining_mark(c))
		.flat_map(char::to_lowercase)
}

/// Distinct tokens of `column` across `records`, in display order.
///
/// Every place that enumerates a column's values (diagram nodes, filter
/// dropdowns, form suggestions) goes through here.
pub fn ordered_values<'a, I>(records: I, column: &ColumnKey) -> Vec<String>
where
	I: IntoIterator<Item = &'a SystemRecord>,
{
	let distinct: BTreeSet<&str> = records
		.into_iter()
		.flat_map(|r| r.values(column))
		.map(String::as_str)
		.collect();
	let ordering = ValueOrdering::for_column(column);
	let mut values: Vec<String> = distinct.into_iter().map(str::to_owned).collect();
	values.sort_by(|a, b| ordering.compare(a, b));
	values
}

fn keyword_rank(value: &str, keywords: &[&str]) -> usize {
	let lower = value.to_lowercase();
	keywords
		.iter()
		.position(|k| lower.contains(k))
		.unwrap_or(usize::MAX)
}

fn temporal_rank(value: &str) -> (usize, u8) {
	let unit = keyword_rank(value, TIME_UNITS);
	if unit == usize::MAX {
		return (unit, 1);
	}
	let op = if value.contains('<') || value.contains('≤') {
		0
	} else if value.contains('>') {
		2
	} else {
		1
	};
	(unit, op)
}

fn role_bucket(value: &str) -> u8 {
	let lower = value.to_lowercase();
	if lower.starts_with("input") {
		0
	} else if lower.starts_with("output") {
		2
	} else if lower.starts_with("power") {
		3
	} else if lower == "none" {
		4
	} else {
		1
	}
}
