use std::collections::{BTreeMap, BTreeSet};

use super::record::{ColumnKey, SystemRecord};

/// Conjunction of `column = value` predicates applied before the graph is
/// built. A column without a selection matches every record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
	selected: BTreeMap<ColumnKey, String>,
}

impl Filters {
	/// Select `value` for `column`; an empty value clears that column.
	pub fn set(&mut self, column: ColumnKey, value: &str) {
		let value = value.trim();
		if value.is_empty() {
			self.selected.remove(&column);
		} else {
			self.selected.insert(column, value.to_owned());
		}
	}

	pub fn get(&self, column: &ColumnKey) -> Option<&str> {
		self.selected.get(column).map(String::as_str)
	}

	pub fn is_active(&self) -> bool {
		!self.selected.is_empty()
	}

	pub fn matches(&self, record: &SystemRecord) -> bool {
		self.selected
			.iter()
			.all(|(column, value)| record.values(column).iter().any(|v| v == value))
	}

	/// Records passing every predicate, in their original order.
	pub fn apply(&self, records: &[SystemRecord]) -> Vec<SystemRecord> {
		records
			.iter()
			.filter(|r| self.matches(r))
			.cloned()
			.collect()
	}

	/// Ids of the matching records, or `None` while no filter is set.
	pub fn highlight_ids(&self, records: &[SystemRecord]) -> Option<BTreeSet<String>> {
		self.is_active().then(|| {
			records
				.iter()
				.filter(|r| self.matches(r))
				.map(|r| r.id.clone())
				.collect()
		})
	}
}
