use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable key of a visualisation column, e.g. `organism` or `role-digital`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnKey(String);

impl ColumnKey {
	/// Wrap a raw key.
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	/// The raw key text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ColumnKey {
	fn from(key: &str) -> Self {
		Self(key.to_owned())
	}
}

impl fmt::Display for ColumnKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One bio-digital system as loaded from the data store.
///
/// Categorical columns are kept in a key-addressed map so columns declared
/// later by the remote schema need no code change. Every column list holds
/// distinct, trimmed, non-empty tokens in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemRecord {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub author: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub image_ref: String,
	#[serde(default)]
	pub year: Option<i64>,
	#[serde(default)]
	pub gmo: bool,
	#[serde(flatten)]
	columns: BTreeMap<String, Vec<String>>,
}

impl SystemRecord {
	/// Start a record with the given id and display name and no column data.
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			..Self::default()
		}
	}

	/// Builder-style setter for one column. Tokens are trimmed, empties are
	/// dropped, and repeats keep only their first occurrence.
	pub fn with_values<I, S>(mut self, column: &ColumnKey, values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut tokens: Vec<String> = Vec::new();
		for value in values {
			let token = value.as_ref().trim();
			if !token.is_empty() && !tokens.iter().any(|t| t == token) {
				tokens.push(token.to_owned());
			}
		}
		if tokens.is_empty() {
			self.columns.remove(column.as_str());
		} else {
			self.columns.insert(column.as_str().to_owned(), tokens);
		}
		self
	}

	/// Tokens held for `column`; empty when the record has no data there.
	pub fn values(&self, column: &ColumnKey) -> &[String] {
		self.columns
			.get(column.as_str())
			.map(Vec::as_slice)
			.unwrap_or_default()
	}

	pub fn has_values(&self, column: &ColumnKey) -> bool {
		!self.values(column).is_empty()
	}

	/// Re-apply the token invariant to every column, e.g. after importing
	/// a snapshot written by hand.
	pub fn renormalized(self) -> Self {
		let Self {
			id,
			name,
			author,
			url,
			image_ref,
			year,
			gmo,
			columns,
		} = self;
		let base = Self {
			id,
			name,
			author,
			url,
			image_ref,
			year,
			gmo,
			columns: BTreeMap::new(),
		};
		columns.into_iter().fold(base, |record, (key, values)| {
			record.with_values(&ColumnKey::new(key), values)
		})
	}

	/// Column keys this record carries data for.
	pub fn column_keys(&self) -> impl Iterator<Item = ColumnKey> + '_ {
		self.columns.keys().map(|k| ColumnKey::new(k.as_str()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn with_values_trims_and_dedupes() {
		let organism = ColumnKey::from("organism");
		let record =
			SystemRecord::new("rec1", "Moss Clock").with_values(&organism, [" moss ", "", "moss", "slime"]);
		assert_eq!(record.values(&organism), ["moss", "slime"]);
	}

	#[test]
	fn empty_column_is_absent() {
		let trigger = ColumnKey::from("trigger");
		let record = SystemRecord::new("rec1", "x").with_values(&trigger, ["  "]);
		assert!(!record.has_values(&trigger));
		assert_eq!(record.column_keys().count(), 0);
	}

	#[test]
	fn serializes_columns_flat() {
		let scale = ColumnKey::from("scale");
		let record = SystemRecord::new("rec1", "x").with_values(&scale, ["cell"]);
		let json = serde_json::to_value(&record).unwrap();
		assert_eq!(json["scale"], serde_json::json!(["cell"]));
		assert_eq!(json["imageRef"], serde_json::json!(""));

		let back: SystemRecord = serde_json::from_value(json).unwrap();
		assert_eq!(back, record);
	}

	#[test]
	fn renormalized_repairs_imported_tokens() {
		let json = serde_json::json!({
			"id": "rec9",
			"name": "Imported",
			"output": [" glow ", "", "glow"],
		});
		let record: SystemRecord = serde_json::from_value(json).unwrap();
		let record = record.renormalized();
		assert_eq!(record.values(&ColumnKey::from("output")), ["glow"]);
	}
}
