use serde::{Deserialize, Serialize};

use super::record::{ColumnKey, SystemRecord};

/// Download name of the exported document.
pub const EXPORT_FILE_NAME: &str = "bio-digital-systems.json";

/// The downloadable snapshot of what the diagram currently shows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
	pub records: Vec<SystemRecord>,
	pub visible_columns: Vec<ColumnKey>,
	/// RFC 3339 timestamp supplied by the caller.
	pub timestamp: String,
}

impl ExportSnapshot {
	pub fn new(
		records: Vec<SystemRecord>,
		visible_columns: Vec<ColumnKey>,
		timestamp: impl Into<String>,
	) -> Self {
		Self {
			records,
			visible_columns,
			timestamp: timestamp.into(),
		}
	}

	/// Pretty-printed UTF-8 JSON with no envelope around the snapshot.
	pub fn to_json_pretty(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}

	/// Parse a snapshot, re-applying the record token invariant.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		let mut snapshot: Self = serde_json::from_str(json)?;
		snapshot.records = snapshot
			.records
			.into_iter()
			.map(SystemRecord::renormalized)
			.collect();
		Ok(snapshot)
	}
}
