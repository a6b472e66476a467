//! Tunables for the diagram, the column set, and the remote data store.

use crate::data::ColumnKey;

/// Pixel margins around the diagram area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margin {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

/// Geometry, timing and colour settings of the flow diagram.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagramConfig {
	pub margin: Margin,
	pub node_width: f64,
	pub min_node_height: f64,
	pub max_node_height: f64,
	/// Minimum vertical gap between stacked nodes.
	pub node_spacing: f64,
	pub link_min_width: f64,
	/// Stroke width contributed by each record on a link.
	pub link_width_per_record: f64,
	pub link_opacity: f64,
	/// Extra pick radius around thin links.
	pub link_hit_tolerance: f64,
	/// Two clicks closer than this count as a double-click.
	pub double_click_ms: f64,
	pub snap_back_ms: f64,
	pub label_box_width: f64,
	pub label_box_height: f64,
	/// Distance of the column label baseline above the top margin.
	pub label_offset: f64,
	pub max_label_chars: usize,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub background: &'static str,
	pub dimmed_color: &'static str,
	pub active_color: &'static str,
	pub frozen_color: &'static str,
	pub intersection_color: &'static str,
	pub clicked_outline: &'static str,
	pub text_color: &'static str,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self {
			margin: Margin {
				top: 60.0,
				right: 80.0,
				bottom: 20.0,
				left: 100.0,
			},
			node_width: 15.0,
			min_node_height: 6.0,
			max_node_height: 48.0,
			node_spacing: 4.0,
			link_min_width: 2.0,
			link_width_per_record: 2.0,
			link_opacity: 0.5,
			link_hit_tolerance: 4.0,
			double_click_ms: 250.0,
			snap_back_ms: 200.0,
			label_box_width: 100.0,
			label_box_height: 25.0,
			label_offset: 20.0,
			max_label_chars: 25,
			min_zoom: 0.5,
			max_zoom: 3.0,
			background: "#ffffff",
			dimmed_color: "#e4e4e4",
			active_color: "#2f6fd6",
			frozen_color: "#2f6fd6",
			intersection_color: "#2ca02c",
			clicked_outline: "#111111",
			text_color: "#222222",
		}
	}
}

/// One categorical column of the dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
	pub key: ColumnKey,
	pub label: String,
	/// Field name in the remote table.
	pub remote_field: String,
	/// Offered in the filter bar.
	pub filterable: bool,
	pub visible_by_default: bool,
}

impl ColumnSpec {
	fn new(key: &str, label: &str, remote_field: &str, filterable: bool, visible: bool) -> Self {
		Self {
			key: ColumnKey::from(key),
			label: label.to_owned(),
			remote_field: remote_field.to_owned(),
			filterable,
			visible_by_default: visible,
		}
	}
}

/// Key of the organism column; its tokens carry the genetic-modification
/// suffix.
pub const ORGANISM: &str = "organism";

/// Key of the column preceded by the role divider.
pub const ROLE_DIGITAL: &str = "role-digital";

/// The column set in default display order.
pub fn default_columns() -> Vec<ColumnSpec> {
	vec![
		ColumnSpec::new(ORGANISM, "Organism", "Organism", true, true),
		ColumnSpec::new("trigger", "Trigger", "Trigger", true, true),
		ColumnSpec::new(
			"output",
			"Observable Output",
			"Observable Output of organism",
			true,
			true,
		),
		ColumnSpec::new("scale", "Scale", "Scale", true, true),
		ColumnSpec::new("temporality", "Speed", "Speed of reaction", true, true),
		ColumnSpec::new(
			"temporality2",
			"Duration",
			"Duration of reaction",
			false,
			false,
		),
		ColumnSpec::new(
			"role-organism",
			"Organism → Digital Role",
			"Role of organism for digital",
			false,
			true,
		),
		ColumnSpec::new(
			ROLE_DIGITAL,
			"Digital → Organism Role",
			"Role of digital for organism",
			false,
			true,
		),
	]
}

/// Visible sequence used on start-up and by "Reset View".
pub fn default_visible(columns: &[ColumnSpec]) -> Vec<ColumnKey> {
	columns
		.iter()
		.filter(|c| c.visible_by_default)
		.map(|c| c.key.clone())
		.collect()
}

/// User-facing label of a column, falling back to its key.
pub fn label_for(columns: &[ColumnSpec], key: &ColumnKey) -> String {
	columns
		.iter()
		.find(|c| &c.key == key)
		.map(|c| c.label.clone())
		.unwrap_or_else(|| key.to_string())
}

/// Remote names of the scalar fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldNames {
	pub name: String,
	pub author: String,
	pub image_ref: String,
	pub year: String,
	pub gmo: String,
	pub url: String,
}

impl Default for FieldNames {
	fn default() -> Self {
		Self {
			name: "Project Title".into(),
			author: "Author(s)/Creator(s)".into(),
			image_ref: "Image Link".into(),
			year: "Year".into(),
			gmo: "Genetically Modified".into(),
			url: "Website Link".into(),
		}
	}
}

/// Where the records live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
	pub api_root: String,
	pub base_id: String,
	pub table_id: String,
	pub token: String,
	pub fields: FieldNames,
}

impl SourceConfig {
	/// Settings baked in at build time from `AIRTABLE_BASE_ID`,
	/// `AIRTABLE_TABLE_ID` and `AIRTABLE_TOKEN`.
	pub fn from_build_env() -> Self {
		Self {
			api_root: "https://api.airtable.com/v0".into(),
			base_id: option_env!("AIRTABLE_BASE_ID")
				.unwrap_or("appRiU9sw7RjOdGbk")
				.into(),
			table_id: option_env!("AIRTABLE_TABLE_ID")
				.unwrap_or("tblYix3jMMM9MhIds")
				.into(),
			token: option_env!("AIRTABLE_TOKEN").unwrap_or_default().into(),
			fields: FieldNames::default(),
		}
	}

	/// Endpoint of the records table.
	pub fn table_url(&self) -> String {
		format!("{}/{}/{}", self.api_root, self.base_id, self.table_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_visible_skips_hidden_columns() {
		let columns = default_columns();
		let visible = default_visible(&columns);
		assert_eq!(visible.len(), 7);
		assert!(!visible.contains(&ColumnKey::from("temporality2")));
		assert_eq!(visible.first(), Some(&ColumnKey::from(ORGANISM)));
		assert_eq!(visible.last(), Some(&ColumnKey::from(ROLE_DIGITAL)));
	}

	#[test]
	fn unknown_column_label_falls_back_to_key() {
		assert_eq!(label_for(&default_columns(), &"habitat".into()), "habitat");
		assert_eq!(label_for(&default_columns(), &"scale".into()), "Scale");
	}
}
