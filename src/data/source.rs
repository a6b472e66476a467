use std::collections::BTreeMap;

use log::{debug, error, info};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::error::{DataSourceError, LoadError};
use super::normalize::{normalize, normalize_str};
use super::record::{ColumnKey, SystemRecord};
use crate::config::{ColumnSpec, FieldNames, ORGANISM, SourceConfig};

/// What the page shows while records are being fetched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
	Loading,
	Failed(String),
	/// The store returned nothing usable.
	Empty,
	Ready,
}

impl LoadState {
	pub fn from_error(err: &LoadError) -> Self {
		match err {
			LoadError::EmptyDataset => Self::Empty,
			LoadError::Source(_) => Self::Failed(err.to_string()),
		}
	}
}

/// One page of the table listing.
#[derive(Debug, Deserialize)]
pub struct RecordPage {
	#[serde(default)]
	pub records: Vec<RemoteRecord>,
	/// Cursor of the next page, absent on the last one.
	#[serde(default)]
	pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteRecord {
	pub id: String,
	#[serde(default)]
	pub fields: Map<String, Value>,
}

/// Decode one listing page.
pub fn parse_page(body: &str) -> Result<RecordPage, DataSourceError> {
	serde_json::from_str(body).map_err(|e| DataSourceError::Decode(e.to_string()))
}

impl RemoteRecord {
	/// Map remote fields onto a [`SystemRecord`]. Organism tokens of
	/// genetically modified systems get a ` (gmo)` suffix.
	pub fn to_system(&self, fields: &FieldNames, columns: &[ColumnSpec]) -> SystemRecord {
		let text = |name: &str| self.fields.get(name).map(field_text).unwrap_or_default();
		let gmo = self.fields.get(&fields.gmo).is_some_and(truthy);

		let name = text(fields.name.as_str());
		let mut record = SystemRecord::new(
			self.id.clone(),
			if name.is_empty() {
				"Unnamed System".to_owned()
			} else {
				name
			},
		);
		record.author = text(fields.author.as_str());
		record.url = text(fields.url.as_str());
		record.image_ref = text(fields.image_ref.as_str());
		record.year = self.fields.get(&fields.year).and_then(year_of);
		record.gmo = gmo;

		for column in columns {
			let mut values = self
				.fields
				.get(&column.remote_field)
				.map(normalize)
				.unwrap_or_default();
			if gmo && column.key.as_str() == ORGANISM {
				for value in &mut values {
					value.push_str(" (gmo)");
				}
			}
			record = record.with_values(&column.key, values);
		}
		record
	}
}

/// Input of the add-system form. Column entries are raw comma-separated text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewSystem {
	pub name: String,
	pub author: String,
	pub url: String,
	pub image_ref: String,
	pub year: String,
	pub gmo: bool,
	pub columns: BTreeMap<String, String>,
}

/// Request body creating `system` in the remote table.
///
/// Blank scalars and empty columns are left out; `year` is only sent when it
/// parses as an integer; the modification flag is always sent.
pub fn create_payload(system: &NewSystem, fields: &FieldNames, columns: &[ColumnSpec]) -> Value {
	let mut out = Map::new();
	for (name, value) in [
		(&fields.name, &system.name),
		(&fields.author, &system.author),
		(&fields.image_ref, &system.image_ref),
		(&fields.url, &system.url),
	] {
		let value = value.trim();
		if !value.is_empty() {
			out.insert(name.clone(), Value::String(value.to_owned()));
		}
	}
	if let Ok(year) = system.year.trim().parse::<i64>() {
		out.insert(fields.year.clone(), json!(year));
	}
	out.insert(fields.gmo.clone(), Value::Bool(system.gmo));

	for column in columns {
		let Some(raw) = system.columns.get(column.key.as_str()) else {
			continue;
		};
		let values = normalize_str(raw);
		if !values.is_empty() {
			out.insert(column.remote_field.clone(), json!(values));
		}
	}
	json!({ "fields": out })
}

/// Client of the remote table (an Airtable base).
#[derive(Clone, Debug)]
pub struct AirtableClient {
	config: SourceConfig,
	columns: Vec<ColumnSpec>,
}

impl AirtableClient {
	pub fn new(config: SourceConfig, columns: Vec<ColumnSpec>) -> Self {
		Self { config, columns }
	}

	/// Fetch every page of the table. Records without an organism are
	/// dropped; an empty result is [`LoadError::EmptyDataset`].
	pub async fn load_records(&self) -> Result<Vec<SystemRecord>, LoadError> {
		info!("Loading records from {}", self.config.table_url());
		let organism = ColumnKey::from(ORGANISM);
		let mut records = Vec::new();
		let mut offset: Option<String> = None;

		loop {
			let url = self.page_url(offset.as_deref());
			let body = self.send("GET", &url, None).await?;
			let page = parse_page(&body)?;
			debug!("Fetched page with {} records", page.records.len());
			records.extend(
				page.records
					.iter()
					.map(|r| r.to_system(&self.config.fields, &self.columns))
					.filter(|r| r.has_values(&organism)),
			);
			match page.offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		if records.is_empty() {
			return Err(LoadError::EmptyDataset);
		}
		info!("Loaded {} records", records.len());
		Ok(records)
	}

	/// Create a record. The caller reloads on success.
	pub async fn submit_new_record(&self, system: &NewSystem) -> Result<(), DataSourceError> {
		let payload = create_payload(system, &self.config.fields, &self.columns);
		debug!("Submitting new record: {payload}");
		let url = self.config.table_url();
		match self.send("POST", &url, Some(&payload.to_string())).await {
			Ok(_) => {
				info!("Added record {:?}", system.name);
				Ok(())
			}
			Err(err) => {
				error!("Adding record failed: {err}");
				Err(err)
			}
		}
	}

	fn page_url(&self, offset: Option<&str>) -> String {
		let base = self.config.table_url();
		match offset {
			Some(cursor) => format!(
				"{base}?offset={}",
				String::from(js_sys::encode_uri_component(cursor))
			),
			None => base,
		}
	}

	async fn send(
		&self,
		method: &str,
		url: &str,
		body: Option<&str>,
	) -> Result<String, DataSourceError> {
		let init = RequestInit::new();
		init.set_method(method);
		init.set_mode(RequestMode::Cors);
		if let Some(body) = body {
			init.set_body(&JsValue::from_str(body));
		}
		let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;
		let headers = request.headers();
		headers
			.set("Authorization", &format!("Bearer {}", self.config.token))
			.map_err(js_error)?;
		headers
			.set("Content-Type", "application/json")
			.map_err(js_error)?;

		let window = web_sys::window()
			.ok_or_else(|| DataSourceError::Request("no window available".into()))?;
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(js_error)?
			.dyn_into()
			.map_err(js_error)?;
		let text = JsFuture::from(response.text().map_err(js_error)?)
			.await
			.map_err(js_error)?
			.as_string()
			.unwrap_or_default();

		if !response.ok() {
			return Err(DataSourceError::Status {
				status: response.status(),
				body: text,
			});
		}
		Ok(text)
	}
}

fn js_error(err: JsValue) -> DataSourceError {
	DataSourceError::Request(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

fn field_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.trim().to_owned(),
		Value::Null => String::new(),
		Value::Array(_) => normalize(value).join(", "),
		other => other.to_string(),
	}
}

fn truthy(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		other => !normalize(other).is_empty(),
	}
}

fn year_of(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n.as_i64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::config::default_columns;

	const PAGE: &str = r#"{
		"records": [
			{
				"id": "rec1",
				"fields": {
					"Project Title": "Moss Clock",
					"Author(s)/Creator(s)": " A. Grower ",
					"Year": 2021,
					"Genetically Modified": true,
					"Organism": ["Moss", "Algae"],
					"Trigger": "light, touch",
					"Scale": ["Organism"]
				}
			},
			{ "id": "rec2", "fields": { "Trigger": ["heat"] } }
		],
		"offset": "itr123/rec2"
	}"#;

	#[test]
	fn maps_remote_fields() {
		let page = parse_page(PAGE).unwrap();
		assert_eq!(page.offset.as_deref(), Some("itr123/rec2"));

		let record = page.records[0].to_system(&FieldNames::default(), &default_columns());
		assert_eq!(record.name, "Moss Clock");
		assert_eq!(record.author, "A. Grower");
		assert_eq!(record.year, Some(2021));
		assert!(record.gmo);
		assert_eq!(
			record.values(&ColumnKey::from("organism")),
			["Moss (gmo)", "Algae (gmo)"]
		);
		assert_eq!(record.values(&ColumnKey::from("trigger")), ["light", "touch"]);
		assert!(!record.has_values(&ColumnKey::from("output")));
	}

	#[test]
	fn unnamed_record_gets_placeholder() {
		let page = parse_page(PAGE).unwrap();
		let record = page.records[1].to_system(&FieldNames::default(), &default_columns());
		assert_eq!(record.name, "Unnamed System");
		assert!(!record.has_values(&ColumnKey::from("organism")));
	}

	#[test]
	fn malformed_body_is_decode_error() {
		assert!(matches!(parse_page("<html>"), Err(DataSourceError::Decode(_))));
	}

	#[test]
	fn payload_skips_blanks_and_splits_columns() {
		let mut system = NewSystem {
			name: "  Slime Router ".into(),
			year: "20x1".into(),
			..NewSystem::default()
		};
		system.columns.insert("organism".into(), "slime mould, ,bacteria".into());
		system.columns.insert("trigger".into(), "  ".into());

		let payload = create_payload(&system, &FieldNames::default(), &default_columns());
		assert_eq!(
			payload,
			json!({
				"fields": {
					"Project Title": "Slime Router",
					"Genetically Modified": false,
					"Organism": ["slime mould", "bacteria"]
				}
			})
		);
	}

	#[test]
	fn payload_parses_year() {
		let system = NewSystem {
			year: " 2019 ".into(),
			gmo: true,
			..NewSystem::default()
		};
		let payload = create_payload(&system, &FieldNames::default(), &[]);
		assert_eq!(payload["fields"]["Year"], json!(2019));
		assert_eq!(payload["fields"]["Genetically Modified"], json!(true));
	}

	#[test]
	fn first_page_requests_the_bare_table_url() {
		let config = SourceConfig {
			base_id: "appBase".into(),
			table_id: "tblSystems".into(),
			..SourceConfig::from_build_env()
		};
		let client = AirtableClient::new(config, Vec::new());
		assert_eq!(
			client.page_url(None),
			"https://api.airtable.com/v0/appBase/tblSystems"
		);
	}

	#[test]
	fn empty_dataset_maps_to_empty_state() {
		assert_eq!(LoadState::from_error(&LoadError::EmptyDataset), LoadState::Empty);
		let failed = LoadState::from_error(&LoadError::Source(DataSourceError::Status {
			status: 401,
			body: "denied".into(),
		}));
		assert_eq!(failed, LoadState::Failed("Failed to load data: HTTP error 401: denied".into()));
	}
}
