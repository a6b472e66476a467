//! Toolbar, filter dropdowns and column toggles above the diagram.

use std::collections::BTreeMap;
use std::fmt;

use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlAnchorElement;

use crate::config::ColumnSpec;
use crate::data::{ColumnKey, ExportSnapshot, Filters};

/// Fewest columns the diagram may show.
pub const MIN_VISIBLE_COLUMNS: usize = 2;

/// A show/hide toggle that would leave too few columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TooFewColumns;

impl fmt::Display for TooFewColumns {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "At least {MIN_VISIBLE_COLUMNS} columns must be visible")
	}
}

impl std::error::Error for TooFewColumns {}

/// Column sequence after showing or hiding `key`. Re-shown columns go to
/// the end.
pub fn toggle_column(
	visible: &[ColumnKey],
	key: &ColumnKey,
	show: bool,
) -> Result<Vec<ColumnKey>, TooFewColumns> {
	if show && visible.contains(key) {
		return Ok(visible.to_vec());
	}
	let mut next: Vec<ColumnKey> = visible.iter().filter(|c| *c != key).cloned().collect();
	if show {
		next.push(key.clone());
	}
	if next.len() < MIN_VISIBLE_COLUMNS {
		return Err(TooFewColumns);
	}
	Ok(next)
}

/// Offer `snapshot` as a file download.
pub fn download_snapshot(snapshot: &ExportSnapshot, file_name: &str) -> Result<(), JsValue> {
	let json = snapshot
		.to_json_pretty()
		.map_err(|e| JsValue::from_str(&e.to_string()))?;
	let href = format!(
		"data:application/json;charset=utf-8,{}",
		js_sys::encode_uri_component(&json)
	);
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document available"))?;
	let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	anchor.set_href(&href);
	anchor.set_download(file_name);
	anchor.click();
	info!("Exported {} records to {file_name}", snapshot.records.len());
	Ok(())
}

#[component]
pub fn Toolbar(
	on_add: Callback<()>,
	on_reset: Callback<()>,
	on_export: Callback<()>,
	on_refresh: Callback<()>,
) -> impl IntoView {
	view! {
		<div class="toolbar">
			<button class="btn btn-primary" on:click=move |_| on_add.run(())>
				"Add New System"
			</button>
			<button class="btn" on:click=move |_| on_reset.run(())>
				"Reset View"
			</button>
			<button class="btn" on:click=move |_| on_export.run(())>
				"Export Data"
			</button>
			<button class="btn" on:click=move |_| on_refresh.run(())>
				"Refresh Data"
			</button>
		</div>
	}
}

/// One dropdown per filterable column; the empty option clears it.
#[component]
pub fn FilterBar(
	columns: Vec<ColumnSpec>,
	#[prop(into)] options: Signal<BTreeMap<ColumnKey, Vec<String>>>,
	filters: RwSignal<Filters>,
) -> impl IntoView {
	let dropdowns = columns
		.into_iter()
		.filter(|c| c.filterable)
		.map(|spec| {
			let (key, key_change) = (spec.key.clone(), spec.key.clone());
			let key_options = spec.key.clone();
			view! {
				<label class="filter">
					<span>{spec.label.clone()}</span>
					<select
						prop:value=move || {
							filters.with(|f| f.get(&key).unwrap_or_default().to_owned())
						}
						on:change=move |ev| {
							let value = event_target_value(&ev);
							filters.update(|f| f.set(key_change.clone(), &value));
						}
					>
						<option value="">"All"</option>
						{move || {
							options
								.with(|o| o.get(&key_options).cloned().unwrap_or_default())
								.into_iter()
								.map(|v| view! { <option value=v.clone()>{v.clone()}</option> })
								.collect_view()
						}}
					</select>
				</label>
			}
		})
		.collect_view();

	view! { <div class="filter-bar">{dropdowns}</div> }
}

/// Show/hide checkboxes for every column.
#[component]
pub fn ColumnToggles(
	columns: Vec<ColumnSpec>,
	visible: RwSignal<Vec<ColumnKey>>,
	notice: RwSignal<Option<String>>,
) -> impl IntoView {
	let toggles = columns
		.into_iter()
		.map(|spec| {
			let (key, key_change) = (spec.key.clone(), spec.key.clone());
			view! {
				<label class="column-toggle">
					<input
						type="checkbox"
						prop:checked=move || visible.with(|v| v.contains(&key))
						on:change=move |ev| {
							let show = event_target_checked(&ev);
							match toggle_column(&visible.get_untracked(), &key_change, show) {
								Ok(next) => {
									notice.set(None);
									visible.set(next);
								}
								Err(err) => {
									warn!("Refused column toggle: {err}");
									notice.set(Some(err.to_string()));
									// Re-sync the checkbox with the unchanged sequence.
									visible.notify();
								}
							}
						}
					/>
					{spec.label.clone()}
				</label>
			}
		})
		.collect_view();

	view! {
		<div class="column-toggles">
			{toggles}
			{move || notice.get().map(|n| view! { <span class="notice">{n}</span> })}
		</div>
	}
}
