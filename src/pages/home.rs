use std::collections::BTreeMap;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};

use crate::components::add_system::AddSystemForm;
use crate::components::controls::{ColumnToggles, FilterBar, Toolbar, download_snapshot};
use crate::components::detail_panel::DetailPanel;
use crate::components::flow_diagram::{DetailRequest, FlowDiagramCanvas, GlobalCounts};
use crate::config::{ColumnSpec, ORGANISM, SourceConfig, default_columns, default_visible};
use crate::data::{
	AirtableClient, ColumnKey, EXPORT_FILE_NAME, ExportSnapshot, Filters, LoadState, SystemRecord,
	ordered_values,
};

/// Summary shown above the diagram.
pub fn stats_line(records: &[SystemRecord]) -> String {
	let organisms = ordered_values(records, &ColumnKey::from(ORGANISM)).len();
	format!("{} Total Systems, {organisms} Unique Organisms", records.len())
}

/// Ordered distinct values of every column, for dropdowns and suggestions.
pub fn value_options(
	records: &[SystemRecord],
	columns: &[ColumnSpec],
) -> BTreeMap<ColumnKey, Vec<String>> {
	columns
		.iter()
		.map(|c| (c.key.clone(), ordered_values(records, &c.key)))
		.collect()
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let columns = StoredValue::new(default_columns());
	let client = StoredValue::new(AirtableClient::new(
		SourceConfig::from_build_env(),
		columns.get_value(),
	));

	let all_records = RwSignal::new(Vec::<SystemRecord>::new());
	let load_state = RwSignal::new(LoadState::Loading);
	let filters = RwSignal::new(Filters::default());
	let visible = RwSignal::new(columns.with_value(|c| default_visible(c)));
	let detail = RwSignal::new(None::<DetailRequest>);
	let adding = RwSignal::new(false);
	let notice = RwSignal::new(None::<String>);
	let reset_epoch = RwSignal::new(0u32);

	let reload = Callback::new(move |()| {
		load_state.set(LoadState::Loading);
		let client = client.get_value();
		spawn_local(async move {
			match client.load_records().await {
				Ok(records) => {
					all_records.set(records);
					load_state.set(LoadState::Ready);
				}
				Err(err) => {
					error!("Loading records failed: {err}");
					load_state.set(LoadState::from_error(&err));
				}
			}
		});
	});
	reload.run(());

	let filtered = Memo::new(move |_| filters.with(|f| all_records.with(|r| f.apply(r))));
	let filter_highlight = Memo::new(move |_| filters.with(|f| all_records.with(|r| f.highlight_ids(r))));
	let global = Memo::new(move |_| {
		let keys: Vec<ColumnKey> = columns.with_value(|c| c.iter().map(|s| s.key.clone()).collect());
		all_records.with(|r| GlobalCounts::from_records(r, &keys))
	});
	let options = Memo::new(move |_| all_records.with(|r| columns.with_value(|c| value_options(r, c))));

	let on_add = Callback::new(move |()| adding.set(true));
	let on_reset = Callback::new(move |()| {
		info!("Resetting view");
		filters.set(Filters::default());
		visible.set(columns.with_value(|c| default_visible(c)));
		notice.set(None);
		reset_epoch.update(|e| *e += 1);
	});
	let on_export = Callback::new(move |()| {
		let timestamp: String = js_sys::Date::new_0().to_iso_string().into();
		let snapshot = ExportSnapshot::new(filtered.get_untracked(), visible.get_untracked(), timestamp);
		if let Err(err) = download_snapshot(&snapshot, EXPORT_FILE_NAME) {
			error!("Export failed: {err:?}");
		}
	});
	let on_details = Callback::new(move |request: DetailRequest| detail.set(Some(request)));

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="explorer">
				<header class="explorer-header">
					<h1>"Bio-Digital Systems"</h1>
					<p class="stats">{move || filtered.with(|r| stats_line(r))}</p>
					<p class="subtitle">
						"Hover to preview a flow, click to freeze it, double-click for details. Drag column titles to reorder."
					</p>
				</header>

				<Toolbar on_add=on_add on_reset=on_reset on_export=on_export on_refresh=reload />
				<FilterBar columns=columns.get_value() options=options filters=filters />
				<ColumnToggles columns=columns.get_value() visible=visible notice=notice />

				{move || match load_state.get() {
					LoadState::Loading if all_records.with(Vec::is_empty) => {
						view! { <p class="placeholder">"Loading data..."</p> }.into_any()
					}
					LoadState::Failed(message) => {
						view! {
							<div class="error-banner">
								<p>{message}</p>
								<button class="btn" on:click=move |_| reload.run(())>"Retry"</button>
							</div>
						}
							.into_any()
					}
					LoadState::Empty => {
						view! {
							<div class="error-banner">
								<p>"No records found in the data store."</p>
								<button class="btn" on:click=move |_| reload.run(())>"Retry"</button>
							</div>
						}
							.into_any()
					}
					_ => ().into_any(),
				}}

				<Show when=move || !all_records.with(Vec::is_empty)>
					<div class="diagram-container">
						<FlowDiagramCanvas
							records=filtered
							global=global
							visible_columns=visible
							columns=columns.get_value()
							filter_highlight=filter_highlight
							reset_view=reset_epoch
							on_details=on_details
						/>
					</div>
				</Show>

				<DetailPanel request=detail columns=columns.get_value() />
				<AddSystemForm
					open=adding
					client=client.get_value()
					columns=columns.get_value()
					suggestions=options
					on_added=reload
				/>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn stats_count_distinct_organisms() {
		let organism = ColumnKey::from(ORGANISM);
		let records = vec![
			SystemRecord::new("r0", "a").with_values(&organism, ["Moss", "Algae"]),
			SystemRecord::new("r1", "b").with_values(&organism, ["Moss"]),
			SystemRecord::new("r2", "c"),
		];
		assert_eq!(stats_line(&records), "3 Total Systems, 2 Unique Organisms");
		assert_eq!(stats_line(&[]), "0 Total Systems, 0 Unique Organisms");
	}

	#[test]
	fn options_cover_every_column() {
		let columns = default_columns();
		let records = vec![
			SystemRecord::new("r0", "a").with_values(&ColumnKey::from("scale"), ["population", "cell"]),
		];
		let options = value_options(&records, &columns);
		assert_eq!(options.len(), columns.len());
		assert_eq!(options[&ColumnKey::from("scale")], ["cell", "population"]);
		assert!(options[&ColumnKey::from(ORGANISM)].is_empty());
	}
}
