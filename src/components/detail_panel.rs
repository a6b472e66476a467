use leptos::prelude::*;

use super::flow_diagram::DetailRequest;
use crate::config::{ColumnSpec, label_for};
use crate::data::SystemRecord;

/// `(label, joined values)` for every column the record has data in.
pub fn record_rows(record: &SystemRecord, columns: &[ColumnSpec]) -> Vec<(String, String)> {
	columns
		.iter()
		.filter(|c| record.has_values(&c.key))
		.map(|c| (label_for(columns, &c.key), record.values(&c.key).join(", ")))
		.collect()
}

fn record_card(record: SystemRecord, columns: &[ColumnSpec]) -> impl IntoView + use<> {
	let rows = record_rows(&record, columns)
		.into_iter()
		.map(|(label, values)| {
			view! {
				<div class="detail-row">
					<strong>{label}": "</strong>
					{values}
				</div>
			}
		})
		.collect_view();
	let title = if record.url.is_empty() {
		view! { <span>{record.name.clone()}</span> }.into_any()
	} else {
		view! {
			<a href=record.url.clone() target="_blank" rel="noopener noreferrer">
				{record.name.clone()}
			</a>
		}
		.into_any()
	};
	let image = (!record.image_ref.is_empty()).then(|| {
		view! {
			<img
				class="detail-image"
				src=format!("images/{}", record.image_ref)
				alt=record.name.clone()
			/>
		}
	});
	let byline = (!record.author.is_empty()).then(|| view! { <p class="author">{record.author.clone()}</p> });
	let year = record.year.map(|y| view! { <p class="year">{y}</p> });

	view! {
		<article class="detail-card">
			<h3>{title}</h3>
			{byline}
			{year}
			{image}
			{rows}
		</article>
	}
}

/// Modal listing the records a double-click opened.
#[component]
pub fn DetailPanel(request: RwSignal<Option<DetailRequest>>, columns: Vec<ColumnSpec>) -> impl IntoView {
	let columns = StoredValue::new(columns);
	let close = move |_| request.set(None);

	move || {
		request.get().map(|req| {
			let count = req.records.len();
			let cards = req
				.records
				.into_iter()
				.map(|r| columns.with_value(|c| record_card(r, c)))
				.collect_view();
			view! {
				<div class="modal-backdrop" on:click=close>
					<div class="modal" on:click=|ev| ev.stop_propagation()>
						<header class="modal-header">
							<h2>{req.title}</h2>
							<button class="btn" on:click=close>"Close"</button>
						</header>
						<p class="modal-count">{format!("{count} systems")}</p>
						{cards}
					</div>
				</div>
			}
		})
	}
}
