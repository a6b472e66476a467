use std::collections::BTreeMap;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::warn;

use crate::config::ColumnSpec;
use crate::data::{AirtableClient, ColumnKey, NewSystem, normalize_str};

/// Columns a new system has to fill in.
pub const REQUIRED_COLUMNS: &[&str] = &["organism", "trigger", "output", "scale", "temporality"];

/// Labels of the required inputs left blank, in form order.
pub fn missing_fields(system: &NewSystem, columns: &[ColumnSpec]) -> Vec<String> {
	let mut missing = Vec::new();
	if system.name.trim().is_empty() {
		missing.push("Project Title".to_owned());
	}
	for column in columns
		.iter()
		.filter(|c| REQUIRED_COLUMNS.contains(&c.key.as_str()))
	{
		let filled = system
			.columns
			.get(column.key.as_str())
			.is_some_and(|raw| !normalize_str(raw).is_empty());
		if !filled {
			missing.push(column.label.clone());
		}
	}
	missing
}

/// Modal form creating a record in the data store. `on_added` runs after a
/// successful write so the caller can reload.
#[component]
pub fn AddSystemForm(
	open: RwSignal<bool>,
	client: AirtableClient,
	columns: Vec<ColumnSpec>,
	#[prop(into)] suggestions: Signal<BTreeMap<ColumnKey, Vec<String>>>,
	on_added: Callback<()>,
) -> impl IntoView {
	let draft = RwSignal::new(NewSystem::default());
	let error = RwSignal::new(None::<String>);
	let submitting = RwSignal::new(false);
	let client = StoredValue::new(client);
	let columns = StoredValue::new(columns);

	let close = move || {
		open.set(false);
		error.set(None);
	};

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let system = draft.get_untracked();
		let missing = columns.with_value(|c| missing_fields(&system, c));
		if !missing.is_empty() {
			error.set(Some(format!("Please fill in: {}", missing.join(", "))));
			return;
		}
		submitting.set(true);
		error.set(None);
		let client = client.get_value();
		spawn_local(async move {
			match client.submit_new_record(&system).await {
				Ok(()) => {
					draft.set(NewSystem::default());
					open.set(false);
					on_added.run(());
				}
				Err(err) => {
					warn!("New system rejected: {err}");
					error.set(Some(format!("Failed to add system: {err}")));
				}
			}
			submitting.set(false);
		});
	};

	let scalar = move |label: &'static str, read: fn(&NewSystem) -> String, write: fn(&mut NewSystem, String)| {
		view! {
			<label class="form-field">
				<span class="form-label">{label}</span>
				<input
					type="text"
					prop:value=move || draft.with(read)
					on:input=move |ev| {
						let value = event_target_value(&ev);
						draft.update(|d| write(d, value));
					}
				/>
			</label>
		}
	};

	let column_inputs = move || {
		columns.with_value(|specs| {
			specs
				.iter()
				.map(|spec| {
					let key = spec.key.as_str().to_owned();
					let (key_value, key_input) = (key.clone(), key.clone());
					let list_id = format!("suggest-{key}");
					let spec_key = spec.key.clone();
					let required = REQUIRED_COLUMNS.contains(&key.as_str());
					view! {
						<label class="form-field">
							<span class="form-label">
								{spec.label.clone()}
								{required.then_some(" *")}
							</span>
							<input
								type="text"
								list=list_id.clone()
								placeholder="Comma-separated values"
								prop:value=move || {
									draft.with(|d| d.columns.get(&key_value).cloned().unwrap_or_default())
								}
								on:input=move |ev| {
									let value = event_target_value(&ev);
									draft.update(|d| {
										d.columns.insert(key_input.clone(), value);
									});
								}
							/>
							<datalist id=list_id>
								{move || {
									suggestions
										.with(|s| s.get(&spec_key).cloned().unwrap_or_default())
										.into_iter()
										.map(|v| view! { <option value=v /> })
										.collect_view()
								}}
							</datalist>
						</label>
					}
				})
				.collect_view()
		})
	};

	move || {
		open.get().then(|| {
			view! {
				<div class="modal-backdrop" on:click=move |_| close()>
					<form class="modal" on:submit=on_submit on:click=|ev| ev.stop_propagation()>
						<header class="modal-header">
							<h2>"Add New Bio-Digital System"</h2>
							<button type="button" class="btn" on:click=move |_| close()>
								"Close"
							</button>
						</header>
						{scalar("Project Title *", |d| d.name.clone(), |d, v| d.name = v)}
						{scalar("Author(s)/Creator(s)", |d| d.author.clone(), |d, v| d.author = v)}
						{scalar("Website Link", |d| d.url.clone(), |d, v| d.url = v)}
						{scalar("Image Name", |d| d.image_ref.clone(), |d, v| d.image_ref = v)}
						{scalar("Year", |d| d.year.clone(), |d, v| d.year = v)}
						<label class="form-field checkbox">
							<input
								type="checkbox"
								prop:checked=move || draft.with(|d| d.gmo)
								on:change=move |ev| {
									let gmo = event_target_checked(&ev);
									draft.update(|d| d.gmo = gmo);
								}
							/>
							"Genetically Modified"
						</label>
						{column_inputs()}
						{move || error.get().map(|e| view! { <p class="form-error">{e}</p> })}
						<button type="submit" class="btn btn-primary" disabled=move || submitting.get()>
							{move || if submitting.get() { "Adding..." } else { "Add System" }}
						</button>
					</form>
				</div>
			}
		})
	}
}
