use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use leptos::leptos_dom::helpers::TimeoutHandle;
use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::builder::GlobalCounts;
use super::click::ClickAction;
use super::render;
use super::state::FlowDiagramState;
use super::types::DetailRequest;
use crate::config::{ColumnSpec, DiagramConfig};
use crate::data::{ColumnKey, SystemRecord};

const FRAME_MS: f64 = 16.0;

type SharedState = Rc<RefCell<Option<FlowDiagramState>>>;

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn canvas_size(canvas: &HtmlCanvasElement, height: f64) -> (f64, f64) {
	let width = canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|&w| w > 0.0)
		.unwrap_or(1200.0);
	(width, height)
}

/// Canvas-backed flow diagram over `records` laid out in `visible_columns`.
///
/// Dragging a column label commits a new order back into
/// `visible_columns`; double-clicking a node or link hands the scoped
/// records to `on_details`.
#[component]
pub fn FlowDiagramCanvas(
	#[prop(into)] records: Signal<Vec<SystemRecord>>,
	#[prop(into)] global: Signal<GlobalCounts>,
	visible_columns: RwSignal<Vec<ColumnKey>>,
	columns: Vec<ColumnSpec>,
	#[prop(into)] filter_highlight: Signal<Option<BTreeSet<String>>>,
	#[prop(into)] reset_view: Signal<u32>,
	on_details: Callback<DetailRequest>,
	#[prop(default = 700.0)] height: f64,
	#[prop(optional)] config: Option<DiagramConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));
	let pending_click: Arc<Mutex<Option<TimeoutHandle>>> = Arc::new(Mutex::new(None));
	let config = config.unwrap_or_default();

	let (state_init, animate_init, resize_cb_init, alive_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), alive.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = canvas_size(&canvas, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("Canvas 2d context unavailable");
			return;
		};

		let mut initial = FlowDiagramState::new(config.clone(), columns.clone(), w, h);
		initial.rebuild(
			&records.get_untracked(),
			&visible_columns.get_untracked(),
			&global.get_untracked(),
		);
		initial.set_filter_selection(filter_highlight.get_untracked());
		*state_init.borrow_mut() = Some(initial);

		let (state_resize, canvas_resize, alive_resize) =
			(state_init.clone(), canvas.clone(), alive_init.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_resize.load(Ordering::Relaxed) {
				return;
			}
			let (nw, nh) = canvas_size(&canvas_resize, height);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner, alive_anim) =
			(state_init.clone(), animate_init.clone(), alive_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.load(Ordering::Relaxed) {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(FRAME_MS);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Rebuild whenever the records, sizes or column sequence change.
	let state_data = state.clone();
	Effect::new(move |_| {
		let (records, visible, global) = (records.get(), visible_columns.get(), global.get());
		if let Some(ref mut s) = *state_data.borrow_mut() {
			s.rebuild(&records, &visible, &global);
		}
	});

	let state_filter = state.clone();
	Effect::new(move |_| {
		let selection = filter_highlight.get();
		if let Some(ref mut s) = *state_filter.borrow_mut() {
			s.set_filter_selection(selection);
		}
	});

	let state_reset = state.clone();
	Effect::new(move |prev: Option<u32>| {
		let epoch = reset_view.get();
		if prev.is_some_and(|p| p != epoch)
			&& let Some(ref mut s) = *state_reset.borrow_mut()
		{
			s.reset_transform();
			s.highlight.unfreeze();
			s.refresh_plan();
		}
		epoch
	});

	let (alive_cleanup, pending_cleanup) = (alive.clone(), pending_click.clone());
	on_cleanup(move || {
		alive_cleanup.store(false, Ordering::Relaxed);
		if let Ok(mut pending) = pending_cleanup.lock()
			&& let Some(handle) = pending.take()
		{
			handle.clear();
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press(x, y);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
		}
	};

	let (state_mu, alive_mu, pending_mu) = (state.clone(), alive.clone(), pending_click.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut reorder = None;
		let mut details = None;
		let mut schedule = None;
		{
			let mut guard = state_mu.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			if s.drag.is_dragging() {
				s.release();
				reorder = s.finish_drag(x);
			} else if !s.release() {
				let target = s.element_at(x, y).map(|e| s.graph.key_of(e));
				match s.clicks.press(target, js_sys::Date::now()) {
					ClickAction::Defer { token, delay_ms } => schedule = Some((token, delay_ms)),
					ClickAction::Double(Some(key)) => details = s.detail_request(&key),
					ClickAction::Double(None) | ClickAction::Ignore => {}
				}
			}
		}

		if let Some(order) = reorder {
			debug!("Committing column order {order:?}");
			visible_columns.set(order);
		}

		if (schedule.is_some() || details.is_some())
			&& let Ok(mut pending) = pending_mu.lock()
			&& let Some(handle) = pending.take()
		{
			handle.clear();
		}
		if let Some(request) = details {
			on_details.run(request);
		}
		if let Some((token, delay_ms)) = schedule {
			let (state_timer, alive_timer) = (state_mu.clone(), alive_mu.clone());
			let handle = set_timeout_with_handle(
				move || {
					if !alive_timer.load(Ordering::Relaxed) {
						return;
					}
					if let Some(ref mut s) = *state_timer.borrow_mut()
						&& let Some(target) = s.clicks.fire(token)
					{
						s.single_click(target.as_ref());
					}
				},
				Duration::from_millis(delay_ms as u64),
			);
			match handle {
				Ok(handle) => {
					if let Ok(mut pending) = pending_mu.lock() {
						*pending = Some(handle);
					}
				}
				Err(err) => warn!("Failed to schedule click: {err:?}"),
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |ev: MouseEvent| {
		let mut reorder = None;
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			if s.drag.is_dragging() {
				reorder = s.drag_left_canvas(local_point(canvas_ref, &ev).map(|(x, _)| x));
			}
			s.release();
			s.leave();
		}
		if let Some(order) = reorder {
			visible_columns.set(order);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.zoom(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="flow-diagram-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
