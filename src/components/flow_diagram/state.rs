use std::collections::BTreeSet;

use log::debug;

use super::builder::{GlobalCounts, build_graph};
use super::click::ClickDisambiguator;
use super::drag::{DragController, DragOutcome, reorder_columns};
use super::highlight::{HighlightState, RenderPlan};
use super::hit_test::{column_label_at, link_at, node_at};
use super::layout::{column_midpoints, layout};
use super::types::{DetailRequest, ElementKey, ElementRef, FlowGraph};
use crate::config::{ColumnSpec, DiagramConfig, label_for};
use crate::data::{ColumnKey, SystemRecord};

#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Hover text anchored at a screen position.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	pub x: f64,
	pub y: f64,
	pub lines: Vec<String>,
}

/// Everything one diagram instance needs between events.
pub struct FlowDiagramState {
	pub graph: FlowGraph,
	pub plan: RenderPlan,
	pub config: DiagramConfig,
	pub columns: Vec<ColumnSpec>,
	pub highlight: HighlightState,
	/// Pending single click, keyed by what was under the pointer.
	pub clicks: ClickDisambiguator<Option<ElementKey>>,
	pub drag: DragController,
	pub transform: ViewTransform,
	pub pan: PanState,
	/// Last pointer position in screen space.
	pub pointer: Option<(f64, f64)>,
	press_origin: Option<(f64, f64)>,
	/// The current press moved far enough to count as a gesture, not a click.
	pub pointer_moved: bool,
	pub width: f64,
	pub height: f64,
}

const CLICK_SLOP: f64 = 3.0;

impl FlowDiagramState {
	pub fn new(config: DiagramConfig, columns: Vec<ColumnSpec>, width: f64, height: f64) -> Self {
		let clicks = ClickDisambiguator::new(config.double_click_ms);
		Self {
			graph: FlowGraph::default(),
			plan: RenderPlan::default(),
			config,
			columns,
			highlight: HighlightState::default(),
			clicks,
			drag: DragController::default(),
			transform: ViewTransform::default(),
			pan: PanState::default(),
			pointer: None,
			press_origin: None,
			pointer_moved: false,
			width,
			height,
		}
	}

	/// Replace the graph for new records or a new column sequence.
	///
	/// A frozen selection survives when only the records changed.
	pub fn rebuild(&mut self, records: &[SystemRecord], visible: &[ColumnKey], global: &GlobalCounts) {
		let columns_changed = self.graph.columns.as_slice() != visible;
		let mut graph = build_graph(records, visible);
		graph.apply_global_counts(global);
		layout(&mut graph, self.width, self.height, &self.config);
		self.graph = graph;
		self.highlight.on_rebuild(columns_changed);
		if columns_changed {
			self.clicks.cancel();
			self.drag.cancel();
		}
		self.refresh_plan();
	}

	pub fn refresh_plan(&mut self) {
		self.plan = self.highlight.plan(&self.graph);
	}

	pub fn set_filter_selection(&mut self, selection: Option<BTreeSet<String>>) {
		self.highlight.set_filter_selection(selection);
		self.refresh_plan();
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		layout(&mut self.graph, width, height, &self.config);
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Node or link under a screen position. Nodes win over links.
	pub fn element_at(&self, sx: f64, sy: f64) -> Option<ElementRef> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		node_at(&self.graph, gx, gy)
			.map(ElementRef::Node)
			.or_else(|| link_at(&self.graph, gx, gy, &self.config).map(ElementRef::Link))
	}

	/// Column whose label sits under a screen position.
	pub fn column_label_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		column_label_at(&self.graph, gx, gy, self.width, &self.config)
	}

	pub fn midpoints(&self) -> Vec<f64> {
		column_midpoints(self.graph.columns.len(), self.width, &self.config)
	}

	/// Button pressed at a screen position: grab a column label or start
	/// panning.
	pub fn press(&mut self, sx: f64, sy: f64) {
		self.pointer_moved = false;
		self.pointer = Some((sx, sy));
		self.press_origin = Some((sx, sy));
		if let Some(index) = self.column_label_at(sx, sy) {
			let (gx, _) = self.screen_to_graph(sx, sy);
			let column = self.graph.columns[index].clone();
			self.highlight.mouse_out();
			self.drag.start(index, column, gx);
			self.refresh_plan();
		} else {
			self.pan = PanState {
				active: true,
				start_x: sx,
				start_y: sy,
				transform_start_x: self.transform.x,
				transform_start_y: self.transform.y,
			};
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		self.pointer = Some((sx, sy));
		if let Some((px, py)) = self.press_origin
			&& ((sx - px).abs() > CLICK_SLOP || (sy - py).abs() > CLICK_SLOP)
		{
			self.pointer_moved = true;
		}

		if self.drag.is_dragging() {
			let (gx, _) = self.screen_to_graph(sx, sy);
			self.drag.drag_move(gx);
			return;
		}
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			return;
		}

		match self.element_at(sx, sy) {
			Some(element) => self.highlight.hover(&self.graph, element),
			None => self.highlight.mouse_out(),
		}
		self.refresh_plan();
	}

	/// Button released. Returns whether the press moved, in which case it
	/// is not a click.
	pub fn release(&mut self) -> bool {
		self.pan.active = false;
		self.press_origin = None;
		std::mem::take(&mut self.pointer_moved)
	}

	/// Finish a column drag released at screen `sx`. Returns the new column
	/// sequence when the drag resolved to a reorder.
	pub fn finish_drag(&mut self, sx: f64) -> Option<Vec<ColumnKey>> {
		let (gx, _) = self.screen_to_graph(sx, 0.0);
		let midpoints = self.midpoints();
		match self.drag.end(gx, &midpoints, self.config.snap_back_ms)? {
			DragOutcome::Reorder { from, to } => {
				self.highlight.unfreeze();
				self.refresh_plan();
				Some(reorder_columns(&self.graph.columns, from, to))
			}
			DragOutcome::SnapBack => {
				debug!("Column drag snapped back");
				None
			}
		}
	}

	/// Column drag interrupted by the pointer leaving the canvas. Without a
	/// known position the drag is abandoned rather than resolved.
	pub fn drag_left_canvas(&mut self, sx: Option<f64>) -> Option<Vec<ColumnKey>> {
		match sx {
			Some(sx) => self.finish_drag(sx),
			None => {
				self.drag.cancel();
				None
			}
		}
	}

	/// Pointer left the canvas.
	pub fn leave(&mut self) {
		self.pan.active = false;
		self.press_origin = None;
		self.pointer = None;
		self.highlight.mouse_out();
		self.refresh_plan();
	}

	/// Wheel zoom around the pointer.
	pub fn zoom(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(self.config.min_zoom, self.config.max_zoom);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn reset_transform(&mut self) {
		self.transform = ViewTransform::default();
	}

	/// Fired single click: freeze or unfreeze.
	pub fn single_click(&mut self, target: Option<&ElementKey>) {
		let element = target.and_then(|k| self.graph.resolve(k));
		self.highlight.click(&self.graph, element);
		self.refresh_plan();
	}

	/// What a double-click on `key` opens, if the element still exists.
	pub fn detail_request(&self, key: &ElementKey) -> Option<DetailRequest> {
		let element = self.graph.resolve(key)?;
		let title = match element {
			ElementRef::Node(i) => {
				let node = &self.graph.nodes[i];
				format!("{}: {}", label_for(&self.columns, &node.category), node.name)
			}
			ElementRef::Link(i) => {
				let link = &self.graph.links[i];
				let (s, t) = (&self.graph.nodes[link.source], &self.graph.nodes[link.target]);
				format!(
					"({}:{}) ↔ ({}:{})",
					label_for(&self.columns, &s.category),
					s.name,
					label_for(&self.columns, &t.category),
					t.name
				)
			}
		};
		let records = self
			.highlight
			.detail_scope(&self.graph, element)
			.into_iter()
			.map(|r| self.graph.records[r].clone())
			.collect();
		Some(DetailRequest { title, records })
	}

	/// Tooltip for whatever is hovered.
	pub fn tooltip(&self) -> Option<Tooltip> {
		if self.drag.is_dragging() {
			return None;
		}
		let (x, y) = self.pointer?;
		let element = self.graph.resolve(self.highlight.hovered()?)?;
		let lines = match element {
			ElementRef::Node(i) => {
				let node = &self.graph.nodes[i];
				vec![
					node.name.clone(),
					format!("Category: {}", label_for(&self.columns, &node.category)),
					format!("Connected systems: {}", node.member_count()),
				]
			}
			ElementRef::Link(i) => {
				let link = &self.graph.links[i];
				let (s, t) = (&self.graph.nodes[link.source], &self.graph.nodes[link.target]);
				vec![
					format!("({}:{}) + ({}:{})", s.category, s.name, t.category, t.name),
					format!("Systems: {}", link.weight),
				]
			}
		};
		Some(Tooltip { x, y, lines })
	}

	/// Advance animations by `dt_ms`.
	pub fn tick(&mut self, dt_ms: f64) {
		self.drag.tick(dt_ms);
	}
}
