use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::highlight::{ElementStyle, Tier};
use super::layout::{LinkPath, column_x, link_width};
use super::state::{FlowDiagramState, Tooltip};
use super::types::Rect;
use crate::config::{ROLE_DIGITAL, label_for};

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

fn category_color(column_index: usize) -> &'static str {
	COLORS[column_index % COLORS.len()]
}

/// Label text clipped to `max` characters.
pub fn truncate_label(name: &str, max: usize) -> String {
	if name.chars().count() > max {
		format!("{}...", name.chars().take(max).collect::<String>())
	} else {
		name.to_owned()
	}
}

pub fn render(state: &FlowDiagramState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(state.config.background);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	if state.graph.is_empty() {
		ctx.set_fill_style_str(state.config.text_color);
		ctx.set_font("16px sans-serif");
		ctx.set_text_align("center");
		let _ = ctx.fill_text("No data to display.", state.width / 2.0, state.height / 2.0);
		ctx.set_text_align("start");
		return;
	}

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_role_divider(state, ctx);
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_column_labels(state, ctx);
	ctx.restore();

	if let Some(tooltip) = state.tooltip() {
		draw_tooltip(&tooltip, state, ctx);
	}
}

fn node_rect(state: &FlowDiagramState, index: usize) -> Rect {
	let node = &state.graph.nodes[index];
	node.rect.shifted(state.drag.offset_for(node.column_index))
}

fn link_path(state: &FlowDiagramState, index: usize) -> LinkPath {
	let link = &state.graph.links[index];
	LinkPath::between(&node_rect(state, link.source), &node_rect(state, link.target))
}

fn stroke_path(ctx: &CanvasRenderingContext2d, path: &LinkPath, color: &str, alpha: f64, width: f64) {
	ctx.set_global_alpha(alpha);
	ctx.set_stroke_style_str(color);
	ctx.set_line_width(width);
	ctx.begin_path();
	ctx.move_to(path.x0, path.y0);
	ctx.bezier_curve_to(path.xm, path.y0, path.xm, path.y1, path.x1, path.y1);
	ctx.stroke();
	ctx.set_global_alpha(1.0);
}

fn overlay_color<'a>(state: &'a FlowDiagramState, style: &ElementStyle) -> (&'a str, f64) {
	match style.tier {
		Tier::Intersection => (state.config.intersection_color, 0.9),
		Tier::Frozen if style.muted => (state.config.frozen_color, 0.35),
		Tier::Frozen => (state.config.frozen_color, 0.8),
		_ => (state.config.active_color, 0.8),
	}
}

fn draw_links(state: &FlowDiagramState, ctx: &CanvasRenderingContext2d) {
	let config = &state.config;
	let plan = &state.plan;

	// Full-weight base layer; grey when any highlight is showing.
	for (i, link) in state.graph.links.iter().enumerate() {
		let path = link_path(state, i);
		let width = link_width(link.weight, config);
		let highlighted = plan.links.get(i).is_some_and(|s| s.tier != Tier::Base);
		let color = if highlighted {
			config.dimmed_color
		} else {
			category_color(state.graph.nodes[link.source].column_index)
		};
		stroke_path(ctx, &path, color, config.link_opacity, width);
	}

	for (i, style) in plan.links.iter().enumerate() {
		if style.clicked {
			let width = link_width(style.count.max(1), config) + 3.0;
			stroke_path(ctx, &link_path(state, i), config.clicked_outline, 1.0, width);
		}
	}

	for tier in [Tier::Active, Tier::Frozen, Tier::Intersection] {
		for (i, style) in plan.links.iter().enumerate() {
			if style.tier != tier {
				continue;
			}
			let (color, alpha) = overlay_color(state, style);
			stroke_path(ctx, &link_path(state, i), color, alpha, link_width(style.count, config));
		}
	}
}

fn draw_nodes(state: &FlowDiagramState, ctx: &CanvasRenderingContext2d) {
	let config = &state.config;
	ctx.set_font("10px sans-serif");
	ctx.set_text_baseline("middle");

	for (i, node) in state.graph.nodes.iter().enumerate() {
		let rect = node_rect(state, i);
		let style = state.plan.nodes.get(i).copied();

		match style {
			Some(style) if style.tier.is_overlay() => {
				ctx.set_fill_style_str(config.dimmed_color);
				ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
				let share = style.count as f64 / node.member_count().max(1) as f64;
				let (color, alpha) = overlay_color(state, &style);
				ctx.set_global_alpha(alpha);
				ctx.set_fill_style_str(color);
				ctx.fill_rect(rect.x, rect.y, rect.width, rect.height * share.min(1.0));
				ctx.set_global_alpha(1.0);
			}
			Some(ElementStyle {
				tier: Tier::Dimmed, ..
			}) => {
				ctx.set_fill_style_str(config.dimmed_color);
				ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
			}
			_ => {
				ctx.set_fill_style_str(category_color(node.column_index));
				ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
			}
		}

		if style.is_some_and(|s| s.clicked) {
			ctx.set_stroke_style_str(config.clicked_outline);
			ctx.set_line_width(2.0);
			ctx.stroke_rect(rect.x - 1.0, rect.y - 1.0, rect.width + 2.0, rect.height + 2.0);
		}

		ctx.set_fill_style_str(config.text_color);
		let _ = ctx.fill_text(
			&truncate_label(&node.name, config.max_label_chars),
			rect.right() + 5.0,
			rect.center_y(),
		);
	}
	ctx.set_text_baseline("alphabetic");
}

fn draw_column_labels(state: &FlowDiagramState, ctx: &CanvasRenderingContext2d) {
	let config = &state.config;
	let count = state.graph.columns.len();
	let baseline = config.margin.top - config.label_offset;
	ctx.set_font("bold 12px sans-serif");
	ctx.set_text_align("center");

	for (i, column) in state.graph.columns.iter().enumerate() {
		let offset = state.drag.offset_for(i);
		let center = column_x(i, count, state.width, config) + config.node_width / 2.0 + offset;
		if state.drag.active().is_some_and(|d| d.column_index == i) {
			ctx.set_fill_style_str("#f0f0f0");
			ctx.fill_rect(
				center - config.label_box_width / 2.0,
				baseline - config.label_box_height * 0.6,
				config.label_box_width,
				config.label_box_height,
			);
		}
		ctx.set_fill_style_str(config.text_color);
		let _ = ctx.fill_text(&label_for(&state.columns, column), center, baseline);
	}
	ctx.set_text_align("start");
}

fn draw_role_divider(state: &FlowDiagramState, ctx: &CanvasRenderingContext2d) {
	let config = &state.config;
	let count = state.graph.columns.len();
	let Some(index) = state
		.graph
		.columns
		.iter()
		.position(|c| c.as_str() == ROLE_DIGITAL)
		.filter(|&i| i > 0)
	else {
		return;
	};
	let left = column_x(index - 1, count, state.width, config) + config.node_width;
	let x = left + (column_x(index, count, state.width, config) - left) / 2.0;

	ctx.set_stroke_style_str("#999999");
	ctx.set_line_width(1.0);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(6.0),
		&JsValue::from_f64(4.0),
	));
	ctx.begin_path();
	ctx.move_to(x, config.margin.top - config.label_offset - 20.0);
	ctx.line_to(x, state.height - config.margin.bottom);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_tooltip(tooltip: &Tooltip, state: &FlowDiagramState, ctx: &CanvasRenderingContext2d) {
	let line_height = 16.0;
	ctx.set_font("12px sans-serif");
	let width = tooltip
		.lines
		.iter()
		.filter_map(|l| ctx.measure_text(l).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max)
		+ 12.0;
	let height = tooltip.lines.len() as f64 * line_height + 8.0;
	let x = (tooltip.x + 10.0).min(state.width - width).max(0.0);
	let y = (tooltip.y - 28.0).max(0.0);

	ctx.set_global_alpha(0.92);
	ctx.set_fill_style_str("#333333");
	ctx.fill_rect(x, y, width, height);
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str("#ffffff");
	ctx.set_text_baseline("top");
	for (i, line) in tooltip.lines.iter().enumerate() {
		let font = if i == 0 { "bold 12px sans-serif" } else { "12px sans-serif" };
		ctx.set_font(font);
		let _ = ctx.fill_text(line, x + 6.0, y + 4.0 + i as f64 * line_height);
	}
	ctx.set_text_baseline("alphabetic");
}
