use super::types::{FlowGraph, Rect};
use crate::config::DiagramConfig;

/// Height of a node holding `global_count` of at most `global_max` records,
/// before any column shrink-to-fit.
pub fn node_height(global_count: usize, global_max: usize, config: &DiagramConfig) -> f64 {
	let ratio = if global_max == 0 {
		0.0
	} else {
		(global_count as f64 / global_max as f64).clamp(0.0, 1.0)
	};
	config.min_node_height + (config.max_node_height - config.min_node_height) * ratio
}

/// Left edge of the column at `index` out of `count`.
pub fn column_x(index: usize, count: usize, width: f64, config: &DiagramConfig) -> f64 {
	let available = width - config.margin.left - config.margin.right;
	let column_width = available / count.saturating_sub(1).max(1) as f64;
	if count <= 1 {
		config.margin.left
	} else {
		config.margin.left + index as f64 * column_width
	}
}

/// Fixed horizontal centre of every column, used to resolve drag targets.
pub fn column_midpoints(count: usize, width: f64, config: &DiagramConfig) -> Vec<f64> {
	(0..count)
		.map(|i| column_x(i, count, width, config) + config.node_width / 2.0)
		.collect()
}

/// Assign every node its box for a `width` × `height` viewport.
///
/// Columns shrink all their heights by one factor when the stack would not
/// fit, and spread any leftover space evenly between nodes.
pub fn layout(graph: &mut FlowGraph, width: f64, height: f64, config: &DiagramConfig) {
	let count = graph.columns.len();
	let available = (height - config.margin.top - config.margin.bottom).max(0.0);
	let global_max = graph.global_max;

	for column_index in 0..count {
		let x = column_x(column_index, count, width, config);
		let members: Vec<usize> = graph.column_nodes(column_index).map(|(i, _)| i).collect();
		if members.is_empty() {
			continue;
		}

		let mut heights: Vec<f64> = members
			.iter()
			.map(|&i| node_height(graph.nodes[i].global_count, global_max, config))
			.collect();
		let gaps = (members.len() - 1) as f64;
		let fixed_spacing = gaps * config.node_spacing;
		let total: f64 = heights.iter().sum();

		if total + fixed_spacing > available && total > 0.0 {
			let scale = ((available - fixed_spacing).max(0.0)) / total;
			for h in &mut heights {
				*h *= scale;
			}
		}

		let used: f64 = heights.iter().sum::<f64>() + fixed_spacing;
		let extra = (available - used).max(0.0);
		let padding = if gaps > 0.0 {
			config.node_spacing + extra / gaps
		} else {
			0.0
		};

		let mut y = config.margin.top;
		for (&node_index, &h) in members.iter().zip(&heights) {
			graph.nodes[node_index].rect = Rect {
				x,
				y,
				width: config.node_width,
				height: h,
			};
			y += h + padding;
		}
	}
}

/// Stroke width of a link carrying `count` records.
pub fn link_width(count: usize, config: &DiagramConfig) -> f64 {
	(count as f64 * config.link_width_per_record).max(config.link_min_width)
}

/// Symmetric S-curve from the right-centre of one node to the left-centre
/// of another: `M x0,y0 C xm,y0 xm,y1 x1,y1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkPath {
	pub x0: f64,
	pub y0: f64,
	pub xm: f64,
	pub x1: f64,
	pub y1: f64,
}

impl LinkPath {
	pub fn between(source: &Rect, target: &Rect) -> Self {
		let x0 = source.right();
		let x1 = target.x;
		Self {
			x0,
			y0: source.center_y(),
			xm: x0 + (x1 - x0) / 2.0,
			x1,
			y1: target.center_y(),
		}
	}

	/// SVG path data.
	pub fn to_svg(&self) -> String {
		format!(
			"M{},{}C{},{} {},{} {},{}",
			self.x0, self.y0, self.xm, self.y0, self.xm, self.y1, self.x1, self.y1
		)
	}

	/// Point on the curve at `t` in `0..=1`.
	pub fn eval(&self, t: f64) -> (f64, f64) {
		let mt = 1.0 - t;
		let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
		(
			a * self.x0 + (b + c) * self.xm + d * self.x1,
			(a + b) * self.y0 + (c + d) * self.y1,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_diagram::builder::build_graph;
	use crate::data::{ColumnKey, SystemRecord};

	#[test]
	fn node_height_bounds_and_monotonicity() {
		let config = DiagramConfig::default();
		assert_eq!(node_height(0, 10, &config), config.min_node_height);
		assert_eq!(node_height(10, 10, &config), config.max_node_height);
		assert_eq!(node_height(3, 0, &config), config.min_node_height);

		let heights: Vec<f64> = (0..=10).map(|c| node_height(c, 10, &config)).collect();
		assert!(heights.windows(2).all(|w| w[0] <= w[1]));
	}

	#[test]
	fn columns_are_evenly_spaced() {
		let config = DiagramConfig::default();
		let width = 1000.0;
		let available = width - config.margin.left - config.margin.right;
		let xs: Vec<f64> = (0..3).map(|i| column_x(i, 3, width, &config)).collect();
		assert_eq!(xs, [config.margin.left, config.margin.left + available / 2.0, width - config.margin.right]);
		assert_eq!(column_x(0, 1, width, &config), config.margin.left);
	}

	fn column_graph(values: usize) -> FlowGraph {
		let organism = ColumnKey::from("organism");
		let records: Vec<_> = (0..values)
			.map(|i| SystemRecord::new(format!("r{i}"), "s").with_values(&organism, [format!("v{i:02}")]))
			.collect();
		build_graph(&records, &[organism])
	}

	#[test]
	fn overflowing_column_shrinks_to_fit() {
		let config = DiagramConfig::default();
		let mut graph = column_graph(40);
		let height = 400.0;
		layout(&mut graph, 800.0, height, &config);

		let bottom = graph.nodes.iter().map(|n| n.rect.y + n.rect.height).fold(0.0, f64::max);
		assert!(bottom <= height - config.margin.bottom + 1e-6);
		let first = graph.nodes[0].rect.height;
		assert!(first < config.max_node_height);
		assert!(graph.nodes.iter().all(|n| (n.rect.height - first).abs() < 1e-9));
	}

	#[test]
	fn leftover_space_is_spread_between_nodes() {
		let config = DiagramConfig::default();
		let mut graph = column_graph(3);
		let height = 600.0;
		layout(&mut graph, 800.0, height, &config);

		let rects: Vec<Rect> = graph.nodes.iter().map(|n| n.rect).collect();
		assert_eq!(rects[0].y, config.margin.top);
		let last_bottom = rects[2].y + rects[2].height;
		assert!((last_bottom - (height - config.margin.bottom)).abs() < 1e-6);
		let gap_a = rects[1].y - (rects[0].y + rects[0].height);
		let gap_b = rects[2].y - (rects[1].y + rects[1].height);
		assert!((gap_a - gap_b).abs() < 1e-9);
		assert!(gap_a >= config.node_spacing);
	}

	#[test]
	fn link_path_is_symmetric_s_curve() {
		let source = Rect {
			x: 100.0,
			y: 60.0,
			width: 15.0,
			height: 20.0,
		};
		let target = Rect {
			x: 315.0,
			y: 100.0,
			width: 15.0,
			height: 40.0,
		};
		let path = LinkPath::between(&source, &target);
		assert_eq!(path.to_svg(), "M115,70C215,70 215,120 315,120");
		assert_eq!(path.eval(0.0), (115.0, 70.0));
		assert_eq!(path.eval(1.0), (315.0, 120.0));
		assert_eq!(path.eval(0.5), (215.0, 95.0));
	}

	#[test]
	fn link_width_has_floor() {
		let config = DiagramConfig::default();
		assert_eq!(link_width(0, &config), config.link_min_width);
		assert_eq!(link_width(5, &config), 5.0 * config.link_width_per_record);
	}
}
