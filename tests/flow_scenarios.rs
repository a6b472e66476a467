use std::collections::BTreeSet;

use biodigital_flow::components::flow_diagram::drag::reorder_columns;
use biodigital_flow::components::flow_diagram::layout::{LinkPath, layout};
use biodigital_flow::components::flow_diagram::state::FlowDiagramState;
use biodigital_flow::components::flow_diagram::{
	ElementKey, GlobalCounts, HighlightState, Phase, Tier, build_graph,
};
use biodigital_flow::config::{DiagramConfig, default_columns, default_visible};
use biodigital_flow::data::{ColumnKey, ExportSnapshot, Filters, SystemRecord, normalize};
use pretty_assertions::assert_eq;
use serde_json::json;

fn col(key: &str) -> ColumnKey {
	ColumnKey::from(key)
}

fn dataset() -> Vec<SystemRecord> {
	let record = |id: &str, organism: &[&str], trigger: &str, scale: &str, speed: &str| {
		SystemRecord::new(id, format!("System {id}"))
			.with_values(&col("organism"), organism)
			.with_values(&col("trigger"), [trigger])
			.with_values(&col("scale"), [scale])
			.with_values(&col("temporality"), [speed])
	};
	vec![
		record("r0", &["Moss"], "light", "organism", "<minute"),
		record("r1", &["Slime mold", "Moss"], "humidity", "population", ">hour"),
		record("r2", &["Yeast"], "light", "cell", "<second"),
		record("r3", &["Moss"], "light", "organism", ">day"),
	]
}

#[test]
fn exported_snapshot_rebuilds_the_same_graph() {
	let records = dataset();
	let visible = vec![col("organism"), col("trigger"), col("scale")];
	let before = build_graph(&records, &visible);

	let snapshot = ExportSnapshot::new(records, visible.clone(), "2026-01-01T00:00:00.000Z");
	let json = snapshot.to_json_pretty().unwrap();
	let restored = ExportSnapshot::from_json(&json).unwrap();
	assert_eq!(restored.visible_columns, visible);

	let after = build_graph(&restored.records, &restored.visible_columns);
	let ids = |g: &biodigital_flow::components::flow_diagram::FlowGraph| -> Vec<String> {
		g.nodes.iter().map(|n| n.id.clone()).collect()
	};
	assert_eq!(ids(&after), ids(&before));
	assert_eq!(after.links.len(), before.links.len());
	for link in &before.links {
		let (s, t) = (&before.nodes[link.source].id, &before.nodes[link.target].id);
		assert_eq!(after.link_between(s, t).map(|l| l.weight), Some(link.weight));
	}
}

#[test]
fn filtered_graph_keeps_global_node_heights() {
	let records = dataset();
	let visible = vec![col("organism"), col("trigger")];
	let config = DiagramConfig::default();
	let global = GlobalCounts::from_records(&records, &visible);

	let mut full = build_graph(&records, &visible);
	full.apply_global_counts(&global);
	layout(&mut full, 900.0, 600.0, &config);

	let mut filters = Filters::default();
	filters.set(col("trigger"), "light");
	let mut narrowed = build_graph(&filters.apply(&records), &visible);
	narrowed.apply_global_counts(&global);
	layout(&mut narrowed, 900.0, 600.0, &config);

	let moss_full = full.node_by_id("organism-Moss").unwrap();
	let moss_narrow = narrowed.node_by_id("organism-Moss").unwrap();
	assert_eq!(moss_full.global_count, moss_narrow.global_count);
	assert_eq!(moss_narrow.member_count(), 2);
	assert!(narrowed.node_by_id("organism-Slime mold").is_none());
}

#[test]
fn temporal_column_orders_by_unit_then_operator() {
	let records = dataset();
	let graph = build_graph(&records, &[col("temporality")]);
	let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
	assert_eq!(names, ["<second", "<minute", ">hour", ">day"]);
}

#[test]
fn hover_freeze_and_intersection_flow() {
	let records = dataset();
	let graph = build_graph(&records, &[col("organism"), col("trigger"), col("scale")]);
	let mut state = HighlightState::default();

	let light = graph.resolve(&ElementKey::Node("trigger-light".into())).unwrap();
	state.hover(&graph, light);
	assert_eq!(state.phase(), Phase::HoverPreview);
	state.click(&graph, Some(light));
	state.mouse_out();
	assert_eq!(state.phase(), Phase::Frozen);
	assert_eq!(
		state.frozen_selection().cloned(),
		Some(BTreeSet::from(["r0".to_owned(), "r2".to_owned(), "r3".to_owned()]))
	);

	let moss = graph.resolve(&ElementKey::Node("organism-Moss".into())).unwrap();
	state.hover(&graph, moss);
	assert_eq!(state.phase(), Phase::FrozenWithHoverIntersection);
	let plan = state.plan(&graph);
	let yeast = graph.resolve(&ElementKey::Node("organism-Yeast".into())).unwrap();
	let biodigital_flow::components::flow_diagram::ElementRef::Node(yeast) = yeast else {
		unreachable!()
	};
	assert_eq!(plan.nodes[yeast].tier, Tier::Frozen);
	assert!(plan.nodes[yeast].muted);
	assert!(plan.count_tier(Tier::Intersection) > 0);

	state.click(&graph, None);
	assert_eq!(state.phase(), Phase::Idle);
	assert_eq!(state.plan(&graph).overlay_count(), 0);
}

#[test]
fn column_drag_commits_reorder_through_state() {
	let records = dataset();
	let columns = default_columns();
	let visible = default_visible(&columns);
	let global = GlobalCounts::from_records(&records, &visible);
	let mut state = FlowDiagramState::new(DiagramConfig::default(), columns, 1200.0, 700.0);
	state.rebuild(&records, &visible, &global);

	let mids = state.midpoints();
	let label_y = state.config.margin.top - state.config.label_offset;
	state.press(mids[0], label_y);
	assert!(state.drag.is_dragging());
	state.pointer_move(mids[2] + 5.0, label_y);
	let order = state.finish_drag(mids[2] + 5.0).unwrap();

	assert_eq!(order, reorder_columns(&visible, 0, 2));
	assert_eq!(order[2], col("organism"));
	state.rebuild(&records, &order, &global);
	assert_eq!(state.graph.columns, order);
}

#[test]
fn link_path_endpoints_touch_node_edges() {
	let records = dataset();
	let mut graph = build_graph(&records, &[col("organism"), col("scale")]);
	layout(&mut graph, 800.0, 500.0, &DiagramConfig::default());
	for link in &graph.links {
		let (s, t) = (graph.nodes[link.source].rect, graph.nodes[link.target].rect);
		let path = LinkPath::between(&s, &t);
		assert_eq!(path.eval(0.0), (s.right(), s.center_y()));
		assert_eq!(path.eval(1.0), (t.x, t.center_y()));
	}
}

#[test]
fn remote_values_normalize_before_building() {
	let organism = normalize(&json!("Moss, Algae ,"));
	let trigger = normalize(&json!(["light, touch"]));
	let record = SystemRecord::new("r0", "s")
		.with_values(&col("organism"), &organism)
		.with_values(&col("trigger"), &trigger);
	let graph = build_graph(&[record], &[col("organism"), col("trigger")]);
	assert_eq!(graph.nodes.len(), 3);
	assert!(graph.link_between("organism-Algae", "trigger-light, touch").is_some());
}
