use std::collections::HashMap;

use log::{debug, warn};

use super::types::{FlowGraph, FlowLink, FlowNode, GraphBuildInvariantViolation, Rect};
use crate::data::{ColumnKey, SystemRecord, ordered_values};

/// Composite id of the node for `value` in `column`.
pub fn node_id(column: &ColumnKey, value: &str) -> String {
	format!("{column}-{value}")
}

/// Per-node occurrence counts over the full, unfiltered dataset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalCounts {
	counts: HashMap<String, usize>,
	max: usize,
}

impl GlobalCounts {
	/// Count every value of every column in `columns`.
	pub fn from_records(records: &[SystemRecord], columns: &[ColumnKey]) -> Self {
		let mut counts: HashMap<String, usize> = HashMap::new();
		for record in records {
			for column in columns {
				for value in record.values(column) {
					*counts.entry(node_id(column, value)).or_default() += 1;
				}
			}
		}
		let max = counts.values().copied().max().unwrap_or(0);
		Self { counts, max }
	}

	pub fn count(&self, node_id: &str) -> usize {
		self.counts.get(node_id).copied().unwrap_or(0)
	}

	pub fn max(&self) -> usize {
		self.max
	}
}

/// Build the node/link graph for `records` over the `visible` columns.
///
/// Nodes come out column by column in display order. A record links each
/// of its values in one column to each of its values in the next visible
/// column that has data for it, skipping columns it leaves empty. Global
/// counts default to the filtered counts until
/// [`FlowGraph::apply_global_counts`] is called.
pub fn build_graph(records: &[SystemRecord], visible: &[ColumnKey]) -> FlowGraph {
	let mut graph = FlowGraph {
		records: records.to_vec(),
		columns: visible.to_vec(),
		..FlowGraph::default()
	};

	for (column_index, column) in visible.iter().enumerate() {
		for value in ordered_values(records, column) {
			let members: Vec<usize> = records
				.iter()
				.enumerate()
				.filter(|(_, r)| r.values(column).contains(&value))
				.map(|(i, _)| i)
				.collect();
			let id = node_id(column, &value);
			graph.node_index.insert(id.clone(), graph.nodes.len());
			graph.nodes.push(FlowNode {
				id,
				name: value,
				category: column.clone(),
				column_index,
				global_count: members.len(),
				members,
				rect: Rect::default(),
			});
		}
	}

	for (record_index, record) in records.iter().enumerate() {
		for (i, column) in visible.iter().enumerate() {
			let sources = record.values(column);
			if sources.is_empty() {
				continue;
			}
			let Some(next) = visible[i + 1..].iter().find(|c| record.has_values(c)) else {
				continue;
			};
			for source in sources {
				for target in record.values(next) {
					graph.add_contribution(
						&node_id(column, source),
						&node_id(next, target),
						record_index,
					);
				}
			}
		}
	}

	graph.global_max = graph.nodes.iter().map(|n| n.global_count).max().unwrap_or(0);
	debug!(
		"Built flow graph: {} nodes, {} links over {} records",
		graph.nodes.len(),
		graph.links.len(),
		records.len()
	);
	graph
}

impl FlowGraph {
	fn add_contribution(&mut self, source_id: &str, target_id: &str, record_index: usize) {
		let (Some(&source), Some(&target)) =
			(self.node_index.get(source_id), self.node_index.get(target_id))
		else {
			let violation = GraphBuildInvariantViolation {
				source_id: source_id.to_owned(),
				target_id: target_id.to_owned(),
			};
			warn!("Skipping link: {violation}");
			self.skipped_links += 1;
			return;
		};

		match self.link_index.get(&(source, target)) {
			Some(&i) => {
				let link = &mut self.links[i];
				link.weight += 1;
				link.members.push(record_index);
			}
			None => {
				self.link_index.insert((source, target), self.links.len());
				self.links.push(FlowLink {
					source,
					target,
					weight: 1,
					members: vec![record_index],
				});
			}
		}
	}

	/// Take node sizes from the unfiltered dataset so a value keeps its
	/// height whatever filters are set.
	pub fn apply_global_counts(&mut self, global: &GlobalCounts) {
		for node in &mut self.nodes {
			node.global_count = global.count(&node.id).max(node.member_count());
		}
		let own_max = self.nodes.iter().map(|n| n.global_count).max().unwrap_or(0);
		self.global_max = global.max().max(own_max);
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn col(key: &str) -> ColumnKey {
		ColumnKey::from(key)
	}

	#[test]
	fn repeated_pairs_aggregate_into_one_link() {
		let records: Vec<_> = (0..2)
			.map(|i| {
				SystemRecord::new(format!("r{i}"), "s")
					.with_values(&col("organism"), ["A"])
					.with_values(&col("trigger"), ["T1"])
			})
			.collect();
		let graph = build_graph(&records, &[col("organism"), col("trigger")]);

		assert_eq!(graph.links.len(), 1);
		let link = graph.link_between("organism-A", "trigger-T1").unwrap();
		assert_eq!(link.weight, 2);
		assert_eq!(link.members.len(), 2);
	}

	#[test]
	fn empty_column_is_skipped_for_links() {
		let records = vec![
			SystemRecord::new("r0", "s")
				.with_values(&col("organism"), ["A"])
				.with_values(&col("output"), ["O1"]),
			SystemRecord::new("r1", "s")
				.with_values(&col("organism"), ["B"])
				.with_values(&col("trigger"), ["T"]),
		];
		let graph = build_graph(&records, &[col("organism"), col("trigger"), col("output")]);

		let direct = graph.link_between("organism-A", "output-O1").unwrap();
		assert_eq!(direct.members, [0]);
		let touching_trigger_from_r0 = graph.links.iter().filter(|l| {
			l.members.contains(&0)
				&& (graph.nodes[l.source].category == col("trigger")
					|| graph.nodes[l.target].category == col("trigger"))
		});
		assert_eq!(touching_trigger_from_r0.count(), 0);
	}

	#[test]
	fn multi_valued_fields_cross_product() {
		let records = vec![
			SystemRecord::new("r0", "s")
				.with_values(&col("organism"), ["A", "B"])
				.with_values(&col("scale"), ["cell", "organism"]),
		];
		let graph = build_graph(&records, &[col("organism"), col("scale")]);
		assert_eq!(graph.links.len(), 4);
		assert!(graph.links.iter().all(|l| l.weight == 1));
	}

	#[test]
	fn scenario_three_records() {
		let records = vec![
			SystemRecord::new("r0", "s")
				.with_values(&col("organism"), ["X"])
				.with_values(&col("scale"), ["cell"]),
			SystemRecord::new("r1", "s")
				.with_values(&col("organism"), ["Y"])
				.with_values(&col("scale"), ["organism"]),
			SystemRecord::new("r2", "s")
				.with_values(&col("organism"), ["X"])
				.with_values(&col("scale"), ["cell"]),
		];
		let graph = build_graph(&records, &[col("organism"), col("scale")]);

		let names: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(names, ["organism-X", "organism-Y", "scale-cell", "scale-organism"]);
		assert_eq!(graph.node_by_id("organism-X").unwrap().member_count(), 2);
		assert_eq!(graph.node_by_id("organism-Y").unwrap().member_count(), 1);
		assert_eq!(graph.link_between("organism-X", "scale-cell").unwrap().weight, 2);
		assert_eq!(graph.link_between("organism-Y", "scale-organism").unwrap().weight, 1);
		assert!(graph.link_between("organism-X", "scale-organism").is_none());
		assert!(graph.link_between("organism-Y", "scale-cell").is_none());
		assert_eq!(graph.links.len(), 2);
	}

	#[test]
	fn record_without_visible_data_is_invisible() {
		let records = vec![
			SystemRecord::new("r0", "s").with_values(&col("output"), ["glow"]),
			SystemRecord::new("r1", "s").with_values(&col("organism"), ["A"]),
		];
		let graph = build_graph(&records, &[col("organism"), col("trigger")]);
		assert_eq!(graph.nodes.len(), 1);
		assert!(graph.links.is_empty());
		assert_eq!(graph.skipped_links, 0);
	}

	#[test]
	fn contribution_to_unknown_node_is_skipped() {
		let records = vec![
			SystemRecord::new("r0", "s")
				.with_values(&col("organism"), ["X"])
				.with_values(&col("trigger"), ["light"]),
		];
		let mut graph = build_graph(&records, &[col("organism"), col("trigger")]);
		assert_eq!(graph.links.len(), 1);

		graph.add_contribution("organism-X", "trigger-missing", 0);
		assert_eq!(graph.skipped_links, 1);
		assert_eq!(graph.links.len(), 1);
		assert_eq!(graph.link_between("organism-X", "trigger-light").unwrap().weight, 1);
	}

	#[test]
	fn hidden_columns_produce_no_nodes() {
		let records = vec![
			SystemRecord::new("r0", "s")
				.with_values(&col("organism"), ["A"])
				.with_values(&col("trigger"), ["T"])
				.with_values(&col("scale"), ["cell"]),
		];
		let graph = build_graph(&records, &[col("organism"), col("scale")]);
		assert!(graph.nodes.iter().all(|n| n.category != col("trigger")));
		assert!(graph.link_between("organism-A", "scale-cell").is_some());
	}

	#[test]
	fn rebuild_is_deterministic() {
		let records = vec![
			SystemRecord::new("r0", "s")
				.with_values(&col("organism"), ["B", "A"])
				.with_values(&col("trigger"), ["T2", "T1"]),
			SystemRecord::new("r1", "s")
				.with_values(&col("organism"), ["A"])
				.with_values(&col("trigger"), ["T2"]),
		];
		let visible = [col("organism"), col("trigger")];
		assert_eq!(build_graph(&records, &visible), build_graph(&records, &visible));
	}

	#[test]
	fn global_counts_override_filtered_counts() {
		let all = vec![
			SystemRecord::new("r0", "s").with_values(&col("organism"), ["A"]),
			SystemRecord::new("r1", "s").with_values(&col("organism"), ["A"]),
			SystemRecord::new("r2", "s").with_values(&col("organism"), ["B"]),
		];
		let global = GlobalCounts::from_records(&all, &[col("organism")]);
		let mut graph = build_graph(&all[2..], &[col("organism")]);
		graph.apply_global_counts(&global);

		assert_eq!(graph.nodes[0].member_count(), 1);
		assert_eq!(graph.nodes[0].global_count, 1);
		assert_eq!(graph.global_max, 2);
	}
}
