use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::data::{ColumnKey, SystemRecord};

/// Axis-aligned box in diagram space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	pub fn center_y(&self) -> f64 {
		self.y + self.height / 2.0
	}

	pub fn contains(&self, px: f64, py: f64) -> bool {
		px >= self.x && px <= self.right() && py >= self.y && py <= self.y + self.height
	}

	/// The same box moved horizontally by `dx`.
	pub fn shifted(&self, dx: f64) -> Self {
		Self {
			x: self.x + dx,
			..*self
		}
	}
}

/// Distinct value of one visible column.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowNode {
	/// `"<column>-<value>"`.
	pub id: String,
	pub name: String,
	pub category: ColumnKey,
	pub column_index: usize,
	/// Indices into [`FlowGraph::records`].
	pub members: Vec<usize>,
	/// Occurrences over the unfiltered dataset; drives the node height.
	pub global_count: usize,
	pub rect: Rect,
}

impl FlowNode {
	pub fn member_count(&self) -> usize {
		self.members.len()
	}
}

/// Aggregated co-occurrence edge between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowLink {
	/// Node index of the left end.
	pub source: usize,
	/// Node index of the right end.
	pub target: usize,
	pub weight: usize,
	pub members: Vec<usize>,
}

/// Positional handle on a node or link of one particular graph build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementRef {
	Node(usize),
	Link(usize),
}

/// Identity of a node or link that survives a rebuild.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKey {
	Node(String),
	Link { source: String, target: String },
}

/// A link whose endpoint id has no node. Logged and skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphBuildInvariantViolation {
	pub source_id: String,
	pub target_id: String,
}

impl fmt::Display for GraphBuildInvariantViolation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"link {} -> {} references a missing node",
			self.source_id, self.target_id
		)
	}
}

impl std::error::Error for GraphBuildInvariantViolation {}

/// Node/link snapshot for one (records, visible columns) pair.
///
/// Interaction code reads it and never mutates membership; only a rebuild
/// produces a new graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowGraph {
	pub records: Vec<SystemRecord>,
	pub columns: Vec<ColumnKey>,
	pub nodes: Vec<FlowNode>,
	pub links: Vec<FlowLink>,
	/// Largest global count, the reference for node heights.
	pub global_max: usize,
	/// Links dropped because of [`GraphBuildInvariantViolation`]s.
	pub skipped_links: usize,
	pub(crate) node_index: HashMap<String, usize>,
	pub(crate) link_index: HashMap<(usize, usize), usize>,
}

impl FlowGraph {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node_by_id(&self, id: &str) -> Option<&FlowNode> {
		self.node_index.get(id).map(|&i| &self.nodes[i])
	}

	/// Link between two node ids, if any.
	pub fn link_between(&self, source_id: &str, target_id: &str) -> Option<&FlowLink> {
		let source = *self.node_index.get(source_id)?;
		let target = *self.node_index.get(target_id)?;
		self.link_index
			.get(&(source, target))
			.map(|&i| &self.links[i])
	}

	/// Nodes of the visible column at `column_index`, top to bottom.
	pub fn column_nodes(&self, column_index: usize) -> impl Iterator<Item = (usize, &FlowNode)> {
		self.nodes
			.iter()
			.enumerate()
			.filter(move |(_, n)| n.column_index == column_index)
	}

	/// Member record indices of an element.
	pub fn members(&self, element: ElementRef) -> &[usize] {
		match element {
			ElementRef::Node(i) => &self.nodes[i].members,
			ElementRef::Link(i) => &self.links[i].members,
		}
	}

	/// Record ids of an element's members.
	pub fn member_ids(&self, element: ElementRef) -> BTreeSet<String> {
		self.members(element)
			.iter()
			.map(|&r| self.records[r].id.clone())
			.collect()
	}

	/// How many members of `members` have an id in `ids`.
	pub fn count_in(&self, members: &[usize], ids: &BTreeSet<String>) -> usize {
		members
			.iter()
			.filter(|&&r| ids.contains(&self.records[r].id))
			.count()
	}

	pub fn key_of(&self, element: ElementRef) -> ElementKey {
		match element {
			ElementRef::Node(i) => ElementKey::Node(self.nodes[i].id.clone()),
			ElementRef::Link(i) => {
				let link = &self.links[i];
				ElementKey::Link {
					source: self.nodes[link.source].id.clone(),
					target: self.nodes[link.target].id.clone(),
				}
			}
		}
	}

	/// Positional handle of `key` in this graph, if the element still exists.
	pub fn resolve(&self, key: &ElementKey) -> Option<ElementRef> {
		match key {
			ElementKey::Node(id) => self.node_index.get(id).copied().map(ElementRef::Node),
			ElementKey::Link { source, target } => {
				let s = *self.node_index.get(source)?;
				let t = *self.node_index.get(target)?;
				self.link_index.get(&(s, t)).copied().map(ElementRef::Link)
			}
		}
	}
}

/// Records a double-click opens, with the heading to show above them.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailRequest {
	pub title: String,
	pub records: Vec<SystemRecord>,
}
