//! Hover preview, click-to-freeze, and the intersection tier.
//!
//! The state holds record ids and element keys only, never positions into a
//! particular graph, so it can be carried across rebuilds. Rendering asks
//! [`HighlightState::plan`] for a per-element style instead of inspecting
//! what is currently drawn.

use std::collections::BTreeSet;

use log::debug;

use super::types::{ElementKey, ElementRef, FlowGraph};

/// Observable interaction phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Idle,
	HoverPreview,
	Frozen,
	FrozenWithHoverIntersection,
}

/// Drawing tier of one node or link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
	/// No highlight anywhere.
	Base,
	/// A highlight is showing and this element is not part of it.
	Dimmed,
	/// Transient hover or filter highlight.
	Active,
	/// Part of the frozen selection.
	Frozen,
	/// Overlap of the frozen selection with the hovered element or filters.
	Intersection,
}

impl Tier {
	pub fn is_overlay(self) -> bool {
		matches!(self, Self::Active | Self::Frozen | Self::Intersection)
	}
}

/// How one element is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementStyle {
	pub tier: Tier,
	/// Records the element is sized by: its full weight on [`Tier::Base`],
	/// otherwise only the highlighted members.
	pub count: usize,
	/// Frozen-tier element pushed back while an intersection is showing.
	pub muted: bool,
	/// The element that was clicked to freeze.
	pub clicked: bool,
}

/// Styles for every node and link, index-aligned with the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderPlan {
	pub nodes: Vec<ElementStyle>,
	pub links: Vec<ElementStyle>,
}

impl RenderPlan {
	/// Number of elements drawn on an overlay tier.
	pub fn overlay_count(&self) -> usize {
		self.nodes
			.iter()
			.chain(&self.links)
			.filter(|s| s.tier.is_overlay())
			.count()
	}

	pub fn count_tier(&self, tier: Tier) -> usize {
		self.nodes
			.iter()
			.chain(&self.links)
			.filter(|s| s.tier == tier)
			.count()
	}
}

/// Result of a single click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
	Froze,
	Unfroze,
	Ignored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Frozen {
	selection: BTreeSet<String>,
	clicked: ElementKey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Hovered {
	key: ElementKey,
	members: BTreeSet<String>,
}

/// Highlight state of one diagram.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightState {
	frozen: Option<Frozen>,
	hovered: Option<Hovered>,
	filter_selection: Option<BTreeSet<String>>,
}

impl HighlightState {
	pub fn phase(&self) -> Phase {
		match (&self.frozen, &self.hovered) {
			(None, None) => Phase::Idle,
			(None, Some(_)) => Phase::HoverPreview,
			(Some(frozen), _)
				if self
					.hovered_other()
					.is_some_and(|h| !h.members.is_disjoint(&frozen.selection)) =>
			{
				Phase::FrozenWithHoverIntersection
			}
			(Some(_), _) => Phase::Frozen,
		}
	}

	/// Hovered element unless it is the one that was clicked to freeze.
	fn hovered_other(&self) -> Option<&Hovered> {
		self.hovered
			.as_ref()
			.filter(|h| self.clicked() != Some(&h.key))
	}

	pub fn is_frozen(&self) -> bool {
		self.frozen.is_some()
	}

	pub fn frozen_selection(&self) -> Option<&BTreeSet<String>> {
		self.frozen.as_ref().map(|f| &f.selection)
	}

	pub fn clicked(&self) -> Option<&ElementKey> {
		self.frozen.as_ref().map(|f| &f.clicked)
	}

	pub fn hovered(&self) -> Option<&ElementKey> {
		self.hovered.as_ref().map(|h| &h.key)
	}

	/// Pointer entered `element`.
	pub fn hover(&mut self, graph: &FlowGraph, element: ElementRef) {
		let key = graph.key_of(element);
		if self.hovered.as_ref().is_some_and(|h| h.key == key) {
			return;
		}
		self.hovered = Some(Hovered {
			key,
			members: graph.member_ids(element),
		});
	}

	/// Pointer left every node and link.
	pub fn mouse_out(&mut self) {
		self.hovered = None;
	}

	/// Single click on `target`, or on the empty canvas when `None`.
	///
	/// While frozen any click unfreezes; a click on an element otherwise
	/// freezes its members.
	pub fn click(&mut self, graph: &FlowGraph, target: Option<ElementRef>) -> ClickOutcome {
		if self.frozen.is_some() {
			self.unfreeze();
			return ClickOutcome::Unfroze;
		}
		let Some(element) = target else {
			return ClickOutcome::Ignored;
		};
		let frozen = Frozen {
			selection: graph.member_ids(element),
			clicked: graph.key_of(element),
		};
		debug!(
			"Freezing {} records from {:?}",
			frozen.selection.len(),
			frozen.clicked
		);
		self.frozen = Some(frozen);
		self.hovered = None;
		ClickOutcome::Froze
	}

	/// Drop the frozen selection and every overlay.
	pub fn unfreeze(&mut self) {
		if self.frozen.take().is_some() {
			debug!("Unfreezing highlight");
		}
		self.hovered = None;
	}

	/// Records matched by the active filters, `None` when no filter is set.
	pub fn set_filter_selection(&mut self, selection: Option<BTreeSet<String>>) {
		self.filter_selection = selection;
	}

	/// Record indices a double-click on `element` opens: all members, or
	/// only those inside the frozen selection while frozen.
	pub fn detail_scope(&self, graph: &FlowGraph, element: ElementRef) -> Vec<usize> {
		let members = graph.members(element);
		match &self.frozen {
			None => members.to_vec(),
			Some(frozen) => members
				.iter()
				.copied()
				.filter(|&r| frozen.selection.contains(&graph.records[r].id))
				.collect(),
		}
	}

	/// Called once a new graph is in place. Hover never survives a rebuild;
	/// the frozen selection only survives when the columns are unchanged.
	pub fn on_rebuild(&mut self, columns_changed: bool) {
		self.hovered = None;
		if columns_changed && self.frozen.is_some() {
			debug!("Columns changed, dropping frozen highlight");
			self.frozen = None;
		}
	}

	/// Third-tier record set: frozen selection intersected with the hovered
	/// element, or with the filter matches when nothing frozen is hovered.
	pub fn intersection(&self) -> Option<BTreeSet<String>> {
		let frozen = self.frozen.as_ref()?;
		let overlap = |other: &BTreeSet<String>| -> Option<BTreeSet<String>> {
			let both: BTreeSet<String> = frozen.selection.intersection(other).cloned().collect();
			(!both.is_empty()).then_some(both)
		};
		self.hovered_other()
			.and_then(|h| overlap(&h.members))
			.or_else(|| self.filter_selection.as_ref().and_then(overlap))
	}

	/// Style of every element of `graph` in the current state.
	pub fn plan(&self, graph: &FlowGraph) -> RenderPlan {
		let intersection = self.intersection();
		let (primary, tier) = match &self.frozen {
			Some(frozen) => (Some(&frozen.selection), Tier::Frozen),
			None => (
				self.hovered
					.as_ref()
					.map(|h| &h.members)
					.or(self.filter_selection.as_ref()),
				Tier::Active,
			),
		};
		let clicked = self.clicked().and_then(|k| graph.resolve(k));

		let style = |element: ElementRef, members: &[usize]| -> ElementStyle {
			let is_clicked = clicked == Some(element);
			let Some(primary) = primary else {
				return ElementStyle {
					tier: Tier::Base,
					count: members.len(),
					muted: false,
					clicked: is_clicked,
				};
			};
			let hit = graph.count_in(members, primary);
			if hit == 0 {
				return ElementStyle {
					tier: Tier::Dimmed,
					count: 0,
					muted: false,
					clicked: is_clicked,
				};
			}
			match &intersection {
				Some(third) => {
					let overlap = graph.count_in(members, third);
					if overlap > 0 {
						ElementStyle {
							tier: Tier::Intersection,
							count: overlap,
							muted: false,
							clicked: is_clicked,
						}
					} else {
						ElementStyle {
							tier,
							count: hit,
							muted: true,
							clicked: is_clicked,
						}
					}
				}
				None => ElementStyle {
					tier,
					count: hit,
					muted: false,
					clicked: is_clicked,
				},
			}
		};

		RenderPlan {
			nodes: graph
				.nodes
				.iter()
				.enumerate()
				.map(|(i, n)| style(ElementRef::Node(i), &n.members))
				.collect(),
			links: graph
				.links
				.iter()
				.enumerate()
				.map(|(i, l)| style(ElementRef::Link(i), &l.members))
				.collect(),
		}
	}
}
