//! Interactive flow diagram: graph construction, layout, hit testing, the
//! highlight and drag state machines, and the canvas component that drives
//! them.

pub mod builder;
pub mod click;
mod component;
pub mod drag;
pub mod highlight;
pub mod layout;
mod render;
pub mod state;
pub mod types;

pub use builder::{GlobalCounts, build_graph, node_id};
pub use component::FlowDiagramCanvas;
pub use highlight::{ClickOutcome, ElementStyle, HighlightState, Phase, RenderPlan, Tier};
pub use types::{DetailRequest, ElementKey, ElementRef, FlowGraph, FlowLink, FlowNode, Rect};
