use log::debug;

use crate::data::ColumnKey;

/// In-flight drag of one column label.
///
/// The offset is applied at draw time only; node rectangles keep their
/// laid-out positions until a reorder commits.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDrag {
	pub column_index: usize,
	pub column: ColumnKey,
	pub start_x: f64,
	pub delta_x: f64,
}

/// A column easing back to its slot after a drag that did not reorder.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapBack {
	pub column_index: usize,
	pub from_delta: f64,
	pub elapsed_ms: f64,
	pub duration_ms: f64,
}

impl SnapBack {
	pub fn offset(&self) -> f64 {
		let t = if self.duration_ms <= 0.0 {
			1.0
		} else {
			(self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
		};
		self.from_delta * (1.0 - ease_out_quad(t))
	}

	pub fn is_done(&self) -> bool {
		self.elapsed_ms >= self.duration_ms
	}
}

fn ease_out_quad(t: f64) -> f64 {
	1.0 - (1.0 - t) * (1.0 - t)
}

/// What a released drag resolved to.
#[derive(Clone, Debug, PartialEq)]
pub enum DragOutcome {
	Reorder { from: usize, to: usize },
	SnapBack,
}

/// Column drag gesture plus the snap-back animation that may follow it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DragController {
	active: Option<ColumnDrag>,
	snap_back: Option<SnapBack>,
}

impl DragController {
	pub fn is_dragging(&self) -> bool {
		self.active.is_some()
	}

	pub fn active(&self) -> Option<&ColumnDrag> {
		self.active.as_ref()
	}

	pub fn start(&mut self, column_index: usize, column: ColumnKey, x: f64) {
		debug!("Drag start on column {column} at {column_index}");
		self.snap_back = None;
		self.active = Some(ColumnDrag {
			column_index,
			column,
			start_x: x,
			delta_x: 0.0,
		});
	}

	pub fn drag_move(&mut self, x: f64) {
		if let Some(drag) = &mut self.active {
			drag.delta_x = x - drag.start_x;
		}
	}

	/// Horizontal draw offset of column `column_index` right now.
	pub fn offset_for(&self, column_index: usize) -> f64 {
		if let Some(drag) = self.active.as_ref().filter(|d| d.column_index == column_index) {
			return drag.delta_x;
		}
		self.snap_back
			.as_ref()
			.filter(|s| s.column_index == column_index)
			.map_or(0.0, SnapBack::offset)
	}

	/// Release at `x`. `midpoints` are the fixed column centres.
	///
	/// Returns `None` when no drag was in progress.
	pub fn end(&mut self, x: f64, midpoints: &[f64], snap_back_ms: f64) -> Option<DragOutcome> {
		let mut drag = self.active.take()?;
		drag.delta_x = x - drag.start_x;
		let from = drag.column_index;
		let Some(&origin) = midpoints.get(from) else {
			return Some(DragOutcome::SnapBack);
		};

		match resolve_target(from, origin + drag.delta_x, midpoints) {
			Some(to) => {
				debug!("Drag of {} resolves to slot {to}", drag.column);
				Some(DragOutcome::Reorder { from, to })
			}
			None => {
				if drag.delta_x != 0.0 {
					self.snap_back = Some(SnapBack {
						column_index: from,
						from_delta: drag.delta_x,
						elapsed_ms: 0.0,
						duration_ms: snap_back_ms,
					});
				}
				Some(DragOutcome::SnapBack)
			}
		}
	}

	/// Abort the gesture without animating.
	pub fn cancel(&mut self) {
		self.active = None;
		self.snap_back = None;
	}

	/// Advance the snap-back animation. Returns whether it still needs frames.
	pub fn tick(&mut self, dt_ms: f64) -> bool {
		let Some(snap) = &mut self.snap_back else {
			return false;
		};
		snap.elapsed_ms += dt_ms;
		if snap.is_done() {
			self.snap_back = None;
			return false;
		}
		true
	}

	pub fn is_animating(&self) -> bool {
		self.snap_back.is_some()
	}
}

/// Slot a column dragged from `from` lands in when its centre is at
/// `dragged_mid`, or `None` to snap back.
///
/// The pointer has to pass the midpoint of the neighbouring column in the
/// direction of travel; the slot is then the column with the nearest fixed
/// midpoint.
pub fn resolve_target(from: usize, dragged_mid: f64, midpoints: &[f64]) -> Option<usize> {
	let origin = *midpoints.get(from)?;
	let crossed = if dragged_mid > origin {
		midpoints.get(from + 1).is_some_and(|&m| dragged_mid >= m)
	} else if dragged_mid < origin {
		from.checked_sub(1)
			.and_then(|i| midpoints.get(i))
			.is_some_and(|&m| dragged_mid <= m)
	} else {
		false
	};
	if !crossed {
		return None;
	}

	let nearest = midpoints
		.iter()
		.enumerate()
		.min_by(|(_, a), (_, b)| {
			(dragged_mid - **a)
				.abs()
				.total_cmp(&(dragged_mid - **b).abs())
		})
		.map(|(i, _)| i)?;
	(nearest != from).then_some(nearest)
}

/// Move the column at `from` so it ends up at `to`. Out-of-range indices
/// are clamped.
pub fn reorder_columns(columns: &[ColumnKey], from: usize, to: usize) -> Vec<ColumnKey> {
	let mut order = columns.to_vec();
	if order.is_empty() {
		return order;
	}
	let last = order.len() - 1;
	let (from_c, to_c) = (from.min(last), to.min(last));
	if (from_c, to_c) != (from, to) {
		debug!("Clamped reorder target {from}->{to} to {from_c}->{to_c}");
	}
	let column = order.remove(from_c);
	order.insert(to_c, column);
	order
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	const MIDS: [f64; 4] = [100.0, 300.0, 500.0, 700.0];

	fn cols(keys: &[&str]) -> Vec<ColumnKey> {
		keys.iter().map(|&k| ColumnKey::from(k)).collect()
	}

	#[test]
	fn short_drag_snaps_back() {
		assert_eq!(resolve_target(1, 390.0, &MIDS), None);
		assert_eq!(resolve_target(1, 210.0, &MIDS), None);
	}

	#[test]
	fn crossing_neighbour_picks_nearest_slot() {
		assert_eq!(resolve_target(1, 510.0, &MIDS), Some(2));
		assert_eq!(resolve_target(1, 650.0, &MIDS), Some(3));
		assert_eq!(resolve_target(2, 90.0, &MIDS), Some(0));
		assert_eq!(resolve_target(0, 2000.0, &MIDS), Some(3));
	}

	#[test]
	fn edge_columns_cannot_leave_the_range() {
		assert_eq!(resolve_target(0, -500.0, &MIDS), None);
		assert_eq!(resolve_target(3, 900.0, &MIDS), None);
		assert_eq!(resolve_target(7, 100.0, &MIDS), None);
	}

	#[test]
	fn reorder_moves_single_column() {
		let order = cols(&["organism", "trigger", "output", "scale"]);
		assert_eq!(reorder_columns(&order, 1, 2), cols(&["organism", "output", "trigger", "scale"]));
		assert_eq!(reorder_columns(&order, 3, 0), cols(&["scale", "organism", "trigger", "output"]));
		assert_eq!(reorder_columns(&order, 0, 99), cols(&["trigger", "output", "scale", "organism"]));
		assert!(reorder_columns(&[], 0, 1).is_empty());
	}

	#[test]
	fn drag_offsets_only_the_dragged_column() {
		let mut drag = DragController::default();
		drag.start(1, "trigger".into(), 300.0);
		drag.drag_move(340.0);
		assert_eq!(drag.offset_for(1), 40.0);
		assert_eq!(drag.offset_for(0), 0.0);
		assert_eq!(drag.active().map(|d| d.column.as_str()), Some("trigger"));
	}

	#[test]
	fn release_past_neighbour_reorders() {
		let mut drag = DragController::default();
		drag.start(0, "organism".into(), 100.0);
		assert_eq!(drag.end(330.0, &MIDS, 200.0), Some(DragOutcome::Reorder { from: 0, to: 1 }));
		assert!(!drag.is_dragging());
		assert!(!drag.is_animating());
	}

	#[test]
	fn snap_back_eases_to_zero() {
		let mut drag = DragController::default();
		drag.start(2, "output".into(), 500.0);
		assert_eq!(drag.end(560.0, &MIDS, 200.0), Some(DragOutcome::SnapBack));
		assert_eq!(drag.offset_for(2), 60.0);

		assert!(drag.tick(100.0));
		let mid = drag.offset_for(2);
		assert!(mid > 0.0 && mid < 30.0);
		assert!(!drag.tick(150.0));
		assert_eq!(drag.offset_for(2), 0.0);
	}

	#[test]
	fn release_without_drag_is_none() {
		let mut drag = DragController::default();
		assert_eq!(drag.end(10.0, &MIDS, 200.0), None);
	}
}
