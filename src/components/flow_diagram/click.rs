/// Tells single clicks from double-clicks with one cancellable deferred
/// action.
///
/// The first click schedules its single-click action for `window_ms` later.
/// A second click inside the window cancels that action and reports a
/// double-click instead; a third click inside the same window is swallowed.
#[derive(Clone, Debug, PartialEq)]
pub struct ClickDisambiguator<T> {
	phase: ClickPhase<T>,
	window_ms: f64,
	token: u64,
}

#[derive(Clone, Debug, PartialEq)]
enum ClickPhase<T> {
	Idle,
	PendingSingle { target: T, at_ms: f64 },
	Consumed { at_ms: f64 },
}

/// What the caller should do with a click.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickAction<T> {
	/// Run [`ClickDisambiguator::fire`] with `token` after `delay_ms`.
	Defer { token: u64, delay_ms: f64 },
	Double(T),
	Ignore,
}

impl<T> ClickDisambiguator<T> {
	pub fn new(window_ms: f64) -> Self {
		Self {
			phase: ClickPhase::Idle,
			window_ms,
			token: 0,
		}
	}

	/// Register a click on `target` at `now_ms`.
	pub fn press(&mut self, target: T, now_ms: f64) -> ClickAction<T> {
		match std::mem::replace(&mut self.phase, ClickPhase::Idle) {
			ClickPhase::PendingSingle { target: first, at_ms } if now_ms - at_ms <= self.window_ms => {
				self.token += 1;
				self.phase = ClickPhase::Consumed { at_ms: now_ms };
				ClickAction::Double(first)
			}
			ClickPhase::Consumed { at_ms } if now_ms - at_ms <= self.window_ms => {
				self.phase = ClickPhase::Consumed { at_ms };
				ClickAction::Ignore
			}
			_ => {
				self.token += 1;
				self.phase = ClickPhase::PendingSingle {
					target,
					at_ms: now_ms,
				};
				ClickAction::Defer {
					token: self.token,
					delay_ms: self.window_ms,
				}
			}
		}
	}

	/// The deferred timer for `token` elapsed. Returns the single-click
	/// target unless a later click superseded or cancelled it.
	pub fn fire(&mut self, token: u64) -> Option<T> {
		if token != self.token {
			return None;
		}
		match std::mem::replace(&mut self.phase, ClickPhase::Idle) {
			ClickPhase::PendingSingle { target, .. } => Some(target),
			other => {
				self.phase = other;
				None
			}
		}
	}

	/// Forget any pending action, e.g. on teardown.
	pub fn cancel(&mut self) {
		self.token += 1;
		self.phase = ClickPhase::Idle;
	}

	pub fn is_pending(&self) -> bool {
		matches!(self.phase, ClickPhase::PendingSingle { .. })
	}
}
