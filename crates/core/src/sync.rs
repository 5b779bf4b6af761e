//! Vertical scroll coordination across lanes.
//!
//! Passive sync: a scroll on one lane is broadcast to all others. Setting a
//! sibling's offset makes the host report a scroll for that sibling too;
//! those echoes arrive while the guard is held and are dropped. The guard
//! is entered before the broadcast, released when the broadcast ends by
//! any path, and cleared back to idle on the next idle tick.
//!
//! Active pan: while the pan modifier is held, pointer drags move the
//! column window and every lane directly, without going through the
//! broadcast.

use lanewise_protocol::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Anything with a vertical scroll offset the synchronizer can drive.
pub trait Scrollable {
    fn scroll_offset(&self) -> f64;
    /// Apply an offset; implementors clamp it to their own bounds.
    fn set_scroll_offset(&mut self, offset: f64);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardState {
    #[default]
    Idle,
    Broadcasting,
    /// Broadcast finished; echoes are still ignored until the idle tick.
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    Broadcast {
        origin: usize,
        offset: f64,
        updated: usize,
    },
    /// Sync disabled: only the origin moved.
    Local { origin: usize, offset: f64 },
    /// An echo of our own broadcast, dropped.
    Suppressed,
    /// `origin` is not a lane.
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub broadcasts: u64,
    pub suppressed: u64,
    pub releases: u64,
}

/// Moves the guard out of `Broadcasting` when dropped, so a broadcast that
/// exits early or unwinds cannot leave lanes sync-locked.
struct BroadcastGuard<'a> {
    state: &'a mut GuardState,
    stats: &'a mut SyncStats,
}

impl<'a> BroadcastGuard<'a> {
    fn enter(state: &'a mut GuardState, stats: &'a mut SyncStats) -> Self {
        *state = GuardState::Broadcasting;
        stats.broadcasts += 1;
        Self { state, stats }
    }
}

impl Drop for BroadcastGuard<'_> {
    fn drop(&mut self) {
        *self.state = GuardState::Settling;
        self.stats.releases += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanDelta {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanGesture {
    last: Point,
}

#[derive(Debug, Default)]
pub struct ScrollSync {
    enabled: bool,
    state: GuardState,
    pan: Option<PanGesture>,
    stats: SyncStats,
}

impl ScrollSync {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// A lane reported a new scroll offset.
    pub fn on_scroll<T: Scrollable>(&mut self, lanes: &mut [T], origin: usize, offset: f64) -> SyncOutcome {
        if self.state != GuardState::Idle {
            self.stats.suppressed += 1;
            trace!(origin, offset, "scroll echo suppressed");
            return SyncOutcome::Suppressed;
        }
        let Some(source) = lanes.get_mut(origin) else {
            return SyncOutcome::Ignored;
        };
        source.set_scroll_offset(offset);
        let applied = source.scroll_offset();

        if !self.enabled {
            return SyncOutcome::Local {
                origin,
                offset: applied,
            };
        }

        let _guard = BroadcastGuard::enter(&mut self.state, &mut self.stats);
        let mut updated = 0;
        for (i, lane) in lanes.iter_mut().enumerate() {
            if i != origin {
                lane.set_scroll_offset(applied);
                updated += 1;
            }
        }
        debug!(origin, offset = applied, updated, "scroll broadcast");
        SyncOutcome::Broadcast {
            origin,
            offset: applied,
            updated,
        }
    }

    /// The host finished a frame; accept scroll events again.
    pub fn idle_tick(&mut self) {
        if self.state == GuardState::Settling {
            self.state = GuardState::Idle;
        }
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Start a pan if the modifier is held. Returns whether a pan began.
    pub fn begin_pan(&mut self, pointer: Point, modifier_held: bool) -> bool {
        if !modifier_held {
            return false;
        }
        self.pan = Some(PanGesture { last: pointer });
        true
    }

    /// Continue a pan. Vertical movement is applied to every lane directly;
    /// the returned delta is the pointer movement since the last call, for
    /// the caller's column axis. Losing the modifier ends the pan.
    pub fn pan_move<T: Scrollable>(
        &mut self,
        lanes: &mut [T],
        pointer: Point,
        modifier_held: bool,
    ) -> Option<PanDelta> {
        if !modifier_held {
            self.end_pan();
            return None;
        }
        let gesture = self.pan.as_mut()?;
        let delta = PanDelta {
            dx: pointer.x - gesture.last.x,
            dy: pointer.y - gesture.last.y,
        };
        gesture.last = pointer;
        if delta.dy != 0.0 {
            for lane in lanes.iter_mut() {
                let offset = lane.scroll_offset() - delta.dy;
                lane.set_scroll_offset(offset);
            }
        }
        Some(delta)
    }

    pub fn end_pan(&mut self) {
        self.pan = None;
    }
}
