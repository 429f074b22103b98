//! Per-session drag state.
//!
//! One drag session moves through `Idle → Pending → Dragging → Settling →
//! Idle`; each phase carries exactly the fields that are valid in it, so a
//! field like the insertion index simply does not exist unless a zone is
//! hovered.

use crate::engine::animation::SettleAnimation;
use crate::engine::geometry::{Point, Rect, Size};
use crate::view::ViewId;

#[derive(Default, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DragPhase {
    #[default]
    Idle,
    Pending(PendingDrag),
    Dragging(ActiveDrag),
    Settling(SettlingDrag),
}

impl DragPhase {
    pub fn name(&self) -> &'static str { self.into() }

    pub fn is_idle(&self) -> bool { matches!(self, DragPhase::Idle) }

    pub fn is_settling(&self) -> bool { matches!(self, DragPhase::Settling(_)) }
}

/// Press accepted, activation threshold not yet exceeded. No tree mutation
/// has happened; discarding this state is always side-effect free.
pub struct PendingDrag {
    pub target: ViewId,
    pub drop_zones: Vec<ViewId>,
    pub start_pt: Point,
    /// While the pointer stays inside this window the press is still a
    /// click, not a drag.
    pub start_window: Rect,
}

/// Threshold exceeded; the item is floating and tracks the pointer.
pub struct ActiveDrag {
    pub target: ViewId,
    pub drop_zones: Vec<ViewId>,
    /// Item top-left at drag start, viewport coordinates. The settle
    /// destination for every cancelled outcome.
    pub tgt_start: Point,
    /// Half-extent of the item; offsets the pointer to the item's center
    /// when probing for an insertion slot.
    pub tgt_midpoint: Size,
    /// Pointer offset from the item's top-left at drag start. Stays within
    /// the item's bounds by construction.
    pub off_x: f64,
    pub off_y: f64,
    /// Signed grip factor in [-1, 1]; zero for a center grip.
    pub tilt: f64,
    pub placeholder: ViewId,
    pub hover: Option<ZoneHover>,
    pub cancel: bool,
    pub last_pos: Point,
}

/// Cached hover state for the zone currently under the pointer.
pub struct ZoneHover {
    pub zone: ViewId,
    pub zone_rect: Rect,
    /// Candidate insertion index among the zone's orderable children.
    pub idx: usize,
    /// Rect of the placeholder at its current slot; `None` forces the next
    /// placement pass to re-walk the zone.
    pub placeholder_rect: Option<Rect>,
}

/// Release accepted; the item is flying to its destination.
pub struct SettlingDrag {
    pub target: ViewId,
    pub placeholder: ViewId,
    pub anim: SettleAnimation,
    pub outcome: DropOutcome,
    /// A press that arrived mid-settle, replayed once the animation
    /// finishes so consecutive drags are serialized.
    pub deferred_press: Option<(ViewId, Point)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    /// Settle back to the origin; no callback.
    Return,
    /// Settle onto the placeholder and report the drop.
    Commit { zone_idx: usize, item_idx: usize, pos: Point },
}
