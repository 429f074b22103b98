//! The drag controller: pointer and key handling, zone hit-testing, and the
//! release sequence.

use std::mem;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::common::collections::HashSet;
use crate::common::config::Settings;
use crate::engine::animation::SettleAnimation;
use crate::engine::error::DragError;
use crate::engine::geometry::{point_after, point_in_bounds, Axis, Point, Rect, Size};
use crate::engine::scheduler::Clock;
use crate::engine::session::{
    ActiveDrag, DragPhase, DropOutcome, PendingDrag, SettlingDrag, ZoneHover,
};
use crate::view::{Cursor, ViewFlags, ViewId, ViewTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Escape,
    Enter,
    Space,
    Other,
}

/// Where the drop zones for a session come from. `Dynamic` is re-evaluated
/// at every press, for hosts whose zone set changes between drags.
pub enum ZoneSource {
    Fixed(Vec<ViewId>),
    Dynamic(Box<dyn FnMut() -> Vec<ViewId>>),
}

impl ZoneSource {
    fn resolve(&mut self) -> Vec<ViewId> {
        match self {
            ZoneSource::Fixed(zones) => zones.clone(),
            ZoneSource::Dynamic(f) => f(),
        }
    }
}

/// Passed to the drop callback alongside the zone and item indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropEvent {
    /// The item that was dragged.
    pub target: ViewId,
    /// Pointer position at release, viewport coordinates.
    pub pos: Point,
}

pub type DropHandler<C> = Box<dyn FnMut(DropEvent, usize, usize, &C)>;

pub struct DragOptions<C> {
    /// Opaque value forwarded unchanged to the drop callback.
    pub context: C,
    pub zones: ZoneSource,
    /// Orientation shared by every zone in this configuration.
    pub vertical: bool,
    pub on_drop: DropHandler<C>,
}

/// Hit-testing counters, exposed so tests can verify the hysteresis guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragStats {
    /// Full drop-zone scans (hysteresis misses).
    pub zone_rescans: u64,
    /// Full sibling walks for the insertion index.
    pub placement_walks: u64,
}

pub struct DragController<C> {
    handle: ViewId,
    context: C,
    zones: ZoneSource,
    list_axis: Axis,
    on_drop: DropHandler<C>,
    settings: Settings,
    clock: Rc<dyn Clock>,
    phase: DragPhase,
    stats: DragStats,
}

impl<C> DragController<C> {
    pub fn attach(
        tree: &mut ViewTree,
        handle: ViewId,
        options: DragOptions<C>,
        settings: Settings,
        clock: Rc<dyn Clock>,
    ) -> DragController<C> {
        tree.set_cursor(Cursor::Grab);
        DragController {
            handle,
            context: options.context,
            zones: options.zones,
            list_axis: if options.vertical { Axis::Vertical } else { Axis::Horizontal },
            on_drop: options.on_drop,
            settings,
            clock,
            phase: DragPhase::Idle,
            stats: DragStats::default(),
        }
    }

    pub fn handle(&self) -> ViewId { self.handle }

    pub fn phase(&self) -> &DragPhase { &self.phase }

    pub fn is_idle(&self) -> bool { self.phase.is_idle() }

    pub fn is_settling(&self) -> bool { self.phase.is_settling() }

    pub fn stats(&self) -> DragStats { self.stats }

    /// Begin a session at `pos` on `hit`, which may be any descendant of a
    /// draggable item. The item is the ancestor of `hit` whose parent is one
    /// of the configured drop zones; a `hit` with no such ancestor is a
    /// usage error and leaves the controller untouched.
    pub fn on_pointer_down(
        &mut self,
        tree: &mut ViewTree,
        hit: ViewId,
        pos: Point,
    ) -> Result<(), DragError> {
        match &mut self.phase {
            DragPhase::Settling(settling) => {
                trace!("press deferred behind settle animation");
                settling.deferred_press = Some((hit, pos));
                return Ok(());
            }
            DragPhase::Pending(_) | DragPhase::Dragging(_) => return Ok(()),
            DragPhase::Idle => {}
        }

        let drop_zones = self.zones.resolve();
        if drop_zones.is_empty() {
            return Err(DragError::NoDropZones);
        }
        let zone_set: HashSet<ViewId> = drop_zones.iter().copied().collect();

        let mut target = hit;
        loop {
            match tree.parent(target) {
                Some(parent) if zone_set.contains(&parent) => break,
                Some(parent) => target = parent,
                None => return Err(DragError::OutsideDropZones),
            }
        }

        let start_window = Rect::around(pos, self.settings.drag_threshold);
        debug!(?pos, "press accepted");
        self.phase =
            DragPhase::Pending(PendingDrag { target, drop_zones, start_pt: pos, start_window });
        Ok(())
    }

    pub fn on_pointer_move(&mut self, tree: &mut ViewTree, pos: Point) {
        if let DragPhase::Pending(pending) = &self.phase {
            let sw = pending.start_window;
            if point_in_bounds(pos, sw, Axis::Vertical) && point_in_bounds(pos, sw, Axis::Horizontal)
            {
                return;
            }
            let DragPhase::Pending(pending) = mem::take(&mut self.phase) else { return };
            let active = Self::begin_drag(tree, pending, self.list_axis, self.settings.tilt_degrees);
            debug!(target = ?active.target, "drag started");
            self.phase = DragPhase::Dragging(active);
        }

        let list_axis = self.list_axis;
        let stats = &mut self.stats;
        let DragPhase::Dragging(drag) = &mut self.phase else { return };

        // The float lives in document coordinates so the item tracks the
        // pointer correctly while the page is scrolled.
        let scroll = tree.scroll();
        let upper_left = Point::new(pos.x - drag.off_x, pos.y - drag.off_y);
        tree.set_floating(drag.target, Some(upper_left.offset(scroll.x, scroll.y)));
        drag.last_pos = pos;

        Self::update_hover(tree, drag, list_axis, stats, pos);
        Self::update_placement(tree, drag, list_axis, stats, upper_left);
    }

    pub fn on_pointer_up(&mut self, tree: &mut ViewTree, pos: Point) {
        self.release(tree, pos);
    }

    /// Escape cancels the session: an active drag releases at its last
    /// pointer position and flies back to its origin; a pending press is
    /// discarded outright.
    pub fn on_key_down(&mut self, tree: &mut ViewTree, key: KeyCode) {
        if key != KeyCode::Escape {
            return;
        }
        let pos = match &mut self.phase {
            DragPhase::Dragging(drag) => {
                drag.cancel = true;
                drag.last_pos
            }
            DragPhase::Pending(_) => {
                self.phase = DragPhase::Idle;
                tree.set_cursor(Cursor::Grab);
                return;
            }
            _ => return,
        };
        debug!("drag cancelled");
        self.release(tree, pos);
    }

    /// Advance the settle animation. Returns true while more frames are
    /// needed, making the controller directly usable as a scheduler task.
    pub fn on_frame(&mut self, tree: &mut ViewTree, now: Instant) -> bool {
        {
            let DragPhase::Settling(settling) = &mut self.phase else { return false };
            if !settling.anim.finished(now) {
                let pose = settling.anim.sample(now);
                let scroll = tree.scroll();
                tree.set_floating(settling.target, Some(pose.pos.offset(scroll.x, scroll.y)));
                tree.set_tilt(settling.target, pose.tilt * self.settings.tilt_degrees);
                return true;
            }
        }

        let DragPhase::Settling(settling) = mem::take(&mut self.phase) else { return false };
        let SettlingDrag { target, placeholder, outcome, deferred_press, .. } = settling;
        self.finish(tree, target, placeholder, outcome);
        if let Some((hit, pos)) = deferred_press {
            if let Err(err) = self.on_pointer_down(tree, hit, pos) {
                warn!(%err, "deferred press dropped");
            }
        }
        false
    }

    fn begin_drag(
        tree: &mut ViewTree,
        pending: PendingDrag,
        list_axis: Axis,
        tilt_degrees: f64,
    ) -> ActiveDrag {
        let PendingDrag { target, drop_zones, start_pt, .. } = pending;
        tree.set_cursor(Cursor::Grabbing);
        let rect = tree.rect(target);
        let off_x = start_pt.x - rect.origin.x;
        let off_y = start_pt.y - rect.origin.y;

        let placeholder = tree.new_element(Size::ZERO);
        tree.add_flag(placeholder, ViewFlags::PLACEHOLDER);
        let min_width = match list_axis {
            Axis::Vertical => 0.0,
            Axis::Horizontal => rect.size.width,
        };
        tree.set_min_size(placeholder, Size::new(min_width, rect.size.height));
        tree.insert_before(placeholder, target);

        // Center grip gives no tilt; the further toward a corner the press
        // landed, the stronger the lean.
        let x_tilt = 1.0 - 2.0 * (off_x / rect.size.width);
        let y_tilt = 1.0 - 2.0 * (off_y / rect.size.height);
        let tilt = x_tilt * y_tilt;

        let scroll = tree.scroll();
        tree.set_floating(target, Some(rect.origin.offset(scroll.x, scroll.y)));
        tree.set_z_raised(target, true);
        tree.add_flag(target, ViewFlags::BEING_DRAGGED);
        tree.set_tilt(target, tilt * tilt_degrees);

        ActiveDrag {
            target,
            drop_zones,
            tgt_start: rect.origin,
            tgt_midpoint: Size::new(rect.size.width * 0.5, rect.size.height * 0.5),
            off_x,
            off_y,
            tilt,
            placeholder,
            hover: None,
            cancel: false,
            last_pos: start_pt,
        }
    }

    fn update_hover(
        tree: &mut ViewTree,
        drag: &mut ActiveDrag,
        list_axis: Axis,
        stats: &mut DragStats,
        pos: Point,
    ) {
        if let Some(hover) = &drag.hover {
            // Still inside the cached rect: skip the full scan.
            if point_in_bounds(pos, hover.zone_rect, list_axis.cross()) {
                return;
            }
        }
        stats.zone_rescans += 1;

        let mut found = None;
        for &zone in &drag.drop_zones {
            let rect = tree.rect(zone);
            if point_in_bounds(pos, rect, list_axis.cross()) {
                found = Some((zone, rect));
            }
        }

        if let Some(prev) = drag.hover.take() {
            tree.remove_flag(prev.zone, ViewFlags::DROP_HOVER);
            tree.detach(drag.placeholder);
            trace!(zone = ?prev.zone, "left drop zone");
        }

        if let Some((zone, zone_rect)) = found {
            tree.add_flag(zone, ViewFlags::DROP_HOVER);
            trace!(?zone, "entered drop zone");
            drag.hover = Some(ZoneHover { zone, zone_rect, idx: 0, placeholder_rect: None });
        }
    }

    fn update_placement(
        tree: &mut ViewTree,
        drag: &mut ActiveDrag,
        list_axis: Axis,
        stats: &mut DragStats,
        upper_left: Point,
    ) {
        let target = drag.target;
        let placeholder = drag.placeholder;
        let midpoint = drag.tgt_midpoint;
        let Some(hover) = &mut drag.hover else { return };

        // Probe with the item's center, not the raw cursor, so the slot
        // choice is independent of where the item was gripped.
        let probe = upper_left.offset(midpoint.width, midpoint.height);
        if let Some(rect) = hover.placeholder_rect {
            if point_in_bounds(probe, rect, list_axis) {
                return;
            }
        }
        stats.placement_walks += 1;

        let mut new_idx = 0;
        let mut next_sibling = None;
        for child in tree.children(hover.zone).to_vec() {
            if child == target || child == placeholder || tree.is_text(child) {
                continue;
            }
            let rect = tree.rect(child);
            if !point_after(probe, rect, list_axis) {
                next_sibling = Some(child);
                break;
            }
            new_idx += 1;
        }

        if hover.placeholder_rect.is_some() && hover.idx == new_idx {
            return;
        }

        match next_sibling {
            Some(sibling) => tree.insert_before(placeholder, sibling),
            None => tree.append_child(hover.zone, placeholder),
        }
        hover.idx = new_idx;
        hover.placeholder_rect = Some(tree.rect(placeholder));
        trace!(idx = new_idx, "placeholder moved");
    }

    fn release(&mut self, tree: &mut ViewTree, pos: Point) {
        match mem::take(&mut self.phase) {
            DragPhase::Idle => {}
            DragPhase::Settling(settling) => {
                // Duplicate release; the first one is already settling.
                self.phase = DragPhase::Settling(settling);
            }
            DragPhase::Pending(_) => {
                // The pointer never left the start window: a click, not a
                // drag. Nothing was mutated, so there is nothing to undo.
                tree.set_cursor(Cursor::Grab);
                debug!("press released below drag threshold");
            }
            DragPhase::Dragging(drag) => {
                tree.set_cursor(Cursor::Grab);
                tree.remove_flag(drag.target, ViewFlags::BEING_DRAGGED);
                if let Some(hover) = &drag.hover {
                    tree.remove_flag(hover.zone, ViewFlags::DROP_HOVER);
                }

                let outcome = match &drag.hover {
                    Some(hover) if !drag.cancel => {
                        match drag.drop_zones.iter().position(|z| *z == hover.zone) {
                            Some(zone_idx) => {
                                DropOutcome::Commit { zone_idx, item_idx: hover.idx, pos }
                            }
                            None => DropOutcome::Return,
                        }
                    }
                    _ => DropOutcome::Return,
                };
                let dest = match outcome {
                    DropOutcome::Return => drag.tgt_start,
                    DropOutcome::Commit { .. } => tree.rect(drag.placeholder).origin,
                };

                if !self.settings.animate {
                    self.finish(tree, drag.target, drag.placeholder, outcome);
                    return;
                }

                // Cancelled drags glide back slower than committed drops
                // snap in.
                let multiplier = if drag.cancel {
                    self.settings.cancel_speed_multiplier
                } else {
                    self.settings.commit_speed_multiplier
                };
                let speed = self.settings.settle_speed * multiplier;
                let current = tree.rect(drag.target).origin;
                let min_duration = Duration::from_secs_f64(self.settings.min_settle_ms / 1000.0);
                let anim = SettleAnimation::new(
                    current,
                    dest,
                    drag.tilt,
                    speed,
                    min_duration,
                    self.clock.now(),
                );
                debug!(
                    ?dest,
                    duration_ms = anim.duration().as_millis() as u64,
                    "settle started"
                );
                self.phase = DragPhase::Settling(SettlingDrag {
                    target: drag.target,
                    placeholder: drag.placeholder,
                    anim,
                    outcome,
                    deferred_press: None,
                });
            }
        }
    }

    fn finish(&mut self, tree: &mut ViewTree, target: ViewId, placeholder: ViewId, outcome: DropOutcome) {
        tree.clear_inline(target);
        if let DropOutcome::Commit { zone_idx, item_idx, pos } = outcome {
            debug!(zone_idx, item_idx, "drop committed");
            (self.on_drop)(DropEvent { target, pos }, zone_idx, item_idx, &self.context);
        }
        tree.remove(placeholder);
        trace!("drag session cleared");
    }
}
