use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use crate::common::config::Settings;
use crate::engine::controller::{DragController, DragOptions, KeyCode, ZoneSource};
use crate::engine::error::DragError;
use crate::engine::geometry::{Axis, Point, SameAs, Size};
use crate::engine::scheduler::{Clock, ManualClock};
use crate::view::{Cursor, ViewFlags, ViewId, ViewTree};

type Reports = Rc<RefCell<Vec<(ViewId, usize, usize, &'static str)>>>;

struct Fixture {
    tree: ViewTree,
    zones: Vec<ViewId>,
    items: Vec<Vec<ViewId>>,
    controller: DragController<&'static str>,
    clock: Rc<ManualClock>,
    reports: Reports,
}

/// Zones side by side along the cross axis, each holding `count` items of
/// 100x20 (vertical lists) or 20x100 (horizontal lists).
fn fixture(vertical: bool, zone_counts: &[usize], animate: bool) -> Fixture {
    let mut tree = ViewTree::new();
    let root = tree.root();
    tree.set_axis(root, if vertical { Axis::Horizontal } else { Axis::Vertical });

    let item_size = if vertical { Size::new(100.0, 20.0) } else { Size::new(20.0, 100.0) };
    let mut zones = Vec::new();
    let mut items = Vec::new();
    for &count in zone_counts {
        let zone = tree.new_element(Size::ZERO);
        if !vertical {
            tree.set_axis(zone, Axis::Horizontal);
        }
        tree.append_child(root, zone);
        let zone_items: Vec<ViewId> = (0..count)
            .map(|_| {
                let item = tree.new_element(item_size);
                tree.append_child(zone, item);
                item
            })
            .collect();
        zones.push(zone);
        items.push(zone_items);
    }

    let clock = Rc::new(ManualClock::new());
    let reports: Reports = Rc::default();
    let sink = reports.clone();
    let settings = Settings { animate, ..Settings::default() };
    let controller = DragController::attach(
        &mut tree,
        root,
        DragOptions {
            context: "ctx",
            zones: ZoneSource::Fixed(zones.clone()),
            vertical,
            on_drop: Box::new(move |ev, zone_idx, item_idx, ctx| {
                sink.borrow_mut().push((ev.target, zone_idx, item_idx, *ctx));
            }),
        },
        settings,
        clock.clone(),
    );

    Fixture { tree, zones, items, controller, clock, reports }
}

impl Fixture {
    fn down(&mut self, item: ViewId, pos: Point) {
        self.controller.on_pointer_down(&mut self.tree, item, pos).unwrap();
    }

    fn moves(&mut self, pos: Point) {
        self.controller.on_pointer_move(&mut self.tree, pos);
    }

    fn up(&mut self, pos: Point) {
        self.controller.on_pointer_up(&mut self.tree, pos);
    }

    /// Drive the settle animation to completion in 16 ms steps.
    fn settle(&mut self) {
        for _ in 0..10_000 {
            if !self.controller.is_settling() {
                return;
            }
            self.clock.advance(Duration::from_millis(16));
            if !self.controller.on_frame(&mut self.tree, self.clock.now()) {
                return;
            }
        }
        panic!("settle animation never finished");
    }

    fn placeholder_count(&mut self) -> usize {
        let mut count = 0;
        for zone in self.zones.clone() {
            for child in self.tree.children(zone).to_vec() {
                if self.tree.has_flag(child, ViewFlags::PLACEHOLDER) {
                    count += 1;
                }
            }
        }
        count
    }
}

#[test]
fn below_threshold_press_is_inert() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];
    let before = fix.tree.node_count();

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(53.0, 12.0));
    fix.moves(Point::new(48.0, 8.0));
    fix.up(Point::new(48.0, 8.0));

    assert_eq!(fix.tree.node_count(), before);
    assert!(!fix.tree.has_flag(a, ViewFlags::BEING_DRAGGED));
    assert_eq!(fix.tree.floating(a), None);
    assert!(fix.reports.borrow().is_empty());
    assert!(fix.controller.is_idle());
    assert_eq!(fix.tree.cursor(), Cursor::Grab);
}

#[test]
fn drag_below_second_item_reports_index_one() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    fix.up(Point::new(50.0, 45.0));

    assert_eq!(*fix.reports.borrow(), vec![(a, 0, 1, "ctx")]);
}

#[test]
fn transfer_to_second_zone_reports_index_zero() {
    let mut fix = fixture(true, &[2, 1], false);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(150.0, 5.0));
    fix.up(Point::new(150.0, 5.0));

    assert_eq!(*fix.reports.borrow(), vec![(a, 1, 0, "ctx")]);
}

#[test]
fn horizontal_lists_order_along_x() {
    let mut fix = fixture(false, &[3], false);
    let a = fix.items[0][0];

    // Items at x 0, 20, 40 once the placeholder takes A's slot. Dragging A
    // past the second item's center should land it at index 1.
    fix.down(a, Point::new(10.0, 50.0));
    fix.moves(Point::new(45.0, 50.0));
    fix.up(Point::new(45.0, 50.0));

    assert_eq!(*fix.reports.borrow(), vec![(a, 0, 1, "ctx")]);
}

#[test_log::test]
fn release_outside_every_zone_settles_back_home() {
    let mut fix = fixture(true, &[3], true);
    let a = fix.items[0][0];
    let home = fix.tree.rect(a).origin;

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(250.0, 10.0));
    assert_eq!(fix.tree.has_flag(fix.zones[0], ViewFlags::DROP_HOVER), false);
    fix.up(Point::new(250.0, 10.0));

    assert!(fix.controller.is_settling());
    fix.settle();

    assert!(fix.reports.borrow().is_empty());
    assert!(fix.controller.is_idle());
    assert_eq!(fix.tree.floating(a), None);
    assert!(fix.tree.rect(a).origin.same_as(home));
    assert_eq!(fix.placeholder_count(), 0);
}

#[test]
fn escape_cancels_even_while_over_a_zone() {
    let mut fix = fixture(true, &[3], true);
    let a = fix.items[0][0];
    let home = fix.tree.rect(a).origin;

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    assert!(fix.tree.has_flag(fix.zones[0], ViewFlags::DROP_HOVER));
    fix.controller.on_key_down(&mut fix.tree, KeyCode::Escape);

    assert!(fix.controller.is_settling());
    fix.settle();

    assert!(fix.reports.borrow().is_empty());
    assert!(fix.tree.rect(a).origin.same_as(home));
    assert!(!fix.tree.has_flag(fix.zones[0], ViewFlags::DROP_HOVER));
}

#[test]
fn escape_during_pending_discards_the_press() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];
    let before = fix.tree.node_count();

    fix.down(a, Point::new(50.0, 10.0));
    fix.controller.on_key_down(&mut fix.tree, KeyCode::Escape);

    assert!(fix.controller.is_idle());
    assert_eq!(fix.tree.node_count(), before);
    assert_eq!(fix.tree.cursor(), Cursor::Grab);
}

#[test]
fn other_keys_are_ignored() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    fix.controller.on_key_down(&mut fix.tree, KeyCode::Enter);
    fix.up(Point::new(50.0, 45.0));

    assert_eq!(fix.reports.borrow().len(), 1);
}

#[test]
fn duplicate_release_does_not_double_report() {
    let mut fix = fixture(true, &[3], true);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    fix.up(Point::new(50.0, 45.0));
    // A stray second release while the settle is in flight.
    fix.up(Point::new(50.0, 45.0));
    fix.settle();
    // And another one after the session is gone.
    fix.up(Point::new(50.0, 45.0));

    assert_eq!(fix.reports.borrow().len(), 1);
    assert_eq!(fix.placeholder_count(), 0);
}

#[test]
fn callback_fires_only_after_the_settle_completes() {
    let mut fix = fixture(true, &[3], true);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    fix.up(Point::new(50.0, 45.0));

    assert!(fix.reports.borrow().is_empty());
    fix.settle();
    assert_eq!(*fix.reports.borrow(), vec![(a, 0, 1, "ctx")]);
    // All inline overrides are gone once the session is cleared.
    assert_eq!(fix.tree.floating(a), None);
    assert_eq!(fix.tree.tilt(a), 0.0);
    assert!(!fix.tree.z_raised(a));
}

#[test]
fn zone_hysteresis_skips_full_rescans() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 30.0));
    let after_entry = fix.controller.stats().zone_rescans;

    // Wandering within the zone must not trigger another scan.
    fix.moves(Point::new(55.0, 45.0));
    fix.moves(Point::new(60.0, 50.0));
    fix.moves(Point::new(40.0, 35.0));
    assert_eq!(fix.controller.stats().zone_rescans, after_entry);

    // Leaving the zone does.
    fix.moves(Point::new(250.0, 35.0));
    assert!(fix.controller.stats().zone_rescans > after_entry);
}

#[test]
fn placement_hysteresis_skips_sibling_walks() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];

    // With a center grip the probe point equals the pointer position, and
    // this move parks the placeholder in the flow slot spanning y 20..40.
    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    let walks = fix.controller.stats().placement_walks;

    // Jitter that keeps the probe inside the placeholder's rect.
    fix.moves(Point::new(50.0, 30.0));
    fix.moves(Point::new(55.0, 25.0));
    fix.moves(Point::new(45.0, 35.0));
    assert_eq!(fix.controller.stats().placement_walks, walks);
}

#[test]
fn hover_marks_only_the_current_zone() {
    let mut fix = fixture(true, &[2, 1], false);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 30.0));
    assert!(fix.tree.has_flag(fix.zones[0], ViewFlags::DROP_HOVER));
    assert!(!fix.tree.has_flag(fix.zones[1], ViewFlags::DROP_HOVER));

    fix.moves(Point::new(150.0, 10.0));
    assert!(!fix.tree.has_flag(fix.zones[0], ViewFlags::DROP_HOVER));
    assert!(fix.tree.has_flag(fix.zones[1], ViewFlags::DROP_HOVER));
    fix.up(Point::new(150.0, 10.0));
}

#[test]
fn tilt_follows_the_grip_offset() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];

    // Grip a quarter in from the top-left corner.
    fix.down(a, Point::new(25.0, 5.0));
    fix.moves(Point::new(25.0, 40.0));
    // x_tilt = 0.5, y_tilt = 0.5, so a quarter of the full 4 degrees.
    assert!((fix.tree.tilt(a) - 1.0).abs() < 1e-9);
    assert!(fix.tree.has_flag(a, ViewFlags::BEING_DRAGGED));
    assert!(fix.tree.z_raised(a));
    fix.up(Point::new(25.0, 40.0));
}

#[test]
fn center_grip_has_no_tilt() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 40.0));
    assert_eq!(fix.tree.tilt(a), 0.0);
    fix.up(Point::new(50.0, 40.0));
}

#[test]
fn press_outside_every_zone_is_a_usage_error() {
    let mut fix = fixture(true, &[3], false);
    let stray = fix.tree.new_element(Size::new(10.0, 10.0));
    let root = fix.tree.root();
    fix.tree.append_child(root, stray);

    let err = fix.controller.on_pointer_down(&mut fix.tree, stray, Point::new(0.0, 0.0));
    assert_eq!(err, Err(DragError::OutsideDropZones));
    assert!(fix.controller.is_idle());
}

#[test]
fn press_resolves_the_item_from_a_nested_hit() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];
    let label = fix.tree.new_element(Size::new(10.0, 10.0));
    fix.tree.append_child(a, label);

    fix.down(label, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    fix.up(Point::new(50.0, 45.0));

    assert_eq!(*fix.reports.borrow(), vec![(a, 0, 1, "ctx")]);
}

#[test]
fn text_nodes_are_skipped_when_counting_siblings() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];
    let b = fix.items[0][1];
    let text = fix.tree.new_text();
    fix.tree.insert_before(text, b);

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    fix.up(Point::new(50.0, 45.0));

    assert_eq!(*fix.reports.borrow(), vec![(a, 0, 1, "ctx")]);
}

#[test_log::test]
fn press_during_settle_is_deferred_until_it_finishes() {
    let mut fix = fixture(true, &[3], true);
    let a = fix.items[0][0];
    let b = fix.items[0][1];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    fix.up(Point::new(50.0, 45.0));
    assert!(fix.controller.is_settling());

    // The next press arrives while the settle is still in flight.
    fix.down(b, Point::new(50.0, 30.0));
    assert!(fix.controller.is_settling());

    fix.settle();
    // The deferred press opened the next session.
    assert!(!fix.controller.is_idle());
    assert!(!fix.controller.is_settling());
    assert_eq!(fix.reports.borrow().len(), 1);
}

#[test]
fn dynamic_zone_source_is_resolved_per_press() {
    let mut tree = ViewTree::new();
    let root = tree.root();
    tree.set_axis(root, Axis::Horizontal);
    let zone = tree.new_element(Size::ZERO);
    tree.append_child(root, zone);
    let item = tree.new_element(Size::new(100.0, 20.0));
    tree.append_child(zone, item);

    let resolutions = Rc::new(RefCell::new(0));
    let counter = resolutions.clone();
    let reports: Reports = Rc::default();
    let sink = reports.clone();
    let mut controller = DragController::attach(
        &mut tree,
        root,
        DragOptions {
            context: "ctx",
            zones: ZoneSource::Dynamic(Box::new(move || {
                *counter.borrow_mut() += 1;
                vec![zone]
            })),
            vertical: true,
            on_drop: Box::new(move |ev, zone_idx, item_idx, ctx| {
                sink.borrow_mut().push((ev.target, zone_idx, item_idx, *ctx));
            }),
        },
        Settings { animate: false, ..Settings::default() },
        Rc::new(ManualClock::new()),
    );

    controller.on_pointer_down(&mut tree, item, Point::new(50.0, 10.0)).unwrap();
    controller.on_pointer_up(&mut tree, Point::new(50.0, 10.0));
    controller.on_pointer_down(&mut tree, item, Point::new(50.0, 10.0)).unwrap();
    controller.on_pointer_up(&mut tree, Point::new(50.0, 10.0));

    assert_eq!(*resolutions.borrow(), 2);
}

#[test]
fn empty_zone_list_is_rejected() {
    let mut tree = ViewTree::new();
    let root = tree.root();
    let item = tree.new_element(Size::new(100.0, 20.0));
    tree.append_child(root, item);

    let mut controller: DragController<()> = DragController::attach(
        &mut tree,
        root,
        DragOptions {
            context: (),
            zones: ZoneSource::Fixed(Vec::new()),
            vertical: true,
            on_drop: Box::new(|_, _, _, _| {}),
        },
        Settings::default(),
        Rc::new(ManualClock::new()),
    );

    let err = controller.on_pointer_down(&mut tree, item, Point::ZERO);
    assert_eq!(err, Err(DragError::NoDropZones));
}

#[test]
fn floating_item_tracks_pointer_through_scroll() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];
    fix.tree.set_scroll(Point::new(0.0, 100.0));

    // A's viewport origin is now (0, -100); grip it at its center.
    fix.down(a, Point::new(50.0, -90.0));
    fix.moves(Point::new(50.0, -50.0));

    // upper_left = (0, -60) in the viewport, so (0, 40) in the document.
    assert_eq!(fix.tree.floating(a), Some(Point::new(0.0, 40.0)));
    fix.up(Point::new(50.0, -50.0));
}

#[test]
fn dragging_to_the_end_appends() {
    let mut fix = fixture(true, &[3], false);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 59.0));
    fix.up(Point::new(50.0, 59.0));

    // Past every sibling's center: index equals the sibling count.
    assert_eq!(*fix.reports.borrow(), vec![(a, 0, 2, "ctx")]);
}

#[test]
fn committed_drop_settles_onto_the_placeholder() {
    let mut fix = fixture(true, &[3], true);
    let a = fix.items[0][0];

    fix.down(a, Point::new(50.0, 10.0));
    fix.moves(Point::new(50.0, 45.0));
    // The placeholder sits between B and C, at y = 20..40 of the flow.
    fix.up(Point::new(50.0, 45.0));
    fix.settle();

    assert_eq!(fix.reports.borrow().len(), 1);
    assert_eq!(fix.placeholder_count(), 0);
    assert_eq!(fix.tree.floating(a), None);
}
