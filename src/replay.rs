//! Recording and deterministic replay of drag interaction traces.
//!
//! A trace is a RON scene description followed by one RON event per line.
//! Replay rebuilds the scene as a view tree, feeds the events through a
//! [`DragController`] on a manual clock, drives settle animations through
//! the frame scheduler, and applies each committed drop to the scene so
//! later events observe the new order.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::collections::HashMap;
use crate::common::config::Settings;
use crate::engine::controller::{DragController, DragOptions, KeyCode, ZoneSource};
use crate::engine::geometry::{Axis, Point, Size};
use crate::engine::scheduler::{frame_interval, FrameScheduler, ManualClock};
use crate::view::{ViewId, ViewTree};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Scene {
    pub vertical: bool,
    #[serde(default)]
    pub scroll: Point,
    pub zones: Vec<SceneZone>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SceneZone {
    pub items: Vec<Size>,
    /// Interleave a text node after every item, as markup-generated view
    /// trees tend to.
    #[serde(default)]
    pub text_gaps: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// Press item `item` of zone `zone`, gripping `grab` from its top-left.
    Down { zone: usize, item: usize, grab: Point },
    Move { pos: Point },
    Up { pos: Point },
    Escape,
    /// Let `ms` of virtual time elapse, one animation frame at a time.
    Advance { ms: u64 },
}

/// One committed drop. `item` is the dragged item's label from scene
/// construction (`"zone:index"`), stable across moves.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DropReport {
    pub item: String,
    pub zone: usize,
    pub idx: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub reports: Vec<DropReport>,
    /// Item labels per zone after every drop was applied.
    pub final_order: Vec<Vec<String>>,
}

/// Writes a trace file: the scene line, then one event per line.
pub struct Record {
    file: Option<File>,
}

impl Record {
    pub fn create(path: &Path, scene: &Scene) -> anyhow::Result<Record> {
        let mut file = File::create(path)?;
        writeln!(file, "{}", ron::ser::to_string(scene)?)?;
        Ok(Record { file: Some(file) })
    }

    pub fn disabled() -> Record { Record { file: None } }

    pub fn on_event(&mut self, event: &TraceEvent) -> anyhow::Result<()> {
        if let Some(file) = &mut self.file {
            writeln!(file, "{}", ron::ser::to_string(event)?)?;
        }
        Ok(())
    }
}

pub fn load(path: &Path) -> anyhow::Result<(Scene, Vec<TraceEvent>)> {
    let file = BufReader::new(File::open(path)?);
    let mut lines = file.lines();
    let scene_line = lines.next().context("empty trace file")??;
    let scene = ron::de::from_str(&scene_line)?;
    let mut events = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(ron::de::from_str(&line)?);
    }
    Ok((scene, events))
}

struct SceneView {
    tree: ViewTree,
    zones: Vec<ViewId>,
    labels: HashMap<ViewId, String>,
}

fn build_scene(scene: &Scene) -> SceneView {
    let mut tree = ViewTree::new();
    let root = tree.root();
    // Zones sit side by side along the cross axis of their lists.
    tree.set_axis(root, if scene.vertical { Axis::Horizontal } else { Axis::Vertical });
    tree.set_scroll(scene.scroll);

    let mut zones = Vec::new();
    let mut labels = HashMap::default();
    for (zone_idx, zone_desc) in scene.zones.iter().enumerate() {
        let zone = tree.new_element(Size::ZERO);
        if !scene.vertical {
            tree.set_axis(zone, Axis::Horizontal);
        }
        tree.append_child(root, zone);
        for (item_idx, &size) in zone_desc.items.iter().enumerate() {
            let item = tree.new_element(size);
            tree.append_child(zone, item);
            labels.insert(item, format!("{zone_idx}:{item_idx}"));
            if zone_desc.text_gaps {
                let text = tree.new_text();
                tree.append_child(zone, text);
            }
        }
        zones.push(zone);
    }
    SceneView { tree, zones, labels }
}

/// Item elements of a zone in document order, skipping text nodes.
fn zone_items(tree: &ViewTree, zone: ViewId) -> Vec<ViewId> {
    tree.children(zone).iter().copied().filter(|c| !tree.is_text(*c)).collect()
}

/// Physically relocate a dropped item, the way the host application would in
/// its drop callback.
fn apply_drop(tree: &mut ViewTree, zones: &[ViewId], target: ViewId, zone_idx: usize, idx: usize) {
    let zone = zones[zone_idx];
    tree.detach(target);
    let siblings = zone_items(tree, zone);
    match siblings.get(idx) {
        Some(&sibling) => tree.insert_before(target, sibling),
        None => tree.append_child(zone, target),
    }
}

pub fn run(
    scene: &Scene,
    events: &[TraceEvent],
    settings: &Settings,
) -> anyhow::Result<ReplayOutcome> {
    let SceneView { tree, zones, labels } = build_scene(scene);
    if zones.is_empty() {
        bail!("scene has no drop zones");
    }
    let root = tree.root();

    let clock = Rc::new(ManualClock::new());
    let mut scheduler = FrameScheduler::new(clock.clone());
    let interval = frame_interval(settings.animation_fps);

    let tree = Rc::new(RefCell::new(tree));
    let drops: Rc<RefCell<Vec<(ViewId, usize, usize)>>> = Rc::default();
    let sink = drops.clone();

    let controller = DragController::attach(
        &mut tree.borrow_mut(),
        root,
        DragOptions {
            context: (),
            zones: ZoneSource::Fixed(zones.clone()),
            vertical: scene.vertical,
            on_drop: Box::new(move |ev, zone_idx, item_idx, _| {
                sink.borrow_mut().push((ev.target, zone_idx, item_idx));
            }),
        },
        settings.clone(),
        clock.clone(),
    );
    let controller = Rc::new(RefCell::new(controller));

    let mut reports = Vec::new();
    for event in events {
        match event {
            TraceEvent::Down { zone, item, grab } => {
                let zone_id = *zones.get(*zone).context("zone index out of range")?;
                let items = zone_items(&tree.borrow(), zone_id);
                let Some(&target) = items.get(*item) else {
                    bail!("zone {zone} has no item {item}");
                };
                let origin = tree.borrow_mut().rect(target).origin;
                let pos = origin.offset(grab.x, grab.y);
                controller.borrow_mut().on_pointer_down(&mut tree.borrow_mut(), target, pos)?;
            }
            TraceEvent::Move { pos } => {
                controller.borrow_mut().on_pointer_move(&mut tree.borrow_mut(), *pos);
            }
            TraceEvent::Up { pos } => {
                controller.borrow_mut().on_pointer_up(&mut tree.borrow_mut(), *pos);
                pump_settle(&mut scheduler, &controller, &tree);
            }
            TraceEvent::Escape => {
                controller.borrow_mut().on_key_down(&mut tree.borrow_mut(), KeyCode::Escape);
                pump_settle(&mut scheduler, &controller, &tree);
            }
            TraceEvent::Advance { ms } => {
                let mut remaining = Duration::from_millis(*ms);
                while remaining > Duration::ZERO {
                    let step = interval.min(remaining);
                    clock.advance(step);
                    scheduler.run_frame();
                    remaining -= step;
                }
            }
        }

        for (target, zone_idx, item_idx) in drops.borrow_mut().drain(..) {
            debug!(item = %labels[&target], zone_idx, item_idx, "applying drop");
            apply_drop(&mut tree.borrow_mut(), &zones, target, zone_idx, item_idx);
            reports.push(DropReport {
                item: labels[&target].clone(),
                zone: zone_idx,
                idx: item_idx,
            });
        }
    }

    let tree = tree.borrow();
    let final_order = zones
        .iter()
        .map(|&zone| {
            zone_items(&tree, zone).iter().map(|item| labels[item].clone()).collect()
        })
        .collect();
    Ok(ReplayOutcome { reports, final_order })
}

fn pump_settle(
    scheduler: &mut FrameScheduler,
    controller: &Rc<RefCell<DragController<()>>>,
    tree: &Rc<RefCell<ViewTree>>,
) {
    if controller.borrow().is_settling() && scheduler.is_idle() {
        let controller = controller.clone();
        let tree = tree.clone();
        scheduler.add(move |now| controller.borrow_mut().on_frame(&mut tree.borrow_mut(), now));
    }
}
