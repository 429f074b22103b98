//! An in-memory retained view tree.
//!
//! This is the surface the drag engine mutates: element and text nodes with
//! parent pointers, a flow layout that stacks each element's children along
//! its axis, floating (absolutely positioned) overrides that take a node out
//! of flow, style flags, and viewport-coordinate rectangle queries offset by
//! a document scroll position.

use slotmap::SlotMap;

use crate::engine::geometry::{Axis, Point, Rect, Size};

slotmap::new_key_type! {
    pub struct ViewId;
}

bitflags::bitflags! {
    /// Style markers observable by the host; the engine toggles exactly
    /// these three during a drag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ViewFlags: u8 {
        const BEING_DRAGGED = 1 << 0;
        const DROP_HOVER = 1 << 1;
        const PLACEHOLDER = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Grab,
    Grabbing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Element,
    Text,
}

#[derive(Debug)]
struct ViewNode {
    kind: ViewKind,
    axis: Axis,
    size: Size,
    min_size: Size,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
    flags: ViewFlags,
    floating: Option<Point>,
    tilt_deg: f64,
    z_raised: bool,
    // computed by layout, in document coordinates
    pos: Point,
    layout_size: Size,
}

impl ViewNode {
    fn new(kind: ViewKind, size: Size) -> ViewNode {
        ViewNode {
            kind,
            axis: Axis::Vertical,
            size,
            min_size: Size::ZERO,
            parent: None,
            children: Vec::new(),
            flags: ViewFlags::empty(),
            floating: None,
            tilt_deg: 0.0,
            z_raised: false,
            pos: Point::ZERO,
            layout_size: Size::ZERO,
        }
    }
}

pub struct ViewTree {
    nodes: SlotMap<ViewId, ViewNode>,
    root: ViewId,
    scroll: Point,
    cursor: Cursor,
    dirty: bool,
}

impl ViewTree {
    pub fn new() -> ViewTree {
        let mut nodes = SlotMap::default();
        let root = nodes.insert(ViewNode::new(ViewKind::Element, Size::ZERO));
        ViewTree { nodes, root, scroll: Point::ZERO, cursor: Cursor::Default, dirty: true }
    }

    pub fn root(&self) -> ViewId { self.root }

    pub fn contains(&self, id: ViewId) -> bool { self.nodes.contains_key(id) }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn new_element(&mut self, size: Size) -> ViewId {
        self.dirty = true;
        self.nodes.insert(ViewNode::new(ViewKind::Element, size))
    }

    pub fn new_text(&mut self) -> ViewId {
        self.dirty = true;
        self.nodes.insert(ViewNode::new(ViewKind::Text, Size::ZERO))
    }

    pub fn kind(&self, id: ViewId) -> ViewKind { self.nodes[id].kind }

    pub fn is_text(&self, id: ViewId) -> bool { self.nodes[id].kind == ViewKind::Text }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> { self.nodes[id].parent }

    pub fn children(&self, id: ViewId) -> &[ViewId] { &self.nodes[id].children }

    pub fn set_axis(&mut self, id: ViewId, axis: Axis) {
        self.nodes[id].axis = axis;
        self.dirty = true;
    }

    pub fn set_size(&mut self, id: ViewId, size: Size) {
        self.nodes[id].size = size;
        self.dirty = true;
    }

    pub fn set_min_size(&mut self, id: ViewId, min_size: Size) {
        self.nodes[id].min_size = min_size;
        self.dirty = true;
    }

    /// Move `child` to the end of `parent`'s child list, detaching it from
    /// any current parent first.
    pub fn append_child(&mut self, parent: ViewId, child: ViewId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.dirty = true;
    }

    /// Move `new` so it immediately precedes `reference` under the same
    /// parent, detaching `new` from any current parent first.
    pub fn insert_before(&mut self, new: ViewId, reference: ViewId) {
        debug_assert_ne!(new, reference);
        let parent = self.nodes[reference]
            .parent
            .expect("insert_before reference has no parent");
        self.detach(new);
        let idx = self.nodes[parent]
            .children
            .iter()
            .position(|c| *c == reference)
            .expect("reference not among its parent's children");
        self.nodes[new].parent = Some(parent);
        self.nodes[parent].children.insert(idx, new);
        self.dirty = true;
    }

    /// Remove the node from its parent's child list, keeping it alive.
    pub fn detach(&mut self, id: ViewId) {
        let Some(parent) = self.nodes[id].parent.take() else { return };
        let children = &mut self.nodes[parent].children;
        if let Some(idx) = children.iter().position(|c| *c == id) {
            children.remove(idx);
        }
        self.dirty = true;
    }

    /// Detach and destroy the node and its whole subtree. A no-op for ids
    /// already removed.
    pub fn remove(&mut self, id: ViewId) {
        if !self.nodes.contains_key(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
            }
        }
        self.dirty = true;
    }

    pub fn has_flag(&self, id: ViewId, flag: ViewFlags) -> bool {
        self.nodes[id].flags.contains(flag)
    }

    pub fn add_flag(&mut self, id: ViewId, flag: ViewFlags) {
        self.nodes[id].flags.insert(flag);
    }

    pub fn remove_flag(&mut self, id: ViewId, flag: ViewFlags) {
        self.nodes[id].flags.remove(flag);
    }

    pub fn floating(&self, id: ViewId) -> Option<Point> { self.nodes[id].floating }

    /// `Some(pos)` positions the node absolutely at `pos` (document
    /// coordinates) and takes it out of flow; `None` returns it to flow.
    pub fn set_floating(&mut self, id: ViewId, pos: Option<Point>) {
        self.nodes[id].floating = pos;
        self.dirty = true;
    }

    pub fn tilt(&self, id: ViewId) -> f64 { self.nodes[id].tilt_deg }

    pub fn set_tilt(&mut self, id: ViewId, degrees: f64) {
        self.nodes[id].tilt_deg = degrees;
    }

    pub fn z_raised(&self, id: ViewId) -> bool { self.nodes[id].z_raised }

    pub fn set_z_raised(&mut self, id: ViewId, raised: bool) {
        self.nodes[id].z_raised = raised;
    }

    /// Clear every inline override so the node returns to flow layout.
    pub fn clear_inline(&mut self, id: ViewId) {
        let node = &mut self.nodes[id];
        node.floating = None;
        node.tilt_deg = 0.0;
        node.z_raised = false;
        self.dirty = true;
    }

    pub fn scroll(&self) -> Point { self.scroll }

    pub fn set_scroll(&mut self, scroll: Point) { self.scroll = scroll; }

    pub fn cursor(&self) -> Cursor { self.cursor }

    pub fn set_cursor(&mut self, cursor: Cursor) { self.cursor = cursor; }

    /// Bounding rectangle in viewport coordinates (document position minus
    /// the scroll offset), freshly laid out.
    pub fn rect(&mut self, id: ViewId) -> Rect {
        self.layout();
        let node = &self.nodes[id];
        Rect::new(
            Point::new(node.pos.x - self.scroll.x, node.pos.y - self.scroll.y),
            node.layout_size,
        )
    }

    /// Position in document coordinates.
    pub fn doc_pos(&mut self, id: ViewId) -> Point {
        self.layout();
        self.nodes[id].pos
    }

    fn layout(&mut self) {
        if !self.dirty {
            return;
        }
        self.measure(self.root);
        self.place(self.root, Point::ZERO);
        self.dirty = false;
    }

    fn measure(&mut self, id: ViewId) -> Size {
        if self.nodes[id].kind == ViewKind::Text {
            self.nodes[id].layout_size = Size::ZERO;
            return Size::ZERO;
        }

        let children = self.nodes[id].children.clone();
        let axis = self.nodes[id].axis;
        let mut along = 0.0;
        let mut cross: f64 = 0.0;
        for child in children {
            let child_size = self.measure(child);
            let node = &self.nodes[child];
            if node.floating.is_some() || node.kind == ViewKind::Text {
                continue;
            }
            along += axis.extent(child_size);
            cross = cross.max(axis.cross().extent(child_size));
        }

        let content = match axis {
            Axis::Vertical => Size::new(cross, along),
            Axis::Horizontal => Size::new(along, cross),
        };
        let node = &mut self.nodes[id];
        let layout = Size::new(
            node.size.width.max(node.min_size.width).max(content.width),
            node.size.height.max(node.min_size.height).max(content.height),
        );
        node.layout_size = layout;
        layout
    }

    fn place(&mut self, id: ViewId, origin: Point) {
        let pos = self.nodes[id].floating.unwrap_or(origin);
        self.nodes[id].pos = pos;

        let axis = self.nodes[id].axis;
        let children = self.nodes[id].children.clone();
        let mut cursor = pos;
        for child in children {
            if let Some(float_pos) = self.nodes[child].floating {
                self.place(child, float_pos);
                continue;
            }
            self.place(child, cursor);
            let extent = axis.extent(self.nodes[child].layout_size);
            match axis {
                Axis::Vertical => cursor.y += extent,
                Axis::Horizontal => cursor.x += extent,
            }
        }
    }
}

impl Default for ViewTree {
    fn default() -> Self { Self::new() }
}
