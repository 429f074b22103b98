//! Geometry primitives shared by the drag engine and the view tree.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Point { Point { x, y } }

    pub fn offset(self, dx: f64, dy: f64) -> Point { Point { x: self.x + dx, y: self.y + dy } }

    pub fn distance(self, other: Point) -> f64 {
        f64::hypot(other.x - self.x, other.y - self.y)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size { width: 0.0, height: 0.0 };

    pub fn new(width: f64, height: f64) -> Size { Size { width, height } }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Rect { Rect { origin, size } }

    pub fn min(&self) -> Point { self.origin }

    pub fn max(&self) -> Point {
        Point::new(self.origin.x + self.size.width, self.origin.y + self.size.height)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width * 0.5,
            self.origin.y + self.size.height * 0.5,
        )
    }

    /// Square rect extending `half` in every direction from `center`.
    pub fn around(center: Point, half: f64) -> Rect {
        Rect {
            origin: Point::new(center.x - half, center.y - half),
            size: Size::new(half * 2.0, half * 2.0),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.min().x..=self.max().x).contains(&point.x)
            && (self.min().y..=self.max().y).contains(&point.y)
    }
}

/// The axis along which a coordinate is read or a list flows.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn cross(self) -> Axis {
        match self {
            Axis::Vertical => Axis::Horizontal,
            Axis::Horizontal => Axis::Vertical,
        }
    }

    pub fn coord(self, point: Point) -> f64 {
        match self {
            Axis::Vertical => point.y,
            Axis::Horizontal => point.x,
        }
    }

    pub fn near(self, rect: Rect) -> f64 {
        match self {
            Axis::Vertical => rect.origin.y,
            Axis::Horizontal => rect.origin.x,
        }
    }

    pub fn far(self, rect: Rect) -> f64 { self.near(rect) + self.extent(rect.size) }

    pub fn mid(self, rect: Rect) -> f64 { self.near(rect) + self.extent(rect.size) * 0.5 }

    pub fn extent(self, size: Size) -> f64 {
        match self {
            Axis::Vertical => size.height,
            Axis::Horizontal => size.width,
        }
    }
}

/// Is the point's coordinate along `axis` strictly between the rect's near
/// and far edges? Zone hover tests pass the cross axis of the list.
pub fn point_in_bounds(point: Point, rect: Rect, axis: Axis) -> bool {
    let c = axis.coord(point);
    axis.near(rect) < c && c < axis.far(rect)
}

/// Is the point past the rect's center along `axis`?
pub fn point_after(point: Point, rect: Rect, axis: Axis) -> bool {
    axis.mid(rect) < axis.coord(point)
}

pub trait IsWithin {
    fn is_within(&self, how_much: f64, other: Self) -> bool;
}

impl IsWithin for f64 {
    fn is_within(&self, how_much: f64, other: Self) -> bool { (self - other).abs() < how_much }
}

impl IsWithin for Point {
    fn is_within(&self, how_much: f64, other: Self) -> bool {
        self.x.is_within(how_much, other.x) && self.y.is_within(how_much, other.y)
    }
}

impl IsWithin for Size {
    fn is_within(&self, how_much: f64, other: Self) -> bool {
        self.width.is_within(how_much, other.width) && self.height.is_within(how_much, other.height)
    }
}

impl IsWithin for Rect {
    fn is_within(&self, how_much: f64, other: Self) -> bool {
        self.origin.is_within(how_much, other.origin) && self.size.is_within(how_much, other.size)
    }
}

pub trait SameAs: IsWithin + Sized {
    fn same_as(&self, other: Self) -> bool { self.is_within(0.1, other) }
}

impl SameAs for Point {}
impl SameAs for Size {}
impl SameAs for Rect {}
