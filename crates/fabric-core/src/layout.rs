//! Layout metrics carried by shadow nodes and projected into shadow views.

use std::ops::Add;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Returns the same rect moved by `offset`.
    pub fn offset_by(self, offset: Point) -> Self {
        Self {
            origin: self.origin + offset,
            size: self.size,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayType {
    None,
    #[default]
    Flex,
    Contents,
}

/// Result of the (external) layout pass for a single node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutMetrics {
    pub frame: Rect,
    pub display: DisplayType,
    pub point_scale_factor: f32,
}

impl LayoutMetrics {
    pub const EMPTY: LayoutMetrics = LayoutMetrics {
        frame: Rect::new(0.0, 0.0, 0.0, 0.0),
        display: DisplayType::Flex,
        point_scale_factor: 1.0,
    };

    pub fn with_frame(frame: Rect) -> Self {
        Self {
            frame,
            ..Self::EMPTY
        }
    }
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self::EMPTY
    }
}
