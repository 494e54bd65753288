//! Logical-unit geometry and coordinate space conversion.
//!
//! Two coordinate spaces are in play:
//! - **UI space**: origin at the bottom-left corner of the primary display,
//!   y grows upward. Status item frames, display frames, pointer locations
//!   reported by AppKit and overlay frames all use this space.
//! - **Screen space**: origin at the top-left corner of the primary display,
//!   y grows downward. Window-list snapshots and synthetic pointer events use
//!   this space.
//!
//! Both spaces share the same x axis; converting between them only flips y
//! around the primary display's height.

use serde::{Deserialize, Serialize};

/// A point in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A size in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in logical units.
///
/// `origin` is the corner with the smallest x and y in whichever space the
/// rectangle lives in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn mid_x(&self) -> f64 {
        self.origin.x + self.size.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.origin.y + self.size.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.mid_x(), self.mid_y())
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    /// True when either dimension is zero, negative or not a number.
    pub fn is_empty(&self) -> bool {
        !(self.size.width > 0.0 && self.size.height > 0.0)
    }

    /// Whether `point` lies inside the rectangle (min edges inclusive, max edges exclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x < self.max_x()
            && point.y >= self.min_y()
            && point.y < self.max_y()
    }

    /// Grow (negative `dx`/`dy`) or shrink (positive) the rectangle on every side.
    pub fn inset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(
            self.origin.x + dx,
            self.origin.y + dy,
            self.size.width - 2.0 * dx,
            self.size.height - 2.0 * dy,
        )
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x() < other.max_x()
            && other.min_x() < self.max_x()
            && self.min_y() < other.max_y()
            && other.min_y() < self.max_y()
    }

    /// The overlapping area of two rectangles, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.min_x().max(other.min_x());
        let y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        Some(Rect::new(x, y, max_x - x, max_y - y))
    }
}

/// Converts between UI space and screen space for a given primary display height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSpace {
    primary_height: f64,
}

impl CoordinateSpace {
    pub fn new(primary_height: f64) -> Self {
        Self { primary_height }
    }

    pub fn primary_height(&self) -> f64 {
        self.primary_height
    }

    /// UI space point to screen space point.
    pub fn to_screen_point(&self, point: Point) -> Point {
        Point::new(point.x, self.primary_height - point.y)
    }

    /// Screen space point to UI space point.
    pub fn to_ui_point(&self, point: Point) -> Point {
        Point::new(point.x, self.primary_height - point.y)
    }

    /// UI space rect to screen space rect. The origin moves to the other
    /// horizontal edge, so the height takes part in the flip.
    pub fn to_screen_rect(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.min_x(),
            self.primary_height - rect.max_y(),
            rect.width(),
            rect.height(),
        )
    }

    /// Screen space rect to UI space rect.
    pub fn to_ui_rect(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.min_x(),
            self.primary_height - rect.max_y(),
            rect.width(),
            rect.height(),
        )
    }
}
