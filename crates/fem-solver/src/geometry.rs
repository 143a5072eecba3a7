//! Planar geometry primitives: points and axis-aligned rectangles.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// A point (or vector) in the plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the position vector
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: Point2D) -> f64 {
        (*self - other).norm()
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, value: f64) -> Point2D {
        Point2D::new(self.x * value, self.y * value)
    }
}

impl Div<f64> for Point2D {
    type Output = Point2D;

    fn div(self, value: f64) -> Point2D {
        Point2D::new(self.x / value, self.y / value)
    }
}

/// A closed interval on the real line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub left: f64,
    pub right: f64,
}

impl Interval {
    pub const fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn length(&self) -> f64 {
        (self.right - self.left).abs()
    }
}

/// Axis-aligned rectangle defined by its left-bottom and right-top corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    left_bottom: Point2D,
    right_top: Point2D,
}

impl Rectangle {
    pub fn new(left_bottom: Point2D, right_top: Point2D) -> Self {
        Self {
            left_bottom,
            right_top,
        }
    }

    /// The reference square [0,1]x[0,1]
    pub fn unit() -> Self {
        Self::new(Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0))
    }

    pub fn left_bottom(&self) -> Point2D {
        self.left_bottom
    }

    pub fn right_top(&self) -> Point2D {
        self.right_top
    }

    pub fn left_top(&self) -> Point2D {
        Point2D::new(self.left_bottom.x, self.right_top.y)
    }

    pub fn right_bottom(&self) -> Point2D {
        Point2D::new(self.right_top.x, self.left_bottom.y)
    }

    pub fn width(&self) -> f64 {
        self.right_top.x - self.left_bottom.x
    }

    pub fn height(&self) -> f64 {
        self.right_top.y - self.left_bottom.y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}
