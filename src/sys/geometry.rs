//! Plain 2D geometry used by the layout code.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self { Vec2 { x, y } }

    pub fn max(self, other: Vec2) -> Vec2 { Vec2::new(self.x.max(other.x), self.y.max(other.y)) }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x + rhs.x, self.y + rhs.y) }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x - rhs.x, self.y - rhs.y) }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 { Vec2::new(-self.x, -self.y) }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 { Vec2::new(self.x * rhs, self.y * rhs) }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 { Vec2::new(self.x / rhs, self.y / rhs) }
}

/// Axis-aligned rectangle in layout coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(origin: Vec2, size: Vec2) -> Self { Rect { origin, size } }

    pub const fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    pub fn min(&self) -> Vec2 { self.origin }

    pub fn max(&self) -> Vec2 { self.origin + self.size }

    pub fn middle(&self) -> Vec2 { self.origin + self.size / 2.0 }

    /// Shrinks the rectangle by `top_left` on the leading edges and
    /// `bottom_right` on the trailing edges.
    pub fn inset(&self, top_left: Vec2, bottom_right: Vec2) -> Rect {
        Rect::new(self.origin + top_left, self.size - top_left - bottom_right)
    }
}

pub trait Round {
    fn round(&self) -> Self;
}

impl Round for Vec2 {
    fn round(&self) -> Self { Vec2::new(self.x.round(), self.y.round()) }
}

impl Round for Rect {
    fn round(&self) -> Self {
        let min = self.min().round();
        let max = self.max().round();
        Rect::new(min, max - min)
    }
}

pub trait IsWithin {
    fn is_within(&self, how_much: f64, other: Self) -> bool;
}

impl IsWithin for f64 {
    fn is_within(&self, how_much: f64, other: Self) -> bool { (self - other).abs() < how_much }
}

impl IsWithin for Vec2 {
    fn is_within(&self, how_much: f64, other: Self) -> bool {
        self.x.is_within(how_much, other.x) && self.y.is_within(how_much, other.y)
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

impl SameAs for Rect {}
impl SameAs for Vec2 {}

/// Two edges "stick" when they are less than two pixels apart.
pub fn sticks(a: f64, b: f64) -> bool { a.is_within(2.0, b) }

pub trait RectExt {
    fn contains(&self, point: Vec2) -> bool;
    fn contains_rect(&self, other: Self) -> bool;
    fn intersection(&self, other: &Self) -> Self;
}

impl RectExt for Rect {
    fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.x < max.x && point.y >= self.origin.y && point.y < max.y
    }

    fn contains_rect(&self, other: Self) -> bool {
        let (min, max) = (self.min(), self.max());
        let (other_min, other_max) = (other.min(), other.max());
        min.x <= other_min.x && min.y <= other_min.y && max.x >= other_max.x && max.y >= other_max.y
    }

    fn intersection(&self, other: &Self) -> Self {
        let min = self.min().max(other.min());
        let max_x = self.max().x.min(other.max().x);
        let max_y = self.max().y.min(other.max().y);
        Rect::new(min, Vec2::new((max_x - min.x).max(0.0), (max_y - min.y).max(0.0)))
    }
}
