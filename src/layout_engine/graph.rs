use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::sys::geometry::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Component of `v` along this axis.
    pub fn along(self, v: Vec2) -> f64 {
        match self {
            Orientation::Horizontal => v.x,
            Orientation::Vertical => v.y,
        }
    }

    /// Mutable reference to the component of `v` along this axis.
    pub fn along_mut(self, v: &mut Vec2) -> &mut f64 {
        match self {
            Orientation::Horizontal => &mut v.x,
            Orientation::Vertical => &mut v.y,
        }
    }

    /// Component of `v` across this axis.
    pub fn across(self, v: Vec2) -> f64 {
        match self {
            Orientation::Horizontal => v.y,
            Orientation::Vertical => v.x,
        }
    }

    /// Builds a vector from its components along and across this axis.
    pub fn compose(self, along: f64, across: f64) -> Vec2 {
        match self {
            Orientation::Horizontal => Vec2::new(along, across),
            Orientation::Vertical => Vec2::new(across, along),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    #[strum(to_string = "left", serialize = "l")]
    Left,
    #[strum(to_string = "right", serialize = "r")]
    Right,
    #[strum(to_string = "up", serialize = "u")]
    Up,
    #[strum(to_string = "down", serialize = "d")]
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Right and Down move towards the end of a child list.
    pub fn is_forward(self) -> bool { matches!(self, Direction::Right | Direction::Down) }

    /// Unit step along the direction, scaled by `amount`.
    pub fn offset(self, amount: f64) -> Vec2 {
        let signed = if self.is_forward() { amount } else { -amount };
        match self.orientation() {
            Orientation::Horizontal => Vec2::new(signed, 0.0),
            Orientation::Vertical => Vec2::new(0.0, signed),
        }
    }
}
