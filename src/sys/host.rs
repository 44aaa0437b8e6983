//! The compositor-facing side of the layout engine.
//!
//! Everything the engine needs to know about windows, monitors and
//! workspaces comes in through [`Host`] as plain snapshots. Every change the
//! engine wants made goes back out through the same trait.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::geometry::{Rect, Vec2};
use crate::layout_engine::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:x}", self.0) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonitorId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub i64);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

bitflags! {
    /// Which kinds of windows a focus move may land on.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Layer: u8 {
        const TILED = 1 << 0;
        const FLOATING = 1 << 1;
    }
}

impl Layer {
    pub fn of(window: &WindowInfo) -> Layer {
        if window.floating { Layer::FLOATING } else { Layer::TILED }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FullscreenMode {
    #[default]
    Full,
    Maximized,
}

/// Corner of a window that a resize is anchored at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    #[default]
    None,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub workspace: WorkspaceId,
    pub monitor: MonitorId,
    pub pid: i32,
    pub title: String,
    /// Current on-screen rectangle.
    pub frame: Rect,
    /// Space the compositor reserves around the window (for example a title bar).
    pub reserved_top_left: Vec2,
    pub reserved_bottom_right: Vec2,
    pub mapped: bool,
    pub hidden: bool,
    pub floating: bool,
    pub fullscreen: bool,
    pub pinned: bool,
    pub urgent: bool,
    /// False for windows that refuse input focus.
    pub focusable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonitorInfo {
    pub id: MonitorId,
    pub frame: Rect,
    /// Space taken by bars and panels.
    pub reserved_top_left: Vec2,
    pub reserved_bottom_right: Vec2,
    pub active_workspace: Option<WorkspaceId>,
    pub active_special_workspace: Option<WorkspaceId>,
}

impl MonitorInfo {
    /// The part of the monitor windows may be laid out in.
    pub fn usable_area(&self) -> Rect {
        self.frame.inset(self.reserved_top_left, self.reserved_bottom_right)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkspaceInfo {
    pub id: WorkspaceId,
    pub name: String,
    pub monitor: MonitorId,
    pub special: bool,
    pub fullscreen_window: Option<WindowId>,
    pub fullscreen_mode: FullscreenMode,
    pub last_focused_window: Option<WindowId>,
}

impl WorkspaceInfo {
    pub fn has_fullscreen(&self) -> bool { self.fullscreen_window.is_some() }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decorations {
    pub border: bool,
    pub rounding: bool,
    pub shadow: bool,
}

impl Default for Decorations {
    fn default() -> Self {
        Decorations {
            border: true,
            rounding: true,
            shadow: true,
        }
    }
}

/// Final placement computed for a tiled window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowPlacement {
    pub frame: Rect,
    pub decorations: Decorations,
    /// Skip the move animation.
    pub warp: bool,
}

pub trait Host {
    fn window(&self, window: WindowId) -> Option<WindowInfo>;
    /// All known windows, bottom of the stacking order first.
    fn windows(&self) -> Vec<WindowInfo>;
    fn monitor(&self, monitor: MonitorId) -> Option<MonitorInfo>;
    fn monitors(&self) -> Vec<MonitorInfo>;
    fn active_monitor(&self) -> Option<MonitorId>;
    fn monitor_at(&self, point: Vec2) -> Option<MonitorId>;
    fn monitor_in_direction(&self, from: MonitorId, direction: Direction) -> Option<MonitorId>;
    fn workspace(&self, workspace: WorkspaceId) -> Option<WorkspaceInfo>;
    /// Resolves a workspace selector to an id and a name. The workspace
    /// does not need to exist yet.
    fn resolve_workspace(&self, name: &str) -> Option<(WorkspaceId, String)>;
    fn focused_window(&self) -> Option<WindowId>;
    fn cursor_position(&self) -> Vec2;
    /// Topmost visible window under `point`.
    fn window_at(&self, point: Vec2, floating_only: bool) -> Option<WindowId>;
    fn parent_pid(&self, pid: i32) -> Option<i32>;

    fn focus_window(&mut self, window: Option<WindowId>);
    fn set_window_hidden(&mut self, window: WindowId, hidden: bool);
    fn apply_window_layout(&mut self, window: WindowId, placement: WindowPlacement);
    /// Moves and resizes a window outside of tiling (floating or fullscreen).
    fn set_window_frame(&mut self, window: WindowId, frame: Rect);
    /// Puts a window in or out of fullscreen. Leaving fullscreen restores
    /// the floating geometry the host saved when entering it.
    fn set_window_fullscreen(&mut self, window: WindowId, fullscreen: bool, mode: FullscreenMode);
    fn restore_window_decorations(&mut self, window: WindowId);
    fn refresh_decorations(&mut self, window: WindowId);
    fn raise_window(&mut self, window: WindowId);
    fn close_window(&mut self, window: WindowId);
    fn damage(&mut self, area: Rect);
    fn move_window_to_workspace(&mut self, window: WindowId, workspace: WorkspaceId);
    fn create_workspace(&mut self, id: WorkspaceId, name: &str, monitor: MonitorId) -> WorkspaceId;
    fn set_active_monitor(&mut self, monitor: MonitorId);
    fn change_monitor_workspace(&mut self, monitor: MonitorId, workspace: WorkspaceId);
    fn set_special_workspace(&mut self, monitor: MonitorId, workspace: Option<WorkspaceId>);
    fn remember_previous_workspace(&mut self, workspace: WorkspaceId, previous: WorkspaceId);
    /// Shows an error to the user.
    fn notify_error(&mut self, message: &str);
}
