//! In-memory [`Host`] used by the layout tests.

use super::geometry::{Rect, RectExt, Vec2};
use super::host::{
    FullscreenMode, Host, MonitorId, MonitorInfo, WindowId, WindowInfo, WindowPlacement,
    WorkspaceId, WorkspaceInfo,
};
use crate::common::collections::{BTreeMap, HashMap};
use crate::layout_engine::Direction;

pub struct FakeHost {
    /// Bottom of the stacking order first.
    pub windows: Vec<WindowInfo>,
    pub monitors: Vec<MonitorInfo>,
    pub workspaces: BTreeMap<WorkspaceId, WorkspaceInfo>,
    pub focused: Option<WindowId>,
    pub active_monitor: Option<MonitorId>,
    pub cursor: Vec2,
    pub parent_pids: HashMap<i32, i32>,
    pub placements: HashMap<WindowId, WindowPlacement>,
    pub saved_frames: HashMap<WindowId, Rect>,
    pub notifications: Vec<String>,
    pub closed: Vec<WindowId>,
    pub raised: Vec<WindowId>,
    pub damaged: Vec<Rect>,
    pub previous_workspaces: Vec<(WorkspaceId, WorkspaceId)>,
}

impl Default for FakeHost {
    fn default() -> Self {
        let mut host = FakeHost::empty();
        host.add_monitor(MonitorId(0), Rect::from_xywh(0.0, 0.0, 1920.0, 1080.0));
        host.add_workspace(WorkspaceId(1), MonitorId(0));
        host
    }
}

impl FakeHost {
    pub fn empty() -> Self {
        FakeHost {
            windows: Vec::new(),
            monitors: Vec::new(),
            workspaces: BTreeMap::new(),
            focused: None,
            active_monitor: None,
            cursor: Vec2::ZERO,
            parent_pids: HashMap::default(),
            placements: HashMap::default(),
            saved_frames: HashMap::default(),
            notifications: Vec::new(),
            closed: Vec::new(),
            raised: Vec::new(),
            damaged: Vec::new(),
            previous_workspaces: Vec::new(),
        }
    }

    pub fn add_monitor(&mut self, id: MonitorId, frame: Rect) -> &mut MonitorInfo {
        if self.active_monitor.is_none() {
            self.active_monitor = Some(id);
        }
        self.monitors.push(MonitorInfo {
            id,
            frame,
            reserved_top_left: Vec2::ZERO,
            reserved_bottom_right: Vec2::ZERO,
            active_workspace: None,
            active_special_workspace: None,
        });
        self.monitors.last_mut().unwrap()
    }

    /// Adds a workspace, making it the monitor's active one if it has none.
    pub fn add_workspace(&mut self, id: WorkspaceId, monitor: MonitorId) -> &mut WorkspaceInfo {
        if let Some(m) = self.monitors.iter_mut().find(|m| m.id == monitor) {
            m.active_workspace.get_or_insert(id);
        }
        self.workspaces.entry(id).or_insert_with(|| WorkspaceInfo {
            id,
            name: id.to_string(),
            monitor,
            special: false,
            fullscreen_window: None,
            fullscreen_mode: FullscreenMode::Full,
            last_focused_window: None,
        })
    }

    /// Adds a mapped tiled window on top of the stacking order.
    pub fn add_window(&mut self, id: u64, workspace: WorkspaceId) -> &mut WindowInfo {
        let monitor = self.workspaces.get(&workspace).map(|w| w.monitor).unwrap_or(MonitorId(0));
        let frame = self
            .monitors
            .iter()
            .find(|m| m.id == monitor)
            .map(|m| m.usable_area())
            .unwrap_or_default();
        self.windows.push(WindowInfo {
            id: WindowId(id),
            workspace,
            monitor,
            pid: id as i32,
            title: format!("window {id}"),
            frame,
            reserved_top_left: Vec2::ZERO,
            reserved_bottom_right: Vec2::ZERO,
            mapped: true,
            hidden: false,
            floating: false,
            fullscreen: false,
            pinned: false,
            urgent: false,
            focusable: true,
        });
        self.windows.last_mut().unwrap()
    }

    pub fn window_mut(&mut self, id: WindowId) -> &mut WindowInfo {
        self.windows.iter_mut().find(|w| w.id == id).unwrap()
    }

    pub fn monitor_mut(&mut self, id: MonitorId) -> &mut MonitorInfo {
        self.monitors.iter_mut().find(|m| m.id == id).unwrap()
    }

    pub fn workspace_mut(&mut self, id: WorkspaceId) -> &mut WorkspaceInfo {
        self.workspaces.get_mut(&id).unwrap()
    }

    pub fn frame_of(&self, id: WindowId) -> Rect { self.placements[&id].frame }

    fn monitor_middle(&self, id: MonitorId) -> Option<Vec2> {
        self.monitors.iter().find(|m| m.id == id).map(|m| m.frame.middle())
    }
}

impl Host for FakeHost {
    fn window(&self, window: WindowId) -> Option<WindowInfo> {
        self.windows.iter().find(|w| w.id == window).cloned()
    }

    fn windows(&self) -> Vec<WindowInfo> { self.windows.clone() }

    fn monitor(&self, monitor: MonitorId) -> Option<MonitorInfo> {
        self.monitors.iter().find(|m| m.id == monitor).cloned()
    }

    fn monitors(&self) -> Vec<MonitorInfo> { self.monitors.clone() }

    fn active_monitor(&self) -> Option<MonitorId> { self.active_monitor }

    fn monitor_at(&self, point: Vec2) -> Option<MonitorId> {
        self.monitors.iter().find(|m| m.frame.contains(point)).map(|m| m.id)
    }

    fn monitor_in_direction(&self, from: MonitorId, direction: Direction) -> Option<MonitorId> {
        let origin = self.monitor_middle(from)?;
        self.monitors
            .iter()
            .filter(|m| m.id != from)
            .filter_map(|m| {
                let delta = m.frame.middle() - origin;
                let along = match direction {
                    Direction::Left => -delta.x,
                    Direction::Right => delta.x,
                    Direction::Up => -delta.y,
                    Direction::Down => delta.y,
                };
                (along > 0.0).then_some((along, m.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    fn workspace(&self, workspace: WorkspaceId) -> Option<WorkspaceInfo> {
        self.workspaces.get(&workspace).cloned()
    }

    fn resolve_workspace(&self, name: &str) -> Option<(WorkspaceId, String)> {
        if let Ok(id) = name.parse::<i64>() {
            return Some((WorkspaceId(id), name.to_owned()));
        }
        let name = name.strip_prefix("name:")?;
        let existing = self.workspaces.values().find(|w| w.name == name).map(|w| w.id);
        let id = existing.unwrap_or_else(|| {
            WorkspaceId(self.workspaces.keys().map(|id| id.0).max().unwrap_or(0) + 1)
        });
        Some((id, name.to_owned()))
    }

    fn focused_window(&self) -> Option<WindowId> { self.focused }

    fn cursor_position(&self) -> Vec2 { self.cursor }

    fn window_at(&self, point: Vec2, floating_only: bool) -> Option<WindowId> {
        self.windows
            .iter()
            .rev()
            .filter(|w| w.mapped && !w.hidden && (!floating_only || w.floating))
            .find(|w| w.frame.contains(point))
            .map(|w| w.id)
    }

    fn parent_pid(&self, pid: i32) -> Option<i32> { self.parent_pids.get(&pid).copied() }

    fn focus_window(&mut self, window: Option<WindowId>) {
        self.focused = window;
        let workspace = window.and_then(|w| self.window(w)).map(|w| w.workspace);
        if let Some(info) = workspace.and_then(|ws| self.workspaces.get_mut(&ws)) {
            info.last_focused_window = window;
        }
    }

    fn set_window_hidden(&mut self, window: WindowId, hidden: bool) {
        self.window_mut(window).hidden = hidden;
    }

    fn apply_window_layout(&mut self, window: WindowId, placement: WindowPlacement) {
        self.window_mut(window).frame = placement.frame;
        self.placements.insert(window, placement);
    }

    fn set_window_frame(&mut self, window: WindowId, frame: Rect) {
        self.window_mut(window).frame = frame;
    }

    fn set_window_fullscreen(&mut self, window: WindowId, fullscreen: bool, mode: FullscreenMode) {
        let Some(info) = self.window(window) else { return };
        if fullscreen {
            self.saved_frames.insert(window, info.frame);
            if let Some(ws) = self.workspaces.get_mut(&info.workspace) {
                ws.fullscreen_window = Some(window);
                ws.fullscreen_mode = mode;
            }
            if mode == FullscreenMode::Full {
                if let Some(frame) = self.monitor(info.monitor).map(|m| m.frame) {
                    self.window_mut(window).frame = frame;
                }
            }
        } else {
            if let Some(ws) = self.workspaces.get_mut(&info.workspace) {
                ws.fullscreen_window = None;
            }
            if let Some(frame) = self.saved_frames.remove(&window) {
                self.window_mut(window).frame = frame;
            }
        }
        self.window_mut(window).fullscreen = fullscreen;
    }

    fn restore_window_decorations(&mut self, _window: WindowId) {}

    fn refresh_decorations(&mut self, _window: WindowId) {}

    fn raise_window(&mut self, window: WindowId) {
        if let Some(index) = self.windows.iter().position(|w| w.id == window) {
            let info = self.windows.remove(index);
            self.windows.push(info);
        }
        self.raised.push(window);
    }

    fn close_window(&mut self, window: WindowId) { self.closed.push(window); }

    fn damage(&mut self, area: Rect) { self.damaged.push(area); }

    fn move_window_to_workspace(&mut self, window: WindowId, workspace: WorkspaceId) {
        let monitor = self.workspaces.get(&workspace).map(|w| w.monitor);
        let info = self.window_mut(window);
        info.workspace = workspace;
        if let Some(monitor) = monitor {
            info.monitor = monitor;
        }
    }

    fn create_workspace(&mut self, id: WorkspaceId, name: &str, monitor: MonitorId) -> WorkspaceId {
        self.add_workspace(id, monitor).name = name.to_owned();
        id
    }

    fn set_active_monitor(&mut self, monitor: MonitorId) { self.active_monitor = Some(monitor); }

    fn change_monitor_workspace(&mut self, monitor: MonitorId, workspace: WorkspaceId) {
        self.monitor_mut(monitor).active_workspace = Some(workspace);
        if let Some(ws) = self.workspaces.get_mut(&workspace) {
            ws.monitor = monitor;
        }
    }

    fn set_special_workspace(&mut self, monitor: MonitorId, workspace: Option<WorkspaceId>) {
        self.monitor_mut(monitor).active_special_workspace = workspace;
    }

    fn remember_previous_workspace(&mut self, workspace: WorkspaceId, previous: WorkspaceId) {
        self.previous_workspaces.push((workspace, previous));
    }

    fn notify_error(&mut self, message: &str) { self.notifications.push(message.to_owned()); }
}
