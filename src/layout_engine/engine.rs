//! The public face of the layout: one [`LayoutEngine`] per compositor,
//! driven by window lifecycle callbacks and user commands.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use super::Direction;
use super::forest::{Detached, Forest, LayoutCx, NodeSnapshot};
use super::navigation::{
    Distance, FocusOverrides, is_obscured, shift_floating_window, window_in_direction,
};
use super::tab_bar::TabBars;
use crate::common::collections::BTreeMap;
use crate::common::config::{
    Config, ConfigProvider, MoveFocusLayer, NodeCollapsePolicy, ObscuredWindowPolicy, SharedConfig,
};
use crate::common::error::LayoutError;
use crate::model::{Ephemerality, ExpandState, GroupLayout, LayoutNode, NodeData, NodeId};
use crate::sys::geometry::{Rect, Vec2};
use crate::sys::host::{
    Corner, FullscreenMode, Host, Layer, MonitorId, MonitorInfo, WindowId, WindowInfo, WorkspaceId,
};

/// Smallest size a floating window can be resized to.
const MIN_FLOATING_SIZE: f64 = 20.0;

/// Process ids at or below this are never treated as a window's parent.
const MIN_PARENT_PID: i32 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FocusShift {
    Top,
    Bottom,
    Raise,
    Lower,
    /// The closest tabbed group above the focus.
    Tab,
    /// The closest node above the focus that is a tab.
    TabNode,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TabFocus {
    Left,
    Right,
    /// 1-based position in the tab bar.
    Index(usize),
    MouseLocation,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TabFocusMousePriority {
    #[default]
    Ignore,
    Prioritize,
    Require,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SetSwallowOption {
    NoSwallow,
    Swallow,
    Toggle,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpandOption {
    Expand,
    Shrink,
    Base,
    Maximize,
    Fullscreen,
}

/// What expanding does once it reaches the top of the tree.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpandFullscreenOption {
    MaximizeOnly,
    #[default]
    MaximizeIntermediate,
    MaximizeAsFullscreen,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupChange {
    H,
    V,
    Tab,
    Untab,
    ToggleTab,
    Opposite,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    MakeGroup {
        layout: GroupLayout,
        #[serde(default)]
        ephemeral: Ephemerality,
    },
    MakeOppositeGroup {
        #[serde(default)]
        ephemeral: Ephemerality,
    },
    ChangeGroup(GroupChange),
    SetEphemeral(bool),
    MoveFocus {
        direction: Direction,
        #[serde(default)]
        visible: bool,
        #[serde(default)]
        layer: Option<MoveFocusLayer>,
    },
    MoveWindow {
        direction: Direction,
        #[serde(default)]
        once: bool,
        #[serde(default)]
        visible: bool,
    },
    MoveToWorkspace {
        workspace: String,
        #[serde(default)]
        follow: bool,
    },
    ChangeFocus(FocusShift),
    FocusTab {
        target: TabFocus,
        #[serde(default)]
        mouse: TabFocusMousePriority,
        #[serde(default)]
        wrap: bool,
    },
    SetSwallow(SetSwallowOption),
    KillActive,
    Expand {
        option: ExpandOption,
        #[serde(default)]
        fullscreen: ExpandFullscreenOption,
    },
    ResizeNode {
        delta: Vec2,
    },
    DebugNodes,
}

impl LayoutCommand {
    /// Commands that still make sense while a window is fullscreen.
    fn allowed_over_fullscreen(&self) -> bool {
        matches!(self, LayoutCommand::MoveToWorkspace { .. } | LayoutCommand::KillActive)
    }
}

pub struct LayoutEngine<H: Host> {
    host: H,
    forest: Forest,
    config: Arc<dyn ConfigProvider>,
    overrides: FocusOverrides,
}

impl<H: Host> LayoutEngine<H> {
    pub fn new(host: H, config: Arc<dyn ConfigProvider>) -> Self {
        LayoutEngine {
            host,
            forest: Forest::new(),
            config,
            overrides: FocusOverrides::default(),
        }
    }

    /// An engine whose configuration never changes.
    pub fn with_config(host: H, config: Config) -> Self {
        LayoutEngine::new(host, Arc::new(SharedConfig::new(config)))
    }

    pub fn host(&self) -> &H { &self.host }

    pub fn host_mut(&mut self) -> &mut H { &mut self.host }

    pub fn forest(&self) -> &Forest { &self.forest }

    pub fn config(&self) -> Arc<Config> { self.config.current() }

    /// Runs one operation against the current configuration, then untiles
    /// any window found to be gone while doing it.
    fn with_session<R>(&mut self, f: impl FnOnce(&mut Session<'_>) -> R) -> R {
        let config = self.config.current();
        let (result, stale) = {
            let mut session = Session {
                forest: &mut self.forest,
                overrides: &mut self.overrides,
                cx: LayoutCx::new(&mut self.host, &config),
            };
            let result = f(&mut session);
            (result, session.cx.into_stale())
        };
        self.remove_stale(stale, &config);
        result
    }

    fn remove_stale(&mut self, mut stale: Vec<WindowId>, config: &Config) {
        while let Some(window) = stale.pop() {
            warn!(%window, "removing stale tiled window");
            let mut session = Session {
                forest: &mut self.forest,
                overrides: &mut self.overrides,
                cx: LayoutCx::new(&mut self.host, config),
            };
            session.remove_tiled(window);
            for window in session.cx.into_stale() {
                if !stale.contains(&window) {
                    stale.push(window);
                }
            }
        }
    }

    /// Called for every new window. Windows spawned from inside a
    /// containment group are tiled next to their parent; everything else
    /// goes through [`Self::on_window_created_tiling`].
    pub fn on_window_created(&mut self, window: WindowId) {
        self.with_session(|s| {
            if !s.contain(window) {
                s.create_tiling(window);
            }
        })
    }

    pub fn on_window_created_tiling(&mut self, window: WindowId) {
        self.with_session(|s| s.create_tiling(window))
    }

    pub fn on_window_removed_tiling(&mut self, window: WindowId) {
        self.with_session(|s| s.remove_tiled(window))
    }

    pub fn on_window_removed_floating(&mut self, window: WindowId) { self.overrides.remove(window); }

    pub fn on_window_focus_change(&mut self, window: WindowId) {
        self.with_session(|s| {
            let Some(node) = s.forest.node_for_window(window) else { return };
            debug!(%window, ?node, "focus changed");
            s.forest.mark_focused(&mut s.cx, node);
            let root = s.forest.root_of(node);
            s.forest.recalc(&mut s.cx, root);
        })
    }

    pub fn is_window_tiled(&self, window: WindowId) -> bool {
        self.forest.node_for_window(window).is_some()
    }

    pub fn recalculate_monitor(&mut self, monitor: MonitorId) {
        self.with_session(|s| s.recalculate_monitor(monitor))
    }

    pub fn recalculate_window(&mut self, window: WindowId) {
        self.with_session(|s| {
            if let Some(node) = s.forest.node_for_window(window) {
                s.forest.recalc(&mut s.cx, node);
            }
        })
    }

    /// Resizes `node` by `delta`, or the focused window when it floats.
    pub fn resize_node(&mut self, delta: Vec2, corner: Corner, node: Option<NodeId>) {
        self.with_session(|s| {
            let focused = s.cx.host.focused_window().and_then(|w| s.cx.host.window(w));
            if let Some(focused) = focused.filter(|w| w.floating) {
                s.resize_window(delta, corner, Some(focused.id));
                return;
            }
            let Some(node) = node else { return };
            let Some(workspace) = s.forest.get(node).map(|n| n.workspace) else { return };
            let monitor = s.cx.host.workspace(workspace).and_then(|ws| s.cx.host.monitor(ws.monitor));
            if let Some(monitor) = monitor {
                s.forest.execute_resize(&mut s.cx, node, delta, corner, &monitor);
            }
        })
    }

    /// Resizes `window`, or the focused window if `None`.
    pub fn resize_active_window(&mut self, delta: Vec2, corner: Corner, window: Option<WindowId>) {
        self.with_session(|s| s.resize_window(delta, corner, window))
    }

    pub fn fullscreen_request_for_window(&mut self, window: WindowId, mode: FullscreenMode, on: bool) {
        self.with_session(|s| s.fullscreen_request(window, mode, on))
    }

    /// Handles layout messages sent to `window`. Only `togglesplit` is
    /// understood.
    pub fn layout_message(&mut self, window: WindowId, message: &str) {
        if message != "togglesplit" {
            trace!(message, "ignoring layout message");
            return;
        }
        self.with_session(|s| {
            let Some(parent) = s.forest.node_for_window(window).and_then(|n| s.forest.parent(n)) else {
                return;
            };
            let Some(group) = s.forest.group_mut(parent) else { return };
            group.layout = match group.layout {
                GroupLayout::SplitH => GroupLayout::SplitV,
                GroupLayout::SplitV => GroupLayout::SplitH,
                GroupLayout::Tabbed => return,
            };
            s.forest.recalc(&mut s.cx, parent);
        })
    }

    /// Moves `window` towards `direction`: through the tree when tiled,
    /// onto the neighbouring window's workspace otherwise.
    pub fn move_window_to(&mut self, window: WindowId, direction: Direction) {
        self.with_session(|s| s.move_window_to(window, direction))
    }

    /// The window that should get focus after `window` goes away.
    pub fn get_next_window_candidate(&self, window: WindowId) -> Option<WindowId> {
        let info = self.host.window(window)?;
        let workspace = self.host.workspace(info.workspace)?;
        if workspace.has_fullscreen() {
            return workspace.fullscreen_window;
        }
        if info.floating {
            let floating = self.host.windows().into_iter().rev().find(|w| {
                w.mapped
                    && !w.hidden
                    && w.floating
                    && w.focusable
                    && w.workspace == info.workspace
                    && w.id != window
            });
            if let Some(floating) = floating {
                return Some(floating.id);
            }
        }
        let node = self.forest.workspace_focused_node(info.workspace, true, false)?;
        self.forest.get(node)?.window()
    }

    /// Puts `to` where `from` is tiled.
    pub fn replace_window_data_with(&mut self, from: WindowId, to: WindowId) {
        self.with_session(|s| {
            let Some(node) = s.forest.node_for_window(from) else { return };
            s.forest.rebind_window(node, to);
            if let Some(data) = s.forest.get(node).cloned() {
                s.forest.apply_node_data(&mut s.cx, &data, false);
            }
        })
    }

    pub fn bring_window_to_top(&mut self, window: WindowId) {
        self.with_session(|s| {
            if let Some(node) = s.forest.node_for_window(window) {
                s.forest.bring_to_top(&mut s.cx, node);
            }
        })
    }

    /// Whether `window` is part of the focused node of its workspace and
    /// should be drawn as such.
    pub fn should_render_selected(&self, window: WindowId) -> bool {
        let Some(info) = self.host.window(window) else { return false };
        let Some(root) = self.forest.workspace_root(info.workspace) else { return false };
        if self.forest.group(root).and_then(|g| g.focused_child).is_none() {
            return false;
        }
        let focused = self.forest.focused_node(root, false, false);
        match self.forest.get(focused).map(|n| n.data.window()) {
            Some(Some(focused_window)) => {
                focused_window == window && self.host.focused_window() == Some(window)
            }
            Some(None) => self
                .forest
                .node_for_window(window)
                .is_some_and(|node| self.forest.has_descendant(focused, node)),
            None => false,
        }
    }

    /// Tiles every visible window the host already knows about.
    pub fn on_enable(&mut self) {
        let windows = self.host.windows();
        info!(count = windows.len(), "enabling layout");
        for window in windows {
            if window.hidden || !window.mapped || window.floating {
                continue;
            }
            self.on_window_created_tiling(window.id);
        }
    }

    /// Drops every tree, leaving windows visible where they are.
    pub fn on_disable(&mut self) {
        let workspaces: Vec<_> = self.forest.workspaces().collect();
        for workspace in workspaces {
            let Some(root) = self.forest.workspace_root(workspace) else { continue };
            for window in self.forest.windows_of(root) {
                self.host.set_window_hidden(window, false);
            }
        }
        self.forest.clear();
        self.overrides = FocusOverrides::default();
        info!("layout disabled");
    }

    pub fn make_group_on(&mut self, node: NodeId, layout: GroupLayout, ephemerality: Ephemerality) {
        self.with_session(|s| s.make_group_on(node, layout, ephemerality))
    }

    pub fn make_opposite_group_on(&mut self, node: NodeId, ephemerality: Ephemerality) {
        self.with_session(|s| s.make_opposite_group_on(node, ephemerality))
    }

    pub fn change_group_on(&mut self, node: NodeId, layout: GroupLayout) {
        self.with_session(|s| s.change_group_on(node, layout))
    }

    pub fn untab_group_on(&mut self, node: NodeId) { self.with_session(|s| s.untab_group_on(node)) }

    pub fn toggle_tab_group_on(&mut self, node: NodeId) {
        self.with_session(|s| s.toggle_tab_group_on(node))
    }

    pub fn change_group_to_opposite_on(&mut self, node: NodeId) {
        self.with_session(|s| s.change_group_to_opposite_on(node))
    }

    pub fn change_group_ephemerality_on(&mut self, node: NodeId, ephemeral: bool) {
        self.with_session(|s| s.change_group_ephemerality_on(node, ephemeral))
    }

    pub fn make_group_on_workspace(
        &mut self,
        workspace: WorkspaceId,
        layout: GroupLayout,
        ephemerality: Ephemerality,
    ) {
        if let Some(node) = self.forest.workspace_focused_node(workspace, false, false) {
            self.make_group_on(node, layout, ephemerality);
        }
    }

    pub fn make_opposite_group_on_workspace(&mut self, workspace: WorkspaceId, ephemerality: Ephemerality) {
        if let Some(node) = self.forest.workspace_focused_node(workspace, false, false) {
            self.make_opposite_group_on(node, ephemerality);
        }
    }

    pub fn change_group_on_workspace(&mut self, workspace: WorkspaceId, layout: GroupLayout) {
        if let Some(node) = self.forest.workspace_focused_node(workspace, false, false) {
            self.change_group_on(node, layout);
        }
    }

    pub fn untab_group_on_workspace(&mut self, workspace: WorkspaceId) {
        if let Some(node) = self.forest.workspace_focused_node(workspace, false, false) {
            self.untab_group_on(node);
        }
    }

    pub fn toggle_tab_group_on_workspace(&mut self, workspace: WorkspaceId) {
        if let Some(node) = self.forest.workspace_focused_node(workspace, false, false) {
            self.toggle_tab_group_on(node);
        }
    }

    pub fn change_group_to_opposite_on_workspace(&mut self, workspace: WorkspaceId) {
        if let Some(node) = self.forest.workspace_focused_node(workspace, false, false) {
            self.change_group_to_opposite_on(node);
        }
    }

    pub fn change_group_ephemerality_on_workspace(&mut self, workspace: WorkspaceId, ephemeral: bool) {
        if let Some(node) = self.forest.workspace_focused_node(workspace, false, false) {
            self.change_group_ephemerality_on(node, ephemeral);
        }
    }

    pub fn shift_node(&mut self, node: NodeId, direction: Direction, once: bool, visible: bool) {
        self.with_session(|s| s.forest.shift_node(&mut s.cx, node, direction, once, visible))
    }

    /// Moves the focused window of `workspace`: floating windows by a
    /// fixed step, tiled ones through the tree.
    pub fn shift_window(&mut self, workspace: WorkspaceId, direction: Direction, once: bool, visible: bool) {
        self.with_session(|s| {
            let focused = s.cx.host.focused_window().and_then(|w| s.cx.host.window(w));
            if let Some(focused) = focused.filter(|w| w.floating) {
                shift_floating_window(&mut *s.cx.host, s.cx.config, focused.id, direction);
                return;
            }
            if let Some(node) = s.forest.workspace_focused_node(workspace, false, false) {
                s.forest.shift_node(&mut s.cx, node, direction, once, visible);
            }
        })
    }

    pub fn focus_monitor(&mut self, monitor: MonitorId) {
        self.with_session(|s| s.focus_monitor(monitor))
    }

    pub fn shift_focus_to_monitor(&mut self, direction: Direction) {
        self.with_session(|s| s.shift_focus_to_monitor(direction))
    }

    /// Moves focus towards `direction`, choosing between the tiled tree and
    /// floating windows on `layers` (empty means the source window's own
    /// layer).
    ///
    /// The source is the last focused window of `workspace`, or the focused
    /// window when no workspace is given.
    pub fn shift_focus(
        &mut self,
        workspace: Option<WorkspaceId>,
        direction: Direction,
        visible: bool,
        layers: Layer,
    ) {
        self.with_session(|s| s.shift_focus(workspace, direction, visible, layers))
    }

    /// Moves the focused node of `origin` to the workspace named `name`,
    /// creating it if needed. With `follow`, the target is shown as well.
    pub fn move_node_to_workspace(&mut self, origin: WorkspaceId, name: &str, follow: bool) {
        self.with_session(|s| s.move_node_to_workspace(origin, name, follow))
    }

    pub fn change_focus(&mut self, workspace: WorkspaceId, shift: FocusShift) {
        self.with_session(|s| s.change_focus(workspace, shift))
    }

    pub fn focus_tab(
        &mut self,
        workspace: WorkspaceId,
        target: TabFocus,
        mouse: TabFocusMousePriority,
        wrap: bool,
    ) {
        self.with_session(|s| s.focus_tab(workspace, target, mouse, wrap))
    }

    /// Sets whether the group around the focused node swallows windows
    /// spawned from it.
    pub fn set_node_swallow(&mut self, workspace: WorkspaceId, option: SetSwallowOption) {
        let Some(node) = self.forest.workspace_focused_node(workspace, false, false) else { return };
        let Some(group) = self.forest.parent(node).and_then(|p| self.forest.group_mut(p)) else {
            return;
        };
        group.containment = match option {
            SetSwallowOption::NoSwallow => false,
            SetSwallowOption::Swallow => true,
            SetSwallowOption::Toggle => !group.containment,
        };
        debug!(?node, containment = group.containment, "set swallow");
    }

    /// Closes the focused floating window, or every window of the focused node.
    pub fn kill_focused_node(&mut self, workspace: WorkspaceId) {
        let focused = self.host.focused_window().and_then(|w| self.host.window(w));
        if let Some(focused) = focused.filter(|w| w.floating) {
            self.host.close_window(focused.id);
            return;
        }
        let Some(node) = self.forest.workspace_focused_node(workspace, false, false) else { return };
        for window in self.forest.windows_of(node) {
            self.host.set_window_hidden(window, false);
            self.host.close_window(window);
        }
    }

    pub fn expand(&mut self, workspace: WorkspaceId, option: ExpandOption, fullscreen: ExpandFullscreenOption) {
        self.with_session(|s| s.expand(workspace, option, fullscreen))
    }

    pub fn on_window_title_changed(&mut self, window: WindowId) { self.refresh_tab_bars_of(window) }

    pub fn on_window_urgent(&mut self, window: WindowId) { self.refresh_tab_bars_of(window) }

    fn refresh_tab_bars_of(&mut self, window: WindowId) {
        self.with_session(|s| {
            if let Some(node) = s.forest.node_for_window(window) {
                s.forest.update_tab_bar_recursive(&s.cx, node);
            }
        })
    }

    /// Drops tab bars whose groups went away since the last tick.
    pub fn tick(&mut self) -> usize { self.forest.tab_bars_mut().tick() }

    pub fn tab_bars(&self) -> &TabBars { self.forest.tab_bars() }

    pub fn get_workspace_root_group(&self, workspace: WorkspaceId) -> Option<NodeId> {
        self.forest.workspace_root(workspace)
    }

    pub fn get_workspace_focused_node(
        &self,
        workspace: WorkspaceId,
        ignore_group_focus: bool,
        stop_at_expanded: bool,
    ) -> Option<NodeId> {
        self.forest.workspace_focused_node(workspace, ignore_group_focus, stop_at_expanded)
    }

    /// Where focus re-enters the tree when leaving floating `window`
    /// towards `direction`.
    pub fn focus_override(&mut self, window: WindowId, direction: Direction) -> Option<NodeId> {
        let info = self.host.window(window)?;
        self.overrides.get(&self.forest, &info, direction)
    }

    pub fn debug_node(&self, node: NodeId) -> String { self.forest.debug_node(node) }

    pub fn draw_tree(&self, workspace: WorkspaceId) -> Option<String> {
        self.forest.workspace_root(workspace).map(|root| self.forest.draw_tree(root))
    }

    /// Every workspace tree, as RON.
    pub fn dump_state(&self) -> Result<String, ron::Error> {
        let state: BTreeMap<WorkspaceId, NodeSnapshot> = self
            .forest
            .workspaces()
            .filter_map(|ws| {
                let root = self.forest.workspace_root(ws)?;
                Some((ws, self.forest.snapshot(root)?))
            })
            .collect();
        ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::default())
    }

    /// Applies `command` to the active workspace of the active monitor.
    pub fn handle_command(&mut self, command: LayoutCommand) {
        let monitor = self.host.active_monitor().and_then(|m| self.host.monitor(m));
        let Some(workspace) = monitor.and_then(|m| m.active_workspace) else {
            debug!(?command, "no active workspace");
            return;
        };
        let Some(info) = self.host.workspace(workspace) else { return };
        if info.has_fullscreen() && !command.allowed_over_fullscreen() {
            debug!(?command, %workspace, "ignoring command over a fullscreen window");
            return;
        }
        debug!(?command, %workspace, "handling command");

        match command {
            LayoutCommand::MakeGroup { layout, ephemeral } => {
                self.make_group_on_workspace(workspace, layout, ephemeral)
            }
            LayoutCommand::MakeOppositeGroup { ephemeral } => {
                self.make_opposite_group_on_workspace(workspace, ephemeral)
            }
            LayoutCommand::ChangeGroup(change) => match change {
                GroupChange::H => self.change_group_on_workspace(workspace, GroupLayout::SplitH),
                GroupChange::V => self.change_group_on_workspace(workspace, GroupLayout::SplitV),
                GroupChange::Tab => self.change_group_on_workspace(workspace, GroupLayout::Tabbed),
                GroupChange::Untab => self.untab_group_on_workspace(workspace),
                GroupChange::ToggleTab => self.toggle_tab_group_on_workspace(workspace),
                GroupChange::Opposite => self.change_group_to_opposite_on_workspace(workspace),
            },
            LayoutCommand::SetEphemeral(ephemeral) => {
                self.change_group_ephemerality_on_workspace(workspace, ephemeral)
            }
            LayoutCommand::MoveFocus { direction, visible, layer } => {
                let layer = layer.unwrap_or(self.config.current().general.default_movefocus_layer);
                self.shift_focus(Some(workspace), direction, visible, layer.layers())
            }
            LayoutCommand::MoveWindow { direction, once, visible } => {
                self.shift_window(workspace, direction, once, visible)
            }
            LayoutCommand::MoveToWorkspace { workspace: target, follow } => {
                if !target.is_empty() {
                    self.move_node_to_workspace(workspace, &target, follow)
                }
            }
            LayoutCommand::ChangeFocus(shift) => self.change_focus(workspace, shift),
            LayoutCommand::FocusTab { target, mouse, wrap } => {
                self.focus_tab(workspace, target, mouse, wrap)
            }
            LayoutCommand::SetSwallow(option) => self.set_node_swallow(workspace, option),
            LayoutCommand::KillActive => self.kill_focused_node(workspace),
            LayoutCommand::Expand { option, fullscreen } => self.expand(workspace, option, fullscreen),
            LayoutCommand::ResizeNode { delta } => {
                let node = self.forest.workspace_focused_node(workspace, false, true);
                self.resize_node(delta, Corner::None, node)
            }
            LayoutCommand::DebugNodes => match self.forest.workspace_root(workspace) {
                Some(root) => info!("DEBUG NODES\n{}", self.forest.debug_node(root)),
                None => info!("DEBUG NODES: no nodes on workspace"),
            },
        }
    }
}

/// Everything one engine operation can touch.
struct Session<'a> {
    forest: &'a mut Forest,
    overrides: &'a mut FocusOverrides,
    cx: LayoutCx<'a>,
}

impl Session<'_> {
    fn create_tiling(&mut self, window: WindowId) {
        let Some(info) = self.cx.host.window(window) else { return };
        debug!(%window, floating = info.floating, workspace = %info.workspace, "tiling window");
        if info.floating {
            return;
        }
        if self.forest.node_for_window(window).is_some() {
            self.cx.report(LayoutError::AlreadyTiled(window));
            return;
        }
        let node = self.forest.mk_node(NodeData::Window(window), info.workspace);
        if let Err(err) = self.forest.insert_node(&mut self.cx, node) {
            self.forest.delete(node);
            self.cx.report(err);
        }
    }

    /// Tiles `window` next to a window of a containment group that one of
    /// its ancestor processes owns.
    fn contain(&mut self, window: WindowId) -> bool {
        let Some(info) = self.cx.host.window(window) else { return false };
        if info.floating || self.forest.node_for_window(window).is_some() {
            return false;
        }
        let roots: Vec<_> = self.forest.workspaces().filter_map(|ws| self.forest.workspace_root(ws)).collect();
        roots.into_iter().any(|root| self.contain_in(root, false, &info))
    }

    fn contain_in(&mut self, group: NodeId, contained: bool, info: &WindowInfo) -> bool {
        let Some(data) = self.forest.group(group) else { return false };
        let contained = contained || data.containment;
        let children: Vec<_> = self.forest.children(group).collect();
        for child in children {
            let Some(node) = self.forest.get(child) else { continue };
            let Some(sibling) = node.window() else {
                if self.contain_in(child, contained, info) {
                    return true;
                }
                continue;
            };
            if !contained {
                continue;
            }
            let Some(sibling_pid) = self.cx.host.window(sibling).map(|w| w.pid) else { continue };
            let mut ppid = self.cx.host.parent_pid(info.pid);
            while let Some(pid) = ppid.filter(|&pid| pid > MIN_PARENT_PID) {
                if pid == sibling_pid {
                    let Some(node) = self.forest.tile_after(child, info.id) else { return false };
                    debug!(window = %info.id, %sibling, "swallowed into containment group");
                    self.forest.mark_focused(&mut self.cx, node);
                    self.forest.recalc(&mut self.cx, group);
                    return true;
                }
                ppid = self.cx.host.parent_pid(pid);
            }
        }
        false
    }

    fn remove_tiled(&mut self, window: WindowId) {
        self.overrides.remove(window);
        let Some(node) = self.forest.node_for_window(window) else { return };
        debug!(%window, ?node, parent = ?self.forest.parent(node), "untiling window");

        self.cx.host.restore_window_decorations(window);
        if self.cx.host.window(window).is_some_and(|w| w.fullscreen) {
            self.cx.host.set_window_fullscreen(window, false, FullscreenMode::Full);
        }

        let detached = match self.forest.remove_from_parent_recursive(node, None) {
            Ok(detached) => detached,
            Err(err) => {
                self.cx.report(err);
                Detached::default()
            }
        };
        self.forest.delete(node);
        if let Some(actor) = detached.expand_actor {
            self.forest.recalc(&mut self.cx, actor);
        }
        let Some(parent) = detached.parent else { return };
        self.forest.recalc(&mut self.cx, parent);
        self.collapse_after_removal(parent);
    }

    /// Merges `parent` away if the removal left it with a single child it
    /// no longer needs to wrap.
    fn collapse_after_removal(&mut self, parent: NodeId) {
        if self.forest.child_count(parent) != 1 {
            return;
        }
        let Some(group) = self.forest.group(parent) else { return };
        let Some(only) = self.forest.children(parent).next() else { return };
        let only_is_group = self.forest.get(only).is_some_and(LayoutNode::is_group);
        let collapsible = only_is_group
            && match self.cx.config.general.node_collapse_policy {
                NodeCollapsePolicy::Always => true,
                NodeCollapsePolicy::Never => false,
                NodeCollapsePolicy::UnlessParentTabbed => group.layout != GroupLayout::Tabbed,
            };
        if !group.ephemeral && !collapsible {
            return;
        }

        let mut target = Some(parent);
        while let Some(node) = target {
            if !self.forest.swallow_groups(node) {
                break;
            }
            target = self.forest.parent(node);
        }
        if let Some(target) = target.filter(|&t| t != parent) {
            self.forest.recalc(&mut self.cx, target);
        }
    }

    fn recalculate_monitor(&mut self, monitor: MonitorId) {
        let Some(info) = self.cx.host.monitor(monitor) else { return };
        trace!(?monitor, "recalculating monitor");
        self.cx.host.damage(info.frame);
        let area = info.usable_area();
        for workspace in [info.active_workspace, info.active_special_workspace].into_iter().flatten() {
            let Some(root) = self.forest.workspace_root(workspace) else { continue };
            if let Some(node) = self.forest.get_mut(root) {
                node.set_rect(area);
            }
            self.forest.recalc(&mut self.cx, root);
        }
    }

    fn resize_window(&mut self, delta: Vec2, corner: Corner, window: Option<WindowId>) {
        let Some(window) = window.or_else(|| self.cx.host.focused_window()) else { return };
        let Some(info) = self.cx.host.window(window).filter(|w| w.mapped) else { return };
        if info.floating {
            let size = (info.frame.size + delta).max(Vec2::new(MIN_FLOATING_SIZE, MIN_FLOATING_SIZE));
            self.cx.host.set_window_frame(window, Rect::new(info.frame.origin, size));
            return;
        }
        let Some(node) = self.forest.node_for_window(window) else { return };
        let Some(monitor) = self.cx.host.monitor(info.monitor) else { return };
        let actor = self.forest.expand_actor(node);
        self.forest.execute_resize(&mut self.cx, actor, delta, corner, &monitor);
    }

    fn fullscreen_request(&mut self, window: WindowId, mode: FullscreenMode, on: bool) {
        let Some(info) = self.cx.host.window(window).filter(|w| w.mapped) else { return };
        let Some(workspace) = self.cx.host.workspace(info.workspace) else { return };
        if on == info.fullscreen || workspace.special {
            return;
        }
        if on && workspace.has_fullscreen() {
            return;
        }
        let Some(monitor) = self.cx.host.monitor(info.monitor) else { return };
        debug!(%window, ?mode, on, "fullscreen request");

        self.cx.host.set_window_fullscreen(window, on, mode);
        if !on {
            match self.forest.node_for_window(window).and_then(|n| self.forest.get(n)).cloned() {
                Some(node) => self.forest.apply_node_data(&mut self.cx, &node, false),
                None => self.cx.host.restore_window_decorations(window),
            }
        } else if mode == FullscreenMode::Maximized {
            self.maximize(window, info.workspace, &monitor);
        }
        self.cx.host.raise_window(window);
        self.recalculate_monitor(monitor.id);
    }

    /// Lays `window` over the whole usable area of `monitor`, keeping the
    /// outer gaps.
    fn maximize(&mut self, window: WindowId, workspace: WorkspaceId, monitor: &MonitorInfo) {
        let gaps = &self.cx.config.gaps;
        let mut fake = LayoutNode::new(NodeData::Window(window), workspace);
        fake.set_rect(monitor.usable_area());
        fake.gap_topleft = Vec2::new(gaps.outer.left - gaps.inner.left, gaps.outer.top - gaps.inner.top);
        fake.gap_bottomright =
            Vec2::new(gaps.outer.right - gaps.inner.right, gaps.outer.bottom - gaps.inner.bottom);
        self.forest.apply_node_data(&mut self.cx, &fake, false);
    }

    fn move_window_to(&mut self, window: WindowId, direction: Direction) {
        if let Some(node) = self.forest.node_for_window(window) {
            self.forest.shift_node(&mut self.cx, node, direction, false, false);
            return;
        }
        let Some(info) = self.cx.host.window(window) else { return };
        let host = &*self.cx.host;
        let neighbor = window_in_direction(host, self.cx.config, &info, direction, Layer::all(), Layer::all())
            .and_then(|w| host.window(w));
        let Some(neighbor) = neighbor else { return };
        if neighbor.workspace != info.workspace {
            self.remove_tiled(window);
            self.cx.host.move_window_to_workspace(window, neighbor.workspace);
            self.create_tiling(window);
        }
    }

    fn make_group_on(&mut self, node: NodeId, layout: GroupLayout, ephemerality: Ephemerality) {
        if let Some(parent) = self.forest.parent(node) {
            if self.forest.child_count(parent) == 1 {
                if let Some(group) = self.forest.group_mut(parent) {
                    group.set_layout(layout);
                    group.set_ephemeral(ephemerality);
                }
                self.forest.update_tab_bar_recursive(&self.cx, parent);
                self.forest.recalc(&mut self.cx, parent);
                return;
            }
        }
        self.forest.into_group(&mut self.cx, node, layout, ephemerality);
    }

    fn make_opposite_group_on(&mut self, node: NodeId, ephemerality: Ephemerality) {
        let Some(parent) = self.forest.parent(node) else {
            self.forest.into_group(&mut self.cx, node, GroupLayout::SplitH, ephemerality);
            return;
        };
        let Some(parent_layout) = self.forest.group(parent).map(|g| g.layout) else { return };
        let layout = match parent_layout {
            GroupLayout::SplitH => GroupLayout::SplitV,
            _ => GroupLayout::SplitH,
        };
        if self.forest.child_count(parent) == 1 {
            if let Some(group) = self.forest.group_mut(parent) {
                group.set_layout(layout);
                group.set_ephemeral(ephemerality);
            }
            self.forest.recalc(&mut self.cx, parent);
            return;
        }
        self.forest.into_group(&mut self.cx, node, layout, ephemerality);
    }

    fn change_group_on(&mut self, node: NodeId, layout: GroupLayout) {
        let Some(parent) = self.forest.parent(node) else {
            self.make_group_on(node, layout, Ephemerality::Ephemeral);
            return;
        };
        if let Some(group) = self.forest.group_mut(parent) {
            group.set_layout(layout);
        }
        self.forest.update_tab_bar_recursive(&self.cx, parent);
        self.forest.recalc(&mut self.cx, parent);
    }

    fn parent_group_layout(&self, node: NodeId) -> Option<(GroupLayout, GroupLayout)> {
        let group = self.forest.group(self.forest.parent(node)?)?;
        Some((group.layout, group.previous_nontab_layout))
    }

    fn untab_group_on(&mut self, node: NodeId) {
        if let Some((GroupLayout::Tabbed, previous)) = self.parent_group_layout(node) {
            self.change_group_on(node, previous);
        }
    }

    fn toggle_tab_group_on(&mut self, node: NodeId) {
        match self.parent_group_layout(node) {
            Some((GroupLayout::Tabbed, previous)) => self.change_group_on(node, previous),
            Some(_) => self.change_group_on(node, GroupLayout::Tabbed),
            None => {}
        }
    }

    fn change_group_to_opposite_on(&mut self, node: NodeId) {
        let Some(parent) = self.forest.parent(node) else { return };
        let Some(group) = self.forest.group_mut(parent) else { return };
        let layout = match group.layout {
            GroupLayout::Tabbed => group.previous_nontab_layout,
            GroupLayout::SplitH => GroupLayout::SplitV,
            GroupLayout::SplitV => GroupLayout::SplitH,
        };
        group.set_layout(layout);
        self.forest.recalc(&mut self.cx, parent);
    }

    fn change_group_ephemerality_on(&mut self, node: NodeId, ephemeral: bool) {
        let Some(group) = self.forest.parent(node).and_then(|p| self.forest.group_mut(p)) else {
            return;
        };
        group.set_ephemeral(if ephemeral {
            Ephemerality::ForceEphemeral
        } else {
            Ephemerality::Standard
        });
    }

    fn focus_monitor(&mut self, monitor: MonitorId) {
        let Some(info) = self.cx.host.monitor(monitor) else { return };
        self.cx.host.set_active_monitor(monitor);
        let focused = info.active_workspace.and_then(|ws| self.forest.workspace_focused_node(ws, false, false));
        if let Some(node) = focused {
            self.forest.focus(&mut self.cx, node);
            return;
        }
        let next = info
            .active_workspace
            .and_then(|ws| self.cx.host.workspace(ws))
            .and_then(|ws| ws.fullscreen_window.or(ws.last_focused_window));
        self.cx.host.focus_window(next);
    }

    fn shift_focus_to_monitor(&mut self, direction: Direction) {
        let Some(active) = self.cx.host.active_monitor() else { return };
        if let Some(target) = self.cx.host.monitor_in_direction(active, direction) {
            self.focus_monitor(target);
        }
    }

    fn node_obscured(&self, node: NodeId) -> bool {
        self.forest
            .get(node)
            .and_then(LayoutNode::window)
            .is_some_and(|window| is_obscured(&*self.cx.host, window))
    }

    fn shift_focus(&mut self, workspace: Option<WorkspaceId>, direction: Direction, visible: bool, layers: Layer) {
        let workspace_info = workspace.and_then(|ws| self.cx.host.workspace(ws));
        let source = match &workspace_info {
            Some(ws) => ws.last_focused_window,
            None if workspace.is_some() => None,
            None => self.cx.host.focused_window(),
        }
        .and_then(|w| self.cx.host.window(w));
        let Some(source) = source.filter(|_| !workspace_info.as_ref().is_some_and(|ws| ws.has_fullscreen()))
        else {
            self.shift_focus_to_monitor(direction);
            return;
        };
        debug!(source = %source.id, floating = source.floating, ?direction, visible, "shifting focus");

        let layers = if layers.is_empty() { Layer::of(&source) } else { layers };
        let skip_obscured = match self.cx.config.general.focus_obscured_windows_policy {
            ObscuredWindowPolicy::Allow => false,
            ObscuredWindowPolicy::Skip => true,
            ObscuredWindowPolicy::SkipWhenMixed => layers.contains(Layer::all()),
        };

        let mut source_node = None;
        let mut candidate = None;
        if layers.contains(Layer::TILED) {
            if source.floating {
                // Heading back lands on the node focus came from; carrying
                // on resumes the tree walk from it.
                match self.overrides.get(self.forest, &source, direction) {
                    Some(node) => {
                        source_node = Some(node);
                        candidate = Some(node);
                    }
                    None => {
                        source_node = self.overrides.get(self.forest, &source, direction.opposite());
                    }
                }
            } else {
                source_node = self.forest.workspace_focused_node(
                    workspace.unwrap_or(source.workspace),
                    false,
                    false,
                );
            }
            if let Some(start) = source_node.filter(|_| candidate.is_none()) {
                candidate = self.forest.shift_or_get_focus(&mut self.cx, start, direction, false, false, visible);
            }
            while let Some(node) = candidate {
                if !skip_obscured || !self.node_obscured(node) {
                    break;
                }
                candidate = self.forest.shift_or_get_focus(&mut self.cx, node, direction, false, false, visible);
            }
        }

        let mut this_monitor = layers & Layer::FLOATING;
        if source.floating && candidate.is_none() {
            this_monitor |= layers & Layer::TILED;
        }
        let other_monitors = if candidate.is_none() { layers } else { Layer::empty() };

        let host = &*self.cx.host;
        let closest = window_in_direction(host, self.cx.config, &source, direction, this_monitor, other_monitors)
            .and_then(|w| host.window(w));

        let origin = source.frame.middle();
        let focus_closest = match (&closest, candidate) {
            (Some(closest), Some(node)) => {
                closest.floating
                    && self.forest.middle(node).is_none_or(|middle| {
                        Distance::new(direction, origin, closest.frame.middle())
                            .is_closer_than(Distance::new(direction, origin, middle))
                    })
            }
            (Some(_), None) => true,
            (None, _) => false,
        };

        let new_monitor = match (closest, candidate) {
            (Some(closest), _) if focus_closest => {
                self.overrides.set(closest.id, direction.opposite(), source_node);
                self.cx.host.focus_window(Some(closest.id));
                Some(closest.monitor)
            }
            (_, Some(node)) => {
                let monitor = match self.forest.get(node).and_then(LayoutNode::window) {
                    Some(window) => self.cx.host.window(window).map(|w| w.monitor),
                    None => {
                        let root = self.forest.root_of(node);
                        let workspace = self.forest.get(root).map(|n| n.workspace);
                        workspace.and_then(|ws| self.cx.host.workspace(ws)).map(|ws| ws.monitor)
                    }
                };
                self.forest.focus_window(&mut self.cx, node);
                let root = self.forest.root_of(node);
                self.forest.recalc(&mut self.cx, root);
                monitor
            }
            _ => {
                self.shift_focus_to_monitor(direction);
                None
            }
        };

        if let Some(monitor) = new_monitor.filter(|&m| m != source.monitor) {
            if self.cx.host.monitor(monitor).is_some() {
                self.cx.host.set_active_monitor(monitor);
            }
        }
    }

    fn move_node_to_workspace(&mut self, origin: WorkspaceId, name: &str, follow: bool) {
        let Some((target_id, target_name)) = self.cx.host.resolve_workspace(name) else {
            error!(name, "cannot move a node to an invalid workspace");
            return;
        };
        if target_id == origin {
            return;
        }

        let node = self.forest.workspace_focused_node(origin, false, false);
        let focused = self.cx.host.focused_window().and_then(|w| self.cx.host.window(w));
        let focused_tiled = focused.as_ref().is_some_and(|w| self.forest.node_for_window(w.id).is_some());
        let origin_ws = node
            .and_then(|n| self.forest.get(n))
            .map(|n| n.workspace)
            .or(focused.as_ref().map(|w| w.workspace))
            .and_then(|ws| self.cx.host.workspace(ws));
        let Some(origin_ws) = origin_ws else { return };

        let target = match self.cx.host.workspace(target_id) {
            Some(target) => target,
            None => {
                info!(workspace = %target_id, name = %target_name, "creating workspace for node move");
                let id = self.cx.host.create_workspace(target_id, &target_name, origin_ws.monitor);
                let Some(target) = self.cx.host.workspace(id) else { return };
                target
            }
        };

        match focused {
            Some(window) if !focused_tiled || window.fullscreen => {
                self.cx.host.move_window_to_workspace(window.id, target.id);
            }
            _ => {
                let Some(node) = node else { return };
                debug!(?node, %origin, target = %target.id, follow, "moving node to workspace");
                match self.forest.remove_from_parent_recursive(node, None) {
                    Ok(detached) => {
                        if let Some(actor) = detached.expand_actor {
                            self.forest.recalc(&mut self.cx, actor);
                        }
                        if let Some(parent) = detached.parent {
                            self.forest.recalc(&mut self.cx, parent);
                        }
                    }
                    Err(err) => {
                        self.cx.report(err);
                        return;
                    }
                }
                self.forest[node].size_ratio = 1.0;
                self.forest.set_workspace_recursive(&mut self.cx, node, target.id);
                if let Err(err) = self.forest.insert_node(&mut self.cx, node) {
                    self.forest.delete(node);
                    self.cx.report(err);
                }
            }
        }

        if !follow {
            return;
        }
        let Some(monitor) = self.cx.host.monitor(target.monitor) else { return };
        if target.special {
            self.cx.host.set_special_workspace(monitor.id, Some(target.id));
        } else if origin_ws.special {
            self.cx.host.set_special_workspace(origin_ws.monitor, None);
        }
        self.cx.host.change_monitor_workspace(monitor.id, target.id);
        if self.cx.config.general.allow_workspace_cycles {
            self.cx.host.remember_previous_workspace(target.id, origin_ws.id);
        }
    }

    fn change_focus(&mut self, workspace: WorkspaceId, shift: FocusShift) {
        let Some(mut node) = self.forest.workspace_focused_node(workspace, false, false) else {
            return;
        };
        match shift {
            FocusShift::Bottom => {}
            FocusShift::Top => {
                let root = self.forest.root_of(node);
                self.forest.focus(&mut self.cx, root);
                return;
            }
            FocusShift::Raise => {
                if let Some(parent) = self.forest.parent(node) {
                    self.forest.focus(&mut self.cx, parent);
                    return;
                }
            }
            FocusShift::Lower => {
                if let Some(child) = self.forest.group(node).and_then(|g| g.focused_child) {
                    self.forest.focus(&mut self.cx, child);
                }
                return;
            }
            FocusShift::Tab | FocusShift::TabNode => {
                if let Some(parent) = self.forest.parent(node) {
                    node = parent;
                }
                while let Some(parent) = self.forest.parent(node) {
                    let tabbed = if shift == FocusShift::Tab { node } else { parent };
                    if self.forest.group(tabbed).is_some_and(|g| g.layout == GroupLayout::Tabbed) {
                        self.forest.focus(&mut self.cx, node);
                        return;
                    }
                    node = parent;
                }
                return;
            }
        }
        while let Some(child) = self.forest.group(node).and_then(|g| g.focused_child) {
            node = child;
        }
        self.forest.focus(&mut self.cx, node);
    }

    fn focus_tab(
        &mut self,
        workspace: WorkspaceId,
        target: TabFocus,
        mouse: TabFocusMousePriority,
        wrap: bool,
    ) {
        let Some(root) = self.forest.workspace_root(workspace) else { return };

        let mut hovered = None;
        if target == TabFocus::MouseLocation || mouse != TabFocusMousePriority::Ignore {
            let cursor = self.cx.host.cursor_position();
            if self.cx.host.window_at(cursor, true).is_none() {
                hovered = self.forest.find_tab_bar_at(&self.cx, root, cursor);
            }
            if hovered.is_none()
                && (target == TabFocus::MouseLocation || mouse == TabFocusMousePriority::Require)
            {
                return;
            }
        }

        let (tab_node, hovered_child) = match hovered {
            Some((group, child)) => (group, Some(child)),
            None => {
                let Some(mut node) = self.forest.workspace_focused_node(workspace, false, false) else {
                    return;
                };
                while !self.is_tabbed(node) {
                    let Some(parent) = self.forest.parent(node) else { break };
                    node = parent;
                }
                if !self.is_tabbed(node) {
                    return;
                }
                (node, None)
            }
        };

        let chosen = match target {
            TabFocus::MouseLocation => hovered_child,
            _ => self.pick_tab(tab_node, target, wrap),
        };
        let Some(mut focus) = chosen else { return };
        while let Some(group) = self.forest.group(focus) {
            match group.focused_child {
                Some(child) if !group.group_focused => focus = child,
                _ => break,
            }
        }
        trace!(?tab_node, ?focus, "focusing tab");
        self.forest.focus(&mut self.cx, focus);
        self.forest.recalc(&mut self.cx, tab_node);
    }

    fn is_tabbed(&self, node: NodeId) -> bool {
        self.forest.group(node).is_some_and(|g| g.layout == GroupLayout::Tabbed)
    }

    fn pick_tab(&self, tab_node: NodeId, target: TabFocus, wrap: bool) -> Option<NodeId> {
        let focused = self.forest.group(tab_node)?.focused_child?;
        let children: Vec<_> = self.forest.children(tab_node).collect();
        if children.len() < 2 {
            return None;
        }
        let current = children.iter().position(|&c| c == focused)?;
        let index = match target {
            TabFocus::Index(index) => index.checked_sub(1)?,
            TabFocus::Left if current == 0 => wrap.then(|| children.len() - 1)?,
            TabFocus::Left => current - 1,
            TabFocus::Right if current + 1 == children.len() => wrap.then_some(0)?,
            TabFocus::Right => current + 1,
            TabFocus::MouseLocation => return None,
        };
        children.get(index).copied()
    }

    fn expand(&mut self, workspace: WorkspaceId, option: ExpandOption, fullscreen: ExpandFullscreenOption) {
        let Some(node) = self.forest.workspace_focused_node(workspace, false, true) else { return };
        debug!(?node, ?option, ?fullscreen, "expand");
        match option {
            ExpandOption::Expand => {
                let Some(parent) = self.forest.parent(node) else {
                    if fullscreen != ExpandFullscreenOption::MaximizeOnly {
                        self.expand_to_fullscreen(node, workspace);
                    }
                    return;
                };
                if let Some(group) = self.forest.group_mut(node) {
                    if !group.group_focused {
                        group.expand_focused = ExpandState::Stack;
                    }
                }
                if let Some(group) = self.forest.group_mut(parent) {
                    group.focused_child = Some(node);
                    group.expand_focused = ExpandState::Latch;
                }
                self.forest.recalc(&mut self.cx, parent);
                if self.forest.parent(parent).is_none()
                    && fullscreen == ExpandFullscreenOption::MaximizeAsFullscreen
                {
                    self.expand_to_fullscreen(node, workspace);
                }
            }
            ExpandOption::Shrink => {
                let Some(group) = self.forest.group_mut(node) else { return };
                group.expand_focused = ExpandState::NotExpanded;
                let child = group.focused_child;
                if let Some(child) = child.and_then(|c| self.forest.group_mut(c)) {
                    child.expand_focused = ExpandState::Latch;
                }
                self.forest.recalc(&mut self.cx, node);
            }
            ExpandOption::Base => {
                if self.forest.get(node).is_some_and(LayoutNode::is_group) {
                    self.forest.collapse_expansions(node);
                    self.forest.recalc(&mut self.cx, node);
                }
            }
            ExpandOption::Maximize | ExpandOption::Fullscreen => {}
        }
    }

    fn expand_to_fullscreen(&mut self, node: NodeId, workspace: WorkspaceId) {
        let Some(window) = self.forest.get(node).and_then(LayoutNode::window) else { return };
        let Some(info) = self.cx.host.window(window) else { return };
        let Some(ws) = self.cx.host.workspace(workspace) else { return };
        if info.fullscreen || ws.special || ws.has_fullscreen() {
            return;
        }
        self.cx.host.set_window_fullscreen(window, true, FullscreenMode::Full);
        self.cx.host.raise_window(window);
        self.recalculate_monitor(ws.monitor);
    }
}
