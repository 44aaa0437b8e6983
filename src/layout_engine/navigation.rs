//! Directional focus and movement, both inside a tree and between windows
//! on screen.

use tracing::{debug, trace};

use super::Direction;
use super::forest::{Forest, LayoutCx};
use crate::common::collections::HashMap;
use crate::common::config::{Config, ObscuredWindowPolicy};
use crate::model::{GroupLayout, LayoutNode, NodeData, NodeId};
use crate::sys::geometry::{Rect, RectExt, Vec2, sticks};
use crate::sys::host::{Host, Layer, WindowId, WindowInfo};

/// Offset between two points, split into the component along a direction
/// and the one across it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distance {
    primary: f64,
    secondary: f64,
}

impl Distance {
    pub fn new(direction: Direction, from: Vec2, to: Vec2) -> Self {
        let delta = from - to;
        let orientation = direction.orientation();
        Distance {
            primary: orientation.along(delta),
            secondary: orientation.across(delta),
        }
    }

    pub fn is_in_direction(self, direction: Direction) -> bool {
        self.primary.is_sign_negative() == direction.is_forward()
    }

    /// Closer along the direction, or as close and better aligned. Points on
    /// opposite sides never compare.
    pub fn is_closer_than(self, other: Distance) -> bool {
        self.primary.is_sign_negative() == other.primary.is_sign_negative()
            && (self.primary.abs() < other.primary.abs()
                || (self.primary == other.primary && self.secondary.abs() < other.secondary.abs()))
    }
}

/// Where a floating window's focus should re-enter the tiled layout when
/// focus moves back in each direction.
#[derive(Default)]
pub struct FocusOverrides {
    entries: HashMap<WindowId, [Option<NodeId>; 4]>,
}

fn slot(direction: Direction) -> usize {
    match direction {
        Direction::Left => 0,
        Direction::Up => 1,
        Direction::Right => 2,
        Direction::Down => 3,
    }
}

impl FocusOverrides {
    /// Remembers that leaving `window` towards `direction` should land on
    /// `node`. Recorded when focus reached `window` moving the other way.
    pub fn set(&mut self, window: WindowId, direction: Direction, node: Option<NodeId>) {
        self.entries.entry(window).or_default()[slot(direction)] = node;
    }

    /// The override for `window` towards `direction`. Overrides pointing at
    /// nodes that are gone or on another workspace are dropped.
    pub fn get(
        &mut self,
        forest: &Forest,
        window: &WindowInfo,
        direction: Direction,
    ) -> Option<NodeId> {
        let overrides = self.entries.get_mut(&window.id)?;
        let node = overrides[slot(direction)]?;
        if forest.get(node).is_some_and(|n| n.workspace == window.workspace) {
            return Some(node);
        }
        overrides[slot(direction)] = None;
        if overrides.iter().all(Option::is_none) {
            self.entries.remove(&window.id);
        }
        None
    }

    pub fn remove(&mut self, window: WindowId) { self.entries.remove(&window); }

}

/// Whether a floating window above `window` fully covers it.
pub fn is_obscured(host: &dyn Host, window: WindowId) -> bool {
    let Some(info) = host.window(window) else { return false };
    for other in host.windows().iter().rev() {
        if other.id == window {
            if info.floating {
                break;
            }
            continue;
        }
        if other.floating && other.frame.contains_rect(info.frame) {
            return true;
        }
    }
    false
}

/// The closest window from `source` towards `direction`.
///
/// `layers_same` and `layers_other` say which layers count on the source's
/// monitor and on the next monitor over.
pub fn window_in_direction(
    host: &dyn Host,
    config: &Config,
    source: &WindowInfo,
    direction: Direction,
    layers_same: Layer,
    layers_other: Layer,
) -> Option<WindowId> {
    if layers_same.is_empty() && layers_other.is_empty() {
        return None;
    }
    let permit_obscured = match config.general.focus_obscured_windows_policy {
        ObscuredWindowPolicy::Allow => true,
        ObscuredWindowPolicy::Skip => false,
        ObscuredWindowPolicy::SkipWhenMixed => !layers_same.contains(Layer::all()),
    };

    let next_monitor = if layers_other.intersects(Layer::all()) {
        host.monitor_in_direction(source.monitor, direction).and_then(|m| host.monitor(m))
    } else {
        None
    };
    let next_workspace =
        next_monitor.as_ref().and_then(|m| m.active_special_workspace.or(m.active_workspace));

    let is_candidate = |w: &WindowInfo| {
        let layers = if w.monitor == source.monitor { layers_same } else { layers_other };
        layers.contains(Layer::of(w))
            && w.mapped
            && w.focusable
            && !w.hidden
            && (w.pinned || w.workspace == source.workspace || Some(w.workspace) == next_workspace)
    };

    let origin = source.frame.middle();
    let mut best: Option<(WindowInfo, Distance)> = None;
    for window in host.windows() {
        if window.id == source.id || !is_candidate(&window) {
            continue;
        }
        let distance = Distance::new(direction, origin, window.frame.middle());
        let better = match &best {
            Some((_, best)) => distance.is_closer_than(*best),
            None => distance.is_in_direction(direction),
        };
        if better && (permit_obscured || !is_obscured(host, window.id)) {
            best = Some((window, distance));
        }
    }
    let (target, _) = best?;
    debug!(source = %source.id, target = %target.id, ?direction, "closest window in direction");

    // Coming back to a monitor should land where focus left it if that
    // window lines up with the one we found.
    if target.monitor != source.monitor {
        let workspace = next_workspace.and_then(|ws| host.workspace(ws));
        let last = workspace.and_then(|ws| ws.last_focused_window).and_then(|w| host.window(w));
        if let Some(last) = last {
            let (t, l) = (target.frame, last.frame);
            let lines_up = match direction {
                Direction::Left => sticks(t.max().x, l.max().x),
                Direction::Right => sticks(t.origin.x, l.origin.x),
                Direction::Up => sticks(t.max().y, l.max().y),
                Direction::Down => sticks(t.origin.y, l.origin.y),
            };
            if lines_up {
                return Some(last.id);
            }
        }
    }
    Some(target.id)
}

/// Nudges a floating window by the configured step, carrying it over to the
/// neighbouring monitor's workspace when it crosses the edge.
pub fn shift_floating_window(
    host: &mut dyn Host,
    config: &Config,
    window: WindowId,
    direction: Direction,
) {
    let Some(info) = host.window(window) else { return };

    // Assumes monitors are laid out left to right.
    let mut bounds = Vec2::ZERO;
    for monitor in host.monitors() {
        bounds.x = bounds.x.max(monitor.frame.max().x);
        if monitor.id == info.monitor {
            bounds.y = monitor.frame.max().y;
        }
    }

    let mut movement = direction.offset(config.general.kbd_shift_delta);
    let delta = direction.orientation().along(movement);
    let (pos, size) = (info.frame.origin, info.frame.size);
    if pos.x + size.x + delta < 0.0 || pos.x + delta > bounds.x {
        movement.x = 0.0;
    }
    if pos.y + size.y + delta < 0.0 || pos.y + delta > bounds.y {
        movement.y = 0.0;
    }
    if movement == Vec2::ZERO {
        return;
    }

    let mut new_pos = pos + movement;
    let new_monitor = host.monitor_at(new_pos).and_then(|m| host.monitor(m));
    let Some(new_monitor) = new_monitor.filter(|m| m.id != info.monitor) else {
        host.set_window_frame(window, Rect::new(new_pos, size));
        return;
    };
    if new_monitor.active_special_workspace.is_some() {
        return;
    }

    let new_workspace = new_monitor.active_workspace;
    if let (Some(_), Some(previous)) = (new_workspace, host.monitor(info.monitor)) {
        match direction {
            Direction::Left => new_pos.x += new_monitor.frame.size.x,
            Direction::Right => new_pos.x -= previous.frame.size.x,
            Direction::Up => new_pos.y += new_monitor.frame.size.y,
            Direction::Down => new_pos.y -= previous.frame.size.y,
        }
    }
    host.set_window_frame(window, Rect::new(new_pos, size));
    if let Some(workspace) = new_workspace {
        host.move_window_to_workspace(window, workspace);
        if config.general.allow_workspace_cycles {
            host.remember_previous_workspace(workspace, info.workspace);
        }
    }
    host.set_active_monitor(new_monitor.id);
}

/// Position in a group's child list.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Slot {
    Front,
    Back,
    Before(NodeId),
    After(NodeId),
}

impl Forest {
    fn is_window_or_expanded(&self, id: NodeId) -> bool {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Window(_)) => true,
            Some(NodeData::Group(group)) => group.is_expanded(),
            None => false,
        }
    }

    /// The node focus would move to from `node` towards `direction`, or,
    /// when `shift` is set, moves `node` there instead.
    ///
    /// `once` moves the node a single step out of or into a neighbouring
    /// group instead of all the way to the next window. `visible` treats
    /// tab groups as stacks of their visible tab only.
    pub(crate) fn shift_or_get_focus(
        &mut self,
        cx: &mut LayoutCx,
        node: NodeId,
        direction: Direction,
        shift: bool,
        once: bool,
        visible: bool,
    ) -> Option<NodeId> {
        let forward = direction.is_forward();
        let mut break_origin = self.expand_actor(node);
        let mut break_parent = self.parent(break_origin)?;
        let mut has_broken_once = false;

        // Climb until a group oriented along the direction can take the move.
        loop {
            let layout = self.group(break_parent)?.layout;
            if layout.matches(direction) && (!visible || layout != GroupLayout::Tabbed) {
                if once && shift && has_broken_once {
                    break;
                }
                if break_origin != node {
                    has_broken_once = true;
                }
                let edge = if forward {
                    self.children(break_parent).last()
                } else {
                    self.children(break_parent).next()
                };
                if (has_broken_once && once && shift) || edge != Some(break_origin) {
                    break;
                }
            }

            let Some(grandparent) = self.parent(break_parent) else {
                if !shift {
                    return None;
                }
                if layout != GroupLayout::Tabbed && layout.matches(direction) {
                    break;
                }
                let split = GroupLayout::for_direction(direction);
                let contains_node = self.children(break_parent).any(|c| c == node);
                if layout != GroupLayout::Tabbed && self.child_count(break_parent) == 2 && contains_node
                {
                    if let Some(group) = self.group_mut(break_parent) {
                        group.set_layout(split);
                    }
                } else {
                    trace!(root = ?break_parent, ?split, "wrapping workspace root");
                    let workspace = self[break_parent].workspace;
                    let rect = self[break_parent].rect();
                    let new_child = self.mk_node(NodeData::group(split), workspace);
                    self[new_child].set_rect(rect);
                    self.swap_data(break_parent, new_child);
                    new_child.detach(self.tree_mut()).push_back(break_parent);
                    if let Some(group) = self.group_mut(break_parent) {
                        group.group_focused = false;
                        group.focused_child = Some(new_child);
                    }
                    break_origin = new_child;
                }
                break;
            };
            break_origin = break_parent;
            break_parent = grandparent;
        }

        let mut target_group = break_parent;
        let first = self.children(break_parent).next();
        let last = self.children(break_parent).last();
        let insert = if !forward && first == Some(break_origin) {
            if !shift {
                return None;
            }
            Slot::Front
        } else if forward && last == Some(break_origin) {
            if !shift {
                return None;
            }
            Slot::Back
        } else {
            let map = self.map();
            let mut iter = if forward {
                break_origin.next_sibling(map)?
            } else {
                break_origin.prev_sibling(map)?
            };

            if self.is_window_or_expanded(iter) || (shift && once && has_broken_once) {
                if !shift {
                    return Some(self.focused_node(iter, false, false));
                }
                let same_parent = self.parent(node) == Some(target_group);
                match (same_parent, forward) {
                    (true, true) | (false, false) => Slot::After(iter),
                    (true, false) | (false, true) => Slot::Before(iter),
                }
            } else {
                // Descend into the neighbouring groups until a window.
                loop {
                    target_group = iter;
                    let group = self.group(target_group)?;
                    let children: Vec<_> = self.children(target_group).collect();
                    let (Some(&first), Some(&last)) = (children.first(), children.last()) else {
                        return None;
                    };
                    let tabbed = group.layout == GroupLayout::Tabbed;
                    let focused = group.focused_child.filter(|c| children.contains(c));

                    let mut shift_after = false;
                    iter = match focused {
                        Some(focused) if tabbed && !shift => focused,
                        Some(focused) if tabbed && visible => {
                            shift_after = true;
                            focused
                        }
                        _ if group.layout.matches(direction) || (visible && tabbed) => {
                            if forward {
                                first
                            } else {
                                shift_after = true;
                                last
                            }
                        }
                        Some(focused) => {
                            shift_after = true;
                            focused
                        }
                        None => first,
                    };

                    let slot = if shift_after { Slot::After(iter) } else { Slot::Before(iter) };
                    if shift && once {
                        break slot;
                    }
                    if self.is_window_or_expanded(iter) {
                        if shift {
                            break slot;
                        }
                        return Some(self.focused_node(iter, false, false));
                    }
                }
            }
        };

        self.move_node(cx, node, target_group, insert);
        None
    }

    fn move_node(&mut self, cx: &mut LayoutCx, node: NodeId, target_group: NodeId, insert: Slot) {
        debug!(?node, ?target_group, ?insert, "shifting node");
        if self.parent(node) == Some(target_group) {
            let tree = self.tree_mut();
            match insert {
                Slot::Front => {
                    node.detach(tree).push_front(target_group);
                }
                Slot::Back => {
                    node.detach(tree).push_back(target_group);
                }
                Slot::Before(sibling) if sibling != node => {
                    node.detach(tree).insert_before(sibling);
                }
                Slot::After(sibling) if sibling != node => {
                    node.detach(tree).insert_after(sibling);
                }
                Slot::Before(_) | Slot::After(_) => {}
            }
            self.recalc(cx, target_group);
            return;
        }

        // Hold the destination while the old ancestors collapse.
        let workspace = self.get(target_group).map_or(self[node].workspace, |n| n.workspace);
        let placeholder = self.mk_node(NodeData::group(GroupLayout::SplitH), workspace);
        let tree = self.tree_mut();
        match insert {
            Slot::Front => placeholder.detach(tree).push_front(target_group),
            Slot::Back => placeholder.detach(tree).push_back(target_group),
            Slot::Before(sibling) => placeholder.detach(tree).insert_before(sibling),
            Slot::After(sibling) => placeholder.detach(tree).insert_after(sibling),
        };

        let detached = match self.remove_from_parent_recursive(node, Some(placeholder)) {
            Ok(detached) => detached,
            Err(err) => {
                cx.report(err);
                self.delete(placeholder);
                return;
            }
        };
        node.detach(self.tree_mut()).insert_after(placeholder);
        self.delete(placeholder);
        self[node].size_ratio = 1.0;

        if let Some(old_parent) = detached.parent {
            let swallow = self.parent(old_parent).is_some()
                && self.group(old_parent).is_some_and(|g| g.ephemeral)
                && self.child_count(old_parent) == 1
                && !self.has_descendant(old_parent, node);
            if swallow {
                self.swallow_groups(old_parent);
            }
            self.update_tab_bar_recursive(cx, old_parent);
            self.recalc(cx, old_parent);
        }

        self.recalc(cx, target_group);

        let mut target_parent = self.parent(target_group);
        while let Some(parent) = target_parent {
            if !self.swallow_groups(parent) {
                break;
            }
            target_parent = self.parent(parent);
        }

        self.update_tab_bar_recursive(cx, node);
        self.focus(cx, node);

        if let Some(parent) = target_parent.filter(|&p| p != target_group) {
            self.recalc(cx, parent);
        }
    }

    /// Moves `node` towards `direction`. With `once`, a node alone in its
    /// group replaces the group instead of leaving it.
    pub(crate) fn shift_node(
        &mut self,
        cx: &mut LayoutCx,
        node: NodeId,
        direction: Direction,
        once: bool,
        visible: bool,
    ) {
        let parent = self.parent(node);
        match parent {
            Some(parent) if once && self.child_count(parent) == 1 => {
                if self.parent(parent).is_none() {
                    if let Some(group) = self.group_mut(parent) {
                        group.set_layout(GroupLayout::SplitH);
                    }
                } else {
                    self.collapse_into(parent);
                    self.update_tab_bar_recursive(cx, parent);
                }
                self.recalc(cx, parent);
            }
            _ => {
                self.shift_or_get_focus(cx, node, direction, true, once, visible);
            }
        }
    }

    /// Centre of a node's box.
    pub fn middle(&self, id: NodeId) -> Option<Vec2> {
        self.get(id).map(LayoutNode::rect).map(|r| r.middle())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Ephemerality;
    use crate::sys::fake::FakeHost;
    use crate::sys::host::{MonitorId, WorkspaceId};

    const WS: WorkspaceId = WorkspaceId(1);

    struct Fixture {
        forest: Forest,
        host: FakeHost,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                forest: Forest::new(),
                host: FakeHost::default(),
                config: Config::default(),
            }
        }

        fn with<R>(&mut self, f: impl FnOnce(&mut Forest, &mut LayoutCx) -> R) -> R {
            let mut cx = LayoutCx::new(&mut self.host, &self.config);
            f(&mut self.forest, &mut cx)
        }

        fn window(&mut self, id: u64) -> NodeId {
            self.host.add_window(id, WS);
            let node = self.forest.mk_node(NodeData::Window(WindowId(id)), WS);
            self.with(|forest, cx| forest.insert_node(cx, node)).unwrap();
            node
        }

        fn root(&self) -> NodeId { self.forest.workspace_root(WS).unwrap() }

        fn children(&self, id: NodeId) -> Vec<NodeId> { self.forest.children(id).collect() }
    }

    #[test]
    fn distance_ordering() {
        let from = Vec2::new(100.0, 100.0);
        let near = Distance::new(Direction::Right, from, Vec2::new(200.0, 500.0));
        let far = Distance::new(Direction::Right, from, Vec2::new(300.0, 100.0));
        let behind = Distance::new(Direction::Right, from, Vec2::new(50.0, 100.0));
        assert!(near.is_in_direction(Direction::Right));
        assert!(!behind.is_in_direction(Direction::Right));
        assert!(behind.is_in_direction(Direction::Left));
        assert!(near.is_closer_than(far));
        assert!(!far.is_closer_than(near));
        assert!(!behind.is_closer_than(far));

        let aligned = Distance::new(Direction::Right, from, Vec2::new(200.0, 100.0));
        assert!(aligned.is_closer_than(near));
    }

    #[test]
    fn focus_moves_between_siblings() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let found = fx.with(|forest, cx| forest.shift_or_get_focus(cx, w2, Direction::Left, false, false, false));
        assert_eq!(Some(w1), found);
        let found = fx.with(|forest, cx| forest.shift_or_get_focus(cx, w1, Direction::Left, false, false, false));
        assert_eq!(None, found);
        let found = fx.with(|forest, cx| forest.shift_or_get_focus(cx, w1, Direction::Up, false, false, false));
        assert_eq!(None, found);
    }

    #[test]
    fn focus_enters_groups_at_their_focused_child() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let inner = fx.with(|forest, cx| forest.into_group(cx, w2, GroupLayout::SplitV, Ephemerality::Standard));
        fx.with(|forest, cx| forest.mark_focused(cx, inner));
        let w3 = fx.window(3);
        assert_eq!(Some(w2), fx.forest.parent(w3));

        // Moving right along a horizontal split into a vertical group picks
        // its focused child.
        let found = fx.with(|forest, cx| forest.shift_or_get_focus(cx, w1, Direction::Right, false, false, false));
        assert_eq!(Some(w3), found);
        let found = fx.with(|forest, cx| forest.shift_or_get_focus(cx, w3, Direction::Up, false, false, false));
        assert_eq!(Some(inner), found);
    }

    #[test]
    fn shift_reorders_within_a_group() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let w3 = fx.window(3);
        let root = fx.root();
        fx.with(|forest, cx| forest.shift_node(cx, w3, Direction::Left, false, false));
        assert_eq!(vec![w1, w3, w2], fx.children(root));
        assert_eq!(Some(w3), fx.forest.group(root).unwrap().focused_child);
        fx.with(|forest, cx| forest.shift_node(cx, w3, Direction::Left, false, false));
        assert_eq!(vec![w3, w1, w2], fx.children(root));
    }

    #[test]
    fn shift_across_axis_wraps_the_root() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        fx.window(3);
        let root = fx.root();
        fx.with(|forest, cx| forest.shift_node(cx, w1, Direction::Up, false, false));

        let group = fx.forest.group(root).unwrap();
        assert_eq!(GroupLayout::SplitV, group.layout);
        let children = fx.children(root);
        assert_eq!(w1, children[0]);
        let old_root = children[1];
        assert_eq!(GroupLayout::SplitH, fx.forest.group(old_root).unwrap().layout);
        assert_eq!(2, fx.forest.child_count(old_root));
        assert!(fx.forest.children(old_root).any(|c| c == w2));
    }

    #[test]
    fn shift_with_two_children_flips_the_root() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let root = fx.root();
        fx.with(|forest, cx| forest.shift_node(cx, w2, Direction::Up, false, false));
        assert_eq!(GroupLayout::SplitV, fx.forest.group(root).unwrap().layout);
        assert_eq!(vec![w2, w1], fx.children(root));
    }

    #[test]
    fn shift_into_a_group_and_collapse_the_old_one() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let root = fx.root();
        let inner = fx.with(|forest, cx| forest.into_group(cx, w2, GroupLayout::SplitV, Ephemerality::Standard));
        fx.with(|forest, cx| forest.mark_focused(cx, inner));
        let w3 = fx.window(3);

        // w1 moves right into the vertical group, leaving the root with a
        // single group child that is then swallowed.
        fx.with(|forest, cx| forest.shift_node(cx, w1, Direction::Right, false, false));
        assert_eq!(Some(root), fx.forest.parent(w1));
        assert!(fx.forest.get(w2).is_none());
        assert_eq!(GroupLayout::SplitV, fx.forest.group(root).unwrap().layout);
        assert_eq!(vec![inner, w3, w1], fx.children(root));
        assert_eq!(Some(w1), fx.forest.group(root).unwrap().focused_child);
        let sum: f64 = fx.forest.children(root).map(|c| fx.forest[c].size_ratio).sum();
        assert!((sum - 3.0).abs() < 1e-9, "{sum}");
    }

    #[test]
    fn shift_once_out_of_a_single_child_group() {
        let mut fx = Fixture::new();
        fx.window(1);
        let w2 = fx.window(2);
        let inner = fx.with(|forest, cx| forest.into_group(cx, w2, GroupLayout::Tabbed, Ephemerality::Standard));
        fx.with(|forest, cx| forest.shift_node(cx, inner, Direction::Left, true, false));
        assert_eq!(Some(WindowId(2)), fx.forest[w2].window());
        assert!(fx.forest.get(inner).is_none());
    }

    #[test]
    fn overrides_expire_with_their_node() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        fx.host.add_window(9, WS).floating = true;
        let floating = fx.host.window(WindowId(9)).unwrap();
        let mut overrides = FocusOverrides::default();
        overrides.set(WindowId(9), Direction::Left, Some(w1));
        assert_eq!(Some(w1), overrides.get(&fx.forest, &floating, Direction::Left));
        assert_eq!(None, overrides.get(&fx.forest, &floating, Direction::Right));

        fx.forest.remove_from_parent_recursive(w1, None).unwrap();
        fx.forest.delete(w1);
        assert_eq!(None, overrides.get(&fx.forest, &floating, Direction::Left));
        assert!(overrides.entries.is_empty());
    }

    #[test]
    fn obscured_by_covering_floating_window() {
        let mut host = FakeHost::default();
        host.add_window(1, WS).frame = Rect::from_xywh(100.0, 100.0, 200.0, 200.0);
        host.add_window(2, WS).floating = true;
        assert!(is_obscured(&host, WindowId(1)));
        assert!(!is_obscured(&host, WindowId(2)));
        host.window_mut(WindowId(2)).frame = Rect::from_xywh(150.0, 150.0, 50.0, 50.0);
        assert!(!is_obscured(&host, WindowId(1)));
    }

    #[test]
    fn closest_window_prefers_alignment() {
        let config = Config::default();
        let mut host = FakeHost::default();
        host.add_window(1, WS).frame = Rect::from_xywh(0.0, 400.0, 100.0, 100.0);
        host.add_window(2, WS).frame = Rect::from_xywh(500.0, 400.0, 100.0, 100.0);
        host.add_window(3, WS).frame = Rect::from_xywh(500.0, 0.0, 100.0, 100.0);
        host.add_window(4, WS).frame = Rect::from_xywh(900.0, 400.0, 100.0, 100.0);
        let source = host.window(WindowId(1)).unwrap();
        let found = window_in_direction(&host, &config, &source, Direction::Right, Layer::TILED, Layer::empty());
        assert_eq!(Some(WindowId(2)), found);
        let found = window_in_direction(&host, &config, &source, Direction::Left, Layer::TILED, Layer::empty());
        assert_eq!(None, found);
        let found = window_in_direction(&host, &config, &source, Direction::Right, Layer::FLOATING, Layer::empty());
        assert_eq!(None, found);
    }

    #[test]
    fn closest_window_crosses_monitors() {
        let config = Config::default();
        let mut host = FakeHost::default();
        host.add_monitor(MonitorId(1), Rect::from_xywh(1920.0, 0.0, 1920.0, 1080.0));
        host.add_workspace(WorkspaceId(2), MonitorId(1));
        host.add_window(1, WS);
        host.add_window(2, WorkspaceId(2));
        let source = host.window(WindowId(1)).unwrap();
        let found =
            window_in_direction(&host, &config, &source, Direction::Right, Layer::empty(), Layer::TILED);
        assert_eq!(Some(WindowId(2)), found);
    }

    #[test]
    fn floating_windows_move_by_the_configured_step() {
        let config = Config::default();
        let mut host = FakeHost::default();
        host.add_window(1, WS).frame = Rect::from_xywh(100.0, 100.0, 200.0, 200.0);
        shift_floating_window(&mut host, &config, WindowId(1), Direction::Down);
        assert_eq!(Vec2::new(100.0, 120.0), host.window(WindowId(1)).unwrap().frame.origin);
        shift_floating_window(&mut host, &config, WindowId(1), Direction::Left);
        assert_eq!(Vec2::new(80.0, 120.0), host.window(WindowId(1)).unwrap().frame.origin);
    }

    #[test]
    fn floating_windows_cross_to_the_next_monitor() {
        let config = Config::default();
        let mut host = FakeHost::default();
        host.add_monitor(MonitorId(1), Rect::from_xywh(1920.0, 0.0, 1920.0, 1080.0));
        host.add_workspace(WorkspaceId(2), MonitorId(1));
        host.add_window(1, WS).frame = Rect::from_xywh(1910.0, 100.0, 200.0, 200.0);
        shift_floating_window(&mut host, &config, WindowId(1), Direction::Right);
        let info = host.window(WindowId(1)).unwrap();
        assert_eq!(WorkspaceId(2), info.workspace);
        assert_eq!(Some(MonitorId(1)), host.active_monitor);
        assert_eq!(10.0, info.frame.origin.x);
    }
}
