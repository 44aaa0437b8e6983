//! The layout forest: every node of every workspace, plus the editing
//! primitives the engine composes into commands.
//!
//! Structure (parent and sibling links) lives in a [`Tree`]; everything else a
//! node carries lives in [`Components`], keyed by the same [`NodeId`]. Node
//! ids are stable for as long as the node exists, so focus overrides and tab
//! bars can hold on to them across edits elsewhere in the forest.

use std::mem;
use std::ops::{Index, IndexMut};

use serde::Serialize;
use slotmap::SecondaryMap;
use tracing::{debug, error, trace, trace_span, warn};

use super::Direction;
use super::tab_bar::TabBars;
use crate::common::collections::HashMap;
use crate::common::config::{CachedWorkspaceFilter, Config};
use crate::common::error::LayoutError;
use crate::model::{
    Ephemerality, ExpandState, GroupData, GroupLayout, LayoutNode, NodeData, NodeId, NodeMap,
    Observer, OwnedNode, Tree,
};
use crate::sys::geometry::{Rect, Vec2, sticks};
use crate::sys::host::{Corner, Host, MonitorInfo, WindowId, WorkspaceId};

const MIN_RATIO: f64 = 0.0;

const ERROR_NOTIFICATION: &str = "Something has gone very wrong. Check the log for details.";

/// Per-node state, kept in sync with the tree through [`Observer`] events.
#[derive(Default)]
pub struct Components {
    nodes: SecondaryMap<NodeId, LayoutNode>,
    windows: HashMap<WindowId, NodeId>,
    tab_bars: TabBars,
}

impl Observer for Components {
    fn added_to_parent(&mut self, _map: &NodeMap, node: NodeId) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.reparenting = false;
        }
    }

    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
        let Some(parent) = node.parent(map) else { return };
        if let Some(group) = self.nodes.get_mut(parent).and_then(LayoutNode::group_mut) {
            if group.focused_child == Some(node) {
                group.focused_child = None;
            }
        }
    }

    fn removed_from_forest(&mut self, _map: &NodeMap, node: NodeId) {
        let Some(removed) = self.nodes.remove(node) else { return };
        match removed.data {
            NodeData::Window(window) => {
                if self.windows.get(&window) == Some(&node) {
                    self.windows.remove(&window);
                }
            }
            NodeData::Group(GroupData { tab_bar: Some(bar), .. }) => {
                self.tab_bars.begin_destroy(bar);
            }
            NodeData::Group(_) => {}
        }
    }
}

/// What a single engine operation works against.
pub struct LayoutCx<'a> {
    pub host: &'a mut dyn Host,
    pub config: &'a Config,
    stale_windows: Vec<WindowId>,
}

impl<'a> LayoutCx<'a> {
    pub fn new(host: &'a mut dyn Host, config: &'a Config) -> Self {
        LayoutCx { host, config, stale_windows: Vec::new() }
    }

    /// Logs `err` and tells the user about it when it points at a bug.
    pub fn report(&mut self, err: LayoutError) {
        error!("{err}");
        if err.should_notify() {
            self.host.notify_error(ERROR_NOTIFICATION);
        }
    }

    /// Queues a tiled window that turned out to be gone for removal once
    /// the current operation finishes.
    pub fn mark_stale(&mut self, window: WindowId) {
        if !self.stale_windows.contains(&window) {
            self.stale_windows.push(window);
        }
    }

    pub fn into_stale(self) -> Vec<WindowId> { self.stale_windows }
}

/// Result of detaching a node from its tree.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Detached {
    /// Closest ancestor that survived, if any.
    pub parent: Option<NodeId>,
    /// Outermost node whose expansion was collapsed and needs a relayout.
    pub expand_actor: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub window: Option<WindowId>,
    pub layout: Option<GroupLayout>,
    pub rect: Rect,
    pub size_ratio: f64,
    pub hidden: bool,
    pub focused: bool,
    pub ephemeral: bool,
    pub containment: bool,
    pub expand: ExpandState,
    pub children: Vec<NodeSnapshot>,
}

pub struct Forest {
    tree: Tree<Components>,
    roots: HashMap<WorkspaceId, OwnedNode>,
    autotile_workspaces: CachedWorkspaceFilter,
}

impl Default for Forest {
    fn default() -> Self { Forest::new() }
}

impl Drop for Forest {
    fn drop(&mut self) { self.clear(); }
}

impl Index<NodeId> for Forest {
    type Output = LayoutNode;

    fn index(&self, id: NodeId) -> &LayoutNode { &self.tree.data.nodes[id] }
}

impl IndexMut<NodeId> for Forest {
    fn index_mut(&mut self, id: NodeId) -> &mut LayoutNode { &mut self.tree.data.nodes[id] }
}

impl Forest {
    pub fn new() -> Self {
        Forest {
            tree: Tree::with_observer(Components::default()),
            roots: HashMap::default(),
            autotile_workspaces: CachedWorkspaceFilter::default(),
        }
    }

    pub fn map(&self) -> &NodeMap { &self.tree.map }

    pub(super) fn tree_mut(&mut self) -> &mut Tree<Components> { &mut self.tree }

    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> { self.tree.data.nodes.get(id) }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        self.tree.data.nodes.get_mut(id)
    }

    pub fn group(&self, id: NodeId) -> Option<&GroupData> { self.get(id)?.group() }

    pub fn group_mut(&mut self, id: NodeId) -> Option<&mut GroupData> { self.get_mut(id)?.group_mut() }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if !self.tree.map.contains(id) {
            return None;
        }
        id.parent(&self.tree.map)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let valid = self.tree.map.contains(id);
        valid.then(|| id.children(&self.tree.map)).into_iter().flatten()
    }

    pub fn child_count(&self, id: NodeId) -> usize { self.children(id).count() }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let valid = self.tree.map.contains(id);
        valid.then(|| id.ancestors(&self.tree.map)).into_iter().flatten()
    }

    pub fn root_of(&self, id: NodeId) -> NodeId { self.ancestors(id).last().unwrap_or(id) }

    pub fn node_for_window(&self, window: WindowId) -> Option<NodeId> {
        self.tree.data.windows.get(&window).copied()
    }

    pub fn tab_bars(&self) -> &TabBars { &self.tree.data.tab_bars }

    pub(crate) fn tab_bars_mut(&mut self) -> &mut TabBars { &mut self.tree.data.tab_bars }

    pub fn workspaces(&self) -> impl Iterator<Item = WorkspaceId> + '_ { self.roots.keys().copied() }

    /// Every node of every tree, attached or not.
    pub fn node_count(&self) -> usize { self.tree.map.len() }

    /// The unique root group of `workspace`.
    pub fn workspace_root(&self, workspace: WorkspaceId) -> Option<NodeId> {
        let root = self.roots.get(&workspace)?.id()?;
        let node = self.get(root)?;
        (node.is_group() && !node.reparenting && node.workspace == workspace).then_some(root)
    }

    /// Follows the focused-child chain down from `id`.
    ///
    /// Stops at a window, at a group without a focused child, at a group
    /// holding focus itself (unless `ignore_group_focus`), or at an expanded
    /// group when `stop_at_expanded` is set.
    pub fn focused_node(&self, id: NodeId, ignore_group_focus: bool, stop_at_expanded: bool) -> NodeId {
        let mut node = id;
        loop {
            let Some(group) = self.group(node) else { return node };
            let Some(child) = group.focused_child.filter(|&c| self.get(c).is_some()) else {
                return node;
            };
            if (!ignore_group_focus && group.group_focused)
                || (stop_at_expanded && group.is_expanded())
            {
                return node;
            }
            node = child;
        }
    }

    pub fn workspace_focused_node(
        &self,
        workspace: WorkspaceId,
        ignore_group_focus: bool,
        stop_at_expanded: bool,
    ) -> Option<NodeId> {
        let root = self.workspace_root(workspace)?;
        Some(self.focused_node(root, ignore_group_focus, stop_at_expanded))
    }

    /// Outermost ancestor reached while parents are expanded.
    pub fn expand_actor(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(parent) = self.parent(node) {
            if !self.group(parent).is_some_and(GroupData::is_expanded) {
                break;
            }
            node = parent;
        }
        node
    }

    /// Whether `node` is a strict descendant of `group`.
    pub fn has_descendant(&self, group: NodeId, node: NodeId) -> bool {
        self.get(group).is_some_and(LayoutNode::is_group)
            && self.ancestors(node).skip(1).any(|ancestor| ancestor == group)
    }

    /// Windows under `id`, in tree order.
    pub fn windows_of(&self, id: NodeId) -> Vec<WindowId> {
        if !self.tree.map.contains(id) {
            return Vec::new();
        }
        id.traverse_preorder(&self.tree.map).filter_map(|n| self.get(n)?.window()).collect()
    }

    pub(crate) fn mk_node(&mut self, data: NodeData, workspace: WorkspaceId) -> NodeId {
        let id = self.tree.mk_node().into_id();
        if let NodeData::Window(window) = data {
            self.tree.data.windows.insert(window, id);
        }
        self.tree.data.nodes.insert(id, LayoutNode::new(data, workspace));
        id
    }

    /// Tiles `window` directly after `sibling`, in the sibling's workspace.
    pub(crate) fn tile_after(&mut self, sibling: NodeId, window: WindowId) -> Option<NodeId> {
        let workspace = self.get(sibling)?.workspace;
        self.parent(sibling)?;
        let id = self.mk_node(NodeData::Window(window), workspace);
        id.detach(&mut self.tree).insert_after(sibling);
        Some(id)
    }

    /// Points window node `id` at a different window.
    pub(crate) fn rebind_window(&mut self, id: NodeId, window: WindowId) {
        let Some(node) = self.tree.data.nodes.get_mut(id) else { return };
        let NodeData::Window(old) = node.data else { return };
        node.data = NodeData::Window(window);
        self.tree.data.windows.remove(&old);
        self.tree.data.windows.insert(window, id);
    }

    pub(crate) fn register_root(&mut self, workspace: WorkspaceId, id: NodeId) {
        if let Some(old) = self.roots.insert(workspace, OwnedNode::own(id, "workspace root")) {
            warn!(%workspace, ?old, "replacing an existing workspace root");
            old.release();
        }
    }

    /// Stops treating `id` as a workspace root without deleting it.
    pub(crate) fn release_root(&mut self, id: NodeId) {
        let workspace = self.roots.iter().find(|(_, root)| root.id() == Some(id)).map(|(ws, _)| *ws);
        if let Some(root) = workspace.and_then(|ws| self.roots.remove(&ws)) {
            root.release();
        }
    }

    /// Deletes `id` and its subtree.
    pub(crate) fn delete(&mut self, id: NodeId) {
        if !self.tree.map.contains(id) {
            return;
        }
        let workspace = self.roots.iter().find(|(_, root)| root.id() == Some(id)).map(|(ws, _)| *ws);
        match workspace.and_then(|ws| self.roots.remove(&ws)) {
            Some(root) => root.remove(&mut self.tree),
            None => id.detach(&mut self.tree).remove(),
        }
    }

    pub fn clear(&mut self) {
        for (_, root) in self.roots.drain() {
            root.remove(&mut self.tree);
        }
    }

    /// Exchanges what two nodes are (window or group, with children),
    /// leaving their ids, geometry and position in the tree in place.
    pub(crate) fn swap_data(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let nodes = &mut self.tree.data.nodes;
        let Some(mut node_a) = nodes.remove(a) else { return };
        let Some(mut node_b) = nodes.remove(b) else {
            nodes.insert(a, node_a);
            return;
        };
        mem::swap(&mut node_a.data, &mut node_b.data);
        for (id, node) in [(a, &node_a), (b, &node_b)] {
            match &node.data {
                NodeData::Window(window) => {
                    self.tree.data.windows.insert(*window, id);
                }
                NodeData::Group(GroupData { tab_bar: Some(bar), .. }) => {
                    self.tree.data.tab_bars.rebind(*bar, id);
                }
                NodeData::Group(_) => {}
            }
        }
        nodes.insert(a, node_a);
        nodes.insert(b, node_b);
        self.tree.map.swap_children(a, b);
    }

    /// Replaces group `id` with its only child, which is deleted.
    pub(crate) fn collapse_into(&mut self, id: NodeId) {
        let Some(child) = self.children(id).next() else { return };
        child.detach(&mut self.tree).orphan();
        self.swap_data(id, child);
        self.delete(child);
    }

    /// Merges a single-child group with its child. Roots are only merged
    /// with group children so that every root stays a group.
    pub(crate) fn swallow_groups(&mut self, into: NodeId) -> bool {
        if !self.get(into).is_some_and(LayoutNode::is_group) || self.child_count(into) != 1 {
            return false;
        }
        let Some(child) = self.children(into).next() else { return false };
        if self.parent(into).is_none() && !self.get(child).is_some_and(LayoutNode::is_group) {
            return false;
        }
        trace!(?child, ?into, "swallowing node");
        self.collapse_into(into);
        true
    }

    pub(crate) fn collapse_expansions(&mut self, id: NodeId) {
        let Some(group) = self.group_mut(id) else { return };
        if !group.is_expanded() {
            return;
        }
        group.expand_focused = ExpandState::NotExpanded;
        let mut node = group.focused_child;
        while let Some(group) = node.and_then(|n| self.group_mut(n)) {
            if group.expand_focused != ExpandState::Stack {
                break;
            }
            group.expand_focused = ExpandState::NotExpanded;
            node = group.focused_child;
        }
    }

    pub(crate) fn set_hidden_recursive(&mut self, id: NodeId, hidden: bool) {
        if !self.tree.map.contains(id) {
            return;
        }
        let subtree: Vec<_> = id.traverse_preorder(&self.tree.map).collect();
        for node in subtree {
            if let Some(node) = self.get_mut(node) {
                node.hidden = hidden;
            }
        }
    }

    fn set_group_focused_recursive(&mut self, id: NodeId) {
        if !self.tree.map.contains(id) {
            return;
        }
        let subtree: Vec<_> = id.traverse_preorder(&self.tree.map).collect();
        for node in subtree {
            if let Some(group) = self.group_mut(node) {
                group.group_focused = true;
            }
        }
    }

    /// Makes `id` the focus of its tree without touching the host's focus.
    pub(crate) fn mark_focused(&mut self, cx: &mut LayoutCx, id: NodeId) {
        if self.get(id).is_some_and(LayoutNode::is_group) {
            self.set_group_focused_recursive(id);
        }
        let mut root = id;
        while let Some(parent) = self.parent(root) {
            if let Some(group) = self.group_mut(parent) {
                group.focused_child = Some(root);
                group.group_focused = false;
            }
            root = parent;
        }
        self.update_decorations(cx, root);
    }

    pub(crate) fn focus(&mut self, cx: &mut LayoutCx, id: NodeId) {
        self.mark_focused(cx, id);
        match self.get(id).map(|n| n.data.window()) {
            Some(Some(window)) => {
                cx.host.set_window_hidden(window, false);
                cx.host.focus_window(Some(window));
            }
            Some(None) => {
                cx.host.focus_window(None);
                self.raise(cx, id);
            }
            None => {}
        }
    }

    /// Makes the first visible window under `id` the focused one in the
    /// tree and returns it.
    pub(crate) fn bring_to_top(&mut self, cx: &mut LayoutCx, id: NodeId) -> Option<WindowId> {
        let node = self.get(id)?;
        match &node.data {
            NodeData::Window(window) => {
                let window = *window;
                self.mark_focused(cx, id);
                cx.host.set_window_hidden(window, false);
                Some(window)
            }
            NodeData::Group(group) if group.layout == GroupLayout::Tabbed => {
                let child = group.focused_child?;
                self.bring_to_top(cx, child)
            }
            NodeData::Group(_) => {
                let children: Vec<_> = self.children(id).collect();
                children.into_iter().find_map(|child| self.bring_to_top(cx, child))
            }
        }
    }

    pub(crate) fn focus_window(&mut self, cx: &mut LayoutCx, id: NodeId) {
        if let Some(window) = self.bring_to_top(cx, id) {
            cx.host.focus_window(Some(window));
        }
    }

    /// Raises every window under `id`.
    pub(crate) fn raise(&self, cx: &mut LayoutCx, id: NodeId) {
        for window in self.windows_of(id) {
            cx.host.raise_window(window);
        }
    }

    pub(crate) fn update_decorations(&mut self, cx: &mut LayoutCx, id: NodeId) {
        match self.get(id).map(|n| n.data.window()) {
            Some(Some(window)) => {
                if cx.host.window(window).is_some_and(|w| w.mapped) {
                    cx.host.refresh_decorations(window);
                }
            }
            Some(None) => {
                let children: Vec<_> = self.children(id).collect();
                for child in children {
                    self.update_decorations(cx, child);
                }
                self.update_tab_bar(cx, id);
            }
            None => {}
        }
    }

    /// Moves `id` and everything under it to `workspace`.
    pub(crate) fn set_workspace_recursive(
        &mut self,
        cx: &mut LayoutCx,
        id: NodeId,
        workspace: WorkspaceId,
    ) {
        if !self.tree.map.contains(id) {
            return;
        }
        let subtree: Vec<_> = id.traverse_preorder(&self.tree.map).collect();
        for node in subtree {
            let Some(node) = self.get_mut(node) else { continue };
            node.workspace = workspace;
            if let Some(window) = node.window() {
                cx.host.move_window_to_workspace(window, workspace);
            }
        }
    }

    /// Detaches `id` from its parent, deleting ancestors left empty and
    /// giving the freed ratio back to the surviving siblings.
    ///
    /// `proxy` is a sibling standing in for `id` at its future location; it
    /// is not counted when ratios are redistributed.
    pub(crate) fn remove_from_parent_recursive(
        &mut self,
        id: NodeId,
        proxy: Option<NodeId>,
    ) -> Result<Detached, LayoutError> {
        let _span = trace_span!("remove_from_parent_recursive", ?id).entered();
        let mut detached = Detached::default();

        if self.parent(id).is_some() {
            let actor = self.expand_actor(id);
            if self.get(actor).is_some_and(LayoutNode::is_group) {
                self.collapse_expansions(actor);
                detached.expand_actor = Some(actor);
            }
        }

        let mut current = id;
        loop {
            let Some(parent) = self.parent(current) else {
                if current == id {
                    self.release_root(id);
                } else {
                    self.delete(current);
                }
                return Ok(detached);
            };
            if !self.get(parent).is_some_and(LayoutNode::is_group) {
                return Err(LayoutError::StaleParent { child: current, parent });
            }

            if self.child_count(parent) > 2 {
                let replacement = match current.prev_sibling(&self.tree.map) {
                    None => current.next_sibling(&self.tree.map),
                    prev => prev,
                };
                if let Some(group) = self.group_mut(parent) {
                    group.group_focused = false;
                    group.focused_child = replacement;
                }
            }

            let ratio = self.get(current).map_or(1.0, |n| n.size_ratio);
            if current == id {
                current.detach(&mut self.tree).orphan();
            } else {
                self.delete(current);
            }

            let remaining: Vec<_> = self.children(parent).collect();
            if let Some(group) = self.group_mut(parent) {
                group.group_focused = false;
                if remaining.len() == 1 {
                    group.focused_child = remaining.first().copied();
                }
            }

            if !remaining.is_empty() {
                let mut count = remaining.len();
                if proxy.is_some_and(|proxy| remaining.contains(&proxy)) {
                    count -= 1;
                }
                if count > 0 {
                    let splitmod = -((1.0 - ratio) / count as f64);
                    for child in remaining {
                        if let Some(child) = self.get_mut(child) {
                            child.size_ratio += splitmod;
                        }
                    }
                }
                detached.parent = Some(parent);
                return Ok(detached);
            }

            current = parent;
        }
    }

    /// Wraps `id` in a new group of `layout`. The group keeps `id`; the
    /// returned node carries what `id` used to be.
    pub(crate) fn into_group(
        &mut self,
        cx: &mut LayoutCx,
        id: NodeId,
        layout: GroupLayout,
        ephemerality: Ephemerality,
    ) -> NodeId {
        let workspace = self.get(id).map_or(WorkspaceId(0), |n| n.workspace);
        let child = self.mk_node(NodeData::group(layout), workspace);
        self.swap_data(id, child);
        if let Some(node) = self.get_mut(id) {
            let mut group = GroupData::new(layout);
            group.group_focused = false;
            group.focused_child = Some(child);
            group.ephemeral = ephemerality.makes_ephemeral();
            node.data = NodeData::Group(group);
        }
        child.detach(&mut self.tree).push_back(id);
        self.recalc(cx, id);
        self.update_tab_bar_recursive(cx, id);
        child
    }

    fn create_root(&mut self, cx: &mut LayoutCx, workspace: WorkspaceId) -> Result<NodeId, LayoutError> {
        let monitor = cx
            .host
            .workspace(workspace)
            .and_then(|ws| cx.host.monitor(ws.monitor))
            .ok_or(LayoutError::NoMonitor(workspace))?;
        let area = monitor.usable_area();
        let layout =
            if area.size.y > area.size.x { GroupLayout::SplitV } else { GroupLayout::SplitH };
        let root = self.mk_node(NodeData::group(layout), workspace);
        self[root].set_rect(area);
        self.register_root(workspace, root);
        debug!(?root, %workspace, ?layout, "created workspace root");

        if !cx.config.general.tab_first_window {
            return Ok(root);
        }
        let tabs = self.mk_node(NodeData::group(GroupLayout::Tabbed), workspace);
        self[tabs].set_rect(area);
        tabs.detach(&mut self.tree).push_back(root);
        Ok(tabs)
    }

    /// Places the parentless node `id` in its workspace's tree, next to
    /// whatever currently holds focus there.
    ///
    /// On error `id` is left detached and the caller decides its fate.
    pub(crate) fn insert_node(&mut self, cx: &mut LayoutCx, id: NodeId) -> Result<(), LayoutError> {
        let _span = trace_span!("insert_node", ?id).entered();
        if let Some(parent) = self.parent(id) {
            return Err(LayoutError::AlreadyParented { node: id, parent });
        }
        let Some(node) = self.get_mut(id) else { return Err(LayoutError::MissingNode(id)) };
        let workspace = node.workspace;
        if cx.host.workspace(workspace).is_none() {
            return Err(LayoutError::InvalidWorkspace(workspace));
        }
        node.reparenting = true;

        let mut opening_after = None;
        if let Some(root) = self.workspace_root(workspace) {
            let mut after = self.focused_node(root, false, false);
            if after == root {
                after = self.into_group(cx, root, GroupLayout::SplitH, Ephemerality::Standard);
            }
            opening_after = Some(after);
        }

        if opening_after.is_none() {
            let last = cx.host.focused_window().and_then(|w| cx.host.window(w));
            match last {
                Some(last)
                    if last.workspace == workspace
                        && !last.floating
                        && self[id].window() != Some(last.id)
                        && last.mapped =>
                {
                    opening_after = self.node_for_window(last.id);
                }
                _ => {
                    let cursor = cx.host.cursor_position();
                    let under_mouse = cx.host.window_at(cursor, false).and_then(|w| cx.host.window(w));
                    if let Some(window) = under_mouse.filter(|w| w.workspace == workspace) {
                        opening_after = self.node_for_window(window.id);
                    }
                }
            }
        }

        if let Some(after) = opening_after {
            let cycles = self[id].is_group() && (after == id || self.has_descendant(id, after));
            let unusable = self.get(after).is_none_or(|n| n.reparenting) || self.parent(after).is_none();
            if cycles || unusable {
                opening_after = None;
            }
        }

        let mut opening_into = match opening_after.and_then(|after| self.parent(after)) {
            Some(parent) => parent,
            None => match self.workspace_root(workspace) {
                Some(root) => root,
                None => self.create_root(cx, workspace)?,
            },
        };

        if !self.get(opening_into).is_some_and(LayoutNode::is_group) {
            return Err(LayoutError::NotAGroup(opening_into));
        }
        if self[opening_into].workspace != workspace {
            warn!(
                ?opening_into,
                into_workspace = %self[opening_into].workspace,
                %workspace,
                "opening point is on a different workspace than the new node"
            );
        }

        if let Some(after) = opening_after {
            if let Some(split) = self.autotile_split(cx.config, opening_into) {
                let ephemerality = if cx.config.autotile.ephemeral_groups {
                    Ephemerality::Ephemeral
                } else {
                    Ephemerality::Standard
                };
                let moved = self.into_group(cx, after, split, ephemerality);
                opening_into = after;
                opening_after = Some(moved);
            }
        }

        self[id].reparenting = false;
        match opening_after {
            Some(after) => id.detach(&mut self.tree).insert_after(after),
            None => id.detach(&mut self.tree).push_back(opening_into),
        };
        debug!(?id, ?opening_after, ?opening_into, "tiled node inserted");

        self.mark_focused(cx, id);
        self.recalc(cx, opening_into);
        Ok(())
    }

    /// Layout of the group an insertion into `group` should first be
    /// wrapped in, if autotiling wants one.
    fn autotile_split(&mut self, config: &Config, group: NodeId) -> Option<GroupLayout> {
        let autotile = &config.autotile;
        if !autotile.enable {
            return None;
        }
        let layout = self.group(group)?.layout;
        let count = self.child_count(group);
        if count <= 1 || layout == GroupLayout::Tabbed {
            return None;
        }
        let workspace = self.get(group)?.workspace;
        if !self.autotile_workspaces.get(&autotile.workspaces).allows(workspace) {
            return None;
        }
        let orientation = layout.orientation()?;
        let trigger = match layout {
            GroupLayout::SplitH => autotile.trigger_width,
            _ => autotile.trigger_height,
        };
        let size_after_addition = orientation.along(self.get(group)?.size) / (count + 1) as f64;
        (trigger >= 0 && (trigger == 0 || size_after_addition < f64::from(trigger)))
            .then(|| layout.opposite())
    }

    /// The sibling that has to give up space when `id` grows towards
    /// `direction`, found at the lowest level where one exists.
    pub(crate) fn find_neighbor(&self, id: NodeId, direction: Direction) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let group = self.group(parent)?;
            if group.layout.orientation() == Some(direction.orientation()) {
                let outer = if direction.is_forward() {
                    self.children(parent).last()
                } else {
                    self.children(parent).next()
                };
                if outer != Some(current) {
                    return if direction.is_forward() {
                        current.next_sibling(&self.tree.map)
                    } else {
                        current.prev_sibling(&self.tree.map)
                    };
                }
            }
            current = parent;
        }
        None
    }

    /// Moves the edge of `id` facing `direction` by `delta` pixels.
    pub(crate) fn resize(
        &mut self,
        cx: &mut LayoutCx,
        id: NodeId,
        direction: Direction,
        delta: f64,
        no_animation: bool,
    ) {
        let Some(parent) = self.parent(id) else { return };
        let Some(group) = self.group(parent) else { return };
        let orientation = direction.orientation();
        if group.layout.orientation() != Some(orientation) {
            return;
        }
        let parent_size = orientation.along(self[parent].size);
        if parent_size <= 0.0 {
            return;
        }
        let mut ratio_mod = delta * self.child_count(parent) as f64 / parent_size;

        let outer = if direction.is_forward() {
            self.children(parent).last()
        } else {
            self.children(parent).next()
        };
        let neighbor = if outer != Some(id) {
            if direction.is_forward() {
                id.next_sibling(&self.tree.map)
            } else {
                ratio_mod = -ratio_mod;
                id.prev_sibling(&self.tree.map)
            }
        } else {
            Some(id)
        };
        let Some(neighbor) = neighbor else { return };

        let requested = self[id].size_ratio + ratio_mod;
        let requested_neighbor = self[neighbor].size_ratio - ratio_mod;
        if requested >= MIN_RATIO && requested_neighbor >= MIN_RATIO {
            self[id].size_ratio = requested;
            self[neighbor].size_ratio = requested_neighbor;
            self.recalc_with(cx, parent, no_animation);
        } else {
            warn!("Requested size ratio {requested} or {requested_neighbor} out of bounds, ignoring");
        }
    }

    /// Resizes `id` by `delta`, choosing which edges move from `corner`
    /// (or, for keyboard resizes, from which monitor edges `id` touches).
    pub(crate) fn execute_resize(
        &mut self,
        cx: &mut LayoutCx,
        id: NodeId,
        delta: Vec2,
        corner: Corner,
        monitor: &MonitorInfo,
    ) {
        let Some(node) = self.get(id) else { return };
        let area = monitor.usable_area();
        let display_left = sticks(node.position.x, area.min().x);
        let display_right = sticks(node.position.x + node.size.x, area.max().x);
        let display_top = sticks(node.position.y, area.min().y);
        let display_bottom = sticks(node.position.y + node.size.y, area.max().y);

        let mut resize_delta = delta;
        let parent = self.parent(id);
        let node_is_root = match node.data {
            NodeData::Group(_) => parent.is_none(),
            NodeData::Window(_) => parent.is_none_or(|p| self.parent(p).is_none()),
        };
        if node_is_root {
            if display_left && display_right {
                resize_delta.x = 0.0;
            }
            if display_top && display_bottom {
                resize_delta.y = 0.0;
            }
        }
        if resize_delta == Vec2::ZERO {
            return;
        }

        let (edge_x, edge_y) = match corner {
            Corner::None => {
                let edge_x = if display_right { Direction::Left } else { Direction::Right };
                let edge_y = if display_bottom { Direction::Up } else { Direction::Down };
                if edge_x == Direction::Left {
                    resize_delta.x = -resize_delta.x;
                }
                if edge_y == Direction::Up {
                    resize_delta.y = -resize_delta.y;
                }
                (edge_x, edge_y)
            }
            Corner::TopLeft => (Direction::Left, Direction::Up),
            Corner::TopRight => (Direction::Right, Direction::Up),
            Corner::BottomLeft => (Direction::Left, Direction::Down),
            Corner::BottomRight => (Direction::Right, Direction::Down),
        };

        let horizontal = self.find_neighbor(id, edge_x);
        let vertical = self.find_neighbor(id, edge_y);
        let no_animation = !cx.config.general.animate_manual_resizes;

        // The neighbour sees the moving edge from the other side.
        if let Some(neighbor) = horizontal {
            self.resize(cx, neighbor, edge_x.opposite(), resize_delta.x, no_animation);
        }
        if let Some(neighbor) = vertical {
            self.resize(cx, neighbor, edge_y.opposite(), resize_delta.y, no_animation);
        }
    }

    /// hy3-style indented dump of the subtree at `id`.
    pub fn debug_node(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else { return format!("missing({id:?})") };
        match &node.data {
            NodeData::Window(window) => {
                format!("window({id:?}) [hypr {window}] size ratio: {}", node.size_ratio)
            }
            NodeData::Group(group) => {
                let mut buf = format!("group({id:?}) [{}] size ratio: {}", group.layout, node.size_ratio);
                if group.is_expanded() {
                    buf.push_str(", has-expanded");
                }
                if group.ephemeral {
                    buf.push_str(", ephemeral");
                }
                if group.containment {
                    buf.push_str(", containment");
                }
                for child in self.children(id) {
                    buf.push_str("\n|-");
                    buf.push_str(&self.debug_node(child).replace('\n', "\n  "));
                }
                buf
            }
        }
    }

    fn ascii_tree(&self, id: NodeId) -> ascii_tree::Tree {
        let status = match self.parent(id) {
            None => "",
            Some(parent) if self.group(parent).and_then(|g| g.focused_child) == Some(id) => "☒ ",
            _ => "☐ ",
        };
        let desc = match self.get(id).map(|n| (&n.data, n.size_ratio)) {
            Some((NodeData::Window(window), ratio)) => format!("{status}{id:?} window {window} ({ratio:.2})"),
            Some((NodeData::Group(group), ratio)) => {
                format!("{status}{id:?} {} ({ratio:.2})", group.layout)
            }
            None => format!("{status}{id:?} <missing>"),
        };
        let children: Vec<_> = self.children(id).map(|c| self.ascii_tree(c)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }

    pub fn draw_tree(&self, id: NodeId) -> String {
        let mut out = String::new();
        match ascii_tree::write_tree(&mut out, &self.ascii_tree(id)) {
            Ok(()) => out,
            Err(_) => String::new(),
        }
    }

    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let node = self.get(id)?;
        let group = node.group();
        let focused = self
            .parent(id)
            .and_then(|p| self.group(p))
            .is_some_and(|g| g.focused_child == Some(id));
        Some(NodeSnapshot {
            window: node.window(),
            layout: group.map(|g| g.layout),
            rect: node.rect(),
            size_ratio: node.size_ratio,
            hidden: node.hidden,
            focused,
            ephemeral: group.is_some_and(|g| g.ephemeral),
            containment: group.is_some_and(|g| g.containment),
            expand: group.map_or(ExpandState::NotExpanded, |g| g.expand_focused),
            children: self.children(id).filter_map(|c| self.snapshot(c)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::fake::FakeHost;

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

        fn ratios(&self, group: NodeId) -> Vec<f64> {
            self.forest.children(group).map(|c| self.forest[c].size_ratio).collect()
        }
    }

    #[test]
    fn first_window_creates_a_root_sized_to_the_monitor() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let root = fx.root();
        assert_eq!(Some(root), fx.forest.parent(w1));
        assert_eq!(GroupLayout::SplitH, fx.forest.group(root).unwrap().layout);
        assert_eq!(Rect::from_xywh(0.0, 0.0, 1920.0, 1080.0), fx.forest[root].rect());
        assert_eq!(Some(w1), fx.forest.node_for_window(WindowId(1)));
    }

    #[test]
    fn tab_first_window_nests_a_tab_group() {
        let mut fx = Fixture::new();
        fx.config.general.tab_first_window = true;
        let w1 = fx.window(1);
        let tabs = fx.forest.parent(w1).unwrap();
        assert_eq!(GroupLayout::Tabbed, fx.forest.group(tabs).unwrap().layout);
        assert_eq!(Some(fx.root()), fx.forest.parent(tabs));
    }

    #[test]
    fn insert_after_focused_node() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        fx.with(|forest, cx| forest.mark_focused(cx, w1));
        let w3 = fx.window(3);
        let root = fx.root();
        assert_eq!(vec![w1, w3, w2], fx.forest.children(root).collect::<Vec<_>>());
        assert_eq!(Some(w3), fx.forest.workspace_focused_node(WS, false, false));
    }

    #[test]
    fn insert_rejects_parented_nodes() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let root = fx.root();
        let err = fx.with(|forest, cx| forest.insert_node(cx, w1)).unwrap_err();
        assert_eq!(LayoutError::AlreadyParented { node: w1, parent: root }, err);
    }

    #[test]
    fn insert_rejects_unknown_workspaces() {
        let mut fx = Fixture::new();
        let node = fx.forest.mk_node(NodeData::Window(WindowId(9)), WorkspaceId(42));
        let err = fx.with(|forest, cx| forest.insert_node(cx, node)).unwrap_err();
        assert_eq!(LayoutError::InvalidWorkspace(WorkspaceId(42)), err);
        fx.forest.delete(node);
    }

    #[test]
    fn autotile_wraps_the_anchor_in_a_perpendicular_group() {
        let mut fx = Fixture::new();
        fx.config.autotile.enable = true;
        fx.config.autotile.trigger_width = 800;
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let root = fx.root();
        assert_eq!(2, fx.forest.child_count(root));

        // 1920 / 3 is below the trigger, so w2 gets split vertically.
        let w3 = fx.window(3);
        assert_eq!(vec![w1, w2], fx.forest.children(root).collect::<Vec<_>>());
        let group = fx.forest.group(w2).unwrap();
        assert_eq!(GroupLayout::SplitV, group.layout);
        assert!(group.ephemeral);
        assert_eq!(Some(w2), fx.forest.parent(w3));
        assert_eq!(Some(WindowId(3)), fx.forest[w3].window());
    }

    #[test]
    fn autotile_respects_workspace_filter() {
        let mut fx = Fixture::new();
        fx.config.autotile.enable = true;
        fx.config.autotile.workspaces = "not:1".to_owned();
        fx.window(1);
        fx.window(2);
        fx.window(3);
        assert_eq!(3, fx.forest.child_count(fx.root()));
    }

    #[test]
    fn removal_redistributes_ratio() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let w3 = fx.window(3);
        let root = fx.root();
        fx.forest[w1].size_ratio = 1.5;
        fx.forest[w2].size_ratio = 0.5;
        fx.forest[w3].size_ratio = 1.0;

        let detached = fx.forest.remove_from_parent_recursive(w1, None).unwrap();
        assert_eq!(Some(root), detached.parent);
        assert_eq!(None, fx.forest.parent(w1));
        // 0.5 of the removed ratio is given back to each survivor.
        assert_eq!(vec![0.75, 1.25], fx.ratios(root));
        let sum: f64 = fx.ratios(root).iter().sum();
        assert!((sum - 2.0).abs() < 1e-9);
        fx.forest.delete(w1);
    }

    #[test]
    fn removal_deletes_emptied_ancestors() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let root = fx.root();
        let inner = fx.with(|forest, cx| forest.into_group(cx, w2, GroupLayout::SplitV, Ephemerality::Standard));
        // w2 is now the group, `inner` holds the window.
        let detached = fx.forest.remove_from_parent_recursive(inner, None).unwrap();
        assert_eq!(Some(root), detached.parent);
        assert!(fx.forest.get(w2).is_none());
        assert_eq!(vec![w1], fx.forest.children(root).collect::<Vec<_>>());
        assert_eq!(Some(w1), fx.forest.group(root).unwrap().focused_child);
        fx.forest.delete(inner);
    }

    #[test]
    fn removing_the_last_window_deletes_the_root() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let detached = fx.forest.remove_from_parent_recursive(w1, None).unwrap();
        assert_eq!(None, detached.parent);
        assert_eq!(None, fx.forest.workspace_root(WS));
        fx.forest.delete(w1);
        assert_eq!(0, fx.forest.node_count());
    }

    #[test]
    fn into_group_then_swallow_restores_identity() {
        let mut fx = Fixture::new();
        fx.window(1);
        let w2 = fx.window(2);
        let inner =
            fx.with(|forest, cx| forest.into_group(cx, w2, GroupLayout::Tabbed, Ephemerality::Standard));
        assert!(fx.forest[w2].is_group());
        assert_eq!(Some(inner), fx.forest.node_for_window(WindowId(2)));

        assert!(fx.forest.swallow_groups(w2));
        assert_eq!(Some(WindowId(2)), fx.forest[w2].window());
        assert_eq!(Some(w2), fx.forest.node_for_window(WindowId(2)));
        assert!(fx.forest.get(inner).is_none());
    }

    #[test]
    fn roots_only_swallow_groups() {
        let mut fx = Fixture::new();
        fx.window(1);
        let root = fx.root();
        assert!(!fx.forest.swallow_groups(root));
        assert!(fx.forest[root].is_group());
    }

    #[test]
    fn collapse_expansions_clears_stacked_chain() {
        let mut fx = Fixture::new();
        fx.window(1);
        let w2 = fx.window(2);
        let root = fx.root();
        fx.with(|forest, cx| forest.into_group(cx, w2, GroupLayout::SplitV, Ephemerality::Standard));
        fx.forest.group_mut(root).unwrap().expand_focused = ExpandState::Latch;
        fx.forest.group_mut(root).unwrap().focused_child = Some(w2);
        fx.forest.group_mut(w2).unwrap().expand_focused = ExpandState::Stack;
        fx.forest.collapse_expansions(root);
        assert!(!fx.forest.group(root).unwrap().is_expanded());
        assert!(!fx.forest.group(w2).unwrap().is_expanded());
    }

    #[test]
    fn resize_moves_ratio_between_neighbours() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let w2 = fx.window(2);
        let root = fx.root();
        fx.with(|forest, cx| forest.resize(cx, w1, Direction::Right, 192.0, true));
        assert_eq!(vec![1.2, 0.8], fx.ratios(root).iter().map(|r| (r * 10.0).round() / 10.0).collect::<Vec<_>>());
        assert_eq!(Some(w2), fx.forest.find_neighbor(w1, Direction::Right));
        assert_eq!(None, fx.forest.find_neighbor(w1, Direction::Left));
        assert_eq!(None, fx.forest.find_neighbor(w1, Direction::Up));
    }

    #[test_log::test]
    fn resize_out_of_bounds_is_ignored() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        fx.window(2);
        let root = fx.root();
        fx.forest[w1].size_ratio = 0.1;
        let w2 = fx.forest.children(root).nth(1).unwrap();
        fx.forest[w2].size_ratio = 1.9;
        fx.with(|forest, cx| forest.resize(cx, w1, Direction::Right, -960.0, true));
        assert_eq!(vec![0.1, 1.9], fx.ratios(root));
    }

    #[test]
    fn debug_node_indents_children() {
        let mut fx = Fixture::new();
        let w1 = fx.window(1);
        let root = fx.root();
        let dump = fx.forest.debug_node(root);
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(2, lines.len());
        assert!(lines[0].starts_with("group("));
        assert!(lines[0].ends_with("[splith] size ratio: 1"));
        assert_eq!(format!("|-window({w1:?}) [hypr 1] size ratio: 1"), lines[1]);
    }

    #[test]
    fn draw_tree_marks_focus() {
        let mut fx = Fixture::new();
        fx.window(1);
        fx.window(2);
        let tree = fx.forest.draw_tree(fx.root());
        assert_eq!(1, tree.matches('☒').count());
        assert_eq!(1, tree.matches('☐').count());
    }
}
