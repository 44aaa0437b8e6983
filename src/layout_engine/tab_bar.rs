//! State for the tab strips drawn above tabbed groups.
//!
//! Bars are plain data; a renderer reads them through
//! [`LayoutEngine::tab_bars`](super::LayoutEngine::tab_bars). A bar that is
//! no longer needed is marked for destruction and dropped on the next
//! [`TabBars::tick`], so the renderer can fade it out in between.

use serde::Serialize;
use slotmap::SlotMap;
use tracing::trace;

use super::forest::{Forest, LayoutCx};
use crate::common::collections::HashSet;
use crate::model::{GroupLayout, NodeData, NodeId};
use crate::sys::geometry::{Rect, Vec2};
use crate::sys::host::{WindowId, WorkspaceId};

slotmap::new_key_type! {
    pub struct TabBarId;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TabEntry {
    pub node: NodeId,
    pub title: String,
    pub focused: bool,
    pub urgent: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TabBar {
    pub group: NodeId,
    pub rect: Rect,
    pub entries: Vec<TabEntry>,
    /// Window the bar is drawn over.
    pub target_window: Option<WindowId>,
    pub workspace: Option<WorkspaceId>,
    pub hidden: bool,
    destroying: bool,
}

impl TabBar {
    fn new(group: NodeId) -> Self {
        TabBar {
            group,
            rect: Rect::default(),
            entries: Vec::new(),
            target_window: None,
            workspace: None,
            hidden: false,
            destroying: false,
        }
    }

    pub fn is_destroying(&self) -> bool { self.destroying }

    /// Index of the tab under horizontal position `x`. Tabs share the bar equally.
    pub fn entry_at(&self, x: f64) -> Option<usize> {
        if self.entries.is_empty() || self.rect.size.x <= 0.0 {
            return None;
        }
        let offset = x - self.rect.origin.x;
        if offset < 0.0 || offset >= self.rect.size.x {
            return None;
        }
        let width = self.rect.size.x / self.entries.len() as f64;
        Some(((offset / width) as usize).min(self.entries.len() - 1))
    }
}

#[derive(Default)]
pub struct TabBars {
    bars: SlotMap<TabBarId, TabBar>,
}

impl TabBars {
    fn create(&mut self, group: NodeId) -> TabBarId { self.bars.insert(TabBar::new(group)) }

    pub fn get(&self, id: TabBarId) -> Option<&TabBar> { self.bars.get(id) }

    /// Points a bar at the node now carrying its group.
    pub(super) fn rebind(&mut self, id: TabBarId, group: NodeId) {
        if let Some(bar) = self.bars.get_mut(id) {
            bar.group = group;
        }
    }

    pub fn begin_destroy(&mut self, id: TabBarId) {
        if let Some(bar) = self.bars.get_mut(id) {
            bar.destroying = true;
        }
    }

    /// Drops bars marked for destruction. Returns how many were dropped.
    pub fn tick(&mut self) -> usize {
        let before = self.bars.len();
        self.bars.retain(|_, bar| !bar.destroying);
        before - self.bars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabBarId, &TabBar)> { self.bars.iter() }

    pub fn len(&self) -> usize { self.bars.len() }

    pub fn is_empty(&self) -> bool { self.bars.is_empty() }
}

impl Forest {
    pub fn title(&self, cx: &LayoutCx, id: NodeId) -> String {
        let Some(node) = self.get(id) else { return String::new() };
        match &node.data {
            NodeData::Window(window) => cx.host.window(*window).map(|w| w.title).unwrap_or_default(),
            NodeData::Group(group) => {
                let prefix = match group.layout {
                    GroupLayout::SplitH => "[H] ",
                    GroupLayout::SplitV => "[V] ",
                    GroupLayout::Tabbed => "[T] ",
                };
                let rest = match group.focused_child {
                    Some(child) => self.title(cx, child),
                    None => "Group".to_owned(),
                };
                format!("{prefix}{rest}")
            }
        }
    }

    pub fn is_urgent(&self, cx: &LayoutCx, id: NodeId) -> bool {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Window(window)) => cx.host.window(*window).is_some_and(|w| w.urgent),
            Some(NodeData::Group(_)) => self.children(id).any(|child| self.is_urgent(cx, child)),
            None => false,
        }
    }

    /// Windows of `id` that can currently be seen: only the focused child of
    /// a tabbed group contributes.
    fn visible_windows(&self, id: NodeId, out: &mut HashSet<WindowId>) {
        match self.get(id).map(|n| &n.data) {
            Some(NodeData::Window(window)) => {
                out.insert(*window);
            }
            Some(NodeData::Group(group)) if group.layout == GroupLayout::Tabbed => {
                if let Some(child) = group.focused_child {
                    self.visible_windows(child, out);
                }
            }
            Some(NodeData::Group(_)) => {
                for child in self.children(id) {
                    self.visible_windows(child, out);
                }
            }
            None => {}
        }
    }

    fn top_window_in(&self, cx: &LayoutCx, id: NodeId) -> Option<WindowId> {
        let mut visible = HashSet::default();
        self.visible_windows(id, &mut visible);
        cx.host.windows().into_iter().rev().map(|w| w.id).find(|w| visible.contains(w))
    }

    /// Creates, refreshes or retires the tab bar of group `id`.
    pub(crate) fn update_tab_bar(&mut self, cx: &LayoutCx, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let Some(group) = node.group() else { return };

        if group.layout != GroupLayout::Tabbed {
            if let Some(bar) = group.tab_bar {
                trace!(?id, "retiring tab bar");
                self.tab_bars_mut().begin_destroy(bar);
                if let Some(group) = self.group_mut(id) {
                    group.tab_bar = None;
                }
            }
            return;
        }

        let focused_child = group.focused_child;
        let existing = group.tab_bar;
        let inner = cx.config.gaps.inner;
        let origin = node.position + node.gap_topleft + Vec2::new(inner.left, inner.top);
        let width = node.size.x - node.gap_topleft.x - node.gap_bottomright.x - inner.left - inner.right;
        let rect = Rect::new(origin, Vec2::new(width.max(0.0), cx.config.tabs.height));
        let hidden = node.hidden;

        let entries = self
            .children(id)
            .map(|child| TabEntry {
                node: child,
                title: self.title(cx, child),
                focused: Some(child) == focused_child,
                urgent: self.is_urgent(cx, child),
            })
            .collect();
        let target_window = self.top_window_in(cx, id);
        let workspace = target_window.and_then(|w| cx.host.window(w)).map(|w| w.workspace);

        let bar_id = match existing.filter(|&bar| self.tab_bars().get(bar).is_some()) {
            Some(bar) => bar,
            None => {
                let bar = self.tab_bars_mut().create(id);
                if let Some(group) = self.group_mut(id) {
                    group.tab_bar = Some(bar);
                }
                bar
            }
        };
        if let Some(bar) = self.tab_bars_mut().bars.get_mut(bar_id) {
            bar.rect = rect;
            bar.entries = entries;
            bar.target_window = target_window;
            if workspace.is_some() {
                bar.workspace = workspace;
            }
            bar.hidden = hidden;
        }
    }

    /// Refreshes the tab bars of `id` and all of its ancestors.
    pub(crate) fn update_tab_bar_recursive(&mut self, cx: &LayoutCx, id: NodeId) {
        let chain: Vec<_> = self.ancestors(id).collect();
        for node in chain {
            self.update_tab_bar(cx, node);
        }
    }

    /// Finds the tab under `pos`, returning the tabbed group and the child
    /// whose tab was hit.
    pub(crate) fn find_tab_bar_at(
        &self,
        cx: &LayoutCx,
        id: NodeId,
        pos: Vec2,
    ) -> Option<(NodeId, NodeId)> {
        let node = self.get(id)?;
        let group = node.group()?;
        if node.hidden {
            return None;
        }
        let max = node.position + node.size;
        if node.position.x > pos.x || node.position.y > pos.y || max.x < pos.x || max.y < pos.y {
            return None;
        }

        if group.layout == GroupLayout::Tabbed {
            if let Some(bar) = group.tab_bar.and_then(|bar| self.tab_bars().get(bar)) {
                let gaps = &cx.config.gaps;
                let edge_gap =
                    if self.parent(id).is_none() { gaps.outer.left } else { gaps.inner.left };
                let inset = cx.config.tabs.height + cx.config.tabs.padding + edge_gap;
                if pos.y < node.position.y + node.gap_topleft.y + inset {
                    let hit = bar.entry_at(pos.x).and_then(|index| self.children(id).nth(index));
                    if let Some(child) = hit {
                        return Some((id, child));
                    }
                }
            }
            return group.focused_child.and_then(|child| self.find_tab_bar_at(cx, child, pos));
        }

        self.children(id).find_map(|child| self.find_tab_bar_at(cx, child, pos))
    }
}
