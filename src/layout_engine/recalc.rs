//! Turns size ratios into positions and sizes, top down.

use tracing::trace;

use super::forest::{Forest, LayoutCx};
use crate::common::config::NoGapsWhenOnly;
use crate::common::error::LayoutError;
use crate::model::{ExpandState, GroupLayout, LayoutNode, NodeData, NodeId};
use crate::sys::geometry::{Rect, Round, Vec2};
use crate::sys::host::{Decorations, FullscreenMode, MonitorInfo, WindowPlacement};

impl Forest {
    pub(crate) fn recalc(&mut self, cx: &mut LayoutCx, id: NodeId) { self.recalc_with(cx, id, false) }

    /// Lays out the subtree at `id` inside the node's current box and
    /// pushes the resulting window frames to the host.
    pub(crate) fn recalc_with(&mut self, cx: &mut LayoutCx, id: NodeId, no_animation: bool) {
        let Some(node) = self.get(id).cloned() else { return };
        let gaps = &cx.config.gaps;
        let (mut gap_tl, mut gap_br) = (
            Vec2::new(gaps.outer.left - gaps.inner.left, gaps.outer.top - gaps.inner.top),
            Vec2::new(gaps.outer.right - gaps.inner.right, gaps.outer.bottom - gaps.inner.bottom),
        );

        if let NodeData::Window(window) = node.data {
            let info = cx.host.window(window);
            if info.as_ref().is_some_and(|w| w.fullscreen) {
                let workspace = cx.host.workspace(node.workspace);
                let Some(monitor) = workspace.as_ref().and_then(|ws| cx.host.monitor(ws.monitor))
                else {
                    cx.report(LayoutError::NoMonitor(node.workspace));
                    return;
                };
                if workspace.is_some_and(|ws| ws.fullscreen_mode == FullscreenMode::Full) {
                    cx.host.set_window_frame(window, monitor.frame);
                    return;
                }
                let mut fake = LayoutNode::new(NodeData::Window(window), node.workspace);
                fake.set_rect(monitor.usable_area());
                fake.gap_topleft = gap_tl;
                fake.gap_bottomright = gap_br;
                self.apply_node_data(cx, &fake, false);
                return;
            }
        }

        if self.parent(id).is_some() {
            gap_tl = node.gap_topleft;
            gap_br = node.gap_bottomright;
        }
        let (tpos, tsize) = (node.position, node.size);

        let group = match &node.data {
            NodeData::Window(window) => {
                cx.host.set_window_hidden(*window, node.hidden);
                self.apply_node_data(cx, &node, no_animation);
                return;
            }
            NodeData::Group(group) => group.clone(),
        };

        let children: Vec<_> = self.children(id).collect();
        let count = children.len();
        let orientation = group.layout.orientation();
        let ratio_mul = match orientation {
            Some(o) if count > 0 => (o.along(tsize) - o.along(gap_tl) - o.along(gap_br)) / count as f64,
            _ => 0.0,
        };

        let expanded = group.is_expanded();
        let directly_contains_expanded = expanded
            && group.focused_child.and_then(|c| self.get(c)).is_some_and(|c| {
                c.group().is_none_or(|g| g.expand_focused == ExpandState::NotExpanded)
            });

        if group.layout == GroupLayout::Tabbed {
            let visible_focus = group.focused_child.filter(|&c| self.get(c).is_some_and(|c| !c.hidden));
            if let Some(child) = visible_focus {
                self.set_hidden_recursive(child, false);
                cx.host.damage(Rect::new(tpos, tsize));
            }
        }

        if group.expand_focused == ExpandState::Latch {
            let mut target = group.focused_child;
            while let Some(group) = target.and_then(|t| self.group(t)) {
                if !group.is_expanded() {
                    break;
                }
                target = group.focused_child;
            }
            let Some(target) = target.filter(|&t| self.get(t).is_some()) else {
                cx.report(LayoutError::MissingLatchTarget(id));
                return;
            };
            let hidden = node.hidden;
            let expanded_node = &mut self[target];
            expanded_node.position = tpos;
            expanded_node.size = tsize;
            expanded_node.gap_topleft = gap_tl;
            expanded_node.gap_bottomright = gap_br;
            self.set_hidden_recursive(target, hidden);
            trace!(?id, ?target, "laying out latched expansion");
            self.recalc_with(cx, target, no_animation);
        }

        let tab_offset = cx.config.tabs.height + cx.config.tabs.padding;
        let group_inset = cx.config.general.group_inset;
        let has_parent = self.parent(id).is_some();
        let mut offset = 0.0;

        for (index, &child_id) in children.iter().enumerate() {
            if directly_contains_expanded && Some(child_id) == group.focused_child {
                if orientation.is_some() {
                    offset += self[child_id].size_ratio * ratio_mul;
                }
                continue;
            }

            let child = &mut self[child_id];
            match orientation {
                Some(o) => {
                    let mut position = tpos;
                    *o.along_mut(&mut position) += offset;
                    let mut size = tsize;
                    *o.along_mut(&mut size) = child.size_ratio * ratio_mul;
                    offset += o.along(size);
                    child.hidden = node.hidden || expanded;

                    let (tl_across, br_across) = (o.across(gap_tl), o.across(gap_br));
                    if count == 1 {
                        child.gap_topleft = gap_tl;
                        child.gap_bottomright = gap_br;
                        *o.along_mut(&mut size) = o.along(tsize);
                        if has_parent {
                            *o.along_mut(&mut child.gap_bottomright) += group_inset;
                        }
                    } else if index == 0 {
                        child.gap_topleft = gap_tl;
                        child.gap_bottomright = o.compose(0.0, br_across);
                        *o.along_mut(&mut size) += o.along(gap_tl);
                        offset += o.along(gap_tl);
                    } else if index == count - 1 {
                        child.gap_topleft = o.compose(0.0, tl_across);
                        child.gap_bottomright = gap_br;
                        *o.along_mut(&mut size) += o.along(gap_br);
                    } else {
                        child.gap_topleft = o.compose(0.0, tl_across);
                        child.gap_bottomright = o.compose(0.0, br_across);
                    }
                    child.position = position;
                    child.size = size;
                }
                None => {
                    child.position = tpos;
                    child.size = tsize;
                    child.hidden = node.hidden || expanded || group.focused_child != Some(child_id);
                    child.gap_topleft = gap_tl + Vec2::new(0.0, tab_offset);
                    child.gap_bottomright = gap_br;
                }
            }
            self.recalc_with(cx, child_id, no_animation);
        }

        self.update_tab_bar(cx, id);
    }

    fn monitor_for(&self, cx: &LayoutCx, node: &LayoutNode) -> Option<MonitorInfo> {
        let workspace = cx.host.workspace(node.workspace)?;
        if workspace.special {
            cx.host
                .monitors()
                .into_iter()
                .find(|m| m.active_special_workspace == Some(workspace.id))
        } else {
            cx.host.monitor(workspace.monitor)
        }
    }

    /// Sends the frame of window `node` to the host, applying gaps and the
    /// window's reserved area.
    pub(crate) fn apply_node_data(&self, cx: &mut LayoutCx, node: &LayoutNode, no_animation: bool) {
        let Some(window) = node.window() else { return };
        if self.monitor_for(cx, node).is_none() {
            cx.report(LayoutError::NoMonitor(node.workspace));
            return;
        }
        let Some(info) = cx.host.window(window).filter(|w| w.mapped) else {
            cx.report(LayoutError::UnmappedWindow(window));
            cx.mark_stale(window);
            return;
        };
        let window_workspace = cx.host.workspace(info.workspace);
        let special = window_workspace.as_ref().is_some_and(|ws| ws.special);
        let full_mode = window_workspace.is_some_and(|ws| ws.fullscreen_mode == FullscreenMode::Full);

        let node_box = node.rect().round();
        let only_node = self.workspace_root(info.workspace).is_some_and(|root| {
            let mut children = self.children(root);
            match (children.next(), children.next()) {
                (Some(only), None) => self.get(only).is_some_and(|n| !n.is_group()),
                _ => false,
            }
        });

        let no_gaps = cx.config.general.no_gaps_when_only;
        let drop_gaps = !special
            && ((no_gaps != NoGapsWhenOnly::Off && (only_node || info.fullscreen))
                || (info.fullscreen && full_mode));

        if drop_gaps {
            let frame = node_box.inset(info.reserved_top_left, info.reserved_bottom_right);
            cx.host.apply_window_layout(window, WindowPlacement {
                frame,
                decorations: Decorations {
                    border: no_gaps == NoGapsWhenOnly::KeepBorder,
                    rounding: false,
                    shadow: false,
                },
                warp: false,
            });
            return;
        }

        let inner = &cx.config.gaps.inner;
        let offset_tl = Vec2::new(inner.left, inner.top) + node.gap_topleft;
        let offset_br = Vec2::new(inner.left + inner.right, inner.top + inner.bottom)
            + node.gap_bottomright
            + node.gap_topleft;
        let frame = Rect::new(
            node_box.origin + offset_tl + info.reserved_top_left,
            node_box.size - offset_br - (info.reserved_top_left + info.reserved_bottom_right),
        )
        .round();

        cx.host.apply_window_layout(window, WindowPlacement {
            frame,
            decorations: Decorations::default(),
            warp: no_animation,
        });
        if no_animation {
            cx.host.damage(frame);
        }
    }
}
