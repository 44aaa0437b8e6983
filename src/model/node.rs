//! Payload carried by every node of the layout forest.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::tree::NodeId;
use crate::layout_engine::tab_bar::TabBarId;
use crate::layout_engine::{Direction, Orientation};
use crate::sys::geometry::{Rect, Vec2};
use crate::sys::host::{WindowId, WorkspaceId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
pub enum GroupLayout {
    #[strum(to_string = "splith", serialize = "h")]
    SplitH,
    #[strum(to_string = "splitv", serialize = "v")]
    SplitV,
    #[strum(to_string = "tabs", serialize = "tab")]
    Tabbed,
}

impl GroupLayout {
    /// Split layouts divide their space along one axis; tabs do not.
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            GroupLayout::SplitH => Some(Orientation::Horizontal),
            GroupLayout::SplitV => Some(Orientation::Vertical),
            GroupLayout::Tabbed => None,
        }
    }

    pub fn for_direction(direction: Direction) -> GroupLayout {
        match direction.orientation() {
            Orientation::Horizontal => GroupLayout::SplitH,
            Orientation::Vertical => GroupLayout::SplitV,
        }
    }

    /// Whether moving in `direction` travels along this layout. Tabs count
    /// as horizontal.
    pub fn matches(self, direction: Direction) -> bool {
        match self {
            GroupLayout::SplitV => direction.orientation() == Orientation::Vertical,
            GroupLayout::SplitH | GroupLayout::Tabbed => {
                direction.orientation() == Orientation::Horizontal
            }
        }
    }

    pub fn opposite(self) -> GroupLayout {
        match self {
            GroupLayout::SplitH => GroupLayout::SplitV,
            GroupLayout::SplitV | GroupLayout::Tabbed => GroupLayout::SplitH,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandState {
    #[default]
    NotExpanded,
    /// Collapsed onto the focused child chain.
    Latch,
    /// Expanded because a descendant was expanded through it.
    Stack,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Ephemerality {
    #[default]
    Standard,
    /// Ephemeral unless the group already says otherwise.
    Ephemeral,
    ForceEphemeral,
}

impl Ephemerality {
    pub fn makes_ephemeral(self) -> bool { self != Ephemerality::Standard }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupData {
    pub layout: GroupLayout,
    pub previous_nontab_layout: GroupLayout,
    pub focused_child: Option<NodeId>,
    /// The group itself, rather than one of its children, holds focus.
    pub group_focused: bool,
    pub expand_focused: ExpandState,
    /// Removed automatically once it is left with a single child.
    pub ephemeral: bool,
    /// New windows spawned by a contained window's process open next to it.
    pub containment: bool,
    pub tab_bar: Option<TabBarId>,
}

impl GroupData {
    pub fn new(layout: GroupLayout) -> Self {
        GroupData {
            layout,
            previous_nontab_layout: if layout == GroupLayout::Tabbed {
                GroupLayout::SplitH
            } else {
                layout
            },
            focused_child: None,
            group_focused: true,
            expand_focused: ExpandState::NotExpanded,
            ephemeral: false,
            containment: false,
            tab_bar: None,
        }
    }

    pub fn set_layout(&mut self, layout: GroupLayout) {
        self.layout = layout;
        if layout != GroupLayout::Tabbed {
            self.previous_nontab_layout = layout;
        }
    }

    pub fn set_ephemeral(&mut self, ephemerality: Ephemerality) {
        match ephemerality {
            Ephemerality::Standard => self.ephemeral = false,
            Ephemerality::ForceEphemeral => self.ephemeral = true,
            Ephemerality::Ephemeral => {}
        }
    }

    pub fn is_expanded(&self) -> bool { self.expand_focused != ExpandState::NotExpanded }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    Window(WindowId),
    Group(GroupData),
}

impl NodeData {
    pub fn group(layout: GroupLayout) -> Self { NodeData::Group(GroupData::new(layout)) }

    pub fn as_group(&self) -> Option<&GroupData> {
        match self {
            NodeData::Group(group) => Some(group),
            NodeData::Window(_) => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut GroupData> {
        match self {
            NodeData::Group(group) => Some(group),
            NodeData::Window(_) => None,
        }
    }

    pub fn window(&self) -> Option<WindowId> {
        match self {
            NodeData::Window(window) => Some(*window),
            NodeData::Group(_) => None,
        }
    }

    pub fn is_group(&self) -> bool { matches!(self, NodeData::Group(_)) }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
    pub data: NodeData,
    pub position: Vec2,
    pub size: Vec2,
    /// Offsets from the node's box to the window's, on the leading edges.
    pub gap_topleft: Vec2,
    /// Offsets on the trailing edges.
    pub gap_bottomright: Vec2,
    /// Share of the parent's split axis, relative to siblings. A split
    /// group's ratios sum to its child count.
    pub size_ratio: f64,
    pub workspace: WorkspaceId,
    pub hidden: bool,
    /// Being moved into a tree; not a valid insertion anchor or root.
    pub reparenting: bool,
}

impl LayoutNode {
    pub fn new(data: NodeData, workspace: WorkspaceId) -> Self {
        LayoutNode {
            data,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            gap_topleft: Vec2::ZERO,
            gap_bottomright: Vec2::ZERO,
            size_ratio: 1.0,
            workspace,
            hidden: false,
            reparenting: false,
        }
    }

    pub fn rect(&self) -> Rect { Rect::new(self.position, self.size) }

    pub fn set_rect(&mut self, rect: Rect) {
        self.position = rect.origin;
        self.size = rect.size;
    }

    pub fn group(&self) -> Option<&GroupData> { self.data.as_group() }

    pub fn group_mut(&mut self) -> Option<&mut GroupData> { self.data.as_group_mut() }

    pub fn window(&self) -> Option<WindowId> { self.data.window() }

    pub fn is_group(&self) -> bool { self.data.is_group() }
}
