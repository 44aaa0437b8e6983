use thiserror::Error;

use crate::model::NodeId;
use crate::sys::host::{WindowId, WorkspaceId};

/// Structural failures detected while editing the layout forest.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("node {node:?} already has a parent ({parent:?})")]
    AlreadyParented { node: NodeId, parent: NodeId },
    #[error("window {0} is already tiled")]
    AlreadyTiled(WindowId),
    #[error("workspace {0} is not valid")]
    InvalidWorkspace(WorkspaceId),
    #[error("workspace {0} has no monitor")]
    NoMonitor(WorkspaceId),
    #[error("node {0:?} is not a group node")]
    NotAGroup(NodeId),
    #[error("node {0:?} is not in the forest")]
    MissingNode(NodeId),
    #[error(
        "unable to remove child node {child:?} from parent node {parent:?}, the parent link is stale"
    )]
    StaleParent { child: NodeId, parent: NodeId },
    #[error("unable to find the expansion target of latched node {0:?}")]
    MissingLatchTarget(NodeId),
    #[error("window {0} is gone or unmapped")]
    UnmappedWindow(WindowId),
}

impl LayoutError {
    /// Whether the user should see this error, not just the log.
    pub fn should_notify(&self) -> bool {
        !matches!(self, LayoutError::AlreadyTiled(_) | LayoutError::InvalidWorkspace(_))
    }
}
