//! Drag and drop sessions.
//!
//! The host owns the actual pointer capture and ghost element; the
//! editor tracks which component is in flight, runs the `accepts` veto
//! over every container the drag passes, and rewires the scene on drop.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A container components can be dropped into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropContainer {
    /// The editor root. Only sections live here when sections are
    /// required.
    Root,
    /// A named region of a section.
    Region { parent: Uuid, region: String },
}

/// Where a drop would land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub container: DropContainer,
    /// Insert before this sibling; `None` appends to the container.
    pub before: Option<Uuid>,
}

/// Parameters handed to `accepts` callbacks while a drag hovers a
/// container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropCheck {
    /// The dragged component.
    pub uuid: Uuid,
    /// Whether the dragged component is a section.
    pub section: bool,
    pub target: DropContainer,
    /// The container the drag started from.
    pub source: DropContainer,
    /// The would-be next sibling at the hovered position.
    pub sibling: Option<Uuid>,
}

/// The in-flight drag. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub uuid: Uuid,
    pub section: bool,
    pub source: DropContainer,
    /// The last hovered position that passed the veto.
    pub over: Option<DropTarget>,
}

/// The built-in placement rule: sections drop at the root only, other
/// components drop into regions only.
pub fn default_accepts(check: &DropCheck) -> bool {
    if check.section {
        matches!(check.target, DropContainer::Root)
    } else {
        matches!(check.target, DropContainer::Region { .. })
    }
}
