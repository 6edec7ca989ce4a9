//! Insertion chrome attached to the active item.
//!
//! When a component becomes active it grows a floating controls cluster
//! plus one insertion affordance per edge; an active empty region grows
//! a single centered toggle. The pixel math here reproduces the legacy
//! behavior exactly, off-by-one nudges included, so overlays land on the
//! same spots users already know.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Size, UiRect};

/// Where an insertion point sits relative to its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TogglePlacement {
    Before,
    After,
    Insert,
}

/// Which chrome an insertion point renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// A "+" button that opens the component menu.
    Toggle,
    /// An inline strip of section choices.
    SectionMenu,
}

/// One insertion affordance attached to the active item.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOverlay {
    pub kind: OverlayKind,
    pub placement: TogglePlacement,
    /// Sibling anchor for before/after, region parent for insert, and
    /// absent entirely for the empty-editor prompt.
    pub container: Option<Uuid>,
    pub region: Option<String>,
    /// Whether the insertion point already sits inside a section.
    pub nested: bool,
    pub position: Point,
}

/// The floating edit/move/delete cluster on the active component.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    pub uuid: Uuid,
    /// Pinned to the component's top-left corner.
    pub position: Point,
}

/// Toggle placement: horizontally centered on its container, vertically
/// on the container's midline (insert) or straddling its top or bottom
/// edge with a one pixel nudge toward the container.
pub fn toggle_position(container: UiRect, toggle: Size, placement: TogglePlacement) -> Point {
    let x = (container.left + container.width / 2.0 - toggle.width / 2.0).floor();
    let y = match placement {
        TogglePlacement::Insert => {
            (container.top + container.height / 2.0 - toggle.height / 2.0).floor()
        }
        TogglePlacement::After => {
            (container.top + container.height - toggle.height / 2.0).floor() - 1.0
        }
        TogglePlacement::Before => (container.top - toggle.height / 2.0).floor() - 1.0,
    };
    Point::new(x, y)
}

/// Section strip placement: centered like a toggle but without the one
/// pixel nudge, straddling the top edge for `Before` and the bottom edge
/// otherwise.
pub fn section_menu_position(container: UiRect, menu: Size, placement: TogglePlacement) -> Point {
    let x = (container.left + container.width / 2.0 - menu.width / 2.0).floor();
    let y = match placement {
        TogglePlacement::Before => (container.top - menu.height / 2.0).floor(),
        TogglePlacement::After | TogglePlacement::Insert => {
            (container.top + container.height - menu.height / 2.0).floor()
        }
    };
    Point::new(x, y)
}
