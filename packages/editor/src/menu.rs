//! The component menu.
//!
//! A type picker anchored to the insertion toggle that opened it. While
//! it stays open the editor is modal: hover sampling pauses and the
//! active item cannot change. The drop-beneath-or-flip-above placement
//! matches the legacy editor pixel for pixel.

use uuid::Uuid;

use crate::geometry::{Point, Size, UiRect, Viewport};
use crate::overlay::TogglePlacement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOrientation {
    /// Dropped below the toggle.
    Beneath,
    /// Flipped above it to stay on screen.
    Above,
}

/// An open component menu and the insertion context it will submit.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMenu {
    pub placement: TogglePlacement,
    /// Sibling anchor for before/after, region parent for insert, empty
    /// for the root prompt of an empty editor.
    pub container: Option<Uuid>,
    pub region: Option<String>,
    /// False hides the section group (nesting is disallowed here).
    pub show_sections: bool,
    /// The toggle rect the menu hangs off, kept for repositioning.
    pub anchor: UiRect,
    pub position: Point,
    pub orientation: MenuOrientation,
}

/// Menu placement relative to its toggle: horizontally centered,
/// dropped one and a half button heights down, flipped above when the
/// bottom edge would leave the viewport. Passing `keep_above` pins an
/// already flipped menu above even after the viewport scrolls, so the
/// menu does not jump between orientations mid-interaction.
pub fn menu_position(
    button: UiRect,
    menu: Size,
    padding_bottom: f64,
    viewport: Viewport,
    keep_above: bool,
) -> (Point, MenuOrientation) {
    let left = (button.left + button.width / 2.0 - menu.width / 2.0).floor();
    let beneath_top = (button.top + button.height * 1.5).floor();

    let mut orientation = MenuOrientation::Beneath;
    if keep_above || beneath_top + menu.height > viewport.bottom() {
        orientation = MenuOrientation::Above;
    }

    let top = match orientation {
        MenuOrientation::Beneath => beneath_top,
        MenuOrientation::Above => (button.top - (menu.height - padding_bottom)).floor(),
    };
    (Point::new(left, top), orientation)
}
