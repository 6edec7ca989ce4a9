//! Editor configuration handed over by the host page.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Host-measured sizes for the chrome the editor positions. The editor
/// cannot measure rendered markup, so the host reports how big its
/// toggle buttons and menus come out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayMetrics {
    pub toggle: Size,
    pub menu: Size,
    /// Bottom padding of the component menu, folded into the flipped
    /// above-the-button position.
    pub menu_padding_bottom: f64,
    pub section_menu: Size,
}

impl Default for OverlayMetrics {
    fn default() -> Self {
        Self {
            toggle: Size::new(24.0, 24.0),
            menu: Size::new(280.0, 360.0),
            menu_padding_bottom: 0.0,
            section_menu: Size::new(220.0, 48.0),
        }
    }
}

/// Per-instance configuration, typically deserialized from the settings
/// blob the server renders alongside the editor markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorSettings {
    /// Root scope the host delegates pointer events under. Opaque to
    /// the editor, which only ever sees scene coordinates.
    pub selector: String,
    /// Server-rendered markup for the component menu shell. The host
    /// paints these fragments at the positions the editor computes.
    pub component_menu: String,
    pub section_menu: String,
    pub controls: String,
    pub toggle_button: String,
    pub empty_container: String,
    /// Base url commands are issued under.
    pub base_url: String,
    /// Whether sections may nest inside other sections. When off, the
    /// component menu hides its section entries anywhere the insertion
    /// point already sits inside a section.
    pub nested_sections: bool,
    /// Whether top-level content must live inside sections. When on,
    /// top-level components offer section prompts instead of plain
    /// insert toggles.
    pub require_sections: bool,
    /// How long the pointer must rest before the hover sample runs.
    pub hover_interval_ms: u64,
    /// How long a status message lingers before it clears itself.
    pub status_interval_ms: u64,
    pub metrics: OverlayMetrics,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            selector: String::new(),
            component_menu: String::new(),
            section_menu: String::new(),
            controls: String::new(),
            toggle_button: String::new(),
            empty_container: String::new(),
            base_url: String::new(),
            nested_sections: true,
            require_sections: false,
            hover_interval_ms: 200,
            status_interval_ms: 3000,
            metrics: OverlayMetrics::default(),
        }
    }
}

impl EditorSettings {
    pub fn hover_interval(&self) -> Duration {
        Duration::from_millis(self.hover_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}
