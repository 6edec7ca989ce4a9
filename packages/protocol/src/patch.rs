//! # Patches
//!
//! The ordered instruction list a workspace handler answers with. The
//! client applies patches in sequence: content splices first, then hook
//! fan-out, focus, and dialog bookkeeping.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hooks::HookEvent;

/// Where a patch lands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Target {
    Component { uuid: Uuid },
    Region { parent: Uuid, region: String },
    Editor { layout_id: String },
    Selector { css: String },
}

impl Target {
    /// CSS selector form, matching the attributes rendered markup carries.
    pub fn css(&self) -> String {
        match self {
            Target::Component { uuid } => format!("[data-uuid=\"{uuid}\"]"),
            Target::Region { parent, region } => {
                format!("[data-region-uuid=\"{parent}-{region}\"]")
            }
            Target::Editor { layout_id } => format!("[data-lp-editor-id=\"{layout_id}\"]"),
            Target::Selector { css } => css.clone(),
        }
    }
}

/// A component carried inside a fragment. Listed parent-first so a
/// headless view can splice structure without parsing markup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FragmentComponent {
    pub uuid: Uuid,
    pub type_id: String,
    /// Region names in display order; empty for content leaves.
    pub regions: Vec<String>,
    pub parent_uuid: Option<Uuid>,
    pub region: Option<String>,
}

impl FragmentComponent {
    pub fn is_section(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Rendered content plus the components it contains.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fragment {
    pub markup: String,
    pub components: Vec<FragmentComponent>,
}

impl Fragment {
    /// A fragment with no structural content, markup only.
    pub fn markup_only(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            components: Vec::new(),
        }
    }
}

/// One response instruction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Patch {
    Replace { target: Target, content: Fragment },
    InsertBefore { target: Target, content: Fragment },
    InsertAfter { target: Target, content: Fragment },
    Append { target: Target, content: Fragment },
    /// Invoke a view-side method on the target, e.g. `focus`.
    Invoke { target: Target, method: String },
    OpenDialog { id: String, title: String, markup: String },
    CloseDialog { id: String },
    InvokeHook { event: HookEvent },
}

impl Patch {
    /// The conventional move-focus instruction.
    pub fn focus(uuid: Uuid) -> Self {
        Patch::Invoke {
            target: Target::Component { uuid },
            method: "focus".to_string(),
        }
    }
}

/// A full reply to one command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    pub patches: Vec<Patch>,
    /// Staging revision after the command, for lost-update detection.
    pub revision: u64,
}

impl CommandResponse {
    pub fn new(patches: Vec<Patch>, revision: u64) -> Self {
        Self { patches, revision }
    }
}
