//! Hook names and the server-raised hook events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Drop-veto hook: any `false` reply rejects the drop.
pub const ACCEPTS: &str = "accepts";
/// Raised after a save is finalized.
pub const SAVE: &str = "save";
/// Raised after a newly created component's markup lands.
pub const INSERT_COMPONENT: &str = "insertComponent";
/// Raised after an edited component's markup is replaced.
pub const UPDATE_COMPONENT: &str = "updateComponent";

/// A hook invocation the server sends down inside a patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "hook", content = "params", rename_all = "camelCase")]
pub enum HookEvent {
    #[serde(rename_all = "camelCase")]
    Save { layout_id: String },
    #[serde(rename_all = "camelCase")]
    InsertComponent {
        layout_id: String,
        component_uuid: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    UpdateComponent {
        layout_id: String,
        component_uuid: Uuid,
    },
}

impl HookEvent {
    /// The hook name callbacks subscribe to.
    pub fn hook(&self) -> &'static str {
        match self {
            HookEvent::Save { .. } => SAVE,
            HookEvent::InsertComponent { .. } => INSERT_COMPONENT,
            HookEvent::UpdateComponent { .. } => UPDATE_COMPONENT,
        }
    }
}
