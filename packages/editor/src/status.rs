//! Status messages shown along the bottom edge of the editor.
//!
//! A message clears itself after the status interval elapses unless the
//! pointer is resting on it, and may carry actions such as the undo
//! button a deletion raises.

/// What a status action does when activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusActionKind {
    /// Pop the most recent deletion and put the component back.
    RestoreComponent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusAction {
    pub label: String,
    pub kind: StatusActionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub actions: Vec<StatusAction>,
}

impl StatusMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(
        text: impl Into<String>,
        label: impl Into<String>,
        kind: StatusActionKind,
    ) -> Self {
        Self {
            text: text.into(),
            actions: vec![StatusAction {
                label: label.into(),
                kind,
            }],
        }
    }
}
