//! Error types for the editor

use thiserror::Error;
use uuid::Uuid;

use collage_protocol::ProtocolError;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("No component in the scene with uuid {0}")]
    UnknownComponent(Uuid),

    #[error("No insert overlay at index {0}")]
    UnknownOverlay(usize),

    #[error("The clicked overlay is not an insert toggle")]
    NotAToggle,

    #[error("The clicked overlay is not a section menu")]
    NotASectionMenu,

    #[error("The component menu is not open")]
    MenuNotOpen,

    #[error("No empty-state prompt is showing")]
    NoEmptyPrompt,
}
