//! Error types for the layout model

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Component not found: {0}")]
    ComponentNotFound(Uuid),

    #[error("Unknown component type: {0}")]
    UnknownType(String),

    #[error("Component {0} already exists in the tree")]
    DuplicateComponent(Uuid),

    #[error("Component {parent} has no region named \"{region}\"")]
    UnknownRegion { parent: Uuid, region: String },

    #[error("Component {0} does not accept nested components")]
    NotASection(Uuid),
}
