//! # Commands
//!
//! Requests the editor sends to the staging workspace.
//!
//! ## Design
//!
//! - Every command has a stable editor-relative path; hosts prefix the
//!   editor's base url for transport
//! - The payload is a flat map of string keys to JSON-encoded values,
//!   mirroring a form submit
//! - `Command::parse` and `Command::path` round-trip

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ProtocolError;

/// Payload keys shared by both ends of the protocol.
pub mod keys {
    /// The captured layout description.
    pub const LAYOUT_STATE: &str = "layoutParagraphsState";
    /// Uuids to delete when finalizing a save.
    pub const DELETE_COMPONENTS: &str = "deleteComponents";
    /// Form values for the component being submitted.
    pub const COMPONENT_DATA: &str = "componentData";
    /// The staging revision the client last observed.
    pub const REVISION: &str = "revision";
}

/// Which side of a sibling an insert lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    After,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Before => "before",
            Placement::After => "after",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = ProtocolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "before" => Ok(Placement::Before),
            "after" => Ok(Placement::After),
            other => Err(ProtocolError::InvalidPlacement(other.to_string())),
        }
    }
}

/// An operation on one editor's staging entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Builds the staging entry and swaps the rendered field for the editor.
    Init,
    /// Opens the edit form for an existing component.
    EditForm { uuid: Uuid },
    /// Submits the open form for a component.
    SubmitForm { uuid: Uuid },
    /// Creates a component next to an existing sibling.
    InsertSibling {
        sibling: Uuid,
        placement: Placement,
        type_id: String,
    },
    /// Creates a component at the end of a section's region.
    InsertIntoRegion {
        parent: Uuid,
        region: String,
        type_id: String,
    },
    /// Creates a component at the end of the top level.
    InsertComponent { type_id: String },
    /// Finalizes: applies pending deletes, reorders, persists.
    Save,
    /// Discards the staging entry and restores the read view.
    Cancel,
}

impl Command {
    /// The editor-relative request path for this command.
    pub fn path(&self) -> String {
        match self {
            Command::Init => "init".to_string(),
            Command::EditForm { uuid } => format!("edit/{uuid}"),
            Command::SubmitForm { uuid } => format!("edit/{uuid}/submit"),
            Command::InsertSibling {
                sibling,
                placement,
                type_id,
            } => format!("{sibling}/insert-sibling/{placement}/{type_id}"),
            Command::InsertIntoRegion {
                parent,
                region,
                type_id,
            } => format!("{parent}/insert-into-region/{region}/{type_id}"),
            Command::InsertComponent { type_id } => format!("insert-component/{type_id}"),
            Command::Save => "save".to_string(),
            Command::Cancel => "cancel".to_string(),
        }
    }

    /// Parses an editor-relative request path.
    pub fn parse(path: &str) -> Result<Self, ProtocolError> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["init"] => Ok(Command::Init),
            ["save"] => Ok(Command::Save),
            ["cancel"] => Ok(Command::Cancel),
            ["edit", uuid] => Ok(Command::EditForm {
                uuid: parse_uuid(uuid)?,
            }),
            ["edit", uuid, "submit"] => Ok(Command::SubmitForm {
                uuid: parse_uuid(uuid)?,
            }),
            ["insert-component", type_id] => Ok(Command::InsertComponent {
                type_id: (*type_id).to_string(),
            }),
            [sibling, "insert-sibling", placement, type_id] => Ok(Command::InsertSibling {
                sibling: parse_uuid(sibling)?,
                placement: placement.parse()?,
                type_id: (*type_id).to_string(),
            }),
            [parent, "insert-into-region", region, type_id] => Ok(Command::InsertIntoRegion {
                parent: parse_uuid(parent)?,
                region: (*region).to_string(),
                type_id: (*type_id).to_string(),
            }),
            _ => Err(ProtocolError::UnknownPath(path.to_string())),
        }
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid, ProtocolError> {
    raw.parse()
        .map_err(|_| ProtocolError::InvalidUuid(raw.to_string()))
}

/// Flat request body: string keys mapped to JSON-encoded values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CommandPayload {
    entries: BTreeMap<String, String>,
}

impl CommandPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON-encodes a value under a key.
    pub fn insert_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), ProtocolError> {
        let encoded = serde_json::to_string(value).map_err(|source| ProtocolError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.entries.insert(key.to_string(), encoded);
        Ok(())
    }

    /// Decodes a value by key; `None` when the key is absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ProtocolError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|source| ProtocolError::Decode {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One request across the editor/workspace boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandRequest {
    /// Editor-relative path, see [`Command::path`].
    pub path: String,
    pub payload: CommandPayload,
}

impl CommandRequest {
    pub fn new(command: &Command) -> Self {
        Self {
            path: command.path(),
            payload: CommandPayload::new(),
        }
    }

    pub fn command(&self) -> Result<Command, ProtocolError> {
        Command::parse(&self.path)
    }

    /// Full transport url under an editor's base url.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.path)
    }
}
