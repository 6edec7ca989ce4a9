pub mod adapters;
pub mod server;
pub mod tempstore;

#[cfg(test)]
mod tests_handlers;

pub use adapters::{AdapterError, EntityAdapter, FieldRenderer, MemoryAdapter, PlainRenderer};
pub use server::{EditorServer, ServerEvent, WorkspaceError, DIALOG_ID};
pub use tempstore::{InsertAnchor, PendingInsert, StagingEntry, StorageKey, TempstoreRepository};

// Re-export the protocol surface hosts need to drive the server
pub use collage_protocol::{Command, CommandRequest, CommandResponse, Patch};
