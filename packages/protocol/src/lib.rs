//! # Collage Protocol
//!
//! The asynchronous command protocol between a Collage editor and its
//! staging workspace.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editor (client)                             │
//! │   builds CommandRequest {path, payload}     │
//! └─────────────────────────────────────────────┘
//!                     ↓ transport (external)
//! ┌─────────────────────────────────────────────┐
//! │ workspace (server)                          │
//! │   parses Command, mutates staging entry,    │
//! │   answers with an ordered Vec<Patch>        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Paths carry the operation**: `{sibling}/insert-sibling/{placement}/{type}` style
//! 2. **Payloads are flat**: string keys to JSON-encoded values, form-submit style
//! 3. **Responses are instructions**: the client applies patches in order
//! 4. **Hooks ride patches**: server-raised events fan out through the client bus

mod command;
mod errors;
mod hooks;
mod patch;

pub use command::{keys, Command, CommandPayload, CommandRequest, Placement};
pub use errors::ProtocolError;
pub use hooks::{HookEvent, ACCEPTS, INSERT_COMPONENT, SAVE, UPDATE_COMPONENT};
pub use patch::{CommandResponse, Fragment, FragmentComponent, Patch, Target};
