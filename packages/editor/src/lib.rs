//! # Collage Editor
//!
//! Headless client engine for in-place layout editing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host shell: DOM, pointer events, rendering  │
//! └─────────────────────────────────────────────┘
//!                     ↓ rects, clock, input
//! ┌─────────────────────────────────────────────┐
//! │ editor: interaction controller              │
//! │  - Scene projection + hit testing           │
//! │  - Hover activation, insertion chrome       │
//! │  - Component menu, drag sessions, trash     │
//! │  - Command building / patch application     │
//! └─────────────────────────────────────────────┘
//!                     ↓ commands ↑ patches
//! ┌─────────────────────────────────────────────┐
//! │ workspace: staging store + command handlers │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The scene is a projection**: hosts render, measure and report;
//!    the editor never touches a real DOM
//! 2. **Optimistic client**: structural edits apply locally first and
//!    the server snapshot reconciles them
//! 3. **Deletions are staged**: the trash bin holds subtrees until a
//!    save confirms or an undo restores them
//! 4. **Host-driven time**: no timers of its own; the host forwards
//!    instants and the editor decides what fires
//!
//! ## Usage
//!
//! ```rust,ignore
//! use collage_editor::{Editor, EditorSettings, Point};
//!
//! let mut editor = Editor::new("layout-1", EditorSettings::default());
//!
//! // server response from the init command
//! editor.apply_response(&response);
//!
//! // host event loop
//! editor.pointer_moved(Point::new(120.0, 340.0), now);
//! editor.tick(now);
//!
//! // the user picked "text" from the component menu
//! let request = editor.select_component_type("text", now)?;
//! let response = transport.send(&request).await?;
//! editor.apply_response(&response);
//! ```

mod drag;
mod editor;
mod errors;
mod geometry;
mod hooks;
mod menu;
mod overlay;
mod scene;
mod settings;
mod status;
mod timer;
mod trash;

pub use drag::{default_accepts, DragSession, DropCheck, DropContainer, DropTarget};
pub use editor::{ActiveItem, Dialog, Editor, MoveAnimation, MoveOutcome};
pub use errors::EditorError;
pub use geometry::{Point, Size, UiRect, Viewport};
pub use hooks::{HookBus, HookPayload, HookReply};
pub use menu::{menu_position, ComponentMenu, MenuOrientation};
pub use overlay::{
    section_menu_position, toggle_position, Controls, InsertOverlay, OverlayKind, TogglePlacement,
};
pub use scene::{DetachedSubtree, Direction, Scene, SceneId, SceneKind, SceneNode, SpliceAnchor};
pub use settings::{EditorSettings, OverlayMetrics};
pub use status::{StatusAction, StatusActionKind, StatusMessage};
pub use timer::RepeatTimer;
pub use trash::TrashBin;

// Re-export the protocol types hosts handle directly
pub use collage_protocol::{Command, CommandRequest, CommandResponse, Patch};
