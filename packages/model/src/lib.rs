//! # Collage Model
//!
//! Core layout tree for Collage: content components arranged into nested
//! sections and named regions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: LayoutTree + reconciliation          │
//! │  - Arena of components keyed by uuid        │
//! │  - Canonical pre-order, region-grouped      │
//! │  - Capture/apply flat ordered descriptions  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: scene projection + interaction      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ workspace: staging store + command handlers │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: rendered views are derived projections
//! 2. **Flat wire format**: ordering travels as (uuid, parentUuid, region) triples
//! 3. **Lenient reconciliation**: an orphaned parent reference degrades to top level
//! 4. **Deletions are explicit**: omission from a description never deletes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use collage_model::{Component, ComponentType, LayoutTree, TypeRegistry};
//!
//! let mut types = TypeRegistry::new();
//! types.register(ComponentType::section("two_column", "Two columns", &["left", "right"]));
//! types.register(ComponentType::leaf("text", "Text"));
//!
//! let mut tree = LayoutTree::new(types);
//! let section = tree.append(Component::new("two_column"))?;
//! tree.insert_into_region(section, "left", Component::new("text"))?;
//!
//! // Round-trip the order through the wire format.
//! let state = tree.capture_state();
//! tree.apply_state(&state);
//! ```

mod component;
mod errors;
mod state;
mod tree;

pub use component::{Component, ComponentType, TypeRegistry};
pub use errors::ModelError;
pub use state::{LayoutState, OrderedNode};
pub use tree::LayoutTree;
