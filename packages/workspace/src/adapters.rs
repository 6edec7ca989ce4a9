//! Host boundaries: entity storage and markup rendering.
//!
//! The command handlers stay storage- and markup-agnostic. Hosts plug
//! in an [`EntityAdapter`] that owns the stored field value and a
//! [`FieldRenderer`] that turns trees and components into the opaque
//! markup strings the client splices into the page.
//!
//! [`MemoryAdapter`] and [`PlainRenderer`] are the reference
//! implementations backing the test suites.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;
use uuid::Uuid;

use collage_model::{Component, ComponentType, LayoutTree, TypeRegistry};

/// Failure inside a host adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct AdapterError(pub String);

impl AdapterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Loads and persists the stored field value behind an edit session.
pub trait EntityAdapter: Send + Sync {
    /// The currently stored layout of one entity field. A field that
    /// was never saved loads as an empty layout.
    fn load(&self, entity: &str, field: &str) -> Result<LayoutTree, AdapterError>;

    /// Writes a staged layout back to storage.
    fn persist(&self, entity: &str, field: &str, layout: &LayoutTree) -> Result<(), AdapterError>;
}

/// Renders layouts and components to markup.
pub trait FieldRenderer: Send + Sync {
    /// The interactive editor rendering of the whole field.
    fn editor_view(&self, layout: &LayoutTree) -> String;

    /// The static read-only rendering of the whole field.
    fn read_view(&self, layout: &LayoutTree) -> String;

    /// One rendered component subtree.
    fn component(&self, layout: &LayoutTree, uuid: Uuid) -> String;

    /// The settings form for one component.
    fn edit_form(&self, ty: &ComponentType, component: &Component) -> String;
}

/// In-memory entity storage.
pub struct MemoryAdapter {
    types: TypeRegistry,
    fields: Mutex<HashMap<(String, String), LayoutTree>>,
}

impl MemoryAdapter {
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            fields: Mutex::new(HashMap::new()),
        }
    }

    /// Pre-populates one stored field value.
    pub fn seed(&self, entity: &str, field: &str, layout: LayoutTree) {
        self.fields
            .lock()
            .unwrap()
            .insert((entity.to_string(), field.to_string()), layout);
    }

    /// The stored value, as the last `persist` left it.
    pub fn stored(&self, entity: &str, field: &str) -> Option<LayoutTree> {
        self.fields
            .lock()
            .unwrap()
            .get(&(entity.to_string(), field.to_string()))
            .cloned()
    }
}

impl EntityAdapter for MemoryAdapter {
    fn load(&self, entity: &str, field: &str) -> Result<LayoutTree, AdapterError> {
        let fields = self.fields.lock().unwrap();
        Ok(fields
            .get(&(entity.to_string(), field.to_string()))
            .cloned()
            .unwrap_or_else(|| LayoutTree::new(self.types.clone())))
    }

    fn persist(&self, entity: &str, field: &str, layout: &LayoutTree) -> Result<(), AdapterError> {
        self.fields
            .lock()
            .unwrap()
            .insert((entity.to_string(), field.to_string()), layout.clone());
        Ok(())
    }
}

/// Deterministic text renderer: one bracketed line per component.
pub struct PlainRenderer;

impl PlainRenderer {
    fn line(component: &Component) -> String {
        format!("[{} {}]", component.type_id(), component.uuid())
    }
}

impl FieldRenderer for PlainRenderer {
    fn editor_view(&self, layout: &LayoutTree) -> String {
        layout
            .iter()
            .map(Self::line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn read_view(&self, layout: &LayoutTree) -> String {
        format!("<static>\n{}\n</static>", self.editor_view(layout))
    }

    fn component(&self, layout: &LayoutTree, uuid: Uuid) -> String {
        layout
            .component(uuid)
            .map(Self::line)
            .unwrap_or_default()
    }

    fn edit_form(&self, ty: &ComponentType, component: &Component) -> String {
        format!("<form data-type=\"{}\" data-uuid=\"{}\">", ty.id, component.uuid())
    }
}
