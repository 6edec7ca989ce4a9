//! Components and the type catalog they are built from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry describing a kind of component.
///
/// A type with no regions is a content leaf; a type with regions is a
/// layout section whose regions are statically named, in display order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentType {
    pub id: String,
    pub label: String,
    pub regions: Vec<String>,
}

impl ComponentType {
    /// A content leaf type (no regions).
    pub fn leaf(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            regions: Vec::new(),
        }
    }

    /// A layout section type with named regions.
    pub fn section(id: impl Into<String>, label: impl Into<String>, regions: &[&str]) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            regions: regions.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    pub fn is_section(&self) -> bool {
        !self.regions.is_empty()
    }

    pub fn has_region(&self, name: &str) -> bool {
        self.regions.iter().any(|r| r == name)
    }
}

/// The set of component types available to a layout, in menu order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeRegistry {
    types: Vec<ComponentType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type. Re-registering an id replaces the earlier entry.
    pub fn register(&mut self, ty: ComponentType) {
        if let Some(existing) = self.types.iter_mut().find(|t| t.id == ty.id) {
            *existing = ty;
        } else {
            self.types.push(ty);
        }
    }

    pub fn get(&self, id: &str) -> Option<&ComponentType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Regions declared for a type; empty for leaves and unknown types.
    pub fn regions(&self, id: &str) -> &[String] {
        self.get(id).map(|t| t.regions.as_slice()).unwrap_or(&[])
    }

    pub fn is_section(&self, id: &str) -> bool {
        self.get(id).map(|t| t.is_section()).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// One node of a layout tree.
///
/// The uuid and type are fixed at creation; placement (parent and region)
/// is reassigned freely as the component moves through the tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Component {
    uuid: Uuid,
    type_id: String,
    /// Opaque behavior/display settings owned by the entity layer.
    pub settings: serde_json::Value,
    parent: Option<Uuid>,
    region: Option<String>,
}

impl Component {
    /// A new top-level component with a fresh v4 uuid.
    pub fn new(type_id: impl Into<String>) -> Self {
        Self::with_uuid(Uuid::new_v4(), type_id)
    }

    /// A new top-level component with a caller-provided uuid.
    pub fn with_uuid(uuid: Uuid, type_id: impl Into<String>) -> Self {
        Self {
            uuid,
            type_id: type_id.into(),
            settings: serde_json::Value::Null,
            parent: None,
            region: None,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn set_placement(&mut self, parent: Option<Uuid>, region: Option<String>) {
        self.parent = parent;
        self.region = region;
    }
}
