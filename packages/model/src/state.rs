//! # Layout State
//!
//! The flat wire description of a layout tree's structure.
//!
//! ## Design
//!
//! - One triple per component: `{uuid, parentUuid, region}`
//! - Order of triples is display order (pre-order, region-grouped)
//! - The description is authoritative only for components it names;
//!   deletions travel in an explicit delete set, never by omission

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One component's placement in a captured description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderedNode {
    pub uuid: Uuid,
    pub parent_uuid: Option<Uuid>,
    pub region: Option<String>,
}

impl OrderedNode {
    pub fn top_level(uuid: Uuid) -> Self {
        Self {
            uuid,
            parent_uuid: None,
            region: None,
        }
    }

    pub fn in_region(uuid: Uuid, parent: Uuid, region: impl Into<String>) -> Self {
        Self {
            uuid,
            parent_uuid: Some(parent),
            region: Some(region.into()),
        }
    }
}

/// A full captured description of a layout tree, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LayoutState {
    nodes: Vec<OrderedNode>,
}

impl LayoutState {
    pub fn new(nodes: Vec<OrderedNode>) -> Self {
        Self { nodes }
    }

    pub fn push(&mut self, node: OrderedNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderedNode> {
        self.nodes.iter()
    }

    pub fn uuids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.nodes.iter().map(|n| n.uuid)
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.nodes.iter().any(|n| n.uuid == uuid)
    }

    pub fn position(&self, uuid: Uuid) -> Option<usize> {
        self.nodes.iter().position(|n| n.uuid == uuid)
    }

    pub fn get(&self, uuid: Uuid) -> Option<&OrderedNode> {
        self.nodes.iter().find(|n| n.uuid == uuid)
    }
}

impl FromIterator<OrderedNode> for LayoutState {
    fn from_iter<I: IntoIterator<Item = OrderedNode>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LayoutState {
    type Item = &'a OrderedNode;
    type IntoIter = std::slice::Iter<'a, OrderedNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
