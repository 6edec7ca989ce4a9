//! The trash bin backing delete and undo.
//!
//! Deletions are staged client side: the subtree leaves the scene and
//! waits here until a save confirms it or an undo pops it back. Undo is
//! strictly last-in first-out.

use uuid::Uuid;

use crate::scene::DetachedSubtree;

#[derive(Debug, Default)]
pub struct TrashBin {
    items: Vec<DetachedSubtree>,
}

impl TrashBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DetachedSubtree) {
        self.items.push(item);
    }

    /// The most recent deletion, if any survive.
    pub fn pop(&mut self) -> Option<DetachedSubtree> {
        self.items.pop()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Every trashed component uuid, descendants included, oldest
    /// deletion first. This is the delete set a save submits.
    pub fn collect_uuids(&self) -> Vec<Uuid> {
        self.items
            .iter()
            .flat_map(DetachedSubtree::component_uuids)
            .collect()
    }
}
