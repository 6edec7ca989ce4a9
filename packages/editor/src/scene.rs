//! The scene: a headless projection of the rendered editor.
//!
//! Hosts render real markup; the editor keeps this parallel tree of
//! component, region and placeholder nodes with host-reported
//! rectangles. Hit testing, ordering snapshots and structural edits all
//! run against the scene, which makes every interaction testable
//! without a browser.
//!
//! Structure is strict: component nodes parent region nodes, region
//! nodes parent component nodes, and the root list holds top-level
//! components. Placeholders are invisible stand-ins that hold a deleted
//! component's slot so an undo can put it back.

use std::collections::HashMap;

use uuid::Uuid;

use collage_model::{LayoutState, OrderedNode};
use collage_protocol::{Fragment, FragmentComponent, Placement};

use crate::drag::{DropContainer, DropTarget};
use crate::geometry::{Point, UiRect};

/// Identifier of one scene node. Never reused within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

/// Sibling traversal direction, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneKind {
    Component {
        uuid: Uuid,
        type_id: String,
        section: bool,
    },
    Region {
        name: String,
    },
    /// Invisible marker left behind by a deletion.
    Placeholder {
        uuid: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    id: SceneId,
    kind: SceneKind,
    rect: UiRect,
    visible: bool,
    parent: Option<SceneId>,
    children: Vec<SceneId>,
}

impl SceneNode {
    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn kind(&self) -> &SceneKind {
        &self.kind
    }

    pub fn rect(&self) -> UiRect {
        self.rect
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn parent(&self) -> Option<SceneId> {
        self.parent
    }

    pub fn children(&self) -> &[SceneId] {
        &self.children
    }

    /// Component or placeholder uuid; regions have none.
    pub fn uuid(&self) -> Option<Uuid> {
        match &self.kind {
            SceneKind::Component { uuid, .. } | SceneKind::Placeholder { uuid } => Some(*uuid),
            SceneKind::Region { .. } => None,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self.kind, SceneKind::Component { .. })
    }

    pub fn is_region(&self) -> bool {
        matches!(self.kind, SceneKind::Region { .. })
    }
}

/// A subtree lifted out of the scene by a deletion, restorable as long
/// as its placeholder survives.
#[derive(Debug, Clone)]
pub struct DetachedSubtree {
    root: SceneId,
    uuid: Uuid,
    nodes: HashMap<SceneId, SceneNode>,
}

impl DetachedSubtree {
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Every component uuid in the subtree, root first in document
    /// order. This is what a save reports as pending deletions.
    pub fn component_uuids(&self) -> Vec<Uuid> {
        let mut uuids = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                if let SceneKind::Component { uuid, .. } = &node.kind {
                    uuids.push(*uuid);
                }
                stack.extend(node.children.iter().rev().copied());
            }
        }
        uuids
    }
}

/// Where a server fragment splices into the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceAnchor {
    Before(Uuid),
    After(Uuid),
    RegionEnd { parent: Uuid, region: String },
    RootEnd,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: HashMap<SceneId, SceneNode>,
    roots: Vec<SceneId>,
    next_id: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fragment(fragment: &Fragment) -> Self {
        let mut scene = Self::new();
        scene.splice_fragment(&SpliceAnchor::RootEnd, fragment);
        scene
    }

    /// Drops everything and rebuilds from a full editor fragment.
    pub fn reset_from_fragment(&mut self, fragment: &Fragment) {
        self.nodes.clear();
        self.roots.clear();
        self.splice_fragment(&SpliceAnchor::RootEnd, fragment);
    }

    pub fn node(&self, id: SceneId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn roots(&self) -> &[SceneId] {
        &self.roots
    }

    pub fn component_node(&self, uuid: Uuid) -> Option<SceneId> {
        self.nodes.values().find_map(|node| match &node.kind {
            SceneKind::Component { uuid: u, .. } if *u == uuid => Some(node.id),
            _ => None,
        })
    }

    pub fn placeholder_node(&self, uuid: Uuid) -> Option<SceneId> {
        self.nodes.values().find_map(|node| match &node.kind {
            SceneKind::Placeholder { uuid: u } if *u == uuid => Some(node.id),
            _ => None,
        })
    }

    pub fn region_node(&self, parent: Uuid, region: &str) -> Option<SceneId> {
        let parent_id = self.component_node(parent)?;
        self.nodes
            .get(&parent_id)?
            .children
            .iter()
            .copied()
            .find(|child| {
                matches!(
                    self.nodes.get(child).map(|node| &node.kind),
                    Some(SceneKind::Region { name }) if name == region
                )
            })
    }

    pub fn has_components(&self) -> bool {
        self.nodes.values().any(SceneNode::is_component)
    }

    pub fn component_count(&self) -> usize {
        self.nodes.values().filter(|node| node.is_component()).count()
    }

    /// Component uuids in document order.
    pub fn component_uuids(&self) -> Vec<Uuid> {
        let mut uuids = Vec::new();
        let mut stack: Vec<SceneId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                if let SceneKind::Component { uuid, .. } = &node.kind {
                    uuids.push(*uuid);
                }
                stack.extend(node.children.iter().rev().copied());
            }
        }
        uuids
    }

    pub fn is_section_component(&self, uuid: Uuid) -> bool {
        self.component_node(uuid)
            .and_then(|id| self.nodes.get(&id))
            .map(|node| matches!(node.kind, SceneKind::Component { section: true, .. }))
            .unwrap_or(false)
    }

    /// The component a component sits inside, going through its region.
    pub fn parent_component_of(&self, uuid: Uuid) -> Option<Uuid> {
        let id = self.component_node(uuid)?;
        let region = self.nodes.get(&id)?.parent?;
        let section = self.nodes.get(&region)?.parent?;
        self.nodes.get(&section)?.uuid()
    }

    /// The section that owns a region node.
    pub fn region_parent(&self, id: SceneId) -> Option<Uuid> {
        let parent = self.nodes.get(&id)?.parent?;
        self.nodes.get(&parent)?.uuid()
    }

    /// A region counts as empty while it holds no component nodes;
    /// placeholders left by deletions do not count.
    pub fn region_is_empty(&self, id: SceneId) -> bool {
        self.nodes
            .get(&id)
            .map(|node| {
                !node.children.iter().any(|child| {
                    self.nodes
                        .get(child)
                        .map(SceneNode::is_component)
                        .unwrap_or(false)
                })
            })
            .unwrap_or(true)
    }

    /// The drop container a component currently lives in.
    pub fn container_of(&self, uuid: Uuid) -> DropContainer {
        let region = self
            .component_node(uuid)
            .and_then(|id| self.nodes.get(&id))
            .and_then(|node| node.parent)
            .and_then(|parent| self.nodes.get(&parent));
        match region {
            Some(node) => match (&node.kind, self.region_parent(node.id)) {
                (SceneKind::Region { name }, Some(parent)) => DropContainer::Region {
                    parent,
                    region: name.clone(),
                },
                _ => DropContainer::Root,
            },
            None => DropContainer::Root,
        }
    }

    pub fn component_rect(&self, uuid: Uuid) -> Option<UiRect> {
        self.component_node(uuid)
            .and_then(|id| self.nodes.get(&id))
            .map(|node| node.rect)
    }

    pub fn region_rect(&self, parent: Uuid, region: &str) -> Option<UiRect> {
        self.region_node(parent, region)
            .and_then(|id| self.nodes.get(&id))
            .map(|node| node.rect)
    }

    pub fn set_component_rect(&mut self, uuid: Uuid, rect: UiRect) -> bool {
        match self.component_node(uuid) {
            Some(id) => self.set_rect(id, rect),
            None => false,
        }
    }

    pub fn set_region_rect(&mut self, parent: Uuid, region: &str, rect: UiRect) -> bool {
        match self.region_node(parent, region) {
            Some(id) => self.set_rect(id, rect),
            None => false,
        }
    }

    pub fn set_rect(&mut self, id: SceneId, rect: UiRect) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn set_component_visible(&mut self, uuid: Uuid, visible: bool) -> bool {
        match self.component_node(uuid) {
            Some(id) => {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.visible = visible;
                }
                true
            }
            None => false,
        }
    }

    /// The deepest visible component or region under a point; a later
    /// sibling wins when rectangles overlap, matching document order.
    pub fn hit_test(&self, point: Point) -> Option<SceneId> {
        self.roots
            .iter()
            .rev()
            .find_map(|root| self.hit_node(*root, point))
    }

    fn hit_node(&self, id: SceneId, point: Point) -> Option<SceneId> {
        let node = self.nodes.get(&id)?;
        if !node.visible || !node.rect.contains(point) {
            return None;
        }
        for child in node.children.iter().rev() {
            if let Some(hit) = self.hit_node(*child, point) {
                return Some(hit);
            }
        }
        match node.kind {
            SceneKind::Placeholder { .. } => None,
            _ => Some(id),
        }
    }

    /// Snapshots the current arrangement as a flat ordering.
    pub fn capture_state(&self) -> LayoutState {
        let mut state = LayoutState::new(Vec::new());
        for root in &self.roots {
            self.capture_node(*root, None, None, &mut state);
        }
        state
    }

    fn capture_node(
        &self,
        id: SceneId,
        parent: Option<Uuid>,
        region: Option<&str>,
        state: &mut LayoutState,
    ) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match &node.kind {
            SceneKind::Component { uuid, .. } => {
                let entry = match (parent, region) {
                    (Some(parent), Some(region)) => OrderedNode::in_region(*uuid, parent, region),
                    _ => OrderedNode::top_level(*uuid),
                };
                state.push(entry);
                for child in &node.children {
                    self.capture_node(*child, Some(*uuid), None, state);
                }
            }
            SceneKind::Region { name } => {
                for child in &node.children {
                    self.capture_node(*child, parent, Some(name), state);
                }
            }
            SceneKind::Placeholder { .. } => {}
        }
    }

    /// Splices a server fragment in at an anchor, returning the uuids
    /// of the components added. An unresolvable anchor adds nothing.
    pub fn splice_fragment(&mut self, anchor: &SpliceAnchor, fragment: &Fragment) -> Vec<Uuid> {
        match self.resolve_anchor(anchor) {
            Some((container, index)) => self.splice_at(container, index, fragment),
            None => Vec::new(),
        }
    }

    fn resolve_anchor(&self, anchor: &SpliceAnchor) -> Option<(Option<SceneId>, usize)> {
        match anchor {
            SpliceAnchor::Before(uuid) => {
                let id = self.component_node(*uuid)?;
                let parent = self.nodes.get(&id)?.parent;
                Some((parent, self.position_in_container(id)?))
            }
            SpliceAnchor::After(uuid) => {
                let id = self.component_node(*uuid)?;
                let parent = self.nodes.get(&id)?.parent;
                Some((parent, self.position_in_container(id)? + 1))
            }
            SpliceAnchor::RegionEnd { parent, region } => {
                let region_id = self.region_node(*parent, region)?;
                Some((Some(region_id), self.container_len(Some(region_id))))
            }
            SpliceAnchor::RootEnd => Some((None, self.roots.len())),
        }
    }

    fn splice_at(
        &mut self,
        container: Option<SceneId>,
        mut index: usize,
        fragment: &Fragment,
    ) -> Vec<Uuid> {
        let mut created: HashMap<Uuid, SceneId> = HashMap::new();
        let mut inserted = Vec::new();
        for component in &fragment.components {
            if self.component_node(component.uuid).is_some() {
                continue;
            }
            let id = self.alloc_component(component);
            created.insert(component.uuid, id);
            inserted.push(component.uuid);

            let parent_in_batch = component
                .parent_uuid
                .and_then(|parent| created.get(&parent).copied());
            match parent_in_batch {
                Some(parent_id) => {
                    let region_id = component
                        .region
                        .as_deref()
                        .and_then(|name| self.child_region(parent_id, name));
                    match region_id {
                        Some(region_id) => {
                            let end = self.container_len(Some(region_id));
                            self.attach(id, Some(region_id), end);
                        }
                        // unknown region in the fragment: degrade to the
                        // editor root rather than dropping content
                        None => {
                            let end = self.roots.len();
                            self.attach(id, None, end);
                        }
                    }
                }
                None => {
                    self.attach(id, container, index);
                    index += 1;
                }
            }
        }
        inserted
    }

    fn alloc_component(&mut self, component: &FragmentComponent) -> SceneId {
        let id = self.alloc(
            SceneKind::Component {
                uuid: component.uuid,
                type_id: component.type_id.clone(),
                section: component.is_section(),
            },
            true,
        );
        for region in &component.regions {
            let region_id = self.alloc(SceneKind::Region { name: region.clone() }, true);
            let end = self.container_len(Some(id));
            self.attach(region_id, Some(id), end);
        }
        id
    }

    fn child_region(&self, parent: SceneId, name: &str) -> Option<SceneId> {
        self.nodes.get(&parent)?.children.iter().copied().find(|child| {
            matches!(
                self.nodes.get(child).map(|node| &node.kind),
                Some(SceneKind::Region { name: n }) if n == name
            )
        })
    }

    /// Lifts a component's subtree out of the scene, leaving an
    /// invisible placeholder in its slot.
    pub fn detach_component(&mut self, uuid: Uuid) -> Option<DetachedSubtree> {
        let id = self.component_node(uuid)?;
        let parent = self.nodes.get(&id)?.parent;
        let index = self.position_in_container(id)?;
        let ids = self.subtree_ids(id);

        self.detach_from_container(id);
        let mut nodes = HashMap::new();
        for sub in ids {
            if let Some(node) = self.nodes.remove(&sub) {
                nodes.insert(sub, node);
            }
        }

        let placeholder = self.alloc(SceneKind::Placeholder { uuid }, false);
        self.attach(placeholder, parent, index);
        Some(DetachedSubtree {
            root: id,
            uuid,
            nodes,
        })
    }

    /// Puts a detached subtree back where its placeholder sits. Fails
    /// when the placeholder no longer exists.
    pub fn restore_detached(&mut self, subtree: DetachedSubtree) -> bool {
        let Some(placeholder) = self.placeholder_node(subtree.uuid) else {
            return false;
        };
        let parent = self.nodes.get(&placeholder).and_then(|node| node.parent);
        let Some(index) = self.position_in_container(placeholder) else {
            return false;
        };
        self.detach_from_container(placeholder);
        self.nodes.remove(&placeholder);

        let root = subtree.root;
        self.nodes.extend(subtree.nodes);
        self.attach(root, parent, index);
        true
    }

    /// Swaps a component's subtree for freshly rendered markup in the
    /// same slot.
    pub fn replace_component(&mut self, uuid: Uuid, fragment: &Fragment) -> bool {
        let Some(id) = self.component_node(uuid) else {
            return false;
        };
        let parent = self.nodes.get(&id).and_then(|node| node.parent);
        let Some(index) = self.position_in_container(id) else {
            return false;
        };
        let ids = self.subtree_ids(id);
        self.detach_from_container(id);
        for sub in ids {
            self.nodes.remove(&sub);
        }
        self.splice_at(parent, index, fragment);
        true
    }

    /// Re-homes a component into a drop target. Refuses drops into the
    /// component's own subtree.
    pub fn move_component(&mut self, uuid: Uuid, target: &DropTarget) -> bool {
        let Some(id) = self.component_node(uuid) else {
            return false;
        };
        let container = match &target.container {
            DropContainer::Root => None,
            DropContainer::Region { parent, region } => {
                match self.region_node(*parent, region) {
                    Some(region_id) => Some(region_id),
                    None => return false,
                }
            }
        };
        if let Some(region_id) = container {
            if self.subtree_ids(id).contains(&region_id) {
                return false;
            }
        }

        self.detach_from_container(id);
        let index = match target.before.and_then(|sibling| self.component_node(sibling)) {
            Some(sibling_id)
                if self.nodes.get(&sibling_id).and_then(|node| node.parent) == container =>
            {
                self.position_in_container(sibling_id)
                    .unwrap_or_else(|| self.container_len(container))
            }
            _ => self.container_len(container),
        };
        self.attach(id, container, index);
        true
    }

    /// Reorders a component next to a sibling in the same container.
    pub fn reorder_adjacent(&mut self, uuid: Uuid, sibling: Uuid, placement: Placement) -> bool {
        let (Some(id), Some(sibling_id)) =
            (self.component_node(uuid), self.component_node(sibling))
        else {
            return false;
        };
        let parent = self.nodes.get(&id).and_then(|node| node.parent);
        if self.nodes.get(&sibling_id).and_then(|node| node.parent) != parent {
            return false;
        }

        self.detach_from_container(id);
        let base = self
            .position_in_container(sibling_id)
            .unwrap_or_else(|| self.container_len(parent));
        let index = match placement {
            Placement::Before => base,
            Placement::After => base + 1,
        };
        self.attach(id, parent, index);
        true
    }

    /// The nearest visible component sibling in a direction, skipping
    /// placeholders and hidden nodes.
    pub fn visible_sibling(&self, uuid: Uuid, direction: Direction) -> Option<Uuid> {
        let id = self.component_node(uuid)?;
        let parent = self.nodes.get(&id)?.parent;
        let siblings: &[SceneId] = match parent {
            Some(parent) => &self.nodes.get(&parent)?.children,
            None => &self.roots,
        };
        let index = siblings.iter().position(|sibling| *sibling == id)?;
        let candidate = |id: &SceneId| {
            let node = self.nodes.get(id)?;
            if !node.visible {
                return None;
            }
            match &node.kind {
                SceneKind::Component { uuid, .. } => Some(*uuid),
                _ => None,
            }
        };
        match direction {
            Direction::Down => siblings[index + 1..].iter().find_map(candidate),
            Direction::Up => siblings[..index].iter().rev().find_map(candidate),
        }
    }

    fn subtree_ids(&self, id: SceneId) -> Vec<SceneId> {
        let mut ids = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            ids.push(next);
            if let Some(node) = self.nodes.get(&next) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        ids
    }

    fn position_in_container(&self, id: SceneId) -> Option<usize> {
        let parent = self.nodes.get(&id)?.parent;
        let siblings = match parent {
            Some(parent) => &self.nodes.get(&parent)?.children,
            None => &self.roots,
        };
        siblings.iter().position(|sibling| *sibling == id)
    }

    fn container_len(&self, container: Option<SceneId>) -> usize {
        match container {
            Some(id) => self.nodes.get(&id).map(|node| node.children.len()).unwrap_or(0),
            None => self.roots.len(),
        }
    }

    fn detach_from_container(&mut self, id: SceneId) {
        let parent = self.nodes.get(&id).and_then(|node| node.parent);
        match parent {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
    }

    fn attach(&mut self, id: SceneId, container: Option<SceneId>, index: usize) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = container;
        }
        match container {
            Some(parent) => {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    let index = index.min(node.children.len());
                    node.children.insert(index, id);
                }
            }
            None => {
                let index = index.min(self.roots.len());
                self.roots.insert(index, id);
            }
        }
    }

    fn alloc(&mut self, kind: SceneKind, visible: bool) -> SceneId {
        self.next_id += 1;
        let id = SceneId(self.next_id);
        self.nodes.insert(
            id,
            SceneNode {
                id,
                kind,
                rect: UiRect::default(),
                visible,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }
}
