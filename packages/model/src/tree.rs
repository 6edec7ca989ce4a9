//! # Layout Tree
//!
//! The authoritative arena of components for one entity field.
//!
//! ## Design
//!
//! - Components live in a flat arena keyed by uuid; nesting is expressed
//!   through each component's (parent, region) placement
//! - A canonical order accompanies the arena: pre-order, region-grouped
//!   (a section is followed by its regions' children, region by region,
//!   in the order the section's type declares)
//! - Every structural mutation renormalizes the order, so display order
//!   and per-region insertion order always agree
//! - `capture_state` / `apply_state` translate between the arena and the
//!   flat wire description used for reconciliation

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::component::{Component, TypeRegistry};
use crate::errors::ModelError;
use crate::state::{LayoutState, OrderedNode};

type SiblingGroup = (Option<Uuid>, Option<String>);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutTree {
    types: TypeRegistry,
    components: HashMap<Uuid, Component>,
    order: Vec<Uuid>,
}

impl LayoutTree {
    pub fn new(types: TypeRegistry) -> Self {
        Self {
            types,
            components: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn contains(&self, uuid: Uuid) -> bool {
        self.components.contains_key(&uuid)
    }

    pub fn component(&self, uuid: Uuid) -> Option<&Component> {
        self.components.get(&uuid)
    }

    /// Display order: pre-order, region-grouped.
    pub fn order(&self) -> &[Uuid] {
        &self.order
    }

    /// Components in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.order.iter().filter_map(|uuid| self.components.get(uuid))
    }

    /// Uuids of top-level components, in display order.
    pub fn top_level(&self) -> Vec<Uuid> {
        self.iter()
            .filter(|c| c.is_top_level())
            .map(|c| c.uuid())
            .collect()
    }

    /// Children of one region, in display order. Region names scope to
    /// their parent: the same name under two parents is two sequences.
    pub fn children(&self, parent: Uuid, region: &str) -> Vec<Uuid> {
        self.iter()
            .filter(|c| c.parent() == Some(parent) && c.region() == Some(region))
            .map(|c| c.uuid())
            .collect()
    }

    /// All descendants of a component, in display order.
    pub fn descendants(&self, uuid: Uuid) -> Vec<Uuid> {
        let mut found = Vec::new();
        let mut ancestors: HashSet<Uuid> = HashSet::new();
        ancestors.insert(uuid);
        for component in self.iter() {
            if let Some(parent) = component.parent() {
                if ancestors.contains(&parent) {
                    ancestors.insert(component.uuid());
                    found.push(component.uuid());
                }
            }
        }
        found
    }

    /// Whether a component's type declares regions.
    pub fn is_section(&self, uuid: Uuid) -> bool {
        self.components
            .get(&uuid)
            .map(|c| self.types.is_section(c.type_id()))
            .unwrap_or(false)
    }

    pub fn set_settings(&mut self, uuid: Uuid, settings: serde_json::Value) -> Result<(), ModelError> {
        let component = self
            .components
            .get_mut(&uuid)
            .ok_or(ModelError::ComponentNotFound(uuid))?;
        component.settings = settings;
        Ok(())
    }

    /// Appends a component at the end of the top level.
    pub fn append(&mut self, mut component: Component) -> Result<Uuid, ModelError> {
        self.check_insertable(&component)?;
        component.set_placement(None, None);
        let uuid = component.uuid();
        self.components.insert(uuid, component);
        self.order.push(uuid);
        self.canonicalize();
        Ok(uuid)
    }

    /// Inserts a component directly before a sibling, adopting the
    /// sibling's placement.
    pub fn insert_before(&mut self, sibling: Uuid, component: Component) -> Result<Uuid, ModelError> {
        self.insert_adjacent(sibling, component, 0)
    }

    /// Inserts a component directly after a sibling, adopting the
    /// sibling's placement.
    pub fn insert_after(&mut self, sibling: Uuid, component: Component) -> Result<Uuid, ModelError> {
        self.insert_adjacent(sibling, component, 1)
    }

    fn insert_adjacent(
        &mut self,
        sibling: Uuid,
        mut component: Component,
        offset: usize,
    ) -> Result<Uuid, ModelError> {
        self.check_insertable(&component)?;
        let (parent, region) = {
            let sibling_component = self
                .components
                .get(&sibling)
                .ok_or(ModelError::ComponentNotFound(sibling))?;
            (
                sibling_component.parent(),
                sibling_component.region().map(str::to_string),
            )
        };
        component.set_placement(parent, region);
        let uuid = component.uuid();
        self.components.insert(uuid, component);
        // Splicing next to the sibling keeps the sibling group's relative
        // order right; canonicalize re-derives the full traversal.
        let index = self.order.iter().position(|u| *u == sibling).unwrap_or(0) + offset;
        self.order.insert(index, uuid);
        self.canonicalize();
        Ok(uuid)
    }

    /// Appends a component at the end of a section's region.
    pub fn insert_into_region(
        &mut self,
        parent: Uuid,
        region: &str,
        mut component: Component,
    ) -> Result<Uuid, ModelError> {
        self.check_insertable(&component)?;
        let parent_type = {
            let parent_component = self
                .components
                .get(&parent)
                .ok_or(ModelError::ComponentNotFound(parent))?;
            parent_component.type_id().to_string()
        };
        let ty = self
            .types
            .get(&parent_type)
            .ok_or(ModelError::NotASection(parent))?;
        if !ty.is_section() {
            return Err(ModelError::NotASection(parent));
        }
        if !ty.has_region(region) {
            return Err(ModelError::UnknownRegion {
                parent,
                region: region.to_string(),
            });
        }
        component.set_placement(Some(parent), Some(region.to_string()));
        let uuid = component.uuid();
        self.components.insert(uuid, component);
        self.order.push(uuid);
        self.canonicalize();
        Ok(uuid)
    }

    /// Removes a component and every descendant. Unknown uuids remove
    /// nothing; the returned components are in display order.
    pub fn remove(&mut self, uuid: Uuid) -> Vec<Component> {
        if !self.components.contains_key(&uuid) {
            return Vec::new();
        }
        let mut doomed = vec![uuid];
        doomed.extend(self.descendants(uuid));
        let doomed_set: HashSet<Uuid> = doomed.iter().copied().collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for target in &self.order {
            if doomed_set.contains(target) {
                if let Some(component) = self.components.get(target) {
                    removed.push(component.clone());
                }
            }
        }
        self.components.retain(|key, _| !doomed_set.contains(key));
        self.order.retain(|key| !doomed_set.contains(key));
        self.canonicalize();
        removed
    }

    /// Captures the flat ordered description of the tree.
    pub fn capture_state(&self) -> LayoutState {
        self.iter()
            .map(|c| OrderedNode {
                uuid: c.uuid(),
                parent_uuid: c.parent(),
                region: c.region().map(str::to_string),
            })
            .collect()
    }

    /// Applies a captured description back onto the tree.
    ///
    /// The description is authoritative only for the components it names:
    /// each named component present in the tree gets its placement and its
    /// position within the named sibling sequence from the description.
    /// Components the description does not name keep their placement and
    /// their slot. A named parent that is missing from the tree degrades
    /// the component to a top-level placement. Never fails, never deletes.
    pub fn apply_state(&mut self, state: &LayoutState) {
        for node in state {
            if !self.components.contains_key(&node.uuid) {
                continue;
            }
            let placement = match node.parent_uuid {
                Some(parent) if self.components.contains_key(&parent) => {
                    (Some(parent), node.region.clone())
                }
                _ => (None, None),
            };
            if let Some(component) = self.components.get_mut(&node.uuid) {
                component.set_placement(placement.0, placement.1);
            }
        }

        // Re-sequence: described components take the described order across
        // the slots they already occupy; undescribed components keep theirs.
        let mut seen = HashSet::new();
        let described: Vec<Uuid> = state
            .uuids()
            .filter(|uuid| self.components.contains_key(uuid) && seen.insert(*uuid))
            .collect();
        let described_set: HashSet<Uuid> = described.iter().copied().collect();
        let mut slots = described.into_iter();
        self.order = self
            .order
            .iter()
            .map(|uuid| {
                if described_set.contains(uuid) {
                    slots.next().unwrap_or(*uuid)
                } else {
                    *uuid
                }
            })
            .collect();
        self.canonicalize();
    }

    fn check_insertable(&self, component: &Component) -> Result<(), ModelError> {
        if self.components.contains_key(&component.uuid()) {
            return Err(ModelError::DuplicateComponent(component.uuid()));
        }
        if !self.types.contains(component.type_id()) {
            return Err(ModelError::UnknownType(component.type_id().to_string()));
        }
        Ok(())
    }

    /// Rebuilds the canonical order from current placements: top-level
    /// sequence first, each section followed by its regions' children in
    /// declared region order. Every component ends up in the order exactly
    /// once; a component whose parent vanished is lifted to the top level.
    fn canonicalize(&mut self) {
        let orphaned: Vec<Uuid> = self
            .order
            .iter()
            .filter(|uuid| {
                self.components
                    .get(uuid)
                    .and_then(|c| c.parent())
                    .map(|parent| !self.components.contains_key(&parent))
                    .unwrap_or(false)
            })
            .copied()
            .collect();
        for uuid in orphaned {
            if let Some(component) = self.components.get_mut(&uuid) {
                component.set_placement(None, None);
            }
        }

        let mut groups: HashMap<SiblingGroup, Vec<Uuid>> = HashMap::new();
        for uuid in &self.order {
            if let Some(component) = self.components.get(uuid) {
                groups
                    .entry((component.parent(), component.region().map(str::to_string)))
                    .or_default()
                    .push(*uuid);
            }
        }

        let mut rebuilt = Vec::with_capacity(self.order.len());
        let roots = groups.remove(&(None, None)).unwrap_or_default();
        for uuid in roots {
            self.emit(uuid, &mut groups, &mut rebuilt);
        }
        if rebuilt.len() != self.order.len() {
            // Unreachable parent chains keep their components at the end
            // rather than dropping them from the order.
            let placed: HashSet<Uuid> = rebuilt.iter().copied().collect();
            for uuid in &self.order {
                if !placed.contains(uuid) {
                    rebuilt.push(*uuid);
                }
            }
        }
        self.order = rebuilt;
    }

    fn emit(&self, uuid: Uuid, groups: &mut HashMap<SiblingGroup, Vec<Uuid>>, out: &mut Vec<Uuid>) {
        out.push(uuid);
        let declared: Vec<String> = self
            .components
            .get(&uuid)
            .map(|c| self.types.regions(c.type_id()).to_vec())
            .unwrap_or_default();
        for region in &declared {
            if let Some(children) = groups.remove(&(Some(uuid), Some(region.clone()))) {
                for child in children {
                    self.emit(child, groups, out);
                }
            }
        }
        // Children assigned to region names the type no longer declares
        // still follow their parent, after the declared regions.
        let mut extra: Vec<SiblingGroup> = groups
            .keys()
            .filter(|(parent, _)| *parent == Some(uuid))
            .cloned()
            .collect();
        extra.sort_by(|a, b| a.1.cmp(&b.1));
        for key in extra {
            if let Some(children) = groups.remove(&key) {
                for child in children {
                    self.emit(child, groups, out);
                }
            }
        }
    }
}
