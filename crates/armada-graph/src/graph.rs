//! The normalized graph: one table per entity kind plus root references.

use std::sync::Arc;

use armada_types::{EntityKind, SQUADRON_GEAR_SLOTS};

use crate::GraphError;
use crate::entity::{
    AirSquadronEntity, AnyEntity, Entity, FleetEntity, GearEntity, OrgEntity, Reference,
    ShipEntity,
};
use crate::normalize::{IdOf, Normalize};
use crate::table::Table;

/// A snapshot of every entity, normalized into per-kind tables.
///
/// Tables are `Arc`-shared, so cloning a graph is cheap and two snapshots
/// produced by [`apply`](crate::apply) share every table and row the change
/// did not touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    pub(crate) gears: Arc<Table<GearEntity>>,
    pub(crate) ships: Arc<Table<ShipEntity>>,
    pub(crate) fleets: Arc<Table<FleetEntity>>,
    pub(crate) air_squadrons: Arc<Table<AirSquadronEntity>>,
    pub(crate) orgs: Arc<Table<OrgEntity>>,
    pub(crate) roots: Vec<Reference>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Tree conversion
    // -----------------------------------------------------------------------

    /// Normalize a tree into a fresh graph, returning the graph and the
    /// root identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if the tree carries the same
    /// identifier twice within one kind.
    pub fn normalize<T: Normalize>(tree: &T) -> Result<(Self, IdOf<T>), GraphError> {
        let mut graph = Self::new();
        let root = graph.insert_tree(tree)?;
        Ok((graph, root))
    }

    /// Normalize a tree into this graph and record it as a root.
    ///
    /// Either the whole tree is inserted or, on error, the graph is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if any identifier in the tree is
    /// already present in this graph or repeats within the tree.
    pub fn insert_tree<T: Normalize>(&mut self, tree: &T) -> Result<IdOf<T>, GraphError> {
        let mut staged = self.clone();
        let root = tree.normalize_into(&mut staged)?;
        staged
            .roots
            .push(Reference::new(T::Entity::KIND, root.as_ref()));
        *self = staged;
        Ok(root)
    }

    /// Rebuild the tree rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `root` does not exist, or
    /// [`GraphError::DanglingReference`] if a nested reference does not
    /// resolve.
    pub fn denormalize<T: Normalize>(&self, root: &IdOf<T>) -> Result<T, GraphError> {
        T::denormalize_from(self, root.as_ref())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Look up a row by typed identifier.
    pub fn get<E: Entity>(&self, id: &E::Id) -> Option<&E> {
        E::table(self).get(id.as_ref())
    }

    /// Every row of one kind, in insertion order.
    pub fn all<'a, E: Entity + 'a>(&'a self) -> impl Iterator<Item = &'a E> {
        E::table(self).iter()
    }

    /// The table holding rows of one kind.
    pub fn table<E: Entity>(&self) -> &Table<E> {
        E::table(self)
    }

    /// Look up a row when the kind is only known at runtime.
    pub fn get_any(&self, kind: EntityKind, id: &str) -> Option<AnyEntity<'_>> {
        match kind {
            EntityKind::Gear => self.gears.get(id).map(AnyEntity::Gear),
            EntityKind::Ship => self.ships.get(id).map(AnyEntity::Ship),
            EntityKind::Fleet => self.fleets.get(id).map(AnyEntity::Fleet),
            EntityKind::AirSquadron => self.air_squadrons.get(id).map(AnyEntity::AirSquadron),
            EntityKind::Org => self.orgs.get(id).map(AnyEntity::Org),
        }
    }

    /// Whether a row of `kind` with this identifier exists.
    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Gear => self.gears.contains(id),
            EntityKind::Ship => self.ships.contains(id),
            EntityKind::Fleet => self.fleets.contains(id),
            EntityKind::AirSquadron => self.air_squadrons.contains(id),
            EntityKind::Org => self.orgs.contains(id),
        }
    }

    /// Number of rows of one kind.
    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Gear => self.gears.len(),
            EntityKind::Ship => self.ships.len(),
            EntityKind::Fleet => self.fleets.len(),
            EntityKind::AirSquadron => self.air_squadrons.len(),
            EntityKind::Org => self.orgs.len(),
        }
    }

    /// Whether every table is empty.
    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|&kind| self.len(kind) == 0)
    }

    /// Root references, one per inserted top-level tree.
    pub fn roots(&self) -> &[Reference] {
        &self.roots
    }

    /// Every row of every kind, leaves first.
    pub fn iter_any(&self) -> impl Iterator<Item = AnyEntity<'_>> {
        self.gears
            .iter()
            .map(AnyEntity::Gear)
            .chain(self.ships.iter().map(AnyEntity::Ship))
            .chain(self.fleets.iter().map(AnyEntity::Fleet))
            .chain(self.air_squadrons.iter().map(AnyEntity::AirSquadron))
            .chain(self.orgs.iter().map(AnyEntity::Org))
    }

    /// Whether two graphs share the same table allocation for `E`.
    ///
    /// Lets callers observe structural sharing between snapshots.
    pub fn shares_table<E: Entity>(&self, other: &Self) -> bool {
        core::ptr::eq(E::table(self), E::table(other))
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    /// Every `(holder, target)` pair where `target` does not resolve.
    ///
    /// Empty for any graph produced by normalization or [`apply`](crate::apply).
    pub fn dangling_references(&self) -> Vec<(Reference, Reference)> {
        let mut dangling = Vec::new();
        for row in self.iter_any() {
            for target in row.references() {
                if !self.contains(target.kind, &target.id) {
                    dangling.push((Reference::new(row.kind(), row.id()), target));
                }
            }
        }
        dangling
    }

    /// Check references, roots and compacting-list capacity.
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if let Some((holder, target)) = self.dangling_references().into_iter().next() {
            tracing::debug!(%holder, %target, "change left an unresolved reference");
            return Err(GraphError::InvalidReference {
                kind: target.kind,
                id: target.id,
            });
        }
        if let Some(root) = self
            .roots
            .iter()
            .find(|root| !self.contains(root.kind, &root.id))
        {
            return Err(GraphError::InvalidReference {
                kind: root.kind,
                id: root.id.clone(),
            });
        }
        if let Some(squadron) = self
            .air_squadrons
            .iter()
            .find(|s| s.gears.len() > SQUADRON_GEAR_SLOTS)
        {
            return Err(GraphError::SlotOutOfRange {
                kind: EntityKind::AirSquadron,
                slot: squadron.gears.len().saturating_sub(1),
                capacity: SQUADRON_GEAR_SLOTS,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Crate-internal mutation
    // -----------------------------------------------------------------------

    /// Remove one row without touching references to it.
    pub(crate) fn remove_row(&mut self, kind: EntityKind, id: &str) -> Option<Vec<Reference>> {
        match kind {
            EntityKind::Gear => GearEntity::table_mut(self).remove(id).map(|e| e.owned()),
            EntityKind::Ship => ShipEntity::table_mut(self).remove(id).map(|e| e.owned()),
            EntityKind::Fleet => FleetEntity::table_mut(self).remove(id).map(|e| e.owned()),
            EntityKind::AirSquadron => AirSquadronEntity::table_mut(self)
                .remove(id)
                .map(|e| e.owned()),
            EntityKind::Org => OrgEntity::table_mut(self).remove(id).map(|e| e.owned()),
        }
    }

    /// Clear every reference to `target` across the graph, including roots.
    /// Returns how many references were cleared.
    pub(crate) fn clear_references(&mut self, target: &Reference) -> usize {
        let holds = |refs: Vec<Reference>| refs.contains(target);
        let mut cleared = 0_usize;
        match target.kind {
            EntityKind::Gear => {
                if self.ships.iter().any(|s| holds(s.references())) {
                    cleared = cleared.saturating_add(ShipEntity::table_mut(self).update_where(
                        |s| holds(s.references()),
                        |s| s.clear_references_to(target),
                    ));
                }
                if self.air_squadrons.iter().any(|s| holds(s.references())) {
                    cleared = cleared.saturating_add(AirSquadronEntity::table_mut(self).update_where(
                        |s| holds(s.references()),
                        |s| s.clear_references_to(target),
                    ));
                }
            }
            EntityKind::Ship => {
                if self.fleets.iter().any(|f| holds(f.references())) {
                    cleared = cleared.saturating_add(FleetEntity::table_mut(self).update_where(
                        |f| holds(f.references()),
                        |f| f.clear_references_to(target),
                    ));
                }
            }
            EntityKind::Fleet | EntityKind::AirSquadron => {
                if self.orgs.iter().any(|o| holds(o.references())) {
                    cleared = cleared.saturating_add(OrgEntity::table_mut(self).update_where(
                        |o| holds(o.references()),
                        |o| o.clear_references_to(target),
                    ));
                }
            }
            EntityKind::Org => {}
        }
        self.roots.retain(|root| root != target);
        cleared
    }

    /// Compact any air squadron whose gear list ends in an empty position.
    pub(crate) fn compact_squadrons(&mut self) {
        let untidy = |s: &AirSquadronEntity| s.gears.last().is_some_and(Option::is_none);
        if self.air_squadrons.iter().any(untidy) {
            AirSquadronEntity::table_mut(self).update_where(untidy, |s| {
                s.compact();
                0
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use armada_types::{GearState, ShipState};

    use super::*;

    fn ship_with_gear() -> (Graph, armada_types::ShipId) {
        let mut ship = ShipState::new(131);
        ship.g1 = Some(GearState::new(1));
        ship.gx = Some(GearState::new(43));
        Graph::normalize(&ship).unwrap_or_default()
    }

    #[test]
    fn accessors_agree() {
        let (graph, ship_id) = ship_with_gear();
        assert_eq!(graph.len(EntityKind::Ship), 1);
        assert_eq!(graph.len(EntityKind::Gear), 2);
        assert!(graph.contains(EntityKind::Ship, ship_id.as_str()));
        assert_eq!(
            graph
                .get_any(EntityKind::Ship, ship_id.as_str())
                .map(|e| e.kind()),
            Some(EntityKind::Ship)
        );
        assert_eq!(graph.all::<GearEntity>().count(), 2);
        assert_eq!(
            graph.roots(),
            [Reference::new(EntityKind::Ship, ship_id.as_str())]
        );
    }

    #[test]
    fn fresh_graph_has_no_dangling_references() {
        let (graph, _) = ship_with_gear();
        assert!(graph.dangling_references().is_empty());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn clear_references_reaches_overflow_slot() {
        let (mut graph, ship_id) = ship_with_gear();
        let gx = graph
            .get::<ShipEntity>(&ship_id)
            .and_then(|s| s.gx.clone())
            .map(|id| Reference::new(EntityKind::Gear, id.as_str()));
        let cleared = gx.map_or(0, |target| graph.clear_references(&target));
        assert_eq!(cleared, 1);
        assert_eq!(graph.get::<ShipEntity>(&ship_id).and_then(|s| s.gx.clone()), None);
    }

    #[test]
    fn failed_insert_tree_leaves_graph_untouched() {
        let (mut graph, _) = ship_with_gear();
        let before = graph.clone();
        let mut dup = ShipState::new(1);
        dup.g1 = Some(GearState {
            id: Some("dup".into()),
            ..GearState::new(2)
        });
        dup.g2 = dup.g1.clone();
        assert!(matches!(
            graph.insert_tree(&dup),
            Err(GraphError::DuplicateId { .. })
        ));
        assert_eq!(graph, before);
    }
}
