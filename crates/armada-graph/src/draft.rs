//! Copy-on-write change application.
//!
//! [`apply`] hands a recipe a [`Draft`] over a structurally shared copy of
//! the input graph. Rows are copied only when the recipe mutates them, so the
//! resulting snapshot shares everything untouched with the input. The input
//! graph is never mutated.
//!
//! A change is all-or-nothing: if the recipe fails, or leaves any reference
//! that does not resolve, the draft is discarded and the caller keeps the
//! original graph.

use std::collections::BTreeSet;

use armada_types::{
    AirSquadronId, AirSquadronMode, EntityKind, FLEET_SHIP_SLOTS, FleetId, GearId,
    ORG_FLEET_SLOTS, ORG_SQUADRON_SLOTS, OrgId, OrgType, SHIP_GEAR_SLOTS, SQUADRON_GEAR_SLOTS,
    ShipId,
};

use crate::GraphError;
use crate::entity::{
    AirSquadronEntity, Entity, FleetEntity, GearEntity, OrgEntity, Reference, ShipEntity,
};
use crate::graph::Graph;
use crate::normalize::{IdOf, Normalize};

/// Apply a mutation recipe to `graph`, returning the new snapshot.
///
/// # Errors
///
/// Returns whatever the recipe returns, [`GraphError::InvalidReference`] if
/// the change leaves a reference to a missing row, or
/// [`GraphError::SlotOutOfRange`] if a compacting slot list grew past its
/// capacity. In every error case nothing is applied.
pub fn apply<F>(graph: &Graph, recipe: F) -> Result<Graph, GraphError>
where
    F: FnOnce(&mut Draft) -> Result<(), GraphError>,
{
    let mut draft = Draft {
        graph: graph.clone(),
    };
    if let Err(err) = recipe(&mut draft) {
        tracing::debug!(error = %err, "change rejected by recipe");
        return Err(err);
    }
    draft.finish()
}

/// A mutable, structurally shared working copy of a graph.
#[derive(Debug)]
pub struct Draft {
    graph: Graph,
}

impl Draft {
    /// Read-only view of the working copy.
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Look up a row in the working copy.
    pub fn get<E: Entity>(&self, id: &E::Id) -> Option<&E> {
        self.graph.get(id)
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Insert a fully built row. References it holds are checked when the
    /// change completes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if the identifier is taken.
    pub fn insert<E: Entity>(&mut self, row: E) -> Result<E::Id, GraphError> {
        let id = row.id().clone();
        E::table_mut(&mut self.graph).insert(row)?;
        Ok(id)
    }

    /// Create a gear with an allocated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if the allocated identifier is
    /// already taken.
    pub fn create_gear(&mut self, gear_id: u32) -> Result<GearId, GraphError> {
        self.insert(GearEntity::new(gear_id))
    }

    /// Create a ship with an allocated identifier and empty slots.
    ///
    /// # Errors
    ///
    /// See [`create_gear`](Self::create_gear).
    pub fn create_ship(&mut self, ship_id: u32) -> Result<ShipId, GraphError> {
        self.insert(ShipEntity::new(ship_id))
    }

    /// Create an empty fleet.
    ///
    /// # Errors
    ///
    /// See [`create_gear`](Self::create_gear).
    pub fn create_fleet(&mut self) -> Result<FleetId, GraphError> {
        self.insert(FleetEntity::default())
    }

    /// Create an empty air squadron.
    ///
    /// # Errors
    ///
    /// See [`create_gear`](Self::create_gear).
    pub fn create_air_squadron(
        &mut self,
        mode: AirSquadronMode,
    ) -> Result<AirSquadronId, GraphError> {
        self.insert(AirSquadronEntity {
            mode: Some(mode),
            ..AirSquadronEntity::default()
        })
    }

    /// Create an empty organization and record it as a root.
    ///
    /// # Errors
    ///
    /// See [`create_gear`](Self::create_gear).
    pub fn create_org(&mut self, org_type: OrgType) -> Result<OrgId, GraphError> {
        let id = self.insert(OrgEntity {
            org_type: Some(org_type),
            ..OrgEntity::default()
        })?;
        self.graph
            .roots
            .push(Reference::new(EntityKind::Org, id.as_str()));
        Ok(id)
    }

    /// Normalize a subtree into the working copy and record it as a root.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if the subtree reuses an existing
    /// identifier.
    pub fn insert_tree<T: Normalize>(&mut self, tree: &T) -> Result<IdOf<T>, GraphError> {
        self.graph.insert_tree(tree)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Mutate a row in place. The row is copied first if it is still shared
    /// with the input graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidReference`] if the row does not exist.
    pub fn update<E: Entity>(
        &mut self,
        id: &E::Id,
        f: impl FnOnce(&mut E),
    ) -> Result<(), GraphError> {
        let row = E::table_mut(&mut self.graph)
            .get_mut(id.as_ref())
            .ok_or_else(|| invalid(E::KIND, id.as_ref()))?;
        f(row);
        Ok(())
    }

    /// Set or clear one of a ship's numbered gear slots.
    ///
    /// # Errors
    ///
    /// [`GraphError::SlotOutOfRange`] for a slot past the fifth,
    /// [`GraphError::InvalidReference`] if the ship or gear is missing.
    pub fn set_ship_gear(
        &mut self,
        ship: &ShipId,
        slot: usize,
        gear: Option<GearId>,
    ) -> Result<(), GraphError> {
        check_slot(EntityKind::Ship, slot, SHIP_GEAR_SLOTS)?;
        self.require(EntityKind::Gear, gear.as_ref())?;
        self.update::<ShipEntity>(ship, |s| {
            if let Some(target) = s.gears.get_mut(slot) {
                *target = gear;
            }
        })
    }

    /// Set or clear a ship's reinforcement expansion slot.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidReference`] if the ship or gear is missing.
    pub fn set_ship_overflow(
        &mut self,
        ship: &ShipId,
        gear: Option<GearId>,
    ) -> Result<(), GraphError> {
        self.require(EntityKind::Gear, gear.as_ref())?;
        self.update::<ShipEntity>(ship, |s| s.gx = gear)
    }

    /// Set or clear a fleet position.
    ///
    /// # Errors
    ///
    /// [`GraphError::SlotOutOfRange`] for a position past the seventh,
    /// [`GraphError::InvalidReference`] if the fleet or ship is missing.
    pub fn set_fleet_ship(
        &mut self,
        fleet: &FleetId,
        slot: usize,
        ship: Option<ShipId>,
    ) -> Result<(), GraphError> {
        check_slot(EntityKind::Fleet, slot, FLEET_SHIP_SLOTS)?;
        self.require(EntityKind::Ship, ship.as_ref())?;
        self.update::<FleetEntity>(fleet, |f| {
            if let Some(target) = f.ships.get_mut(slot) {
                *target = ship;
            }
        })
    }

    /// Set or clear an air squadron position. Clearing the last occupied
    /// position shortens the list.
    ///
    /// # Errors
    ///
    /// [`GraphError::SlotOutOfRange`] for a position past the fourth,
    /// [`GraphError::InvalidReference`] if the squadron or gear is missing.
    pub fn set_squadron_gear(
        &mut self,
        squadron: &AirSquadronId,
        slot: usize,
        gear: Option<GearId>,
    ) -> Result<(), GraphError> {
        check_slot(EntityKind::AirSquadron, slot, SQUADRON_GEAR_SLOTS)?;
        self.require(EntityKind::Gear, gear.as_ref())?;
        self.update::<AirSquadronEntity>(squadron, |s| {
            if s.gears.len() <= slot {
                s.gears.resize(slot.saturating_add(1), None);
            }
            if let Some(target) = s.gears.get_mut(slot) {
                *target = gear;
            }
            s.compact();
        })
    }

    /// Set or clear an organization's fleet position.
    ///
    /// # Errors
    ///
    /// [`GraphError::SlotOutOfRange`] for a position past the fourth,
    /// [`GraphError::InvalidReference`] if the org or fleet is missing.
    pub fn set_org_fleet(
        &mut self,
        org: &OrgId,
        slot: usize,
        fleet: Option<FleetId>,
    ) -> Result<(), GraphError> {
        check_slot(EntityKind::Org, slot, ORG_FLEET_SLOTS)?;
        self.require(EntityKind::Fleet, fleet.as_ref())?;
        self.update::<OrgEntity>(org, |o| {
            if let Some(target) = o.fleets.get_mut(slot) {
                *target = fleet;
            }
        })
    }

    /// Set or clear an organization's air squadron position.
    ///
    /// # Errors
    ///
    /// [`GraphError::SlotOutOfRange`] for a position past the third,
    /// [`GraphError::InvalidReference`] if the org or squadron is missing.
    pub fn set_org_squadron(
        &mut self,
        org: &OrgId,
        slot: usize,
        squadron: Option<AirSquadronId>,
    ) -> Result<(), GraphError> {
        check_slot(EntityKind::Org, slot, ORG_SQUADRON_SLOTS)?;
        self.require(EntityKind::AirSquadron, squadron.as_ref())?;
        self.update::<OrgEntity>(org, |o| {
            if let Some(target) = o.air_squadrons.get_mut(slot) {
                *target = squadron;
            }
        })
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Remove one row and clear every reference to it across the graph.
    ///
    /// Fixed-position slots keep the gap; the air squadron gear list drops
    /// trailing gaps.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidReference`] if the row does not exist.
    pub fn remove(&mut self, kind: EntityKind, id: &str) -> Result<(), GraphError> {
        if self.graph.remove_row(kind, id).is_none() {
            return Err(invalid(kind, id));
        }
        let cleared = self.graph.clear_references(&Reference::new(kind, id));
        tracing::debug!(%kind, id, cleared, "removed row");
        Ok(())
    }

    /// Remove a row together with every row it owns, transitively.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidReference`] if the root row does not
    /// exist.
    pub fn remove_tree(&mut self, kind: EntityKind, id: &str) -> Result<usize, GraphError> {
        if !self.graph.contains(kind, id) {
            return Err(invalid(kind, id));
        }
        let mut pending = vec![Reference::new(kind, id)];
        let mut seen = BTreeSet::new();
        while let Some(next) = pending.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(owned) = self.graph.remove_row(next.kind, &next.id) {
                pending.extend(owned);
            }
        }
        for removed in &seen {
            self.graph.clear_references(removed);
        }
        tracing::debug!(%kind, id, removed = seen.len(), "removed subtree");
        Ok(seen.len())
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    fn require<I: AsRef<str>>(&self, kind: EntityKind, id: Option<&I>) -> Result<(), GraphError> {
        match id {
            Some(id) if !self.graph.contains(kind, id.as_ref()) => Err(invalid(kind, id.as_ref())),
            _ => Ok(()),
        }
    }

    fn finish(mut self) -> Result<Graph, GraphError> {
        self.graph.compact_squadrons();
        self.graph.validate()?;
        Ok(self.graph)
    }
}

fn invalid(kind: EntityKind, id: &str) -> GraphError {
    GraphError::InvalidReference {
        kind,
        id: id.to_owned(),
    }
}

const fn check_slot(kind: EntityKind, slot: usize, capacity: usize) -> Result<(), GraphError> {
    if slot < capacity {
        Ok(())
    } else {
        Err(GraphError::SlotOutOfRange {
            kind,
            slot,
            capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use armada_types::{GearState, ShipState};
    use pretty_assertions::assert_eq;

    use super::*;

    fn base() -> (Graph, ShipId, GearId) {
        let mut ship = ShipState::new(131);
        ship.g1 = Some(GearState::new(1));
        let (graph, ship_id) = Graph::normalize(&ship).unwrap_or_default();
        let gear_id = graph
            .get::<ShipEntity>(&ship_id)
            .and_then(|s| s.gears.first().cloned().flatten())
            .unwrap_or_default();
        (graph, ship_id, gear_id)
    }

    #[test]
    fn input_graph_is_never_mutated() {
        let (graph, ship_id, gear_id) = base();
        let before = graph.clone();
        let next = apply(&graph, |d| {
            d.update::<ShipEntity>(&ship_id, |s| s.attrs.level = Some(175))?;
            d.remove(EntityKind::Gear, gear_id.as_str())
        });
        assert!(next.is_ok());
        assert_eq!(graph, before);
        let next = next.unwrap_or_default();
        assert_eq!(
            next.get::<ShipEntity>(&ship_id).and_then(|s| s.attrs.level),
            Some(175)
        );
    }

    #[test]
    fn untouched_tables_stay_shared() {
        let (graph, ship_id, _) = base();
        let next = apply(&graph, |d| {
            d.update::<ShipEntity>(&ship_id, |s| s.attrs.morale = Some(85))
        })
        .unwrap_or_default();
        assert!(next.shares_table::<GearEntity>(&graph));
        assert!(!next.shares_table::<ShipEntity>(&graph));
    }

    #[test]
    fn setter_rejects_missing_target() {
        let (graph, ship_id, _) = base();
        let result = apply(&graph, |d| {
            d.set_ship_gear(&ship_id, 1, Some(GearId::from("nope")))
        });
        assert_eq!(
            result.err(),
            Some(GraphError::InvalidReference {
                kind: EntityKind::Gear,
                id: "nope".to_owned(),
            })
        );
    }

    #[test]
    fn direct_mutation_to_missing_target_is_rejected() {
        let (graph, ship_id, _) = base();
        let result = apply(&graph, |d| {
            d.update::<ShipEntity>(&ship_id, |s| s.gx = Some(GearId::from("ghost")))
        });
        assert!(matches!(
            result,
            Err(GraphError::InvalidReference { kind: EntityKind::Gear, .. })
        ));
    }

    #[test]
    fn slot_past_capacity_is_rejected() {
        let (graph, ship_id, gear_id) = base();
        let result = apply(&graph, |d| d.set_ship_gear(&ship_id, 5, Some(gear_id)));
        assert_eq!(
            result.err(),
            Some(GraphError::SlotOutOfRange {
                kind: EntityKind::Ship,
                slot: 5,
                capacity: SHIP_GEAR_SLOTS,
            })
        );
    }

    #[test]
    fn created_entities_link_up() {
        let result = apply(&Graph::new(), |d| {
            let org = d.create_org(OrgType::Single)?;
            let fleet = d.create_fleet()?;
            let ship = d.create_ship(131)?;
            let gear = d.create_gear(1)?;
            d.set_ship_overflow(&ship, Some(gear))?;
            d.set_fleet_ship(&fleet, 0, Some(ship))?;
            d.set_org_fleet(&org, 0, Some(fleet))
        });
        let graph = result.unwrap_or_default();
        assert_eq!(graph.len(EntityKind::Org), 1);
        assert_eq!(graph.roots().len(), 1);
        assert!(graph.dangling_references().is_empty());
    }

    #[test]
    fn squadron_list_compacts_on_clear() {
        let result = apply(&Graph::new(), |d| {
            let squadron = d.create_air_squadron(AirSquadronMode::Sortie)?;
            let a = d.create_gear(168)?;
            let b = d.create_gear(169)?;
            d.set_squadron_gear(&squadron, 0, Some(a))?;
            d.set_squadron_gear(&squadron, 2, Some(b.clone()))?;
            d.remove(EntityKind::Gear, b.as_str())
        });
        let graph = result.unwrap_or_default();
        let lens: Vec<usize> = graph
            .all::<AirSquadronEntity>()
            .map(|s| s.gears.len())
            .collect();
        assert_eq!(lens, vec![1]);
    }

    #[test]
    fn remove_tree_cascades_to_owned_rows() {
        let (graph, ship_id, _) = base();
        let result = apply(&graph, |d| {
            let removed = d.remove_tree(EntityKind::Ship, ship_id.as_str())?;
            assert_eq!(removed, 2);
            Ok(())
        });
        let graph = result.unwrap_or_default();
        assert!(graph.is_empty());
        assert!(graph.roots().is_empty());
    }

    #[test]
    fn duplicate_identifier_rejects_whole_change() {
        let (graph, ship_id, gear_id) = base();
        let before = graph.clone();
        let result = apply(&graph, |d| {
            d.create_gear(2)?;
            d.update::<ShipEntity>(&ship_id, |s| s.attrs.level = Some(99))?;
            d.insert(GearEntity {
                id: gear_id.clone(),
                ..GearEntity::new(3)
            })?;
            Ok(())
        });
        assert_eq!(
            result.err(),
            Some(GraphError::DuplicateId {
                kind: EntityKind::Gear,
                id: gear_id.to_string(),
            })
        );
        assert_eq!(graph, before);
    }

    #[test]
    fn removing_missing_row_fails_and_keeps_input() {
        let (graph, _, _) = base();
        let result = apply(&graph, |d| d.remove(EntityKind::Fleet, "nope"));
        assert!(matches!(result, Err(GraphError::InvalidReference { .. })));
    }
}
