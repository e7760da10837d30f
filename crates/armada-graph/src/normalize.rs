//! Conversion between nested trees and the normalized graph.
//!
//! Normalization is one top-down traversal: every node lacking an identifier
//! gets one from the allocator, scalar fields are copied verbatim, and each
//! nested node is replaced by its identifier and inserted into its own table.
//! Denormalization walks the same shape back out.

use armada_types::{
    AirSquadronState, FLEET_SHIP_SLOTS, FleetState, GearId, GearState, ORG_FLEET_SLOTS,
    ORG_SQUADRON_SLOTS, OrgState, SHIP_GEAR_SLOTS, SQUADRON_GEAR_SLOTS, ShipState,
};

use crate::GraphError;
use crate::entity::{AirSquadronEntity, Entity, FleetEntity, GearEntity, OrgEntity, ShipEntity};
use crate::graph::Graph;

/// The identifier type of the entity a tree normalizes to.
pub type IdOf<T> = <<T as Normalize>::Entity as Entity>::Id;

/// A nested tree that can be flattened into a [`Graph`] and rebuilt from it.
pub trait Normalize: Sized {
    /// The row type the tree's root becomes.
    type Entity: Entity;

    /// Insert this tree's nodes into `graph`, returning the root identifier.
    ///
    /// On error the graph may hold part of the tree; callers that need
    /// atomicity go through [`Graph::insert_tree`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateId`] if an identifier is already taken.
    fn normalize_into(&self, graph: &mut Graph) -> Result<IdOf<Self>, GraphError>;

    /// Rebuild the tree rooted at `id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if `id` itself is missing and
    /// [`GraphError::DanglingReference`] if a nested reference is.
    fn denormalize_from(graph: &Graph, id: &str) -> Result<Self, GraphError>;
}

/// Normalize `tree` into a fresh graph.
///
/// # Errors
///
/// See [`Graph::normalize`].
pub fn normalize<T: Normalize>(tree: &T) -> Result<(Graph, IdOf<T>), GraphError> {
    Graph::normalize(tree)
}

/// Rebuild the tree rooted at `root`.
///
/// # Errors
///
/// See [`Graph::denormalize`].
pub fn denormalize<T: Normalize>(graph: &Graph, root: &IdOf<T>) -> Result<T, GraphError> {
    graph.denormalize(root)
}

/// Look up a root row, failing with `NotFound`.
fn lookup<'g, E: Entity>(graph: &'g Graph, id: &str) -> Result<&'g E, GraphError> {
    E::table(graph).get(id).ok_or_else(|| GraphError::NotFound {
        kind: E::KIND,
        id: id.to_owned(),
    })
}

/// Rebuild a nested child. A missing child means the graph is corrupt.
fn child<T: Normalize>(
    graph: &Graph,
    id: Option<&impl AsRef<str>>,
) -> Result<Option<T>, GraphError> {
    let Some(id) = id else {
        return Ok(None);
    };
    match T::denormalize_from(graph, id.as_ref()) {
        Ok(tree) => Ok(Some(tree)),
        Err(GraphError::NotFound { kind, id }) => {
            tracing::error!(%kind, %id, "dangling reference during denormalization");
            Err(GraphError::DanglingReference { kind, id })
        }
        Err(err) => Err(err),
    }
}

/// Normalize an optional child, yielding its identifier.
fn nest<T: Normalize>(
    graph: &mut Graph,
    node: Option<&T>,
) -> Result<Option<IdOf<T>>, GraphError> {
    node.map(|n| n.normalize_into(graph)).transpose()
}

/// Normalize a fixed array of optional children.
fn nest_all<T: Normalize, const N: usize>(
    graph: &mut Graph,
    nodes: [Option<&T>; N],
) -> Result<[Option<IdOf<T>>; N], GraphError> {
    let mut ids: [Option<IdOf<T>>; N] = core::array::from_fn(|_| None);
    for (slot, node) in ids.iter_mut().zip(nodes) {
        *slot = nest(graph, node)?;
    }
    Ok(ids)
}

/// Rebuild a fixed array of optional children.
fn child_all<T: Normalize, I: AsRef<str>, const N: usize>(
    graph: &Graph,
    ids: &[Option<I>; N],
) -> Result<[Option<T>; N], GraphError> {
    let mut nodes: [Option<T>; N] = core::array::from_fn(|_| None);
    for (slot, id) in nodes.iter_mut().zip(ids) {
        *slot = child(graph, id.as_ref())?;
    }
    Ok(nodes)
}

// ---------------------------------------------------------------------------
// Gear
// ---------------------------------------------------------------------------

impl Normalize for GearState {
    type Entity = GearEntity;

    fn normalize_into(&self, graph: &mut Graph) -> Result<IdOf<Self>, GraphError> {
        let row = GearEntity {
            id: self.id.clone().unwrap_or_default(),
            gear_id: self.gear_id,
            exp: self.exp,
            stars: self.stars,
        };
        let id = row.id.clone();
        GearEntity::table_mut(graph).insert(row)?;
        Ok(id)
    }

    fn denormalize_from(graph: &Graph, id: &str) -> Result<Self, GraphError> {
        let row = lookup::<GearEntity>(graph, id)?;
        Ok(Self {
            id: Some(row.id.clone()),
            gear_id: row.gear_id,
            exp: row.exp,
            stars: row.stars,
        })
    }
}

// ---------------------------------------------------------------------------
// Ship
// ---------------------------------------------------------------------------

impl Normalize for ShipState {
    type Entity = ShipEntity;

    fn normalize_into(&self, graph: &mut Graph) -> Result<IdOf<Self>, GraphError> {
        let gears: [_; SHIP_GEAR_SLOTS] = nest_all(graph, self.gear_slots())?;
        let gx = nest(graph, self.gx.as_ref())?;
        let row = ShipEntity {
            id: self.id.clone().unwrap_or_default(),
            ship_id: self.ship_id,
            attrs: self.attrs.clone(),
            gears,
            gx,
            slot_sizes: self.slot_sizes(),
        };
        let id = row.id.clone();
        ShipEntity::table_mut(graph).insert(row)?;
        Ok(id)
    }

    fn denormalize_from(graph: &Graph, id: &str) -> Result<Self, GraphError> {
        let row = lookup::<ShipEntity>(graph, id)?;
        let mut ship = Self {
            id: Some(row.id.clone()),
            ship_id: row.ship_id,
            attrs: row.attrs.clone(),
            gx: child(graph, row.gx.as_ref())?,
            ..Self::default()
        };
        ship.set_gear_slots(child_all(graph, &row.gears)?);
        ship.set_slot_sizes(row.slot_sizes);
        Ok(ship)
    }
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

impl Normalize for FleetState {
    type Entity = FleetEntity;

    fn normalize_into(&self, graph: &mut Graph) -> Result<IdOf<Self>, GraphError> {
        let ships: [_; FLEET_SHIP_SLOTS] = nest_all(graph, self.ship_slots())?;
        let row = FleetEntity {
            id: self.id.clone().unwrap_or_default(),
            len: self.len,
            ships,
        };
        let id = row.id.clone();
        FleetEntity::table_mut(graph).insert(row)?;
        Ok(id)
    }

    fn denormalize_from(graph: &Graph, id: &str) -> Result<Self, GraphError> {
        let row = lookup::<FleetEntity>(graph, id)?;
        let mut fleet = Self {
            id: Some(row.id.clone()),
            len: row.len,
            ..Self::default()
        };
        fleet.set_ship_slots(child_all(graph, &row.ships)?);
        Ok(fleet)
    }
}

// ---------------------------------------------------------------------------
// Air squadron
// ---------------------------------------------------------------------------

impl Normalize for AirSquadronState {
    type Entity = AirSquadronEntity;

    fn normalize_into(&self, graph: &mut Graph) -> Result<IdOf<Self>, GraphError> {
        let gears: [_; SQUADRON_GEAR_SLOTS] = nest_all(graph, self.gear_slots())?;
        let mut row = AirSquadronEntity {
            id: self.id.clone().unwrap_or_default(),
            mode: self.mode,
            gears: gears.into(),
            slot_sizes: self.slot_sizes(),
        };
        row.compact();
        let id = row.id.clone();
        AirSquadronEntity::table_mut(graph).insert(row)?;
        Ok(id)
    }

    fn denormalize_from(graph: &Graph, id: &str) -> Result<Self, GraphError> {
        let row = lookup::<AirSquadronEntity>(graph, id)?;
        let mut positions: [Option<GearId>; SQUADRON_GEAR_SLOTS] = Default::default();
        for (slot, gear) in positions.iter_mut().zip(&row.gears) {
            slot.clone_from(gear);
        }
        let mut squadron = Self {
            id: Some(row.id.clone()),
            mode: row.mode,
            ..Self::default()
        };
        squadron.set_gear_slots(child_all(graph, &positions)?);
        squadron.set_slot_sizes(row.slot_sizes);
        Ok(squadron)
    }
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

impl Normalize for OrgState {
    type Entity = OrgEntity;

    fn normalize_into(&self, graph: &mut Graph) -> Result<IdOf<Self>, GraphError> {
        let fleets: [_; ORG_FLEET_SLOTS] = nest_all(graph, self.fleet_slots())?;
        let air_squadrons: [_; ORG_SQUADRON_SLOTS] = nest_all(graph, self.squadron_slots())?;
        let row = OrgEntity {
            id: self.id.clone().unwrap_or_default(),
            hq_level: self.hq_level,
            org_type: self.org_type,
            fleets,
            air_squadrons,
        };
        let id = row.id.clone();
        OrgEntity::table_mut(graph).insert(row)?;
        Ok(id)
    }

    fn denormalize_from(graph: &Graph, id: &str) -> Result<Self, GraphError> {
        let row = lookup::<OrgEntity>(graph, id)?;
        let mut org = Self {
            id: Some(row.id.clone()),
            hq_level: row.hq_level,
            org_type: row.org_type,
            ..Self::default()
        };
        org.set_fleet_slots(child_all(graph, &row.fleets)?);
        org.set_squadron_slots(child_all(graph, &row.air_squadrons)?);
        Ok(org)
    }
}
