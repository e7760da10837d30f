//! Normalized row types, one per entity kind.
//!
//! A row holds its own scalar attributes verbatim and refers to nested
//! entities only by identifier. Numbered slots are fixed-size arrays; the
//! ship's reinforcement slot (`gx`) is a separately named field so it can
//! never be confused with a numbered slot.
//!
//! Air squadron gears are the one compacting slot list: trailing empty
//! positions are dropped whenever the list changes, so its length always
//! equals the last occupied position.

use core::borrow::Borrow;
use core::fmt::{Debug, Display};

use armada_types::{
    AirSquadronId, AirSquadronMode, EntityKind, FLEET_SHIP_SLOTS, FleetId, GearId,
    ORG_FLEET_SLOTS, ORG_SQUADRON_SLOTS, OrgId, OrgType, SHIP_GEAR_SLOTS, SQUADRON_GEAR_SLOTS,
    ShipAttributes, ShipId,
};

use crate::graph::Graph;
use crate::table::Table;

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// A kind-tagged pointer to a row, used where the kind is only known at
/// runtime (integrity scans, removal, roots).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference {
    /// Kind of the referenced row.
    pub kind: EntityKind,
    /// Identifier of the referenced row.
    pub id: String,
}

impl Reference {
    /// Create a reference.
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    fn to(kind: EntityKind, id: &impl AsRef<str>) -> Self {
        Self::new(kind, id.as_ref())
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// Entity trait
// ---------------------------------------------------------------------------

/// A row type stored in one of the graph's tables.
pub trait Entity: Clone + Debug + PartialEq {
    /// The typed identifier of this kind.
    type Id: Clone + Ord + Debug + Display + AsRef<str> + Borrow<str> + From<String>;

    /// The kind tag of this table.
    const KIND: EntityKind;

    /// The row's identifier.
    fn id(&self) -> &Self::Id;

    /// The table holding rows of this kind.
    fn table(graph: &Graph) -> &Table<Self>;

    /// Mutable access to the table holding rows of this kind.
    fn table_mut(graph: &mut Graph) -> &mut Table<Self>;

    /// Every non-absent reference held by this row.
    fn references(&self) -> Vec<Reference>;

    /// References to rows this row owns (its subtree), for cascading removal.
    ///
    /// Defaults to every reference.
    fn owned(&self) -> Vec<Reference> {
        self.references()
    }

    /// Set every reference to `target` to absent. Returns how many were
    /// cleared.
    fn clear_references_to(&mut self, target: &Reference) -> usize;
}

/// Clear every slot in `slots` equal to `target`.
fn clear_slots<I: AsRef<str>>(slots: &mut [Option<I>], target: &str) -> usize {
    let mut cleared = 0_usize;
    for slot in slots.iter_mut() {
        if slot.as_ref().is_some_and(|id| id.as_ref() == target) {
            *slot = None;
            cleared = cleared.saturating_add(1);
        }
    }
    cleared
}

fn slot_refs<I: AsRef<str>>(kind: EntityKind, slots: &[Option<I>]) -> Vec<Reference> {
    slots
        .iter()
        .flatten()
        .map(|id| Reference::to(kind, id))
        .collect()
}

// ---------------------------------------------------------------------------
// Gear
// ---------------------------------------------------------------------------

/// A normalized gear row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearEntity {
    /// Row identifier.
    pub id: GearId,
    /// Master data identifier.
    pub gear_id: u32,
    /// Aircraft proficiency experience.
    pub exp: Option<i32>,
    /// Improvement level.
    pub stars: Option<i32>,
}

impl GearEntity {
    /// A fresh gear with an allocated identifier.
    pub fn new(gear_id: u32) -> Self {
        Self {
            id: GearId::new(),
            gear_id,
            exp: None,
            stars: None,
        }
    }
}

impl Entity for GearEntity {
    type Id = GearId;
    const KIND: EntityKind = EntityKind::Gear;

    fn id(&self) -> &GearId {
        &self.id
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.gears
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        std::sync::Arc::make_mut(&mut graph.gears)
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn clear_references_to(&mut self, _target: &Reference) -> usize {
        0
    }
}

// ---------------------------------------------------------------------------
// Ship
// ---------------------------------------------------------------------------

/// A normalized ship row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipEntity {
    /// Row identifier.
    pub id: ShipId,
    /// Master data identifier.
    pub ship_id: u32,
    /// Scalar attributes, copied verbatim.
    pub attrs: ShipAttributes,
    /// Numbered gear slots, fixed position.
    pub gears: [Option<GearId>; SHIP_GEAR_SLOTS],
    /// Reinforcement expansion slot.
    pub gx: Option<GearId>,
    /// Slot sizes for the numbered slots.
    pub slot_sizes: [Option<i32>; SHIP_GEAR_SLOTS],
}

impl ShipEntity {
    /// A fresh ship with an allocated identifier and empty slots.
    pub fn new(ship_id: u32) -> Self {
        Self {
            id: ShipId::new(),
            ship_id,
            attrs: ShipAttributes::default(),
            gears: Default::default(),
            gx: None,
            slot_sizes: [None; SHIP_GEAR_SLOTS],
        }
    }
}

impl Entity for ShipEntity {
    type Id = ShipId;
    const KIND: EntityKind = EntityKind::Ship;

    fn id(&self) -> &ShipId {
        &self.id
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.ships
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        std::sync::Arc::make_mut(&mut graph.ships)
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = slot_refs(EntityKind::Gear, &self.gears);
        if let Some(gx) = &self.gx {
            refs.push(Reference::to(EntityKind::Gear, gx));
        }
        refs
    }

    fn clear_references_to(&mut self, target: &Reference) -> usize {
        if target.kind != EntityKind::Gear {
            return 0;
        }
        let mut cleared = clear_slots(&mut self.gears, &target.id);
        if self.gx.as_ref().is_some_and(|g| g.as_str() == target.id) {
            self.gx = None;
            cleared = cleared.saturating_add(1);
        }
        cleared
    }
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

/// A normalized fleet row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FleetEntity {
    /// Row identifier.
    pub id: FleetId,
    /// Declared fleet length.
    pub len: Option<i32>,
    /// Ship positions, fixed position.
    pub ships: [Option<ShipId>; FLEET_SHIP_SLOTS],
}

impl Entity for FleetEntity {
    type Id = FleetId;
    const KIND: EntityKind = EntityKind::Fleet;

    fn id(&self) -> &FleetId {
        &self.id
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.fleets
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        std::sync::Arc::make_mut(&mut graph.fleets)
    }

    fn references(&self) -> Vec<Reference> {
        slot_refs(EntityKind::Ship, &self.ships)
    }

    fn clear_references_to(&mut self, target: &Reference) -> usize {
        if target.kind == EntityKind::Ship {
            clear_slots(&mut self.ships, &target.id)
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Air squadron
// ---------------------------------------------------------------------------

/// A normalized air squadron row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AirSquadronEntity {
    /// Row identifier.
    pub id: AirSquadronId,
    /// Operating mode.
    pub mode: Option<AirSquadronMode>,
    /// Aircraft, compacting: never longer than the last occupied position
    /// and never longer than [`SQUADRON_GEAR_SLOTS`].
    pub gears: Vec<Option<GearId>>,
    /// Slot sizes per position.
    pub slot_sizes: [Option<i32>; SQUADRON_GEAR_SLOTS],
}

impl AirSquadronEntity {
    /// Drop trailing empty positions.
    pub fn compact(&mut self) {
        while self.gears.last().is_some_and(Option::is_none) {
            self.gears.pop();
        }
    }
}

impl Entity for AirSquadronEntity {
    type Id = AirSquadronId;
    const KIND: EntityKind = EntityKind::AirSquadron;

    fn id(&self) -> &AirSquadronId {
        &self.id
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.air_squadrons
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        std::sync::Arc::make_mut(&mut graph.air_squadrons)
    }

    fn references(&self) -> Vec<Reference> {
        slot_refs(EntityKind::Gear, &self.gears)
    }

    fn clear_references_to(&mut self, target: &Reference) -> usize {
        if target.kind != EntityKind::Gear {
            return 0;
        }
        let cleared = clear_slots(&mut self.gears, &target.id);
        self.compact();
        cleared
    }
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// A normalized organization row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrgEntity {
    /// Row identifier.
    pub id: OrgId,
    /// Headquarters level.
    pub hq_level: Option<i32>,
    /// Composition type.
    pub org_type: Option<OrgType>,
    /// Fleet positions.
    pub fleets: [Option<FleetId>; ORG_FLEET_SLOTS],
    /// Air squadron positions.
    pub air_squadrons: [Option<AirSquadronId>; ORG_SQUADRON_SLOTS],
}

impl Entity for OrgEntity {
    type Id = OrgId;
    const KIND: EntityKind = EntityKind::Org;

    fn id(&self) -> &OrgId {
        &self.id
    }

    fn table(graph: &Graph) -> &Table<Self> {
        &graph.orgs
    }

    fn table_mut(graph: &mut Graph) -> &mut Table<Self> {
        std::sync::Arc::make_mut(&mut graph.orgs)
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = slot_refs(EntityKind::Fleet, &self.fleets);
        refs.extend(slot_refs(EntityKind::AirSquadron, &self.air_squadrons));
        refs
    }

    fn clear_references_to(&mut self, target: &Reference) -> usize {
        match target.kind {
            EntityKind::Fleet => clear_slots(&mut self.fleets, &target.id),
            EntityKind::AirSquadron => clear_slots(&mut self.air_squadrons, &target.id),
            EntityKind::Gear | EntityKind::Ship | EntityKind::Org => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Kind-erased borrow
// ---------------------------------------------------------------------------

/// A borrowed row of any kind, returned by [`Graph::get_any`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyEntity<'a> {
    /// A gear row.
    Gear(&'a GearEntity),
    /// A ship row.
    Ship(&'a ShipEntity),
    /// A fleet row.
    Fleet(&'a FleetEntity),
    /// An air squadron row.
    AirSquadron(&'a AirSquadronEntity),
    /// An organization row.
    Org(&'a OrgEntity),
}

impl AnyEntity<'_> {
    /// The kind of the borrowed row.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Gear(_) => EntityKind::Gear,
            Self::Ship(_) => EntityKind::Ship,
            Self::Fleet(_) => EntityKind::Fleet,
            Self::AirSquadron(_) => EntityKind::AirSquadron,
            Self::Org(_) => EntityKind::Org,
        }
    }

    /// The row identifier as a string.
    pub fn id(&self) -> &str {
        match self {
            Self::Gear(e) => e.id.as_str(),
            Self::Ship(e) => e.id.as_str(),
            Self::Fleet(e) => e.id.as_str(),
            Self::AirSquadron(e) => e.id.as_str(),
            Self::Org(e) => e.id.as_str(),
        }
    }

    /// Every reference the row holds.
    pub fn references(&self) -> Vec<Reference> {
        match self {
            Self::Gear(e) => e.references(),
            Self::Ship(e) => e.references(),
            Self::Fleet(e) => e.references(),
            Self::AirSquadron(e) => e.references(),
            Self::Org(e) => e.references(),
        }
    }
}
