//! Nested domain-object trees as exchanged with the client.
//!
//! These are the boundary shapes: every numbered field (`g1..g5`, `gx`,
//! `ss1..ss5`, `s1..s7`, `f1..f4`, `a1..a3`) is a separate nullable key
//! because that is what the client serializes. Internally the graph keeps
//! them as fixed-size arrays; the accessors here convert between the two.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AirSquadronMode, OrgType};
use crate::ids::{AirSquadronId, FleetId, GearId, OrgId, ShipId};

/// Numbered gear slots on a ship (`g1..g5`), not counting `gx`.
pub const SHIP_GEAR_SLOTS: usize = 5;
/// Ship positions in a fleet (`s1..s7`).
pub const FLEET_SHIP_SLOTS: usize = 7;
/// Gear positions in an air squadron (`g1..g4`).
pub const SQUADRON_GEAR_SLOTS: usize = 4;
/// Fleet positions in an organization (`f1..f4`).
pub const ORG_FLEET_SLOTS: usize = 4;
/// Air squadron positions in an organization (`a1..a3`).
pub const ORG_SQUADRON_SLOTS: usize = 3;

// ---------------------------------------------------------------------------
// Gear
// ---------------------------------------------------------------------------

/// An equipped gear instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GearState {
    /// Instance identifier; allocated on normalization when missing.
    pub id: Option<GearId>,
    /// Master data identifier of the gear.
    pub gear_id: u32,
    /// Aircraft proficiency experience.
    pub exp: Option<i32>,
    /// Improvement level (0-10).
    pub stars: Option<i32>,
}

impl GearState {
    /// A gear of the given master ID with no instance data.
    pub const fn new(gear_id: u32) -> Self {
        Self {
            id: None,
            gear_id,
            exp: None,
            stars: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ship
// ---------------------------------------------------------------------------

/// Scalar attributes of a ship instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShipAttributes {
    /// Ship level.
    pub level: Option<i32>,
    /// Current hit points.
    pub current_hp: Option<i32>,
    /// Morale (condition) value.
    pub morale: Option<i32>,
    /// Remaining ammo.
    pub ammo: Option<i32>,
    /// Remaining fuel.
    pub fuel: Option<i32>,
    /// Max HP modernization.
    pub max_hp_mod: Option<i32>,
    /// Firepower modernization.
    pub firepower_mod: Option<i32>,
    /// Torpedo modernization.
    pub torpedo_mod: Option<i32>,
    /// Armor modernization.
    pub armor_mod: Option<i32>,
    /// Anti-air modernization.
    pub anti_air_mod: Option<i32>,
    /// Evasion modernization.
    pub evasion_mod: Option<i32>,
    /// Anti-submarine modernization.
    pub asw_mod: Option<i32>,
    /// Line of sight modernization.
    pub los_mod: Option<i32>,
    /// Luck modernization.
    pub luck_mod: Option<i32>,
}

/// A ship instance with its equipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShipState {
    /// Instance identifier; allocated on normalization when missing.
    pub id: Option<ShipId>,
    /// Master data identifier of the ship.
    pub ship_id: u32,
    /// Scalar attributes, flattened into the same object.
    #[serde(flatten)]
    pub attrs: ShipAttributes,
    /// Gear slot 1.
    pub g1: Option<GearState>,
    /// Gear slot 2.
    pub g2: Option<GearState>,
    /// Gear slot 3.
    pub g3: Option<GearState>,
    /// Gear slot 4.
    pub g4: Option<GearState>,
    /// Gear slot 5.
    pub g5: Option<GearState>,
    /// Reinforcement expansion (overflow) slot.
    pub gx: Option<GearState>,
    /// Slot size 1.
    pub ss1: Option<i32>,
    /// Slot size 2.
    pub ss2: Option<i32>,
    /// Slot size 3.
    pub ss3: Option<i32>,
    /// Slot size 4.
    pub ss4: Option<i32>,
    /// Slot size 5.
    pub ss5: Option<i32>,
}

impl ShipState {
    /// A ship of the given master ID with empty slots.
    pub fn new(ship_id: u32) -> Self {
        Self {
            ship_id,
            ..Self::default()
        }
    }

    /// The numbered gear slots as an array.
    pub const fn gear_slots(&self) -> [Option<&GearState>; SHIP_GEAR_SLOTS] {
        [
            self.g1.as_ref(),
            self.g2.as_ref(),
            self.g3.as_ref(),
            self.g4.as_ref(),
            self.g5.as_ref(),
        ]
    }

    /// Replace the numbered gear slots from an array.
    pub fn set_gear_slots(&mut self, slots: [Option<GearState>; SHIP_GEAR_SLOTS]) {
        let [g1, g2, g3, g4, g5] = slots;
        self.g1 = g1;
        self.g2 = g2;
        self.g3 = g3;
        self.g4 = g4;
        self.g5 = g5;
    }

    /// The slot sizes as an array.
    pub const fn slot_sizes(&self) -> [Option<i32>; SHIP_GEAR_SLOTS] {
        [self.ss1, self.ss2, self.ss3, self.ss4, self.ss5]
    }

    /// Replace the slot sizes from an array.
    pub const fn set_slot_sizes(&mut self, sizes: [Option<i32>; SHIP_GEAR_SLOTS]) {
        let [ss1, ss2, ss3, ss4, ss5] = sizes;
        self.ss1 = ss1;
        self.ss2 = ss2;
        self.ss3 = ss3;
        self.ss4 = ss4;
        self.ss5 = ss5;
    }
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

/// A fleet of up to seven ships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FleetState {
    /// Fleet identifier; allocated on normalization when missing.
    pub id: Option<FleetId>,
    /// Declared fleet length (6 or 7).
    pub len: Option<i32>,
    /// Ship position 1 (flagship).
    pub s1: Option<ShipState>,
    /// Ship position 2.
    pub s2: Option<ShipState>,
    /// Ship position 3.
    pub s3: Option<ShipState>,
    /// Ship position 4.
    pub s4: Option<ShipState>,
    /// Ship position 5.
    pub s5: Option<ShipState>,
    /// Ship position 6.
    pub s6: Option<ShipState>,
    /// Ship position 7.
    pub s7: Option<ShipState>,
}

impl FleetState {
    /// The ship positions as an array.
    pub const fn ship_slots(&self) -> [Option<&ShipState>; FLEET_SHIP_SLOTS] {
        [
            self.s1.as_ref(),
            self.s2.as_ref(),
            self.s3.as_ref(),
            self.s4.as_ref(),
            self.s5.as_ref(),
            self.s6.as_ref(),
            self.s7.as_ref(),
        ]
    }

    /// Replace the ship positions from an array.
    pub fn set_ship_slots(&mut self, slots: [Option<ShipState>; FLEET_SHIP_SLOTS]) {
        let [s1, s2, s3, s4, s5, s6, s7] = slots;
        self.s1 = s1;
        self.s2 = s2;
        self.s3 = s3;
        self.s4 = s4;
        self.s5 = s5;
        self.s6 = s6;
        self.s7 = s7;
    }
}

// ---------------------------------------------------------------------------
// Air squadron
// ---------------------------------------------------------------------------

/// A land-based air squadron of up to four aircraft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AirSquadronState {
    /// Squadron identifier; allocated on normalization when missing.
    pub id: Option<AirSquadronId>,
    /// Operating mode.
    pub mode: Option<AirSquadronMode>,
    /// Aircraft 1.
    pub g1: Option<GearState>,
    /// Aircraft 2.
    pub g2: Option<GearState>,
    /// Aircraft 3.
    pub g3: Option<GearState>,
    /// Aircraft 4.
    pub g4: Option<GearState>,
    /// Slot size 1.
    pub ss1: Option<i32>,
    /// Slot size 2.
    pub ss2: Option<i32>,
    /// Slot size 3.
    pub ss3: Option<i32>,
    /// Slot size 4.
    pub ss4: Option<i32>,
}

impl AirSquadronState {
    /// The aircraft positions as an array.
    pub const fn gear_slots(&self) -> [Option<&GearState>; SQUADRON_GEAR_SLOTS] {
        [
            self.g1.as_ref(),
            self.g2.as_ref(),
            self.g3.as_ref(),
            self.g4.as_ref(),
        ]
    }

    /// Replace the aircraft positions from an array.
    pub fn set_gear_slots(&mut self, slots: [Option<GearState>; SQUADRON_GEAR_SLOTS]) {
        let [g1, g2, g3, g4] = slots;
        self.g1 = g1;
        self.g2 = g2;
        self.g3 = g3;
        self.g4 = g4;
    }

    /// The slot sizes as an array.
    pub const fn slot_sizes(&self) -> [Option<i32>; SQUADRON_GEAR_SLOTS] {
        [self.ss1, self.ss2, self.ss3, self.ss4]
    }

    /// Replace the slot sizes from an array.
    pub const fn set_slot_sizes(&mut self, sizes: [Option<i32>; SQUADRON_GEAR_SLOTS]) {
        let [ss1, ss2, ss3, ss4] = sizes;
        self.ss1 = ss1;
        self.ss2 = ss2;
        self.ss3 = ss3;
        self.ss4 = ss4;
    }
}

// ---------------------------------------------------------------------------
// Organization
// ---------------------------------------------------------------------------

/// An organization: the top-level aggregate edited by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OrgState {
    /// Organization identifier; allocated on normalization when missing.
    pub id: Option<OrgId>,
    /// Fleet 1 (main fleet).
    pub f1: Option<FleetState>,
    /// Fleet 2 (escort fleet when combined).
    pub f2: Option<FleetState>,
    /// Fleet 3.
    pub f3: Option<FleetState>,
    /// Fleet 4.
    pub f4: Option<FleetState>,
    /// Air squadron 1.
    pub a1: Option<AirSquadronState>,
    /// Air squadron 2.
    pub a2: Option<AirSquadronState>,
    /// Air squadron 3.
    pub a3: Option<AirSquadronState>,
    /// Headquarters level.
    pub hq_level: Option<i32>,
    /// Composition type.
    pub org_type: Option<OrgType>,
}

impl OrgState {
    /// The fleet positions as an array.
    pub const fn fleet_slots(&self) -> [Option<&FleetState>; ORG_FLEET_SLOTS] {
        [
            self.f1.as_ref(),
            self.f2.as_ref(),
            self.f3.as_ref(),
            self.f4.as_ref(),
        ]
    }

    /// Replace the fleet positions from an array.
    pub fn set_fleet_slots(&mut self, slots: [Option<FleetState>; ORG_FLEET_SLOTS]) {
        let [f1, f2, f3, f4] = slots;
        self.f1 = f1;
        self.f2 = f2;
        self.f3 = f3;
        self.f4 = f4;
    }

    /// The air squadron positions as an array.
    pub const fn squadron_slots(&self) -> [Option<&AirSquadronState>; ORG_SQUADRON_SLOTS] {
        [self.a1.as_ref(), self.a2.as_ref(), self.a3.as_ref()]
    }

    /// Replace the air squadron positions from an array.
    pub fn set_squadron_slots(&mut self, slots: [Option<AirSquadronState>; ORG_SQUADRON_SLOTS]) {
        let [a1, a2, a3] = slots;
        self.a1 = a1;
        self.a2 = a2;
        self.a3 = a3;
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn ship_reads_numbered_keys() {
        let json = serde_json::json!({
            "id": "s-1",
            "ship_id": 131,
            "level": 99,
            "g1": { "id": "g-1", "gear_id": 1, "exp": null, "stars": 10 },
            "gx": { "gear_id": 43 },
            "ss1": 3
        });
        let ship: Result<ShipState, _> = serde_json::from_value(json);
        assert!(ship.is_ok());
        let ship = ship.unwrap_or_default();
        assert_eq!(ship.attrs.level, Some(99));
        assert_eq!(ship.gear_slots()[0].map(|g| g.gear_id), Some(1));
        assert_eq!(ship.gx.as_ref().map(|g| g.gear_id), Some(43));
        assert!(ship.g2.is_none());
        assert_eq!(ship.slot_sizes(), [Some(3), None, None, None, None]);
    }

    #[test]
    fn absent_children_serialize_as_null() {
        let ship = ShipState::new(1);
        let json = serde_json::to_value(&ship).unwrap_or_default();
        assert_eq!(json.get("g3"), Some(&serde_json::Value::Null));
        assert_eq!(json.get("level"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn slot_setters_round_trip_arrays() {
        let mut fleet = FleetState::default();
        let mut ships: [Option<ShipState>; FLEET_SHIP_SLOTS] = Default::default();
        ships[6] = Some(ShipState::new(7));
        fleet.set_ship_slots(ships);
        assert_eq!(fleet.s7.as_ref().map(|s| s.ship_id), Some(7));
        assert_eq!(fleet.ship_slots().iter().filter(|s| s.is_some()).count(), 1);
    }
}
