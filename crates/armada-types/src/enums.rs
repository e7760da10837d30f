//! Enumeration types for the fleet catalog.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The kinds of entity held in a normalized graph, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Equipment instance.
    Gear,
    /// Ship instance.
    Ship,
    /// Fleet of up to seven ships.
    Fleet,
    /// Land-based air squadron.
    AirSquadron,
    /// Organization: fleets plus air squadrons.
    Org,
}

impl EntityKind {
    /// Every kind, leaves first.
    pub const ALL: [Self; 5] = [
        Self::Gear,
        Self::Ship,
        Self::Fleet,
        Self::AirSquadron,
        Self::Org,
    ];

    /// Table name for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gear => "gears",
            Self::Ship => "ships",
            Self::Fleet => "fleets",
            Self::AirSquadron => "air_squadrons",
            Self::Org => "orgs",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Organization and squadron modes
// ---------------------------------------------------------------------------

/// Composition type of an organization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum OrgType {
    /// A single player fleet.
    #[default]
    Single,
    /// Combined fleet, carrier task force.
    CarrierTaskForce,
    /// Combined fleet, surface task force.
    SurfaceTaskForce,
    /// Combined fleet, transport escort.
    TransportEscort,
    /// A single enemy fleet.
    EnemySingle,
    /// A combined enemy fleet.
    EnemyCombined,
}

/// Operating mode of a land-based air squadron.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum AirSquadronMode {
    /// Sent out with the sortie.
    #[default]
    Sortie,
    /// Held back for base air defense.
    AirDefense,
}
