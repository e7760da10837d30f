//! Shared type definitions for the Armada fleet catalog.
//!
//! This crate is the single source of truth for the shapes that cross crate
//! boundaries: the nested organization trees the client edits, the typed
//! identifiers that link normalized entities, and the row records exchanged
//! with the spreadsheet store. Tree types flow downstream to `TypeScript`
//! via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Typed string identifiers and the process-wide allocator
//! - [`enums`] -- Entity kinds, organization types, squadron modes
//! - [`state`] -- Nested gear/ship/fleet/air squadron/org trees
//! - [`row`] -- Cell values, rows, datasets, and column schemas

pub mod enums;
pub mod ids;
pub mod row;
pub mod state;

// Re-export all public types at crate root for convenience.
pub use enums::{AirSquadronMode, EntityKind, OrgType};
pub use ids::{AirSquadronId, FleetId, GearId, OrgId, ShipId, new_id};
pub use row::{CellValue, ColumnSchema, Dataset, Row};
pub use state::{
    AirSquadronState, FLEET_SHIP_SLOTS, FleetState, GearState, ORG_FLEET_SLOTS,
    ORG_SQUADRON_SLOTS, OrgState, SHIP_GEAR_SLOTS, SQUADRON_GEAR_SLOTS, ShipAttributes, ShipState,
};
