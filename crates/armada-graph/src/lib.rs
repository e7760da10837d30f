//! Normalized entity graph for the Armada fleet catalog.
//!
//! Organizations arrive as deeply nested trees (org → fleets → ships →
//! gears). Editing those trees in place would duplicate shared data and make
//! references fragile, so this crate flattens them into one ID-keyed table
//! per entity kind and links rows by typed identifier.
//!
//! # Architecture
//!
//! - [`graph`] -- The [`Graph`]: per-kind tables plus root references.
//! - [`entity`] -- Normalized row types and the [`Entity`] trait.
//! - [`table`] -- Insertion-ordered, `Arc`-shared [`Table`].
//! - [`normalize`] -- Tree ↔ graph conversion ([`Normalize`]).
//! - [`draft`] -- Copy-on-write change application ([`apply`], [`Draft`]).
//!
//! # Referential Integrity
//!
//! Every reference held by any row resolves to an existing row of the
//! referenced kind, or is absent. [`apply`] checks this after every recipe
//! and rejects the whole change otherwise; removal clears every reference to
//! the removed row before the check runs.
//!
//! # Usage
//!
//! ```
//! use armada_graph::{Graph, apply};
//! use armada_types::{EntityKind, GearState, ShipState};
//!
//! let mut ship = ShipState::new(131);
//! ship.g1 = Some(GearState::new(1));
//! let (graph, ship_id) = Graph::normalize(&ship).ok().unwrap_or_default();
//! assert_eq!(graph.len(EntityKind::Gear), 1);
//!
//! // Drop the gear; the ship's slot is cleared in the same change.
//! let gear_id = graph
//!     .get::<armada_graph::ShipEntity>(&ship_id)
//!     .and_then(|s| s.gears[0].clone());
//! let next = apply(&graph, |draft| {
//!     if let Some(gear) = &gear_id {
//!         draft.remove(EntityKind::Gear, gear.as_str())?;
//!     }
//!     Ok(())
//! });
//! assert!(next.is_ok());
//! assert_eq!(graph.len(EntityKind::Gear), 1);
//! ```

pub mod draft;
pub mod entity;
pub mod graph;
pub mod normalize;
pub mod table;

// Re-export primary types at crate root.
pub use draft::{Draft, apply};
pub use entity::{
    AirSquadronEntity, AnyEntity, Entity, FleetEntity, GearEntity, OrgEntity, Reference,
    ShipEntity,
};
pub use graph::Graph;
pub use normalize::{Normalize, denormalize, normalize};
pub use table::Table;

use armada_types::EntityKind;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when building, reading, or changing a graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A stored reference does not resolve.
    ///
    /// Only reachable if the integrity invariant was broken upstream;
    /// callers should treat it as a bug, not a recoverable condition.
    #[error("dangling reference to {kind} {id}")]
    DanglingReference {
        /// Kind of the missing row.
        kind: EntityKind,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// A change named an entity that does not exist. Nothing was applied.
    #[error("invalid reference to {kind} {id}")]
    InvalidReference {
        /// Kind of the missing row.
        kind: EntityKind,
        /// Identifier that does not exist.
        id: String,
    },

    /// A row with this identifier already exists in its table.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId {
        /// Kind of the table.
        kind: EntityKind,
        /// The repeated identifier.
        id: String,
    },

    /// A slot index is outside the entity's declared capacity.
    #[error("{kind} slot {slot} out of range (capacity {capacity})")]
    SlotOutOfRange {
        /// Kind of the entity holding the slots.
        kind: EntityKind,
        /// The requested zero-based slot.
        slot: usize,
        /// Number of numbered slots the kind declares.
        capacity: usize,
    },

    /// A root identifier passed to denormalization does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of the requested root.
        kind: EntityKind,
        /// The requested identifier.
        id: String,
    },
}
