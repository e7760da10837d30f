//! Type-safe identifier wrappers and the process-wide identity allocator.
//!
//! Every entity kind in the catalog has its own strongly-typed ID so a gear
//! identifier can never be stored in a ship slot by accident. IDs are
//! strings because externally-sourced entities (imported trees, saved
//! organizations) arrive carrying their own identifiers; those bypass the
//! allocator entirely.
//!
//! Allocated identifiers combine a per-process session prefix (taken from a
//! random UUID v4) with a monotonically growing sequence number, so they are
//! unique among everything allocated in this process and very unlikely to
//! collide with identifiers minted by another session.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Allocation sequence shared by every ID kind.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Session prefix, fixed for the lifetime of the process.
static SESSION: LazyLock<String> =
    LazyLock::new(|| Uuid::new_v4().simple().to_string().chars().take(8).collect());

/// Allocate a fresh identifier string.
///
/// Never returns the same value twice within one process. The value is not
/// derived from entity content.
pub fn new_id() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq:x}", SESSION.as_str())
}

/// Generates a newtype wrapper around a [`String`] identifier.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Allocate a new identifier from the process-wide allocator.
            pub fn new() -> Self {
                Self(new_id())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an equipped gear instance.
    GearId
}

define_id! {
    /// Unique identifier for a ship instance.
    ShipId
}

define_id! {
    /// Unique identifier for a fleet.
    FleetId
}

define_id! {
    /// Unique identifier for a land-based air squadron.
    AirSquadronId
}

define_id! {
    /// Unique identifier for an organization (the top-level aggregate).
    OrgId
}
