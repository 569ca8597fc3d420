//! Typed identifiers for fleet entities.
//!
//! Identifiers come from the store as opaque strings. Wrapping them in
//! newtypes keeps a `BusId` from ever being handed to a function that
//! wanted a `RouteId`, at zero runtime cost.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_type! {
    /// Identifier of a bus.
    BusId
}

id_type! {
    /// Identifier of a route.
    RouteId
}

id_type! {
    /// Identifier of a crew member (driver or conductor).
    CrewId
}

id_type! {
    /// Canonical identifier of a depot.
    ///
    /// Only the depot registry mints these; records elsewhere carry a
    /// [`DepotRef`] until the inventory loader resolves them.
    DepotId
}

id_type! {
    /// Identifier of a trip, assigned by the store on insert.
    TripId
}

/// An unresolved depot reference as stored on a bus, route, or crew record.
///
/// Legacy data is inconsistent: the field sometimes holds the depot's
/// identifier and sometimes its display name. The inventory loader resolves
/// every `DepotRef` to a canonical [`DepotId`] before any scheduling logic
/// runs, so nothing downstream ever joins on this type.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepotRef(String);

impl DepotRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DepotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DepotRef({})", self.0)
    }
}

impl fmt::Display for DepotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&DepotId> for DepotRef {
    fn from(id: &DepotId) -> Self {
        Self(id.as_str().to_string())
    }
}
