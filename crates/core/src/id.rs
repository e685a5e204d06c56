//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_newtype!(
    /// Identifier of a user (actor identity).
    UserId,
    "UserId"
);
uuid_newtype!(
    /// Identifier of a persisted stock record (quantity at a location pair).
    StockRecordId,
    "StockRecordId"
);
uuid_newtype!(
    /// Identifier of the item kind a stock record counts.
    ItemKindId,
    "ItemKindId"
);
uuid_newtype!(WarehouseId, "WarehouseId");
uuid_newtype!(ShelfId, "ShelfId");
uuid_newtype!(
    /// Identifier of an abstract catalog (nomenclature) entry.
    CatalogEntryId,
    "CatalogEntryId"
);
uuid_newtype!(TaskId, "TaskId");
uuid_newtype!(
    /// Identifier of a workflow step definition.
    StepId,
    "StepId"
);
uuid_newtype!(
    /// Identifier of a step instance within a concrete task.
    StepAssignmentId,
    "StepAssignmentId"
);
uuid_newtype!(StepResultId, "StepResultId");
uuid_newtype!(BomLineId, "BomLineId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_rejected_with_type_name() {
        let err = "not-a-uuid".parse::<StockRecordId>().unwrap_err();
        match err {
            DomainError::InvalidId(msg) => assert!(msg.starts_with("StockRecordId")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ids_round_trip_through_display() {
        let id = StepAssignmentId::new();
        let parsed: StepAssignmentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
