//! Opaque ID newtypes for design entities.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// ID of a cell type in the logical library.
    CellTypeId
);

define_id!(
    /// ID of a placement site instance.
    SiteInstId
);

define_id!(
    /// ID of a physical pin on a site (a site pin instance).
    SitePinId
);

define_id!(
    /// ID of a physical net.
    PhysNetId
);

define_id!(
    /// ID of a leaf cell bound to a site and BEL.
    PlacedCellId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip() {
        let id = SitePinId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(<SitePinId as ArenaId>::from_raw(7).as_raw(), 7);
    }

    #[test]
    fn ids_order_by_index() {
        assert!(PhysNetId::from_raw(1) < PhysNetId::from_raw(2));
    }
}
