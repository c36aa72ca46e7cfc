//! In-memory model of a placed-and-routed FPGA design.
//!
//! A [`Design`] couples a hierarchical [`LogicalNetlist`] (cell types owning
//! ports, nets and child instances) with a [`PhysicalDesign`] overlay (sites,
//! placed cells bound to BELs, site pins, physical nets and their routes).
//!
//! The model is deliberately small: it carries exactly what probe rewiring
//! needs. Hierarchical lookup, net editing, intra-site routing, a
//! [`GlobalRouter`] seam and a compressed, checksummed checkpoint container.
//!
//! All lookups by hierarchical name return `Option`; a missing instance or
//! net is an ordinary outcome, not an error.

#![warn(missing_docs)]

pub mod arena;
pub mod checkpoint;
pub mod connectivity;
pub mod error;
pub mod ids;
pub mod logical;
pub mod physical;
pub mod router;

pub use arena::{Arena, ArenaId};
pub use checkpoint::{
    load_checkpoint, modified_time, read_header, save_checkpoint, CheckpointHeader, Design,
};
pub use error::{CheckpointError, NetlistError, RouterError};
pub use ids::{CellTypeId, PhysNetId, PlacedCellId, SiteInstId, SitePinId};
pub use logical::{
    CellInst, CellType, HierInst, HierNet, HierPortInst, LogicalNetlist, Net, Port,
    PortDirection, PortInst,
};
pub use physical::{PhysNet, PhysicalDesign, PlacedCell, RoutePath, SiteInst, SitePin, SiteRoute};
pub use router::{DirectRouter, GlobalRouter, RouteSummary};
