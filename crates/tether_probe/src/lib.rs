//! Probe maps and the probe rerouting engine.
//!
//! A logic-analyzer core exposes a probe bus (`top/u_ila_0/probe0[N]`). This
//! crate decides which design signal each bus bit should observe, as a
//! [`ProbeMap`] built from a request file or from nets flagged for debug and
//! padded with a default "park" net. It then rewires an already placed
//! design accordingly with [`reroute`].

#![warn(missing_docs)]

pub mod builder;
pub mod bus;
pub mod codes;
pub mod default_net;
pub mod error;
pub mod file;
pub mod map;
pub mod reroute;
pub mod rethread;

pub use builder::{apply_requested_count, from_debug_nets, from_requests};
pub use bus::{ProbeBus, MAX_PROBE_COUNT};
pub use default_net::{find_default_net, rank_candidates, select_default};
pub use error::{ProbeFileError, ProbeMapError, RerouteError};
pub use file::{parse_probe_requests, read_probe_requests, render_probe_file, write_probe_file, ProbeRequest};
pub use map::ProbeMap;
pub use reroute::{reroute, RerouteOutcome};
pub use rethread::rethread;
