//! Global routing seam.
//!
//! Rewiring never routes between sites itself. It queues every newly exposed
//! site pin and hands the whole queue to a [`GlobalRouter`] once, after all
//! probes are processed.

use crate::error::RouterError;
use crate::ids::SitePinId;
use crate::physical::{PhysicalDesign, RoutePath};

/// Outcome of one router invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteSummary {
    /// Pins that received a route.
    pub routed: usize,
}

/// A router that connects queued sink pins to the drivers of their nets.
pub trait GlobalRouter {
    /// Routes every pin in `pins` on the physical net it is attached to.
    fn route_pins(&mut self, physical: &mut PhysicalDesign, pins: &[SitePinId]) -> Result<RouteSummary, RouterError>;
}

/// Records a direct driver-to-sink connection for each pin.
///
/// It has no device routing graph, so it never fails for congestion; it only
/// rejects pins that are not attached to a net. Used when no device-aware
/// router is available and in tests.
#[derive(Debug, Default)]
pub struct DirectRouter;

impl GlobalRouter for DirectRouter {
    fn route_pins(&mut self, physical: &mut PhysicalDesign, pins: &[SitePinId]) -> Result<RouteSummary, RouterError> {
        let mut summary = RouteSummary::default();
        for &pin in pins {
            let net = physical
                .pin(pin)
                .net
                .ok_or_else(|| RouterError::UnattachedPin(physical.pin_name(pin)))?;
            let driver = physical
                .net(net)
                .pins
                .iter()
                .copied()
                .find(|&p| physical.pin(p).is_output);
            let mut nodes = Vec::with_capacity(2);
            if let Some(driver) = driver {
                nodes.push(physical.pin_name(driver));
            }
            nodes.push(physical.pin_name(pin));
            tracing::debug!(net = %physical.net(net).name, sink = %physical.pin_name(pin), "direct route");
            physical.set_route(net, pin, RoutePath { nodes });
            summary.routed += 1;
        }
        Ok(summary)
    }
}
