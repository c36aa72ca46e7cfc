//! The probe rerouting engine.
//!
//! For each probe with a target, the engine disconnects the probe from the
//! net it observes, threads a new net from the probe to the target through
//! the hierarchy, and redirects the sink flip-flop's data input inside its
//! site to the target's physical net. The site pins that now need a global
//! route are returned for a single router run.
//!
//! Every probe is planned against the unmodified design first; problems that
//! only affect one probe skip that probe with a diagnostic. Only then are
//! the plans applied.
//!
//! A row site pin such as `AX` drives every BEL routed from it. The first
//! plan through a row pin claims it for its target net, and later plans
//! through the same pin must agree on that net.

use std::collections::{HashMap, HashSet};

use tether_common::{hier, InternalError};
use tether_diagnostics::{Diagnostic, DiagnosticSink};
use tether_netlist::{Design, HierNet, HierPortInst, PhysNetId, PhysicalDesign, SiteInstId, SitePinId};

use crate::codes;
use crate::error::RerouteError;
use crate::map::ProbeMap;
use crate::rethread::rethread;

/// What a [`reroute`] call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RerouteOutcome {
    /// Site pins that must be routed globally, in probe order.
    pub pins_to_route: Vec<SitePinId>,
    /// Probes that were rewired.
    pub rewired: Vec<String>,
    /// Probes that were left untouched.
    pub skipped: Vec<String>,
}

/// A fully resolved rewiring of one probe.
struct Plan {
    probe: String,
    probe_pin: HierPortInst,
    target: HierNet,
    dest: PhysNetId,
    sink_cell: String,
    sink_pin: String,
    site: SiteInstId,
    row_pin: String,
    bel_wire: String,
}

/// Rewires every probe in `probes` to its target net.
///
/// A probe whose debug core instance or pin does not exist is an error for
/// the whole call. The design is not modified in that case.
pub fn reroute(design: &mut Design, probes: &ProbeMap, sink: &DiagnosticSink) -> Result<RerouteOutcome, RerouteError> {
    let mut outcome = RerouteOutcome::default();
    let mut plans = Vec::new();
    for (index, target) in probes.indexed() {
        let probe = probes.bus().probe_name(index);
        match plan_probe(design, &probe, target, sink)? {
            Some(plan) => plans.push(plan),
            None => outcome.skipped.push(probe),
        }
    }
    let plans = claim_row_pins(&design.physical, plans, &mut outcome, sink);

    for plan in plans {
        let pin = apply(design, &plan)?;
        if !outcome.pins_to_route.contains(&pin) {
            outcome.pins_to_route.push(pin);
        }
        tracing::debug!(probe = %plan.probe, target = %plan.target.full_name(), "rewired probe");
        outcome.rewired.push(plan.probe);
    }
    tracing::info!(
        rewired = outcome.rewired.len(),
        skipped = outcome.skipped.len(),
        "probe rewiring done"
    );
    Ok(outcome)
}

fn skip(sink: &DiagnosticSink, diag: Diagnostic) -> Result<Option<Plan>, RerouteError> {
    sink.emit(diag);
    Ok(None)
}

fn plan_probe(
    design: &Design,
    probe: &str,
    target: Option<&str>,
    sink: &DiagnosticSink,
) -> Result<Option<Plan>, RerouteError> {
    let netlist = &design.logical;
    let (inst, pin) = hier::split_leaf(probe);
    if inst.is_empty() || netlist.resolve_inst(inst).is_none() {
        return Err(RerouteError::UnknownInstance(inst.to_string()));
    }
    let probe_pin = netlist.resolve_pin(probe).ok_or_else(|| RerouteError::UnknownPin {
        inst: inst.to_string(),
        pin: pin.to_string(),
    })?;

    let sinks = netlist.find_sinks(&probe_pin);
    let [sink_pin] = sinks.as_slice() else {
        return skip(
            sink,
            Diagnostic::warning(
                codes::SINK_COUNT,
                format!(
                    "only single flip-flop sinks can be rewired, found {} on {probe}, skipping",
                    sinks.len()
                ),
            )
            .with_subject(probe),
        );
    };

    let Some(target) = target else {
        return skip(
            sink,
            Diagnostic::warning(codes::NO_TARGET, format!("{probe} has no target net, skipping"))
                .with_subject(probe)
                .with_note("no default net was found for unused probes"),
        );
    };
    let Some(target_net) = netlist.resolve_net(target) else {
        return skip(
            sink,
            Diagnostic::warning(codes::TARGET_NOT_FOUND, format!("target net {target} of {probe} does not exist, skipping"))
                .with_subject(probe),
        );
    };
    let Some(dest) = design.physical_net_of(target) else {
        return skip(
            sink,
            Diagnostic::warning(
                codes::NO_PHYSICAL_NET,
                format!("target net {target} of {probe} has no physical net, skipping"),
            )
            .with_subject(probe),
        );
    };

    let sink_cell = sink_pin.inst_path();
    let placement = design.physical.cell_by_name(&sink_cell).and_then(|cell| {
        Some((cell.site, cell.row_site_pin()?, cell.bel_pin_wire(sink_pin.pin())?))
    });
    let Some((site, row_pin, bel_wire)) = placement else {
        return skip(
            sink,
            Diagnostic::warning(
                codes::SINK_NOT_PLACED,
                format!("sink {} of {probe} is not placed, skipping", sink_pin.full_name()),
            )
            .with_subject(probe),
        );
    };

    Ok(Some(Plan {
        probe: probe.to_string(),
        probe_pin,
        target: target_net,
        dest,
        sink_cell,
        sink_pin: sink_pin.pin().to_string(),
        site,
        row_pin,
        bel_wire,
    }))
}

/// Keeps the plans whose row site pin can carry their target net.
///
/// A route from the row pin into a BEL that no plan rewires must already be
/// on the target net, or rewiring the pin would move that BEL too.
fn claim_row_pins(
    physical: &PhysicalDesign,
    plans: Vec<Plan>,
    outcome: &mut RerouteOutcome,
    sink: &DiagnosticSink,
) -> Vec<Plan> {
    let rewired: HashSet<(SiteInstId, String)> = plans.iter().map(|p| (p.site, p.bel_wire.clone())).collect();
    let mut claimed: HashMap<(SiteInstId, String), (PhysNetId, String)> = HashMap::new();
    let mut kept = Vec::with_capacity(plans.len());
    for plan in plans {
        let site = physical.site(plan.site);
        let dest_name = &physical.net(plan.dest).name;
        let key = (plan.site, plan.row_pin.clone());
        let conflict = match claimed.get(&key) {
            Some((dest, _)) if *dest == plan.dest => None,
            Some((dest, owner)) => Some(format!(
                "{}/{} already carries {} for {owner}",
                site.name,
                plan.row_pin,
                physical.net(*dest).name
            )),
            None => site
                .routes
                .iter()
                .find(|r| {
                    r.from == plan.row_pin
                        && r.to != plan.bel_wire
                        && r.net != *dest_name
                        && !rewired.contains(&(plan.site, r.to.clone()))
                })
                .map(|r| format!("{}/{} also drives {} on {}", site.name, plan.row_pin, r.to, r.net)),
        };
        match conflict {
            Some(reason) => {
                sink.emit(
                    Diagnostic::warning(
                        codes::ROW_PIN_CONFLICT,
                        format!("cannot rewire {} to {dest_name}: {reason}, skipping", plan.probe),
                    )
                    .with_subject(&plan.probe)
                    .with_note("sinks in one BEL row share a single site pin"),
                );
                outcome.skipped.push(plan.probe);
            }
            None => {
                claimed.entry(key).or_insert_with(|| (plan.dest, plan.probe.clone()));
                kept.push(plan);
            }
        }
    }
    kept
}

/// Applies one plan and returns the site pin to route.
fn apply(design: &mut Design, plan: &Plan) -> Result<SitePinId, RerouteError> {
    let physical = &mut design.physical;
    let entry_pin = physical.unroute_logical_pin_in_site(&plan.sink_cell, &plan.sink_pin);
    if let Some(pin) = entry_pin {
        if let Some(old) = physical.remove_pin(pin, true) {
            tracing::trace!(probe = %plan.probe, old = %physical.net(old).name, "detached old site pin");
        }
    }

    let netlist = &mut design.logical;
    let parent = netlist.cell_type_mut(plan.probe_pin.parent);
    let observed = parent
        .detach(&plan.probe_pin.port_inst)
        .ok_or_else(|| InternalError::new(format!("{} lost its net before it was rewired", plan.probe)))?;
    tracing::trace!(probe = %plan.probe, observed = %observed, "detached probe pin");
    let base = format!("rw_{}", plan.probe_pin.pin());
    let net = parent.unique_net_name(&base);
    parent.create_net(net.clone())?;
    parent.attach(&net, plan.probe_pin.port_inst.clone())?;
    rethread(netlist, &plan.probe_pin.parent_path, &net, &base, &plan.target)?;

    let physical = &mut design.physical;
    let dest_name = physical.net(plan.dest).name.clone();
    physical.route_intra_site(plan.site, &dest_name, &plan.row_pin, &plan.bel_wire);
    let pin = site_pin_for(physical, plan, entry_pin)?;
    physical.add_pin_to_net(plan.dest, pin)?;
    Ok(pin)
}

/// The input site pin feeding the sink's row, created if missing.
fn site_pin_for(
    physical: &mut PhysicalDesign,
    plan: &Plan,
    entry_pin: Option<SitePinId>,
) -> Result<SitePinId, RerouteError> {
    let reusable = entry_pin.filter(|&p| physical.pin(p).name == plan.row_pin);
    let existing = reusable.or_else(|| physical.site_pin_at(plan.site, &plan.row_pin));
    match existing {
        Some(pin) => {
            if physical.pin(pin).net.is_some_and(|n| n != plan.dest) {
                physical.remove_pin(pin, true);
            }
            Ok(pin)
        }
        None => Ok(physical.add_site_pin(plan.site, &plan.row_pin, false)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ProbeBus;
    use tether_fixtures::{debug_design, DebugCoreOptions, UserDesign};
    use tether_netlist::PortInst;

    fn bus() -> ProbeBus {
        ProbeBus::new("top/u_ila_0", "probe0")
    }

    fn map(entries: &[(u32, Option<&str>)]) -> ProbeMap {
        let mut m = ProbeMap::new(bus());
        for &(i, t) in entries {
            m.insert(i, t.map(str::to_string));
        }
        m
    }

    #[test]
    fn single_sink_probe_is_rewired() {
        let mut design = debug_design(4);
        let sink = DiagnosticSink::new();
        let probes = map(&[(0, Some("top/data_q"))]);
        let outcome = reroute(&mut design, &probes, &sink).unwrap();

        assert_eq!(outcome.rewired, vec!["top/u_ila_0/probe0[0]".to_string()]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.pins_to_route.len(), 1);
        assert!(sink.diagnostics().is_empty());

        let design_cell = design.logical.cell_type_at("top").unwrap();
        assert_eq!(
            design.logical.cell_type(design_cell).net_of(&PortInst::on("u_ila_0", "probe0[0]")),
            Some("data_q")
        );

        let pin = outcome.pins_to_route[0];
        let dest = design.physical.net_by_name("top/data_q").unwrap();
        assert_eq!(design.physical.pin(pin).net, Some(dest));
        assert_eq!(design.physical.pin_name(pin), format!("{}/AX", UserDesign::probe_site(0)));

        let site = design.physical.site(design.physical.pin(pin).site);
        let route = site.routes.iter().find(|r| r.to == "AFF.D").unwrap();
        assert_eq!(route.net, "top/data_q");
        assert_eq!(route.from, "AX");

        let old = design.physical.net_by_name("top/sys_reset").unwrap();
        assert!(!design.physical.net(old).pins.contains(&pin));
    }

    #[test]
    fn one_bit_bus_is_indexed() {
        let mut design = debug_design(1);
        let sink = DiagnosticSink::new();
        let outcome = reroute(&mut design, &map(&[(0, Some("top/data_q"))]), &sink).unwrap();
        assert_eq!(outcome.rewired, vec!["top/u_ila_0/probe0[0]".to_string()]);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn nested_target_gets_output_port() {
        let mut design = debug_design(4);
        let sink = DiagnosticSink::new();
        let probes = map(&[(2, Some("top/u_counter/q_int"))]);
        let outcome = reroute(&mut design, &probes, &sink).unwrap();
        assert_eq!(outcome.rewired.len(), 1);

        let counter = design.logical.cell_type_at("top/u_counter").unwrap();
        let port = design.logical.cell_type(counter).port("rw_probe0[2]").unwrap();
        assert!(port.direction.is_output());
        assert_eq!(
            design.logical.cell_type(counter).net_of(&PortInst::boundary("rw_probe0[2]")),
            Some("q_int")
        );
        let pin = outcome.pins_to_route[0];
        let dest = design.physical.net_by_name("top/count_q").unwrap();
        assert_eq!(design.physical.pin(pin).net, Some(dest));
    }

    #[test]
    fn multi_sink_probe_is_skipped() {
        let mut design = UserDesign::new()
            .with_debug_core(DebugCoreOptions::new(4).with_extra_sink(1))
            .build();
        let sink = DiagnosticSink::new();
        let probes = map(&[(0, Some("top/data_q")), (1, Some("top/data_q"))]);
        let outcome = reroute(&mut design, &probes, &sink).unwrap();

        assert_eq!(outcome.rewired, vec!["top/u_ila_0/probe0[0]".to_string()]);
        assert_eq!(outcome.skipped, vec!["top/u_ila_0/probe0[1]".to_string()]);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::SINK_COUNT);
        assert!(diags[0].message.contains("found 2 on top/u_ila_0/probe0[1]"));

        let design_cell = design.logical.cell_type_at("top").unwrap();
        assert_eq!(
            design.logical.cell_type(design_cell).net_of(&PortInst::on("u_ila_0", "probe0[1]")),
            Some("sys_reset")
        );
    }

    #[test]
    fn unconnected_probe_is_skipped() {
        let mut design = UserDesign::new()
            .with_debug_core(DebugCoreOptions::new(4).with_unconnected(3))
            .build();
        let sink = DiagnosticSink::new();
        let outcome = reroute(&mut design, &map(&[(3, Some("top/data_q"))]), &sink).unwrap();
        assert_eq!(outcome.skipped.len(), 1);
        assert!(sink.take_all()[0].message.contains("found 0 on"));
    }

    #[test]
    fn recoverable_problems_skip_with_codes() {
        let mut design = UserDesign::new()
            .with_debug_core(DebugCoreOptions::new(4).with_unplaced(3))
            .build();
        let sink = DiagnosticSink::new();
        let probes = map(&[
            (0, None),
            (1, Some("top/no_such_net")),
            (2, Some("top/unrouted")),
            (3, Some("top/data_q")),
        ]);
        let outcome = reroute(&mut design, &probes, &sink).unwrap();
        assert!(outcome.rewired.is_empty());
        assert_eq!(outcome.skipped.len(), 4);
        let codes: Vec<_> = sink.take_all().into_iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                codes::NO_TARGET,
                codes::TARGET_NOT_FOUND,
                codes::NO_PHYSICAL_NET,
                codes::SINK_NOT_PLACED,
            ]
        );
    }

    fn shared_row_design() -> Design {
        UserDesign::new()
            .with_debug_core(DebugCoreOptions::new(4).with_shared_row(0, 1))
            .build()
    }

    fn ax_net(design: &Design, index: u32) -> Option<String> {
        let site = design.physical.site_by_name(&UserDesign::probe_site(index)).unwrap();
        let pin = design.physical.site_pin_at(site, "AX").unwrap();
        design.physical.pin(pin).net.map(|n| design.physical.net(n).name.clone())
    }

    #[test]
    fn shared_row_pin_goes_to_first_sink() {
        let mut design = shared_row_design();
        let sink = DiagnosticSink::new();
        let probes = map(&[(0, Some("top/data_q")), (1, Some("top/u_counter/q_int"))]);
        let outcome = reroute(&mut design, &probes, &sink).unwrap();

        assert_eq!(outcome.rewired, vec!["top/u_ila_0/probe0[0]".to_string()]);
        assert_eq!(outcome.skipped, vec!["top/u_ila_0/probe0[1]".to_string()]);
        assert_eq!(outcome.pins_to_route.len(), 1);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::ROW_PIN_CONFLICT);
        assert!(diags[0]
            .message
            .contains("SLICE_X20Y0/AX already carries top/data_q for top/u_ila_0/probe0[0]"));
        assert_eq!(ax_net(&design, 0).as_deref(), Some("top/data_q"));

        let design_cell = design.logical.cell_type_at("top").unwrap();
        assert_eq!(
            design.logical.cell_type(design_cell).net_of(&PortInst::on("u_ila_0", "probe0[1]")),
            Some("sys_reset")
        );
    }

    #[test]
    fn row_pin_feeding_untouched_sink_is_kept() {
        let mut design = shared_row_design();
        let sink = DiagnosticSink::new();
        let outcome = reroute(&mut design, &map(&[(0, Some("top/data_q"))]), &sink).unwrap();

        assert!(outcome.rewired.is_empty());
        assert!(outcome.pins_to_route.is_empty());
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::ROW_PIN_CONFLICT);
        assert!(diags[0].message.contains("also drives A5FF.D on top/sys_reset"));
        assert_eq!(ax_net(&design, 0).as_deref(), Some("top/sys_reset"));
    }

    #[test]
    fn shared_row_with_one_target_rewires_both() {
        let mut design = shared_row_design();
        let sink = DiagnosticSink::new();
        let probes = map(&[(0, Some("top/data_q")), (1, Some("top/data_q"))]);
        let outcome = reroute(&mut design, &probes, &sink).unwrap();

        assert_eq!(outcome.rewired.len(), 2);
        assert_eq!(outcome.pins_to_route.len(), 1);
        assert!(sink.diagnostics().is_empty());
        assert_eq!(ax_net(&design, 0).as_deref(), Some("top/data_q"));
        let site = design.physical.site_by_name(&UserDesign::probe_site(0)).unwrap();
        for route in design.physical.site(site).routes.iter().filter(|r| r.from == "AX") {
            assert_eq!(route.net, "top/data_q", "{}", route.to);
        }
    }

    #[test]
    fn internally_fed_sink_gets_new_row_pin() {
        let mut design = UserDesign::new()
            .with_debug_core(DebugCoreOptions::new(4).with_internal_feed(2))
            .build();
        let site = design.physical.site_by_name(&UserDesign::probe_site(2)).unwrap();
        assert!(design.physical.site_pin_at(site, "AX").is_none());

        let sink = DiagnosticSink::new();
        let outcome = reroute(&mut design, &map(&[(2, Some("top/data_q"))]), &sink).unwrap();
        assert_eq!(outcome.rewired.len(), 1);
        assert!(sink.diagnostics().is_empty());

        let pin = design.physical.site_pin_at(site, "AX").unwrap();
        assert_eq!(outcome.pins_to_route, vec![pin]);
        assert!(!design.physical.pin(pin).is_output);
        let dest = design.physical.net_by_name("top/data_q").unwrap();
        assert_eq!(design.physical.pin(pin).net, Some(dest));
        assert!(design.physical.net(dest).pins.contains(&pin));

        let routes = &design.physical.site(site).routes;
        let route = routes.iter().find(|r| r.to == "AFF.D").unwrap();
        assert_eq!(route.from, "AX");
        assert_eq!(route.net, "top/data_q");
        assert!(!routes.iter().any(|r| r.from == "A6LUT.O6"));
    }

    #[test]
    fn stale_row_pin_moves_to_target() {
        let mut design = UserDesign::new()
            .with_debug_core(DebugCoreOptions::new(4).with_internal_feed(0))
            .build();
        let site = design.physical.site_by_name(&UserDesign::probe_site(0)).unwrap();
        let count_q = design.physical.net_by_name("top/count_q").unwrap();
        let stale = design.physical.add_site_pin(site, "AX", false).unwrap();
        design.physical.add_pin_to_net(count_q, stale).unwrap();

        let sink = DiagnosticSink::new();
        let outcome = reroute(&mut design, &map(&[(0, Some("top/data_q"))]), &sink).unwrap();
        assert_eq!(outcome.pins_to_route, vec![stale]);
        assert!(sink.diagnostics().is_empty());
        let dest = design.physical.net_by_name("top/data_q").unwrap();
        assert_eq!(design.physical.pin(stale).net, Some(dest));
        assert!(!design.physical.net(count_q).pins.contains(&stale));
    }

    #[test]
    fn unknown_core_is_fatal_and_design_untouched() {
        let mut design = debug_design(2);
        let sink = DiagnosticSink::new();
        let mut probes = ProbeMap::new(ProbeBus::new("top/u_ila_9", "probe0"));
        probes.insert(0, Some("top/data_q".into()));
        let err = reroute(&mut design, &probes, &sink).unwrap_err();
        assert!(matches!(err, RerouteError::UnknownInstance(ref inst) if inst == "top/u_ila_9"));
    }

    #[test]
    fn pin_past_bus_width_is_fatal() {
        let mut design = debug_design(2);
        let sink = DiagnosticSink::new();
        let before = design.logical.cell_type(design.logical.cell_type_at("top").unwrap()).nets().count();
        let err = reroute(&mut design, &map(&[(0, Some("top/data_q")), (5, Some("top/data_q"))]), &sink).unwrap_err();
        assert!(matches!(err, RerouteError::UnknownPin { ref pin, .. } if pin == "probe0[5]"));
        let after = design.logical.cell_type(design.logical.cell_type_at("top").unwrap()).nets().count();
        assert_eq!(before, after);
    }

    #[test]
    fn every_probe_rewired_once() {
        let mut design = debug_design(4);
        let sink = DiagnosticSink::new();
        let probes = map(&[
            (0, Some("top/data_q")),
            (1, Some("top/u_counter/q_int")),
            (2, Some("top/sys_reset")),
            (3, Some("top/data_q")),
        ]);
        let outcome = reroute(&mut design, &probes, &sink).unwrap();
        assert_eq!(outcome.rewired.len(), 4);
        assert_eq!(outcome.pins_to_route.len(), 4);
        for &pin in &outcome.pins_to_route {
            assert!(design.physical.pin(pin).net.is_some());
        }
    }
}
