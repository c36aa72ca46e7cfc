//! Selection of the default net that unused probes are parked on.
//!
//! A probe with nothing to observe still has to be driven. Candidates are
//! the nets directly inside the top-level user design instance, preferring
//! reset nets, then `rst` nets, then anything that is not a clock. Names
//! containing `BUF` are buffered copies and never chosen.

use tether_common::hier;
use tether_diagnostics::{Diagnostic, DiagnosticSink};
use tether_netlist::LogicalNetlist;

use crate::codes;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    Reset,
    Rst,
    Other,
}

fn classify(name: &str) -> Option<Class> {
    if name.contains("BUF") {
        return None;
    }
    let lower = name.to_lowercase();
    if lower.contains("reset") {
        Some(Class::Reset)
    } else if lower.contains("rst") {
        Some(Class::Rst)
    } else if lower.contains("clk") || lower.contains("clock") {
        None
    } else {
        Some(Class::Other)
    }
}

/// Orders candidate net names by preference, dropping ineligible ones.
///
/// The sort is stable, so names keep their input order within a class.
pub fn rank_candidates<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut ranked: Vec<(Class, &str)> = names
        .into_iter()
        .filter_map(|n| classify(n).map(|c| (c, n)))
        .collect();
    ranked.sort_by_key(|&(class, _)| class);
    ranked.into_iter().map(|(_, n)| n).collect()
}

/// Returns the first `scope/candidate` accepted by `resolves`.
pub fn select_default(scope: &str, ranked: &[&str], resolves: impl Fn(&str) -> bool) -> Option<String> {
    ranked
        .iter()
        .map(|name| hier::join(scope, name))
        .find(|path| resolves(path))
}

/// Finds the default net for a design given the nets its probes target.
///
/// The scope is the first segment of the first target that names an
/// instance in `netlist`. Emits a note and returns `None` when nothing
/// qualifies.
pub fn find_default_net<'a>(
    netlist: &LogicalNetlist,
    targets: impl IntoIterator<Item = &'a str>,
    sink: &DiagnosticSink,
) -> Option<String> {
    let found = targets
        .into_iter()
        .filter_map(hier::first_segment)
        .find(|seg| netlist.resolve_inst(seg).is_some())
        .and_then(|scope| {
            let cell = netlist.cell_type_at(scope)?;
            let ranked = rank_candidates(netlist.cell_type(cell).nets().map(|n| n.name.as_str()));
            select_default(scope, &ranked, |path| netlist.resolve_net(path).is_some())
        });

    match &found {
        Some(net) => tracing::info!(net = %net, "selected default net"),
        None => sink.emit(
            Diagnostic::note(codes::NO_DEFAULT_NET, "failed to find a net to connect unused probes to")
                .with_note("unused probes are written as `null` and left unconnected"),
        ),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_before_rst_before_others() {
        let ranked = rank_candidates([
            "data_q",
            "cpu_rst_n",
            "sys_reset",
            "clk_wiz_clk_out1",
            "sys_reset_BUF",
            "Main_Clock",
            "count_q",
            "ext_RESET",
        ]);
        assert_eq!(ranked, vec!["sys_reset", "ext_RESET", "cpu_rst_n", "data_q", "count_q"]);
    }

    #[test]
    fn buf_filter_is_case_sensitive() {
        assert_eq!(rank_candidates(["reset_buf", "reset_BUF"]), vec!["reset_buf"]);
    }

    #[test]
    fn nothing_eligible() {
        assert!(rank_candidates(["clk", "sysclock", "x_BUF"]).is_empty());
    }

    #[test]
    fn select_skips_unresolvable() {
        let ranked = ["sys_reset", "rst_n", "data_q"];
        let chosen = select_default("top", &ranked, |p| p != "top/sys_reset");
        assert_eq!(chosen.as_deref(), Some("top/rst_n"));
        assert_eq!(select_default("top", &ranked, |_| false), None);
    }

    #[test]
    fn picks_sys_reset_in_fixture() {
        let design = tether_fixtures::debug_design(4);
        let sink = DiagnosticSink::new();
        let net = find_default_net(&design.logical, ["top/data_q", "top/u_counter/q_int"], &sink);
        assert_eq!(net.as_deref(), Some("top/sys_reset"));
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn unknown_scope_emits_note() {
        let design = tether_fixtures::debug_design(4);
        let sink = DiagnosticSink::new();
        assert_eq!(find_default_net(&design.logical, ["nowhere/sig"], &sink), None);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::NO_DEFAULT_NET);
    }

    #[test]
    fn later_target_can_supply_scope() {
        let design = tether_fixtures::debug_design(4);
        let sink = DiagnosticSink::new();
        let net = find_default_net(&design.logical, ["bogus", "top/data_q"], &sink);
        assert_eq!(net.as_deref(), Some("top/sys_reset"));
    }
}
