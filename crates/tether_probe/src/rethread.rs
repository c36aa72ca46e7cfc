//! Carrying a net across hierarchy boundaries to a target net.
//!
//! The walk first climbs from the probe's cell until it reaches a common
//! ancestor of the target, adding an input port per level, then descends to
//! the cell owning the target net, adding an output port per level. Each new
//! port and net is named after a common base (`rw_probe0[3]`), with a `_N`
//! suffix where the name is taken.

use tether_common::hier;
use tether_netlist::{CellTypeId, HierNet, LogicalNetlist, NetlistError, Port, PortDirection, PortInst};

fn cell_at(netlist: &LogicalNetlist, path: &str) -> Result<CellTypeId, NetlistError> {
    netlist.cell_type_at(path).ok_or_else(|| {
        let (parent, inst) = hier::split_leaf(path);
        NetlistError::NoSuchInstance {
            cell: parent.to_string(),
            inst: inst.to_string(),
        }
    })
}

/// Adds a fresh single-bit port derived from `base` to `cell`.
fn add_port(netlist: &mut LogicalNetlist, cell: CellTypeId, base: &str, direction: PortDirection) -> Result<String, NetlistError> {
    let cell_type = netlist.cell_type_mut(cell);
    let name = cell_type.unique_port_name(base);
    cell_type.add_port(Port::new(name.clone(), direction, 1))?;
    Ok(name)
}

/// Adds a fresh net derived from `base` to `cell`.
fn add_net(netlist: &mut LogicalNetlist, cell: CellTypeId, base: &str) -> Result<String, NetlistError> {
    let cell_type = netlist.cell_type_mut(cell);
    let name = cell_type.unique_net_name(base);
    cell_type.create_net(name.clone())?;
    Ok(name)
}

/// Connects `net`, which lives in the cell at `scope`, to `target`.
///
/// Afterwards `net` and `target` belong to the same flattened net. When the
/// target lives in a cell the walk passes through, the carried net is merged
/// into it and ceases to exist.
// TODO: uniquify cell types with more than one instance before adding
// ports, so sibling instances do not grow unconnected ports.
pub fn rethread(
    netlist: &mut LogicalNetlist,
    scope: &str,
    net: &str,
    base: &str,
    target: &HierNet,
) -> Result<(), NetlistError> {
    let mut path = scope.to_string();
    let mut cell = cell_at(netlist, &path)?;
    let mut carried = net.to_string();

    while !hier::is_ancestor_or_self(&path, &target.inst_path) {
        let (parent_path, inst) = hier::split_leaf(&path);
        let (parent_path, inst) = (parent_path.to_string(), inst.to_string());
        let parent = cell_at(netlist, &parent_path)?;

        let port = add_port(netlist, cell, base, PortDirection::Input)?;
        netlist.cell_type_mut(cell).attach(&carried, PortInst::boundary(port.clone()))?;
        let outer = add_net(netlist, parent, base)?;
        netlist.cell_type_mut(parent).attach(&outer, PortInst::on(inst, port))?;
        tracing::trace!(from = %path, to = %parent_path, net = %outer, "rethread up");

        path = parent_path;
        cell = parent;
        carried = outer;
    }

    let below: Vec<String> = hier::relative_segments(&path, &target.inst_path)
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect();
    if below.is_empty() {
        return netlist.cell_type_mut(cell).merge_net(&carried, &target.name);
    }

    let last = below.len() - 1;
    for (depth, seg) in below.iter().enumerate() {
        let child_path = hier::join(&path, seg);
        let child = cell_at(netlist, &child_path)?;

        let port = add_port(netlist, child, base, PortDirection::Output)?;
        netlist
            .cell_type_mut(cell)
            .attach(&carried, PortInst::on(seg.clone(), port.clone()))?;
        let inner = if depth == last {
            target.name.clone()
        } else {
            add_net(netlist, child, base)?
        };
        netlist.cell_type_mut(child).attach(&inner, PortInst::boundary(port))?;
        tracing::trace!(from = %path, to = %child_path, net = %inner, "rethread down");

        path = child_path;
        cell = child;
        carried = inner;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_netlist::CellType;

    fn ff() -> CellType {
        CellType::primitive(
            "FDRE",
            vec![
                Port::new("D", PortDirection::Input, 1),
                Port::new("Q", PortDirection::Output, 1),
            ],
        )
    }

    /// wrapper
    ///   top : design            net `sig` <- src/Q
    ///     src : FDRE
    ///     u_a : a
    ///       u_b : b             net `p` -> dst/D
    ///         dst : FDRE
    ///     u_c : c
    ///       u_d : d             net `deep` <- gen/Q
    ///         gen : FDRE
    fn netlist() -> LogicalNetlist {
        let mut nl = LogicalNetlist::new("wrapper");
        let ff = nl.add_cell_type(ff()).unwrap();

        let mut b = CellType::new("b");
        b.add_instance("dst", ff).unwrap();
        b.create_net("p").unwrap();
        b.attach("p", PortInst::on("dst", "D")).unwrap();
        let b = nl.add_cell_type(b).unwrap();

        let mut a = CellType::new("a");
        a.add_instance("u_b", b).unwrap();
        let a = nl.add_cell_type(a).unwrap();

        let mut d = CellType::new("d");
        d.add_instance("gen", ff).unwrap();
        d.create_net("deep").unwrap();
        d.attach("deep", PortInst::on("gen", "Q")).unwrap();
        let d = nl.add_cell_type(d).unwrap();

        let mut c = CellType::new("c");
        c.add_instance("u_d", d).unwrap();
        let c = nl.add_cell_type(c).unwrap();

        let mut design = CellType::new("design");
        design.add_instance("src", ff).unwrap();
        design.add_instance("u_a", a).unwrap();
        design.add_instance("u_c", c).unwrap();
        design.create_net("sig").unwrap();
        design.attach("sig", PortInst::on("src", "Q")).unwrap();
        let design = nl.add_cell_type(design).unwrap();

        let top = nl.top();
        nl.cell_type_mut(top).add_instance("top", design).unwrap();
        nl
    }

    fn same_flat_net(nl: &LogicalNetlist, a: &str, b: &str) -> bool {
        let a = nl.resolve_net(a).unwrap();
        nl.aliases(&a).iter().any(|alias| alias.full_name() == b)
    }

    #[test]
    fn target_in_scope_merges() {
        let mut nl = netlist();
        let design = nl.find_cell_type("design").unwrap();
        nl.cell_type_mut(design).create_net("rw_x").unwrap();
        nl.cell_type_mut(design).attach("rw_x", PortInst::on("u_a", "unused")).unwrap();
        let target = nl.resolve_net("top/sig").unwrap();

        rethread(&mut nl, "top", "rw_x", "rw_x", &target).unwrap();
        assert!(nl.resolve_net("top/rw_x").is_none());
        assert_eq!(
            nl.cell_type(design).net_of(&PortInst::on("u_a", "unused")),
            Some("sig")
        );
    }

    #[test]
    fn climbs_then_merges_in_ancestor() {
        let mut nl = netlist();
        let target = nl.resolve_net("top/sig").unwrap();
        rethread(&mut nl, "top/u_a/u_b", "p", "rw_D", &target).unwrap();

        let b = nl.find_cell_type("b").unwrap();
        let a = nl.find_cell_type("a").unwrap();
        assert!(nl.cell_type(b).port("rw_D").unwrap().direction.is_input());
        assert!(nl.cell_type(a).port("rw_D").unwrap().direction.is_input());
        assert!(same_flat_net(&nl, "top/u_a/u_b/p", "top/sig"));
        assert!(nl.resolve_net("top/rw_D").is_none());
        assert_eq!(nl.parent_net_name("top/u_a/u_b/p").as_deref(), Some("top/sig"));
    }

    #[test]
    fn climbs_then_descends() {
        let mut nl = netlist();
        let target = nl.resolve_net("top/u_c/u_d/deep").unwrap();
        rethread(&mut nl, "top/u_a/u_b", "p", "rw_D", &target).unwrap();

        let c = nl.find_cell_type("c").unwrap();
        let d = nl.find_cell_type("d").unwrap();
        assert!(nl.cell_type(c).port("rw_D").unwrap().direction.is_output());
        assert!(nl.cell_type(d).port("rw_D").unwrap().direction.is_output());
        assert_eq!(
            nl.cell_type(d).net_of(&PortInst::boundary("rw_D")),
            Some("deep")
        );
        assert!(same_flat_net(&nl, "top/u_a/u_b/p", "top/u_c/u_d/deep"));
        assert_eq!(
            nl.parent_net_name("top/u_c/u_d/deep").as_deref(),
            Some("top/rw_D")
        );
    }

    #[test]
    fn descends_only() {
        let mut nl = netlist();
        let design = nl.find_cell_type("design").unwrap();
        nl.cell_type_mut(design).create_net("rw_probe").unwrap();
        let target = nl.resolve_net("top/u_c/u_d/deep").unwrap();
        rethread(&mut nl, "top", "rw_probe", "rw_probe", &target).unwrap();

        let a = nl.find_cell_type("a").unwrap();
        assert!(nl.cell_type(a).port("rw_probe").is_none());
        assert!(same_flat_net(&nl, "top/rw_probe", "top/u_c/u_d/deep"));
        let c = nl.find_cell_type("c").unwrap();
        assert_eq!(
            nl.cell_type(c).net_of(&PortInst::boundary("rw_probe")),
            Some("rw_probe")
        );
    }

    #[test]
    fn taken_names_get_suffix() {
        let mut nl = netlist();
        let a = nl.find_cell_type("a").unwrap();
        nl.cell_type_mut(a)
            .add_port(Port::new("rw_D", PortDirection::Output, 1))
            .unwrap();
        nl.cell_type_mut(a).create_net("rw_D").unwrap();
        let target = nl.resolve_net("top/sig").unwrap();
        rethread(&mut nl, "top/u_a/u_b", "p", "rw_D", &target).unwrap();

        assert!(nl.cell_type(a).port("rw_D_1").unwrap().direction.is_input());
        assert_eq!(
            nl.cell_type(a).net_of(&PortInst::on("u_b", "rw_D")),
            Some("rw_D_1")
        );
        assert!(same_flat_net(&nl, "top/u_a/u_b/p", "top/sig"));
    }

    #[test]
    fn unknown_scope_is_an_error() {
        let mut nl = netlist();
        let target = nl.resolve_net("top/sig").unwrap();
        assert!(matches!(
            rethread(&mut nl, "top/ghost", "p", "rw", &target),
            Err(NetlistError::NoSuchInstance { .. })
        ));
    }
}
