//! Connectivity queries that cross hierarchy boundaries.
//!
//! A net inside one cell type continues through that cell's boundary ports
//! into the parent, and through child instance ports into the children. The
//! walks here follow those crossings with an explicit worklist keyed by
//! `(instance path, net name)`.

use std::collections::HashSet;

use tether_common::{hier, natural_cmp};

use crate::ids::CellTypeId;
use crate::logical::{HierNet, HierPortInst, LogicalNetlist, PortInst};

type NetKey = (String, String);

impl LogicalNetlist {
    /// Finds every leaf input pin driven from `start`.
    ///
    /// The walk is directional: it descends into hierarchical instances only
    /// through their input bits and climbs out of a cell only through its
    /// output bits. If `start` is itself an input of a primitive, it is its
    /// own single sink. Results are sorted by full pin name.
    pub fn find_sinks(&self, start: &HierPortInst) -> Vec<HierPortInst> {
        let mut sinks = Vec::new();
        let mut work: Vec<(String, CellTypeId, String)> = Vec::new();
        let mut visited: HashSet<NetKey> = HashSet::new();

        self.enter_child(&start.parent_path, start.parent, &start.port_inst, &mut sinks, &mut work);

        while let Some((path, cell, net)) = work.pop() {
            if !visited.insert((path.clone(), net.clone())) {
                continue;
            }
            let cell_type = self.cell_type(cell);
            let Some(net_ref) = cell_type.net(&net) else {
                continue;
            };
            for pi in &net_ref.port_insts {
                match &pi.inst {
                    Some(_) => self.enter_child(&path, cell, pi, &mut sinks, &mut work),
                    None => {
                        let leaves_upward = cell_type
                            .bit_direction(&pi.port)
                            .is_some_and(|d| d.is_output());
                        if leaves_upward {
                            if let Some(up) = self.parent_net_through(&path, &pi.port) {
                                work.push(up);
                            }
                        }
                    }
                }
            }
        }

        sinks.sort_by(|a, b| natural_cmp(&a.full_name(), &b.full_name()));
        sinks.dedup();
        sinks
    }

    /// Handles reaching the child endpoint `pi` of a net in `cell` at `path`.
    fn enter_child(
        &self,
        path: &str,
        cell: CellTypeId,
        pi: &PortInst,
        sinks: &mut Vec<HierPortInst>,
        work: &mut Vec<(String, CellTypeId, String)>,
    ) {
        let Some(inst_name) = pi.inst.as_deref() else {
            return;
        };
        let Some(inst) = self.cell_type(cell).instance(inst_name) else {
            return;
        };
        let child = self.cell_type(inst.cell_type);
        let is_input = child.bit_direction(&pi.port).is_some_and(|d| d.is_input());
        if !is_input {
            return;
        }
        if child.primitive {
            sinks.push(HierPortInst {
                parent_path: path.to_string(),
                parent: cell,
                port_inst: pi.clone(),
            });
        } else if let Some(inner) = child.net_of(&PortInst::boundary(pi.port.clone())) {
            work.push((hier::join(path, inst_name), inst.cell_type, inner.to_string()));
        }
    }

    /// The net in the parent of `path` attached to boundary bit `bit` of `path`.
    fn parent_net_through(&self, path: &str, bit: &str) -> Option<(String, CellTypeId, String)> {
        let parent_path = hier::parent(path)?;
        let (_, inst_name) = hier::split_leaf(path);
        let parent = self.cell_type_at(parent_path)?;
        let net = self.cell_type(parent).net_of(&PortInst::on(inst_name, bit))?;
        Some((parent_path.to_string(), parent, net.to_string()))
    }

    /// Every hierarchical segment of the flattened net `net` belongs to,
    /// including `net` itself, in discovery order.
    pub fn aliases(&self, net: &HierNet) -> Vec<HierNet> {
        let mut out = Vec::new();
        let mut visited: HashSet<NetKey> = HashSet::new();
        let mut work = vec![(net.inst_path.clone(), net.cell_type, net.name.clone())];

        while let Some((path, cell, name)) = work.pop() {
            if !visited.insert((path.clone(), name.clone())) {
                continue;
            }
            let cell_type = self.cell_type(cell);
            let Some(net_ref) = cell_type.net(&name) else {
                continue;
            };
            for pi in &net_ref.port_insts {
                match pi.inst.as_deref() {
                    None => {
                        if let Some(up) = self.parent_net_through(&path, &pi.port) {
                            work.push(up);
                        }
                    }
                    Some(inst_name) => {
                        let Some(inst) = cell_type.instance(inst_name) else {
                            continue;
                        };
                        let child = self.cell_type(inst.cell_type);
                        if child.primitive {
                            continue;
                        }
                        if let Some(inner) = child.net_of(&PortInst::boundary(pi.port.clone())) {
                            work.push((hier::join(&path, inst_name), inst.cell_type, inner.to_string()));
                        }
                    }
                }
            }
            out.push(HierNet {
                inst_path: path,
                cell_type: cell,
                name,
            });
        }
        out
    }

    /// Canonical name of the flattened net containing `hier_net`.
    ///
    /// This is the alias closest to the top of the hierarchy; among aliases at
    /// the same depth the naturally smallest full name wins. Physical nets
    /// are named after it.
    pub fn parent_net_name(&self, hier_net: &str) -> Option<String> {
        let net = self.resolve_net(hier_net)?;
        self.aliases(&net)
            .into_iter()
            .map(|alias| (hier::depth(&alias.inst_path), alias.full_name()))
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| natural_cmp(&a.1, &b.1)))
            .map(|(_, name)| name)
    }

    /// Full names of nets flagged for debug, in depth-first hierarchy order.
    ///
    /// Within a cell, flagged nets come before the contents of child
    /// instances; nets and instances are each visited in name order.
    pub fn nets_marked_for_debug(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![(String::new(), self.top())];
        while let Some((path, cell)) = stack.pop() {
            let cell_type = self.cell_type(cell);
            out.extend(
                cell_type
                    .nets()
                    .filter(|n| n.mark_debug)
                    .map(|n| hier::join(&path, &n.name)),
            );
            let children: Vec<_> = cell_type
                .instances()
                .filter(|ci| !self.cell_type(ci.cell_type).primitive)
                .map(|ci| (hier::join(&path, &ci.name), ci.cell_type))
                .collect();
            // reversed so the first child is expanded first
            stack.extend(children.into_iter().rev());
        }
        out
    }
}
