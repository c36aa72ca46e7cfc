//! Hierarchical logical netlist: cell types, ports, nets and instances.
//!
//! A [`CellType`] owns its ports, its nets and its child [`CellInst`]s. A net
//! connects [`PortInst`]s, each of which is either a bit of the cell's own
//! boundary port (`inst == None`) or a port bit on one of its children.
//!
//! Cell types are shared by every instance of them, so editing a cell type
//! (adding a port, a net) affects all of its instances.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tether_common::hier;

use crate::arena::Arena;
use crate::error::NetlistError;
use crate::ids::CellTypeId;

/// Signal direction of a port, seen from inside the cell that owns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// Data flows into the cell.
    Input,
    /// Data flows out of the cell.
    Output,
    /// Bidirectional.
    InOut,
}

impl PortDirection {
    /// Returns `true` for `Input` and `InOut`.
    pub fn is_input(self) -> bool {
        matches!(self, PortDirection::Input | PortDirection::InOut)
    }

    /// Returns `true` for `Output` and `InOut`.
    pub fn is_output(self) -> bool {
        matches!(self, PortDirection::Output | PortDirection::InOut)
    }
}

/// A port declaration on a cell type.
///
/// A scalar port exposes a single bit named after the port. A bus of
/// width N exposes bits `name[0]` through `name[N-1]`, even when N is 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Port name.
    pub name: String,
    /// Port direction.
    pub direction: PortDirection,
    /// Number of bits.
    pub width: u32,
    /// Declared as a bus; implied by a width above 1.
    #[serde(default)]
    pub bus: bool,
}

impl Port {
    /// Creates a new port; a width of 1 makes it scalar.
    pub fn new(name: impl Into<String>, direction: PortDirection, width: u32) -> Self {
        Self {
            name: name.into(),
            direction,
            width,
            bus: false,
        }
    }

    /// Creates a bus port whose bits are indexed at any width.
    pub fn bus(name: impl Into<String>, direction: PortDirection, width: u32) -> Self {
        Self {
            bus: true,
            ..Self::new(name, direction, width)
        }
    }

    /// Returns `true` if the bits of this port are indexed.
    pub fn is_bus(&self) -> bool {
        self.bus || self.width > 1
    }

    /// Names of every bit of this port.
    pub fn bit_names(&self) -> Vec<String> {
        if !self.is_bus() {
            vec![self.name.clone()]
        } else {
            (0..self.width).map(|i| format!("{}[{i}]", self.name)).collect()
        }
    }

    /// Returns `true` if `bit` names one of this port's bits.
    pub fn has_bit(&self, bit: &str) -> bool {
        if !self.is_bus() {
            return bit == self.name;
        }
        match split_bus_bit(bit) {
            Some((base, index)) => base == self.name && index < self.width,
            None => false,
        }
    }
}

/// Splits `name[index]` into its base name and index.
fn split_bus_bit(bit: &str) -> Option<(&str, u32)> {
    let body = bit.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let index = body[open + 1..].parse().ok()?;
    Some((&body[..open], index))
}

/// One endpoint of a net inside a cell type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortInst {
    /// Child instance name, or `None` for the owning cell's boundary port.
    pub inst: Option<String>,
    /// Port bit name.
    pub port: String,
}

impl PortInst {
    /// A bit of the owning cell's own port.
    pub fn boundary(port: impl Into<String>) -> Self {
        Self {
            inst: None,
            port: port.into(),
        }
    }

    /// A port bit on the child instance `inst`.
    pub fn on(inst: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            inst: Some(inst.into()),
            port: port.into(),
        }
    }
}

/// A net inside a cell type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// Net name, unique within its cell type.
    pub name: String,
    /// Endpoints connected by this net.
    pub port_insts: Vec<PortInst>,
    /// Whether the designer flagged this net for debug probing.
    pub mark_debug: bool,
}

/// An instance of a cell type inside a parent cell type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellInst {
    /// Instance name, unique within the parent.
    pub name: String,
    /// The instantiated cell type.
    pub cell_type: CellTypeId,
}

/// A cell definition: a primitive (leaf) or a hierarchical cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellType {
    /// Cell type name.
    pub name: String,
    /// Primitives have ports but no contents.
    pub primitive: bool,
    ports: Vec<Port>,
    nets: BTreeMap<String, Net>,
    instances: BTreeMap<String, CellInst>,
    #[serde(skip)]
    net_of: HashMap<PortInst, String>,
}

impl CellType {
    /// Creates an empty hierarchical cell type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitive: false,
            ports: Vec::new(),
            nets: BTreeMap::new(),
            instances: BTreeMap::new(),
            net_of: HashMap::new(),
        }
    }

    /// Creates a primitive cell type with the given ports.
    pub fn primitive(name: impl Into<String>, ports: Vec<Port>) -> Self {
        let mut cell = Self::new(name);
        cell.primitive = true;
        cell.ports = ports;
        cell
    }

    /// Declares a new port.
    pub fn add_port(&mut self, port: Port) -> Result<(), NetlistError> {
        if self.port(&port.name).is_some() {
            return Err(NetlistError::DuplicatePort {
                cell: self.name.clone(),
                port: port.name,
            });
        }
        self.ports.push(port);
        Ok(())
    }

    /// Looks up a port by name.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Iterates over the declared ports.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    /// Finds the port owning the bit `bit`.
    ///
    /// A width-1 port whose name contains brackets (`rw_probe0[3]`) takes
    /// precedence over a bus bit with the same spelling.
    pub fn port_of_bit(&self, bit: &str) -> Option<&Port> {
        self.ports
            .iter()
            .find(|p| !p.is_bus() && p.name == bit)
            .or_else(|| self.ports.iter().find(|p| p.has_bit(bit)))
    }

    /// Direction of the port owning `bit`.
    pub fn bit_direction(&self, bit: &str) -> Option<PortDirection> {
        self.port_of_bit(bit).map(|p| p.direction)
    }

    /// Adds a child instance.
    pub fn add_instance(&mut self, name: impl Into<String>, cell_type: CellTypeId) -> Result<(), NetlistError> {
        let name = name.into();
        if self.instances.contains_key(&name) {
            return Err(NetlistError::DuplicateInstance {
                cell: self.name.clone(),
                inst: name,
            });
        }
        self.instances.insert(name.clone(), CellInst { name, cell_type });
        Ok(())
    }

    /// Looks up a child instance by name.
    pub fn instance(&self, name: &str) -> Option<&CellInst> {
        self.instances.get(name)
    }

    /// Iterates over child instances in name order.
    pub fn instances(&self) -> impl Iterator<Item = &CellInst> {
        self.instances.values()
    }

    /// Creates an empty net.
    pub fn create_net(&mut self, name: impl Into<String>) -> Result<(), NetlistError> {
        let name = name.into();
        if self.nets.contains_key(&name) {
            return Err(NetlistError::DuplicateNet {
                cell: self.name.clone(),
                net: name,
            });
        }
        self.nets.insert(
            name.clone(),
            Net {
                name,
                port_insts: Vec::new(),
                mark_debug: false,
            },
        );
        Ok(())
    }

    /// Looks up a net by name.
    pub fn net(&self, name: &str) -> Option<&Net> {
        self.nets.get(name)
    }

    /// Iterates over nets in name order.
    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.values()
    }

    /// Flags or unflags a net for debug probing.
    pub fn set_mark_debug(&mut self, net: &str, mark: bool) -> Result<(), NetlistError> {
        let cell = &self.name;
        let entry = self.nets.get_mut(net).ok_or_else(|| NetlistError::NoSuchNet {
            cell: cell.clone(),
            net: net.to_string(),
        })?;
        entry.mark_debug = mark;
        Ok(())
    }

    /// Returns the net `port_inst` is connected to.
    pub fn net_of(&self, port_inst: &PortInst) -> Option<&str> {
        self.net_of.get(port_inst).map(String::as_str)
    }

    /// Connects `port_inst` to `net`, detaching it from any previous net.
    ///
    /// Returns the previous net's name. The caller is responsible for the
    /// port bit existing; see [`LogicalNetlist::connect`] for a checked variant.
    pub fn attach(&mut self, net: &str, port_inst: PortInst) -> Result<Option<String>, NetlistError> {
        if !self.nets.contains_key(net) {
            return Err(NetlistError::NoSuchNet {
                cell: self.name.clone(),
                net: net.to_string(),
            });
        }
        let previous = self.detach(&port_inst);
        if let Some(entry) = self.nets.get_mut(net) {
            entry.port_insts.push(port_inst.clone());
        }
        self.net_of.insert(port_inst, net.to_string());
        Ok(previous)
    }

    /// Disconnects `port_inst` from its net and returns that net's name.
    pub fn detach(&mut self, port_inst: &PortInst) -> Option<String> {
        let previous = self.net_of.remove(port_inst)?;
        if let Some(entry) = self.nets.get_mut(&previous) {
            entry.port_insts.retain(|pi| pi != port_inst);
        }
        Some(previous)
    }

    /// Moves every endpoint of net `from` onto net `into` and deletes `from`.
    pub fn merge_net(&mut self, from: &str, into: &str) -> Result<(), NetlistError> {
        if !self.nets.contains_key(into) {
            return Err(NetlistError::NoSuchNet {
                cell: self.name.clone(),
                net: into.to_string(),
            });
        }
        if from == into {
            return Ok(());
        }
        let removed = self.nets.remove(from).ok_or_else(|| NetlistError::NoSuchNet {
            cell: self.name.clone(),
            net: from.to_string(),
        })?;
        for pi in removed.port_insts {
            self.net_of.remove(&pi);
            self.attach(into, pi)?;
        }
        Ok(())
    }

    /// Returns `base` if no net uses it yet, else the first free `base_N`.
    pub fn unique_net_name(&self, base: &str) -> String {
        first_free(base, |n| self.nets.contains_key(n))
    }

    /// Returns `base` if no port uses it yet, else the first free `base_N`.
    pub fn unique_port_name(&self, base: &str) -> String {
        first_free(base, |n| self.port(n).is_some())
    }

    /// Rebuilds the endpoint-to-net index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.net_of.clear();
        for net in self.nets.values() {
            for pi in &net.port_insts {
                self.net_of.insert(pi.clone(), net.name.clone());
            }
        }
    }
}

fn first_free(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1u32..)
        .map(|i| format!("{base}_{i}"))
        .find(|n| !taken(n))
        .unwrap_or_else(|| base.to_string())
}

/// A resolved hierarchical instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierInst {
    /// Full hierarchical path (`""` for the top cell).
    pub path: String,
    /// Cell type of the enclosing cell, `None` for the top cell.
    pub parent: Option<CellTypeId>,
    /// Cell type of this instance.
    pub cell_type: CellTypeId,
}

/// A resolved hierarchical net.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierNet {
    /// Path of the instance whose cell type owns the net.
    pub inst_path: String,
    /// The owning cell type.
    pub cell_type: CellTypeId,
    /// Net name within the cell type.
    pub name: String,
}

impl HierNet {
    /// Full hierarchical name of the net.
    pub fn full_name(&self) -> String {
        hier::join(&self.inst_path, &self.name)
    }
}

/// A resolved port bit on a child instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierPortInst {
    /// Path of the cell containing the instance.
    pub parent_path: String,
    /// Cell type of the containing cell.
    pub parent: CellTypeId,
    /// The endpoint within `parent`; `inst` is always `Some`.
    pub port_inst: PortInst,
}

impl HierPortInst {
    /// Child instance name.
    pub fn inst_name(&self) -> &str {
        self.port_inst.inst.as_deref().unwrap_or_default()
    }

    /// Full hierarchical path of the instance owning the pin.
    pub fn inst_path(&self) -> String {
        hier::join(&self.parent_path, self.inst_name())
    }

    /// Port bit name.
    pub fn pin(&self) -> &str {
        &self.port_inst.port
    }

    /// Full hierarchical pin name.
    pub fn full_name(&self) -> String {
        hier::join(&self.inst_path(), self.pin())
    }
}

/// A library of cell types with one designated top cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalNetlist {
    cell_types: Arena<CellTypeId, CellType>,
    top: CellTypeId,
    #[serde(skip)]
    by_name: HashMap<String, CellTypeId>,
}

impl LogicalNetlist {
    /// Creates a netlist whose top cell is a new, empty cell type.
    pub fn new(top_name: impl Into<String>) -> Self {
        let mut cell_types = Arena::new();
        let top_cell = CellType::new(top_name);
        let mut by_name = HashMap::new();
        by_name.insert(top_cell.name.clone(), CellTypeId::from_raw(0));
        let top = cell_types.alloc(top_cell);
        Self {
            cell_types,
            top,
            by_name,
        }
    }

    /// Adds a cell type to the library.
    pub fn add_cell_type(&mut self, cell: CellType) -> Result<CellTypeId, NetlistError> {
        if self.by_name.contains_key(&cell.name) {
            return Err(NetlistError::DuplicateCellType(cell.name));
        }
        let name = cell.name.clone();
        let id = self.cell_types.alloc(cell);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// The top cell type.
    pub fn top(&self) -> CellTypeId {
        self.top
    }

    /// Returns the cell type with the given ID.
    pub fn cell_type(&self, id: CellTypeId) -> &CellType {
        &self.cell_types[id]
    }

    /// Returns the cell type with the given ID, mutably.
    pub fn cell_type_mut(&mut self, id: CellTypeId) -> &mut CellType {
        &mut self.cell_types[id]
    }

    /// Looks up a cell type by name.
    pub fn find_cell_type(&self, name: &str) -> Option<CellTypeId> {
        self.by_name.get(name).copied()
    }

    /// Number of cell types in the library.
    pub fn cell_type_count(&self) -> usize {
        self.cell_types.len()
    }

    /// Cell type of the instance at `path`.
    pub fn cell_type_at(&self, path: &str) -> Option<CellTypeId> {
        let mut current = self.top;
        for seg in hier::segments(path) {
            current = self.cell_types[current].instance(seg)?.cell_type;
        }
        Some(current)
    }

    /// Resolves a hierarchical instance path.
    pub fn resolve_inst(&self, path: &str) -> Option<HierInst> {
        let cell_type = self.cell_type_at(path)?;
        let parent = match hier::parent(path) {
            Some(p) => Some(self.cell_type_at(p)?),
            None => None,
        };
        Some(HierInst {
            path: path.to_string(),
            parent,
            cell_type,
        })
    }

    /// Resolves a full hierarchical net name such as `top/u_core/data_q`.
    pub fn resolve_net(&self, hier_net: &str) -> Option<HierNet> {
        let (inst_path, name) = hier::split_leaf(hier_net);
        let cell_type = self.cell_type_at(inst_path)?;
        self.cell_types[cell_type].net(name)?;
        Some(HierNet {
            inst_path: inst_path.to_string(),
            cell_type,
            name: name.to_string(),
        })
    }

    /// Resolves a full hierarchical pin name such as `top/u_ila_0/probe0[3]`.
    pub fn resolve_pin(&self, hier_pin: &str) -> Option<HierPortInst> {
        let (inst_path, pin) = hier::split_leaf(hier_pin);
        if inst_path.is_empty() {
            return None;
        }
        let (parent_path, inst_name) = hier::split_leaf(inst_path);
        let parent = self.cell_type_at(parent_path)?;
        let inst = self.cell_types[parent].instance(inst_name)?;
        self.cell_types[inst.cell_type].port_of_bit(pin)?;
        Some(HierPortInst {
            parent_path: parent_path.to_string(),
            parent,
            port_inst: PortInst::on(inst_name, pin),
        })
    }

    /// The net a resolved pin is currently connected to, if any.
    pub fn net_of_pin(&self, pin: &HierPortInst) -> Option<HierNet> {
        let name = self.cell_types[pin.parent].net_of(&pin.port_inst)?;
        Some(HierNet {
            inst_path: pin.parent_path.clone(),
            cell_type: pin.parent,
            name: name.to_string(),
        })
    }

    /// Width of `port` on the instance at `inst_path`.
    pub fn port_width(&self, inst_path: &str, port: &str) -> Option<u32> {
        let cell = self.cell_type_at(inst_path)?;
        self.cell_types[cell].port(port).map(|p| p.width)
    }

    /// Cell type an endpoint of a net in `cell` refers to, for port checks.
    fn endpoint_cell(&self, cell: CellTypeId, port_inst: &PortInst) -> Result<CellTypeId, NetlistError> {
        match &port_inst.inst {
            None => Ok(cell),
            Some(inst) => self.cell_types[cell]
                .instance(inst)
                .map(|ci| ci.cell_type)
                .ok_or_else(|| NetlistError::NoSuchInstance {
                    cell: self.cell_types[cell].name.clone(),
                    inst: inst.clone(),
                }),
        }
    }

    /// Connects `port_inst` to `net` in `cell` after checking the port bit exists.
    pub fn connect(&mut self, cell: CellTypeId, net: &str, port_inst: PortInst) -> Result<Option<String>, NetlistError> {
        let owner = self.endpoint_cell(cell, &port_inst)?;
        if self.cell_types[owner].port_of_bit(&port_inst.port).is_none() {
            return Err(NetlistError::NoSuchPort {
                cell: self.cell_types[owner].name.clone(),
                port: port_inst.port,
            });
        }
        self.cell_types[cell].attach(net, port_inst)
    }

    /// Rebuilds every name index after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.by_name.clear();
        let mut names = Vec::with_capacity(self.cell_types.len());
        for (id, cell) in self.cell_types.iter() {
            names.push((cell.name.clone(), id));
        }
        self.by_name.extend(names);
        for i in 0..self.cell_types.len() {
            self.cell_types[CellTypeId::from_raw(i as u32)].rebuild_index();
        }
    }
}
