//! Physical overlay: sites, placed cells, site pins, and physical nets.
//!
//! Naming conventions used throughout:
//! - a BEL pin wire is `<bel>.<pin>`, e.g. `AFF.D`;
//! - the external site pin feeding the BELs of one row is the BEL's row
//!   letter followed by `X`, e.g. `AX` for `AFF` and `A5FF`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::error::NetlistError;
use crate::ids::{PhysNetId, PlacedCellId, SiteInstId, SitePinId};

/// An intra-site connection from a site wire to a BEL input pin wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRoute {
    /// Physical net carried by the connection.
    pub net: String,
    /// Source wire: a site pin name (`AX`) or an internal BEL output.
    pub from: String,
    /// Destination BEL pin wire (`AFF.D`).
    pub to: String,
}

/// A placement site instance and its intra-site routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInst {
    /// Site name, e.g. `SLICE_X12Y40`.
    pub name: String,
    /// Intra-site connections.
    pub routes: Vec<SiteRoute>,
}

/// A leaf cell bound to a site and BEL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedCell {
    /// Full hierarchical name of the leaf instance.
    pub name: String,
    /// Site the cell is placed in.
    pub site: SiteInstId,
    /// BEL name within the site, e.g. `AFF`.
    pub bel: String,
    /// Logical pin name to BEL pin name.
    pub pin_map: BTreeMap<String, String>,
}

impl PlacedCell {
    /// BEL pin wire for a logical pin, e.g. `AFF.D` for `D`.
    pub fn bel_pin_wire(&self, logical_pin: &str) -> Option<String> {
        self.pin_map
            .get(logical_pin)
            .map(|bel_pin| format!("{}.{bel_pin}", self.bel))
    }

    /// External site pin feeding this cell's BEL row (`AX` for `AFF`).
    pub fn row_site_pin(&self) -> Option<String> {
        self.bel.chars().next().map(|row| format!("{row}X"))
    }
}

/// A physical pin on a site, attached to at most one physical net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitePin {
    /// Site pin name, e.g. `AX`.
    pub name: String,
    /// Owning site.
    pub site: SiteInstId,
    /// `true` for a site output (a driver).
    pub is_output: bool,
    /// Net the pin belongs to.
    pub net: Option<PhysNetId>,
}

/// The routing resources a global router assigned to one sink pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePath {
    /// Routing resources from the driver towards the sink.
    pub nodes: Vec<String>,
}

/// A physical net: site pins plus the global routes reaching its sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysNet {
    /// Net name; matches the canonical logical parent net name.
    pub name: String,
    /// Attached site pins.
    pub pins: Vec<SitePinId>,
    /// Route per sink pin.
    pub routes: BTreeMap<SitePinId, RoutePath>,
}

/// The placement and routing state of a design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalDesign {
    sites: Arena<SiteInstId, SiteInst>,
    cells: Arena<PlacedCellId, PlacedCell>,
    pins: Arena<SitePinId, SitePin>,
    nets: Arena<PhysNetId, PhysNet>,
    #[serde(skip)]
    site_index: HashMap<String, SiteInstId>,
    #[serde(skip)]
    cell_index: HashMap<String, PlacedCellId>,
    #[serde(skip)]
    net_index: HashMap<String, PhysNetId>,
}

impl PhysicalDesign {
    /// Creates an empty physical design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the site with this name, creating it if needed.
    pub fn add_site(&mut self, name: &str) -> SiteInstId {
        if let Some(&id) = self.site_index.get(name) {
            return id;
        }
        let id = self.sites.alloc(SiteInst {
            name: name.to_string(),
            routes: Vec::new(),
        });
        self.site_index.insert(name.to_string(), id);
        id
    }

    /// Looks up a site by name.
    pub fn site_by_name(&self, name: &str) -> Option<SiteInstId> {
        self.site_index.get(name).copied()
    }

    /// Returns the site with the given ID.
    pub fn site(&self, id: SiteInstId) -> &SiteInst {
        &self.sites[id]
    }

    /// Binds a leaf cell to a site and BEL.
    pub fn place_cell(
        &mut self,
        name: &str,
        site: SiteInstId,
        bel: &str,
        pin_map: BTreeMap<String, String>,
    ) -> Result<PlacedCellId, NetlistError> {
        if self.cell_index.contains_key(name) {
            return Err(NetlistError::DuplicatePlacement(name.to_string()));
        }
        let id = self.cells.alloc(PlacedCell {
            name: name.to_string(),
            site,
            bel: bel.to_string(),
            pin_map,
        });
        self.cell_index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Looks up a placed cell by its full hierarchical name.
    pub fn cell_by_name(&self, name: &str) -> Option<&PlacedCell> {
        self.cell_index.get(name).map(|&id| &self.cells[id])
    }

    /// Creates a physical net.
    pub fn add_net(&mut self, name: &str) -> Result<PhysNetId, NetlistError> {
        if self.net_index.contains_key(name) {
            return Err(NetlistError::DuplicatePhysNet(name.to_string()));
        }
        let id = self.nets.alloc(PhysNet {
            name: name.to_string(),
            pins: Vec::new(),
            routes: BTreeMap::new(),
        });
        self.net_index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Looks up a physical net by name.
    pub fn net_by_name(&self, name: &str) -> Option<PhysNetId> {
        self.net_index.get(name).copied()
    }

    /// Returns the physical net with the given ID.
    pub fn net(&self, id: PhysNetId) -> &PhysNet {
        &self.nets[id]
    }

    /// Creates a site pin with no net.
    pub fn add_site_pin(&mut self, site: SiteInstId, name: &str, is_output: bool) -> Result<SitePinId, NetlistError> {
        if self.site_pin_at(site, name).is_some() {
            return Err(NetlistError::DuplicateSitePin {
                site: self.sites[site].name.clone(),
                pin: name.to_string(),
            });
        }
        Ok(self.pins.alloc(SitePin {
            name: name.to_string(),
            site,
            is_output,
            net: None,
        }))
    }

    /// Finds the site pin named `name` on `site`.
    pub fn site_pin_at(&self, site: SiteInstId, name: &str) -> Option<SitePinId> {
        self.pins
            .iter()
            .find(|(_, p)| p.site == site && p.name == name)
            .map(|(id, _)| id)
    }

    /// Returns the site pin with the given ID.
    pub fn pin(&self, id: SitePinId) -> &SitePin {
        &self.pins[id]
    }

    /// `site/pin` display name of a site pin.
    pub fn pin_name(&self, id: SitePinId) -> String {
        let pin = &self.pins[id];
        format!("{}/{}", self.sites[pin.site].name, pin.name)
    }

    /// Attaches a site pin to a physical net.
    ///
    /// Attaching a pin to the net it already belongs to is a no-op. A pin on
    /// a different net must be removed from it first.
    pub fn add_pin_to_net(&mut self, net: PhysNetId, pin: SitePinId) -> Result<(), NetlistError> {
        match self.pins[pin].net {
            Some(current) if current == net => return Ok(()),
            Some(current) => {
                return Err(NetlistError::PinOnOtherNet {
                    pin: self.pin_name(pin),
                    net: self.nets[current].name.clone(),
                })
            }
            None => {}
        }
        self.nets[net].pins.push(pin);
        self.pins[pin].net = Some(net);
        Ok(())
    }

    /// Detaches a site pin from its net and returns that net.
    ///
    /// With `unroute`, the global route to the pin is dropped as well.
    pub fn remove_pin(&mut self, pin: SitePinId, unroute: bool) -> Option<PhysNetId> {
        let net = self.pins[pin].net.take()?;
        let entry = &mut self.nets[net];
        entry.pins.retain(|&p| p != pin);
        if unroute {
            entry.routes.remove(&pin);
        }
        Some(net)
    }

    /// Removes the intra-site route feeding `logical_pin` of a placed cell.
    ///
    /// Returns the site pin the route came from when it entered the site
    /// through one; `None` when the cell is unknown, the pin is unmapped, the
    /// pin had no intra-site route, or the route started inside the site.
    pub fn unroute_logical_pin_in_site(&mut self, cell_name: &str, logical_pin: &str) -> Option<SitePinId> {
        let cell = self.cell_by_name(cell_name)?;
        let wire = cell.bel_pin_wire(logical_pin)?;
        let site = cell.site;
        let routes = &mut self.sites[site].routes;
        let index = routes.iter().position(|r| r.to == wire)?;
        let removed = routes.remove(index);
        self.site_pin_at(site, &removed.from)
    }

    /// Connects `from` to the BEL pin wire `to` inside a site on `net`,
    /// replacing whatever previously drove `to`.
    pub fn route_intra_site(&mut self, site: SiteInstId, net: &str, from: &str, to: &str) {
        let routes = &mut self.sites[site].routes;
        routes.retain(|r| r.to != to);
        routes.push(SiteRoute {
            net: net.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    /// Records the global route to a sink pin of a net.
    pub fn set_route(&mut self, net: PhysNetId, pin: SitePinId, path: RoutePath) {
        self.nets[net].routes.insert(pin, path);
    }

    /// Rebuilds the name indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.site_index = self.sites.iter().map(|(id, s)| (s.name.clone(), id)).collect();
        self.cell_index = self.cells.iter().map(|(id, c)| (c.name.clone(), id)).collect();
        self.net_index = self.nets.iter().map(|(id, n)| (n.name.clone(), id)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(l, b)| (l.to_string(), b.to_string()))
            .collect()
    }

    /// One slice with `probe_ff` on AFF fed from site pin AX on net `old`.
    fn slice() -> (PhysicalDesign, SiteInstId, SitePinId, PhysNetId) {
        let mut pd = PhysicalDesign::new();
        let site = pd.add_site("SLICE_X0Y0");
        pd.place_cell("top/u_ila/probe_ff", site, "AFF", pin_map(&[("D", "D"), ("Q", "Q")]))
            .unwrap();
        let ax = pd.add_site_pin(site, "AX", false).unwrap();
        let old = pd.add_net("top/old").unwrap();
        pd.add_pin_to_net(old, ax).unwrap();
        pd.route_intra_site(site, "top/old", "AX", "AFF.D");
        (pd, site, ax, old)
    }

    #[test]
    fn row_site_pin_from_bel_letter() {
        let (pd, _, _, _) = slice();
        let cell = pd.cell_by_name("top/u_ila/probe_ff").unwrap();
        assert_eq!(cell.row_site_pin().as_deref(), Some("AX"));
        assert_eq!(cell.bel_pin_wire("D").as_deref(), Some("AFF.D"));
        assert_eq!(cell.bel_pin_wire("CE"), None);
    }

    #[test]
    fn unroute_returns_entry_site_pin() {
        let (mut pd, site, ax, _) = slice();
        assert_eq!(pd.unroute_logical_pin_in_site("top/u_ila/probe_ff", "D"), Some(ax));
        assert!(pd.site(site).routes.is_empty());
        // already unrouted
        assert_eq!(pd.unroute_logical_pin_in_site("top/u_ila/probe_ff", "D"), None);
    }

    #[test]
    fn unroute_internal_route_returns_none() {
        let (mut pd, site, _, _) = slice();
        pd.route_intra_site(site, "top/old", "A6LUT.O6", "AFF.D");
        assert_eq!(pd.unroute_logical_pin_in_site("top/u_ila/probe_ff", "D"), None);
        assert!(pd.site(site).routes.is_empty());
    }

    #[test]
    fn unroute_unknown_cell_is_none() {
        let (mut pd, _, _, _) = slice();
        assert_eq!(pd.unroute_logical_pin_in_site("top/ghost", "D"), None);
    }

    #[test]
    fn pin_belongs_to_one_net() {
        let (mut pd, _, ax, old) = slice();
        let other = pd.add_net("top/other").unwrap();
        assert!(matches!(
            pd.add_pin_to_net(other, ax),
            Err(NetlistError::PinOnOtherNet { .. })
        ));
        assert!(pd.add_pin_to_net(old, ax).is_ok());
        assert_eq!(pd.net(old).pins.len(), 1);
    }

    #[test]
    fn remove_pin_cascades_route() {
        let (mut pd, _, ax, old) = slice();
        pd.set_route(old, ax, RoutePath { nodes: vec!["INT_X0Y0/IMUX0".into()] });
        assert_eq!(pd.remove_pin(ax, true), Some(old));
        assert!(pd.net(old).pins.is_empty());
        assert!(pd.net(old).routes.is_empty());
        assert_eq!(pd.pin(ax).net, None);
        assert_eq!(pd.remove_pin(ax, true), None);
    }

    #[test]
    fn route_intra_site_replaces_driver() {
        let (mut pd, site, _, _) = slice();
        pd.route_intra_site(site, "top/new", "AX", "AFF.D");
        assert_eq!(pd.site(site).routes.len(), 1);
        assert_eq!(pd.site(site).routes[0].net, "top/new");
    }

    #[test]
    fn duplicates_rejected() {
        let (mut pd, site, _, _) = slice();
        assert!(pd.add_net("top/old").is_err());
        assert!(pd.add_site_pin(site, "AX", false).is_err());
        assert!(pd
            .place_cell("top/u_ila/probe_ff", site, "BFF", BTreeMap::new())
            .is_err());
        assert_eq!(pd.add_site("SLICE_X0Y0"), site);
    }

    #[test]
    fn rebuild_indices_restores_lookups() {
        let (mut pd, site, _, old) = slice();
        pd.site_index.clear();
        pd.cell_index.clear();
        pd.net_index.clear();
        pd.rebuild_indices();
        assert_eq!(pd.site_by_name("SLICE_X0Y0"), Some(site));
        assert_eq!(pd.net_by_name("top/old"), Some(old));
        assert!(pd.cell_by_name("top/u_ila/probe_ff").is_some());
    }
}
