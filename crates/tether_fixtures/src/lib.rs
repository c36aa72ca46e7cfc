//! Test fixtures: a small placed-and-routed user design, optionally with a
//! logic-analyzer debug core already inserted.
//!
//! The user design, with its hierarchy, nets and placement:
//!
//! ```text
//! design_1_wrapper
//!   top : design
//!     u_bufg    : BUFG    O -> clk_wiz_clk_out1         BUFGCTRL_X0Y0
//!     rst_reg   : FDRE    Q -> sys_reset                SLICE_X0Y0/AFF
//!     u_rst_buf : LUT1    O -> sys_reset_BUF            SLICE_X0Y1/A6LUT
//!     data_reg  : FDRE    Q -> data_q (debug)           SLICE_X1Y0/AFF
//!                         D <- unrouted (no physical net)
//!     u_counter : counter q -> count_q
//!       cnt_reg : FDRE    Q -> q_int (debug)            SLICE_X2Y0/AFF
//! ```
//!
//! The debug core is `top/u_ila_0` of cell type `ila` with an input bus
//! `probe0`. Every bus bit starts out on `top/sys_reset` and feeds one
//! flip-flop `probe<i>_reg`, placed on `SLICE_X20Y<i>/AFF` and reached through
//! site pin `AX`.

#![warn(missing_docs)]

use std::collections::BTreeMap;

use tether_netlist::{
    CellType, Design, LogicalNetlist, NetlistError, PhysicalDesign, Port, PortDirection, PortInst,
};

/// Name of every fixture design.
pub const DESIGN_NAME: &str = "design_1_wrapper";

/// Path of the debug core instance.
pub const CORE_PATH: &str = "top/u_ila_0";

/// Options for the inserted debug core.
#[derive(Debug, Clone, Default)]
pub struct DebugCoreOptions {
    width: u32,
    extra_sinks: Vec<u32>,
    unplaced: Vec<u32>,
    unconnected: Vec<u32>,
    shared_rows: Vec<(u32, u32)>,
    internal_feeds: Vec<u32>,
}

impl DebugCoreOptions {
    /// A core with a probe bus of `width` bits.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Gives probe `index` a second sink flip-flop.
    pub fn with_extra_sink(mut self, index: u32) -> Self {
        self.extra_sinks.push(index);
        self
    }

    /// Leaves the sink flip-flop of probe `index` unplaced.
    pub fn with_unplaced(mut self, index: u32) -> Self {
        self.unplaced.push(index);
        self
    }

    /// Leaves probe `index` unconnected inside the core.
    pub fn with_unconnected(mut self, index: u32) -> Self {
        self.unconnected.push(index);
        self
    }

    /// Places the sink of probe `partner` on the `A5FF` BEL next to the sink
    /// of probe `index`, so both are fed through the same `AX` site pin.
    pub fn with_shared_row(mut self, index: u32, partner: u32) -> Self {
        self.shared_rows.push((index, partner));
        self
    }

    /// Feeds the sink of probe `index` from the `A6LUT` of its site, leaving
    /// the site without an `AX` pin.
    pub fn with_internal_feed(mut self, index: u32) -> Self {
        self.internal_feeds.push(index);
        self
    }
}

/// Builder for the fixture design.
#[derive(Debug, Clone, Default)]
pub struct UserDesign {
    debug_core: Option<DebugCoreOptions>,
}

impl UserDesign {
    /// The user design without a debug core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a debug core.
    pub fn with_debug_core(mut self, options: DebugCoreOptions) -> Self {
        self.debug_core = Some(options);
        self
    }

    /// Site holding the sink flip-flop of probe `index`.
    pub fn probe_site(index: u32) -> String {
        format!("SLICE_X20Y{index}")
    }

    /// Builds the design.
    pub fn build(self) -> Design {
        let mut design = build_user_design().expect("fixture user design is well formed");
        if let Some(options) = &self.debug_core {
            insert_debug_core(&mut design, options).expect("fixture debug core is well formed");
        }
        design
    }
}

/// The user design without a debug core.
pub fn user_design() -> Design {
    UserDesign::new().build()
}

/// The user design with a `width`-bit debug core.
pub fn debug_design(width: u32) -> Design {
    UserDesign::new().with_debug_core(DebugCoreOptions::new(width)).build()
}

fn pins(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(l, b)| (l.to_string(), b.to_string())).collect()
}

fn fdre_pins() -> BTreeMap<String, String> {
    pins(&[("D", "D"), ("C", "CLK"), ("Q", "Q")])
}

fn fdre() -> CellType {
    CellType::primitive(
        "FDRE",
        vec![
            Port::new("D", PortDirection::Input, 1),
            Port::new("C", PortDirection::Input, 1),
            Port::new("Q", PortDirection::Output, 1),
        ],
    )
}

fn connect(cell: &mut CellType, net: &str, ends: &[PortInst]) -> Result<(), NetlistError> {
    if cell.net(net).is_none() {
        cell.create_net(net)?;
    }
    for end in ends {
        cell.attach(net, end.clone())?;
    }
    Ok(())
}

/// Places `cell` on `site`/`bel` and attaches its output site pin to `net`.
fn place_driver(
    physical: &mut PhysicalDesign,
    cell: &str,
    site: &str,
    bel: &str,
    pin_map: BTreeMap<String, String>,
    out_pin: &str,
    net: &str,
) -> Result<(), NetlistError> {
    let site = physical.add_site(site);
    physical.place_cell(cell, site, bel, pin_map)?;
    let pin = physical.add_site_pin(site, out_pin, true)?;
    let net = match physical.net_by_name(net) {
        Some(id) => id,
        None => physical.add_net(net)?,
    };
    physical.add_pin_to_net(net, pin)
}

fn build_user_design() -> Result<Design, NetlistError> {
    let mut logical = LogicalNetlist::new(DESIGN_NAME);
    let ff = logical.add_cell_type(fdre())?;
    let bufg = logical.add_cell_type(CellType::primitive(
        "BUFG",
        vec![
            Port::new("I", PortDirection::Input, 1),
            Port::new("O", PortDirection::Output, 1),
        ],
    ))?;
    let lut1 = logical.add_cell_type(CellType::primitive(
        "LUT1",
        vec![
            Port::new("I0", PortDirection::Input, 1),
            Port::new("O", PortDirection::Output, 1),
        ],
    ))?;

    let mut counter = CellType::new("counter");
    counter.add_port(Port::new("clk", PortDirection::Input, 1))?;
    counter.add_port(Port::new("q", PortDirection::Output, 1))?;
    counter.add_instance("cnt_reg", ff)?;
    connect(&mut counter, "clk", &[PortInst::boundary("clk"), PortInst::on("cnt_reg", "C")])?;
    connect(&mut counter, "q_int", &[PortInst::on("cnt_reg", "Q"), PortInst::boundary("q")])?;
    counter.set_mark_debug("q_int", true)?;
    let counter = logical.add_cell_type(counter)?;

    let mut top = CellType::new("design");
    top.add_instance("u_bufg", bufg)?;
    top.add_instance("rst_reg", ff)?;
    top.add_instance("u_rst_buf", lut1)?;
    top.add_instance("data_reg", ff)?;
    top.add_instance("u_counter", counter)?;
    connect(
        &mut top,
        "clk_wiz_clk_out1",
        &[
            PortInst::on("u_bufg", "O"),
            PortInst::on("rst_reg", "C"),
            PortInst::on("data_reg", "C"),
            PortInst::on("u_counter", "clk"),
        ],
    )?;
    connect(&mut top, "sys_reset", &[PortInst::on("rst_reg", "Q"), PortInst::on("u_rst_buf", "I0")])?;
    connect(&mut top, "sys_reset_BUF", &[PortInst::on("u_rst_buf", "O")])?;
    connect(&mut top, "data_q", &[PortInst::on("data_reg", "Q")])?;
    connect(&mut top, "unrouted", &[PortInst::on("data_reg", "D")])?;
    connect(&mut top, "count_q", &[PortInst::on("u_counter", "q")])?;
    top.set_mark_debug("data_q", true)?;
    let top = logical.add_cell_type(top)?;
    let wrapper = logical.top();
    logical.cell_type_mut(wrapper).add_instance("top", top)?;

    let mut physical = PhysicalDesign::new();
    place_driver(
        &mut physical,
        "top/u_bufg",
        "BUFGCTRL_X0Y0",
        "BUFG",
        pins(&[("I", "I0"), ("O", "O")]),
        "O",
        "top/clk_wiz_clk_out1",
    )?;
    place_driver(&mut physical, "top/rst_reg", "SLICE_X0Y0", "AFF", fdre_pins(), "AQ", "top/sys_reset")?;
    place_driver(
        &mut physical,
        "top/u_rst_buf",
        "SLICE_X0Y1",
        "A6LUT",
        pins(&[("I0", "A1"), ("O", "O6")]),
        "A",
        "top/sys_reset_BUF",
    )?;
    place_driver(&mut physical, "top/data_reg", "SLICE_X1Y0", "AFF", fdre_pins(), "AQ", "top/data_q")?;
    place_driver(
        &mut physical,
        "top/u_counter/cnt_reg",
        "SLICE_X2Y0",
        "AFF",
        fdre_pins(),
        "AQ",
        "top/count_q",
    )?;

    Ok(Design::new(DESIGN_NAME, logical, physical))
}

/// Inserts a debug core into a fixture user design.
///
/// Mirrors what the external instrumentation step produces: every probe bit
/// is tied to `top/sys_reset`, and each probe's sink flip-flop is placed and
/// routed from its site pin `AX`.
///
/// # Panics
///
/// Panics if `design` was not built by [`UserDesign`].
pub fn insert_debug_core(design: &mut Design, options: &DebugCoreOptions) -> Result<(), NetlistError> {
    let logical = &mut design.logical;
    let ff = logical.find_cell_type("FDRE").expect("fixture designs have an FDRE cell type");

    let mut ila = CellType::new("ila");
    ila.add_port(Port::bus("probe0", PortDirection::Input, options.width))?;
    ila.add_port(Port::new("clk", PortDirection::Input, 1))?;
    ila.create_net("clk")?;
    ila.attach("clk", PortInst::boundary("clk"))?;
    let bits = Port::bus("probe0", PortDirection::Input, options.width).bit_names();
    for (i, bit) in (0..options.width).zip(&bits) {
        let reg = format!("probe{i}_reg");
        ila.add_instance(reg.clone(), ff)?;
        ila.attach("clk", PortInst::on(reg.clone(), "C"))?;
        if options.unconnected.contains(&i) {
            continue;
        }
        let mut ends = vec![PortInst::boundary(bit.clone()), PortInst::on(reg, "D")];
        if options.extra_sinks.contains(&i) {
            let dup = format!("probe{i}_dup_reg");
            ila.add_instance(dup.clone(), ff)?;
            ends.push(PortInst::on(dup, "D"));
        }
        connect(&mut ila, &format!("p{i}"), &ends)?;
    }
    let ila = logical.add_cell_type(ila)?;

    let top = logical.cell_type_at("top").expect("fixture designs have a top instance");
    let cell = logical.cell_type_mut(top);
    cell.add_instance("u_ila_0", ila)?;
    cell.attach("clk_wiz_clk_out1", PortInst::on("u_ila_0", "clk"))?;
    for bit in &bits {
        cell.attach("sys_reset", PortInst::on("u_ila_0", bit.clone()))?;
    }

    let physical = &mut design.physical;
    let reset = physical
        .net_by_name("top/sys_reset")
        .expect("fixture designs route top/sys_reset");
    for i in 0..options.width {
        if options.unplaced.contains(&i) || options.shared_rows.iter().any(|&(_, p)| p == i) {
            continue;
        }
        let site = physical.add_site(&UserDesign::probe_site(i));
        physical.place_cell(&format!("{CORE_PATH}/probe{i}_reg"), site, "AFF", fdre_pins())?;
        if options.internal_feeds.contains(&i) {
            physical.route_intra_site(site, "top/sys_reset", "A6LUT.O6", "AFF.D");
        } else {
            let ax = physical.add_site_pin(site, "AX", false)?;
            physical.add_pin_to_net(reset, ax)?;
            physical.route_intra_site(site, "top/sys_reset", "AX", "AFF.D");
        }
        if options.extra_sinks.contains(&i) {
            physical.place_cell(&format!("{CORE_PATH}/probe{i}_dup_reg"), site, "BFF", fdre_pins())?;
            let bx = physical.add_site_pin(site, "BX", false)?;
            physical.add_pin_to_net(reset, bx)?;
            physical.route_intra_site(site, "top/sys_reset", "BX", "BFF.D");
        }
    }
    for &(i, partner) in &options.shared_rows {
        let site = physical
            .site_by_name(&UserDesign::probe_site(i))
            .expect("shared rows pair two placed probes");
        physical.place_cell(&format!("{CORE_PATH}/probe{partner}_reg"), site, "A5FF", fdre_pins())?;
        physical.route_intra_site(site, "top/sys_reset", "AX", "A5FF.D");
    }
    Ok(())
}
