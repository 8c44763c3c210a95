//! The DDR controller's physical target port: one address phase shared by reads and writes, plus independent W, B
//!  and R phases. Signal names match the controller's pin names (`aaddr`, `wdata`, ...).

use crate::axi::*;

use kaze::*;

/// The controller's address phase is wider than the 28-bit AXI address we drive it with.
pub const AADDR_BIT_WIDTH: u32 = 32;
pub const ALOCK_BIT_WIDTH: u32 = 2;

/// Issuing side of a pseudo channel (drives the controller's pins).
pub struct PseudoChannelPort<'a> {
    pub atype: &'a Output<'a>,
    pub aaddr: &'a Output<'a>,
    pub aid: &'a Output<'a>,
    pub alen: &'a Output<'a>,
    pub asize: &'a Output<'a>,
    pub aburst: &'a Output<'a>,
    pub alock: &'a Output<'a>,
    pub avalid: &'a Output<'a>,
    pub aready: &'a Input<'a>,

    pub wid: &'a Output<'a>,
    pub wdata: Vec<&'a Output<'a>>,
    pub wstrb: &'a Output<'a>,
    pub wlast: &'a Output<'a>,
    pub wvalid: &'a Output<'a>,
    pub wready: &'a Input<'a>,

    pub bid: &'a Input<'a>,
    pub bvalid: &'a Input<'a>,
    pub bready: &'a Output<'a>,

    pub rid: &'a Input<'a>,
    pub rdata: Vec<&'a Input<'a>>,
    pub rlast: &'a Input<'a>,
    pub rresp: &'a Input<'a>,
    pub rvalid: &'a Input<'a>,
    pub rready: &'a Output<'a>,
}

impl<'a> PseudoChannelPort<'a> {
    /// Exposes this port's pins on the enclosing module `m` as `<prefix>_<pin>` (eg. `axi0_aaddr`).
    pub fn forward<S: Into<String>>(&self, prefix: S, params: &AxiParams, m: &'a Module<'a>) -> PseudoChannelPort<'a> {
        let prefix = prefix.into();
        let name = |pin: &str| format!("{}_{}", prefix, pin);

        let aready = m.input(name("aready"), 1);
        self.aready.drive(aready);
        let wready = m.input(name("wready"), 1);
        self.wready.drive(wready);

        let bid = m.input(name("bid"), params.id_bit_width);
        self.bid.drive(bid);
        let bvalid = m.input(name("bvalid"), 1);
        self.bvalid.drive(bvalid);

        let rid = m.input(name("rid"), params.id_bit_width);
        self.rid.drive(rid);
        let rdata = lane_inputs(m, params, &name("rdata"));
        for (inner, outer) in self.rdata.iter().zip(rdata.iter()) {
            inner.drive(*outer);
        }
        let rlast = m.input(name("rlast"), 1);
        self.rlast.drive(rlast);
        let rresp = m.input(name("rresp"), RESP_BIT_WIDTH);
        self.rresp.drive(rresp);
        let rvalid = m.input(name("rvalid"), 1);
        self.rvalid.drive(rvalid);

        PseudoChannelPort {
            atype: m.output(name("atype"), self.atype),
            aaddr: m.output(name("aaddr"), self.aaddr),
            aid: m.output(name("aid"), self.aid),
            alen: m.output(name("alen"), self.alen),
            asize: m.output(name("asize"), self.asize),
            aburst: m.output(name("aburst"), self.aburst),
            alock: m.output(name("alock"), self.alock),
            avalid: m.output(name("avalid"), self.avalid),
            aready,

            wid: m.output(name("wid"), self.wid),
            wdata: lane_outputs(m, params, &name("wdata"), self.wdata.iter().map(|lane| (*lane).into()).collect()),
            wstrb: m.output(name("wstrb"), self.wstrb),
            wlast: m.output(name("wlast"), self.wlast),
            wvalid: m.output(name("wvalid"), self.wvalid),
            wready,

            bid,
            bvalid,
            bready: m.output(name("bready"), self.bready),

            rid,
            rdata,
            rlast,
            rresp,
            rvalid,
            rready: m.output(name("rready"), self.rready),
        }
    }
}

/// One physical pin of a target port, as the vendor interface designer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinBinding {
    /// Top-level signal name, eg. `axi0_wdata`.
    pub name: String,
    /// Controller pin type, eg. `WDATA_0`.
    pub type_name: String,
    pub is_bus: bool,
    pub is_clk: bool,
}

impl PinBinding {
    fn new(name: String, type_name: String, is_bus: bool) -> PinBinding {
        PinBinding {
            name,
            type_name,
            is_bus,
            is_clk: false,
        }
    }
}

// Controller pin order
const PINS: &[(&str, bool)] = &[
    ("wdata", true),
    ("wready", false),
    ("wid", true),
    ("bready", false),
    ("rdata", true),
    ("aid", true),
    ("bvalid", false),
    ("rlast", false),
    ("bid", true),
    ("asize", true),
    ("atype", false),
    ("aburst", true),
    ("wvalid", false),
    ("wlast", false),
    ("aaddr", true),
    ("rid", true),
    ("avalid", false),
    ("rvalid", false),
    ("alock", true),
    ("rready", false),
    ("rresp", true),
    ("wstrb", true),
    ("aready", false),
    ("alen", true),
];

/// Name of the clock shared by all targets' AXI interfaces.
pub const AXI_CLK_NAME: &str = "axi_clk";

/// Pin bindings for target `index`, in controller pin order, ending with the shared AXI clock.
///
/// Data buses are bound whole (`axi<n>_wdata`) whatever their width; the top-level wrapper joins their lanes back
///  together under that name.
pub fn pin_bindings(index: u32) -> Vec<PinBinding> {
    let mut ret = PINS
        .iter()
        .map(|&(pin, is_bus)| PinBinding::new(format!("axi{}_{}", index, pin), format!("{}_{}", pin.to_uppercase(), index), is_bus))
        .collect::<Vec<_>>();
    let mut clk = PinBinding::new(AXI_CLK_NAME.into(), format!("ACLK_{}", index), false);
    clk.is_clk = true;
    ret.push(clk);
    ret
}
