use crate::address_map::*;
use crate::axi::*;
use crate::axi_lite_bridge::*;
use crate::config::*;
use crate::crg::SysContext;
use crate::error::*;
use crate::pseudo_channel::*;
use crate::pseudo_channel_bridge::*;

use kaze::*;
use tracing::{debug, info};

/// One DDR controller target, presented to the system interconnect as an AXI-Lite replica.
///
/// While `sys_reset` is held, AW/AR/W show not-ready upstream and nothing is presented to the controller.
pub struct DramTarget<'a> {
    pub m: &'a Module<'a>,
    pub params: AxiParams,
    pub sys_reset: &'a Input<'a>,
    pub primary_port: AxiLitePrimaryPort<'a>,
    pub replica_port: PseudoChannelPort<'a>,
}

impl<'a> DramTarget<'a> {
    pub fn new<S: Into<String>, P: ModuleParent<'a>>(instance_name: S, ctx: &SysContext<'a>, params: AxiParams, p: &'a P) -> DramTarget<'a> {
        let m = p.module(instance_name, "DramTarget");

        let sys_reset = m.input("sys_reset", 1);
        if let Some(reset) = ctx.reset {
            sys_reset.drive(reset);
        }
        let active = !sys_reset;

        let lite_bridge = AxiLiteToAxi::new("lite_bridge", params, m);
        let bridge = PseudoChannelBridge::new("bridge", params, m);
        bridge.primary_port.connect(&lite_bridge.replica_port);

        let primary_port = lite_bridge.primary_port.forward("primary", &params, m);

        let pins = &bridge.replica_port;

        let replica_aready = m.input("replica_aready", 1);
        pins.aready.drive(replica_aready & active);
        let replica_wready = m.input("replica_wready", 1);
        pins.wready.drive(replica_wready & active);

        let replica_bid = m.input("replica_bid", params.id_bit_width);
        pins.bid.drive(replica_bid);
        let replica_bvalid = m.input("replica_bvalid", 1);
        pins.bvalid.drive(replica_bvalid);

        let replica_rid = m.input("replica_rid", params.id_bit_width);
        pins.rid.drive(replica_rid);
        let replica_rdata = lane_inputs(m, &params, "replica_rdata");
        for (inner, outer) in pins.rdata.iter().zip(replica_rdata.iter()) {
            inner.drive(*outer);
        }
        let replica_rlast = m.input("replica_rlast", 1);
        pins.rlast.drive(replica_rlast);
        let replica_rresp = m.input("replica_rresp", RESP_BIT_WIDTH);
        pins.rresp.drive(replica_rresp);
        let replica_rvalid = m.input("replica_rvalid", 1);
        pins.rvalid.drive(replica_rvalid);

        DramTarget {
            m,
            params,
            sys_reset,
            primary_port,
            replica_port: PseudoChannelPort {
                atype: m.output("replica_atype", pins.atype),
                aaddr: m.output("replica_aaddr", pins.aaddr),
                aid: m.output("replica_aid", pins.aid),
                alen: m.output("replica_alen", pins.alen),
                asize: m.output("replica_asize", pins.asize),
                aburst: m.output("replica_aburst", pins.aburst),
                alock: m.output("replica_alock", pins.alock),
                avalid: m.output("replica_avalid", pins.avalid & active),
                aready: replica_aready,

                wid: m.output("replica_wid", pins.wid),
                wdata: lane_outputs(m, &params, "replica_wdata", pins.wdata.iter().map(|lane| (*lane).into()).collect()),
                wstrb: m.output("replica_wstrb", pins.wstrb),
                wlast: m.output("replica_wlast", pins.wlast),
                wvalid: m.output("replica_wvalid", pins.wvalid & active),
                wready: replica_wready,

                bid: replica_bid,
                bvalid: replica_bvalid,
                bready: m.output("replica_bready", pins.bready),

                rid: replica_rid,
                rdata: replica_rdata,
                rlast: replica_rlast,
                rresp: replica_rresp,
                rvalid: replica_rvalid,
                rready: m.output("replica_rready", pins.rready),
            },
        }
    }
}

/// Instantiates a `DramTarget` per configured port inside `m`.
///
/// Each target's AXI-Lite replica is exposed on `m` as `target<n>_*` and registered as the bus slave `target<n>`;
///  its controller pins are exposed as `axi<n>_*`, matching the pin bindings handed to the vendor tools.
pub struct DramTargets<'a> {
    pub targets: Vec<DramTarget<'a>>,
    pub bus_ports: Vec<AxiLitePrimaryPort<'a>>,
    pub pins: Vec<PseudoChannelPort<'a>>,
    pub slaves: Vec<BusSlave>,
}

impl<'a> DramTargets<'a> {
    pub fn new(ctx: &SysContext<'a>, ports: &PortTable, address_map: &AddressMap, m: &'a Module<'a>) -> Result<DramTargets<'a>> {
        let reset = match ctx.reset {
            Some(reset) => reset,
            None => m.input("sys_reset", 1).into(),
        };
        let target_ctx = SysContext {
            clock: ctx.clock.clone(),
            reset: Some(reset),
        };

        let mut targets = Vec::new();
        let mut bus_ports = Vec::new();
        let mut pins = Vec::new();
        let mut slaves = Vec::new();
        for (index, data_bit_width) in ports.iter() {
            let slave = address_map
                .slaves()
                .iter()
                .find(|s| s.port_index == index)
                .cloned()
                .ok_or(ConfigError::UnknownPort { index, available: DRAM_TARGET_COUNT })?;

            let params = AxiParams::dram_target(data_bit_width);
            let target = DramTarget::new(target_name(index), &target_ctx, params, m);
            bus_ports.push(target.primary_port.forward(target_name(index), &params, m));
            pins.push(target.replica_port.forward(format!("axi{}", index), &params, m));

            info!(
                "{}: {}-bit AXI-Lite replica at [{:#010x}, {:#010x}), {} domain ({} MHz)",
                slave.name,
                data_bit_width,
                slave.region.origin,
                slave.region.end(),
                ctx.clock.name,
                ctx.clock.freq_hz / 1e6);
            debug!("{}: {} data lane(s) of {} bits", slave.name, params.lane_count(), params.lane_bit_width());

            targets.push(target);
            slaves.push(slave);
        }

        Ok(DramTargets {
            targets,
            bus_ports,
            pins,
            slaves,
        })
    }
}
