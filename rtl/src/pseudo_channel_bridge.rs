use crate::addr_arbiter::*;
use crate::axi::*;
use crate::pseudo_channel::*;

use kaze::*;

/// Presents a DDR controller pseudo channel as a standard AXI4 replica.
///
/// The controller only has one address phase per target, so AW and AR are multiplexed onto it by an `AddrArbiter`
///  (reads win). The winner's id/addr/len/size/burst/lock are forwarded unconditionally; if the select line and
///  valids ever disagree the forwarded fields are the write side's, which is don't-care data. That can't happen with
///  conformant AXI traffic since the select line *is* `ar_valid`.
///
/// W, B and R are direct renames - no buffering, no transformation. The controller has no write response field,
///  so B always reports OKAY.
pub struct PseudoChannelBridge<'a> {
    pub m: &'a Module<'a>,
    pub params: AxiParams,
    pub primary_port: AxiPrimaryPort<'a>,
    pub replica_port: PseudoChannelPort<'a>,
}

impl<'a> PseudoChannelBridge<'a> {
    pub fn new<S: Into<String>, P: ModuleParent<'a>>(instance_name: S, params: AxiParams, p: &'a P) -> PseudoChannelBridge<'a> {
        let m = p.module(instance_name, "PseudoChannelBridge");

        let id_bit_width = params.id_bit_width;
        let addr_bit_width = params.addr_bit_width;

        let primary_aw_id = m.input("primary_aw_id", id_bit_width);
        let primary_aw_addr = m.input("primary_aw_addr", addr_bit_width);
        let primary_aw_len = m.input("primary_aw_len", LEN_BIT_WIDTH);
        let primary_aw_size = m.input("primary_aw_size", SIZE_BIT_WIDTH);
        let primary_aw_burst = m.input("primary_aw_burst", BURST_BIT_WIDTH);
        let primary_aw_lock = m.input("primary_aw_lock", LOCK_BIT_WIDTH);
        let primary_aw_valid = m.input("primary_aw_valid", 1);

        let primary_ar_id = m.input("primary_ar_id", id_bit_width);
        let primary_ar_addr = m.input("primary_ar_addr", addr_bit_width);
        let primary_ar_len = m.input("primary_ar_len", LEN_BIT_WIDTH);
        let primary_ar_size = m.input("primary_ar_size", SIZE_BIT_WIDTH);
        let primary_ar_burst = m.input("primary_ar_burst", BURST_BIT_WIDTH);
        let primary_ar_lock = m.input("primary_ar_lock", LOCK_BIT_WIDTH);
        let primary_ar_valid = m.input("primary_ar_valid", 1);

        let replica_aready = m.input("replica_aready", 1);

        // Pseudo AW/AR channel
        let arbiter = AddrArbiter::new("arbiter", m);
        arbiter.aw_valid.drive(primary_aw_valid);
        arbiter.ar_valid.drive(primary_ar_valid);
        arbiter.aready.drive(replica_aready);
        let select_read = arbiter.select_read;

        let replica_aaddr = if_(select_read, {
            primary_ar_addr
        }).else_({
            primary_aw_addr
        });
        let replica_aaddr = if addr_bit_width < AADDR_BIT_WIDTH {
            m.lit(0u32, AADDR_BIT_WIDTH - addr_bit_width).concat(replica_aaddr)
        } else {
            replica_aaddr
        };
        let replica_aid = if_(select_read, {
            primary_ar_id
        }).else_({
            primary_aw_id
        });
        let replica_alen = if_(select_read, {
            primary_ar_len
        }).else_({
            primary_aw_len
        });
        let replica_asize = if_(select_read, {
            primary_ar_size
        }).else_({
            primary_aw_size
        });
        let replica_aburst = if_(select_read, {
            primary_ar_burst
        }).else_({
            primary_aw_burst
        });
        let replica_alock = m.lit(0u32, ALOCK_BIT_WIDTH - LOCK_BIT_WIDTH).concat(if_(select_read, {
            primary_ar_lock
        }).else_({
            primary_aw_lock
        }));

        // W channel
        let primary_w_id = m.input("primary_w_id", id_bit_width);
        let primary_w_data = lane_inputs(m, &params, "primary_w_data");
        let primary_w_strb = m.input("primary_w_strb", params.strb_bit_width());
        let primary_w_last = m.input("primary_w_last", 1);
        let primary_w_valid = m.input("primary_w_valid", 1);
        let replica_wready = m.input("replica_wready", 1);

        // B channel
        let replica_bid = m.input("replica_bid", id_bit_width);
        let replica_bvalid = m.input("replica_bvalid", 1);
        let primary_b_ready = m.input("primary_b_ready", 1);

        // R channel
        let replica_rid = m.input("replica_rid", id_bit_width);
        let replica_rdata = lane_inputs(m, &params, "replica_rdata");
        let replica_rlast = m.input("replica_rlast", 1);
        let replica_rresp = m.input("replica_rresp", RESP_BIT_WIDTH);
        let replica_rvalid = m.input("replica_rvalid", 1);
        let primary_r_ready = m.input("primary_r_ready", 1);

        PseudoChannelBridge {
            m,
            params,
            primary_port: AxiPrimaryPort {
                aw_id: primary_aw_id,
                aw_addr: primary_aw_addr,
                aw_len: primary_aw_len,
                aw_size: primary_aw_size,
                aw_burst: primary_aw_burst,
                aw_lock: primary_aw_lock,
                aw_valid: primary_aw_valid,
                aw_ready: m.output("primary_aw_ready", arbiter.aw_ready),

                w_id: primary_w_id,
                w_data: primary_w_data.clone(),
                w_strb: primary_w_strb,
                w_last: primary_w_last,
                w_valid: primary_w_valid,
                w_ready: m.output("primary_w_ready", replica_wready),

                b_id: m.output("primary_b_id", replica_bid),
                b_resp: m.output("primary_b_resp", m.lit(RESP_OKAY, RESP_BIT_WIDTH)),
                b_valid: m.output("primary_b_valid", replica_bvalid),
                b_ready: primary_b_ready,

                ar_id: primary_ar_id,
                ar_addr: primary_ar_addr,
                ar_len: primary_ar_len,
                ar_size: primary_ar_size,
                ar_burst: primary_ar_burst,
                ar_lock: primary_ar_lock,
                ar_valid: primary_ar_valid,
                ar_ready: m.output("primary_ar_ready", arbiter.ar_ready),

                r_id: m.output("primary_r_id", replica_rid),
                r_data: lane_outputs(m, &params, "primary_r_data", replica_rdata.iter().map(|lane| (*lane).into()).collect()),
                r_resp: m.output("primary_r_resp", replica_rresp),
                r_last: m.output("primary_r_last", replica_rlast),
                r_valid: m.output("primary_r_valid", replica_rvalid),
                r_ready: primary_r_ready,
            },
            replica_port: PseudoChannelPort {
                atype: m.output("replica_atype", arbiter.atype),
                aaddr: m.output("replica_aaddr", replica_aaddr),
                aid: m.output("replica_aid", replica_aid),
                alen: m.output("replica_alen", replica_alen),
                asize: m.output("replica_asize", replica_asize),
                aburst: m.output("replica_aburst", replica_aburst),
                alock: m.output("replica_alock", replica_alock),
                avalid: m.output("replica_avalid", arbiter.avalid),
                aready: replica_aready,

                wid: m.output("replica_wid", primary_w_id),
                wdata: lane_outputs(m, &params, "replica_wdata", primary_w_data.iter().map(|lane| (*lane).into()).collect()),
                wstrb: m.output("replica_wstrb", primary_w_strb),
                wlast: m.output("replica_wlast", primary_w_last),
                wvalid: m.output("replica_wvalid", primary_w_valid),
                wready: replica_wready,

                bid: replica_bid,
                bvalid: replica_bvalid,
                bready: m.output("replica_bready", primary_b_ready),

                rid: replica_rid,
                rdata: replica_rdata,
                rlast: replica_rlast,
                rresp: replica_rresp,
                rvalid: replica_rvalid,
                rready: m.output("replica_rready", primary_r_ready),
            },
        }
    }
}
