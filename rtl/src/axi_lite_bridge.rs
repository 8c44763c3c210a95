use crate::axi::*;

use kaze::*;

/// Bridges an AXI-Lite primary up to a full AXI4 replica of the same width.
///
/// Every lite access becomes a single full-width INCR beat with id 0, so this is just wiring plus constants.
pub struct AxiLiteToAxi<'a> {
    pub m: &'a Module<'a>,
    pub primary_port: AxiLitePrimaryPort<'a>,
    pub replica_port: AxiReplicaPort<'a>,
}

impl<'a> AxiLiteToAxi<'a> {
    pub fn new<S: Into<String>, P: ModuleParent<'a>>(instance_name: S, params: AxiParams, p: &'a P) -> AxiLiteToAxi<'a> {
        let m = p.module(instance_name, "AxiLiteToAxi");

        let id_bit_width = params.id_bit_width;
        let addr_bit_width = params.addr_bit_width;

        let primary_aw_addr = m.input("primary_aw_addr", addr_bit_width);
        let primary_aw_valid = m.input("primary_aw_valid", 1);
        let replica_aw_ready = m.input("replica_aw_ready", 1);

        let primary_w_data = lane_inputs(m, &params, "primary_w_data");
        let primary_w_strb = m.input("primary_w_strb", params.strb_bit_width());
        let primary_w_valid = m.input("primary_w_valid", 1);
        let replica_w_ready = m.input("replica_w_ready", 1);

        let replica_b_id = m.input("replica_b_id", id_bit_width);
        let replica_b_resp = m.input("replica_b_resp", RESP_BIT_WIDTH);
        let replica_b_valid = m.input("replica_b_valid", 1);
        let primary_b_ready = m.input("primary_b_ready", 1);

        let primary_ar_addr = m.input("primary_ar_addr", addr_bit_width);
        let primary_ar_valid = m.input("primary_ar_valid", 1);
        let replica_ar_ready = m.input("replica_ar_ready", 1);

        let replica_r_id = m.input("replica_r_id", id_bit_width);
        let replica_r_data = lane_inputs(m, &params, "replica_r_data");
        let replica_r_resp = m.input("replica_r_resp", RESP_BIT_WIDTH);
        let replica_r_last = m.input("replica_r_last", 1);
        let replica_r_valid = m.input("replica_r_valid", 1);
        let primary_r_ready = m.input("primary_r_ready", 1);

        AxiLiteToAxi {
            m,
            primary_port: AxiLitePrimaryPort {
                aw_addr: primary_aw_addr,
                aw_valid: primary_aw_valid,
                aw_ready: m.output("primary_aw_ready", replica_aw_ready),

                w_data: primary_w_data.clone(),
                w_strb: primary_w_strb,
                w_valid: primary_w_valid,
                w_ready: m.output("primary_w_ready", replica_w_ready),

                b_resp: m.output("primary_b_resp", replica_b_resp),
                b_valid: m.output("primary_b_valid", replica_b_valid),
                b_ready: primary_b_ready,

                ar_addr: primary_ar_addr,
                ar_valid: primary_ar_valid,
                ar_ready: m.output("primary_ar_ready", replica_ar_ready),

                r_data: lane_outputs(m, &params, "primary_r_data", replica_r_data.iter().map(|lane| (*lane).into()).collect()),
                r_resp: m.output("primary_r_resp", replica_r_resp),
                r_valid: m.output("primary_r_valid", replica_r_valid),
                r_ready: primary_r_ready,
            },
            replica_port: AxiReplicaPort {
                aw_id: m.output("replica_aw_id", m.lit(0u32, id_bit_width)),
                aw_addr: m.output("replica_aw_addr", primary_aw_addr),
                aw_len: m.output("replica_aw_len", m.lit(0u32, LEN_BIT_WIDTH)),
                aw_size: m.output("replica_aw_size", m.lit(params.size_code(), SIZE_BIT_WIDTH)),
                aw_burst: m.output("replica_aw_burst", m.lit(BURST_INCR, BURST_BIT_WIDTH)),
                aw_lock: m.output("replica_aw_lock", m.lit(0u32, LOCK_BIT_WIDTH)),
                aw_valid: m.output("replica_aw_valid", primary_aw_valid),
                aw_ready: replica_aw_ready,

                w_id: m.output("replica_w_id", m.lit(0u32, id_bit_width)),
                w_data: lane_outputs(m, &params, "replica_w_data", primary_w_data.iter().map(|lane| (*lane).into()).collect()),
                w_strb: m.output("replica_w_strb", primary_w_strb),
                w_last: m.output("replica_w_last", m.high()),
                w_valid: m.output("replica_w_valid", primary_w_valid),
                w_ready: replica_w_ready,

                // Lite has no ids; responses carry whatever id the replica echoes back (always 0)
                b_id: replica_b_id,
                b_resp: replica_b_resp,
                b_valid: replica_b_valid,
                b_ready: m.output("replica_b_ready", primary_b_ready),

                ar_id: m.output("replica_ar_id", m.lit(0u32, id_bit_width)),
                ar_addr: m.output("replica_ar_addr", primary_ar_addr),
                ar_len: m.output("replica_ar_len", m.lit(0u32, LEN_BIT_WIDTH)),
                ar_size: m.output("replica_ar_size", m.lit(params.size_code(), SIZE_BIT_WIDTH)),
                ar_burst: m.output("replica_ar_burst", m.lit(BURST_INCR, BURST_BIT_WIDTH)),
                ar_lock: m.output("replica_ar_lock", m.lit(0u32, LOCK_BIT_WIDTH)),
                ar_valid: m.output("replica_ar_valid", primary_ar_valid),
                ar_ready: replica_ar_ready,

                r_id: replica_r_id,
                r_data: replica_r_data,
                r_resp: replica_r_resp,
                r_last: replica_r_last,
                r_valid: replica_r_valid,
                r_ready: m.output("replica_r_ready", primary_r_ready),
            },
        }
    }
}
