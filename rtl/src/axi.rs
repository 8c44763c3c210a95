//! AXI4 and AXI-Lite port bundles.
//!
//! Like the rest of the crate, a "primary" port is the side of a module that *receives* requests (its
//!  valid/address/data signals are inputs), and a "replica" port is the side that *issues* them. A primary port is
//!  always connected to the replica port of whatever sits upstream of it.

use kaze::*;

/// kaze signals are capped at this width, so wider data fields are split into lanes of at most this many bits.
pub const MAX_LANE_BIT_WIDTH: u32 = 128;

pub const LEN_BIT_WIDTH: u32 = 8;
pub const SIZE_BIT_WIDTH: u32 = 3;
pub const BURST_BIT_WIDTH: u32 = 2;
pub const LOCK_BIT_WIDTH: u32 = 1;
pub const RESP_BIT_WIDTH: u32 = 2;

pub const BURST_INCR: u32 = 0b01;
pub const RESP_OKAY: u32 = 0b00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxiParams {
    pub data_bit_width: u32,
    pub addr_bit_width: u32,
    pub id_bit_width: u32,
}

impl AxiParams {
    /// Ti375 DDR targets are all 256MB (28-bit addresses) with 8-bit transaction ids.
    pub fn dram_target(data_bit_width: u32) -> AxiParams {
        AxiParams {
            data_bit_width,
            addr_bit_width: 28,
            id_bit_width: 8,
        }
    }

    pub fn strb_bit_width(&self) -> u32 {
        self.data_bit_width / 8
    }

    pub fn lane_count(&self) -> u32 {
        (self.data_bit_width + MAX_LANE_BIT_WIDTH - 1) / MAX_LANE_BIT_WIDTH
    }

    pub fn lane_bit_width(&self) -> u32 {
        self.data_bit_width.min(MAX_LANE_BIT_WIDTH)
    }

    /// Signal name of a data lane. Single-lane fields keep the bare field name.
    pub fn lane_name(&self, field: &str, lane: u32) -> String {
        if self.lane_count() == 1 {
            field.into()
        } else {
            format!("{}{}", field, lane)
        }
    }

    /// Bit range `(msb, lsb)` of a lane within the full data field.
    pub fn lane_bit_range(&self, lane: u32) -> (u32, u32) {
        let lsb = lane * self.lane_bit_width();
        (lsb + self.lane_bit_width() - 1, lsb)
    }

    /// AxSIZE encoding of a full-width beat.
    pub fn size_code(&self) -> u32 {
        self.strb_bit_width().trailing_zeros()
    }
}

pub fn lane_inputs<'a>(m: &'a Module<'a>, params: &AxiParams, field: &str) -> Vec<&'a Input<'a>> {
    (0..params.lane_count())
        .map(|lane| m.input(params.lane_name(field, lane), params.lane_bit_width()))
        .collect()
}

pub fn lane_outputs<'a>(m: &'a Module<'a>, params: &AxiParams, field: &str, lanes: Vec<&'a Signal<'a>>) -> Vec<&'a Output<'a>> {
    lanes
        .into_iter()
        .enumerate()
        .map(|(lane, source)| m.output(params.lane_name(field, lane as u32), source))
        .collect()
}

pub struct AxiPrimaryPort<'a> {
    pub aw_id: &'a Input<'a>,
    pub aw_addr: &'a Input<'a>,
    pub aw_len: &'a Input<'a>,
    pub aw_size: &'a Input<'a>,
    pub aw_burst: &'a Input<'a>,
    pub aw_lock: &'a Input<'a>,
    pub aw_valid: &'a Input<'a>,
    pub aw_ready: &'a Output<'a>,

    pub w_id: &'a Input<'a>,
    pub w_data: Vec<&'a Input<'a>>,
    pub w_strb: &'a Input<'a>,
    pub w_last: &'a Input<'a>,
    pub w_valid: &'a Input<'a>,
    pub w_ready: &'a Output<'a>,

    pub b_id: &'a Output<'a>,
    pub b_resp: &'a Output<'a>,
    pub b_valid: &'a Output<'a>,
    pub b_ready: &'a Input<'a>,

    pub ar_id: &'a Input<'a>,
    pub ar_addr: &'a Input<'a>,
    pub ar_len: &'a Input<'a>,
    pub ar_size: &'a Input<'a>,
    pub ar_burst: &'a Input<'a>,
    pub ar_lock: &'a Input<'a>,
    pub ar_valid: &'a Input<'a>,
    pub ar_ready: &'a Output<'a>,

    pub r_id: &'a Output<'a>,
    pub r_data: Vec<&'a Output<'a>>,
    pub r_resp: &'a Output<'a>,
    pub r_last: &'a Output<'a>,
    pub r_valid: &'a Output<'a>,
    pub r_ready: &'a Input<'a>,
}

impl<'a> AxiPrimaryPort<'a> {
    pub fn connect(&self, replica: &AxiReplicaPort<'a>) {
        self.aw_id.drive(replica.aw_id);
        self.aw_addr.drive(replica.aw_addr);
        self.aw_len.drive(replica.aw_len);
        self.aw_size.drive(replica.aw_size);
        self.aw_burst.drive(replica.aw_burst);
        self.aw_lock.drive(replica.aw_lock);
        self.aw_valid.drive(replica.aw_valid);
        replica.aw_ready.drive(self.aw_ready);

        self.w_id.drive(replica.w_id);
        for (primary, replica) in self.w_data.iter().zip(replica.w_data.iter()) {
            primary.drive(*replica);
        }
        self.w_strb.drive(replica.w_strb);
        self.w_last.drive(replica.w_last);
        self.w_valid.drive(replica.w_valid);
        replica.w_ready.drive(self.w_ready);

        replica.b_id.drive(self.b_id);
        replica.b_resp.drive(self.b_resp);
        replica.b_valid.drive(self.b_valid);
        self.b_ready.drive(replica.b_ready);

        self.ar_id.drive(replica.ar_id);
        self.ar_addr.drive(replica.ar_addr);
        self.ar_len.drive(replica.ar_len);
        self.ar_size.drive(replica.ar_size);
        self.ar_burst.drive(replica.ar_burst);
        self.ar_lock.drive(replica.ar_lock);
        self.ar_valid.drive(replica.ar_valid);
        replica.ar_ready.drive(self.ar_ready);

        replica.r_id.drive(self.r_id);
        for (replica, primary) in replica.r_data.iter().zip(self.r_data.iter()) {
            replica.drive(*primary);
        }
        replica.r_resp.drive(self.r_resp);
        replica.r_last.drive(self.r_last);
        replica.r_valid.drive(self.r_valid);
        self.r_ready.drive(replica.r_ready);
    }
}

pub struct AxiReplicaPort<'a> {
    pub aw_id: &'a Output<'a>,
    pub aw_addr: &'a Output<'a>,
    pub aw_len: &'a Output<'a>,
    pub aw_size: &'a Output<'a>,
    pub aw_burst: &'a Output<'a>,
    pub aw_lock: &'a Output<'a>,
    pub aw_valid: &'a Output<'a>,
    pub aw_ready: &'a Input<'a>,

    pub w_id: &'a Output<'a>,
    pub w_data: Vec<&'a Output<'a>>,
    pub w_strb: &'a Output<'a>,
    pub w_last: &'a Output<'a>,
    pub w_valid: &'a Output<'a>,
    pub w_ready: &'a Input<'a>,

    pub b_id: &'a Input<'a>,
    pub b_resp: &'a Input<'a>,
    pub b_valid: &'a Input<'a>,
    pub b_ready: &'a Output<'a>,

    pub ar_id: &'a Output<'a>,
    pub ar_addr: &'a Output<'a>,
    pub ar_len: &'a Output<'a>,
    pub ar_size: &'a Output<'a>,
    pub ar_burst: &'a Output<'a>,
    pub ar_lock: &'a Output<'a>,
    pub ar_valid: &'a Output<'a>,
    pub ar_ready: &'a Input<'a>,

    pub r_id: &'a Input<'a>,
    pub r_data: Vec<&'a Input<'a>>,
    pub r_resp: &'a Input<'a>,
    pub r_last: &'a Input<'a>,
    pub r_valid: &'a Input<'a>,
    pub r_ready: &'a Output<'a>,
}

pub struct AxiLitePrimaryPort<'a> {
    pub aw_addr: &'a Input<'a>,
    pub aw_valid: &'a Input<'a>,
    pub aw_ready: &'a Output<'a>,

    pub w_data: Vec<&'a Input<'a>>,
    pub w_strb: &'a Input<'a>,
    pub w_valid: &'a Input<'a>,
    pub w_ready: &'a Output<'a>,

    pub b_resp: &'a Output<'a>,
    pub b_valid: &'a Output<'a>,
    pub b_ready: &'a Input<'a>,

    pub ar_addr: &'a Input<'a>,
    pub ar_valid: &'a Input<'a>,
    pub ar_ready: &'a Output<'a>,

    pub r_data: Vec<&'a Output<'a>>,
    pub r_resp: &'a Output<'a>,
    pub r_valid: &'a Output<'a>,
    pub r_ready: &'a Input<'a>,
}

impl<'a> AxiLitePrimaryPort<'a> {
    /// Exposes this port on the enclosing module `m`, with every signal name prefixed by `prefix` (eg.
    ///  `target0_aw_addr`). The returned port belongs to `m`.
    pub fn forward<S: Into<String>>(&self, prefix: S, params: &AxiParams, m: &'a Module<'a>) -> AxiLitePrimaryPort<'a> {
        let prefix = prefix.into();

        let aw_addr = m.input(format!("{}_aw_addr", prefix), params.addr_bit_width);
        self.aw_addr.drive(aw_addr);
        let aw_valid = m.input(format!("{}_aw_valid", prefix), 1);
        self.aw_valid.drive(aw_valid);

        let w_data = lane_inputs(m, params, &format!("{}_w_data", prefix));
        for (inner, outer) in self.w_data.iter().zip(w_data.iter()) {
            inner.drive(*outer);
        }
        let w_strb = m.input(format!("{}_w_strb", prefix), params.strb_bit_width());
        self.w_strb.drive(w_strb);
        let w_valid = m.input(format!("{}_w_valid", prefix), 1);
        self.w_valid.drive(w_valid);

        let b_ready = m.input(format!("{}_b_ready", prefix), 1);
        self.b_ready.drive(b_ready);

        let ar_addr = m.input(format!("{}_ar_addr", prefix), params.addr_bit_width);
        self.ar_addr.drive(ar_addr);
        let ar_valid = m.input(format!("{}_ar_valid", prefix), 1);
        self.ar_valid.drive(ar_valid);

        let r_ready = m.input(format!("{}_r_ready", prefix), 1);
        self.r_ready.drive(r_ready);

        AxiLitePrimaryPort {
            aw_addr,
            aw_valid,
            aw_ready: m.output(format!("{}_aw_ready", prefix), self.aw_ready),

            w_data,
            w_strb,
            w_valid,
            w_ready: m.output(format!("{}_w_ready", prefix), self.w_ready),

            b_resp: m.output(format!("{}_b_resp", prefix), self.b_resp),
            b_valid: m.output(format!("{}_b_valid", prefix), self.b_valid),
            b_ready,

            ar_addr,
            ar_valid,
            ar_ready: m.output(format!("{}_ar_ready", prefix), self.ar_ready),

            r_data: lane_outputs(m, params, &format!("{}_r_data", prefix), self.r_data.iter().map(|lane| (*lane).into()).collect()),
            r_resp: m.output(format!("{}_r_resp", prefix), self.r_resp),
            r_valid: m.output(format!("{}_r_valid", prefix), self.r_valid),
            r_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_ports_split_into_lanes() {
        let params = AxiParams::dram_target(256);
        assert_eq!(params.lane_count(), 2);
        assert_eq!(params.lane_bit_width(), 128);
        assert_eq!(params.lane_name("wdata", 0), "wdata0");
        assert_eq!(params.lane_name("wdata", 1), "wdata1");
        assert_eq!(params.lane_bit_range(1), (255, 128));
        assert_eq!(params.strb_bit_width(), 32);
        assert_eq!(params.size_code(), 5);
    }

    #[test]
    fn narrow_ports_keep_bare_field_names() {
        let params = AxiParams::dram_target(128);
        assert_eq!(params.lane_count(), 1);
        assert_eq!(params.lane_name("rdata", 0), "rdata");
        assert_eq!(params.lane_bit_range(0), (127, 0));
        assert_eq!(params.size_code(), 4);

        let params = AxiParams::dram_target(32);
        assert_eq!(params.lane_bit_width(), 32);
        assert_eq!(params.size_code(), 2);
    }
}
