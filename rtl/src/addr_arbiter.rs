use kaze::*;

/// Decides, every cycle, whether a pseudo channel's shared address phase carries the AR or the AW request.
///
/// Reads have fixed priority: a pending AR always claims the channel, and AW is only granted when no read is
///  pending. Under a continuous stream of reads, writes starve. This is intentional and matches the memory
///  controller integration this was built for; throughput tests downstream depend on the bias.
///
/// Purely combinational - the grant depends only on this cycle's valids.
pub struct AddrArbiter<'a> {
    pub m: &'a Module<'a>,

    pub aw_valid: &'a Input<'a>,
    pub aw_ready: &'a Output<'a>,
    pub ar_valid: &'a Input<'a>,
    pub ar_ready: &'a Output<'a>,

    /// High when the shared channel carries the read request this cycle.
    pub select_read: &'a Output<'a>,
    pub atype: &'a Output<'a>,
    pub avalid: &'a Output<'a>,
    pub aready: &'a Input<'a>,
}

impl<'a> AddrArbiter<'a> {
    pub fn new<S: Into<String>, P: ModuleParent<'a>>(instance_name: S, p: &'a P) -> AddrArbiter<'a> {
        let m = p.module(instance_name, "AddrArbiter");

        let aw_valid = m.input("aw_valid", 1);
        let ar_valid = m.input("ar_valid", 1);
        let aready = m.input("aready", 1);

        let select_read = ar_valid;

        let avalid = if_(select_read, {
            ar_valid
        }).else_({
            aw_valid
        });

        AddrArbiter {
            m,

            aw_valid,
            aw_ready: m.output("aw_ready", !select_read & aready),
            ar_valid,
            ar_ready: m.output("ar_ready", select_read & aready),

            select_read: m.output("select_read", select_read),
            // Controller encodes writes as 1
            atype: m.output("atype", !select_read),
            avalid: m.output("avalid", avalid),
            aready,
        }
    }
}
