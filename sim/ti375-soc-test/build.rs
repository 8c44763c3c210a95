use kaze::*;
use rtl::addr_arbiter::*;
use rtl::axi::*;
use rtl::axi_lite_bridge::*;
use rtl::config::*;
use rtl::crg::*;
use rtl::dram_target::*;
use rtl::pseudo_channel_bridge::*;
use rtl::soc::*;

use std::env;
use std::fs::File;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("modules.rs");
    let file = File::create(&dest_path)?;

    let c = Context::new();

    sim::generate(AddrArbiter::new("addr_arbiter", &c).m, sim::GenerationOptions::default(), &file)?;
    sim::generate(PseudoChannelBridge::new("bridge", AxiParams::dram_target(256), &c).m, sim::GenerationOptions::default(), &file)?;
    sim::generate(AxiLiteToAxi::new("lite_bridge", AxiParams::dram_target(128), &c).m, sim::GenerationOptions::default(), &file)?;
    sim::generate(Crg::new("crg", &c).m, sim::GenerationOptions::default(), &file)?;

    let standalone = SysContext {
        clock: ClockDomain::new("sys", DEFAULT_SYS_CLK_FREQ),
        reset: None,
    };
    sim::generate(DramTarget::new("target", &standalone, AxiParams::dram_target(128), &c).m, sim::GenerationOptions::default(), &file)?;

    let plan = SocPlan::new(&SocConfig::default())?;
    sim::generate(Soc::new("soc", &plan, &c)?.m, sim::GenerationOptions::default(), &file)?;

    Ok(())
}
