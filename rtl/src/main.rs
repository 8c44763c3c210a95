use rtl::config::SocConfig;
use rtl::soc::*;
use rtl::top;

use anyhow::{Context as _, Result};
use clap::Parser;
use kaze::*;
use tracing::info;

use std::fs;
use std::path::{Path, PathBuf};

/// Generates the Ti375 C529 SoC's RTL and the vendor configuration that goes with it.
#[derive(Parser, Debug)]
#[command(name = "ti375-gen")]
struct Args {
    /// TOML file overriding the default SoC configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// System clock frequency in Hz (overrides the config file)
    #[arg(long)]
    sys_clk_freq: Option<f64>,

    /// Directory all artifacts are written to
    #[arg(long, default_value = "build")]
    output_dir: PathBuf,

    /// Only emit the vendor configuration and memory map, not the Verilog
    #[arg(long)]
    no_verilog: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> Result<SocConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let s = fs::read_to_string(path).with_context(|| format!("couldn't read config file {:?}", path))?;
            SocConfig::from_toml(&s).with_context(|| format!("couldn't parse config file {:?}", path))?
        }
        _ => SocConfig::default(),
    };
    if let Some(sys_clk_freq) = args.sys_clk_freq {
        config.sys_clk_freq = sys_clk_freq;
    }
    Ok(config)
}

fn write_artifact(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, contents).with_context(|| format!("couldn't write {:?}", path))?;
    info!("wrote {:?}", path);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // Everything is validated here; nothing is written if the config is bad
    let plan = SocPlan::new(&config)?;

    let dir = &args.output_dir;
    fs::create_dir_all(dir).with_context(|| format!("couldn't create output directory {:?}", dir))?;

    if !args.no_verilog {
        let c = Context::new();
        let soc = Soc::new("soc", &plan, &c)?;

        let mut soc_v = Vec::new();
        verilog::generate(soc.m, &mut soc_v)?;
        let mut soc_v = String::from_utf8(soc_v).context("generated Verilog isn't UTF-8")?;

        // Join the data lanes kaze had to split into the buses the pin bindings name
        let soc_ports = top::module_ports(&soc_v, SOC_MODULE_NAME)?;
        soc_v.push('\n');
        soc_v.push_str(&top::generate(SOC_MODULE_NAME, &soc_ports, &top::lane_groups(&plan.ports))?);

        write_artifact(dir, "soc.v", &soc_v)?;
    }

    write_artifact(dir, "ddr.xml", &plan.dram.ddr_xml(&plan.ports))?;
    write_artifact(dir, "dram_pll.py", &plan.dram.pll_block_script())?;
    write_artifact(dir, "soc.sdc", &plan.dram.sdc_commands())?;
    write_artifact(dir, "regions.ld", &plan.address_map.linker_regions())?;
    write_artifact(dir, "mem.h", &plan.address_map.c_header(&plan.ident))?;

    info!("\"{}\" generated in {:?}", plan.ident, dir);

    Ok(())
}
