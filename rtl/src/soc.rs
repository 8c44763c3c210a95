use crate::address_map::*;
use crate::config::*;
use crate::crg::*;
use crate::dram_config::DramConfig;
use crate::dram_target::*;
use crate::error::*;

use kaze::*;
use tracing::info;

pub const SOC_MODULE_NAME: &str = "Soc";

/// A fully validated SoC configuration. Building one is the only place configuration errors can surface; once
///  it exists, constructing the hardware can't fail on account of the config.
#[derive(Debug, Clone, PartialEq)]
pub struct SocPlan {
    pub ident: String,
    pub pll: PllConfig,
    pub sys_clock: ClockDomain,
    pub ports: PortTable,
    pub address_map: AddressMap,
    pub dram: DramConfig,
}

impl SocPlan {
    pub fn new(config: &SocConfig) -> Result<SocPlan> {
        let pll = config.pll();
        pll.validate()?;
        let sys_clock = pll.domain("sys").ok_or_else(|| ConfigError::MissingClockDomain { name: "sys".into() })?;

        let ports = config.port_table()?;
        let address_map = AddressMap::for_dram_targets(&ports)?;

        config.dram.validate()?;

        info!(
            "planned \"{}\": sys @ {} MHz ({} ns), {} DRAM target(s), main_ram at {:#010x}",
            config.ident,
            sys_clock.freq_hz / 1e6,
            sys_clock.period_ns(),
            ports.len(),
            address_map.main_ram().map(|r| r.origin).unwrap_or_default());

        Ok(SocPlan {
            ident: config.ident.clone(),
            pll,
            sys_clock,
            ports,
            address_map,
            dram: config.dram.clone(),
        })
    }
}

pub struct Soc<'a> {
    pub m: &'a Module<'a>,
    pub rst_n: &'a Input<'a>,
    pub pll_locked: &'a Input<'a>,
    pub pll_reset: &'a Output<'a>,
    pub dram_rst_n: &'a Input<'a>,
    pub dram_pll_rst_n: &'a Output<'a>,
    pub dram_targets: DramTargets<'a>,
}

impl<'a> Soc<'a> {
    pub fn new<S: Into<String>, P: ModuleParent<'a>>(instance_name: S, plan: &SocPlan, p: &'a P) -> Result<Soc<'a>> {
        let m = p.module(instance_name, SOC_MODULE_NAME);

        // CRG
        let crg = Crg::new("crg", m);
        let rst_n = m.input("rst_n", 1);
        crg.rst_n.drive(rst_n);
        let pll_locked = m.input("pll_locked", 1);
        crg.pll_locked.drive(pll_locked);
        let pll_reset = m.output("pll_reset", crg.pll_reset);

        let ctx = SysContext {
            clock: plan.sys_clock.clone(),
            reset: Some(crg.sys_reset.into()),
        };

        // The DRAM PLL has its own reset button
        let dram_rst_n = m.input("dram_rst_n", 1);
        let dram_pll_rst_n = m.output("dram_pll_rst_n", dram_rst_n);

        let dram_targets = DramTargets::new(&ctx, &plan.ports, &plan.address_map, m)?;

        Ok(Soc {
            m,
            rst_n,
            pll_locked,
            pll_reset,
            dram_rst_n,
            dram_pll_rst_n,
            dram_targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_plans_cleanly() {
        let plan = SocPlan::new(&SocConfig::default()).unwrap();
        assert_eq!(plan.ident, "LiteX SoC on Efinix Ti375 C529 Dev Kit");
        assert_eq!(plan.sys_clock, ClockDomain::new("sys", 100e6));
        assert_eq!(plan.address_map.slaves().len(), 2);
        assert_eq!(plan.address_map.main_ram(), Some(Region { origin: 0x4000_0000, size: 0x1000_0000, linker: true }));
    }

    #[test]
    fn sys_clock_comes_from_the_pll() {
        let mut config = SocConfig::default();
        config.sys_clk_freq = 50e6;
        let plan = SocPlan::new(&config).unwrap();
        assert_eq!(Some(plan.sys_clock.clone()), plan.pll.domain("sys"));
        assert_eq!(plan.sys_clock.freq_hz, 50e6);
        assert!((plan.sys_clock.period_ns() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn planning_is_deterministic() {
        let config = SocConfig::default();
        assert_eq!(SocPlan::new(&config), SocPlan::new(&config));
    }

    #[test]
    fn bad_config_fails_planning() {
        let mut config = SocConfig::default();
        config.ports.push(PortConfig { index: 3, data_width: 128 });
        assert_eq!(SocPlan::new(&config), Err(ConfigError::UnknownPort { index: 3, available: 2 }));

        let mut config = SocConfig::default();
        config.sys_clk_freq = 0.0;
        assert!(matches!(SocPlan::new(&config), Err(ConfigError::InvalidFrequency { .. })));

        let mut config = SocConfig::default();
        config.dram.timings.tRP = -1.0;
        assert!(matches!(SocPlan::new(&config), Err(ConfigError::InvalidTiming { name: "tRP", .. })));
    }

    #[test]
    fn soc_registers_one_slave_per_target() {
        let plan = SocPlan::new(&SocConfig::default()).unwrap();
        let c = Context::new();
        let soc = Soc::new("soc", &plan, &c).unwrap();

        let slaves = &soc.dram_targets.slaves;
        assert_eq!(slaves.len(), 2);
        assert_eq!(slaves[0].name, "target0");
        assert_eq!(slaves[0].region, Region::new(0x4000_0000, 0x1000_0000));
        assert_eq!(slaves[1].name, "target1");
        assert_eq!(slaves[1].region, Region::new(0x5000_0000, 0x1000_0000));

        assert_eq!(soc.dram_targets.targets[0].params.data_bit_width, 256);
        assert_eq!(soc.dram_targets.pins[0].wdata.len(), 2);
        assert_eq!(soc.dram_targets.pins[1].wdata.len(), 1);
        assert_eq!(soc.dram_targets.bus_ports[0].r_data.len(), 2);
    }
}
