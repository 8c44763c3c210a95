//! Build-time configuration for the vendor DDR controller and its PLL.
//!
//! None of this is hardware we describe ourselves - it's data handed to the vendor interface designer, which
//!  instantiates the hard blocks and binds their pins to the top-level signals of our generated design.

use crate::config::PortTable;
use crate::crg::{check_freq, ClockDomain};
use crate::error::*;
use crate::pseudo_channel::pin_bindings;

use serde::{Deserialize, Serialize};

use std::fmt::Write;

pub const DRAM_PLL_REF_CLK_NAME: &str = "dram_pll_refclk";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DramConfig {
    pub pll: DramPllConfig,
    pub geometry: DramGeometry,
    pub timings: DramTimings,
    pub fpga_iterm: u32,
    pub fpga_oterm: u32,
    pub rtt_nom: String,
    pub mem_oterm: u32,
    pub cas_latency: String,
    pub address_mapping: String,
    pub auto_power_down: bool,
    pub auto_self_refresh: bool,
    pub gate_delay_override: bool,
    pub gate_coarse_delay: u32,
    pub gate_fine_delay: u32,
}

impl Default for DramConfig {
    fn default() -> DramConfig {
        DramConfig {
            pll: DramPllConfig::default(),
            geometry: DramGeometry::default(),
            timings: DramTimings::default(),
            fpga_iterm: 120,
            fpga_oterm: 34,
            rtt_nom: "RZQ/2".into(),
            mem_oterm: 40,
            cas_latency: "RL=6/WL=3".into(),
            address_mapping: "ROW-COL_HIGH-BANK-COL_LOW".into(),
            auto_power_down: false,
            auto_self_refresh: false,
            gate_delay_override: false,
            gate_coarse_delay: 3,
            gate_fine_delay: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DramPllConfig {
    pub ref_clk_freq: f64,
    pub out_freq: f64,
}

impl Default for DramPllConfig {
    fn default() -> DramPllConfig {
        DramPllConfig {
            ref_clk_freq: 50e6,
            out_freq: 400e6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DramGeometry {
    pub preset_id: u32,
    pub mem_type: String,
    pub ctrl_width: String,
    pub dram_width: String,
    pub density: String,
    pub speedbin: u32,
}

impl Default for DramGeometry {
    fn default() -> DramGeometry {
        DramGeometry {
            preset_id: 173,
            mem_type: "LPDDR3".into(),
            ctrl_width: "x32".into(),
            dram_width: "x32".into(),
            density: "8G".into(),
            speedbin: 800,
        }
    }
}

/// Memory timings, all in nanoseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(non_snake_case)]
pub struct DramTimings {
    pub tRAS: f64,
    pub tRC: f64,
    pub tRP: f64,
    pub tRCD: f64,
    pub tREFI: f64,
    pub tRFC: f64,
    pub tRTP: f64,
    pub tWTR: f64,
    pub tRRD: f64,
    pub tFAW: f64,
}

impl Default for DramTimings {
    fn default() -> DramTimings {
        DramTimings {
            tRAS: 42.0,
            tRC: 60.0,
            tRP: 18.0,
            tRCD: 18.0,
            tREFI: 3.9,
            tRFC: 210.0,
            tRTP: 10.0,
            tWTR: 10.0,
            tRRD: 10.0,
            tFAW: 50.0,
        }
    }
}

impl DramTimings {
    /// In the order the controller lists them.
    pub fn entries(&self) -> [(&'static str, f64); 10] {
        [
            ("tRAS", self.tRAS),
            ("tRC", self.tRC),
            ("tRP", self.tRP),
            ("tRCD", self.tRCD),
            ("tREFI", self.tREFI),
            ("tRFC", self.tRFC),
            ("tRTP", self.tRTP),
            ("tWTR", self.tWTR),
            ("tRRD", self.tRRD),
            ("tFAW", self.tFAW),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for &(name, value) in self.entries().iter() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidTiming { name, value });
            }
        }
        // A row cycle is an activate-to-precharge followed by a precharge
        if self.tRC < self.tRAS + self.tRP {
            return Err(ConfigError::TimingConstraint(format!(
                "tRC ({}) < tRAS ({}) + tRP ({})",
                self.tRC, self.tRAS, self.tRP)));
        }
        Ok(())
    }
}

impl DramConfig {
    pub fn validate(&self) -> Result<()> {
        check_freq(DRAM_PLL_REF_CLK_NAME, self.pll.ref_clk_freq)?;
        check_freq("dram_pll_CLKOUT0", self.pll.out_freq)?;
        self.timings.validate()
    }

    /// Interface designer script creating the DRAM PLL block.
    pub fn pll_block_script(&self) -> String {
        let mut ret = String::new();
        let _ = writeln!(ret, "design.create_block(\"dram_pll\", block_type=\"PLL\")");
        let _ = writeln!(ret, "design.set_property(\"dram_pll\", {{\"REFCLK_FREQ\":\"{}\"}}, block_type=\"PLL\")", mhz(self.pll.ref_clk_freq));
        let _ = writeln!(ret, "design.gen_pll_ref_clock(\"dram_pll\", pll_res=\"PLL_BR0\", refclk_src=\"EXTERNAL\", refclk_name=\"dram_pll_clkin\", ext_refclk_no=\"0\")");
        let _ = writeln!(ret, "design.set_property(\"dram_pll\",\"LOCKED_PIN\",\"dram_pll_locked\", block_type=\"PLL\")");
        let _ = writeln!(ret, "design.set_property(\"dram_pll\",\"RSTN_PIN\",\"dram_pll_rst_n\", block_type=\"PLL\")");
        let _ = writeln!(ret, "design.set_property(\"dram_pll\", {{\"CLKOUT0_PIN\" : \"dram_pll_CLKOUT0\"}}, block_type=\"PLL\")");
        let _ = writeln!(ret, "design.set_property(\"dram_pll\",\"CLKOUT0_PHASE\",\"0\",\"PLL\")");
        let _ = writeln!(ret, "calc_result = design.auto_calc_pll_clock(\"dram_pll\", {{\"CLKOUT0_FREQ\": \"{}\"}})", mhz(self.pll.out_freq));
        ret
    }

    /// Timing constraint for the DRAM PLL's reference input.
    pub fn sdc_commands(&self) -> String {
        let refclk = ClockDomain::new(DRAM_PLL_REF_CLK_NAME, self.pll.ref_clk_freq);
        format!("create_clock -period {:.1} {}\n", refclk.period_ns(), refclk.name)
    }

    /// The `efxpt:ddr` block describing the controller, its geometry/timings, and every enabled target's pins.
    pub fn ddr_xml(&self, ports: &PortTable) -> String {
        let mut ret = String::new();

        let g = &self.geometry;
        let _ = writeln!(
            ret,
            "<efxpt:ddr name=\"ddr_inst1\" ddr_def=\"DDR_0\" cs_preset_id=\"{}\" cs_mem_type=\"{}\" cs_ctrl_width=\"{}\" cs_dram_width=\"{}\" cs_dram_density=\"{}\" cs_speedbin=\"{}\" target0_enable=\"{}\" target1_enable=\"{}\" ctrl_type=\"none\">",
            g.preset_id,
            escape(&g.mem_type),
            escape(&g.ctrl_width),
            escape(&g.dram_width),
            escape(&g.density),
            g.speedbin,
            ports.contains(0),
            ports.contains(1));

        for (index, _) in ports.iter() {
            let _ = writeln!(ret, "  <efxpt:gen_pin_target{}>", index);
            for pin in pin_bindings(index) {
                let _ = write!(ret, "    <efxpt:pin name=\"{}\" type_name=\"{}\" is_bus=\"{}\"", escape(&pin.name), escape(&pin.type_name), pin.is_bus);
                if pin.is_clk {
                    let _ = write!(ret, " is_clk=\"true\" is_clk_invert=\"false\"");
                }
                let _ = writeln!(ret, "/>");
            }
            let _ = writeln!(ret, "  </efxpt:gen_pin_target{}>", index);
        }

        let _ = writeln!(ret, "  <efxpt:gen_pin_config>");
        for pin in ["CFG_SEQ_RST", "CFG_SCL_IN", "CFG_SEQ_START", "RSTN", "CFG_SDA_IN", "CFG_SDA_OEN"].iter() {
            let _ = writeln!(ret, "    <efxpt:pin name=\"\" type_name=\"{}\" is_bus=\"false\"/>", pin);
        }
        let _ = writeln!(ret, "  </efxpt:gen_pin_config>");

        param_section(&mut ret, "cs_fpga", &[
            ("FPGA_ITERM", self.fpga_iterm.to_string(), "str"),
            ("FPGA_OTERM", self.fpga_oterm.to_string(), "str"),
        ]);
        param_section(&mut ret, "cs_memory", &[
            ("RTT_NOM", self.rtt_nom.clone(), "str"),
            ("MEM_OTERM", self.mem_oterm.to_string(), "str"),
            ("CL", self.cas_latency.clone(), "str"),
        ]);
        let timings = self.timings
            .entries()
            .iter()
            .map(|&(name, value)| (name, format!("{:.3}", value), "float"))
            .collect::<Vec<_>>();
        param_section(&mut ret, "cs_memory_timing", &timings);
        param_section(&mut ret, "cs_control", &[
            ("AMAP", self.address_mapping.clone(), "str"),
            ("EN_AUTO_PWR_DN", if self.auto_power_down { "On" } else { "Off" }.into(), "str"),
            ("EN_AUTO_SELF_REF", yes_no(self.auto_self_refresh), "str"),
        ]);
        param_section(&mut ret, "cs_gate_delay", &[
            ("EN_DLY_OVR", yes_no(self.gate_delay_override), "str"),
            ("GATE_C_DLY", self.gate_coarse_delay.to_string(), "int"),
            ("GATE_F_DLY", self.gate_fine_delay.to_string(), "int"),
        ]);

        ret.push_str("</efxpt:ddr>\n");
        ret
    }
}

fn param_section(ret: &mut String, section: &str, params: &[(&str, String, &str)]) {
    let _ = writeln!(ret, "  <efxpt:{}>", section);
    for (name, value, value_type) in params.iter() {
        let _ = writeln!(ret, "    <efxpt:param name=\"{}\" value=\"{}\" value_type=\"{}\"/>", name, escape(value), value_type);
    }
    let _ = writeln!(ret, "  </efxpt:{}>", section);
}

fn yes_no(value: bool) -> String {
    let ret = if value { "Yes" } else { "No" };
    ret.into()
}

fn mhz(freq_hz: f64) -> String {
    format!("{:.1}", freq_hz / 1e6)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings_are_valid() {
        assert_eq!(DramConfig::default().validate(), Ok(()));
    }

    #[test]
    fn malformed_timings_are_rejected() {
        let mut config = DramConfig::default();
        config.timings.tRFC = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTiming { name: "tRFC", value: 0.0 }));

        let mut config = DramConfig::default();
        config.timings.tREFI = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTiming { name: "tREFI", .. })));

        let mut config = DramConfig::default();
        config.timings.tRC = 50.0;
        assert!(matches!(config.validate(), Err(ConfigError::TimingConstraint(_))));

        let mut config = DramConfig::default();
        config.pll.out_freq = -400e6;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFrequency { .. })));
    }

    #[test]
    fn pll_block_and_constraints() {
        let config = DramConfig::default();

        let script = config.pll_block_script();
        assert!(script.contains("{\"REFCLK_FREQ\":\"50.0\"}"));
        assert!(script.contains("{\"CLKOUT0_FREQ\": \"400.0\"}"));
        assert!(script.contains("\"LOCKED_PIN\",\"dram_pll_locked\""));

        assert_eq!(config.sdc_commands(), "create_clock -period 20.0 dram_pll_refclk\n");

        let mut config = DramConfig::default();
        config.pll.ref_clk_freq = 400e6;
        assert_eq!(config.sdc_commands(), "create_clock -period 2.5 dram_pll_refclk\n");
    }

    #[test]
    fn ddr_xml_describes_both_targets() {
        let xml = DramConfig::default().ddr_xml(&PortTable::default());

        assert!(xml.starts_with("<efxpt:ddr name=\"ddr_inst1\" ddr_def=\"DDR_0\" cs_preset_id=\"173\" cs_mem_type=\"LPDDR3\""));
        assert!(xml.contains("target0_enable=\"true\" target1_enable=\"true\""));
        assert!(xml.contains("<efxpt:pin name=\"axi0_wdata\" type_name=\"WDATA_0\" is_bus=\"true\"/>"));
        assert!(xml.contains("<efxpt:pin name=\"axi0_rdata\" type_name=\"RDATA_0\" is_bus=\"true\"/>"));
        assert!(!xml.contains("axi0_wdata0"));
        assert!(!xml.contains("bit_range"));
        assert!(xml.contains("<efxpt:pin name=\"axi1_wdata\" type_name=\"WDATA_1\" is_bus=\"true\"/>"));
        assert!(xml.contains("<efxpt:pin name=\"axi_clk\" type_name=\"ACLK_1\" is_bus=\"false\" is_clk=\"true\" is_clk_invert=\"false\"/>"));
        assert!(xml.contains("<efxpt:param name=\"tREFI\" value=\"3.900\" value_type=\"float\"/>"));
        assert!(xml.contains("<efxpt:param name=\"RTT_NOM\" value=\"RZQ/2\" value_type=\"str\"/>"));
        assert!(xml.contains("<efxpt:param name=\"EN_AUTO_PWR_DN\" value=\"Off\" value_type=\"str\"/>"));
        assert!(xml.contains("<efxpt:param name=\"GATE_C_DLY\" value=\"3\" value_type=\"int\"/>"));
        assert!(xml.ends_with("</efxpt:ddr>\n"));
    }

    #[test]
    fn disabled_targets_are_left_out() {
        let ports = PortTable::new(vec![(0, 256)]).unwrap();
        let xml = DramConfig::default().ddr_xml(&ports);
        assert!(xml.contains("target0_enable=\"true\" target1_enable=\"false\""));
        assert!(!xml.contains("gen_pin_target1"));
    }
}
