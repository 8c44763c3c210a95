//! Top-level Verilog wrapper around the generated `Soc` module.
//!
//! kaze signals top out at 128 bits, so wider data buses leave `Soc` as lanes (`axi0_wdata0`, `axi0_wdata1`, ...).
//!  The wrapper re-exposes every `Soc` port unchanged, except that each group of lanes is joined back into a single
//!  port named after the bus. Those joined names are the ones the DDR pin bindings refer to.

use crate::address_map::target_name;
use crate::axi::AxiParams;
use crate::config::PortTable;

use thiserror::Error;

use std::collections::HashMap;
use std::fmt::Write;

pub const TOP_MODULE_NAME: &str = "SocTop";
pub const SOC_INSTANCE_NAME: &str = "soc";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WrapperError {
    #[error("module \"{0}\" not found in generated Verilog")]
    MissingModule(String),
    #[error("port list of module \"{0}\" is never closed")]
    UnterminatedPortList(String),
    #[error("can't parse port declaration \"{0}\"")]
    MalformedPort(String),
    #[error("lane \"{lane}\" of bus \"{bus}\" is missing or has the wrong shape")]
    BadLane { bus: String, lane: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn keyword(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub direction: Direction,
    pub name: String,
    pub bit_width: u32,
}

/// A data bus that `Soc` carries as `params.lane_count()` lanes named `<name>0`, `<name>1`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneGroup {
    pub name: String,
    pub params: AxiParams,
}

/// Every split bus on `Soc`'s boundary: the controller data pins and the matching AXI-Lite data ports of each
///  target wider than one lane.
pub fn lane_groups(ports: &PortTable) -> Vec<LaneGroup> {
    let mut ret = Vec::new();
    for (index, data_bit_width) in ports.iter() {
        let params = AxiParams::dram_target(data_bit_width);
        if params.lane_count() == 1 {
            continue;
        }
        let target = target_name(index);
        for name in [
            format!("axi{}_wdata", index),
            format!("axi{}_rdata", index),
            format!("{}_w_data", target),
            format!("{}_r_data", target),
        ].iter() {
            ret.push(LaneGroup {
                name: name.clone(),
                params,
            });
        }
    }
    ret
}

/// Reads the port list of `module_name` out of kaze's Verilog output.
pub fn module_ports(verilog: &str, module_name: &str) -> Result<Vec<Port>, WrapperError> {
    let header = format!("module {}(", module_name);
    let mut lines = verilog.lines().map(str::trim).skip_while(|line| *line != header);
    if lines.next().is_none() {
        return Err(WrapperError::MissingModule(module_name.into()));
    }

    let mut ret = Vec::new();
    for line in lines {
        if line.starts_with(')') {
            return Ok(ret);
        }
        if line.is_empty() {
            continue;
        }
        ret.push(parse_port(line)?);
    }
    Err(WrapperError::UnterminatedPortList(module_name.into()))
}

fn parse_port(line: &str) -> Result<Port, WrapperError> {
    let malformed = || WrapperError::MalformedPort(line.into());

    let mut tokens = line.trim_end_matches(',').split_whitespace();
    let direction = match tokens.next() {
        Some("input") => Direction::Input,
        Some("output") => Direction::Output,
        _ => return Err(malformed()),
    };

    let mut bit_width = 1;
    let mut name = None;
    for token in tokens {
        match token.strip_prefix('[').and_then(|range| range.strip_suffix(']')) {
            Some(range) => {
                let (msb, lsb) = range.split_once(':').ok_or_else(malformed)?;
                let msb = msb.parse::<u32>().map_err(|_| malformed())?;
                let lsb = lsb.parse::<u32>().map_err(|_| malformed())?;
                if msb < lsb {
                    return Err(malformed());
                }
                bit_width = msb - lsb + 1;
            }
            // Net type keywords come before the name
            None => name = Some(token),
        }
    }

    Ok(Port {
        direction,
        name: name.ok_or_else(malformed)?.into(),
        bit_width,
    })
}

/// Generates `TOP_MODULE_NAME`, which instantiates `inner_module` (whose ports are `inner_ports`) and joins each of
///  `groups`' lanes into one port.
pub fn generate(inner_module: &str, inner_ports: &[Port], groups: &[LaneGroup]) -> Result<String, WrapperError> {
    // Lane port name -> (group, lane)
    let mut lanes = HashMap::new();
    for group in groups.iter() {
        let params = &group.params;
        let mut direction = None;
        for lane in 0..params.lane_count() {
            let lane_name = params.lane_name(&group.name, lane);
            let bad_lane = || WrapperError::BadLane {
                bus: group.name.clone(),
                lane: lane_name.clone(),
            };
            let port = inner_ports.iter().find(|p| p.name == lane_name).ok_or_else(bad_lane)?;
            if port.bit_width != params.lane_bit_width() || direction.map_or(false, |d| d != port.direction) {
                return Err(bad_lane());
            }
            direction = Some(port.direction);
            lanes.insert(lane_name, (group, lane));
        }
    }

    let mut outer_ports = Vec::new();
    let mut connections = Vec::new();
    for port in inner_ports.iter() {
        match lanes.get(&port.name) {
            Some(&(group, lane)) => {
                if lane == 0 {
                    outer_ports.push(Port {
                        direction: port.direction,
                        name: group.name.clone(),
                        bit_width: group.params.data_bit_width,
                    });
                }
                let (msb, lsb) = group.params.lane_bit_range(lane);
                connections.push((port.name.clone(), format!("{}[{}:{}]", group.name, msb, lsb)));
            }
            None => {
                outer_ports.push(port.clone());
                connections.push((port.name.clone(), port.name.clone()));
            }
        }
    }

    let mut ret = String::new();
    let _ = writeln!(ret, "module {}(", TOP_MODULE_NAME);
    for (i, port) in outer_ports.iter().enumerate() {
        let _ = write!(ret, "    {} wire ", port.direction.keyword());
        if port.bit_width > 1 {
            let _ = write!(ret, "[{}:0] ", port.bit_width - 1);
        }
        let separator = if i + 1 < outer_ports.len() { "," } else { "" };
        let _ = writeln!(ret, "{}{}", port.name, separator);
    }
    let _ = writeln!(ret, ");");
    let _ = writeln!(ret);
    let _ = writeln!(ret, "    {} {}(", inner_module, SOC_INSTANCE_NAME);
    for (i, (inner, outer)) in connections.iter().enumerate() {
        let separator = if i + 1 < connections.len() { "," } else { "" };
        let _ = writeln!(ret, "        .{}({}){}", inner, outer, separator);
    }
    let _ = writeln!(ret, "    );");
    let _ = writeln!(ret);
    let _ = writeln!(ret, "endmodule");
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::pseudo_channel::pin_bindings;

    const SOC_HEADER: &str = "module Soc(
    input wire reset_n,
    input wire clk,
    input wire [127:0] axi0_rdata0,
    input wire [127:0] axi0_rdata1,
    input wire axi0_rvalid,
    output wire [127:0] axi0_wdata0,
    output wire [127:0] axi0_wdata1,
    output wire [31:0] axi0_aaddr,
    output wire [127:0] axi1_wdata
);

endmodule
";

    fn axi0_groups() -> Vec<LaneGroup> {
        lane_groups(&PortTable::default())
            .into_iter()
            .filter(|g| g.name.starts_with("axi0"))
            .collect()
    }

    #[test]
    fn only_wide_targets_are_split() {
        let names = lane_groups(&PortTable::default()).into_iter().map(|g| g.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["axi0_wdata", "axi0_rdata", "target0_w_data", "target0_r_data"]);
    }

    #[test]
    fn module_ports_are_read_from_kaze_output() {
        let ports = module_ports(SOC_HEADER, "Soc").unwrap();
        assert_eq!(ports.len(), 9);
        assert_eq!(ports[0], Port { direction: Direction::Input, name: "reset_n".into(), bit_width: 1 });
        assert_eq!(ports[7], Port { direction: Direction::Output, name: "axi0_aaddr".into(), bit_width: 32 });

        assert_eq!(module_ports(SOC_HEADER, "Crg"), Err(WrapperError::MissingModule("Crg".into())));
        assert_eq!(
            module_ports("module Soc(\n    inout wire x\n);\n", "Soc"),
            Err(WrapperError::MalformedPort("inout wire x".into())));
        assert_eq!(
            module_ports("module Soc(\n    input wire x,\n", "Soc"),
            Err(WrapperError::UnterminatedPortList("Soc".into())));
    }

    #[test]
    fn lanes_are_joined_under_the_bus_name() {
        let ports = module_ports(SOC_HEADER, "Soc").unwrap();
        let top = generate("Soc", &ports, &axi0_groups()).unwrap();

        assert!(top.starts_with("module SocTop(\n    input wire reset_n,\n    input wire clk,\n"));
        assert!(top.contains("    input wire [255:0] axi0_rdata,\n"));
        assert!(top.contains("    output wire [255:0] axi0_wdata,\n"));
        assert!(top.contains("    output wire [127:0] axi1_wdata\n);\n"));
        assert!(!top.contains("wire [127:0] axi0_wdata0"));

        assert!(top.contains("    Soc soc(\n"));
        assert!(top.contains("        .axi0_wdata0(axi0_wdata[127:0]),\n"));
        assert!(top.contains("        .axi0_wdata1(axi0_wdata[255:128]),\n"));
        assert!(top.contains("        .axi0_rdata1(axi0_rdata[255:128]),\n"));
        assert!(top.contains("        .axi1_wdata(axi1_wdata)\n    );\n"));
        assert!(top.ends_with("endmodule\n"));
    }

    #[test]
    fn joined_data_buses_match_the_pin_bindings() {
        let ports = module_ports(SOC_HEADER, "Soc").unwrap();
        let top = generate("Soc", &ports, &axi0_groups()).unwrap();
        let top_ports = module_ports(&top, TOP_MODULE_NAME).unwrap();

        for pin in pin_bindings(0).iter().filter(|p| p.type_name == "WDATA_0" || p.type_name == "RDATA_0") {
            let port = top_ports.iter().find(|p| p.name == pin.name).unwrap();
            assert_eq!(port.bit_width, 256);
        }
    }

    #[test]
    fn missing_or_misshapen_lanes_are_rejected() {
        let ports = module_ports(SOC_HEADER, "Soc").unwrap();

        let short = ports.iter().filter(|p| p.name != "axi0_rdata1").cloned().collect::<Vec<_>>();
        assert_eq!(
            generate("Soc", &short, &axi0_groups()),
            Err(WrapperError::BadLane { bus: "axi0_rdata".into(), lane: "axi0_rdata1".into() }));

        let groups = vec![LaneGroup { name: "axi0_wdata".into(), params: AxiParams::dram_target(512) }];
        assert!(matches!(generate("Soc", &ports, &groups), Err(WrapperError::BadLane { .. })));
    }
}
