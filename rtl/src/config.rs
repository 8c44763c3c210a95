use crate::axi::AxiParams;
use crate::crg::*;
use crate::dram_config::DramConfig;
use crate::error::*;

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;

/// The Ti375's DDR controller has two AXI targets.
pub const DRAM_TARGET_COUNT: u32 = 2;
pub const MIN_DATA_BIT_WIDTH: u32 = 32;
pub const MAX_DATA_BIT_WIDTH: u32 = 512;

/// Data width of every enabled DDR target, by target index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTable {
    ports: BTreeMap<u32, u32>,
}

impl PortTable {
    pub fn new<I: IntoIterator<Item = (u32, u32)>>(entries: I) -> Result<PortTable> {
        let mut ports = BTreeMap::new();
        for (index, bit_width) in entries {
            if index >= DRAM_TARGET_COUNT {
                return Err(ConfigError::UnknownPort { index, available: DRAM_TARGET_COUNT });
            }
            if bit_width == 0 {
                return Err(ConfigError::ZeroDataWidth { index });
            }
            if !bit_width.is_power_of_two() || bit_width < MIN_DATA_BIT_WIDTH || bit_width > MAX_DATA_BIT_WIDTH {
                return Err(ConfigError::UnsupportedDataWidth {
                    index,
                    bit_width,
                    min: MIN_DATA_BIT_WIDTH,
                    max: MAX_DATA_BIT_WIDTH,
                });
            }
            if ports.insert(index, bit_width).is_some() {
                return Err(ConfigError::DuplicatePort { index });
            }
        }
        if ports.is_empty() {
            return Err(ConfigError::NoPorts);
        }
        Ok(PortTable { ports })
    }

    /// `(index, data_bit_width)` in index order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (u32, u32)> + 'a {
        self.ports.iter().map(|(&index, &bit_width)| (index, bit_width))
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.ports.contains_key(&index)
    }

    pub fn params(&self, index: u32) -> Option<AxiParams> {
        self.ports.get(&index).map(|&bit_width| AxiParams::dram_target(bit_width))
    }
}

impl Default for PortTable {
    /// target0 is 256 bits wide, target1 128.
    fn default() -> PortTable {
        let mut ports = BTreeMap::new();
        ports.insert(0, 256);
        ports.insert(1, 128);
        PortTable { ports }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortConfig {
    pub index: u32,
    pub data_width: u32,
}

/// Everything the generator needs to know about the SoC. Every field has a default matching the dev kit, so a config
///  file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocConfig {
    pub ident: String,
    pub sys_clk_freq: f64,
    pub ref_clk_freq: f64,
    pub ports: Vec<PortConfig>,
    pub dram: DramConfig,
}

impl Default for SocConfig {
    fn default() -> SocConfig {
        SocConfig {
            ident: "LiteX SoC on Efinix Ti375 C529 Dev Kit".into(),
            sys_clk_freq: DEFAULT_SYS_CLK_FREQ,
            ref_clk_freq: BOARD_REF_CLK_FREQ,
            ports: PortTable::default()
                .iter()
                .map(|(index, data_width)| PortConfig { index, data_width })
                .collect(),
            dram: DramConfig::default(),
        }
    }
}

impl SocConfig {
    pub fn from_toml(s: &str) -> std::result::Result<SocConfig, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn port_table(&self) -> Result<PortTable> {
        PortTable::new(self.ports.iter().map(|p| (p.index, p.data_width)))
    }

    pub fn pll(&self) -> PllConfig {
        PllConfig::board(self.ref_clk_freq, self.sys_clk_freq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_table() {
        let ports = PortTable::default();
        assert_eq!(ports.iter().collect::<Vec<_>>(), vec![(0, 256), (1, 128)]);
        assert_eq!(ports.params(1), Some(AxiParams::dram_target(128)));
        assert_eq!(ports.params(2), None);
        assert_eq!(SocConfig::default().port_table(), Ok(ports));
    }

    #[test]
    fn port_table_entries_are_sorted() {
        let ports = PortTable::new(vec![(1, 64), (0, 32)]).unwrap();
        assert_eq!(ports.iter().collect::<Vec<_>>(), vec![(0, 32), (1, 64)]);
    }

    #[test]
    fn malformed_port_tables_are_rejected() {
        assert_eq!(PortTable::new(vec![]), Err(ConfigError::NoPorts));
        assert_eq!(PortTable::new(vec![(2, 128)]), Err(ConfigError::UnknownPort { index: 2, available: 2 }));
        assert_eq!(PortTable::new(vec![(0, 0)]), Err(ConfigError::ZeroDataWidth { index: 0 }));
        assert!(matches!(PortTable::new(vec![(0, 96)]), Err(ConfigError::UnsupportedDataWidth { bit_width: 96, .. })));
        assert!(matches!(PortTable::new(vec![(0, 16)]), Err(ConfigError::UnsupportedDataWidth { .. })));
        assert!(matches!(PortTable::new(vec![(0, 1024)]), Err(ConfigError::UnsupportedDataWidth { .. })));
        assert_eq!(PortTable::new(vec![(1, 128), (1, 64)]), Err(ConfigError::DuplicatePort { index: 1 }));
    }

    #[test]
    fn partial_config_files_keep_defaults() {
        let config = SocConfig::from_toml(r#"
            sys_clk_freq = 75e6

            [[ports]]
            index = 1
            data_width = 64

            [dram.timings]
            tRFC = 180.0
        "#).unwrap();

        assert_eq!(config.sys_clk_freq, 75e6);
        assert_eq!(config.ref_clk_freq, BOARD_REF_CLK_FREQ);
        assert_eq!(config.port_table().unwrap().iter().collect::<Vec<_>>(), vec![(1, 64)]);
        assert_eq!(config.dram.timings.tRFC, 180.0);
        assert_eq!(config.dram.timings.tRAS, 42.0);
        assert_eq!(config.dram.geometry.mem_type, "LPDDR3");
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        assert!(SocConfig::from_toml("sys_clock = 1").is_err());
    }

    #[test]
    fn default_config_survives_toml() {
        let config = SocConfig::default();
        let s = config.to_toml().unwrap();
        assert_eq!(SocConfig::from_toml(&s).unwrap(), config);
    }
}
