//! The SoC's bus address space: one fixed window per DDR target, plus the `main_ram` alias the linker uses.

use crate::config::PortTable;
use crate::error::*;

use tracing::debug;

use std::fmt::Write;

pub const DRAM_TARGETS_BASE: u64 = 0x4000_0000;
/// Every target exposes 256MB regardless of its data width; width only changes bytes per beat.
pub const DRAM_TARGET_REGION_SIZE: u64 = 0x1000_0000;
/// The system bus is 32 bits wide.
pub const BUS_ADDRESS_SPACE_SIZE: u64 = 1 << 32;

pub const MAIN_RAM_REGION_NAME: &str = "main_ram";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub origin: u64,
    pub size: u64,
    /// Region is visible to the linker (program load/execution).
    pub linker: bool,
}

impl Region {
    pub fn new(origin: u64, size: u64) -> Region {
        Region {
            origin,
            size,
            linker: false,
        }
    }

    /// One past the last address, saturating at `u64::MAX`. `AddressMap` never accepts a region that saturates.
    pub fn end(&self) -> u64 {
        self.origin.saturating_add(self.size)
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.origin < other.end() && other.origin < self.end()
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.origin && addr < self.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRegion {
    pub name: String,
    pub region: Region,
    /// Name of the region this one re-exposes, if any. Aliases are exempt from overlap checks against their target.
    pub alias_of: Option<String>,
}

/// A bus slave registration: the interconnect routes accesses within `region` to `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusSlave {
    pub name: String,
    pub port_index: u32,
    pub region: Region,
}

pub fn target_name(port_index: u32) -> String {
    format!("target{}", port_index)
}

pub fn target_region(port_index: u32) -> Region {
    Region::new(DRAM_TARGETS_BASE + port_index as u64 * DRAM_TARGET_REGION_SIZE, DRAM_TARGET_REGION_SIZE)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressMap {
    regions: Vec<NamedRegion>,
    slaves: Vec<BusSlave>,
}

impl AddressMap {
    pub fn new() -> AddressMap {
        AddressMap::default()
    }

    /// Maps every configured target to its window and makes target 0 the system's main RAM.
    pub fn for_dram_targets(ports: &PortTable) -> Result<AddressMap> {
        let mut ret = AddressMap::new();
        for (index, _) in ports.iter() {
            ret.add_slave(index, target_region(index))?;
        }

        let main_ram_target = target_name(0);
        let main_ram = ret
            .region(&main_ram_target)
            .ok_or(ConfigError::MissingMainRamPort)?;
        ret.add_alias(MAIN_RAM_REGION_NAME, &main_ram_target, Region { linker: true, ..main_ram })?;

        Ok(ret)
    }

    pub fn add_slave(&mut self, port_index: u32, region: Region) -> Result<()> {
        let name = target_name(port_index);
        self.add_region(&name, region, None)?;
        self.slaves.push(BusSlave {
            name,
            port_index,
            region,
        });
        Ok(())
    }

    pub fn add_alias(&mut self, name: &str, alias_of: &str, region: Region) -> Result<()> {
        self.add_region(name, region, Some(alias_of.into()))
    }

    fn add_region(&mut self, name: &str, region: Region, alias_of: Option<String>) -> Result<()> {
        if region.size == 0 {
            return Err(ConfigError::ZeroSizeRegion { name: name.into() });
        }
        let end = match region.origin.checked_add(region.size) {
            Some(end) if end <= BUS_ADDRESS_SPACE_SIZE => end,
            end => {
                return Err(ConfigError::RegionOutOfRange {
                    name: name.into(),
                    origin: region.origin,
                    end: end.unwrap_or(u64::MAX),
                    limit: BUS_ADDRESS_SPACE_SIZE,
                });
            }
        };
        if !region.size.is_power_of_two() || region.origin % region.size != 0 {
            return Err(ConfigError::MisalignedRegion {
                name: name.into(),
                origin: region.origin,
                size: region.size,
            });
        }
        for existing in self.regions.iter() {
            if existing.name == name {
                return Err(ConfigError::DuplicateRegion { name: name.into() });
            }
            let aliased = alias_of.as_deref() == Some(existing.name.as_str()) || existing.alias_of.as_deref() == Some(name);
            if !aliased && existing.region.overlaps(&region) {
                return Err(ConfigError::RegionOverlap {
                    a: existing.name.clone(),
                    b: name.into(),
                });
            }
        }

        debug!("region {} at [{:#010x}, {:#010x})", name, region.origin, end);
        self.regions.push(NamedRegion {
            name: name.into(),
            region,
            alias_of,
        });
        Ok(())
    }

    pub fn region(&self, name: &str) -> Option<Region> {
        self.regions.iter().find(|r| r.name == name).map(|r| r.region)
    }

    pub fn main_ram(&self) -> Option<Region> {
        self.region(MAIN_RAM_REGION_NAME)
    }

    pub fn regions(&self) -> &[NamedRegion] {
        &self.regions
    }

    pub fn slaves(&self) -> &[BusSlave] {
        &self.slaves
    }

    /// Resolves a bus address to the slave that decodes it.
    pub fn decode(&self, addr: u64) -> Option<&BusSlave> {
        self.slaves.iter().find(|s| s.region.contains(addr))
    }

    /// GNU ld `MEMORY` block for every region.
    pub fn linker_regions(&self) -> String {
        let mut ret = String::new();
        ret.push_str("MEMORY {\n");
        for r in self.regions.iter() {
            let _ = writeln!(ret, "\t{} : ORIGIN = {:#010x}, LENGTH = {:#010x}", r.name, r.region.origin, r.region.size);
        }
        ret.push_str("}\n");
        ret
    }

    /// C header with the SoC's identifier and `<NAME>_BASE`/`<NAME>_SIZE` per region.
    pub fn c_header(&self, ident: &str) -> String {
        let mut ret = String::new();
        ret.push_str("#ifndef __GENERATED_MEM_H\n#define __GENERATED_MEM_H\n\n");
        let _ = writeln!(ret, "#define SOC_IDENT \"{}\"\n", ident.replace('\\', "\\\\").replace('"', "\\\""));
        for r in self.regions.iter() {
            let name = r.name.to_uppercase();
            let _ = writeln!(ret, "#ifndef {}_BASE", name);
            let _ = writeln!(ret, "#define {}_BASE {:#010x}L", name, r.region.origin);
            let _ = writeln!(ret, "#define {}_SIZE {:#010x}", name, r.region.size);
            let _ = writeln!(ret, "#endif\n");
        }
        ret.push_str("#endif\n");
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_map() -> AddressMap {
        AddressMap::for_dram_targets(&PortTable::default()).unwrap()
    }

    #[test]
    fn targets_get_consecutive_256mb_windows() {
        let map = default_map();
        assert_eq!(map.region("target0"), Some(Region::new(0x4000_0000, 0x1000_0000)));
        assert_eq!(map.region("target1"), Some(Region::new(0x5000_0000, 0x1000_0000)));
        assert_eq!(map.region("target1").unwrap().end(), 0x6000_0000);

        let slaves = map.slaves();
        assert_eq!(slaves.len(), 2);
        assert_eq!(slaves[0].name, "target0");
        assert_eq!(slaves[1].port_index, 1);
    }

    #[test]
    fn target0_is_main_ram() {
        let map = default_map();
        let main_ram = map.main_ram().unwrap();
        assert_eq!(main_ram.origin, 0x4000_0000);
        assert_eq!(main_ram.size, 0x1000_0000);
        assert!(main_ram.linker);
        assert!(!map.region("target0").unwrap().linker);
    }

    #[test]
    fn region_size_is_independent_of_data_width() {
        let narrow = PortTable::new(vec![(0, 32), (1, 32)]).unwrap();
        let wide = PortTable::new(vec![(0, 512), (1, 512)]).unwrap();
        let narrow = AddressMap::for_dram_targets(&narrow).unwrap();
        let wide = AddressMap::for_dram_targets(&wide).unwrap();
        assert_eq!(narrow.regions(), wide.regions());
    }

    #[test]
    fn target_regions_never_overlap() {
        let map = default_map();
        let slaves = map.slaves();
        for (i, a) in slaves.iter().enumerate() {
            for b in slaves.iter().skip(i + 1) {
                assert!(!a.region.overlaps(&b.region), "{} overlaps {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn mapping_is_a_pure_function_of_the_port_table() {
        assert_eq!(default_map(), default_map());
    }

    #[test]
    fn decode_routes_to_owning_target() {
        let map = default_map();
        assert_eq!(map.decode(0x4000_0000).unwrap().name, "target0");
        assert_eq!(map.decode(0x4fff_ffff).unwrap().name, "target0");
        assert_eq!(map.decode(0x5000_0000).unwrap().name, "target1");
        assert!(map.decode(0x6000_0000).is_none());
        assert!(map.decode(0x3fff_ffff).is_none());
    }

    #[test]
    fn overlapping_regions_are_rejected() {
        let mut map = AddressMap::new();
        map.add_slave(0, Region::new(0x4000_0000, 0x1000_0000)).unwrap();
        assert_eq!(
            map.add_slave(1, Region::new(0x4000_0000, 0x1000_0000)),
            Err(ConfigError::RegionOverlap { a: "target0".into(), b: "target1".into() }));
        assert_eq!(
            map.add_alias("main_ram", "target1", Region::new(0x4000_0000, 0x1000_0000)),
            Err(ConfigError::RegionOverlap { a: "target0".into(), b: "main_ram".into() }));
    }

    #[test]
    fn malformed_regions_are_rejected() {
        let mut map = AddressMap::new();
        assert_eq!(map.add_slave(0, Region::new(0x4000_0000, 0)), Err(ConfigError::ZeroSizeRegion { name: "target0".into() }));
        assert!(matches!(map.add_slave(0, Region::new(0x4800_0000, 0x1000_0000)), Err(ConfigError::MisalignedRegion { .. })));
        assert!(matches!(map.add_slave(0, Region::new(0x1_0000_0000, 0x1000_0000)), Err(ConfigError::RegionOutOfRange { .. })));

        map.add_slave(0, target_region(0)).unwrap();
        assert_eq!(map.add_slave(0, target_region(1)), Err(ConfigError::DuplicateRegion { name: "target0".into() }));
    }

    #[test]
    fn linker_and_header_exports() {
        let map = default_map();

        let ld = map.linker_regions();
        assert!(ld.starts_with("MEMORY {\n"));
        assert!(ld.contains("\ttarget1 : ORIGIN = 0x50000000, LENGTH = 0x10000000\n"));
        assert!(ld.contains("\tmain_ram : ORIGIN = 0x40000000, LENGTH = 0x10000000\n"));

        let h = map.c_header("Ti375 \"test\" SoC");
        assert!(h.contains("#define SOC_IDENT \"Ti375 \\\"test\\\" SoC\"\n"));
        assert!(h.contains("#define MAIN_RAM_BASE 0x40000000L\n"));
        assert!(h.contains("#define TARGET1_SIZE 0x10000000\n"));
    }

    #[test]
    fn main_ram_needs_port_0() {
        let ports = PortTable::new(vec![(1, 128)]).unwrap();
        assert_eq!(AddressMap::for_dram_targets(&ports), Err(ConfigError::MissingMainRamPort));
    }

    #[test]
    fn regions_wrapping_the_address_space_are_out_of_range() {
        let mut map = AddressMap::new();
        let top = Region::new(u64::MAX - 0x0fff_ffff, 0x1000_0000);
        assert_eq!(top.end(), u64::MAX);
        assert_eq!(
            map.add_slave(0, top),
            Err(ConfigError::RegionOutOfRange {
                name: "target0".into(),
                origin: u64::MAX - 0x0fff_ffff,
                end: u64::MAX,
                limit: BUS_ADDRESS_SPACE_SIZE,
            }));
        assert!(matches!(map.add_slave(1, Region::new(u64::MAX, u64::MAX)), Err(ConfigError::RegionOutOfRange { .. })));
        assert!(map.regions().is_empty());
    }
}
