use thiserror::Error;

/// Everything that can go wrong while planning the SoC. All of these are fatal: the topology is fixed
///  before any hardware exists, so nothing is emitted once one of them is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("no DRAM target ports configured")]
    NoPorts,
    #[error("unknown DRAM target port index {index} (controller has {available} targets)")]
    UnknownPort { index: u32, available: u32 },
    #[error("DRAM target port {index} configured more than once")]
    DuplicatePort { index: u32 },
    #[error("DRAM target port {index} has a zero data width")]
    ZeroDataWidth { index: u32 },
    #[error("DRAM target port {index} has unsupported data width {bit_width} (expected a power of two in {min}..={max})")]
    UnsupportedDataWidth { index: u32, bit_width: u32, min: u32, max: u32 },
    #[error("DRAM target port 0 is not configured, but it backs main_ram")]
    MissingMainRamPort,

    #[error("region \"{name}\" has zero size")]
    ZeroSizeRegion { name: String },
    #[error("region \"{name}\" origin {origin:#x} is not aligned to its size {size:#x}")]
    MisalignedRegion { name: String, origin: u64, size: u64 },
    #[error("region \"{name}\" [{origin:#x}, {end:#x}) does not fit in the {limit:#x} byte bus address space")]
    RegionOutOfRange { name: String, origin: u64, end: u64, limit: u64 },
    #[error("region \"{name}\" registered twice")]
    DuplicateRegion { name: String },
    #[error("region \"{a}\" overlaps region \"{b}\"")]
    RegionOverlap { a: String, b: String },

    #[error("DRAM timing {name} = {value} ns is not a positive finite value")]
    InvalidTiming { name: &'static str, value: f64 },
    #[error("DRAM timing constraint violated: {0}")]
    TimingConstraint(String),

    #[error("no PLL output drives clock domain \"{name}\"")]
    MissingClockDomain { name: String },
    #[error("clock \"{name}\" has invalid frequency {freq_hz} Hz")]
    InvalidFrequency { name: String, freq_hz: f64 },
    #[error("PLL CLKOUT0 at {freq_hz} Hz is not an integer multiple (1..=4) of the {ref_hz} Hz reference")]
    UnreachableClkout0 { freq_hz: f64, ref_hz: f64 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
