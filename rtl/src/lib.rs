pub mod addr_arbiter;
pub mod address_map;
pub mod axi;
pub mod axi_lite_bridge;
pub mod config;
pub mod crg;
pub mod dram_config;
pub mod dram_target;
pub mod error;
pub mod pseudo_channel;
pub mod pseudo_channel_bridge;
pub mod soc;
pub mod top;
