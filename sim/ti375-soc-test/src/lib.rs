mod modules {
    include!(concat!(env!("OUT_DIR"), "/modules.rs"));
}

pub use modules::*;
