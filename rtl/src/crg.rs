//! Clock and reset generation.
//!
//! The clocks themselves come from the FPGA's PLL hard block; all we describe here are its parameters (checked at
//!  build time) and the reset logic that keeps the `sys` domain in reset until the PLL has locked.

use crate::error::*;

use kaze::*;

/// Ti375 C529 dev kit reference oscillator.
pub const BOARD_REF_CLK_FREQ: f64 = 25e6;
pub const DEFAULT_SYS_CLK_FREQ: f64 = 100e6;

/// CLKOUT0 can only produce integer multiples of the reference up to this factor.
const CLKOUT0_MAX_MULTIPLIER: u32 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ClockDomain {
    pub name: String,
    pub freq_hz: f64,
}

impl ClockDomain {
    pub fn new<S: Into<String>>(name: S, freq_hz: f64) -> ClockDomain {
        ClockDomain {
            name: name.into(),
            freq_hz,
        }
    }

    pub fn period_ns(&self) -> f64 {
        1e9 / self.freq_hz
    }
}

/// What every clocked component is built against: the domain it runs in, and the reset that holds it.
///
/// `reset` is `None` when the component is generated on its own (eg. for simulation), in which case it exposes its
///  reset as a top-level input instead.
pub struct SysContext<'a> {
    pub clock: ClockDomain,
    pub reset: Option<&'a Signal<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PllConfig {
    pub ref_clk_freq: f64,
    /// In CLKOUT order. `None` names an output that only exists to satisfy CLKOUT0's constraint.
    pub clkouts: Vec<(Option<String>, f64)>,
}

impl PllConfig {
    /// Board PLL layout: CLKOUT0 parked at the reference frequency (it can't reach arbitrary frequencies), `sys` on
    ///  CLKOUT1.
    pub fn board(ref_clk_freq: f64, sys_clk_freq: f64) -> PllConfig {
        PllConfig {
            ref_clk_freq,
            clkouts: vec![(None, ref_clk_freq), (Some("sys".into()), sys_clk_freq)],
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_freq("pll_ref", self.ref_clk_freq)?;
        for (i, (name, freq_hz)) in self.clkouts.iter().enumerate() {
            let name = name.clone().unwrap_or_else(|| format!("clkout{}", i));
            check_freq(&name, *freq_hz)?;
        }
        if let Some((_, clkout0)) = self.clkouts.first() {
            let multiplier = clkout0 / self.ref_clk_freq;
            let is_integer = (multiplier - multiplier.round()).abs() < 1e-9;
            if !is_integer || multiplier < 1.0 || multiplier > CLKOUT0_MAX_MULTIPLIER as f64 {
                return Err(ConfigError::UnreachableClkout0 {
                    freq_hz: *clkout0,
                    ref_hz: self.ref_clk_freq,
                });
            }
        }
        Ok(())
    }

    pub fn domain(&self, name: &str) -> Option<ClockDomain> {
        self.clkouts
            .iter()
            .find(|(n, _)| n.as_deref() == Some(name))
            .map(|(_, freq_hz)| ClockDomain::new(name, *freq_hz))
    }
}

pub fn check_freq(name: &str, freq_hz: f64) -> Result<()> {
    if !freq_hz.is_finite() || freq_hz <= 0.0 {
        return Err(ConfigError::InvalidFrequency {
            name: name.into(),
            freq_hz,
        });
    }
    Ok(())
}

/// Reset logic for the `sys` domain.
///
/// `sys_reset` is held while the PLL is unlocked or the user reset button (active low) is pressed. It's passed
///  through two registers that come out of reset asserted, so it deasserts two cycles after its cause clears and
///  can never glitch low.
pub struct Crg<'a> {
    pub m: &'a Module<'a>,
    pub rst_n: &'a Input<'a>,
    pub pll_locked: &'a Input<'a>,
    pub pll_reset: &'a Output<'a>,
    pub sys_reset: &'a Output<'a>,
}

impl<'a> Crg<'a> {
    pub fn new<S: Into<String>, P: ModuleParent<'a>>(instance_name: S, p: &'a P) -> Crg<'a> {
        let m = p.module(instance_name, "Crg");

        let rst_n = m.input("rst_n", 1);
        let pll_locked = m.input("pll_locked", 1);

        let pll_reset = !rst_n;

        let sys_reset = (!pll_locked | pll_reset)
            .reg_next_with_default("sys_reset_meta", true)
            .reg_next_with_default("sys_reset_sync", true);

        Crg {
            m,
            rst_n,
            pll_locked,
            pll_reset: m.output("pll_reset", pll_reset),
            sys_reset: m.output("sys_reset", sys_reset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_pll_is_valid() {
        let pll = PllConfig::board(BOARD_REF_CLK_FREQ, DEFAULT_SYS_CLK_FREQ);
        assert_eq!(pll.validate(), Ok(()));

        let sys = pll.domain("sys").unwrap();
        assert_eq!(sys.freq_hz, 100e6);
        assert!((sys.period_ns() - 10.0).abs() < 1e-9);
        assert_eq!(pll.domain("clkout0"), None);
    }

    #[test]
    fn clkout0_must_be_small_integer_multiple_of_reference() {
        let mut pll = PllConfig::board(25e6, 100e6);
        pll.clkouts[0].1 = 100e6;
        assert_eq!(pll.validate(), Ok(()));

        pll.clkouts[0].1 = 125e6;
        assert_eq!(pll.validate(), Err(ConfigError::UnreachableClkout0 { freq_hz: 125e6, ref_hz: 25e6 }));

        pll.clkouts[0].1 = 37.5e6;
        assert!(pll.validate().is_err());
    }

    #[test]
    fn nonsense_frequencies_are_rejected() {
        assert!(matches!(PllConfig::board(25e6, 0.0).validate(), Err(ConfigError::InvalidFrequency { .. })));
        assert!(matches!(PllConfig::board(25e6, f64::NAN).validate(), Err(ConfigError::InvalidFrequency { .. })));
        assert!(matches!(PllConfig::board(-1.0, 100e6).validate(), Err(ConfigError::InvalidFrequency { .. })));
    }
}
