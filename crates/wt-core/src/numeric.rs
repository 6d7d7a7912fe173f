/// Lower bound on every stream's volumetric flow (m³/s).
///
/// Strictly positive so recovery and removal ratios stay defined.
pub const FLOW_LOWER_BOUND: f64 = 1e-12;

/// Fraction of the inlet flow carried by an inactive discrete-routing branch.
pub const NEGLIGIBLE_FRACTION: f64 = 1e-8;

/// Half-width of the band around 1 accepted for a sum of split fractions.
pub const SPLIT_SUM_BAND: f64 = 1e-6;

/// Absolute and relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Looser tolerance used when comparing solved values against expectations.
    pub fn solver() -> Self {
        Self {
            abs: 1e-6,
            rel: 1e-6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negligible_fraction_is_below_band() {
        assert!(NEGLIGIBLE_FRACTION < SPLIT_SUM_BAND * 10.0);
        assert!(FLOW_LOWER_BOUND < NEGLIGIBLE_FRACTION);
    }
}
