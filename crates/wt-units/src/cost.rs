//! Per-unit cost records read by the costing aggregator.

use std::collections::BTreeMap;

use wt_core::VarId;
use wt_core::constants::m3ph_per_m3ps;
use wt_model::Expr;

use crate::config::ConfigView;
use crate::error::UnitResult;

/// Default basis year for cost curves.
pub const DEFAULT_BASIS_YEAR: i32 = 2014;

/// Power-law capital curve `a * Q^b` (Q in m³/h) plus a constant
/// electricity intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostCurve {
    pub capital_a: f64,
    pub capital_b: f64,
    pub basis_year: i32,
    pub electricity_kwh_per_m3: f64,
}

impl CostCurve {
    pub const fn new(capital_a: f64, capital_b: f64, electricity_kwh_per_m3: f64) -> Self {
        Self {
            capital_a,
            capital_b,
            basis_year: DEFAULT_BASIS_YEAR,
            electricity_kwh_per_m3,
        }
    }

    pub const ZERO: CostCurve = CostCurve::new(0.0, 1.0, 0.0);

    /// Apply the `capital_a`, `capital_b`, `basis_year` and
    /// `electricity_kwh_per_m3` overrides.
    pub fn with_overrides(self, cfg: &ConfigView<'_>) -> UnitResult<Self> {
        let capital_a = cfg.f64_or("capital_a", self.capital_a)?;
        if capital_a < 0.0 {
            return Err(cfg.invalid("capital_a", "must be nonnegative"));
        }
        let electricity_kwh_per_m3 =
            cfg.f64_or("electricity_kwh_per_m3", self.electricity_kwh_per_m3)?;
        if electricity_kwh_per_m3 < 0.0 {
            return Err(cfg.invalid("electricity_kwh_per_m3", "must be nonnegative"));
        }
        Ok(Self {
            capital_a,
            capital_b: cfg.f64_in("capital_b", self.capital_b, 0.0, 2.0)?,
            basis_year: cfg.i32_or("basis_year", self.basis_year)?,
            electricity_kwh_per_m3,
        })
    }
}

/// What a unit exposes to costing: capital cost (USD at `basis_year`),
/// electricity intensity (kWh/m³ of `throughput`) and chemical doses (kg/m³).
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    pub capital: Expr,
    pub basis_year: i32,
    pub electricity_intensity: Expr,
    pub chemical_doses: BTreeMap<String, f64>,
    /// Flow the intensities and doses refer to.
    pub throughput: VarId,
}

impl CostRecord {
    pub fn from_curve(curve: &CostCurve, throughput: VarId) -> Self {
        let q_m3ph = Expr::var(throughput) * m3ph_per_m3ps();
        let capital = if curve.capital_a == 0.0 {
            Expr::zero()
        } else {
            Expr::constant(curve.capital_a) * q_m3ph.powf(curve.capital_b)
        };
        Self {
            capital,
            basis_year: curve.basis_year,
            electricity_intensity: Expr::constant(curve.electricity_kwh_per_m3),
            chemical_doses: BTreeMap::new(),
            throughput,
        }
    }

    pub fn add_capital(&mut self, extra: Expr) {
        let base = std::mem::replace(&mut self.capital, Expr::zero());
        self.capital = base + extra;
    }

    pub fn add_electricity(&mut self, extra: Expr) {
        let base = std::mem::replace(&mut self.electricity_intensity, Expr::zero());
        self.electricity_intensity = base + extra;
    }

    pub fn add_chemical(&mut self, name: impl Into<String>, dose_kg_per_m3: f64) {
        *self.chemical_doses.entry(name.into()).or_insert(0.0) += dose_kg_per_m3;
    }
}
