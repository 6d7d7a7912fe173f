//! Train-level economic parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CostingError, CostingResult};
use crate::index::CostIndexTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostingParams {
    /// Year all costs are reported in.
    pub analysis_year: i32,
    pub plant_lifetime_years: u32,
    pub discount_rate: f64,
    /// Fraction of the year the plant operates.
    pub utilization: f64,
    pub electricity_price_usd_per_kwh: f64,
    /// Annual fixed O&M as a fraction of capital.
    pub fixed_om_fraction: f64,
    /// Multiplier from USD to the reporting currency.
    pub currency_factor: f64,
    pub chemical_prices_usd_per_kg: BTreeMap<String, f64>,
    pub cost_index: CostIndexTable,
}

impl Default for CostingParams {
    fn default() -> Self {
        Self {
            analysis_year: 2020,
            plant_lifetime_years: 25,
            discount_rate: 0.05,
            utilization: 0.9,
            electricity_price_usd_per_kwh: 0.07,
            fixed_om_fraction: 0.04,
            currency_factor: 1.0,
            chemical_prices_usd_per_kg: BTreeMap::new(),
            cost_index: CostIndexTable::default(),
        }
    }
}

impl CostingParams {
    pub fn validate(&self) -> CostingResult<()> {
        let checks: [(&'static str, f64, bool); 6] = [
            ("discount_rate", self.discount_rate, self.discount_rate >= 0.0),
            (
                "utilization",
                self.utilization,
                self.utilization > 0.0 && self.utilization <= 1.0,
            ),
            (
                "electricity_price_usd_per_kwh",
                self.electricity_price_usd_per_kwh,
                self.electricity_price_usd_per_kwh >= 0.0,
            ),
            (
                "fixed_om_fraction",
                self.fixed_om_fraction,
                self.fixed_om_fraction >= 0.0,
            ),
            (
                "currency_factor",
                self.currency_factor,
                self.currency_factor > 0.0,
            ),
            (
                "plant_lifetime_years",
                self.plant_lifetime_years as f64,
                self.plant_lifetime_years > 0,
            ),
        ];
        for (what, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(CostingError::InvalidParameter { what, value });
            }
        }
        if let Some((_, price)) = self
            .chemical_prices_usd_per_kg
            .iter()
            .find(|(_, p)| !(p.is_finite() && **p >= 0.0))
        {
            return Err(CostingError::InvalidParameter {
                what: "chemical price",
                value: *price,
            });
        }
        self.cost_index.index(self.analysis_year)?;
        Ok(())
    }

    /// `i (1+i)^n / ((1+i)^n - 1)`, or `1/n` at zero interest.
    pub fn capital_recovery_factor(&self) -> f64 {
        let n = self.plant_lifetime_years as f64;
        let i = self.discount_rate;
        if i == 0.0 {
            return 1.0 / n;
        }
        let g = (1.0 + i).powf(n);
        i * g / (g - 1.0)
    }

    pub fn chemical_price(&self, unit: &str, chemical: &str) -> CostingResult<f64> {
        self.chemical_prices_usd_per_kg
            .get(chemical)
            .copied()
            .ok_or_else(|| CostingError::MissingChemicalPrice {
                unit: unit.to_string(),
                chemical: chemical.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capital_recovery_factor() {
        let p = CostingParams {
            discount_rate: 0.05,
            plant_lifetime_years: 20,
            ..CostingParams::default()
        };
        assert!((p.capital_recovery_factor() - 0.080243).abs() < 1e-6);
        let flat = CostingParams {
            discount_rate: 0.0,
            plant_lifetime_years: 20,
            ..CostingParams::default()
        };
        assert!((flat.capital_recovery_factor() - 0.05).abs() < 1e-15);
    }

    #[test]
    fn validation() {
        CostingParams::default().validate().unwrap();
        let bad = CostingParams {
            utilization: 1.5,
            ..CostingParams::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(CostingError::InvalidParameter {
                what: "utilization",
                ..
            })
        ));
        let no_year = CostingParams {
            analysis_year: 1990,
            ..CostingParams::default()
        };
        assert_eq!(
            no_year.validate().unwrap_err(),
            CostingError::MissingIndexYear { year: 1990 }
        );
    }

    #[test]
    fn missing_chemical_price() {
        let err = CostingParams::default()
            .chemical_price("coag", "ferric_chloride")
            .unwrap_err();
        assert!(matches!(err, CostingError::MissingChemicalPrice { .. }));
    }
}
