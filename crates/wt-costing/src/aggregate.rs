//! Roll-up of unit cost records into train totals.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;
use wt_core::constants::SECONDS_PER_YEAR;
use wt_units::{UnitKind, UnitProcess};

use crate::error::{CostingError, CostingResult};
use crate::params::CostingParams;

/// Costs of one unit in analysis-year currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitCost {
    pub unit: String,
    pub kind: UnitKind,
    pub capital: f64,
    pub fixed_om_per_year: f64,
    pub electricity_kwh_per_year: f64,
    pub electricity_per_year: f64,
    pub chemical_kg_per_year: BTreeMap<String, f64>,
    pub chemicals_per_year: f64,
}

impl UnitCost {
    pub fn operating_per_year(&self) -> f64 {
        self.fixed_om_per_year + self.electricity_per_year + self.chemicals_per_year
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainCost {
    pub analysis_year: i32,
    pub units: Vec<UnitCost>,
    pub capital: f64,
    pub annualized_capital: f64,
    pub fixed_om_per_year: f64,
    pub electricity_per_year: f64,
    pub chemicals_per_year: f64,
    pub operating_per_year: f64,
    pub product_m3_per_year: f64,
    /// Levelized cost of water; `None` when there is no product flow.
    pub lcow_per_m3: Option<f64>,
    pub specific_energy_kwh_per_m3: Option<f64>,
}

/// Annual volume for a flow in m³/s at the plant's utilization.
pub fn annual_volume(flow_m3ps: f64, params: &CostingParams) -> f64 {
    flow_m3ps * SECONDS_PER_YEAR * params.utilization
}

/// Cost one unit at solved `values`.
pub fn cost_unit(
    unit: &UnitProcess,
    values: &[f64],
    params: &CostingParams,
) -> CostingResult<UnitCost> {
    let rec = &unit.cost;
    let finite = |what: &'static str, value: f64| {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CostingError::NonFinite {
                unit: unit.name.clone(),
                what,
                value,
            })
        }
    };

    let scale = params
        .cost_index
        .factor(rec.basis_year, params.analysis_year)?
        * params.currency_factor;
    let capital = finite("capital cost", rec.capital.eval(values))? * scale;

    let throughput = values.get(rec.throughput.idx()).copied().unwrap_or(f64::NAN);
    let volume = finite("throughput", annual_volume(throughput, params))?;
    let intensity = finite("electricity intensity", rec.electricity_intensity.eval(values))?;
    let electricity_kwh_per_year = intensity * volume;

    let mut chemical_kg_per_year = BTreeMap::new();
    let mut chemicals_per_year = 0.0;
    for (chemical, dose) in &rec.chemical_doses {
        let price = params.chemical_price(&unit.name, chemical)?;
        let kg = dose * volume;
        chemicals_per_year += kg * price * params.currency_factor;
        chemical_kg_per_year.insert(chemical.clone(), kg);
    }

    Ok(UnitCost {
        unit: unit.name.clone(),
        kind: unit.kind,
        capital,
        fixed_om_per_year: params.fixed_om_fraction * capital,
        electricity_kwh_per_year,
        electricity_per_year: electricity_kwh_per_year
            * params.electricity_price_usd_per_kwh
            * params.currency_factor,
        chemical_kg_per_year,
        chemicals_per_year,
    })
}

/// Cost every unit and sum to train totals. `product_flow_m3ps` is the
/// combined flow delivered to products.
pub fn cost_train<'a>(
    units: impl IntoIterator<Item = &'a UnitProcess>,
    values: &[f64],
    product_flow_m3ps: f64,
    params: &CostingParams,
) -> CostingResult<TrainCost> {
    params.validate()?;
    let units = units
        .into_iter()
        .map(|u| cost_unit(u, values, params))
        .collect::<CostingResult<Vec<_>>>()?;

    let capital: f64 = units.iter().map(|u| u.capital).sum();
    let fixed_om_per_year: f64 = units.iter().map(|u| u.fixed_om_per_year).sum();
    let electricity_per_year: f64 = units.iter().map(|u| u.electricity_per_year).sum();
    let chemicals_per_year: f64 = units.iter().map(|u| u.chemicals_per_year).sum();
    let kwh_per_year: f64 = units.iter().map(|u| u.electricity_kwh_per_year).sum();
    let operating_per_year = fixed_om_per_year + electricity_per_year + chemicals_per_year;
    let annualized_capital = capital * params.capital_recovery_factor();

    let product_m3_per_year = annual_volume(product_flow_m3ps, params);
    let (lcow_per_m3, specific_energy_kwh_per_m3) = if product_m3_per_year > 0.0 {
        (
            Some((annualized_capital + operating_per_year) / product_m3_per_year),
            Some(kwh_per_year / product_m3_per_year),
        )
    } else {
        (None, None)
    };

    debug!(
        units = units.len(),
        capital,
        operating_per_year,
        lcow = ?lcow_per_m3,
        "costed train"
    );
    Ok(TrainCost {
        analysis_year: params.analysis_year,
        units,
        capital,
        annualized_capital,
        fixed_om_per_year,
        electricity_per_year,
        chemicals_per_year,
        operating_per_year,
        product_m3_per_year,
        lcow_per_m3,
        specific_energy_kwh_per_m3,
    })
}
