//! Levelized cost of water as a model expression, for ranking discrete
//! routing choices.

use wt_core::VarId;
use wt_model::Expr;
use wt_units::UnitProcess;

use crate::aggregate::annual_volume;
use crate::error::CostingResult;
use crate::params::CostingParams;

/// Annualized cost over annual product volume, as an expression of the
/// model variables. Products are summed from `product_flows`.
pub fn lcow_expr<'a>(
    units: impl IntoIterator<Item = &'a UnitProcess>,
    product_flows: &[VarId],
    params: &CostingParams,
) -> CostingResult<Expr> {
    params.validate()?;
    let per_m3ps = annual_volume(1.0, params);
    let capital_weight = params.capital_recovery_factor() + params.fixed_om_fraction;

    let mut terms = Vec::new();
    for unit in units {
        let rec = &unit.cost;
        let scale = params
            .cost_index
            .factor(rec.basis_year, params.analysis_year)?
            * params.currency_factor;
        terms.push(rec.capital.clone() * (scale * capital_weight));
        terms.push(
            rec.electricity_intensity.clone()
                * rec.throughput
                * (per_m3ps * params.electricity_price_usd_per_kwh * params.currency_factor),
        );
        for (chemical, dose) in &rec.chemical_doses {
            let price = params.chemical_price(&unit.name, chemical)?;
            terms.push(
                Expr::var(rec.throughput) * (dose * per_m3ps * price * params.currency_factor),
            );
        }
    }
    let product = Expr::sum(product_flows.iter().copied()) * per_m3ps;
    Ok(Expr::sum(terms) / product)
}
