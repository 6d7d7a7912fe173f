//! Pump station: sets outlet pressure, draws electricity for the lift.

use wt_core::constants::joules_per_kwh;
use wt_model::Expr;

use crate::cost::CostCurve;
use crate::error::UnitResult;
use crate::registry::UnitContext;

use super::{fix_pressure_drops, fix_recovery, fix_removal, set_cost_curve};

const CURVE: CostCurve = CostCurve::new(9_000.0, 0.7, 0.0);
const DEFAULT_EFFICIENCY: f64 = 0.8;

pub(super) fn build(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    let p_set = ctx.config.positive("outlet_pressure_pa", None)?;
    let efficiency = ctx.config.f64_in("efficiency", DEFAULT_EFFICIENCY, 1e-3, 1.0)?;

    fix_recovery(ctx, 1.0)?;
    fix_removal(ctx)?;
    fix_pressure_drops(ctx)?;

    let name = &ctx.unit.name;
    let id = ctx.model.add_equality(
        format!("{name}.outlet_pressure"),
        ctx.unit.outlet.pressure,
        p_set,
    );
    ctx.unit.specific.push(id);

    set_cost_curve(ctx, CURVE)?;
    // kWh per m³ of pumped water: ΔP [J/m³] / (η · J/kWh)
    let lift = (Expr::var(ctx.unit.outlet.pressure) - ctx.unit.inlet.pressure)
        / (efficiency * joules_per_kwh());
    ctx.unit.cost.add_electricity(lift);

    ctx.overrides.outlet_pressure = Some(p_set);
    Ok(())
}
