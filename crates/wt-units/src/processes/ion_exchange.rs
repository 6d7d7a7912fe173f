//! Ion exchange: targeted constituents leave at a fixed effluent
//! concentration, the rest pass through.

use wt_core::{canonical, mg_per_l};

use crate::cost::CostCurve;
use crate::error::UnitResult;
use crate::registry::UnitContext;

use super::{fix_pressure_drops, fix_recovery, fix_removal, set_cost_curve};

const CURVE: CostCurve = CostCurve::new(18_000.0, 0.7, 0.05);
const DEFAULT_RECOVERY: f64 = 0.98;
const DEFAULT_REGENERANT_DOSE: f64 = 0.1;
const DEFAULT_REGENERANT: &str = "sodium_chloride";

pub(super) fn build(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    let targets = ctx
        .config
        .require_constituent_map("effluent_mg_per_l", ctx.constituents)?;
    if let Some((name, v)) = targets.iter().find(|(_, v)| **v < 0.0) {
        return Err(ctx
            .config
            .invalid("effluent_mg_per_l", format!("{name}: {v} is negative")));
    }

    fix_recovery(ctx, DEFAULT_RECOVERY)?;
    fix_removal(ctx)?;
    fix_pressure_drops(ctx)?;

    let name = ctx.unit.name.clone();
    for (c, cname) in ctx.constituents.iter().enumerate() {
        let out = ctx.unit.outlet.conc_mass[c];
        let id = match targets.get(cname) {
            Some(&mg_l) => {
                let target = canonical::conc(mg_per_l(mg_l));
                ctx.overrides.outlet_conc.insert(c, target);
                ctx.model
                    .add_equality(format!("{name}.effluent[{cname}]"), out, target)
            }
            None => ctx.model.add_equality(
                format!("{name}.pass_through[{cname}]"),
                out,
                ctx.unit.inlet.conc_mass[c],
            ),
        };
        ctx.unit.specific.push(id);
    }

    let regenerant = ctx
        .config
        .str("regenerant_chemical")?
        .unwrap_or(DEFAULT_REGENERANT)
        .to_string();
    let dose = ctx
        .config
        .f64_or("regenerant_dose_kg_per_m3", DEFAULT_REGENERANT_DOSE)?;
    if dose < 0.0 {
        return Err(ctx
            .config
            .invalid("regenerant_dose_kg_per_m3", "must be nonnegative"));
    }
    set_cost_curve(ctx, CURVE)?;
    ctx.unit.cost.add_chemical(regenerant, dose);
    Ok(())
}
