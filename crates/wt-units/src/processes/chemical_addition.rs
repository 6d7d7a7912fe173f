//! Chemical dosing: no separation, one chemical dose entry for costing.

use wt_core::{canonical, mg_per_l};

use crate::cost::CostCurve;
use crate::error::UnitResult;
use crate::registry::UnitContext;

use super::{apply_common, set_cost_curve};

const CURVE: CostCurve = CostCurve::new(1_200.0, 0.65, 0.0);

pub(super) fn build(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    let chemical = ctx.config.require_str("chemical_name")?.to_string();
    let dose = ctx.config.require_f64("dose_mg_per_l")?;
    if dose < 0.0 {
        return Err(ctx.config.invalid("dose_mg_per_l", "must be nonnegative"));
    }

    apply_common(ctx, 1.0)?;
    set_cost_curve(ctx, CURVE)?;
    ctx.unit
        .cost
        .add_chemical(chemical, canonical::conc(mg_per_l(dose)));
    Ok(())
}
