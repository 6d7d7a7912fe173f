//! Units fully described by the generic equations and a cost curve.

use crate::cost::CostCurve;
use crate::error::UnitResult;
use crate::registry::UnitContext;

use super::{apply_common, set_cost_curve};

const INTAKE: CostCurve = CostCurve::new(2_800.0, 0.75, 0.05);
const MEDIA_FILTRATION: CostCurve = CostCurve::new(12_000.0, 0.7, 0.01);
const ULTRAFILTRATION: CostCurve = CostCurve::new(25_000.0, 0.7, 0.15);
const STORAGE_TANK: CostCurve = CostCurve::new(6_000.0, 0.6, 0.0);
const UV_DISINFECTION: CostCurve = CostCurve::new(4_000.0, 0.7, 0.03);
const SURFACE_DISCHARGE: CostCurve = CostCurve::new(1_500.0, 0.6, 0.0);

pub(super) fn build_intake(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    apply_common(ctx, 1.0)?;
    set_cost_curve(ctx, INTAKE)
}

pub(super) fn build_media_filtration(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    apply_common(ctx, 0.95)?;
    set_cost_curve(ctx, MEDIA_FILTRATION)
}

pub(super) fn build_ultrafiltration(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    apply_common(ctx, 0.9)?;
    set_cost_curve(ctx, ULTRAFILTRATION)
}

pub(super) fn build_storage_tank(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    apply_common(ctx, 1.0)?;
    set_cost_curve(ctx, STORAGE_TANK)
}

pub(super) fn build_uv_disinfection(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    apply_common(ctx, 1.0)?;
    set_cost_curve(ctx, UV_DISINFECTION)
}

pub(super) fn build_surface_discharge(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    apply_common(ctx, 1.0)?;
    set_cost_curve(ctx, SURFACE_DISCHARGE)
}
