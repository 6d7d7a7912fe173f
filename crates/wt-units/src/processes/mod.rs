//! Builders for each unit kind and the options they share.

mod chemical_addition;
mod ion_exchange;
mod pump_station;
mod reverse_osmosis;
mod simple;

use crate::balance::{EquationSet, GenericEquation};
use crate::cost::{CostCurve, CostRecord};
use crate::error::UnitResult;
use crate::registry::{BuildFn, RegistryEntry, UnitContext, UnitKind};

pub use reverse_osmosis::{BrinePressure, Membrane, estimate_recovery};

/// One entry per `UnitKind`.
pub(crate) fn standard_entries() -> Vec<RegistryEntry> {
    use GenericEquation::{PressureOutlet, PressureWaste, Removal};

    let plain = |kind: UnitKind, build: BuildFn| RegistryEntry {
        kind,
        opt_out: EquationSet::EMPTY,
        claims: EquationSet::EMPTY,
        terminal_outlet: false,
        build,
    };
    const RO: EquationSet = EquationSet::of(&[PressureOutlet, PressureWaste]);
    const IX: EquationSet = EquationSet::of(&[Removal]);
    const PUMP: EquationSet = EquationSet::of(&[PressureOutlet]);

    vec![
        plain(UnitKind::Intake, simple::build_intake),
        plain(UnitKind::ChemicalAddition, chemical_addition::build),
        plain(UnitKind::MediaFiltration, simple::build_media_filtration),
        plain(UnitKind::Ultrafiltration, simple::build_ultrafiltration),
        RegistryEntry {
            kind: UnitKind::ReverseOsmosis,
            opt_out: RO,
            claims: RO,
            terminal_outlet: false,
            build: reverse_osmosis::build,
        },
        RegistryEntry {
            kind: UnitKind::IonExchange,
            opt_out: IX,
            claims: IX,
            terminal_outlet: false,
            build: ion_exchange::build,
        },
        RegistryEntry {
            kind: UnitKind::PumpStation,
            opt_out: PUMP,
            claims: PUMP,
            terminal_outlet: false,
            build: pump_station::build,
        },
        plain(UnitKind::StorageTank, simple::build_storage_tank),
        plain(UnitKind::UvDisinfection, simple::build_uv_disinfection),
        RegistryEntry {
            terminal_outlet: true,
            ..plain(UnitKind::SurfaceDischarge, simple::build_surface_discharge)
        },
    ]
}

/// Fix the recovery parameter from `water_recovery` (or `default`).
pub(crate) fn fix_recovery(ctx: &mut UnitContext<'_>, default: f64) -> UnitResult<()> {
    let Some(r) = ctx.unit.water_recovery else {
        return reject_key(ctx, "water_recovery", "recovery equation is replaced by this unit");
    };
    let value = ctx.config.f64_in("water_recovery", default, 0.0, 1.0)?;
    if value <= 0.0 {
        return Err(ctx.config.invalid("water_recovery", "must be positive"));
    }
    ctx.model.fix(r, value)?;
    Ok(())
}

/// Fix removal fractions from `removal_fractions`; unlisted constituents get 0.
pub(crate) fn fix_removal(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    let Some(rf) = ctx.unit.removal_fraction.clone() else {
        return reject_key(ctx, "removal_fractions", "removal equation is replaced by this unit");
    };
    let map = ctx
        .config
        .constituent_map("removal_fractions", ctx.constituents)?
        .unwrap_or_default();
    for (c, name) in ctx.constituents.iter().enumerate() {
        let value = map.get(name).copied().unwrap_or(0.0);
        if !(0.0..=1.0).contains(&value) {
            return Err(ctx
                .config
                .invalid("removal_fractions", format!("{name}: {value} outside [0, 1]")));
        }
        ctx.model.fix(rf[c], value)?;
    }
    Ok(())
}

/// Pin pressure deltas from `pressure_drop_pa` / `waste_pressure_drop_pa`.
pub(crate) fn fix_pressure_drops(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    match ctx.unit.dp_outlet {
        Some(dp) => {
            let drop = ctx.config.f64_or("pressure_drop_pa", 0.0)?;
            ctx.model.fix(dp, -drop)?;
        }
        None => reject_key(ctx, "pressure_drop_pa", "outlet pressure is set by this unit")?,
    }
    match ctx.unit.dp_waste {
        Some(dp) => {
            let drop = ctx.config.f64_or("waste_pressure_drop_pa", 0.0)?;
            ctx.model.fix(dp, -drop)?;
        }
        None => reject_key(ctx, "waste_pressure_drop_pa", "waste pressure is set by this unit")?,
    }
    Ok(())
}

/// Recovery, removal and pressure options for units that keep every
/// generic equation.
pub(crate) fn apply_common(ctx: &mut UnitContext<'_>, default_recovery: f64) -> UnitResult<()> {
    fix_recovery(ctx, default_recovery)?;
    fix_removal(ctx)?;
    fix_pressure_drops(ctx)
}

/// Install a power-law cost record on the unit's inlet flow.
pub(crate) fn set_cost_curve(ctx: &mut UnitContext<'_>, defaults: CostCurve) -> UnitResult<()> {
    let curve = defaults.with_overrides(&ctx.config)?;
    ctx.unit.cost = CostRecord::from_curve(&curve, ctx.unit.inlet.flow_vol);
    Ok(())
}

fn reject_key(ctx: &UnitContext<'_>, key: &str, reason: &str) -> UnitResult<()> {
    if ctx.config.contains(key) {
        return Err(ctx.config.invalid(key, reason));
    }
    Ok(())
}
