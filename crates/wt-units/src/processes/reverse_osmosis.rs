//! Reverse osmosis: permeate flow follows the membrane flux law, so
//! recovery and removal are outputs rather than inputs.

use wt_core::constants::P_ATM_PA;
use wt_model::Expr;

use crate::cost::CostCurve;
use crate::error::UnitResult;
use crate::registry::UnitContext;
use crate::stream::StreamValues;

use super::{fix_pressure_drops, set_cost_curve};

const CURVE: CostCurve = CostCurve::new(30_000.0, 0.75, 0.0);
/// m/(s·Pa); about 1 L/(m²·h·bar).
const DEFAULT_PERMEABILITY: f64 = 2.78e-12;
/// Pa per kg/m³ of dissolved solids (about 0.77 bar per g/L).
const DEFAULT_OSMOTIC_COEFFICIENT: f64 = 7.7e4;
const DEFAULT_REJECTION: f64 = 0.995;
const DEFAULT_BRINE_PRESSURE_DROP: f64 = 1.0e5;
const DEFAULT_MEMBRANE_COST: f64 = 30.0;

/// Membrane parameters resolved from config.
#[derive(Debug, Clone, PartialEq)]
pub struct Membrane {
    /// Permeability times area, m³/(s·Pa).
    pub conductance: f64,
    pub osmotic_coefficient: f64,
    pub rejection: Vec<f64>,
    pub permeate_pressure: f64,
    pub brine: BrinePressure,
}

/// How the concentrate-side pressure is pinned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrinePressure {
    /// `waste.P = in.P - drop` (`brine_pressure_drop_pa`).
    Drop(f64),
    /// `waste.P = value` (`waste_pressure_pa`).
    Absolute(f64),
}

impl BrinePressure {
    fn from_config(ctx: &UnitContext<'_>) -> UnitResult<Self> {
        let drop = ctx.config.f64("brine_pressure_drop_pa")?;
        let absolute = ctx.config.f64("waste_pressure_pa")?;
        match (drop, absolute) {
            (Some(_), Some(_)) => Err(ctx.config.invalid(
                "waste_pressure_pa",
                "conflicts with brine_pressure_drop_pa; set one of them",
            )),
            (None, Some(p)) if p < 0.0 => {
                Err(ctx.config.invalid("waste_pressure_pa", "must be nonnegative"))
            }
            (None, Some(p)) => Ok(BrinePressure::Absolute(p)),
            (drop, None) => Ok(BrinePressure::Drop(
                drop.unwrap_or(DEFAULT_BRINE_PRESSURE_DROP),
            )),
        }
    }

    fn expr(self, inlet_pressure: wt_core::VarId) -> Expr {
        match self {
            BrinePressure::Drop(dp) => Expr::var(inlet_pressure) - dp,
            BrinePressure::Absolute(p) => Expr::constant(p),
        }
    }

    fn estimate(self, inlet_pressure: f64) -> f64 {
        match self {
            BrinePressure::Drop(dp) => inlet_pressure - dp,
            BrinePressure::Absolute(p) => p,
        }
    }
}

pub(super) fn build(ctx: &mut UnitContext<'_>) -> UnitResult<()> {
    for key in ["water_recovery", "removal_fractions"] {
        if ctx.config.contains(key) {
            return Err(ctx
                .config
                .invalid(key, "determined by the membrane flux and rejection"));
        }
    }
    let area = ctx.config.positive("membrane_area_m2", None)?;
    let permeability = ctx
        .config
        .positive("water_permeability_m_per_s_pa", Some(DEFAULT_PERMEABILITY))?;
    let osmotic_coefficient = ctx.config.f64_or(
        "osmotic_coefficient_pa_m3_per_kg",
        DEFAULT_OSMOTIC_COEFFICIENT,
    )?;
    let rejection_map = ctx
        .config
        .constituent_map("rejection", ctx.constituents)?
        .unwrap_or_default();
    let mut rejection = Vec::with_capacity(ctx.constituents.len());
    for name in ctx.constituents.iter() {
        let rej = rejection_map.get(name).copied().unwrap_or(DEFAULT_REJECTION);
        if !(0.0..=1.0).contains(&rej) {
            return Err(ctx
                .config
                .invalid("rejection", format!("{name}: {rej} outside [0, 1]")));
        }
        rejection.push(rej);
    }
    let membrane = Membrane {
        conductance: permeability * area,
        osmotic_coefficient,
        rejection,
        permeate_pressure: ctx.config.f64_or("outlet_pressure_pa", P_ATM_PA)?,
        brine: BrinePressure::from_config(ctx)?,
    };

    // Only the guard against stray pressure_drop keys applies here.
    fix_pressure_drops(ctx)?;

    let name = ctx.unit.name.clone();
    let (inlet, outlet, waste) = (&ctx.unit.inlet, &ctx.unit.outlet, &ctx.unit.waste);

    let feed_mean = (inlet.total_conc() + waste.total_conc()) * 0.5;
    let driving = Expr::var(inlet.pressure)
        - outlet.pressure
        - (feed_mean - outlet.total_conc()) * membrane.osmotic_coefficient;
    let mut ids = vec![ctx.model.add_equality(
        format!("{name}.flux"),
        outlet.flow_vol,
        driving * membrane.conductance,
    )];
    for (c, cname) in ctx.constituents.iter().enumerate() {
        ids.push(ctx.model.add_equality(
            format!("{name}.rejection[{cname}]"),
            outlet.conc_mass[c],
            Expr::var(inlet.conc_mass[c]) * (1.0 - membrane.rejection[c]),
        ));
    }
    ids.push(ctx.model.add_equality(
        format!("{name}.permeate_pressure"),
        outlet.pressure,
        membrane.permeate_pressure,
    ));
    ids.push(ctx.model.add_equality(
        format!("{name}.brine_pressure"),
        waste.pressure,
        membrane.brine.expr(inlet.pressure),
    ));
    ctx.unit.specific.extend(ids);

    set_cost_curve(ctx, CURVE)?;
    let membrane_cost = ctx
        .config
        .f64_or("membrane_cost_usd_per_m2", DEFAULT_MEMBRANE_COST)?;
    ctx.unit.cost.add_capital(Expr::constant(area * membrane_cost));

    let feed = ctx.inlet_init;
    ctx.overrides.recovery = Some(estimate_recovery(&membrane, feed));
    for (c, &c_in) in feed.conc_mass.iter().enumerate() {
        ctx.overrides
            .outlet_conc
            .insert(c, (1.0 - membrane.rejection[c]) * c_in);
    }
    ctx.overrides.outlet_pressure = Some(membrane.permeate_pressure);
    ctx.overrides.waste_pressure = Some(membrane.brine.estimate(feed.pressure));
    Ok(())
}

/// Recovery at which the flux law balances for a feed, used as the solver's
/// starting point. Found by bisection on `[0.01, 0.95]`; the permeate flow
/// predicted by the flux law falls monotonically as recovery rises.
pub fn estimate_recovery(membrane: &Membrane, feed: &StreamValues) -> f64 {
    const LO: f64 = 0.01;
    const HI: f64 = 0.95;
    if feed.flow_vol <= 0.0 {
        return 0.5;
    }
    let c_feed = feed.total_conc();
    let c_perm: f64 = feed
        .conc_mass
        .iter()
        .zip(&membrane.rejection)
        .map(|(c, rej)| (1.0 - rej) * c)
        .sum();
    let excess = |r: f64| {
        let c_brine = (c_feed - r * c_perm) / (1.0 - r);
        let net = feed.pressure
            - membrane.permeate_pressure
            - membrane.osmotic_coefficient * (0.5 * (c_feed + c_brine) - c_perm);
        membrane.conductance * net / feed.flow_vol - r
    };

    if excess(LO) <= 0.0 {
        return LO;
    }
    if excess(HI) >= 0.0 {
        return HI;
    }
    let (mut lo, mut hi) = (LO, HI);
    for _ in 0..60 {
        let mid = 0.5 * (lo + hi);
        if excess(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}
