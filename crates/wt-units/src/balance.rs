//! Generic balance equations shared by every unit process.
//!
//! A unit gets flow, recovery, removal, mass, temperature and pressure
//! equations unless its registry entry opts out of them. Opting out of an
//! equation means the unit builder constrains those variables itself, which it
//! declares up front as a claim.

use std::fmt;

use serde::Serialize;
use wt_model::{Domain, Expr, Model, VarSpec};

use crate::error::{UnitError, UnitResult};
use crate::stream::Constituents;
use crate::unit::UnitProcess;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GenericEquation {
    FlowBalance,
    WaterRecovery,
    Removal,
    MassBalance,
    Temperature,
    PressureOutlet,
    PressureWaste,
}

impl GenericEquation {
    pub const ALL: [GenericEquation; 7] = [
        GenericEquation::FlowBalance,
        GenericEquation::WaterRecovery,
        GenericEquation::Removal,
        GenericEquation::MassBalance,
        GenericEquation::Temperature,
        GenericEquation::PressureOutlet,
        GenericEquation::PressureWaste,
    ];

    /// Conservation laws no unit may replace.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            GenericEquation::FlowBalance | GenericEquation::MassBalance | GenericEquation::Temperature
        )
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for GenericEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GenericEquation::FlowBalance => "flow_balance",
            GenericEquation::WaterRecovery => "water_recovery",
            GenericEquation::Removal => "removal",
            GenericEquation::MassBalance => "mass_balance",
            GenericEquation::Temperature => "temperature",
            GenericEquation::PressureOutlet => "pressure_outlet",
            GenericEquation::PressureWaste => "pressure_waste",
        };
        f.write_str(s)
    }
}

/// A small set of generic equations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EquationSet(u8);

impl EquationSet {
    pub const EMPTY: EquationSet = EquationSet(0);

    pub const fn of(eqs: &[GenericEquation]) -> Self {
        let mut bits = 0u8;
        let mut i = 0;
        while i < eqs.len() {
            bits |= eqs[i].bit();
            i += 1;
        }
        EquationSet(bits)
    }

    pub fn with(self, eq: GenericEquation) -> Self {
        EquationSet(self.0 | eq.bit())
    }

    pub fn union(self, other: EquationSet) -> Self {
        EquationSet(self.0 | other.0)
    }

    pub fn contains(self, eq: GenericEquation) -> bool {
        self.0 & eq.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = GenericEquation> {
        GenericEquation::ALL
            .into_iter()
            .filter(move |eq| self.contains(*eq))
    }
}

impl FromIterator<GenericEquation> for EquationSet {
    fn from_iter<I: IntoIterator<Item = GenericEquation>>(iter: I) -> Self {
        iter.into_iter().fold(EquationSet::EMPTY, EquationSet::with)
    }
}

/// Check an opt-out list and a claim list before anything is attached.
///
/// Protected equations cannot be opted out, and every claimed equation must be
/// opted out so that it is constrained exactly once.
pub fn check_claims(unit: &str, opt_out: EquationSet, claims: EquationSet) -> UnitResult<()> {
    if let Some(equation) = opt_out.iter().find(|eq| eq.is_protected()) {
        return Err(UnitError::ProtectedEquation {
            unit: unit.to_string(),
            equation,
        });
    }
    if let Some(equation) = claims.iter().find(|eq| !opt_out.contains(*eq)) {
        return Err(UnitError::ConflictingEquation {
            unit: unit.to_string(),
            equation,
        });
    }
    Ok(())
}

/// Attach every generic equation the unit has not opted out of, declaring
/// the parameter variables those equations use.
///
/// Recovery and removal parameters are left free; pressure deltas are pinned
/// to zero. Builders fix or override them afterwards.
pub fn attach_generic(
    model: &mut Model,
    unit: &mut UnitProcess,
    constituents: &Constituents,
) -> UnitResult<()> {
    let name = unit.name.clone();
    let (inlet, outlet, waste) = (&unit.inlet, &unit.outlet, &unit.waste);
    let mut attached = Vec::new();

    for eq in GenericEquation::ALL {
        if unit.opted_out.contains(eq) {
            continue;
        }
        match eq {
            GenericEquation::FlowBalance => {
                let id = model.add_equality(
                    format!("{name}.flow_balance"),
                    inlet.flow_vol,
                    Expr::var(outlet.flow_vol) + waste.flow_vol,
                );
                attached.push((eq, id));
            }
            GenericEquation::WaterRecovery => {
                let init = model.value(outlet.flow_vol) / model.value(inlet.flow_vol).max(1e-12);
                let r = model.add_var(
                    format!("{name}.water_recovery"),
                    VarSpec::new(init.clamp(0.0, 1.0)).domain(Domain::UnitInterval),
                )?;
                let id = model.add_equality(
                    format!("{name}.water_recovery"),
                    Expr::var(r) * inlet.flow_vol,
                    outlet.flow_vol,
                );
                unit.water_recovery = Some(r);
                attached.push((eq, id));
            }
            GenericEquation::Removal => {
                let mut rf = Vec::with_capacity(constituents.len());
                for (c, cname) in constituents.iter().enumerate() {
                    let v = model.add_var(
                        format!("{name}.removal_fraction[{cname}]"),
                        VarSpec::new(0.0).domain(Domain::UnitInterval),
                    )?;
                    let id = model.add_equality(
                        format!("{name}.removal[{cname}]"),
                        Expr::var(v) * inlet.mass_flow(c),
                        waste.mass_flow(c),
                    );
                    rf.push(v);
                    attached.push((eq, id));
                }
                unit.removal_fraction = Some(rf);
            }
            GenericEquation::MassBalance => {
                for (c, cname) in constituents.iter().enumerate() {
                    let id = model.add_equality(
                        format!("{name}.mass_balance[{cname}]"),
                        inlet.mass_flow(c),
                        outlet.mass_flow(c) + waste.mass_flow(c),
                    );
                    attached.push((eq, id));
                }
            }
            GenericEquation::Temperature => {
                let a = model.add_equality(
                    format!("{name}.temperature_outlet"),
                    inlet.temperature,
                    outlet.temperature,
                );
                let b = model.add_equality(
                    format!("{name}.temperature_waste"),
                    inlet.temperature,
                    waste.temperature,
                );
                attached.push((eq, a));
                attached.push((eq, b));
            }
            GenericEquation::PressureOutlet => {
                let dp = model.add_fixed(format!("{name}.dp_outlet"), VarSpec::new(0.0), 0.0)?;
                let id = model.add_equality(
                    format!("{name}.pressure_outlet"),
                    Expr::var(inlet.pressure) + dp,
                    outlet.pressure,
                );
                unit.dp_outlet = Some(dp);
                attached.push((eq, id));
            }
            GenericEquation::PressureWaste => {
                let dp = model.add_fixed(format!("{name}.dp_waste"), VarSpec::new(0.0), 0.0)?;
                let id = model.add_equality(
                    format!("{name}.pressure_waste"),
                    Expr::var(inlet.pressure) + dp,
                    waste.pressure,
                );
                unit.dp_waste = Some(dp);
                attached.push((eq, id));
            }
        }
    }

    unit.equations.extend(attached);
    Ok(())
}
