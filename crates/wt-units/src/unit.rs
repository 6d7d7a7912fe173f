//! A unit process: inlet, outlet and waste streams plus the parameter
//! variables and equations attached to them.

use std::collections::BTreeMap;

use wt_core::{ConId, FLOW_LOWER_BOUND, VarId};
use wt_model::Model;

use crate::balance::{EquationSet, GenericEquation};
use crate::cost::{CostCurve, CostRecord};
use crate::error::UnitResult;
use crate::registry::UnitKind;
use crate::stream::{Constituents, PortName, StreamInit, StreamValues, StreamVars, declare_stream};

#[derive(Debug, Clone, PartialEq)]
pub struct UnitProcess {
    pub name: String,
    pub kind: UnitKind,
    pub inlet: StreamVars,
    pub outlet: StreamVars,
    pub waste: StreamVars,
    pub water_recovery: Option<VarId>,
    pub removal_fraction: Option<Vec<VarId>>,
    pub dp_outlet: Option<VarId>,
    pub dp_waste: Option<VarId>,
    /// Generic equations this unit replaces with its own.
    pub opted_out: EquationSet,
    /// Attached generic equations, one entry per constraint.
    pub equations: Vec<(GenericEquation, ConId)>,
    /// Unit-specific constraints added by the builder.
    pub specific: Vec<ConId>,
    pub cost: CostRecord,
}

/// Initial-value hints a builder can give where the generic estimate
/// (from recovery and removal parameters) does not apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitOverrides {
    pub recovery: Option<f64>,
    /// Outlet concentration by constituent index (kg/m³).
    pub outlet_conc: BTreeMap<usize, f64>,
    pub outlet_pressure: Option<f64>,
    pub waste_pressure: Option<f64>,
}

impl UnitProcess {
    /// Declare the three streams; no equations are attached yet.
    pub(crate) fn declare(
        model: &mut Model,
        name: &str,
        kind: UnitKind,
        constituents: &Constituents,
        inlet_init: &StreamInit,
        opted_out: EquationSet,
    ) -> UnitResult<Self> {
        let inlet = declare_stream(model, name, PortName::Inlet, constituents, inlet_init)?;
        let outlet = declare_stream(model, name, PortName::Outlet, constituents, inlet_init)?;
        let waste = declare_stream(
            model,
            name,
            PortName::Waste,
            constituents,
            &inlet_init.with_flow(FLOW_LOWER_BOUND),
        )?;
        let cost = CostRecord::from_curve(&CostCurve::ZERO, inlet.flow_vol);
        Ok(Self {
            name: name.to_string(),
            kind,
            inlet,
            outlet,
            waste,
            water_recovery: None,
            removal_fraction: None,
            dp_outlet: None,
            dp_waste: None,
            opted_out,
            equations: Vec::new(),
            specific: Vec::new(),
            cost,
        })
    }

    pub fn stream(&self, port: PortName) -> Option<&StreamVars> {
        match port {
            PortName::Inlet => Some(&self.inlet),
            PortName::Outlet => Some(&self.outlet),
            PortName::Waste => Some(&self.waste),
            _ => None,
        }
    }

    pub fn equations_of(&self, eq: GenericEquation) -> impl Iterator<Item = ConId> + '_ {
        self.equations
            .iter()
            .filter(move |(e, _)| *e == eq)
            .map(|(_, id)| *id)
    }

    pub fn has_equation(&self, eq: GenericEquation) -> bool {
        self.equations_of(eq).next().is_some()
    }

    /// Set initial values of every stream from an inlet estimate so that the
    /// balance equations hold (or nearly hold) at the starting point.
    pub fn initialize(
        &self,
        model: &mut Model,
        inlet: &StreamValues,
        overrides: &InitOverrides,
    ) -> UnitResult<()> {
        let param = |id: Option<VarId>| id.map(|v| model.value(v));
        let r = overrides
            .recovery
            .or(param(self.water_recovery))
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);

        let f_in = inlet.flow_vol;
        let f_out = (r * f_in).max(FLOW_LOWER_BOUND);
        let waste_flowing = (1.0 - r) * f_in > 1e-9;
        let f_waste = ((1.0 - r) * f_in).max(FLOW_LOWER_BOUND);

        let mut c_out = Vec::with_capacity(inlet.conc_mass.len());
        let mut c_waste = Vec::with_capacity(inlet.conc_mass.len());
        for (c, &c_in) in inlet.conc_mass.iter().enumerate() {
            let out = match overrides.outlet_conc.get(&c) {
                Some(&v) => v,
                None => match &self.removal_fraction {
                    Some(rf) if r > 0.0 => (1.0 - model.value(rf[c])) * c_in / r,
                    _ => c_in,
                },
            };
            let waste = if waste_flowing {
                ((f_in * c_in - f_out * out) / f_waste).max(0.0)
            } else {
                c_in
            };
            c_out.push(out);
            c_waste.push(waste);
        }

        let p_out = overrides
            .outlet_pressure
            .unwrap_or_else(|| inlet.pressure + param(self.dp_outlet).unwrap_or(0.0));
        let p_waste = overrides
            .waste_pressure
            .unwrap_or_else(|| inlet.pressure + param(self.dp_waste).unwrap_or(0.0));

        let outlet = StreamValues {
            flow_vol: f_out,
            conc_mass: c_out,
            temperature: inlet.temperature,
            pressure: p_out.max(0.0),
        };
        let waste = StreamValues {
            flow_vol: f_waste,
            conc_mass: c_waste,
            temperature: inlet.temperature,
            pressure: p_waste.max(0.0),
        };

        self.inlet.set_init(model, inlet)?;
        self.outlet.set_init(model, &outlet)?;
        self.waste.set_init(model, &waste)?;

        if let Some(rv) = self.water_recovery {
            model.set_value(rv, r)?;
        }
        if let Some(rf) = &self.removal_fraction {
            for (c, &id) in rf.iter().enumerate() {
                let m_in = inlet.mass_flow(c);
                if m_in > 0.0 {
                    model.set_value(id, (waste.mass_flow(c) / m_in).clamp(0.0, 1.0))?;
                }
            }
        }
        Ok(())
    }

    /// Current outlet values, used to seed downstream units.
    pub fn outlet_values(&self, model: &Model) -> StreamValues {
        self.outlet.read(&model.values())
    }

    pub fn waste_values(&self, model: &Model) -> StreamValues {
        self.waste.read(&model.values())
    }
}
