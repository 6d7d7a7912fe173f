//! Mixer junction: N inlets combined into one outlet.
//!
//! Outlet temperature and pressure are the unweighted mean of the inlets, a
//! known simplification kept for compatibility with existing train results.

use tracing::debug;
use wt_core::{ConId, FLOW_LOWER_BOUND};
use wt_model::{Expr, Model};

use crate::error::{UnitError, UnitResult};
use crate::stream::{Constituents, PortName, StreamInit, StreamValues, StreamVars, declare_stream};

#[derive(Debug, Clone, PartialEq)]
pub struct Mixer {
    pub name: String,
    pub inlets: Vec<StreamVars>,
    pub outlet: StreamVars,
    pub constraints: Vec<ConId>,
}

impl Mixer {
    /// Build a mixer; `inlet_inits` holds one initial estimate per inlet.
    pub fn build(
        model: &mut Model,
        name: &str,
        constituents: &Constituents,
        inlet_inits: &[StreamInit],
    ) -> UnitResult<Self> {
        let n = inlet_inits.len();
        if n < 2 {
            return Err(UnitError::InvalidValue {
                unit: name.to_string(),
                key: "inlets".into(),
                reason: format!("a mixer needs at least 2 inlets, got {n}"),
            });
        }

        let mut inlets = Vec::with_capacity(n);
        for (i, init) in inlet_inits.iter().enumerate() {
            inlets.push(declare_stream(
                model,
                name,
                PortName::IndexedInlet(i),
                constituents,
                init,
            )?);
        }
        let outlet_init = mix(inlet_inits);
        let outlet = declare_stream(model, name, PortName::Outlet, constituents, &outlet_init)?;

        let mut constraints = Vec::new();
        constraints.push(model.add_equality(
            format!("{name}.flow"),
            outlet.flow_vol,
            Expr::sum(inlets.iter().map(|s| s.flow_vol)),
        ));
        for (c, cname) in constituents.iter().enumerate() {
            constraints.push(model.add_equality(
                format!("{name}.mass[{cname}]"),
                outlet.mass_flow(c),
                Expr::sum(inlets.iter().map(|s| s.mass_flow(c))),
            ));
        }
        let inv_n = 1.0 / n as f64;
        constraints.push(model.add_equality(
            format!("{name}.temperature"),
            outlet.temperature,
            Expr::sum(inlets.iter().map(|s| s.temperature)) * inv_n,
        ));
        constraints.push(model.add_equality(
            format!("{name}.pressure"),
            outlet.pressure,
            Expr::sum(inlets.iter().map(|s| s.pressure)) * inv_n,
        ));

        debug!(mixer = name, inlets = n, "built mixer");
        Ok(Self {
            name: name.to_string(),
            inlets,
            outlet,
            constraints,
        })
    }

    pub fn outlet_values(&self, model: &Model) -> StreamValues {
        self.outlet.read(&model.values())
    }
}

/// Outlet values satisfying the mixer equations for the given inlets.
pub fn mix(inlets: &[StreamValues]) -> StreamValues {
    let n = inlets.len().max(1) as f64;
    let flow: f64 = inlets.iter().map(|s| s.flow_vol).sum();
    let constituents = inlets.first().map_or(0, |s| s.conc_mass.len());
    let conc_mass = (0..constituents)
        .map(|c| {
            let mass: f64 = inlets.iter().map(|s| s.mass_flow(c)).sum();
            mass / flow.max(FLOW_LOWER_BOUND)
        })
        .collect();
    StreamValues {
        flow_vol: flow.max(FLOW_LOWER_BOUND),
        conc_mass,
        temperature: inlets.iter().map(|s| s.temperature).sum::<f64>() / n,
        pressure: inlets.iter().map(|s| s.pressure).sum::<f64>() / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(flow: f64, conc: f64, t: f64, p: f64) -> StreamValues {
        StreamValues {
            flow_vol: flow,
            conc_mass: vec![conc],
            temperature: t,
            pressure: p,
        }
    }

    #[test]
    fn mix_conserves_mass_and_averages_state() {
        let out = mix(&[stream(1.0, 10.0, 290.0, 1.0e5), stream(3.0, 2.0, 300.0, 3.0e5)]);
        assert!((out.flow_vol - 4.0).abs() < 1e-12);
        assert!((out.conc_mass[0] - 4.0).abs() < 1e-12);
        // unweighted mean, not flow-weighted
        assert!((out.temperature - 295.0).abs() < 1e-12);
        assert!((out.pressure - 2.0e5).abs() < 1e-9);
    }

    #[test]
    fn mixer_starts_at_a_solution() {
        let mut m = Model::new();
        let cons = Constituents::new(["tds"]).unwrap();
        let inits = [stream(1.0, 10.0, 290.0, 1.0e5), stream(3.0, 2.0, 300.0, 3.0e5)];
        let mixer = Mixer::build(&mut m, "mix", &cons, &inits).unwrap();
        assert_eq!(mixer.inlets.len(), 2);
        assert_eq!(mixer.constraints.len(), 4);
        assert!(m.max_violation(&m.values()) < 1e-9);
    }

    #[test]
    fn single_inlet_is_rejected() {
        let mut m = Model::new();
        let cons = Constituents::new(["tds"]).unwrap();
        let err = Mixer::build(&mut m, "mix", &cons, &[stream(1.0, 0.0, 290.0, 1e5)]).unwrap_err();
        assert!(matches!(err, UnitError::InvalidValue { .. }));
    }
}
