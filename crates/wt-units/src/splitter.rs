//! Splitter junction: one inlet divided over N branches.
//!
//! Continuous routing fixes (or leaves one of) the split fractions; discrete
//! routing sends the whole flow down exactly one branch chosen by a binary
//! decision vector, leaving a negligible trickle in the others.

use tracing::debug;
use wt_core::{ConId, NEGLIGIBLE_FRACTION, SPLIT_SUM_BAND, VarId};
use wt_model::{Domain, Expr, Model, VarSpec};

use crate::error::{UnitError, UnitResult};
use crate::stream::{Constituents, PortName, StreamInit, StreamValues, StreamVars, declare_stream};

/// Ratio value meaning "route discretely".
pub const DISCRETE_PLACEHOLDER: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SplitterMode {
    /// One entry per branch; `None` is left free and closed by the sum.
    Continuous { fractions: Vec<Option<f64>> },
    Discrete { selected: Option<usize>, branches: usize },
}

impl SplitterMode {
    /// Decide the routing mode from configured branch ratios.
    pub fn from_ratios(name: &str, ratios: &[Option<f64>], selected: Option<usize>) -> UnitResult<Self> {
        let invalid = |reason: String| UnitError::InvalidValue {
            unit: name.to_string(),
            key: "ratios".into(),
            reason,
        };
        let n = ratios.len();
        if n < 2 {
            return Err(invalid(format!("a splitter needs at least 2 branches, got {n}")));
        }

        let discrete = ratios.iter().all(|r| *r == Some(DISCRETE_PLACEHOLDER));
        if discrete {
            if let Some(s) = selected
                && s >= n
            {
                return Err(UnitError::InvalidValue {
                    unit: name.to_string(),
                    key: "selected".into(),
                    reason: format!("branch {s} out of range for {n} branches"),
                });
            }
            return Ok(SplitterMode::Discrete {
                selected,
                branches: n,
            });
        }

        if selected.is_some() {
            return Err(UnitError::InvalidValue {
                unit: name.to_string(),
                key: "selected".into(),
                reason: "only discrete splitters select a branch".into(),
            });
        }
        if ratios.iter().filter(|r| r.is_none()).count() > 1 {
            return Err(invalid("at most one ratio may be omitted".into()));
        }
        let mut total = 0.0;
        for r in ratios.iter().flatten() {
            if !(0.0..=1.0).contains(r) {
                return Err(invalid(format!("ratio {r} outside [0, 1]")));
            }
            total += r;
        }
        let has_free = ratios.iter().any(Option::is_none);
        if total > 1.0 + SPLIT_SUM_BAND || (!has_free && total < 1.0 - SPLIT_SUM_BAND) {
            return Err(invalid(format!("ratios sum to {total}")));
        }
        Ok(SplitterMode::Continuous {
            fractions: ratios.to_vec(),
        })
    }

    pub fn branches(&self) -> usize {
        match self {
            SplitterMode::Continuous { fractions } => fractions.len(),
            SplitterMode::Discrete { branches, .. } => *branches,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Routing {
    Continuous,
    Discrete { decision: Vec<VarId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    pub name: String,
    pub inlet: StreamVars,
    pub branches: Vec<StreamVars>,
    pub split_fraction: Vec<VarId>,
    pub routing: Routing,
    pub constraints: Vec<ConId>,
}

impl Splitter {
    pub fn build(
        model: &mut Model,
        name: &str,
        constituents: &Constituents,
        mode: &SplitterMode,
        inlet_init: &StreamInit,
    ) -> UnitResult<Self> {
        let n = mode.branches();
        let inlet = declare_stream(model, name, PortName::Inlet, constituents, inlet_init)?;
        let f_in = inlet_init.flow_vol;

        // Initial branch shares.
        let shares: Vec<f64> = match mode {
            SplitterMode::Continuous { fractions } => {
                let given: f64 = fractions.iter().flatten().sum();
                fractions
                    .iter()
                    .map(|f| f.unwrap_or((1.0 - given).max(0.0)))
                    .collect()
            }
            SplitterMode::Discrete { selected, .. } => {
                let active = selected.unwrap_or(0);
                (0..n)
                    .map(|i| if i == active { 1.0 } else { NEGLIGIBLE_FRACTION })
                    .collect()
            }
        };

        let mut branches = Vec::with_capacity(n);
        let mut split_fraction = Vec::with_capacity(n);
        for (i, share) in shares.iter().enumerate() {
            let init = StreamValues {
                flow_vol: f_in * share,
                ..inlet_init.clone()
            };
            branches.push(declare_stream(
                model,
                name,
                PortName::IndexedOutlet(i),
                constituents,
                &init,
            )?);
            let sf = model.add_var(
                format!("{name}.split_fraction[{i}]"),
                VarSpec::new(*share).domain(Domain::UnitInterval),
            )?;
            split_fraction.push(sf);
        }

        let mut constraints = Vec::new();
        let routing = match mode {
            SplitterMode::Continuous { fractions } => {
                for (sf, fraction) in split_fraction.iter().zip(fractions) {
                    if let Some(v) = fraction {
                        model.fix(*sf, *v)?;
                    }
                }
                for (i, (branch, sf)) in branches.iter().zip(&split_fraction).enumerate() {
                    constraints.push(model.add_equality(
                        format!("{name}.branch_flow[{i}]"),
                        branch.flow_vol,
                        Expr::var(*sf) * inlet.flow_vol,
                    ));
                }
                constraints.push(model.add_range(
                    format!("{name}.split_sum"),
                    Expr::sum(split_fraction.iter().copied()),
                    1.0 - SPLIT_SUM_BAND,
                    1.0 + SPLIT_SUM_BAND,
                )?);
                Routing::Continuous
            }
            SplitterMode::Discrete { selected, .. } => {
                for sf in &split_fraction {
                    model.fix(*sf, DISCRETE_PLACEHOLDER)?;
                }
                let mut decision = Vec::with_capacity(n);
                for i in 0..n {
                    let init = if i == selected.unwrap_or(0) { 1.0 } else { 0.0 };
                    let d = model.add_var(
                        format!("{name}.decision[{i}]"),
                        VarSpec::new(init).domain(Domain::Binary),
                    )?;
                    if selected.is_some() {
                        model.fix(d, init)?;
                    }
                    decision.push(d);
                }
                for (i, branch) in branches.iter().enumerate() {
                    let d = decision[i];
                    let share = Expr::var(split_fraction[i]) * d
                        + (Expr::constant(1.0) - d) * NEGLIGIBLE_FRACTION;
                    constraints.push(model.add_equality(
                        format!("{name}.branch_flow[{i}]"),
                        branch.flow_vol,
                        share * inlet.flow_vol,
                    ));
                }
                constraints.push(model.add_equality(
                    format!("{name}.one_hot"),
                    Expr::sum(decision.iter().copied()),
                    1.0,
                ));
                Routing::Discrete { decision }
            }
        };

        // Composition, temperature and pressure are copied to every branch.
        for (i, branch) in branches.iter().enumerate() {
            for (c, cname) in constituents.iter().enumerate() {
                constraints.push(model.add_equality(
                    format!("{name}.branch_conc[{i}][{cname}]"),
                    branch.conc_mass[c],
                    inlet.conc_mass[c],
                ));
            }
            constraints.push(model.add_equality(
                format!("{name}.branch_temperature[{i}]"),
                branch.temperature,
                inlet.temperature,
            ));
            constraints.push(model.add_equality(
                format!("{name}.branch_pressure[{i}]"),
                branch.pressure,
                inlet.pressure,
            ));
        }

        debug!(
            splitter = name,
            branches = n,
            discrete = matches!(routing, Routing::Discrete { .. }),
            "built splitter"
        );
        Ok(Self {
            name: name.to_string(),
            inlet,
            branches,
            split_fraction,
            routing,
            constraints,
        })
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.routing, Routing::Discrete { .. })
    }

    /// Index of the active branch of a discrete splitter at `values`.
    pub fn selected_branch(&self, values: &[f64]) -> Option<usize> {
        match &self.routing {
            Routing::Continuous => None,
            Routing::Discrete { decision } => decision
                .iter()
                .position(|d| values.get(d.idx()).is_some_and(|v| *v > 0.5)),
        }
    }

    pub fn branch_values(&self, model: &Model) -> Vec<StreamValues> {
        let values = model.values();
        self.branches.iter().map(|b| b.read(&values)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_ratios() {
        let m = SplitterMode::from_ratios("s", &[Some(0.6), Some(0.4)], None).unwrap();
        assert!(matches!(m, SplitterMode::Continuous { .. }));
        let m = SplitterMode::from_ratios("s", &[Some(1.0); 3], Some(1)).unwrap();
        assert_eq!(
            m,
            SplitterMode::Discrete {
                selected: Some(1),
                branches: 3
            }
        );
        let m = SplitterMode::from_ratios("s", &[Some(0.3), None], None).unwrap();
        assert_eq!(m.branches(), 2);
    }

    #[test]
    fn invalid_ratios() {
        assert!(SplitterMode::from_ratios("s", &[Some(1.0)], None).is_err());
        assert!(SplitterMode::from_ratios("s", &[None, None, Some(0.2)], None).is_err());
        assert!(SplitterMode::from_ratios("s", &[Some(0.7), Some(0.7)], None).is_err());
        assert!(SplitterMode::from_ratios("s", &[Some(0.2), Some(0.2)], None).is_err());
        assert!(SplitterMode::from_ratios("s", &[Some(1.0), Some(1.0)], Some(2)).is_err());
        assert!(SplitterMode::from_ratios("s", &[Some(0.5), Some(0.5)], Some(0)).is_err());
    }

    fn feed() -> StreamValues {
        StreamValues {
            flow_vol: 2.0,
            conc_mass: vec![10.0],
            temperature: 298.15,
            pressure: 2.0e5,
        }
    }

    #[test]
    fn continuous_split_starts_consistent() {
        let mut m = Model::new();
        let cons = Constituents::new(["tds"]).unwrap();
        let mode = SplitterMode::from_ratios("s", &[Some(0.6), Some(0.4)], None).unwrap();
        let s = Splitter::build(&mut m, "s", &cons, &mode, &feed()).unwrap();
        let values = m.values();
        assert!(m.violations(&values, 1e-12).is_empty());
        assert!((values[s.branches[0].flow_vol.idx()] - 1.2).abs() < 1e-12);
        assert!(!s.is_discrete());
        assert_eq!(s.selected_branch(&values), None);
    }

    #[test]
    fn omitted_ratio_is_free() {
        let mut m = Model::new();
        let cons = Constituents::new(["tds"]).unwrap();
        let mode = SplitterMode::from_ratios("s", &[Some(0.25), None], None).unwrap();
        let s = Splitter::build(&mut m, "s", &cons, &mode, &feed()).unwrap();
        assert!(m.is_fixed(s.split_fraction[0]));
        assert!(!m.is_fixed(s.split_fraction[1]));
        assert!((m.value(s.split_fraction[1]) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn selected_discrete_split_is_one_hot() {
        let mut m = Model::new();
        let cons = Constituents::new(["tds"]).unwrap();
        let mode = SplitterMode::from_ratios("s", &[Some(1.0); 3], Some(1)).unwrap();
        let s = Splitter::build(&mut m, "s", &cons, &mode, &feed()).unwrap();
        let values = m.values();
        assert_eq!(s.selected_branch(&values), Some(1));
        assert!(m.violations(&values, 1e-12).is_empty());
        let Routing::Discrete { decision } = &s.routing else {
            panic!("expected discrete routing");
        };
        assert!(decision.iter().all(|d| m.is_fixed(*d)));
        assert!(values[s.branches[0].flow_vol.idx()] < 1e-7);
    }

    #[test]
    fn unselected_discrete_split_leaves_decisions_free() {
        let mut m = Model::new();
        let cons = Constituents::new(["tds"]).unwrap();
        let mode = SplitterMode::from_ratios("s", &[Some(1.0); 2], None).unwrap();
        Splitter::build(&mut m, "s", &cons, &mode, &feed()).unwrap();
        assert_eq!(m.free_discrete().len(), 2);
    }
}
