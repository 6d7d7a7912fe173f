//! The stream contract: every port carries flow, per-constituent
//! concentration, temperature and pressure, declared together.

use std::fmt;

use serde::Serialize;
use wt_core::constants::{P_ATM_PA, T_AMBIENT_K};
use wt_core::{ConId, FLOW_LOWER_BOUND, VarId};
use wt_model::{Domain, Expr, Model, ModelError, VarSpec};

use crate::error::{UnitError, UnitResult};

/// Lower temperature bound (K).
pub const T_MIN_K: f64 = 273.15;
/// Upper temperature bound (K).
pub const T_MAX_K: f64 = 373.15;

/// The train-wide ordered constituent set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Constituents(Vec<String>);

impl Constituents {
    pub fn new<I, S>(names: I) -> UnitResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name.trim().is_empty() || out.contains(&name) {
                return Err(UnitError::InvalidValue {
                    unit: "train".into(),
                    key: "constituents".into(),
                    reason: format!("empty or duplicate constituent '{name}'"),
                });
            }
            out.push(name);
        }
        Ok(Self(out))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|c| c == name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }
}

/// Port identity on a unit or junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PortName {
    Inlet,
    Outlet,
    Waste,
    IndexedInlet(usize),
    IndexedOutlet(usize),
}

impl PortName {
    /// Parse `inlet`, `outlet`, `waste`, `inlet[i]` or `outlet[i]`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "inlet" => Some(PortName::Inlet),
            "outlet" => Some(PortName::Outlet),
            "waste" => Some(PortName::Waste),
            other => {
                let (base, rest) = other.split_once('[')?;
                let index: usize = rest.strip_suffix(']')?.trim().parse().ok()?;
                match base.trim() {
                    "inlet" => Some(PortName::IndexedInlet(index)),
                    "outlet" => Some(PortName::IndexedOutlet(index)),
                    _ => None,
                }
            }
        }
    }

    pub fn is_inlet(self) -> bool {
        matches!(self, PortName::Inlet | PortName::IndexedInlet(_))
    }
}

impl fmt::Display for PortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortName::Inlet => write!(f, "inlet"),
            PortName::Outlet => write!(f, "outlet"),
            PortName::Waste => write!(f, "waste"),
            PortName::IndexedInlet(i) => write!(f, "inlet[{i}]"),
            PortName::IndexedOutlet(i) => write!(f, "outlet[{i}]"),
        }
    }
}

/// Values of one stream, in canonical units (m³/s, kg/m³, K, Pa).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamValues {
    pub flow_vol: f64,
    pub conc_mass: Vec<f64>,
    pub temperature: f64,
    pub pressure: f64,
}

/// Initial values used when a stream is declared.
pub type StreamInit = StreamValues;

impl StreamValues {
    /// Unit flow of clean water at ambient conditions.
    pub fn ambient(constituents: usize) -> Self {
        Self {
            flow_vol: 1.0,
            conc_mass: vec![0.0; constituents],
            temperature: T_AMBIENT_K,
            pressure: P_ATM_PA,
        }
    }

    pub fn with_flow(&self, flow_vol: f64) -> Self {
        Self {
            flow_vol,
            ..self.clone()
        }
    }

    pub fn total_conc(&self) -> f64 {
        self.conc_mass.iter().sum()
    }

    pub fn mass_flow(&self, c: usize) -> f64 {
        self.flow_vol * self.conc_mass.get(c).copied().unwrap_or(0.0)
    }
}

/// Variable ids of one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamVars {
    pub port: PortName,
    pub flow_vol: VarId,
    pub conc_mass: Vec<VarId>,
    pub temperature: VarId,
    pub pressure: VarId,
}

/// Declare all four variable families of a port at once.
pub fn declare_stream(
    model: &mut Model,
    owner: &str,
    port: PortName,
    constituents: &Constituents,
    init: &StreamInit,
) -> UnitResult<StreamVars> {
    if init.conc_mass.len() != constituents.len() {
        return Err(ModelError::LengthMismatch {
            expected: constituents.len(),
            got: init.conc_mass.len(),
        }
        .into());
    }
    let prefix = format!("{owner}.{port}");

    let flow_vol = model.add_var(
        format!("{prefix}.flow_vol"),
        VarSpec::new(init.flow_vol).lower(FLOW_LOWER_BOUND),
    )?;
    let mut conc_mass = Vec::with_capacity(constituents.len());
    for (name, &c0) in constituents.iter().zip(&init.conc_mass) {
        conc_mass.push(model.add_var(format!("{prefix}.conc_mass[{name}]"), VarSpec::new(c0))?);
    }
    let temperature = model.add_var(
        format!("{prefix}.temperature"),
        VarSpec::new(init.temperature).bounds(T_MIN_K, T_MAX_K),
    )?;
    let pressure = model.add_var(
        format!("{prefix}.pressure"),
        VarSpec::new(init.pressure).domain(Domain::NonNegativeReals),
    )?;

    Ok(StreamVars {
        port,
        flow_vol,
        conc_mass,
        temperature,
        pressure,
    })
}

impl StreamVars {
    /// `flow_vol * conc_mass[c]`.
    pub fn mass_flow(&self, c: usize) -> Expr {
        Expr::var(self.flow_vol) * self.conc_mass[c]
    }

    pub fn total_conc(&self) -> Expr {
        Expr::sum(self.conc_mass.iter().copied())
    }

    pub fn vars(&self) -> Vec<VarId> {
        let mut out = Vec::with_capacity(self.conc_mass.len() + 3);
        out.push(self.flow_vol);
        out.extend(self.conc_mass.iter().copied());
        out.push(self.temperature);
        out.push(self.pressure);
        out
    }

    pub fn read(&self, values: &[f64]) -> StreamValues {
        let get = |id: VarId| values.get(id.idx()).copied().unwrap_or(f64::NAN);
        StreamValues {
            flow_vol: get(self.flow_vol),
            conc_mass: self.conc_mass.iter().map(|&c| get(c)).collect(),
            temperature: get(self.temperature),
            pressure: get(self.pressure),
        }
    }

    /// Fix every variable of the stream (used for feed streams).
    pub fn fix(&self, model: &mut Model, values: &StreamValues) -> UnitResult<()> {
        for (id, v) in self.vars().into_iter().zip(flatten(values)) {
            model.fix(id, v)?;
        }
        Ok(())
    }

    /// Set initial values of the free variables of the stream.
    pub fn set_init(&self, model: &mut Model, values: &StreamValues) -> UnitResult<()> {
        for (id, v) in self.vars().into_iter().zip(flatten(values)) {
            model.set_value(id, v)?;
        }
        Ok(())
    }
}

fn flatten(values: &StreamValues) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.conc_mass.len() + 3);
    out.push(values.flow_vol);
    out.extend(values.conc_mass.iter().copied());
    out.push(values.temperature);
    out.push(values.pressure);
    out
}

/// Equate two streams component-wise. Returns the constraint ids.
pub fn equate_streams(
    model: &mut Model,
    name: &str,
    from: &StreamVars,
    to: &StreamVars,
    constituents: &Constituents,
) -> Vec<ConId> {
    let mut ids = Vec::with_capacity(from.conc_mass.len() + 3);
    ids.push(model.add_equality(format!("{name}.flow_vol"), from.flow_vol, to.flow_vol));
    for (c, (&a, &b)) in from.conc_mass.iter().zip(&to.conc_mass).enumerate() {
        let cname = constituents.name(c).unwrap_or("?");
        ids.push(model.add_equality(format!("{name}.conc_mass[{cname}]"), a, b));
    }
    ids.push(model.add_equality(
        format!("{name}.temperature"),
        from.temperature,
        to.temperature,
    ));
    ids.push(model.add_equality(format!("{name}.pressure"), from.pressure, to.pressure));
    ids
}
