//! Unit kinds and the registry mapping each kind to its builder.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wt_model::Model;

use crate::balance::{EquationSet, GenericEquation, attach_generic, check_claims};
use crate::config::{ConfigView, UnitConfig};
use crate::error::{UnitError, UnitResult};
use crate::processes;
use crate::stream::{Constituents, StreamInit};
use crate::unit::{InitOverrides, UnitProcess};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Intake,
    ChemicalAddition,
    MediaFiltration,
    Ultrafiltration,
    ReverseOsmosis,
    IonExchange,
    PumpStation,
    StorageTank,
    UvDisinfection,
    SurfaceDischarge,
}

impl UnitKind {
    pub const ALL: [UnitKind; 10] = [
        UnitKind::Intake,
        UnitKind::ChemicalAddition,
        UnitKind::MediaFiltration,
        UnitKind::Ultrafiltration,
        UnitKind::ReverseOsmosis,
        UnitKind::IonExchange,
        UnitKind::PumpStation,
        UnitKind::StorageTank,
        UnitKind::UvDisinfection,
        UnitKind::SurfaceDischarge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Intake => "intake",
            UnitKind::ChemicalAddition => "chemical_addition",
            UnitKind::MediaFiltration => "media_filtration",
            UnitKind::Ultrafiltration => "ultrafiltration",
            UnitKind::ReverseOsmosis => "reverse_osmosis",
            UnitKind::IonExchange => "ion_exchange",
            UnitKind::PumpStation => "pump_station",
            UnitKind::StorageTank => "storage_tank",
            UnitKind::UvDisinfection => "uv_disinfection",
            UnitKind::SurfaceDischarge => "surface_discharge",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnitError::Unregistered { kind: s.to_string() })
    }
}

/// Everything a builder may touch while constructing one unit.
pub struct UnitContext<'a> {
    pub model: &'a mut Model,
    pub unit: &'a mut UnitProcess,
    pub constituents: &'a Constituents,
    pub config: ConfigView<'a>,
    pub inlet_init: &'a StreamInit,
    pub overrides: InitOverrides,
}

pub type BuildFn = fn(&mut UnitContext<'_>) -> UnitResult<()>;

#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub kind: UnitKind,
    /// Generic equations the builder replaces.
    pub opt_out: EquationSet,
    /// Equations the builder constrains itself.
    pub claims: EquationSet,
    /// Whether the outlet may be left unconnected.
    pub terminal_outlet: bool,
    pub build: BuildFn,
}

/// Inputs for building one unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitSpec<'a> {
    pub name: &'a str,
    pub kind: UnitKind,
    pub config: &'a UnitConfig,
    pub constituents: &'a Constituents,
    pub inlet: &'a StreamInit,
}

#[derive(Debug, Clone)]
pub struct Registry {
    entries: HashMap<UnitKind, RegistryEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registry with a builder for every `UnitKind`.
    pub fn standard() -> Self {
        let mut reg = Self::empty();
        for entry in processes::standard_entries() {
            reg.register(entry);
        }
        reg
    }

    /// Register (or replace) the entry for a kind.
    pub fn register(&mut self, entry: RegistryEntry) {
        self.entries.insert(entry.kind, entry);
    }

    pub fn entry(&self, kind: UnitKind) -> UnitResult<&RegistryEntry> {
        self.entries.get(&kind).ok_or_else(|| UnitError::Unregistered {
            kind: kind.to_string(),
        })
    }

    /// Declare the unit's streams, check claims, attach the generic equations
    /// the unit keeps, run the kind's builder and seed initial values.
    pub fn build(&self, model: &mut Model, spec: UnitSpec<'_>) -> UnitResult<UnitProcess> {
        let entry = self.entry(spec.kind)?;
        let config = spec.config.view(spec.name);
        let claims = entry.claims.union(config_claims(&config));
        check_claims(spec.name, entry.opt_out, claims)?;

        let mut unit = UnitProcess::declare(
            model,
            spec.name,
            spec.kind,
            spec.constituents,
            spec.inlet,
            entry.opt_out,
        )?;
        attach_generic(model, &mut unit, spec.constituents)?;

        let overrides = {
            let mut ctx = UnitContext {
                model: &mut *model,
                unit: &mut unit,
                constituents: spec.constituents,
                config,
                inlet_init: spec.inlet,
                overrides: InitOverrides::default(),
            };
            (entry.build)(&mut ctx)?;
            ctx.overrides
        };
        unit.initialize(model, spec.inlet, &overrides)?;

        debug!(
            unit = spec.name,
            kind = %spec.kind,
            generic = unit.equations.len(),
            specific = unit.specific.len(),
            "built unit process"
        );
        Ok(unit)
    }
}

/// Config keys that constrain a variable the generic equations also cover.
fn config_claims(config: &ConfigView<'_>) -> EquationSet {
    let mut claims = EquationSet::EMPTY;
    if config.contains("outlet_pressure_pa") {
        claims = claims.with(GenericEquation::PressureOutlet);
    }
    if config.contains("waste_pressure_pa") {
        claims = claims.with(GenericEquation::PressureWaste);
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_strings() {
        for kind in UnitKind::ALL {
            assert_eq!(kind.as_str().parse::<UnitKind>().unwrap(), kind);
        }
        assert!("desalinator".parse::<UnitKind>().is_err());
    }

    #[test]
    fn standard_registry_covers_every_kind() {
        let reg = Registry::standard();
        for kind in UnitKind::ALL {
            let entry = reg.entry(kind).unwrap();
            assert_eq!(entry.kind, kind);
        }
        assert!(reg.entry(UnitKind::SurfaceDischarge).unwrap().terminal_outlet);
        assert!(!reg.entry(UnitKind::Intake).unwrap().terminal_outlet);
    }

    #[test]
    fn empty_registry_reports_unregistered() {
        let err = Registry::empty().entry(UnitKind::Intake).unwrap_err();
        assert!(matches!(err, UnitError::Unregistered { .. }));
    }

    #[test]
    fn outlet_pressure_key_claims_pressure() {
        let cfg = UnitConfig::new().with("outlet_pressure_pa", 2.0e5);
        let claims = config_claims(&cfg.view("u"));
        assert!(claims.contains(GenericEquation::PressureOutlet));
        assert!(!claims.contains(GenericEquation::PressureWaste));
    }
}
