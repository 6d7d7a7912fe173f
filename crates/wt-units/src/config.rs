//! Per-unit configuration options.
//!
//! Options are an explicit key/value map. Builders read them through
//! `ConfigView`, which makes the "required" vs "defaulted" decision visible at
//! every call site.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{UnitError, UnitResult};
use crate::stream::Constituents;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    Map(BTreeMap<String, f64>),
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<BTreeMap<String, f64>> for ParamValue {
    fn from(v: BTreeMap<String, f64>) -> Self {
        ParamValue::Map(v)
    }
}

/// Option map attached to one unit in the train configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitConfig(BTreeMap<String, ParamValue>);

impl UnitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn view<'a>(&'a self, unit: &'a str) -> ConfigView<'a> {
        ConfigView { unit, config: self }
    }
}

/// A unit's configuration bound to the unit's name for error reporting.
#[derive(Debug, Clone, Copy)]
pub struct ConfigView<'a> {
    unit: &'a str,
    config: &'a UnitConfig,
}

impl<'a> ConfigView<'a> {
    pub fn unit(&self) -> &'a str {
        self.unit
    }

    pub fn contains(&self, key: &str) -> bool {
        self.config.contains(key)
    }

    fn missing(&self, key: &str) -> UnitError {
        UnitError::MissingKey {
            unit: self.unit.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> UnitError {
        UnitError::InvalidValue {
            unit: self.unit.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Number under `key`, `None` when absent.
    pub fn f64(&self, key: &str) -> UnitResult<Option<f64>> {
        match self.config.get(key) {
            None => Ok(None),
            Some(ParamValue::Number(v)) if v.is_finite() => Ok(Some(*v)),
            Some(ParamValue::Number(v)) => Err(self.invalid(key, format!("non-finite {v}"))),
            Some(_) => Err(self.invalid(key, "expected a number")),
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> UnitResult<f64> {
        Ok(self.f64(key)?.unwrap_or(default))
    }

    pub fn require_f64(&self, key: &str) -> UnitResult<f64> {
        self.f64(key)?.ok_or_else(|| self.missing(key))
    }

    /// Number under `key` (or `default`) checked to lie in `[lo, hi]`.
    pub fn f64_in(&self, key: &str, default: f64, lo: f64, hi: f64) -> UnitResult<f64> {
        let v = self.f64_or(key, default)?;
        if v < lo || v > hi {
            return Err(self.invalid(key, format!("{v} outside [{lo}, {hi}]")));
        }
        Ok(v)
    }

    pub fn positive(&self, key: &str, default: Option<f64>) -> UnitResult<f64> {
        let v = match default {
            Some(d) => self.f64_or(key, d)?,
            None => self.require_f64(key)?,
        };
        if v <= 0.0 {
            return Err(self.invalid(key, format!("{v} must be positive")));
        }
        Ok(v)
    }

    pub fn str(&self, key: &str) -> UnitResult<Option<&'a str>> {
        match self.config.get(key) {
            None => Ok(None),
            Some(ParamValue::Text(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(key, "expected text")),
        }
    }

    pub fn require_str(&self, key: &str) -> UnitResult<&'a str> {
        self.str(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn i32_or(&self, key: &str, default: i32) -> UnitResult<i32> {
        match self.f64(key)? {
            None => Ok(default),
            Some(v) if v.fract() == 0.0 && v.abs() < i32::MAX as f64 => Ok(v as i32),
            Some(v) => Err(self.invalid(key, format!("{v} is not an integer"))),
        }
    }

    /// Per-constituent map under `key`; every key must be a known constituent.
    pub fn constituent_map(
        &self,
        key: &str,
        constituents: &Constituents,
    ) -> UnitResult<Option<BTreeMap<String, f64>>> {
        let map = match self.config.get(key) {
            None => return Ok(None),
            Some(ParamValue::Map(m)) => m,
            Some(_) => return Err(self.invalid(key, "expected a constituent map")),
        };
        for (name, v) in map {
            if constituents.index_of(name).is_none() {
                return Err(UnitError::UnknownConstituent {
                    unit: self.unit.to_string(),
                    key: key.to_string(),
                    constituent: name.clone(),
                });
            }
            if !v.is_finite() {
                return Err(self.invalid(key, format!("non-finite value for '{name}'")));
            }
        }
        Ok(Some(map.clone()))
    }

    pub fn require_constituent_map(
        &self,
        key: &str,
        constituents: &Constituents,
    ) -> UnitResult<BTreeMap<String, f64>> {
        self.constituent_map(key, constituents)?
            .ok_or_else(|| self.missing(key))
    }
}
