//! Plant cost index table used to move costs between years.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CostingError, CostingResult};

/// Year → plant cost index. Passed explicitly wherever costs are scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<i32, f64>", into = "BTreeMap<i32, f64>")]
pub struct CostIndexTable(BTreeMap<i32, f64>);

impl CostIndexTable {
    pub fn new(entries: impl IntoIterator<Item = (i32, f64)>) -> CostingResult<Self> {
        let mut map = BTreeMap::new();
        for (year, value) in entries {
            if !(value.is_finite() && value > 0.0) {
                return Err(CostingError::InvalidParameter {
                    what: "cost index",
                    value,
                });
            }
            map.insert(year, value);
        }
        Ok(Self(map))
    }

    pub fn index(&self, year: i32) -> CostingResult<f64> {
        self.0
            .get(&year)
            .copied()
            .ok_or(CostingError::MissingIndexYear { year })
    }

    /// `index[to] / index[from]`.
    pub fn factor(&self, from: i32, to: i32) -> CostingResult<f64> {
        Ok(self.index(to)? / self.index(from)?)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.keys().copied()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.0.contains_key(&year)
    }
}

impl Default for CostIndexTable {
    /// Annual chemical-engineering plant cost index, 2000 to 2022.
    fn default() -> Self {
        const SERIES: [(i32, f64); 23] = [
            (2000, 394.1),
            (2001, 394.3),
            (2002, 395.6),
            (2003, 402.0),
            (2004, 444.2),
            (2005, 468.2),
            (2006, 499.6),
            (2007, 525.4),
            (2008, 575.4),
            (2009, 521.9),
            (2010, 550.8),
            (2011, 585.7),
            (2012, 584.6),
            (2013, 567.3),
            (2014, 576.1),
            (2015, 556.8),
            (2016, 541.7),
            (2017, 567.5),
            (2018, 603.1),
            (2019, 607.5),
            (2020, 596.2),
            (2021, 708.0),
            (2022, 816.0),
        ];
        Self(SERIES.into_iter().collect())
    }
}

impl TryFrom<BTreeMap<i32, f64>> for CostIndexTable {
    type Error = CostingError;

    fn try_from(map: BTreeMap<i32, f64>) -> Result<Self, Self::Error> {
        Self::new(map)
    }
}

impl From<CostIndexTable> for BTreeMap<i32, f64> {
    fn from(table: CostIndexTable) -> Self {
        table.0
    }
}
