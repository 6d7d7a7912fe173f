// wt-core/src/units.rs

use uom::si::f64::{
    Energy as UomEnergy, MassDensity as UomMassDensity, Pressure as UomPressure,
    ThermodynamicTemperature as UomThermodynamicTemperature, VolumeRate as UomVolumeRate,
};

// Typed quantities at the configuration boundary (SI, f64)
pub type Energy = UomEnergy;
pub type MassConc = UomMassDensity;
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;
pub type VolumeRate = UomVolumeRate;

/// Milligrams per liter expressed in kg/m³.
pub const MG_PER_L_IN_KG_PER_M3: f64 = 1e-3;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn kg_per_m3(v: f64) -> MassConc {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    MassConc::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn mg_per_l(v: f64) -> MassConc {
    kg_per_m3(v * MG_PER_L_IN_KG_PER_M3)
}

/// Canonical stream-contract magnitudes: m³/s, kg/m³, K, Pa.
pub mod canonical {
    use super::*;

    #[inline]
    pub fn flow(q: VolumeRate) -> f64 {
        use uom::si::volume_rate::cubic_meter_per_second;
        q.get::<cubic_meter_per_second>()
    }

    #[inline]
    pub fn conc(c: MassConc) -> f64 {
        use uom::si::mass_density::kilogram_per_cubic_meter;
        c.get::<kilogram_per_cubic_meter>()
    }

    #[inline]
    pub fn temperature(t: Temperature) -> f64 {
        use uom::si::thermodynamic_temperature::kelvin;
        t.get::<kelvin>()
    }

    #[inline]
    pub fn pressure(p: Pressure) -> f64 {
        use uom::si::pressure::pascal;
        p.get::<pascal>()
    }

    /// Concentration in mg/L, the unit configurations and reports use.
    #[inline]
    pub fn conc_mg_per_l(c: MassConc) -> f64 {
        conc(c) / MG_PER_L_IN_KG_PER_M3
    }
}

pub mod constants {
    use super::*;

    pub const P_ATM_PA: f64 = 101_325.0;
    pub const T_AMBIENT_K: f64 = 293.15;
    pub const HOURS_PER_YEAR: f64 = 8_760.0;

    /// Seconds in a year of continuous operation.
    pub const SECONDS_PER_YEAR: f64 = HOURS_PER_YEAR * 3_600.0;

    /// Joules in one kilowatt-hour.
    #[inline]
    pub fn joules_per_kwh() -> f64 {
        use uom::si::energy::{joule, kilowatt_hour};
        Energy::new::<kilowatt_hour>(1.0).get::<joule>()
    }

    /// Factor converting m³/s to m³/h.
    #[inline]
    pub fn m3ph_per_m3ps() -> f64 {
        use uom::si::volume_rate::cubic_meter_per_hour;
        m3ps(1.0).get::<cubic_meter_per_hour>()
    }
}
