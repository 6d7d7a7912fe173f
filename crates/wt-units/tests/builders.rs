use std::collections::BTreeMap;

use proptest::prelude::*;
use wt_model::{DofReport, Model};
use wt_units::balance::check_claims;
use wt_units::{
    Constituents, EquationSet, GenericEquation, Registry, RegistryEntry, StreamValues, UnitConfig,
    UnitError, UnitKind, UnitProcess, UnitSpec,
};

fn constituents() -> Constituents {
    Constituents::new(["tds", "tss"]).unwrap()
}

fn feed() -> StreamValues {
    StreamValues {
        flow_vol: 4.5833,
        conc_mass: vec![35.0, 0.03],
        temperature: 293.15,
        pressure: 101_325.0,
    }
}

fn build(kind: UnitKind, config: &UnitConfig, inlet: &StreamValues) -> (Model, UnitProcess) {
    let mut model = Model::new();
    let cons = constituents();
    let unit = Registry::standard()
        .build(
            &mut model,
            UnitSpec {
                name: "u",
                kind,
                config,
                constituents: &cons,
                inlet,
            },
        )
        .unwrap();
    unit.inlet.fix(&mut model, inlet).unwrap();
    (model, unit)
}

fn try_build(kind: UnitKind, config: &UnitConfig) -> Result<UnitProcess, UnitError> {
    let mut model = Model::new();
    let cons = constituents();
    Registry::standard().build(
        &mut model,
        UnitSpec {
            name: "u",
            kind,
            config,
            constituents: &cons,
            inlet: &feed(),
        },
    )
}

fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn config_for(kind: UnitKind) -> UnitConfig {
    match kind {
        UnitKind::ChemicalAddition => UnitConfig::new()
            .with("chemical_name", "ferric_chloride")
            .with("dose_mg_per_l", 3.0),
        UnitKind::ReverseOsmosis => UnitConfig::new().with("membrane_area_m2", 1.2e6),
        UnitKind::IonExchange => {
            UnitConfig::new().with("effluent_mg_per_l", map(&[("tss", 1.0)]))
        }
        UnitKind::PumpStation => UnitConfig::new().with("outlet_pressure_pa", 6.5e6),
        UnitKind::MediaFiltration => {
            UnitConfig::new().with("removal_fractions", map(&[("tss", 0.9)]))
        }
        _ => UnitConfig::new(),
    }
}

fn report(model: &Model) -> DofReport {
    model.dof_report(1e-8)
}

#[test]
fn every_kind_is_square_with_a_fixed_inlet() {
    for kind in UnitKind::ALL {
        let (model, _) = build(kind, &config_for(kind), &feed());
        let r = report(&model);
        assert_eq!(r.degrees_of_freedom(), 0, "{kind}: {r:?}");
        assert!(r.violated_fixed.is_empty(), "{kind}: {r:?}");
        assert!(r.unconstrained.is_empty(), "{kind}: {r:?}");
    }
}

#[test]
fn initial_point_satisfies_balances_for_fixed_parameter_units() {
    for kind in UnitKind::ALL {
        if kind == UnitKind::ReverseOsmosis {
            continue;
        }
        let (model, _) = build(kind, &config_for(kind), &feed());
        let v = model.max_violation(&model.values());
        assert!(v < 1e-8, "{kind}: violation {v}");
    }
}

#[test]
fn pressure_propagates_through_generic_units() {
    let cfg = config_for(UnitKind::ChemicalAddition).with("pressure_drop_pa", 5_000.0);
    let (model, unit) = build(UnitKind::ChemicalAddition, &cfg, &feed());
    assert!(unit.has_equation(GenericEquation::PressureOutlet));
    assert_eq!(model.value(unit.dp_outlet.unwrap()), -5_000.0);
    let p_out = model.value(unit.outlet.pressure);
    assert!((p_out - (101_325.0 - 5_000.0)).abs() < 1e-9);
}

#[test]
fn chemical_addition_records_dose() {
    let (_, unit) = build(
        UnitKind::ChemicalAddition,
        &config_for(UnitKind::ChemicalAddition),
        &feed(),
    );
    let dose = unit.cost.chemical_doses["ferric_chloride"];
    assert!((dose - 3.0e-3).abs() < 1e-15);
}

#[test]
fn opted_out_units_declare_no_parameter() {
    let (_, ro) = build(
        UnitKind::ReverseOsmosis,
        &config_for(UnitKind::ReverseOsmosis),
        &feed(),
    );
    assert!(ro.dp_outlet.is_none());
    assert!(ro.dp_waste.is_none());
    assert!(ro.water_recovery.is_some());
    assert!(!ro.has_equation(GenericEquation::PressureOutlet));

    let (_, ix) = build(UnitKind::IonExchange, &config_for(UnitKind::IonExchange), &feed());
    assert!(ix.removal_fraction.is_none());
    assert!(!ix.has_equation(GenericEquation::Removal));
    assert!(ix.has_equation(GenericEquation::MassBalance));
}

#[test]
fn reverse_osmosis_leaves_recovery_free() {
    let (model, ro) = build(
        UnitKind::ReverseOsmosis,
        &config_for(UnitKind::ReverseOsmosis),
        &StreamValues {
            pressure: 6.5e6,
            ..feed()
        },
    );
    let r = ro.water_recovery.unwrap();
    assert!(!model.is_fixed(r));
    let guess = model.value(r);
    assert!(guess > 0.01 && guess < 0.95);
}

fn brine_pressure_residual(model: &Model, feed_pressure: f64, brine_pressure: f64, ro: &UnitProcess) -> f64 {
    let mut values = model.values();
    values[ro.inlet.pressure.idx()] = feed_pressure;
    values[ro.waste.pressure.idx()] = brine_pressure;
    model
        .constraints()
        .iter()
        .find(|c| c.name == "u.brine_pressure")
        .unwrap()
        .residual(&values)
}

#[test]
fn reverse_osmosis_brine_pressure_from_config() {
    let inlet = StreamValues {
        pressure: 6.5e6,
        ..feed()
    };

    let (model, ro) = build(
        UnitKind::ReverseOsmosis,
        &config_for(UnitKind::ReverseOsmosis).with("waste_pressure_pa", 3.0e6),
        &inlet,
    );
    assert_eq!(model.value(ro.waste.pressure), 3.0e6);
    assert!(brine_pressure_residual(&model, 6.5e6, 3.0e6, &ro).abs() < 1e-9);
    assert!(brine_pressure_residual(&model, 6.0e6, 3.0e6, &ro).abs() < 1e-9);
    assert!(brine_pressure_residual(&model, 6.5e6, 6.4e6, &ro).abs() > 1.0);

    let (model, ro) = build(
        UnitKind::ReverseOsmosis,
        &config_for(UnitKind::ReverseOsmosis).with("brine_pressure_drop_pa", 2.0e5),
        &inlet,
    );
    assert_eq!(model.value(ro.waste.pressure), 6.3e6);
    assert!(brine_pressure_residual(&model, 6.0e6, 5.8e6, &ro).abs() < 1e-9);
}

#[test]
fn reverse_osmosis_rejects_both_brine_pressure_keys() {
    let cfg = config_for(UnitKind::ReverseOsmosis)
        .with("waste_pressure_pa", 3.0e6)
        .with("brine_pressure_drop_pa", 1.0e5);
    match try_build(UnitKind::ReverseOsmosis, &cfg) {
        Err(UnitError::InvalidValue { key, .. }) => assert_eq!(key, "waste_pressure_pa"),
        other => panic!("expected an invalid value, got {other:?}"),
    }
}

#[test]
fn waste_pressure_on_a_generic_unit_conflicts() {
    let cfg = UnitConfig::new().with("waste_pressure_pa", 2.0e5);
    let err = try_build(UnitKind::MediaFiltration, &cfg).unwrap_err();
    assert_eq!(
        err,
        UnitError::ConflictingEquation {
            unit: "u".into(),
            equation: GenericEquation::PressureWaste
        }
    );
}

#[test]
fn pump_sets_outlet_pressure_and_electricity() {
    let (model, pump) = build(
        UnitKind::PumpStation,
        &config_for(UnitKind::PumpStation),
        &feed(),
    );
    let values = model.values();
    assert_eq!(model.value(pump.outlet.pressure), 6.5e6);
    let kwh = pump.cost.electricity_intensity.eval(&values);
    let expected = (6.5e6 - 101_325.0) / (0.8 * 3.6e6);
    assert!((kwh - expected).abs() < 1e-9);
}

#[test]
fn missing_required_key() {
    let err = try_build(
        UnitKind::ChemicalAddition,
        &UnitConfig::new().with("dose_mg_per_l", 1.0),
    )
    .unwrap_err();
    assert_eq!(
        err,
        UnitError::MissingKey {
            unit: "u".into(),
            key: "chemical_name".into()
        }
    );
    assert!(matches!(
        try_build(UnitKind::IonExchange, &UnitConfig::new()),
        Err(UnitError::MissingKey { .. })
    ));
    assert!(matches!(
        try_build(UnitKind::PumpStation, &UnitConfig::new()),
        Err(UnitError::MissingKey { .. })
    ));
}

#[test]
fn unknown_constituent_in_removal_map() {
    let cfg = UnitConfig::new().with("removal_fractions", map(&[("arsenic", 0.5)]));
    let err = try_build(UnitKind::MediaFiltration, &cfg).unwrap_err();
    assert!(matches!(err, UnitError::UnknownConstituent { .. }));
}

#[test]
fn outlet_pressure_on_a_generic_unit_conflicts() {
    let cfg = UnitConfig::new().with("outlet_pressure_pa", 2.0e5);
    let err = try_build(UnitKind::Intake, &cfg).unwrap_err();
    assert_eq!(
        err,
        UnitError::ConflictingEquation {
            unit: "u".into(),
            equation: GenericEquation::PressureOutlet
        }
    );
}

#[test]
fn keys_for_replaced_equations_are_rejected() {
    let ro = config_for(UnitKind::ReverseOsmosis).with("water_recovery", 0.5);
    assert!(matches!(
        try_build(UnitKind::ReverseOsmosis, &ro),
        Err(UnitError::InvalidValue { .. })
    ));
    let ix = config_for(UnitKind::IonExchange).with("removal_fractions", map(&[("tds", 0.1)]));
    assert!(matches!(
        try_build(UnitKind::IonExchange, &ix),
        Err(UnitError::InvalidValue { .. })
    ));
}

#[test]
fn registering_a_protected_opt_out_fails_before_declaring() {
    let mut reg = Registry::standard();
    let base = *reg.entry(UnitKind::StorageTank).unwrap();
    reg.register(RegistryEntry {
        opt_out: EquationSet::of(&[GenericEquation::MassBalance]),
        ..base
    });
    let mut model = Model::new();
    let cons = constituents();
    let cfg = UnitConfig::new();
    let err = reg
        .build(
            &mut model,
            UnitSpec {
                name: "tank",
                kind: UnitKind::StorageTank,
                config: &cfg,
                constituents: &cons,
                inlet: &feed(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, UnitError::ProtectedEquation { .. }));
    assert_eq!(model.num_variables(), 0);
    assert!(check_claims("tank", EquationSet::EMPTY, EquationSet::EMPTY).is_ok());
}

#[test]
fn surface_discharge_defaults_to_full_recovery() {
    let (model, unit) = build(UnitKind::SurfaceDischarge, &UnitConfig::new(), &feed());
    assert_eq!(model.value(unit.water_recovery.unwrap()), 1.0);
}

proptest! {
    #[test]
    fn initialized_filter_conserves_flow_and_mass(
        flow in 0.1f64..10.0,
        tds in 0.0f64..50.0,
        recovery in 0.05f64..0.99,
        removal in 0.0f64..1.0,
    ) {
        let inlet = StreamValues {
            flow_vol: flow,
            conc_mass: vec![tds, 0.01],
            temperature: 300.0,
            pressure: 2.0e5,
        };
        let cfg = UnitConfig::new()
            .with("water_recovery", recovery)
            .with("removal_fractions", map(&[("tds", removal)]));
        let (model, unit) = build(UnitKind::Ultrafiltration, &cfg, &inlet);
        let values = model.values();
        let f_in = values[unit.inlet.flow_vol.idx()];
        let f_out = values[unit.outlet.flow_vol.idx()];
        let f_w = values[unit.waste.flow_vol.idx()];
        prop_assert!((f_in - f_out - f_w).abs() < 1e-9);
        let m_in = unit.inlet.read(&values).mass_flow(0);
        let m_out = unit.outlet.read(&values).mass_flow(0);
        let m_w = unit.waste.read(&values).mass_flow(0);
        prop_assert!((m_in - m_out - m_w).abs() < 1e-8);
        prop_assert!(model.max_violation(&values) < 1e-8);
    }
}
