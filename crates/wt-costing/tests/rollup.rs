use wt_core::constants::SECONDS_PER_YEAR;
use wt_costing::{CostingError, CostingParams, cost_train, lcow_expr};
use wt_model::Model;
use wt_units::{Constituents, Registry, StreamValues, UnitConfig, UnitKind, UnitProcess, UnitSpec};

fn feed() -> StreamValues {
    StreamValues {
        flow_vol: 0.1,
        conc_mass: vec![0.5],
        temperature: 293.15,
        pressure: 101_325.0,
    }
}

fn build(model: &mut Model, name: &str, kind: UnitKind, config: &UnitConfig) -> UnitProcess {
    let cons = Constituents::new(["tds"]).unwrap();
    let unit = Registry::standard()
        .build(
            model,
            UnitSpec {
                name,
                kind,
                config,
                constituents: &cons,
                inlet: &feed(),
            },
        )
        .unwrap();
    unit.inlet.fix(model, &feed()).unwrap();
    unit
}

fn params() -> CostingParams {
    let mut p = CostingParams::default();
    p.chemical_prices_usd_per_kg
        .insert("ferric_chloride".into(), 0.5);
    p
}

#[test]
fn chemical_addition_rolls_up() {
    let mut model = Model::new();
    let config = UnitConfig::new()
        .with("chemical_name", "ferric_chloride")
        .with("dose_mg_per_l", 10.0);
    let unit = build(&mut model, "coag", UnitKind::ChemicalAddition, &config);
    let values = model.values();
    let p = params();

    let cost = cost_train([&unit], &values, 0.1, &p).unwrap();
    let volume = 0.1 * SECONDS_PER_YEAR * p.utilization;

    let basis = 1200.0 * (0.1_f64 * 3600.0).powf(0.65);
    let factor = p.cost_index.factor(2014, p.analysis_year).unwrap();
    assert!((cost.capital - basis * factor).abs() < 1e-6 * cost.capital);

    let u = &cost.units[0];
    assert!((u.chemical_kg_per_year["ferric_chloride"] - 0.01 * volume).abs() < 1e-6);
    assert!((u.chemicals_per_year - 0.01 * volume * 0.5).abs() < 1e-6);
    assert_eq!(u.electricity_kwh_per_year, 0.0);
    assert!((u.fixed_om_per_year - p.fixed_om_fraction * u.capital).abs() < 1e-9);

    let lcow = cost.lcow_per_m3.unwrap();
    let expected = (cost.capital * p.capital_recovery_factor() + cost.operating_per_year) / volume;
    assert!((lcow - expected).abs() < 1e-12);
}

#[test]
fn electricity_uses_annual_volume() {
    let mut model = Model::new();
    let unit = build(&mut model, "intake", UnitKind::Intake, &UnitConfig::new());
    let values = model.values();
    let p = params();

    let cost = cost_train([&unit], &values, 0.1, &p).unwrap();
    let volume = 0.1 * SECONDS_PER_YEAR * p.utilization;
    let u = &cost.units[0];
    assert!((u.electricity_kwh_per_year - 0.05 * volume).abs() < 1e-6);
    assert!(
        (u.electricity_per_year - 0.05 * volume * p.electricity_price_usd_per_kwh).abs() < 1e-6
    );
    assert!((cost.specific_energy_kwh_per_m3.unwrap() - 0.05).abs() < 1e-12);
}

#[test]
fn no_product_means_no_lcow() {
    let mut model = Model::new();
    let unit = build(&mut model, "intake", UnitKind::Intake, &UnitConfig::new());
    let cost = cost_train([&unit], &model.values(), 0.0, &params()).unwrap();
    assert!(cost.lcow_per_m3.is_none());
    assert!(cost.specific_energy_kwh_per_m3.is_none());
}

#[test]
fn missing_price_is_reported_with_the_unit() {
    let mut model = Model::new();
    let config = UnitConfig::new()
        .with("chemical_name", "alum")
        .with("dose_mg_per_l", 5.0);
    let unit = build(&mut model, "coag", UnitKind::ChemicalAddition, &config);
    let err = cost_train([&unit], &model.values(), 0.1, &params()).unwrap_err();
    assert_eq!(
        err,
        CostingError::MissingChemicalPrice {
            unit: "coag".into(),
            chemical: "alum".into(),
        }
    );
}

#[test]
fn basis_year_override_changes_scaling() {
    let mut model = Model::new();
    let config = UnitConfig::new().with("basis_year", 2020.0);
    let unit = build(&mut model, "tank", UnitKind::StorageTank, &config);
    let p = params();
    let cost = cost_train([&unit], &model.values(), 0.1, &p).unwrap();
    let unscaled = 6000.0 * (0.1_f64 * 3600.0).powf(0.6);
    assert!((cost.capital - unscaled).abs() < 1e-6 * unscaled);
}

#[test]
fn lcow_expression_matches_roll_up() {
    let mut model = Model::new();
    let config = UnitConfig::new()
        .with("chemical_name", "ferric_chloride")
        .with("dose_mg_per_l", 10.0);
    let coag = build(&mut model, "coag", UnitKind::ChemicalAddition, &config);
    let values = model.values();
    let p = params();

    let product = values[coag.outlet.flow_vol.idx()];
    let rolled = cost_train([&coag], &values, product, &p).unwrap();
    let expr = lcow_expr([&coag], &[coag.outlet.flow_vol], &p).unwrap();
    let lcow = rolled.lcow_per_m3.unwrap();
    assert!((expr.eval(&values) - lcow).abs() < 1e-9 * lcow);
}

#[test]
fn params_load_from_yaml_with_defaults() {
    let yaml = r#"
analysis_year: 2018
chemical_prices_usd_per_kg:
  sodium_chloride: 0.09
"#;
    let p: CostingParams = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(p.analysis_year, 2018);
    assert_eq!(p.plant_lifetime_years, 25);
    assert_eq!(p.chemical_prices_usd_per_kg["sodium_chloride"], 0.09);
    p.validate().unwrap();
}
