use std::path::PathBuf;

use wt_project::schema::*;
use wt_project::{Format, ValidationError, load_json, load_yaml, save_json, save_yaml, validate_project};
use wt_units::UnitKind;

fn trains_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../trains")
}

#[test]
fn bundled_trains_load_and_validate() {
    for file in ["scenarios.yaml", "desalination.yaml"] {
        let project = load_yaml(&trains_dir().join(file)).unwrap();
        assert!(!project.trains.is_empty(), "{file}");
        validate_project(&project).unwrap();
    }
}

#[test]
fn fixture_fields_are_parsed() {
    let project = load_yaml(&trains_dir().join("desalination.yaml")).unwrap();
    let swro = project.train("swro").unwrap();
    assert_eq!(swro.constituents, vec!["tds", "tss"]);
    match &swro.node("ro").unwrap().kind {
        NodeKind::Unit { unit, config } => {
            assert_eq!(*unit, UnitKind::ReverseOsmosis);
            assert!(config.contains("membrane_area_m2"));
        }
        other => panic!("unexpected node kind {other:?}"),
    }
    assert_eq!(swro.costing.chemical_prices_usd_per_kg["ferric_chloride"], 0.35);

    let recycle = project.train("recycle_uf").unwrap();
    assert!(recycle.edges.iter().any(|e| e.recycle));
    match &recycle.node("split").unwrap().kind {
        NodeKind::Splitter { ratios, .. } => assert_eq!(ratios, &vec![Some(0.9), Some(0.1)]),
        other => panic!("unexpected node kind {other:?}"),
    }
}

#[test]
fn yaml_and_json_round_trip() {
    let project = load_yaml(&trains_dir().join("scenarios.yaml")).unwrap();
    let dir = std::env::temp_dir();

    let yaml = dir.join("wt_project_roundtrip.yaml");
    save_yaml(&yaml, &project).unwrap();
    assert_eq!(load_yaml(&yaml).unwrap(), project);

    let json = dir.join("wt_project_roundtrip.json");
    save_json(&json, &project).unwrap();
    assert_eq!(load_json(&json).unwrap(), project);
}

#[test]
fn format_follows_the_extension() {
    let project = load_yaml(&trains_dir().join("desalination.yaml")).unwrap();
    let json = std::env::temp_dir().join("wt_project_by_extension.JSON");
    assert_eq!(Format::from_path(&json), Format::Json);
    assert_eq!(Format::from_path(&trains_dir().join("x.yml")), Format::Yaml);

    wt_project::save(&json, &project).unwrap();
    let text = std::fs::read_to_string(&json).unwrap();
    assert!(text.trim_start().starts_with('{'));
    assert_eq!(wt_project::load(&json).unwrap(), project);
}

fn minimal() -> Project {
    Project {
        version: 1,
        name: "minimal".into(),
        trains: vec![TrainDef {
            id: "t".into(),
            name: "t".into(),
            constituents: vec!["tds".into()],
            nodes: vec![
                NodeDef {
                    id: "feed".into(),
                    kind: NodeKind::Source {
                        flow_m3_per_s: 1.0,
                        concentrations_mg_per_l: Default::default(),
                        temperature_k: 293.15,
                        pressure_pa: 101_325.0,
                    },
                },
                NodeDef {
                    id: "out".into(),
                    kind: NodeKind::Product,
                },
            ],
            edges: vec![EdgeDef {
                from: PortRef::new("feed", "outlet"),
                to: PortRef::new("out", "inlet"),
                recycle: false,
            }],
            costing: Default::default(),
        }],
    }
}

#[test]
fn minimal_project_is_valid() {
    validate_project(&minimal()).unwrap();
}

#[test]
fn unsupported_version() {
    let mut p = minimal();
    p.version = 7;
    assert_eq!(
        validate_project(&p),
        Err(ValidationError::UnsupportedVersion { version: 7 })
    );
}

#[test]
fn duplicate_node_ids() {
    let mut p = minimal();
    let dup = p.trains[0].nodes[1].clone();
    p.trains[0].nodes.push(dup);
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::DuplicateId { .. })
    ));
}

#[test]
fn edge_to_unknown_node() {
    let mut p = minimal();
    p.trains[0].edges[0].to = PortRef::new("nowhere", "inlet");
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::MissingReference { .. })
    ));
}

#[test]
fn edge_port_must_exist_and_point_downstream() {
    let mut p = minimal();
    p.trains[0].edges[0].to = PortRef::new("out", "outlet");
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::InvalidPort { .. })
    ));

    let mut p = minimal();
    p.trains[0].edges[0].from = PortRef::new("feed", "sideways");
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::InvalidPort { .. })
    ));
}

#[test]
fn recycle_must_enter_a_mixer() {
    let mut p = minimal();
    p.trains[0].edges[0].recycle = true;
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::InvalidPort { .. })
    ));
}

#[test]
fn costing_year_must_be_indexed() {
    let mut p = minimal();
    p.trains[0].costing.analysis_year = 1950;
    assert!(matches!(
        validate_project(&p),
        Err(ValidationError::InvalidValue { .. })
    ));
}

#[test]
fn source_defaults_fill_temperature_and_pressure() {
    let yaml = r#"
version: 1
name: defaults
trains:
  - id: t
    name: t
    constituents: [tds]
    nodes:
      - id: feed
        kind: { type: source, flow_m3_per_s: 2.0 }
"#;
    let project = wt_project::parse_yaml(yaml).unwrap();
    match &project.trains[0].nodes[0].kind {
        NodeKind::Source {
            temperature_k,
            pressure_pa,
            ..
        } => {
            assert_eq!(*temperature_k, 293.15);
            assert_eq!(*pressure_pa, 101_325.0);
        }
        other => panic!("unexpected node kind {other:?}"),
    }
}
