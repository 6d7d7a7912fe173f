use std::path::PathBuf;

use wt_app::{RunOptions, TrainRun, assemble, check_dof, run_train};
use wt_project::Project;
use wt_solver::TerminationStatus;
use wt_units::PortName;

fn fixture(name: &str) -> Project {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../trains")
        .join(name);
    wt_project::load_yaml(&path).unwrap()
}

fn run(file: &str, train: &str) -> TrainRun {
    let project = fixture(file);
    let train = project.train(train).unwrap();
    let run = run_train(train, &RunOptions::default()).unwrap();
    assert_eq!(run.status, TerminationStatus::Optimal, "{train:?}");
    run
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * (1.0 + b.abs())
}

#[test]
fn single_dosing_unit_passes_water_through() {
    let run = run("scenarios.yaml", "single_dose");
    let inlet = run.stream("dose", "inlet").unwrap();
    let outlet = run.stream("dose", "outlet").unwrap();

    assert!(close(inlet.flow_m3_per_s, 4.5833, 1e-9));
    assert!(close(outlet.flow_m3_per_s, inlet.flow_m3_per_s, 1e-6));
    assert!(close(
        outlet.concentrations_mg_per_l["tds"],
        inlet.concentrations_mg_per_l["tds"],
        1e-6
    ));
    assert!(close(outlet.concentrations_mg_per_l["tds"], 35_000.0, 1e-6));
    assert!(close(run.product_flow_m3_per_s, 4.5833, 1e-6));
    assert!(run.dof.is_well_posed());

    let costing = run.costing.as_ref().unwrap();
    assert!(costing.chemicals_per_year > 0.0);
    assert!(costing.lcow_per_m3.unwrap() > 0.0);
}

#[test]
fn continuous_split_scales_branch_flows() {
    let run = run("scenarios.yaml", "continuous_split");
    let feed = 4.5833;
    let a = run.stream("split", "outlet[0]").unwrap();
    let b = run.stream("split", "outlet[1]").unwrap();
    assert!(close(a.flow_m3_per_s, 0.6 * feed, 1e-6));
    assert!(close(b.flow_m3_per_s, 0.4 * feed, 1e-6));

    for unit in ["dose_a", "dose_b"] {
        let out = run.stream(unit, "outlet").unwrap();
        assert!(close(out.concentrations_mg_per_l["tds"], 35_000.0, 1e-6));
    }
    assert!(close(run.product_flow_m3_per_s, feed, 1e-6));
}

#[test]
fn discrete_split_routes_everything_to_the_selected_branch() {
    let run = run("scenarios.yaml", "discrete_route");
    let feed = 4.5833;
    let flows: Vec<f64> = (0..3)
        .map(|i| {
            run.stream("route", &format!("outlet[{i}]"))
                .unwrap()
                .flow_m3_per_s
        })
        .collect();

    assert!(flows[0] < 1e-6, "{flows:?}");
    assert!(flows[2] < 1e-6, "{flows:?}");
    assert!(close(flows[1], feed, 1e-6), "{flows:?}");
    assert_eq!(run.routing.len(), 1);
    assert_eq!(run.routing[0].branch, Some(1));
    assert_eq!(run.dof.free_discrete, 0);
}

#[test]
fn free_routing_picks_the_cheaper_branch() {
    let run = run("desalination.yaml", "cheapest_branch");
    assert_eq!(run.dof.free_discrete, 2);
    assert_eq!(run.routing[0].branch, Some(0));

    let media = run.stream("media", "inlet").unwrap();
    let membrane = run.stream("membrane", "inlet").unwrap();
    assert!(close(media.flow_m3_per_s, 0.05, 1e-6));
    assert!(membrane.flow_m3_per_s < 1e-6);
    assert!(close(run.product_flow_m3_per_s, 0.95 * 0.05, 1e-4));
}

#[test]
fn recycle_loop_reaches_steady_state() {
    let run = run("desalination.yaml", "recycle_uf");
    let feed = 0.05;
    let blended = feed / (1.0 - 0.9 * 0.1);
    let product = run.stream("product", "inlet").unwrap();
    assert!(close(product.flow_m3_per_s, 0.9 * 0.9 * blended, 1e-5));

    // Suspended solids leave with the product or the UF waste.
    let waste = run.stream("uf", "waste").unwrap();
    let mass_in = feed * 20.0;
    let mass_out = product.flow_m3_per_s * product.concentrations_mg_per_l["tss"]
        + waste.flow_m3_per_s * waste.concentrations_mg_per_l["tss"];
    assert!(close(mass_out, mass_in, 1e-5));
}

#[test]
fn reverse_osmosis_train_solves_and_costs() {
    let run = run("desalination.yaml", "swro");

    let feed = run.stream("ro", "inlet").unwrap();
    let permeate = run.stream("ro", "outlet").unwrap();
    let brine = run.stream("ro", "waste").unwrap();

    let recovery = permeate.flow_m3_per_s / feed.flow_m3_per_s;
    assert!(recovery > 0.05 && recovery < 0.95, "recovery {recovery}");
    assert!(permeate.concentrations_mg_per_l["tds"] < 0.01 * feed.concentrations_mg_per_l["tds"]);
    assert!(brine.concentrations_mg_per_l["tds"] > feed.concentrations_mg_per_l["tds"]);
    assert!(close(brine.pressure_pa, feed.pressure_pa - 1e5, 1e-6));
    assert!(close(
        feed.flow_m3_per_s,
        permeate.flow_m3_per_s + brine.flow_m3_per_s,
        1e-6
    ));

    let costing = run.costing.as_ref().unwrap();
    let pump = costing.units.iter().find(|u| u.unit == "hp_pump").unwrap();
    assert!(pump.electricity_kwh_per_year > 0.0);
    assert!(costing.specific_energy_kwh_per_m3.unwrap() > 1.0);
    assert!(costing.lcow_per_m3.unwrap() > 0.0);
}

#[test]
fn assembling_twice_gives_identical_networks() {
    let project = fixture("desalination.yaml");
    let train = project.train("swro").unwrap();
    let a = assemble(train).unwrap();
    let b = assemble(train).unwrap();
    assert_eq!(a.model.num_variables(), b.model.num_variables());
    assert_eq!(a.model.num_constraints(), b.model.num_constraints());
    assert_eq!(a.model.values(), b.model.values());

    let ra = run_train(train, &RunOptions::default()).unwrap();
    let rb = run_train(train, &RunOptions::default()).unwrap();
    assert_eq!(ra.streams, rb.streams);
}

#[test]
fn every_arc_gets_one_equality_block() {
    let project = fixture("desalination.yaml");
    let train = project.train("swro").unwrap();
    let network = assemble(train).unwrap();
    assert_eq!(network.arcs().len(), train.edges.len());
    for arc in network.arcs() {
        assert_eq!(arc.constraints.len(), network.constituents.len() + 3);
    }
    let dof = check_dof(&network).unwrap();
    assert!(dof.is_well_posed());
    assert!(dof.independent_constraints.is_some());
    let stream = network.stream("ro", PortName::Waste).unwrap();
    assert_eq!(stream.conc_mass.len(), 2);
}
