use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use wt_app::{
    AppError, AppResult, RunOptions, SweepSpec, TrainRun, assemble, project_service, run_sweep,
    run_train,
};
use wt_solver::SolverOptions;

#[derive(Parser)]
#[command(name = "wt-cli")]
#[command(about = "watertrain CLI - water treatment train modelling and costing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// List trains in a project
    Trains {
        /// Path to the project YAML or JSON file
        project_path: PathBuf,
    },
    /// Report degrees of freedom of an assembled train
    Dof {
        project_path: PathBuf,
        train_id: String,
    },
    /// Solve a train and report streams and costs
    Solve {
        project_path: PathBuf,
        train_id: String,
        /// Print the full run as JSON
        #[arg(long)]
        json: bool,
        /// Newton iteration budget
        #[arg(long, default_value_t = 100)]
        max_iterations: usize,
        /// Feasibility tolerance
        #[arg(long, default_value_t = 1e-6)]
        tol: f64,
    },
    /// Sweep a unit's water recovery (or another numeric option)
    Sweep {
        project_path: PathBuf,
        train_id: String,
        /// Unit node to vary
        node: String,
        /// Comma-separated values
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,
        /// Option key to vary
        #[arg(long, default_value = "water_recovery")]
        key: String,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> AppResult<()> {
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Trains { project_path } => cmd_trains(&project_path),
        Commands::Dof {
            project_path,
            train_id,
        } => cmd_dof(&project_path, &train_id),
        Commands::Solve {
            project_path,
            train_id,
            json,
            max_iterations,
            tol,
        } => {
            let options = RunOptions {
                solver: SolverOptions {
                    feasibility_tol: tol,
                    max_iterations,
                    ..SolverOptions::default()
                },
            };
            cmd_solve(&project_path, &train_id, &options, json)
        }
        Commands::Sweep {
            project_path,
            train_id,
            node,
            values,
            key,
            json,
        } => cmd_sweep(
            &project_path,
            &train_id,
            SweepSpec { node, key, values },
            json,
        ),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_trains(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let trains = project_service::list_trains(&project);

    if trains.is_empty() {
        println!("No trains found in project");
    } else {
        println!("Trains in project:");
        for t in trains {
            println!(
                "  {} - {} ({} units, {} junctions, {} edges, {} constituents)",
                t.id, t.name, t.unit_count, t.junction_count, t.edge_count, t.constituents
            );
        }
    }
    Ok(())
}

fn cmd_dof(project_path: &Path, train_id: &str) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let train = project_service::get_train(&project, train_id)?;
    let network = assemble(train)?;
    let report = network.dof_report()?;

    println!("Train {train_id}:");
    println!("  free continuous variables: {}", report.free_continuous);
    println!("  free discrete variables:   {}", report.free_discrete);
    println!("  fixed variables:           {}", report.fixed_variables);
    println!("  equality constraints:      {}", report.equality_constraints);
    if let Some(rank) = report.independent_constraints {
        println!("  independent constraints:   {rank}");
    }
    println!("  discrete-only constraints: {}", report.discrete_constraints);
    println!("  degrees of freedom:        {}", report.degrees_of_freedom());
    println!("  well posed:                {}", report.is_well_posed());
    for name in &report.violated_fixed {
        println!("  violated fixed constraint: {name}");
    }
    for name in &report.unconstrained {
        println!("  unconstrained variable:    {name}");
    }
    Ok(())
}

fn cmd_solve(project_path: &Path, train_id: &str, options: &RunOptions, json: bool) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let train = project_service::get_train(&project, train_id)?;
    let run = run_train(train, options)?;

    if json {
        return print_json(&run);
    }
    print_run(&run);
    Ok(())
}

fn print_run(run: &TrainRun) {
    println!(
        "Train {}: {:?} after {} iterations (max violation {:.3e})",
        run.train_id, run.status, run.iterations, run.max_violation
    );
    println!("Streams:");
    for s in &run.streams {
        let conc = s
            .concentrations_mg_per_l
            .iter()
            .map(|(c, v)| format!("{c}={v:.4}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "  {:>24} {:<10} Q={:.6} m3/s  T={:.2} K  P={:.0} Pa  [{}] mg/L",
            s.node, s.port, s.flow_m3_per_s, s.temperature_k, s.pressure_pa, conc
        );
    }
    for r in &run.routing {
        match r.branch {
            Some(b) => println!("Splitter {} routes to branch {b}", r.splitter),
            None => println!("Splitter {} has no active branch", r.splitter),
        }
    }
    if let Some(cost) = &run.costing {
        println!("Costs ({} USD):", cost.analysis_year);
        println!("  capital:            {:.0}", cost.capital);
        println!("  annualized capital: {:.0} /yr", cost.annualized_capital);
        println!("  operating:          {:.0} /yr", cost.operating_per_year);
        if let Some(lcow) = cost.lcow_per_m3 {
            println!("  LCOW:               {lcow:.4} /m3");
        }
        if let Some(sec) = cost.specific_energy_kwh_per_m3 {
            println!("  specific energy:    {sec:.4} kWh/m3");
        }
    }
}

fn cmd_sweep(project_path: &Path, train_id: &str, spec: SweepSpec, json: bool) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let train = project_service::get_train(&project, train_id)?;
    let points = run_sweep(train, &spec, &RunOptions::default())?;

    if json {
        return print_json(&points);
    }
    println!("{:>12} {:>16} {:>14} {:>12}", spec.key, "status", "product m3/s", "LCOW /m3");
    for p in points {
        let status = match (p.status, &p.error) {
            (Some(s), _) => format!("{s:?}"),
            (None, Some(_)) => "error".to_string(),
            (None, None) => "-".to_string(),
        };
        let fmt = |v: Option<f64>| v.map_or("-".to_string(), |v| format!("{v:.6}"));
        println!(
            "{:>12} {:>16} {:>14} {:>12}",
            p.value,
            status,
            fmt(p.product_flow_m3_per_s),
            fmt(p.lcow_per_m3)
        );
        if let Some(err) = p.error {
            println!("{:>12} {err}", "");
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InvalidInput(format!("failed to serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}
