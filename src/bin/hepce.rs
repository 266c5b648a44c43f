//! Batch CLI harness (§6, §III.1): runs the microsimulation over a
//! directory of numbered `input<i>` subdirectories, writing a matching
//! `output<i>` subdirectory per run.

use clap::Parser;
use hepce::config::{Config, InMemoryTables, TableSource};
use hepce::engine::Engine;
use hepce::output::{population_headers, OutputSchema};
use hepce::person::Person;
use hepce::population::PopulationLoader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, info_span};

/// Runs the HEP-CE microsimulation over a batch of input directories.
#[derive(Parser, Debug)]
#[command(name = "hepce")]
struct Cli {
    /// Root directory containing one `input<i>` subdirectory per run.
    input_root: Option<PathBuf>,
    /// First run index (inclusive).
    start_run: Option<i64>,
    /// Last run index (inclusive).
    end_run: Option<i64>,

    /// tracing filter, e.g. "info" or "hepce=debug".
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run a single ad-hoc simulation from this config file, outside the
    /// input_root/start_run/end_run batch convention.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output CSV path for --config's ad-hoc run.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(cli.log_level.clone()))
        .init();

    if let Some(config_path) = cli.config {
        let output_path = cli.output.unwrap_or_else(|| PathBuf::from("output.csv"));
        let input_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return match run_simulation(&config_path, &input_dir, &output_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(error = %err, "ad-hoc run failed");
                ExitCode::FAILURE
            }
        };
    }

    let (input_root, start_run, end_run) = match (cli.input_root, cli.start_run, cli.end_run) {
        (Some(r), Some(s), Some(e)) => (r, s, e),
        _ => {
            eprintln!("usage: hepce <input_root> <start_run_index> <end_run_index>");
            return ExitCode::FAILURE;
        }
    };

    let mut any_failed = false;
    for i in start_run..=end_run {
        let _span = info_span!("run", index = i).entered();
        let input_dir = input_root.join(format!("input{i}"));
        let output_dir = input_root.join(format!("output{i}"));

        if !input_dir.is_dir() {
            error!(input_dir = %input_dir.display(), "input directory missing or unreadable, skipping run");
            any_failed = true;
            continue;
        }

        let config_path = input_dir.join("config.json");
        let output_path = output_dir.join("population.csv");
        match run_simulation(&config_path, &input_dir, &output_path) {
            Ok(()) => info!("run completed"),
            Err(err) => {
                error!(error = %err, "run failed");
                any_failed = true;
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run_simulation(config_path: &Path, input_dir: &Path, output_path: &Path) -> hepce::Result<()> {
    let config = Config::load_json(config_path)?;
    let tables: Arc<dyn TableSource> = Arc::new(InMemoryTables::load_dir(input_dir)?);
    let schema = schema_from_config(&config);

    let mut people = PopulationLoader::load(&config, input_dir, schema)?;
    let engine = Engine::new(&config, tables)?;
    engine.run(&mut people)?;

    write_population(output_path, &people, schema)
}

/// Derives which optional CSV column blocks to emit from the configured
/// event list, so a run that never enables e.g. `Pregnancy` doesn't carry
/// pregnancy columns in its output.
fn schema_from_config(config: &Config) -> OutputSchema {
    let events = config.get_csv_list("simulation.events").unwrap_or_default();
    OutputSchema {
        pregnancy: events.iter().any(|e| e == "Pregnancy"),
        hcc: events.iter().any(|e| e == "HCCProgression"),
        overdose: events.iter().any(|e| e == "Overdose"),
        hiv: events.iter().any(|e| e.starts_with("HIV")),
        moud: events.iter().any(|e| e == "MOUD"),
    }
}

fn write_population(path: &Path, people: &[Person], schema: OutputSchema) -> hepce::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(population_headers(schema))?;
    for person in people {
        writer.write_record(person.make_population_row(schema))?;
    }
    writer.flush()?;
    Ok(())
}
