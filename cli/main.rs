#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::process;

use cochlea::params::ModelParameters;
use cochlea::patient::PatientInput;
use cochlea::report::{
    BatchResult, format_summary, read_patients, write_batch_tsv, write_percentiles_tsv,
};
use cochlea::simulate::{DEFAULT_DRAWS, SimulationConfig, simulate_with_rng};

#[derive(Args)]
pub struct RunOptions {
    /// Number of simulated draws per patient
    #[arg(long, default_value_t = DEFAULT_DRAWS)]
    pub draws: usize,

    /// Seed for the random generator (entropy-seeded when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Model parameter file (.toml); built-in coefficients when omitted
    #[arg(long, value_name = "PATH")]
    pub params: Option<String>,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Baseline hearing threshold in dB
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: f64,

    /// Age in years at the baseline measurement
    #[arg(long)]
    pub age: u32,

    /// Genotype code: G20, G11, G10, G01 or G00
    #[arg(long)]
    pub genotype: String,

    /// Male or Female
    #[arg(long)]
    pub gender: String,

    /// Write all nine percentiles per age to this TSV file
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunOptions,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Patient TSV with sample_id, threshold, age, genotype, gender columns
    pub patients: PathBuf,

    /// Output TSV path
    #[arg(long, value_name = "PATH", default_value = "percentiles.tsv")]
    pub out: PathBuf,

    #[command(flatten)]
    pub run: RunOptions,
}

#[derive(Parser)]
#[command(
    name = "cochlea",
    version,
    about = "Simulate hearing-threshold trajectories from a baseline audiogram and SLC26A4 genotype."
)]
pub struct Cli {
    /// Log progress at info level (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Simulate one patient and print the percentile bands
    #[command(about = "Simulate one patient (prints P10/P50/P90 per age)")]
    Simulate(SimulateArgs),

    /// Simulate every patient in a TSV file
    #[command(about = "Simulate a patient table (outputs: percentiles.tsv)")]
    Batch(BatchArgs),

    /// Write the built-in model parameters for editing
    #[command(about = "Write built-in model parameters (outputs: params.toml)")]
    Params {
        #[arg(long, value_name = "PATH", default_value = "params.toml")]
        out: String,
    },

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

fn main() {
    let cli = Cli::parse();
    let Cli { verbose, command } = cli;

    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match command {
        Some(Commands::Simulate(args)) => run_simulate(args),
        Some(Commands::Batch(args)) => run_batch(args),
        Some(Commands::Params { out }) => run_params(&out),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_parameters(path: Option<&str>) -> Result<ModelParameters, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(ModelParameters::load(path)?),
        None => Ok(ModelParameters::default()),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run_simulate(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let params = load_parameters(args.run.params.as_deref())?;
    let input = PatientInput::new(
        args.threshold,
        args.age,
        args.genotype.parse()?,
        args.gender.parse()?,
    )?;
    let config = SimulationConfig {
        draws: args.run.draws,
    };
    let mut rng = make_rng(args.run.seed);

    let records = simulate_with_rng(&input, &params, config, &mut rng)?;

    println!(
        "Genotype {} ({}), {}, baseline {} dB at age {}",
        input.genotype,
        input.genotype.description(),
        input.gender,
        input.baseline_threshold,
        input.baseline_age
    );
    print!("{}", format_summary(&records));

    if let Some(out) = args.out {
        write_percentiles_tsv(&out, &records)?;
        println!("Percentiles written to {}", out.display());
    }
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let params = load_parameters(args.run.params.as_deref())?;
    let patients = read_patients(&args.patients)?;
    let config = SimulationConfig {
        draws: args.run.draws,
    };
    let mut rng = make_rng(args.run.seed);

    let mut results = Vec::with_capacity(patients.len());
    for patient in patients {
        let records = simulate_with_rng(&patient.input, &params, config, &mut rng)?;
        results.push(BatchResult {
            sample_id: patient.sample_id,
            records,
        });
    }

    write_batch_tsv(&args.out, &results)?;
    println!(
        "Simulated {} patients; percentiles written to {}",
        results.len(),
        args.out.display()
    );
    Ok(())
}

fn run_params(out: &str) -> Result<(), Box<dyn std::error::Error>> {
    ModelParameters::default().save(out)?;
    println!("Model parameters written to {out}");
    Ok(())
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const YEAR: u64 = 365 * DAY;

    if seconds < MINUTE {
        format!("{} seconds ago", seconds)
    } else if seconds < HOUR {
        format!("{:.1} minutes ago", seconds as f64 / MINUTE as f64)
    } else if seconds < DAY {
        format!("{:.1} hours ago", seconds as f64 / HOUR as f64)
    } else if seconds < YEAR {
        format!("{:.1} days ago", seconds as f64 / DAY as f64)
    } else {
        format!("{:.1} years ago", seconds as f64 / YEAR as f64)
    }
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp: u64 = env!("COCHLEA_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("cochlea {}", version);

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}
