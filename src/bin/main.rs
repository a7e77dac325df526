//! rsmo command line interface
//!
//! Solves the C-SVC dual problem for a LibSVM format dataset and prints the
//! multipliers and solution summary as JSON.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use rsmo::api::{self, Solution};
use rsmo::core::{Result, SolverConfig, SolverError};
use rsmo::{Dataset, LibSVMDataset, LinearKernel, PolynomialKernel, RBFKernel};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "rsmo")]
#[command(about = "SMO solver for the SVM dual problem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the C-SVC dual for a dataset
    Solve(SolveArgs),
}

#[derive(Args)]
struct SolveArgs {
    /// Training data file in LibSVM format
    #[arg(long)]
    data: PathBuf,

    /// Kernel function
    #[arg(short, long, default_value = "rbf")]
    kernel: CliKernel,

    /// Kernel gamma (default: 1 / number of features)
    #[arg(short, long)]
    gamma: Option<f64>,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: u32,

    /// Polynomial independent term
    #[arg(long, default_value = "0.0")]
    coef0: f64,

    /// Upper bound C for both classes
    #[arg(short = 'C', long)]
    c: Option<f64>,

    /// Upper bound for the positive class (overrides -C)
    #[arg(long)]
    cp: Option<f64>,

    /// Upper bound for the negative class (overrides -C)
    #[arg(long)]
    cn: Option<f64>,

    /// Stopping tolerance
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Disable the shrinking heuristic
    #[arg(long)]
    no_shrinking: bool,

    /// Maximum number of iterations (0 = unbounded)
    #[arg(short, long)]
    max_iterations: Option<usize>,

    /// Kernel row cache size in MB
    #[arg(long)]
    cache_size: Option<usize>,

    /// Solver configuration file (JSON); flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the solution to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    /// K(x, y) = <x, y>
    Linear,
    /// K(x, y) = exp(-gamma ||x - y||^2)
    Rbf,
    /// K(x, y) = (gamma <x, y> + coef0)^degree
    Polynomial,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Solve(args) => solve_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Merge the optional config file with explicit flags
fn build_config(args: &SolveArgs) -> Result<SolverConfig> {
    let mut config = match &args.config {
        Some(path) => SolverConfig::from_json_file(path)?,
        None => SolverConfig::default(),
    };

    if let Some(c) = args.c {
        config = config.with_c(c);
    }
    if let Some(cp) = args.cp {
        config.cp = cp;
    }
    if let Some(cn) = args.cn {
        config.cn = cn;
    }
    if let Some(epsilon) = args.epsilon {
        config.epsilon = epsilon;
    }
    if args.no_shrinking {
        config.shrinking = false;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(mb) = args.cache_size {
        config.cache_size = mb.saturating_mul(1 << 20);
    }

    config.validate()?;
    Ok(config)
}

fn solve_command(args: SolveArgs) -> Result<()> {
    let config = build_config(&args)?;

    info!("Loading data from {:?}", args.data);
    let dataset = LibSVMDataset::from_file(&args.data)?;
    let (positive, negative) = dataset.class_counts();
    info!(
        "Loaded {} samples ({} positive, {} negative) with {} features",
        dataset.len(),
        positive,
        negative,
        dataset.dim()
    );

    let gamma = args
        .gamma
        .unwrap_or_else(|| RBFKernel::with_auto_gamma(dataset.dim()).gamma());
    if !(gamma > 0.0 && gamma.is_finite()) {
        return Err(SolverError::InvalidParameter(format!(
            "gamma must be positive, got {gamma}"
        )));
    }

    let solution = match args.kernel {
        CliKernel::Linear => api::solve_dataset(LinearKernel::new(), &dataset, &config)?,
        CliKernel::Rbf => api::solve_dataset(RBFKernel::new(gamma), &dataset, &config)?,
        CliKernel::Polynomial => {
            if args.degree == 0 {
                return Err(SolverError::InvalidParameter(
                    "polynomial degree must be positive".to_string(),
                ));
            }
            let kernel = PolynomialKernel::new(args.degree, gamma, args.coef0);
            api::solve_dataset(kernel, &dataset, &config)?
        }
    };

    info!(
        "obj = {:.6}, rho = {:.6}, #SV = {}, #BSV = {}",
        solution.info.obj,
        solution.info.rho,
        solution.support_vectors().len(),
        solution.n_bounded_support_vectors()
    );

    match &args.output {
        Some(path) => {
            write_solution(BufWriter::new(File::create(path)?), &solution)?;
            info!("Solution saved to {:?}", path);
        }
        None => write_solution(io::stdout().lock(), &solution)?,
    }

    Ok(())
}

fn write_solution<W: Write>(mut writer: W, solution: &Solution) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, solution)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
