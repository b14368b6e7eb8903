//! ONCOGRID - CLI entry point
//!
//! Headless tumor-growth simulator.

use clap::{Parser, Subcommand};
use oncogrid::checkpoint::{Checkpoint, CheckpointManager};
use oncogrid::{benchmark, Config, Engine};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oncogrid")]
#[command(version)]
#[command(about = "Stochastic agent-based tumor growth simulator on a 2D lattice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Legacy seven-value preset file; overrides the YAML config
        #[arg(short, long)]
        preset: Option<PathBuf>,

        /// Number of steps; defaults to the configured last step
        #[arg(short, long)]
        steps: Option<u64>,

        /// Output directory for checkpoints and count series
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Skip per-step lineage counting
        #[arg(long)]
        no_count: bool,

        /// Print the lattice as ASCII at every progress line
        #[arg(long)]
        print_grid: bool,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume simulation from a checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional steps
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "200")]
        steps: u64,

        /// Maximum proliferation potential
        #[arg(short, long, default_value = "10")]
        potential: u32,
    },

    /// Generate a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Summarize a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            preset,
            steps,
            output,
            seed,
            no_count,
            print_grid,
            quiet,
        } => run_simulation(config, preset, steps, output, seed, !no_count, print_grid, quiet),

        Commands::Resume {
            checkpoint,
            steps,
            output,
        } => resume_simulation(checkpoint, steps, output),

        Commands::Benchmark { steps, potential } => run_benchmark(steps, potential),

        Commands::Init { output } => generate_config(output),

        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_simulation(
    config_path: PathBuf,
    preset: Option<PathBuf>,
    steps: Option<u64>,
    output: PathBuf,
    seed: Option<u64>,
    counting: bool,
    print_grid: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = if let Some(preset_path) = preset {
        println!("Loading preset from: {:?}", preset_path);
        Config::from_preset_file(&preset_path)?
    } else if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };

    std::fs::create_dir_all(&output)?;

    let mut engine = if let Some(s) = seed {
        println!("Using seed: {}", s);
        Engine::new_with_seed(config.clone(), s)?
    } else {
        Engine::new(config.clone())?
    };

    let steps = steps.unwrap_or(config.run.last_step);

    println!("Starting simulation");
    println!("  Lattice: {0}x{0}", engine.size());
    println!("  Steps: {}", steps);
    println!();

    let mut checkpoint_mgr = CheckpointManager::new(&output, 500, 10);

    let start = Instant::now();
    let stats_interval = config.logging.stats_interval.max(1);

    for i in 0..steps {
        engine.step(counting);

        if !quiet && i % stats_interval == 0 {
            println!("{}", engine.summary());
            if print_grid {
                println!("{}", engine.snapshot().ascii());
            }
        }

        if checkpoint_mgr.should_save(engine.time()) {
            let checkpoint = engine.create_checkpoint();
            match checkpoint_mgr.save(&checkpoint) {
                Ok(path) => {
                    if !quiet {
                        println!("  Checkpoint saved: {:?}", path);
                    }
                }
                Err(e) => eprintln!("  Checkpoint error: {}", e),
            }
        }

        if engine.is_extinct() {
            println!("\nColony extinct at step {}", engine.time());
            break;
        }
    }

    let elapsed = start.elapsed();
    let steps_per_sec = engine.time() as f64 / elapsed.as_secs_f64();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {}", engine.time());
    println!("Speed: {:.1} steps/s", steps_per_sec);
    println!("Final population: {}", engine.population());
    println!("Final side: {}", engine.size());

    let final_checkpoint = engine.create_checkpoint();
    let final_path = output.join("checkpoint_final.bin");
    final_checkpoint.save(&final_path)?;
    println!("Final checkpoint: {:?}", final_path);

    if counting {
        let counters_path = output.join("counters.json");
        engine.counters().save_json(&counters_path)?;
        println!("Count series: {:?}", counters_path);
    }

    Ok(())
}

fn resume_simulation(
    checkpoint_path: PathBuf,
    steps: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading checkpoint: {:?}", checkpoint_path);

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let mut engine = Engine::from_checkpoint(checkpoint)?;

    println!("Resumed at step {}", engine.time());
    println!("Population: {}", engine.population());
    println!("Running {} additional steps", steps);
    println!();

    std::fs::create_dir_all(&output)?;

    let mut checkpoint_mgr = CheckpointManager::new(&output, 500, 10);

    let start = Instant::now();
    let target_time = engine.time() + steps;
    let stats_interval = engine.config().logging.stats_interval.max(1);

    while engine.time() < target_time {
        engine.step(true);

        if engine.time() % stats_interval == 0 {
            println!("{}", engine.summary());
        }

        if checkpoint_mgr.should_save(engine.time()) {
            let checkpoint = engine.create_checkpoint();
            if let Ok(path) = checkpoint_mgr.save(&checkpoint) {
                println!("  Checkpoint: {:?}", path);
            }
        }

        if engine.is_extinct() {
            println!("\nColony extinct at step {}", engine.time());
            break;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("=== Resume Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Final step: {}", engine.time());
    println!("Speed: {:.1} steps/s", steps as f64 / elapsed.as_secs_f64());
    println!("Population: {}", engine.population());

    Ok(())
}

fn run_benchmark(steps: u64, potential: u32) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== ONCOGRID Benchmark ===");
    println!("Steps: {}", steps);
    println!("Potential: {}", potential);
    println!();

    let result = benchmark(steps, potential);
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let stc_tag = checkpoint.config.cells.potential_max as i32 + 1;

    let population = checkpoint.cells.iter().filter(|&&v| v != 0).count();
    let stem = checkpoint.cells.iter().filter(|&&v| v >= stc_tag).count();

    println!("Step: {}", checkpoint.step);
    println!("Seed: {}", checkpoint.seed);
    println!("Lattice: {0}x{0}", checkpoint.size);
    println!("Population: {}", population);
    println!("  Stem: {}", stem);
    println!("  Regular: {}", population - stem);
    println!("Counted steps: {}", checkpoint.counters.len());
    println!();
    println!(
        "Checkpoint size: {:.2} MB",
        checkpoint.size_bytes() as f64 / 1_000_000.0
    );

    Ok(())
}
