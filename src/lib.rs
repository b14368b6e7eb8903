//! # ONCOGRID
//!
//! Stochastic agent-based tumor growth on a 2-D lattice.
//!
//! Two cell lineages share a square grid: stem-like tumor cells divide
//! without bound, regular tumor cells carry a finite division potential that
//! their daughters inherit. Each step, every live cell may die, divide into
//! an adjacent free site, crawl to one, or idle; the grid pads itself
//! outward whenever the colony nears the border.
//!
//! ## Features
//!
//! - **Parallel**: cells are updated by a fork-join worker pool; free sites
//!   are claimed lock-free with per-site compare-and-swap
//! - **Reproducible**: a single root seed drives seeded ChaCha streams, one
//!   per worker per step
//! - **Configurable**: YAML configuration files, plus the legacy
//!   seven-value preset format
//! - **Resumable**: binary checkpoints capture and restore complete runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oncogrid::{Config, Engine};
//!
//! let config = Config::default();
//! let mut engine = Engine::new(config).unwrap();
//!
//! // Run with per-step lineage counting enabled.
//! engine.run(1000, true);
//!
//! let snapshot = engine.snapshot();
//! println!("Population: {}", snapshot.population());
//! println!("Lattice side: {}", snapshot.size);
//! ```
//!
//! ## Reproducible runs
//!
//! ```rust
//! use oncogrid::{Config, Engine};
//!
//! let mut config = Config::default();
//! config.run.threads = 1;
//!
//! let mut a = Engine::new_with_seed(config.clone(), 42).unwrap();
//! let mut b = Engine::new_with_seed(config, 42).unwrap();
//! a.run(10, false);
//! b.run(10, false);
//! assert_eq!(a.snapshot(), b.snapshot());
//! ```

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod lattice;
pub mod neighborhood;
pub mod population;
pub mod rng;
pub mod rules;
pub mod snapshot;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use engine::Engine;
pub use snapshot::Snapshot;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(steps: u64, potential_max: u32) -> BenchmarkResult {
    use std::time::Instant;

    let mut config = Config::default();
    config.cells.potential_max = potential_max;
    config.cells.death_chance = 1.0;
    config.cells.proliferation_chance = 30;
    config.cells.migration_chance = 30;
    config.cells.stc_child_chance = 10;

    let mut engine = Engine::new_with_seed(config, 42).expect("benchmark config is valid");

    let start = Instant::now();
    engine.run(steps, false);
    let elapsed = start.elapsed();

    BenchmarkResult {
        steps,
        potential_max,
        final_population: engine.population(),
        final_side: engine.size(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64(),
    }
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub potential_max: u32,
    pub final_population: usize,
    pub final_side: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Potential: {}", self.potential_max)?;
        writeln!(f, "Final population: {}", self.final_population)?;
        writeln!(f, "Final side: {}", self.final_side)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let config = Config::default();
        let mut engine = Engine::new(config).unwrap();

        engine.run(50, false);

        assert_eq!(engine.time(), 50);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(20, 10);

        assert_eq!(result.steps, 20);
        assert!(result.steps_per_second > 0.0);
    }
}
