//! The simulation engine: step scheduling, domain growth, snapshots.

use crate::checkpoint::Checkpoint;
use crate::config::{Config, ConfigError};
use crate::lattice::{Lattice, EMPTY};
use crate::population::{Coord, Population};
use crate::rng::SimRng;
use crate::rules::{self, WorkerOutcome};
use crate::snapshot::Snapshot;
use crate::stats::Counters;
use rayon::prelude::*;
use std::fmt;

/// Cells this close to the border trigger a domain extension.
pub const BORDER_MARGIN: usize = 5;
/// Sites added to every edge per extension.
pub const BORDER_PAD: usize = 2;

/// API misuse reported back to the caller.
#[derive(Debug)]
pub enum EngineError {
    OutOfBounds { x: usize, y: usize, size: usize },
    Occupied { x: usize, y: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { x, y, size } => {
                write!(f, "site ({x}, {y}) outside {size}x{size} lattice")
            }
            Self::Occupied { x, y } => write!(f, "site ({x}, {y}) is already occupied"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Headless tumor-growth engine.
///
/// Owns the lattice and the live-cell index; external readers only ever see
/// immutable [`Snapshot`]s. One call to [`Engine::step`] advances every live
/// cell exactly once.
pub struct Engine {
    config: Config,
    lattice: Lattice,
    cells: Population,
    counters: Counters,
    time: u64,
    seed: u64,
    rng: SimRng,
}

impl Engine {
    /// Engine with a seed drawn from the entropy pool.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let seed = SimRng::entropy_seed();
        Self::new_with_seed(config, seed)
    }

    /// Engine with a fixed seed, for reproducible runs.
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = Self {
            lattice: Lattice::new(config.domain.initial_size),
            cells: Population::new(),
            counters: Counters::new(),
            time: 0,
            seed,
            rng: SimRng::seed_from(seed),
            config,
        };
        engine.place_starter();
        Ok(engine)
    }

    /// Restore a previously checkpointed run.
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, ConfigError> {
        checkpoint.config.validate()?;
        Ok(Self {
            lattice: Lattice::from_cells(checkpoint.size, &checkpoint.cells),
            cells: checkpoint.population,
            counters: checkpoint.counters,
            time: checkpoint.step,
            seed: checkpoint.seed,
            rng: SimRng::seed_from(checkpoint.seed),
            config: checkpoint.config,
        })
    }

    /// Capture the complete run state.
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.time,
            self.seed,
            self.config.clone(),
            self.lattice.size(),
            self.lattice.cells(),
            self.cells.clone(),
            self.counters.clone(),
        )
    }

    fn starter_value(&self) -> i32 {
        if self.config.cells.starter_is_stc {
            self.config.cells.potential_max as i32 + 1
        } else {
            self.config.cells.potential_max as i32
        }
    }

    fn place_starter(&mut self) {
        let center = self.lattice.size() / 2;
        self.lattice.set(center, center, self.starter_value());
        self.cells.push(Coord::new(center, center));
    }

    /// Wipe the run back to a single centered starter cell. A `Some` seed
    /// rewinds to that seed's stream; `None` keeps the current one.
    pub fn reset(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        self.rng = SimRng::seed_from(self.seed);
        self.lattice = Lattice::new(self.config.domain.initial_size);
        self.cells.clear();
        self.counters.clear();
        self.time = 0;
        self.place_starter();
        log::debug!("reset to seed {}", self.seed);
    }

    /// Place an additional starter cell.
    pub fn seed_cell(&mut self, x: usize, y: usize) -> Result<(), EngineError> {
        let size = self.lattice.size();
        if x >= size || y >= size {
            return Err(EngineError::OutOfBounds { x, y, size });
        }
        if self.lattice.get(x, y) != EMPTY {
            return Err(EngineError::Occupied { x, y });
        }
        self.lattice.set(x, y, self.starter_value());
        self.cells.push(Coord::new(x, y));
        Ok(())
    }

    /// Worker partitions for the coming step.
    fn worker_count(&self) -> usize {
        let configured = self.config.run.threads;
        let width = if configured == 0 {
            rayon::current_num_threads()
        } else {
            configured
        };
        width.min(self.cells.len()).max(1)
    }

    /// Advance the simulation by one step. With `counting`, the resulting
    /// lineage totals are appended to the counter series.
    pub fn step(&mut self, counting: bool) {
        self.cells.shuffle(&mut self.rng);

        let workers = self.worker_count();
        let lattice = &self.lattice;
        let cell_rules = &self.config.cells;
        let view = self.cells.as_slice();
        let seed = self.seed;
        let time = self.time;

        // Fork-join: each worker walks its stride of the shuffled index with
        // a private substream and journals births and moves. The collect
        // joins every worker before maintenance starts.
        let outcomes: Vec<WorkerOutcome> = (0..workers)
            .into_par_iter()
            .map(|worker| {
                let mut rng = SimRng::worker_stream(seed, time, worker as u64);
                let mut out = WorkerOutcome::default();
                let mut index = worker;
                while index < view.len() {
                    rules::update_cell(lattice, cell_rules, index, view[index], &mut rng, &mut out);
                    index += workers;
                }
                out
            })
            .collect();

        // A site vacated by a death can host a daughter or a migrant before
        // the step ends, so dead entries are removed by journaled index, not
        // by probing the lattice for emptiness.
        let mut dead = vec![false; self.cells.len()];
        for outcome in &outcomes {
            for &(index, to) in &outcome.moves {
                self.cells.relocate(index, to);
            }
            for &index in &outcome.deaths {
                dead[index] = true;
            }
        }
        for outcome in outcomes {
            self.cells.extend(outcome.births);
        }
        self.cells.remove_dead(&dead);

        while self.cells.near_border(self.lattice.size(), BORDER_MARGIN) {
            self.extend_domain();
        }

        self.time += 1;

        if counting {
            let (stc, rtc) = self.count_kinds();
            self.counters.record(stc, rtc);
        }
    }

    /// Run `steps` consecutive steps.
    pub fn run(&mut self, steps: u64, counting: bool) {
        for _ in 0..steps {
            self.step(counting);
        }
    }

    fn extend_domain(&mut self) {
        self.lattice = self.lattice.extended(BORDER_PAD);
        self.cells.translate(BORDER_PAD);
        log::debug!(
            "domain extended to {size}x{size} at step {time}",
            size = self.lattice.size(),
            time = self.time
        );
    }

    /// Current stem and regular cell totals.
    fn count_kinds(&self) -> (usize, usize) {
        let stc_tag = self.config.cells.potential_max as i32 + 1;
        self.cells
            .as_slice()
            .par_iter()
            .map(|c| {
                if self.lattice.get(c.x, c.y) >= stc_tag {
                    (1, 0)
                } else {
                    (0, 1)
                }
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    }

    /// Immutable copy of the run for renderers and tests.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            size: self.lattice.size(),
            step: self.time,
            potential_max: self.config.cells.potential_max,
            cells: self.lattice.cells(),
            stc: self.counters.stc.clone(),
            rtc: self.counters.rtc.clone(),
        }
    }

    /// Count series recorded so far.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// One-line progress summary for CLI output.
    pub fn summary(&self) -> String {
        let (stc, rtc) = self.count_kinds();
        format!(
            "T:{:6} | Pop:{:6} | STC:{:5} | RTC:{:6} | Side:{:4}",
            self.time,
            self.cells.len(),
            stc,
            rtc,
            self.lattice.size()
        )
    }

    pub fn population(&self) -> usize {
        self.cells.len()
    }

    pub fn is_extinct(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn size(&self) -> usize {
        self.lattice.size()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::RESERVED;
    use std::collections::HashSet;

    fn config(
        potential_max: u32,
        death: f32,
        proliferation: u32,
        migration: u32,
        stc_child: u32,
        starter_is_stc: bool,
    ) -> Config {
        let mut config = Config::default();
        config.run.threads = 1;
        config.cells.potential_max = potential_max;
        config.cells.death_chance = death;
        config.cells.proliferation_chance = proliferation;
        config.cells.migration_chance = migration;
        config.cells.stc_child_chance = stc_child;
        config.cells.starter_is_stc = starter_is_stc;
        config
    }

    /// Checks that must hold between any two steps.
    fn verify_invariants(engine: &Engine, initial_size: usize) {
        let snap = engine.snapshot();
        let stc_tag = snap.potential_max as i32 + 1;

        for &v in &snap.cells {
            assert_ne!(v, RESERVED, "reservation outlived its step");
            assert!(
                v == EMPTY || (1..=stc_tag).contains(&v),
                "site value {v} out of range"
            );
        }

        assert!(snap.size >= initial_size, "lattice shrank");
        assert_eq!(
            engine.population(),
            snap.population(),
            "index and lattice disagree on the live count"
        );

        let mut seen = HashSet::new();
        for coord in engine.cells.iter() {
            assert!(seen.insert(*coord), "coordinate indexed twice: {coord:?}");
            assert_ne!(snap.site(coord.x, coord.y), EMPTY, "index points at an empty site");
        }

        assert!(
            !engine.cells.near_border(snap.size, BORDER_MARGIN),
            "cell left within the border margin"
        );
    }

    #[test]
    fn starter_sits_at_the_center() {
        let engine = Engine::new_with_seed(config(10, 0.0, 0, 0, 0, true), 1).unwrap();
        let snap = engine.snapshot();
        assert_eq!(snap.site(50, 50), 11);
        assert_eq!(engine.population(), 1);

        let engine = Engine::new_with_seed(config(10, 0.0, 0, 0, 0, false), 1).unwrap();
        assert_eq!(engine.snapshot().site(50, 50), 10);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut bad = config(10, 0.0, 0, 0, 0, true);
        bad.cells.migration_chance = 150;
        assert!(Engine::new_with_seed(bad, 1).is_err());
    }

    #[test]
    fn seed_cell_checks_bounds_and_occupancy() {
        let mut engine = Engine::new_with_seed(config(10, 0.0, 0, 0, 0, false), 1).unwrap();

        assert!(matches!(
            engine.seed_cell(100, 3),
            Err(EngineError::OutOfBounds { .. })
        ));
        assert!(matches!(
            engine.seed_cell(50, 50),
            Err(EngineError::Occupied { .. })
        ));

        engine.seed_cell(30, 30).unwrap();
        assert_eq!(engine.population(), 2);
        assert_eq!(engine.snapshot().site(30, 30), 10);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut engine = Engine::new_with_seed(config(10, 0.0, 100, 0, 0, true), 3).unwrap();
        engine.run(5, true);
        assert!(engine.population() > 1);

        engine.reset(Some(9));
        assert_eq!(engine.time(), 0);
        assert_eq!(engine.population(), 1);
        assert_eq!(engine.seed(), 9);
        assert!(engine.counters().is_empty());
        assert_eq!(engine.snapshot().site(50, 50), 11);
    }

    #[test]
    fn death_only_run_goes_extinct_in_one_step() {
        let mut engine = Engine::new_with_seed(config(1, 100.0, 0, 0, 0, false), 11).unwrap();
        engine.step(true);

        assert_eq!(engine.population(), 0);
        assert!(engine.is_extinct());
        assert_eq!(engine.counters().latest(), Some((0, 0)));
        verify_invariants(&engine, 100);
    }

    #[test]
    fn quiescent_rules_leave_the_state_unchanged() {
        let mut engine = Engine::new_with_seed(config(10, 0.0, 0, 0, 0, true), 12).unwrap();
        let before = engine.snapshot();

        engine.run(5, false);
        let after = engine.snapshot();

        assert_eq!(after.cells, before.cells);
        assert_eq!(after.size, before.size);
        assert_eq!(after.step, 5);
        assert_eq!(engine.population(), 1);
        verify_invariants(&engine, 100);
    }

    #[test]
    fn stem_cell_survives_certain_death() {
        let mut engine = Engine::new_with_seed(config(10, 100.0, 0, 50, 0, true), 13).unwrap();
        engine.run(25, true);

        assert_eq!(engine.population(), 1);
        assert_eq!(engine.counters().latest(), Some((1, 0)));
        verify_invariants(&engine, 100);
    }

    #[test]
    fn migration_only_preserves_the_population() {
        let mut engine = Engine::new_with_seed(config(10, 0.0, 0, 100, 0, false), 14).unwrap();
        for x in [40usize, 44, 60] {
            engine.seed_cell(x, 50).unwrap();
        }
        let start = engine.population();

        for _ in 0..30 {
            engine.step(false);
            assert_eq!(engine.population(), start);
            verify_invariants(&engine, 100);
        }
    }

    #[test]
    fn rtc_colony_is_bounded_by_its_potential() {
        // Pure proliferation from a single regular cell: growth for at most
        // potential_max steps, then the colony stabilizes or declines and
        // stays inside the reachable 9x9 region.
        let mut engine = Engine::new_with_seed(config(10, 0.0, 100, 0, 0, false), 15).unwrap();

        engine.step(false);
        assert_eq!(engine.population(), 2);

        for _ in 1..10 {
            engine.step(false);
            verify_invariants(&engine, 100);
        }
        assert!(engine.population() <= 81, "colony outgrew its potential");
    }

    #[test]
    fn potential_one_colony_dies_out() {
        let mut engine = Engine::new_with_seed(config(1, 0.0, 100, 0, 0, false), 16).unwrap();

        let mut peak = engine.population();
        for _ in 0..50 {
            engine.step(true);
            peak = peak.max(engine.population());
            verify_invariants(&engine, 100);
        }

        assert!(peak <= 5);
        assert_eq!(engine.population(), 0);
    }

    #[test]
    fn stem_seeded_colony_spreads_and_extends_the_domain() {
        let mut engine = Engine::new_with_seed(config(20, 0.0, 90, 90, 90, true), 17).unwrap();
        engine.run(100, true);

        let (stc, _) = engine.counters().latest().unwrap();
        assert!(stc >= 1, "stem lineage vanished");
        assert!(engine.size() > 100, "domain never extended");
        assert!(engine.population() > 50, "colony failed to spread");
        verify_invariants(&engine, 100);
    }

    #[test]
    fn stem_count_never_drops_without_death() {
        let mut engine = Engine::new_with_seed(config(10, 0.0, 80, 40, 50, true), 18).unwrap();
        engine.run(40, true);

        let stc = &engine.counters().stc;
        assert!(stc.windows(2).all(|w| w[1] >= w[0]), "stem count dropped: {stc:?}");
    }

    #[test]
    fn no_stem_cells_appear_in_regular_runs() {
        let mut engine = Engine::new_with_seed(config(10, 0.0, 80, 50, 90, false), 19).unwrap();
        engine.run(30, true);

        assert!(engine.counters().stc.iter().all(|&n| n == 0));
    }

    #[test]
    fn fixed_seed_single_worker_runs_are_identical() {
        let config = config(10, 1.0, 60, 40, 30, true);
        let mut a = Engine::new_with_seed(config.clone(), 42).unwrap();
        let mut b = Engine::new_with_seed(config, 42).unwrap();

        for _ in 0..20 {
            a.step(true);
            b.step(true);
            assert_eq!(a.snapshot(), b.snapshot());
        }
    }

    #[test]
    fn death_with_proliferation_keeps_index_and_grid_aligned() {
        // A died cell's site can be recolonized by a neighboring birth or
        // migrant within the same step; the index must still end the step
        // with exactly one entry per occupied site.
        let mut engine =
            Engine::new_with_seed(config(10, 30.0, 60, 40, 20, true), 23).unwrap();

        for _ in 0..60 {
            engine.step(true);
            verify_invariants(&engine, 100);
        }
    }

    #[test]
    fn multi_worker_step_respects_the_invariants() {
        let mut config = config(10, 20.0, 90, 60, 50, true);
        config.run.threads = 4;

        let mut engine = Engine::new_with_seed(config, 21).unwrap();
        for _ in 0..40 {
            engine.step(true);
            verify_invariants(&engine, 100);
        }
        assert!(engine.population() > 1);
    }

    #[test]
    fn checkpoint_roundtrip_resumes_in_place() {
        let mut engine = Engine::new_with_seed(config(10, 0.5, 70, 40, 30, true), 22).unwrap();
        engine.run(15, true);

        let checkpoint = engine.create_checkpoint();
        let restored = Engine::from_checkpoint(checkpoint).unwrap();

        assert_eq!(restored.time(), engine.time());
        assert_eq!(restored.population(), engine.population());
        assert_eq!(restored.seed(), engine.seed());
        assert_eq!(restored.snapshot(), engine.snapshot());
    }
}
