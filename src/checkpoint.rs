//! Checkpoint system for saving and resuming runs.

use crate::config::Config;
use crate::population::Population;
use crate::stats::Counters;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Complete run state captured between steps
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Step count at capture time
    pub step: u64,
    /// Root seed of the run
    pub seed: u64,
    /// Configuration
    pub config: Config,
    /// Side of the square lattice
    pub size: usize,
    /// Row-major site values
    pub cells: Vec<i32>,
    /// Live-cell index
    pub population: Population,
    /// Recorded count series
    pub counters: Counters,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    const MAGIC: &'static [u8; 4] = b"ONCO";

    pub fn new(
        step: u64,
        seed: u64,
        config: Config,
        size: usize,
        cells: Vec<i32>,
        population: Population,
        counters: Counters,
    ) -> Self {
        Self {
            version: Self::VERSION,
            step,
            seed,
            config,
            size,
            cells,
            population,
            counters,
        }
    }

    /// Save checkpoint to a binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(Self::MAGIC)?;
        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;

        Ok(())
    }

    /// Load checkpoint from a binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != Self::MAGIC {
            return Err(CheckpointError::InvalidFormat(
                "invalid magic bytes".to_string(),
            ));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    InvalidFormat(String),
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "serialization error: {}", e),
            Self::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            Self::VersionMismatch { expected, found } => {
                write!(f, "version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

/// Interval-based checkpoint saving with pruning of old files
pub struct CheckpointManager {
    /// Directory the checkpoints land in
    pub base_dir: PathBuf,
    /// Steps between checkpoints
    pub interval: u64,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    last_checkpoint: u64,
}

impl CheckpointManager {
    pub fn new<P: Into<PathBuf>>(base_dir: P, interval: u64, max_checkpoints: usize) -> Self {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).ok();

        Self {
            base_dir,
            interval,
            max_checkpoints,
            last_checkpoint: 0,
        }
    }

    /// Whether a checkpoint is due at `step`.
    pub fn should_save(&self, step: u64) -> bool {
        step > 0 && step % self.interval == 0 && step != self.last_checkpoint
    }

    /// Filename for the checkpoint at `step`.
    pub fn checkpoint_path(&self, step: u64) -> PathBuf {
        self.base_dir.join(format!("checkpoint_{:08}.bin", step))
    }

    /// Save and prune beyond the keep limit.
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.step);
        checkpoint.save(&path)?;
        self.last_checkpoint = checkpoint.step;
        self.cleanup()?;
        Ok(path)
    }

    fn cleanup(&self) -> Result<(), CheckpointError> {
        let mut checkpoints: Vec<_> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("checkpoint_")
            })
            .collect();

        if checkpoints.len() > self.max_checkpoints {
            checkpoints.sort_by_key(|e| e.file_name());

            let to_remove = checkpoints.len() - self.max_checkpoints;
            for entry in checkpoints.into_iter().take(to_remove) {
                std::fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// Most recent checkpoint file in the directory, if any.
    pub fn find_latest(&self) -> Option<PathBuf> {
        std::fs::read_dir(&self.base_dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("checkpoint_")
            })
            .max_by_key(|e| e.file_name())
            .map(|e| e.path())
    }
}
