//! Run configuration: YAML files with defaults, plus the legacy preset
//! format used by the benchmark scenario files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub run: RunConfig,
    pub cells: CellConfig,
    pub domain: DomainConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduling parameters for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Total number of steps to simulate
    pub last_step: u64,
    /// Worker partitions per step; 0 picks the rayon pool width
    pub threads: usize,
}

/// Per-cell stochastic rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellConfig {
    /// Divisions a regular cell starts with; the stem tag is this plus one
    pub potential_max: u32,
    /// Per-step spontaneous death chance for regular cells, in percent.
    /// Stem cells are exempt.
    pub death_chance: f32,
    /// Per-step division chance, in percent
    pub proliferation_chance: u32,
    /// Per-step migration chance when the cell does not divide, in percent
    pub migration_chance: u32,
    /// Chance that a dividing stem cell's daughter is itself stem, in percent
    pub stc_child_chance: u32,
    /// Whether the starter cell is stem-like
    pub starter_is_stc: bool,
}

/// Lattice geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Side of the initial square lattice
    pub initial_size: usize,
}

/// Logging and progress output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Steps between progress lines
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            cells: CellConfig::default(),
            domain: DomainConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            last_step: 100,
            threads: 0,
        }
    }
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            potential_max: 10,
            death_chance: 0.1,
            proliferation_chance: 10,
            migration_chance: 10,
            stc_child_chance: 10,
            starter_is_stc: true,
        }
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self { initial_size: 100 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 10,
            log_level: "info".to_string(),
        }
    }
}

/// Hours per day, for scaling the preset format's daily death chance down to
/// the per-step value the engine expects.
const HOURS_PER_DAY: f32 = 24.0;

/// Smallest lattice side the engine accepts.
const MIN_SIDE: usize = 12;

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Load the legacy preset format: seven whitespace-separated values in
    /// the order step count, maximum potential, daily death chance,
    /// proliferation chance, migration chance, stem-child chance, and
    /// `true`/`false` for the starter type.
    ///
    /// The death chance in these files is per day; it is divided by 24 here
    /// so the engine always receives the per-step value.
    pub fn from_preset_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_preset_str(&contents)
    }

    /// Parse preset contents; see [`Config::from_preset_file`].
    pub fn from_preset_str(contents: &str) -> Result<Self, ConfigError> {
        let mut fields = contents.split_whitespace();
        let mut next = |name: &'static str| {
            fields.next().ok_or(ConfigError::Preset {
                field: name,
                message: "missing value".to_string(),
            })
        };

        let last_step = parse(next("last_step")?, "last_step")?;
        let potential_max = parse(next("potential_max")?, "potential_max")?;
        let death_daily: f32 = parse(next("death_chance")?, "death_chance")?;
        let proliferation_chance = parse(next("proliferation_chance")?, "proliferation_chance")?;
        let migration_chance = parse(next("migration_chance")?, "migration_chance")?;
        let stc_child_chance = parse(next("stc_child_chance")?, "stc_child_chance")?;
        let starter = next("starter_is_stc")?;
        let starter_is_stc = match starter {
            "true" => true,
            "false" => false,
            other => {
                return Err(ConfigError::Preset {
                    field: "starter_is_stc",
                    message: format!("expected true or false, got {other:?}"),
                })
            }
        };

        let config = Config {
            run: RunConfig {
                last_step,
                ..RunConfig::default()
            },
            cells: CellConfig {
                potential_max,
                death_chance: death_daily / HOURS_PER_DAY,
                proliferation_chance,
                migration_chance,
                stc_child_chance,
                starter_is_stc,
            },
            domain: DomainConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cells.potential_max < 1 {
            return Err(ConfigError::PotentialTooSmall(self.cells.potential_max));
        }
        if !(0.0..=100.0).contains(&self.cells.death_chance) {
            return Err(ConfigError::InvalidChance {
                name: "death_chance",
                value: self.cells.death_chance,
            });
        }
        for (name, value) in [
            ("proliferation_chance", self.cells.proliferation_chance),
            ("migration_chance", self.cells.migration_chance),
            ("stc_child_chance", self.cells.stc_child_chance),
        ] {
            if value > 100 {
                return Err(ConfigError::InvalidChance {
                    name,
                    value: value as f32,
                });
            }
        }
        if self.domain.initial_size < MIN_SIDE {
            return Err(ConfigError::DomainTooSmall(self.domain.initial_size));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(raw: &str, field: &'static str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e| ConfigError::Preset {
        field,
        message: format!("bad value {raw:?}: {e}"),
    })
}

/// Errors reported while loading or validating a configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Preset {
        field: &'static str,
        message: String,
    },
    InvalidChance {
        name: &'static str,
        value: f32,
    },
    PotentialTooSmall(u32),
    DomainTooSmall(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Yaml(e) => write!(f, "YAML error: {}", e),
            Self::Preset { field, message } => write!(f, "preset field {field}: {message}"),
            Self::InvalidChance { name, value } => {
                write!(f, "{name} must be within 0..=100, got {value}")
            }
            Self::PotentialTooSmall(v) => write!(f, "potential_max must be at least 1, got {v}"),
            Self::DomainTooSmall(v) => {
                write!(f, "initial_size must be at least {MIN_SIDE}, got {v}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml(e)
    }
}
