//! Core simulation engine for bracetopia.
//!
//! A square grid holds endline agents, newline agents and vacancies. Each
//! cycle, agents whose share of like-minded neighbors falls below the
//! configured strength of preference move into vacancies further along the
//! grid.

use std::collections::VecDeque;

use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub mod agent;
pub mod grid;
pub mod relocation;

pub use agent::{Neighborhood, happiness, happiness_at, team_happiness};
pub use bracetopia_index::{Compass, MOORE_NEIGHBORS};
pub use grid::{Cell, Census, Grid, GridError};
pub use relocation::{Relocation, relocate};

/// Seed used for every run so that simulations are repeatable.
pub const DEFAULT_SEED: u64 = 41;
/// Smallest accepted grid side length.
pub const MIN_DIMENSION: usize = 5;
/// Largest accepted grid side length.
pub const MAX_DIMENSION: usize = 39;
/// Smallest accepted percentage for strength, vacancy and endline share.
pub const MIN_PERCENT: u8 = 1;
/// Largest accepted percentage for strength, vacancy and endline share.
pub const MAX_PERCENT: u8 = 99;

/// Errors that can occur when constructing a world.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Static configuration for a bracetopia run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracetopiaConfig {
    /// Width and height of the grid.
    pub dimension: usize,
    /// Minimum percentage of like neighbors an agent needs to stay put.
    pub strength: u8,
    /// Percentage of grid positions left vacant.
    pub vacancy: u8,
    /// Percentage of agents preferring endline braces.
    pub endline: u8,
    /// Seed for the grid shuffle.
    pub rng_seed: u64,
    /// Maximum number of recent cycle summaries retained in-memory.
    pub history_capacity: usize,
}

impl Default for BracetopiaConfig {
    fn default() -> Self {
        Self {
            dimension: 15,
            strength: 50,
            vacancy: 20,
            endline: 60,
            rng_seed: DEFAULT_SEED,
            history_capacity: 256,
        }
    }
}

impl BracetopiaConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&self.dimension) {
            return Err(WorldError::InvalidConfig("dimension must be in [5, 39]"));
        }
        let percent = MIN_PERCENT..=MAX_PERCENT;
        if !percent.contains(&self.strength) {
            return Err(WorldError::InvalidConfig(
                "strength of preference must be in [1, 99]",
            ));
        }
        if !percent.contains(&self.vacancy) {
            return Err(WorldError::InvalidConfig("vacancy must be in [1, 99]"));
        }
        if !percent.contains(&self.endline) {
            return Err(WorldError::InvalidConfig(
                "endline proportion must be in [1, 99]",
            ));
        }
        if self.history_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }

    /// One-line description of the run parameters shown under every frame.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "dim: {}, %strength of preference:  {}%, %vacancy:  {}%, %end:  {}%",
            self.dimension, self.strength, self.vacancy, self.endline
        )
    }

    fn seeded_rng(&self) -> SmallRng {
        SmallRng::seed_from_u64(self.rng_seed)
    }
}

/// Statistics describing the grid at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Number of completed cycles; 0 describes the initial grid.
    pub cycle: u64,
    /// Agents relocated during this cycle.
    pub moves: usize,
    /// Mean happiness of all agents on the grid.
    pub team_happiness: f64,
    pub census: Census,
}

/// Aggregate simulation state owned by the driver.
#[derive(Debug, Clone)]
pub struct World {
    config: BracetopiaConfig,
    grid: Grid,
    cycle: u64,
    last_moves: usize,
    team_happiness: f64,
    history: VecDeque<CycleSummary>,
}

impl World {
    /// Validate `config` and build the initial shuffled grid.
    pub fn new(config: BracetopiaConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let mut rng = config.seeded_rng();
        let grid = Grid::populate(config.dimension, config.vacancy, config.endline, &mut rng)?;
        let census = grid.census();
        info!(
            dimension = config.dimension,
            vacant = census.vacant,
            endline = census.endline,
            newline = census.newline,
            seed = config.rng_seed,
            "Initialized bracetopia grid"
        );
        Ok(Self::assemble(config, grid))
    }

    /// Start from an explicit grid instead of a shuffled one.
    ///
    /// The grid side must match `config.dimension`.
    pub fn with_grid(config: BracetopiaConfig, grid: Grid) -> Result<Self, WorldError> {
        config.validate()?;
        if grid.side() != config.dimension {
            return Err(WorldError::InvalidConfig(
                "grid side must match configured dimension",
            ));
        }
        Ok(Self::assemble(config, grid))
    }

    fn assemble(config: BracetopiaConfig, grid: Grid) -> Self {
        let team_happiness = team_happiness(&grid);
        let mut world = Self {
            history: VecDeque::with_capacity(config.history_capacity.min(1024)),
            config,
            grid,
            cycle: 0,
            last_moves: 0,
            team_happiness,
        };
        let initial = world.summary();
        world.record(initial);
        world
    }

    /// Run one cycle: relocate unhappy agents, then recompute team happiness
    /// over the resulting grid.
    pub fn step(&mut self) -> CycleSummary {
        let relocation = relocate(&mut self.grid, self.config.strength);
        self.last_moves = relocation.moves;
        self.team_happiness = team_happiness(&self.grid);
        self.cycle += 1;

        debug!(
            cycle = self.cycle,
            moves = relocation.moves,
            vacancies_exhausted = relocation.vacancies_exhausted,
            team_happiness = self.team_happiness,
            "Completed relocation cycle"
        );

        let summary = self.summary();
        self.record(summary);
        summary
    }

    fn record(&mut self, summary: CycleSummary) {
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }

    /// Summary of the current grid.
    #[must_use]
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            cycle: self.cycle,
            moves: self.last_moves,
            team_happiness: self.team_happiness,
            census: self.grid.census(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BracetopiaConfig {
        &self.config
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Completed cycles.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Agents moved by the most recent cycle; 0 before the first one.
    #[must_use]
    pub const fn last_moves(&self) -> usize {
        self.last_moves
    }

    #[must_use]
    pub const fn team_happiness(&self) -> f64 {
        self.team_happiness
    }

    /// Iterate over retained cycle summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &CycleSummary> {
        self.history.iter()
    }
}
