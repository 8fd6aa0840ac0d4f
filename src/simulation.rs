use crate::aggregation::{AggregateSummary, AggregationEvent, Aggregator, WalkOutcome, WalkRules};
use crate::error::{DlaError, Result};
use crate::grid::{Grid, Position};
use crate::neighbor::Topology;
use crate::rng::SimRng;
use log::info;
use serde::{Deserialize, Serialize};

/// Everything needed to reproduce one aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Side length M of the square grid (at least 3)
    pub grid_size: usize,
    /// Number of walkers to release
    pub particle_count: usize,
    /// Probability of freezing on each check while touching the aggregate
    pub stickiness: f64,
    /// RNG seed; `None` draws one from the OS
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub topology: Topology,
    /// Safety valve for walks that never find the aggregate
    #[serde(default)]
    pub max_walk_steps: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 51,
            particle_count: 15,
            stickiness: 1.0,
            seed: None,
            topology: Topology::Torus,
            max_walk_steps: None,
        }
    }
}

impl SimulationConfig {
    pub fn new(grid_size: usize, particle_count: usize, stickiness: f64) -> Self {
        Self {
            grid_size,
            particle_count,
            stickiness,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 3 {
            return Err(DlaError::GridTooSmall(self.grid_size));
        }
        if !(0.0..=1.0).contains(&self.stickiness) {
            return Err(DlaError::StickinessOutOfRange(self.stickiness));
        }
        if self.particle_count > self.grid_size * self.grid_size - 1 {
            return Err(DlaError::TooManyParticles {
                particles: self.particle_count,
                size: self.grid_size,
            });
        }
        if self.max_walk_steps == Some(0) {
            return Err(DlaError::ZeroMaxWalkSteps);
        }
        Ok(())
    }

    pub fn rules(&self) -> WalkRules {
        WalkRules {
            stickiness: self.stickiness,
            topology: self.topology,
            max_walk_steps: self.max_walk_steps,
        }
    }

    /// File stem naming the run's parameters, e.g. `M_51_NP_15_ST_1`
    pub fn file_stem(&self) -> String {
        format!(
            "M_{}_NP_{}_ST_{}",
            self.grid_size, self.particle_count, self.stickiness
        )
    }
}

/// An aggregation run that can be advanced one particle at a time
pub struct Simulation {
    config: SimulationConfig,
    grid: Grid,
    rng: SimRng,
    released: usize,
    summary: AggregateSummary,
    last_stuck: Option<Position>,
}

impl Simulation {
    /// Validate `config`, build the grid and place the seed
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let rng = SimRng::new(config.seed);
        let mut sim = Self {
            grid: Grid::new(config.grid_size),
            config,
            rng,
            released: 0,
            summary: AggregateSummary::default(),
            last_stuck: None,
        };
        sim.seed_grid();
        Ok(sim)
    }

    fn seed_grid(&mut self) {
        let rules = self.config.rules();
        let at = Aggregator::new(&mut self.grid, &mut self.rng, rules).seed();
        self.last_stuck = Some(at);
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    pub fn summary(&self) -> AggregateSummary {
        self.summary
    }

    /// Walkers released so far, stuck or abandoned
    pub fn released(&self) -> usize {
        self.released
    }

    /// Final cell of the most recent walker to stick (the seed before any)
    pub fn last_stuck(&self) -> Option<Position> {
        self.last_stuck
    }

    pub fn is_complete(&self) -> bool {
        self.released >= self.config.particle_count
    }

    /// Fraction of the configured particles released (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.config.particle_count == 0 {
            return 1.0;
        }
        self.released as f64 / self.config.particle_count as f64
    }

    /// Release one walker. Returns `None` once every particle has been released.
    pub fn step(&mut self) -> Result<Option<WalkOutcome>> {
        if self.is_complete() {
            return Ok(None);
        }

        let rules = self.config.rules();
        let mut agg = Aggregator::new(&mut self.grid, &mut self.rng, rules);
        let Some((_, outcome)) = agg.release() else {
            return Err(DlaError::EdgeSaturated {
                placed: self.summary.stuck,
            });
        };

        self.released += 1;
        self.summary.record(&outcome);
        if let WalkOutcome::Stuck { at, .. } = outcome {
            self.last_stuck = Some(at);
        }
        Ok(Some(outcome))
    }

    /// Release every remaining walker
    pub fn run_to_completion(&mut self) -> Result<AggregateSummary> {
        let remaining = self.config.particle_count - self.released;
        let rules = self.config.rules();
        let mut last_stuck = self.last_stuck;

        let before = self.summary.stuck;
        let mut part = AggregateSummary::default();
        let mut agg = Aggregator::new(&mut self.grid, &mut self.rng, rules);
        let result = agg.aggregate_into(remaining, &mut part, |event| {
            if let AggregationEvent::Stuck { at, .. } = event {
                last_stuck = Some(*at);
            }
        });

        self.last_stuck = last_stuck;
        self.released += part.stuck + part.abandoned;
        self.summary.stuck += part.stuck;
        self.summary.abandoned += part.abandoned;
        self.summary.total_steps += part.total_steps;

        result.map_err(|e| match e {
            DlaError::EdgeSaturated { placed } => DlaError::EdgeSaturated {
                placed: before + placed,
            },
            other => other,
        })?;
        Ok(self.summary)
    }

    /// Start over on an empty grid, optionally with a different seed
    pub fn reset(&mut self, seed: Option<u64>) {
        self.config.seed = seed;
        self.grid = Grid::new(self.config.grid_size);
        self.rng = SimRng::new(seed);
        self.released = 0;
        self.summary = AggregateSummary::default();
        self.seed_grid();
    }

    /// Adjust stickiness for walkers not yet released (clamped to 0.0-1.0)
    pub fn adjust_stickiness(&mut self, delta: f64) {
        self.config.stickiness = (self.config.stickiness + delta).clamp(0.0, 1.0);
    }

    /// Switch neighbor topology for walkers not yet released
    pub fn toggle_topology(&mut self) {
        self.config.topology = self.config.topology.toggle();
    }
}

/// Run `config` to completion and hand back the final grid
pub fn run(config: &SimulationConfig) -> Result<Grid> {
    run_with_summary(config).map(|(grid, _)| grid)
}

/// Like [`run`], also returning the walker totals
pub fn run_with_summary(config: &SimulationConfig) -> Result<(Grid, AggregateSummary)> {
    info!(
        "aggregating {} particles on a {}x{} {} grid (stickiness {})",
        config.particle_count,
        config.grid_size,
        config.grid_size,
        config.topology.name().to_lowercase(),
        config.stickiness
    );
    let mut sim = Simulation::new(config.clone())?;
    let summary = sim.run_to_completion()?;
    info!(
        "done: {} stuck, {} abandoned, {} steps walked",
        summary.stuck, summary.abandoned, summary.total_steps
    );
    Ok((sim.into_grid(), summary))
}
