use crate::error::{DlaError, Result};
use crate::grid::{Grid, Position};
use crate::neighbor::{free_neighbors, touches_aggregate, Topology};
use crate::rng::SimRng;
use crate::walker::Walker;
use log::{debug, info, trace, warn};

/// Random edge draws attempted before falling back to a scan of the free edge cells
const SPAWN_REDRAWS: usize = 64;

/// Per-walker rules shared by every particle of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkRules {
    pub stickiness: f64,
    pub topology: Topology,
    /// Accepted moves after which a walker is abandoned
    pub max_walk_steps: Option<u64>,
}

/// How a single walker's loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Frozen onto the aggregate. `forced` is set when the walker had no free
    /// neighbor left and stuck without a stickiness draw.
    Stuck { at: Position, steps: u64, forced: bool },
    /// Hit the step cap; its cell has been released
    Abandoned { at: Position, steps: u64 },
}

impl WalkOutcome {
    pub fn steps(&self) -> u64 {
        match *self {
            WalkOutcome::Stuck { steps, .. } | WalkOutcome::Abandoned { steps, .. } => steps,
        }
    }

    pub fn is_stuck(&self) -> bool {
        matches!(self, WalkOutcome::Stuck { .. })
    }
}

/// Progress notifications emitted while aggregating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationEvent {
    Spawned { particle: usize, at: Position },
    Stuck { particle: usize, at: Position, steps: u64, forced: bool },
    Abandoned { particle: usize, at: Position, steps: u64 },
}

/// Totals for one `aggregate` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    pub stuck: usize,
    pub abandoned: usize,
    pub total_steps: u64,
}

impl AggregateSummary {
    pub fn record(&mut self, outcome: &WalkOutcome) {
        match outcome {
            WalkOutcome::Stuck { .. } => self.stuck += 1,
            WalkOutcome::Abandoned { .. } => self.abandoned += 1,
        }
        self.total_steps += outcome.steps();
    }
}

/// Drives walkers over a grid it borrows exclusively.
///
/// Each walker is `Spawned`, then `Walking`, and finally `Stuck` (or
/// `Abandoned` when a step cap is configured). Only one walker is in flight at
/// a time, so the neighbor rule always sees the frozen aggregate plus that
/// walker's own cell.
pub struct Aggregator<'a> {
    grid: &'a mut Grid,
    rng: &'a mut SimRng,
    rules: WalkRules,
}

impl<'a> Aggregator<'a> {
    pub fn new(grid: &'a mut Grid, rng: &'a mut SimRng, rules: WalkRules) -> Self {
        Self { grid, rng, rules }
    }

    pub fn grid(&self) -> &Grid {
        &*self.grid
    }

    pub fn rules(&self) -> &WalkRules {
        &self.rules
    }

    /// Place the permanent nucleus at the grid center
    pub fn seed(&mut self) -> Position {
        let (cx, cy) = self.grid.center();
        self.grid.set_occupied(cx, cy);
        (cx, cy)
    }

    /// Put a new walker on a free edge cell and mark it in flight.
    /// Returns `None` when every edge cell is occupied.
    pub fn spawn(&mut self) -> Option<Walker> {
        let (x, y) = self.spawn_position()?;
        self.grid.set_occupied(x, y);
        Some(Walker::new((x, y), self.rules.stickiness))
    }

    fn spawn_position(&mut self) -> Option<Position> {
        for attempt in 0..SPAWN_REDRAWS {
            let (x, y) = self.grid.random_edge_position(self.rng);
            if !self.grid.is_occupied(x, y) {
                if attempt > 0 {
                    debug!("spawn landed on the aggregate, redrew {} time(s)", attempt);
                }
                return Some((x, y));
            }
        }

        let grid = &*self.grid;
        let free: Vec<Position> = grid
            .edge_cells()
            .filter(|&(x, y)| !grid.is_occupied(x, y))
            .collect();
        if free.is_empty() {
            return None;
        }
        debug!("edge crowded, picking among {} free edge cells", free.len());
        Some(free[self.rng.index(free.len())])
    }

    /// Stickiness draw, taken only when the walker touches the aggregate
    pub fn stick_check(&mut self, walker: &mut Walker) -> bool {
        let (x, y) = walker.position;
        if touches_aggregate(self.grid, self.rules.topology, x, y) {
            walker.try_stick(self.rng);
        }
        walker.stuck
    }

    /// Move to a uniformly chosen free neighbor. A walker with nowhere to go
    /// sticks where it is; returns true in that case.
    pub fn advance(&mut self, walker: &mut Walker) -> bool {
        let (x, y) = walker.position;
        let free = free_neighbors(self.grid, self.rules.topology, x, y);
        if free.is_empty() {
            walker.force_stick();
            return true;
        }

        let next = free.as_slice()[self.rng.index(free.len())];
        self.grid.clear(x, y);
        self.grid.set_occupied(next.0, next.1);
        walker.move_to(next);
        false
    }

    /// Run a spawned walker until it sticks or exhausts its step budget
    pub fn walk(&mut self, mut walker: Walker) -> WalkOutcome {
        let mut forced = false;
        self.stick_check(&mut walker);

        while !walker.stuck {
            if let Some(limit) = self.rules.max_walk_steps {
                if walker.steps >= limit {
                    let (x, y) = walker.position;
                    self.grid.clear(x, y);
                    return WalkOutcome::Abandoned {
                        at: walker.position,
                        steps: walker.steps,
                    };
                }
            }

            forced = self.advance(&mut walker);
            if !forced {
                self.stick_check(&mut walker);
            }
        }

        WalkOutcome::Stuck {
            at: walker.position,
            steps: walker.steps,
            forced,
        }
    }

    /// Spawn one walker and walk it to the end
    pub fn release(&mut self) -> Option<(Position, WalkOutcome)> {
        let walker = self.spawn()?;
        let start = walker.position;
        Some((start, self.walk(walker)))
    }

    /// Release `particles` walkers in sequence, reporting each one through `on_event`
    pub fn aggregate<F>(&mut self, particles: usize, on_event: F) -> Result<AggregateSummary>
    where
        F: FnMut(&AggregationEvent),
    {
        let mut summary = AggregateSummary::default();
        self.aggregate_into(particles, &mut summary, on_event)?;
        Ok(summary)
    }

    /// Like [`aggregate`](Self::aggregate), accumulating into `summary` so the
    /// walkers placed before an error are still counted.
    pub fn aggregate_into<F>(
        &mut self,
        particles: usize,
        summary: &mut AggregateSummary,
        mut on_event: F,
    ) -> Result<()>
    where
        F: FnMut(&AggregationEvent),
    {
        let report_every = (particles / 10).max(1);

        for particle in 0..particles {
            let Some((start, outcome)) = self.release() else {
                return Err(DlaError::EdgeSaturated {
                    placed: summary.stuck,
                });
            };
            on_event(&AggregationEvent::Spawned { particle, at: start });
            summary.record(&outcome);

            match outcome {
                WalkOutcome::Stuck { at, steps, forced } => {
                    trace!("particle {} stuck at {:?} after {} steps", particle, at, steps);
                    on_event(&AggregationEvent::Stuck {
                        particle,
                        at,
                        steps,
                        forced,
                    });
                }
                WalkOutcome::Abandoned { at, steps } => {
                    warn!("particle {} abandoned at {:?} after {} steps", particle, at, steps);
                    on_event(&AggregationEvent::Abandoned { particle, at, steps });
                }
            }

            if (particle + 1) % report_every == 0 {
                info!(
                    "{}/{} particles done ({} stuck, {} abandoned)",
                    particle + 1,
                    particles,
                    summary.stuck,
                    summary.abandoned
                );
            }
        }

        Ok(())
    }
}
