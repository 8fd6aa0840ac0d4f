use crate::error::{DlaError, Result};
use crate::grid::Grid;
use crate::simulation::{run, SimulationConfig};
use log::info;
use rayon::prelude::*;

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// One run of a sweep
#[derive(Debug, Clone)]
pub struct SweepSample {
    pub config: SimulationConfig,
    pub grid: Grid,
}

/// Copies of `base` with each stickiness value. A seeded base gives sample
/// `i` the seed `base_seed + i`, so every sample is reproducible on its own.
pub fn sweep_configs(base: &SimulationConfig, stickiness: &[f64]) -> Vec<SimulationConfig> {
    stickiness
        .iter()
        .enumerate()
        .map(|(i, &p)| SimulationConfig {
            stickiness: p,
            seed: base.seed.map(|s| s.wrapping_add(i as u64)),
            ..base.clone()
        })
        .collect()
}

/// Run every configuration on the rayon pool. Results keep the input order.
pub fn run_sweep(configs: &[SimulationConfig]) -> Result<Vec<SweepSample>> {
    for config in configs {
        config.validate()?;
    }
    info!(
        "sweeping {} configurations on {} threads",
        configs.len(),
        rayon::current_num_threads()
    );
    configs
        .par_iter()
        .map(|config| {
            run(config).map(|grid| SweepSample {
                config: config.clone(),
                grid,
            })
        })
        .collect()
}

/// Ordinary least-squares line `y = slope * x + intercept` with Pearson's r
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
}

impl LinearFit {
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return Err(DlaError::NotEnoughSamples(n));
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);
        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut syy = 0.0;
        let mut sxy = 0.0;
        for (&x, &y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }
        if sxx == 0.0 {
            return Err(DlaError::NotEnoughSamples(n));
        }

        let slope = sxy / sxx;
        let r = if syy == 0.0 { 0.0 } else { sxy / (sxx * syy).sqrt() };
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
            r,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}
