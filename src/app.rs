use dla_lattice::{Result, Simulation, SimulationConfig};

const MAX_STEPS_PER_FRAME: usize = 500;

/// Moves after which the viewer abandons a walker when no cap is configured.
/// Keeps a frame bounded even at zero stickiness.
pub const VIEWER_WALK_CAP: u64 = 50_000;

/// Main application state
pub struct App {
    pub simulation: Simulation,
    pub steps_per_frame: usize,
    pub paused: bool,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    /// Set when the engine stops with an error; the viewer pauses and shows it
    pub error: Option<String>,
}

impl App {
    pub fn new(mut config: SimulationConfig, steps_per_frame: usize) -> Result<Self> {
        config.max_walk_steps.get_or_insert(VIEWER_WALK_CAP);
        Ok(Self {
            simulation: Simulation::new(config)?,
            steps_per_frame: steps_per_frame.clamp(1, MAX_STEPS_PER_FRAME),
            paused: false,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            error: None,
        })
    }

    /// Release this frame's particles
    pub fn tick(&mut self) {
        if self.paused || self.error.is_some() {
            return;
        }
        for _ in 0..self.steps_per_frame {
            match self.simulation.step() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    self.error = Some(e.to_string());
                    break;
                }
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.simulation.is_complete()
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Start over with a fresh random seed
    pub fn reset(&mut self) {
        self.simulation.reset(Some(rand::random()));
        self.error = None;
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Increase simulation speed
    pub fn increase_speed(&mut self) {
        let step = (self.steps_per_frame / 10).max(1);
        self.steps_per_frame = (self.steps_per_frame + step).min(MAX_STEPS_PER_FRAME);
    }

    /// Decrease simulation speed
    pub fn decrease_speed(&mut self) {
        let step = (self.steps_per_frame / 10).max(1);
        self.steps_per_frame = self.steps_per_frame.saturating_sub(step).max(1);
    }

    pub fn adjust_stickiness(&mut self, delta: f64) {
        self.simulation.adjust_stickiness(delta);
    }

    pub fn toggle_topology(&mut self) {
        self.simulation.toggle_topology();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(particles: usize, speed: usize) -> App {
        App::new(SimulationConfig::new(21, particles, 1.0).with_seed(1), speed).unwrap()
    }

    #[test]
    fn test_tick_releases_steps_per_frame() {
        let mut app = app(10, 3);
        app.tick();
        assert_eq!(app.simulation.released(), 3);
        app.toggle_pause();
        app.tick();
        assert_eq!(app.simulation.released(), 3);
        app.toggle_pause();
        for _ in 0..10 {
            app.tick();
        }
        assert!(app.is_complete());
        assert_eq!(app.simulation.grid().occupied_count(), 11);
    }

    #[test]
    fn test_reset_starts_over() {
        let mut app = app(10, 10);
        app.tick();
        assert!(app.is_complete());
        app.reset();
        assert_eq!(app.simulation.released(), 0);
        assert_eq!(app.simulation.grid().occupied_count(), 1);
        assert!(app.simulation.config().seed.is_some());
    }

    #[test]
    fn test_speed_bounds() {
        let mut app = app(1, 1);
        app.decrease_speed();
        assert_eq!(app.steps_per_frame, 1);
        for _ in 0..200 {
            app.increase_speed();
        }
        assert_eq!(app.steps_per_frame, MAX_STEPS_PER_FRAME);
    }

    #[test]
    fn test_error_halts_until_reset() {
        let mut app = app(10, 2);
        app.error = Some("edge saturated".into());
        app.tick();
        assert_eq!(app.simulation.released(), 0);

        app.reset();
        assert!(app.error.is_none());
        app.tick();
        assert_eq!(app.simulation.released(), 2);
    }

    #[test]
    fn test_zero_stickiness_frame_finishes() {
        let mut app = app(5, 2);
        assert_eq!(app.simulation.config().max_walk_steps, Some(VIEWER_WALK_CAP));
        app.adjust_stickiness(-1.0);
        assert_eq!(app.simulation.config().stickiness, 0.0);

        app.tick();
        assert_eq!(app.simulation.released(), 2);
        assert_eq!(app.simulation.summary().abandoned, 2);
        assert_eq!(app.simulation.grid().occupied_count(), 1);
        assert!(app.error.is_none());
    }

    #[test]
    fn test_configured_cap_is_kept() {
        let config = SimulationConfig {
            max_walk_steps: Some(10),
            ..SimulationConfig::new(21, 3, 0.0).with_seed(4)
        };
        let mut app = App::new(config, 3).unwrap();
        assert_eq!(app.simulation.config().max_walk_steps, Some(10));
        app.tick();
        assert!(app.is_complete());
        assert_eq!(app.simulation.summary().total_steps, 30);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(App::new(SimulationConfig::new(3, 9, 1.0), 1).is_err());
    }

    #[test]
    fn test_help_scroll() {
        let mut app = app(1, 1);
        app.toggle_help();
        assert!(app.show_help);
        app.scroll_help_down(2);
        app.scroll_help_down(2);
        app.scroll_help_down(2);
        assert_eq!(app.help_scroll, 2);
        app.scroll_help_up();
        assert_eq!(app.help_scroll, 1);
        app.toggle_help();
        app.toggle_help();
        assert_eq!(app.help_scroll, 0);
    }
}
