mod app;
mod braille;
mod config;
mod presets;
mod ui;

use anyhow::{bail, Context};
use app::App;
use clap::{Args as ClapArgs, Parser, Subcommand};
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dla_lattice::{
    export, features,
    render::{self, GrowthRecorder},
    simulation::run_with_summary,
    sweep::{self, LinearFit},
    Simulation, SimulationConfig, Topology,
};
use log::info;
use presets::{Preset, PresetManager};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const STICKINESS_STEP: f64 = 0.05;

#[derive(Parser, Debug)]
#[command(name = "dla-lattice")]
#[command(about = "Diffusion-limited aggregation on a square lattice")]
struct Args {
    #[command(flatten)]
    sim: SimArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Engine parameters shared by every subcommand. Each flag overrides the
/// value from `--config` and `--preset`.
#[derive(ClapArgs, Debug, Clone, Default)]
struct SimArgs {
    /// Grid side length M (at least 3)
    #[arg(short = 'm', long = "grid-size", global = true)]
    grid_size: Option<usize>,

    /// Number of walkers to release
    #[arg(short = 'p', long, global = true)]
    particles: Option<usize>,

    /// Probability of sticking on contact (0.0-1.0)
    #[arg(short = 's', long, global = true)]
    stickiness: Option<f64>,

    /// RNG seed for a reproducible run
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Treat the grid edge as a wall instead of wrapping around
    #[arg(long, global = true)]
    bounded: bool,

    /// Abandon a walker after this many moves
    #[arg(long = "max-steps", global = true)]
    max_steps: Option<u64>,

    /// Start from a named preset
    #[arg(long, global = true)]
    preset: Option<String>,

    /// Load settings from a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one simulation and write the grid
    Run {
        /// Grid output (.npy or .json); defaults to M_<M>_NP_<N>_ST_<p>.npy
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also write a PNG of the final grid
        #[arg(long)]
        png: Option<PathBuf>,

        /// Also write an animated GIF of the growth
        #[arg(long)]
        gif: Option<PathBuf>,

        /// Particles between GIF frames
        #[arg(long = "gif-every", default_value = "10")]
        gif_every: usize,

        /// Pixels per cell for PNG/GIF output
        #[arg(long)]
        scale: Option<u32>,

        /// Write the resolved settings to this JSON file
        #[arg(long = "save-config")]
        save_config: Option<PathBuf>,
    },

    /// Watch the aggregate grow in the terminal
    Watch {
        /// Particles released per frame
        #[arg(long)]
        speed: Option<usize>,
    },

    /// Run a stickiness sweep and fit central density against stickiness
    Sweep {
        #[arg(long, default_value = "0.001")]
        from: f64,

        #[arg(long, default_value = "0.05")]
        to: f64,

        /// Number of stickiness values
        #[arg(long, default_value = "51")]
        samples: usize,

        /// Side of the central density window (odd)
        #[arg(short, long, default_value = "7")]
        window: usize,

        /// Save every grid as .npy into this directory
        #[arg(long = "out-dir")]
        out_dir: Option<PathBuf>,
    },

    /// Central density of saved grids
    Features {
        /// Grid files (.npy or .json)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Side of the central density window (odd)
        #[arg(short, long, default_value = "7")]
        window: usize,
    },

    /// Manage presets
    Presets {
        #[command(subcommand)]
        action: PresetAction,
    },
}

#[derive(Subcommand, Debug)]
enum PresetAction {
    /// List built-in and user presets
    List,
    /// Save the current settings as a user preset
    Save {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a user preset
    Delete { name: String },
}

/// Layer config file, preset and flags into one `AppConfig`
fn resolve_config(args: &SimArgs, presets: &PresetManager) -> anyhow::Result<AppConfig> {
    let mut app_config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        let Some(preset) = presets.find(name) else {
            bail!("unknown preset '{}' (see `dla-lattice presets list`)", name);
        };
        app_config.simulation = preset.config.clone();
    }

    let sim = &mut app_config.simulation;
    if let Some(m) = args.grid_size {
        sim.grid_size = m;
    }
    if let Some(n) = args.particles {
        sim.particle_count = n;
    }
    if let Some(p) = args.stickiness {
        sim.stickiness = p;
    }
    if args.seed.is_some() {
        sim.seed = args.seed;
    }
    if args.bounded {
        sim.topology = Topology::Bounded;
    }
    if args.max_steps.is_some() {
        sim.max_walk_steps = args.max_steps;
    }

    sim.validate().context("invalid simulation settings")?;
    Ok(app_config)
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Watch { speed: None });

    if !matches!(command, Command::Watch { .. }) {
        init_logging();
    }

    let mut presets = PresetManager::new();
    let app_config = resolve_config(&args.sim, &presets)?;

    match command {
        Command::Run {
            out,
            png,
            gif,
            gif_every,
            scale,
            save_config,
        } => cmd_run(&app_config, out, png, gif, gif_every, scale, save_config),
        Command::Watch { speed } => cmd_watch(&app_config, speed),
        Command::Sweep {
            from,
            to,
            samples,
            window,
            out_dir,
        } => cmd_sweep(&app_config.simulation, from, to, samples, window, out_dir.as_deref()),
        Command::Features { files, window } => cmd_features(&files, window),
        Command::Presets { action } => cmd_presets(&mut presets, action, &app_config.simulation),
    }
}

fn cmd_run(
    app_config: &AppConfig,
    out: Option<PathBuf>,
    png: Option<PathBuf>,
    gif: Option<PathBuf>,
    gif_every: usize,
    scale: Option<u32>,
    save_config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = &app_config.simulation;
    let scale = scale.unwrap_or(app_config.render_scale);

    let grid = match &gif {
        Some(path) => {
            let mut sim = Simulation::new(config.clone())?;
            let mut recorder = GrowthRecorder::new(gif_every);
            recorder.observe(0, sim.grid());
            while sim.step()?.is_some() {
                recorder.observe(sim.released(), sim.grid());
            }
            recorder.finish(sim.grid());
            recorder
                .save_gif(path, scale, 10)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {} frames to {}", recorder.frames().len(), path.display());
            let summary = sim.summary();
            info!("done: {} stuck, {} abandoned", summary.stuck, summary.abandoned);
            sim.into_grid()
        }
        None => run_with_summary(config)?.0,
    };

    let out = out.unwrap_or_else(|| PathBuf::from(format!("{}.npy", config.file_stem())));
    export::save_grid(&grid, &out).with_context(|| format!("writing {}", out.display()))?;
    info!("wrote grid to {}", out.display());

    if let Some(path) = png {
        render::save_png(&grid, &path, scale).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote image to {}", path.display());
    }

    if let Some(path) = save_config {
        app_config
            .save_to_file(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote config to {}", path.display());
    }

    Ok(())
}

fn cmd_sweep(
    base: &SimulationConfig,
    from: f64,
    to: f64,
    samples: usize,
    window: usize,
    out_dir: Option<&Path>,
) -> anyhow::Result<()> {
    features::central_window(base.grid_size, window)?;

    let configs = sweep::sweep_configs(base, &sweep::linspace(from, to, samples));
    let results = sweep::run_sweep(&configs)?;

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for sample in &results {
            let path = dir.join(format!("{}.npy", sample.config.file_stem()));
            export::save_npy(&sample.grid, &path).with_context(|| format!("writing {}", path.display()))?;
        }
        info!("saved {} grids to {}", results.len(), dir.display());
    }

    let xs: Vec<f64> = results.iter().map(|s| s.config.stickiness).collect();
    let grids: Vec<_> = results.into_iter().map(|s| s.grid).collect();
    let ys = features::central_density_batch(&grids, window)?;
    let fit = LinearFit::fit(&xs, &ys)?;

    println!("stickiness\tdensity\tfitted");
    for (&x, &y) in xs.iter().zip(&ys) {
        println!("{:.5}\t{:.5}\t{:.5}", x, y, fit.predict(x));
    }
    println!(
        "density = {:.5} * stickiness + {:.5}  (r = {:.4})",
        fit.slope, fit.intercept, fit.r
    );
    Ok(())
}

fn cmd_features(files: &[PathBuf], window: usize) -> anyhow::Result<()> {
    let grids = files
        .iter()
        .map(|path| export::load_grid(path).with_context(|| format!("reading {}", path.display())))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let densities = features::central_density_batch(&grids, window)?;
    for (path, density) in files.iter().zip(densities) {
        println!("{}\t{:.5}", path.display(), density);
    }
    Ok(())
}

fn cmd_presets(
    presets: &mut PresetManager,
    action: PresetAction,
    current: &SimulationConfig,
) -> anyhow::Result<()> {
    match action {
        PresetAction::List => {
            for preset in presets.all_presets() {
                let c = &preset.config;
                println!(
                    "{:<12} M={:<4} N={:<6} p={:<5} {:<8} {}",
                    preset.name,
                    c.grid_size,
                    c.particle_count,
                    c.stickiness,
                    c.topology.name(),
                    preset.description
                );
            }
        }
        PresetAction::Save { name, description } => {
            let path = presets.save_preset(Preset::new(name, description, current.clone()))?;
            info!("saved preset to {}", path.display());
        }
        PresetAction::Delete { name } => {
            if !presets.delete_preset(&name)? {
                bail!("no user preset named '{}'", name);
            }
            info!("deleted preset '{}'", name);
        }
    }
    Ok(())
}

fn cmd_watch(app_config: &AppConfig, speed: Option<usize>) -> anyhow::Result<()> {
    let mut app = App::new(
        app_config.simulation.clone(),
        speed.unwrap_or(app_config.steps_per_frame),
    )?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    if let Some(err) = app.error {
        eprintln!("stopped: {}", err);
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                // Only process Press events
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                    KeyCode::Char(' ') => app.toggle_pause(),
                    KeyCode::Char('r') | KeyCode::Char('R') => app.reset(),
                    KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                    KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                    KeyCode::Char('+') | KeyCode::Char('=') => app.increase_speed(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.decrease_speed(),
                    KeyCode::Char('s') | KeyCode::Char('S') => app.adjust_stickiness(STICKINESS_STEP),
                    KeyCode::Char('d') | KeyCode::Char('D') => app.adjust_stickiness(-STICKINESS_STEP),
                    KeyCode::Char('t') | KeyCode::Char('T') => app.toggle_topology(),
                    KeyCode::Esc if app.show_help => app.toggle_help(),
                    KeyCode::Char('j') | KeyCode::Char('J') | KeyCode::Down if app.show_help => {
                        let size = terminal.size()?;
                        let area = ratatui::layout::Rect::new(0, 0, size.width, size.height);
                        app.scroll_help_down(ui::help_max_scroll(area, app.fullscreen_mode))
                    }
                    KeyCode::Char('k') | KeyCode::Char('K') | KeyCode::Up if app.show_help => {
                        app.scroll_help_up()
                    }
                    _ => {}
                }
            }
        }

        app.tick();
    }
}
