use crate::app::App;
use crate::braille;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;
const ERROR_COLOR: Color = Color::Red;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Status
            Constraint::Length(8), // Parameters
            Constraint::Min(6),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2]);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" DLA Lattice ");
    let sim = &app.simulation;
    let summary = sim.summary();

    let progress = sim.progress();
    let progress_width = (area.width.saturating_sub(4)) as usize;
    let filled = (progress * progress_width as f64) as usize;
    let empty = progress_width.saturating_sub(filled);

    let (status_text, status_color) = if app.error.is_some() {
        ("STOPPED", ERROR_COLOR)
    } else if app.paused {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else if app.is_complete() {
        ("COMPLETE", Color::Green)
    } else {
        ("RUNNING", BORDER_COLOR)
    };

    let mut content = vec![
        Line::from(Span::styled(
            format!("{} / {}", sim.released(), sim.config().particle_count),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(vec![
            Span::styled("█".repeat(filled), Style::default().fg(Color::Green)),
            Span::styled("░".repeat(empty), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(
            format!("stuck {}  lost {}", summary.stuck, summary.abandoned),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
    ];
    if let Some(err) = &app.error {
        content.push(Line::from(Span::styled(err.as_str(), Style::default().fg(ERROR_COLOR))));
    }

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");
    let config = app.simulation.config();

    let make_line = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<8}", label), Style::default().fg(DIM_TEXT_COLOR)),
            Span::styled(value, Style::default().fg(TEXT_COLOR)),
        ])
    };

    let seed = config
        .seed
        .map(|s| s.to_string())
        .unwrap_or_else(|| "random".to_string());

    let content = vec![
        make_line("Grid", format!("{0}x{0}", config.grid_size)),
        make_line("Sticky", format!("{:.2}", config.stickiness)),
        make_line("Edges", config.topology.name().to_string()),
        make_line("Seed", seed),
        make_line("Speed", format!("{}", app.steps_per_frame)),
        make_line(
            "Cap",
            config
                .max_walk_steps
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string()),
        ),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume"),
        make_control("R", "reset, new seed"),
        make_control("+/-", "speed"),
        make_control("S/D", "stickiness"),
        make_control("T", "toggle edges"),
        make_control("V", "fullscreen"),
        make_control("H/?", "help"),
        make_control("Q", "quit"),
    ];

    let paragraph = Paragraph::new(content).block(styled_block(" Controls "));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(
        app.simulation.grid(),
        app.simulation.last_stuck(),
        inner.width,
        inner.height,
    );

    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            let cell_rect = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            let span = Span::styled(cell.char.to_string(), Style::default().fg(cell.color));
            frame.render_widget(Paragraph::new(Line::from(span)), cell_rect);
        }
    }
}

/// Centered help dialog inside the canvas (the sidebar is skipped unless fullscreen)
fn help_area(area: Rect, fullscreen: bool) -> Rect {
    let canvas_x = if fullscreen { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if fullscreen {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    }
}

fn help_lines() -> Vec<Line<'static>> {
    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(HIGHLIGHT_COLOR)));

    vec![
        Line::from(""),
        Line::from(Span::styled("DIFFUSION-LIMITED AGGREGATION", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("One walker at a time starts on the grid edge and steps between free neighboring cells. Next to the aggregate it sticks with probability equal to the stickiness; boxed in, it sticks anyway."),
        Line::from(""),
        heading("STICKINESS (S/D):"),
        Line::from("Near 1 grows thin branches. Near 0 lets walkers creep inward for a denser core. Walkers that wander too long are dropped and counted as lost."),
        Line::from(""),
        heading("EDGES (T):"),
        Line::from("Torus wraps walkers across opposite edges. Bounded treats the border as a wall."),
        Line::from(""),
        heading("RESET (R):"),
        Line::from("Starts over with a fresh seed, shown in the sidebar so the run can be replayed with --seed."),
        Line::from(""),
        heading("BASIC CONTROLS:"),
        Line::from("Space=Pause, +/-=Speed, V=Fullscreen, J/K=Scroll help, Q=Quit"),
        Line::from(""),
    ]
}

/// Rows the help body occupies once wrapped to `width` columns
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = (width as usize).max(1);
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1) as u16)
        .sum()
}

/// Furthest the help body can scroll in a terminal of this size
pub fn help_max_scroll(area: Rect, fullscreen: bool) -> u16 {
    let help = help_area(area, fullscreen);
    let inner_width = help.width.saturating_sub(2);
    let visible_height = help.height.saturating_sub(2);
    wrapped_height(&help_lines(), inner_width).saturating_sub(visible_height)
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let help_area = help_area(area, app.fullscreen_mode);
    frame.render_widget(Clear, help_area);

    let is_scrollable = help_max_scroll(area, app.fullscreen_mode) > 0;
    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(help_lines())
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
