use thiserror::Error;

/// Errors produced by the engine and the grid collaborators
#[derive(Debug, Error)]
pub enum DlaError {
    #[error("grid size must be at least 3, got {0}")]
    GridTooSmall(usize),

    #[error("stickiness must be within [0, 1], got {0}")]
    StickinessOutOfRange(f64),

    #[error("{particles} particles do not fit a {size}x{size} grid next to the seed")]
    TooManyParticles { particles: usize, size: usize },

    #[error("max walk steps must be positive when set")]
    ZeroMaxWalkSteps,

    #[error("every edge cell is occupied; {placed} particles were placed before spawning stalled")]
    EdgeSaturated { placed: usize },

    #[error("grid is {rows}x{cols}, expected a square grid")]
    NotSquare { rows: usize, cols: usize },

    #[error("window size {window} is invalid for a grid of size {size} (must be odd and within the grid)")]
    InvalidWindow { window: usize, size: usize },

    #[error("at least two samples with non-constant features are needed, got {0}")]
    NotEnoughSamples(usize),

    #[error("{side} pixel frames exceed the GIF limit of 65535")]
    FrameTooLarge { side: u64 },

    #[error("malformed npy file: {0}")]
    Npy(String),

    #[error("unsupported grid file extension: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Gif(#[from] gif::EncodingError),
}

pub type Result<T> = std::result::Result<T, DlaError>;
