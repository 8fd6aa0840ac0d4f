use dla_lattice::{Result, SimulationConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Engine parameters
    pub simulation: SimulationConfig,
    /// Pixels per cell for PNG/GIF output
    #[serde(default = "default_render_scale")]
    pub render_scale: u32,
    /// Particles released per frame in the viewer
    #[serde(default = "default_steps_per_frame")]
    pub steps_per_frame: usize,
}

fn default_render_scale() -> u32 {
    4
}

fn default_steps_per_frame() -> usize {
    5
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            simulation: SimulationConfig::default(),
            render_scale: default_render_scale(),
            steps_per_frame: default_steps_per_frame(),
        }
    }
}
