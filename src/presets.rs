use dla_lattice::{DlaError, Result, SimulationConfig, Topology};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A named simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub config: SimulationConfig,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, config: SimulationConfig) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            config,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-in presets plus whatever lives in the user config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Manager backed by a specific presets directory
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dla-lattice").join("presets"))
    }

    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path).map(|c| serde_json::from_str::<Preset>(&c)) {
                Ok(Ok(preset)) => self.user.push(preset),
                Ok(Err(e)) => log::warn!("skipping malformed preset {}: {}", path.display(), e),
                Err(e) => log::warn!("cannot read preset {}: {}", path.display(), e),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn preset_path(dir: &Path, name: &str) -> PathBuf {
        let filename = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();
        dir.join(format!("{}.json", filename))
    }

    fn require_dir(&self) -> Result<&Path> {
        self.dir.as_deref().ok_or_else(|| {
            DlaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine config directory",
            ))
        })
    }

    /// Save a preset to disk, replacing one with the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf> {
        preset.config.validate()?;
        let dir = self.require_dir()?;
        fs::create_dir_all(dir)?;

        let path = Self::preset_path(dir, &preset.name);
        fs::write(&path, serde_json::to_string_pretty(&preset)?)?;

        self.user.retain(|p| p.name != preset.name);
        self.user.push(preset);
        Ok(path)
    }

    /// Delete a user preset. Returns whether one existed.
    pub fn delete_preset(&mut self, name: &str) -> Result<bool> {
        let dir = self.require_dir()?;
        let path = Self::preset_path(dir, name);
        let existed = path.exists();
        if existed {
            fs::remove_file(&path)?;
        }
        let before = self.user.len();
        self.user.retain(|p| p.name != name);
        Ok(existed || self.user.len() != before)
    }

    /// All presets (builtin first, then user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name, user presets shadowing built-ins
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.user
            .iter()
            .chain(self.builtin.iter())
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "Default",
            "Small quick run: 15 particles on a 51x51 torus",
            SimulationConfig::default(),
        ),
        Preset::new(
            "Classic",
            "Large aggregate: 15000 particles on a 251x251 torus",
            SimulationConfig::new(251, 15000, 1.0),
        ),
        Preset::new(
            "Dense",
            "Low stickiness lets walkers creep inward for a compact core",
            SimulationConfig::new(101, 2000, 0.05),
        ),
        Preset::new(
            "Sweep",
            "Sample size used for stickiness sweeps",
            SimulationConfig::new(51, 300, 0.02),
        ),
        Preset::new(
            "Walled",
            "Edges block the walk instead of wrapping around",
            SimulationConfig {
                topology: Topology::Bounded,
                ..SimulationConfig::new(101, 2000, 1.0)
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_builtins_are_valid() {
        for preset in builtin_presets() {
            assert!(preset.config.validate().is_ok(), "{}", preset.name);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let manager = PresetManager::with_dir(None);
        let classic = manager.find("classic").unwrap();
        assert_eq!(classic.config.grid_size, 251);
        assert!(manager.find("nope").is_none());
    }

    #[test]
    fn test_save_load_and_delete() {
        let dir = tempdir().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let preset = Preset::new("My Run", "mine", SimulationConfig::new(31, 40, 0.4).with_seed(3));

        let path = manager.save_preset(preset.clone()).unwrap();
        assert_eq!(path.file_name().unwrap(), "My_Run.json");

        let reloaded = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert_eq!(reloaded.user, vec![preset]);
        assert_eq!(reloaded.find("my run").unwrap().config.seed, Some(3));

        assert!(manager.delete_preset("My Run").unwrap());
        assert!(!path.exists());
        assert!(!manager.delete_preset("My Run").unwrap());
    }

    #[test]
    fn test_user_preset_shadows_builtin() {
        let dir = tempdir().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        manager
            .save_preset(Preset::new("Classic", "smaller", SimulationConfig::new(61, 100, 1.0)))
            .unwrap();
        assert_eq!(manager.find("Classic").unwrap().config.grid_size, 61);
    }

    #[test]
    fn test_invalid_preset_is_not_saved() {
        let dir = tempdir().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        let bad = Preset::new("Bad", "", SimulationConfig::new(2, 1, 1.0));
        assert!(manager.save_preset(bad).is_err());
        assert!(manager.user.is_empty());
    }

    #[test]
    fn test_malformed_files_are_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert!(manager.user.is_empty());
    }
}
