use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::engine::{PlaybackConfig, DEFAULT_WPM_STEP};

/// Reading settings remembered between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub start_wpm: u32,
    pub increment: u32,
    pub interval_secs: u32,
    /// WPM change applied by the speed up / slow down keys
    pub wpm_step: u32,
    /// Last bundled passage read
    pub passage: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let playback = PlaybackConfig::default();
        Self {
            start_wpm: playback.start_wpm,
            increment: playback.increment,
            interval_secs: playback.interval_secs,
            wpm_step: DEFAULT_WPM_STEP,
            passage: None,
        }
    }
}

impl Config {
    pub fn playback(&self) -> PlaybackConfig {
        PlaybackConfig {
            start_wpm: self.start_wpm,
            increment: self.increment,
            interval_secs: self.interval_secs,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("ignoring unreadable config {}: {}", self.path.display(), e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
