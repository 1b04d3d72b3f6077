use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "glance") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("glance_config.json")
        }
    }

    /// Default log file, used by `--log`
    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("glance");
            Some(state_dir.join("glance.log"))
        } else {
            ProjectDirs::from("", "", "glance")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("glance.log"))
        }
    }
}
