use directories::ProjectDirs;
use std::path::PathBuf;

const APP: &str = "chatterbox";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP))
        } else {
            ProjectDirs::from("", "", APP).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sessions.db"))
    }

    /// Where logs go while the terminal UI owns the screen.
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("chatterbox.log"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("chatterbox_config.json"))
    }
}
