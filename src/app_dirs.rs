use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "whack") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("whack_config.json")
        }
    }

    pub fn best_score_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("whack")
                .join("best_score.json")
        } else if let Some(pd) = ProjectDirs::from("", "", "whack") {
            pd.data_local_dir().join("best_score.json")
        } else {
            PathBuf::from("whack_best_score.json")
        }
    }
}
