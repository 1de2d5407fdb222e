use crate::error::{CliError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;
use vscreen::docking::DockingParams;
use vscreen::scoring::ScorerRegistry;

/// Environment variable pointing at the data directory.
pub const DATA_DIR_ENV_VAR: &str = "VSCREEN_DATA_DIR";

/// Locates the directory holding installed scoring functions.
#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    /// Picks the first of: command line, environment, config file, platform default.
    pub fn new(cli: Option<&Path>, env: Option<&str>, file: Option<&Path>) -> Result<Self> {
        let env = env.map(str::trim).filter(|v| !v.is_empty()).map(PathBuf::from);
        let path = match cli.map(Path::to_path_buf).or(env).or(file.map(Path::to_path_buf)) {
            Some(path) => path,
            None => Self::get_default_data_path()?,
        };
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn with_custom_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
        }
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    /// Registry of built-in scorers; `autodock_vina` rescoring uses `vina`.
    pub fn scorer_registry(&self, vina: DockingParams) -> ScorerRegistry {
        ScorerRegistry::new(&self.base_path).with_vina_params(vina)
    }

    fn get_default_data_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "vscreen", "vscreen")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CliError::Config("Could not determine default data directory path.".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_wins_over_environment_and_file() {
        let manager = DataManager::new(
            Some(Path::new("/cli")),
            Some("/env"),
            Some(Path::new("/file")),
        )
        .unwrap();
        assert_eq!(manager.get_data_path(), Path::new("/cli"));
    }

    #[test]
    fn environment_wins_over_file() {
        let manager = DataManager::new(None, Some("/env"), Some(Path::new("/file"))).unwrap();
        assert_eq!(manager.get_data_path(), Path::new("/env"));

        let manager = DataManager::new(None, Some("  "), Some(Path::new("/file"))).unwrap();
        assert_eq!(manager.get_data_path(), Path::new("/file"));
    }

    #[test]
    fn registry_resolves_below_the_data_path() {
        let manager = DataManager::with_custom_path("/data");
        let registry = manager.scorer_registry(DockingParams::default());
        assert_eq!(registry.scoring_dir(), Path::new("/data/scoring"));
    }
}
