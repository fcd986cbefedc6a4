// dataset.rs — local cinema dataset directories and config resolution

use cinema_thumbnail::{ConfigError, ImageGrid, ImageKey, RollPolicy, ViewerConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("invalid configuration for {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Settings given on the command line. They win over every config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub angle_step: Option<u32>,
    pub rotation_factor: Option<f64>,
    pub roll_policy: Option<RollPolicy>,
}

impl Overrides {
    /// defaults -> `<dataset>/thumbnail.json` -> `--config` file -> flags
    pub fn resolve(&self, dataset: Option<&Path>) -> Result<ViewerConfig, DatasetError> {
        let mut config = ViewerConfig::default();

        if let Some(dir) = dataset {
            if let Some(found) = ViewerConfig::load_for_dataset(dir).map_err(|source| {
                DatasetError::Config {
                    path: dir.to_path_buf(),
                    source,
                }
            })? {
                config = found;
            }
        }

        if let Some(path) = &self.config_file {
            config = ViewerConfig::load(path).map_err(|source| DatasetError::Config {
                path: path.clone(),
                source,
            })?;
        }

        if let Some(angle_step) = self.angle_step {
            config.angle_step = angle_step;
        }
        if let Some(rotation_factor) = self.rotation_factor {
            config.rotation_factor = rotation_factor;
        }
        if let Some(roll_policy) = self.roll_policy {
            config.roll_policy = roll_policy;
        }

        config.validate().map_err(|source| DatasetError::Config {
            path: PathBuf::from("command line"),
            source,
        })?;
        Ok(config)
    }
}

pub struct Dataset {
    pub dir: PathBuf,
    pub config: ViewerConfig,
    pub missing: Vec<ImageKey>,
}

impl Dataset {
    pub fn open(dir: &Path, overrides: &Overrides) -> Result<Self, DatasetError> {
        if !dir.is_dir() {
            return Err(DatasetError::NotADirectory(dir.to_path_buf()));
        }
        let config = overrides.resolve(Some(dir))?;
        let grid = ImageGrid::new(config.angle_step);
        let missing = grid.missing(dir);

        log::info!(
            "opened dataset {} (step {} deg, {} images expected)",
            dir.display(),
            config.angle_step,
            grid.len()
        );
        if !missing.is_empty() {
            log::warn!(
                "{} of {} images missing in {}, first: {}",
                missing.len(),
                grid.len(),
                dir.display(),
                missing[0].file_name()
            );
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            missing,
        })
    }

    /// Base path handed to the thumbnail; image paths are `<dir>/<theta>_<phi>.jpg`.
    pub fn basepath(&self) -> String {
        self.dir
            .to_string_lossy()
            .trim_end_matches(|c: char| c == '/' || c == '\\')
            .to_owned()
    }

    pub fn name(&self) -> String {
        self.dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.dir.display().to_string())
    }
}
