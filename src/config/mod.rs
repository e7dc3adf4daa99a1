use crate::core::feature::TakeoffSite;
use geo::Coord;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn default_feature_buffer() -> f64 {
    3.0
}

fn default_path_buffer() -> f64 {
    10.0
}

fn default_time_limit() -> u64 {
    30
}

fn default_point_id_field() -> String {
    "point_id".into()
}

/// Tuning for one planning run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_feature_buffer", alias = "buffer_feature")]
    pub feature_buffer: f64,
    #[serde(default = "default_path_buffer", alias = "buffer_path")]
    pub path_buffer: f64,
    #[serde(default = "default_time_limit")]
    pub solver_time_limit_secs: u64,
    #[serde(default = "default_point_id_field")]
    pub point_id_field: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            feature_buffer: default_feature_buffer(),
            path_buffer: default_path_buffer(),
            solver_time_limit_secs: default_time_limit(),
            point_id_field: default_point_id_field(),
        }
    }
}

impl PlannerConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.solver_time_limit_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("feature_buffer", self.feature_buffer), ("path_buffer", self.path_buffer)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.solver_time_limit_secs == 0 {
            return Err(ConfigError::Invalid("solver_time_limit_secs must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MissionConfig {
    pub features_path: PathBuf,
    pub dsm_path: PathBuf,
    #[serde(default)]
    pub aoi_path: Option<PathBuf>,
    #[serde(default)]
    pub aoi_index: Option<usize>,
    #[serde(default)]
    pub aoi_qualifier: Option<String>,
    /// `(x, y)` when projected, otherwise `(lat, lon)` in WGS84.
    #[serde(default)]
    pub takeoff_coords: Option<[f64; 2]>,
    #[serde(default)]
    pub takeoff_coords_projected: bool,
    #[serde(default)]
    pub output_folder: Option<PathBuf>,
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(flatten)]
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub name: String,
    pub dir: PathBuf,
    pub csv: PathBuf,
    pub gpkg: PathBuf,
}

fn naming_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9a-z]{2,16}_(centroids|points|polygons)(\d{0,2})$").expect("valid regex")
    })
}

impl MissionConfig {
    pub fn new(features_path: impl Into<PathBuf>, dsm_path: impl Into<PathBuf>) -> Self {
        Self {
            features_path: features_path.into(),
            dsm_path: dsm_path.into(),
            aoi_path: None,
            aoi_index: None,
            aoi_qualifier: None,
            takeoff_coords: None,
            takeoff_coords_projected: false,
            output_folder: None,
            output_filename: None,
            planner: PlannerConfig::default(),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg.into())) };

        if (self.aoi_index.is_some() || self.aoi_qualifier.is_some()) && self.aoi_path.is_none() {
            return invalid("aoi_path must be provided when aoi_index or aoi_qualifier is specified");
        }
        if self.aoi_index.is_some() && self.aoi_qualifier.is_none() {
            return invalid("aoi_index requires aoi_qualifier to be specified");
        }
        if self.aoi_qualifier.is_some() && self.aoi_index.is_none() {
            return invalid("aoi_qualifier requires aoi_index to be specified");
        }
        if self.aoi_index == Some(0) {
            return invalid("aoi_index is 1-based and must be at least 1");
        }
        if self.takeoff_coords_projected && self.takeoff_coords.is_none() {
            return invalid("takeoff_coords must be provided when takeoff_coords_projected is true");
        }
        self.planner.validate()
    }

    pub fn takeoff(&self) -> Option<TakeoffSite> {
        self.takeoff_coords.map(|[a, b]| {
            if self.takeoff_coords_projected {
                TakeoffSite::Projected(Coord { x: a, y: b })
            } else {
                TakeoffSite::Geographic { lat: a, lon: b }
            }
        })
    }

    pub fn output_paths(&self) -> Result<OutputPaths, ConfigError> {
        let folder = match &self.output_folder {
            Some(folder) => folder.clone(),
            None => self
                .features_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        };

        let name = match &self.output_filename {
            Some(name) => name.clone(),
            None => self.derived_name()?,
        };

        let dir = folder.join(&name);
        Ok(OutputPaths {
            csv: dir.join(format!("{name}.csv")),
            gpkg: dir.join(format!("{name}.gpkg")),
            dir,
            name,
        })
    }

    /// `{site}_wpt{qualifier}{version}` from a `{site}_{kind}{version}` features file name.
    fn derived_name(&self) -> Result<String, ConfigError> {
        let stem = self
            .features_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let captures = naming_pattern().captures(stem).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "Input filename '{stem}' does not match the required pattern \
                 (drone_site)_(centroids|points|polygons)[version], regex {}. \
                 Set output_filename to bypass the naming rule.",
                naming_pattern().as_str()
            ))
        })?;

        let site = stem.split('_').next().unwrap_or_default();
        let mut name = format!("{site}_wpt");
        if self.aoi_path.is_some() {
            if let Some(q) = &self.aoi_qualifier {
                name.push_str(q);
            }
        }
        if let Some(version) = captures.get(2) {
            name.push_str(version.as_str());
        }
        Ok(name)
    }
}
