//! Explicit batch configuration
//!
//! Everything a batch run needs is carried here; the driver never consults
//! the working directory or the environment.
//!
//! ```toml
//! source_dir = "/data/crania/VTK Files"
//! dest_path = "/data/results/Mesh_centroid_sizes.csv"
//! extension_filter = "vtk"
//! on_empty_mesh = "skip"
//! precision = 6
//! ```

use morphocrate_algorithms::EmptyMeshPolicy;
use morphocrate_core::{Error, Result};
use morphocrate_io::TableWriteOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Highest number of decimals the table may be written with
pub const MAX_PRECISION: usize = 17;

/// Configuration of one centroid-size batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Directory scanned for mesh files (not recursive)
    pub source_dir: PathBuf,
    /// Path of the result table
    pub dest_path: PathBuf,
    /// File-name suffix selecting meshes, with or without the leading dot
    pub extension_filter: String,
    /// Handling of meshes without points or that fail to read
    pub on_empty_mesh: EmptyMeshPolicy,
    /// Decimal places of the centroid size column
    pub precision: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            dest_path: PathBuf::new(),
            extension_filter: "vtk".to_string(),
            on_empty_mesh: EmptyMeshPolicy::Skip,
            precision: 6,
        }
    }
}

impl BatchConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(source_dir: P, dest_path: Q) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_path: dest_path.into(),
            ..Self::default()
        }
    }

    pub fn with_extension_filter<S: Into<String>>(mut self, extension: S) -> Self {
        self.extension_filter = extension.into();
        self
    }

    pub fn with_policy(mut self, policy: EmptyMeshPolicy) -> Self {
        self.on_empty_mesh = policy;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Parse a configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Check the configuration before any file is touched
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(Error::Config("source_dir is not set".to_string()));
        }
        if !self.source_dir.is_dir() {
            return Err(Error::Config(format!(
                "source_dir {} is not a directory",
                self.source_dir.display()
            )));
        }
        if self.dest_path.file_name().is_none() {
            return Err(Error::Config("dest_path must name a file".to_string()));
        }
        if let Some(parent) = self.dest_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(Error::Config(format!(
                    "directory of dest_path {} does not exist",
                    self.dest_path.display()
                )));
            }
        }
        if self.extension_filter.trim().trim_start_matches('.').is_empty() {
            return Err(Error::Config("extension_filter must not be empty".to_string()));
        }
        if self.precision > MAX_PRECISION {
            return Err(Error::Config(format!(
                "precision {} exceeds the maximum of {}",
                self.precision, MAX_PRECISION
            )));
        }
        Ok(())
    }

    /// Table options matching this configuration
    pub fn table_options(&self) -> TableWriteOptions {
        TableWriteOptions::new().with_precision(self.precision)
    }
}
