//! # Run Configuration
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! input = "grains.vtk"
//! nodes_file = "grains.nodes"
//! triangles_file = "grains.tris"
//! pipelined = true
//! channel_capacity = 4
//!
//! [meshing]
//! anomaly_neighborhood = "in_plane"
//! ```

use std::path::{Path, PathBuf};

use grainmesh_core::{MeshError, MeshOptions, MeshResult};
use serde::{Deserialize, Serialize};

const fn default_pipelined() -> bool {
    true
}

const fn default_channel_capacity() -> usize {
    4
}

/// Everything one meshing run needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MesherConfig {
    /// Label volume (legacy VTK).
    pub input: PathBuf,
    /// Node record output.
    pub nodes_file: PathBuf,
    /// Triangle record output.
    pub triangles_file: PathBuf,
    /// Write records on a dedicated thread.
    #[serde(default = "default_pipelined")]
    pub pipelined: bool,
    /// Slices buffered between mesher and writer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Meshing knobs.
    #[serde(default)]
    pub meshing: MeshOptions,
}

impl MesherConfig {
    /// Builds a configuration with default options.
    pub fn new(
        input: impl Into<PathBuf>,
        nodes_file: impl Into<PathBuf>,
        triangles_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            nodes_file: nodes_file.into(),
            triangles_file: triangles_file.into(),
            pipelined: default_pipelined(),
            channel_capacity: default_channel_capacity(),
            meshing: MeshOptions::default(),
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidConfig`] for malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> MeshResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| MeshError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// [`MeshError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> MeshResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| MeshError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> MeshResult<()> {
        if self.channel_capacity == 0 {
            return Err(MeshError::InvalidConfig(
                "channel_capacity must be at least 1".into(),
            ));
        }
        if self.nodes_file == self.triangles_file {
            return Err(MeshError::InvalidConfig(format!(
                "nodes_file and triangles_file are both {}",
                self.nodes_file.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grainmesh_core::AnomalyNeighborhood;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let config = MesherConfig::from_toml_str(
            r#"
            input = "a.vtk"
            nodes_file = "a.nodes"
            triangles_file = "a.tris"
            "#,
        )
        .unwrap();
        assert!(config.pipelined);
        assert_eq!(config.channel_capacity, 4);
        assert_eq!(config.meshing.anomaly_neighborhood, AnomalyNeighborhood::Full);
        assert_eq!(config, MesherConfig::new("a.vtk", "a.nodes", "a.tris"));
    }

    #[test]
    fn test_meshing_table() {
        let config = MesherConfig::from_toml_str(
            r#"
            input = "a.vtk"
            nodes_file = "a.nodes"
            triangles_file = "a.tris"
            pipelined = false

            [meshing]
            anomaly_neighborhood = "in_plane"
            "#,
        )
        .unwrap();
        assert!(!config.pipelined);
        assert_eq!(
            config.meshing.anomaly_neighborhood,
            AnomalyNeighborhood::InPlane
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let missing = MesherConfig::from_toml_str("input = \"a.vtk\"");
        assert!(matches!(missing, Err(MeshError::InvalidConfig(_))));

        let zero = MesherConfig::from_toml_str(
            r#"
            input = "a.vtk"
            nodes_file = "a.nodes"
            triangles_file = "a.tris"
            channel_capacity = 0
            "#,
        );
        assert!(matches!(zero, Err(MeshError::InvalidConfig(_))));

        let same = MesherConfig::from_toml_str(
            r#"
            input = "a.vtk"
            nodes_file = "out"
            triangles_file = "out"
            "#,
        );
        assert!(matches!(same, Err(MeshError::InvalidConfig(_))));
    }
}
