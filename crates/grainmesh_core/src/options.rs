//! # Meshing Options
//!
//! Knobs that change the extracted mesh. Deserialized from the `[meshing]`
//! table of the run configuration.

use serde::{Deserialize, Serialize};

use crate::neighbors::{IN_PLANE_COUNT, NEIGHBOR_COUNT};

/// Neighbourhood used to score corners of an ambiguous square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyNeighborhood {
    /// All 26 neighbours.
    #[default]
    Full,
    /// Only the 8 neighbours in the corner's own plane.
    InPlane,
}

impl AnomalyNeighborhood {
    /// Number of leading neighbour-table entries to inspect.
    #[inline]
    #[must_use]
    pub const fn neighbor_count(self) -> usize {
        match self {
            Self::Full => NEIGHBOR_COUNT,
            Self::InPlane => IN_PLANE_COUNT,
        }
    }
}

/// Options for one meshing run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    /// How checkerboard squares are scored.
    pub anomaly_neighborhood: AnomalyNeighborhood,
}
