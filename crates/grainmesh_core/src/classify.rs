//! # Square Classification in the Window
//!
//! Reads the four corner labels of a square from the label window, classifies
//! them, and settles checkerboards with a local connectivity score.

use crate::neighbors::NeighborTable;
use crate::options::AnomalyNeighborhood;
use crate::topology::{classify_square, SquareTopology};
use crate::window::LabelWindow;

/// Outcome of classifying one square.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Final configuration, never ambiguous.
    pub topology: SquareTopology,
    /// Corner labels in cyclic order.
    pub labels: [i32; 4],
    /// Whether a checkerboard had to be resolved.
    pub resolved: bool,
}

/// Classifies the square with the given corner sites.
///
/// Returns `None` when every corner is exterior: such a square has no effect
/// on the mesh.
#[must_use]
pub fn classify_corners(
    window: &LabelWindow,
    neighbors: &NeighborTable,
    corners: [usize; 4],
    neighborhood: AnomalyNeighborhood,
) -> Option<Classification> {
    let labels = corners.map(|site| window.label(site));
    if labels.iter().all(|&label| label < 0) {
        return None;
    }
    let topology = classify_square(labels);
    if topology.is_ambiguous() {
        return Some(Classification {
            topology: resolve_checkerboard(window, neighbors, corners, neighborhood),
            labels,
            resolved: true,
        });
    }
    Some(Classification {
        topology,
        labels,
        resolved: false,
    })
}

/// Splits a checkerboard square.
///
/// Each corner is scored by how many of its neighbours share its label. The
/// first least-connected corner decides: corners 1 and 3 keep `T15`,
/// corners 0 and 2 select `T16`.
#[must_use]
pub fn resolve_checkerboard(
    window: &LabelWindow,
    neighbors: &NeighborTable,
    corners: [usize; 4],
    neighborhood: AnomalyNeighborhood,
) -> SquareTopology {
    let count = neighborhood.neighbor_count();
    let mut weakest = 0;
    let mut weakest_score = usize::MAX;
    for (corner, &site) in corners.iter().enumerate() {
        let label = window.label(site);
        let score = neighbors
            .iter(site, count)
            .filter(|&n| window.label_or_exterior(n) == label)
            .count();
        if score < weakest_score {
            weakest = corner;
            weakest_score = score;
        }
    }
    tracing::trace!(corner = weakest, score = weakest_score, "checkerboard resolved");
    if weakest % 2 == 1 {
        SquareTopology::T15
    } else {
        SquareTopology::T16
    }
}
