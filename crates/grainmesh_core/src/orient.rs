//! # Triangle Orientation
//!
//! Computes the normal and area of every triangle and reorders its label
//! pair so that `labels[0]` is the material behind the normal (the side the
//! normal points away from) and `labels[1]` the material in front.
//!
//! The decision uses the lattice edge carrying one of the triangle's
//! midpoint nodes: its two end sites hold exactly the triangle's two labels,
//! and the plane equation tells which of them lies in front.

use crate::error::{MeshError, MeshResult, TopologyFault};
use crate::loops::Patch;
use crate::nodes::NodeTable;
use crate::window::LabelWindow;

/// Normal components smaller than this are snapped to zero.
pub const NORMAL_SNAP: f64 = 1e-5;

/// Plane distances within this band are treated as on the plane.
pub const SIDE_TOLERANCE: f64 = 1e-6;

#[inline]
fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Orients every patch of a slice.
///
/// # Errors
///
/// [`MeshError::Topology`] with [`TopologyFault::LabelMismatch`] when the
/// grid around a triangle does not carry its label pair.
pub fn orient_patches(
    patches: &mut [Patch],
    nodes: &NodeTable,
    window: &LabelWindow,
    slice: usize,
) -> MeshResult<()> {
    for patch in patches.iter_mut() {
        orient_patch(patch, nodes, window).map_err(|fault| MeshError::Topology {
            slice,
            site: NodeTable::site_of(patch.nodes[0]),
            fault,
        })?;
    }
    Ok(())
}

/// Computes normal and area of one patch and orders its labels.
///
/// # Errors
///
/// [`TopologyFault::LabelMismatch`] as for [`orient_patches`].
pub fn orient_patch(patch: &mut Patch, nodes: &NodeTable, window: &LabelWindow) -> Result<(), TopologyFault> {
    let [p0, p1, p2] = patch.nodes.map(|n| nodes.position(n));
    let raw = cross(sub(p1, p0), sub(p2, p0));
    let length = dot(raw, raw).sqrt();
    patch.area = 0.5 * length;
    patch.normal = if length > 0.0 {
        raw.map(|c| {
            let c = c / length;
            if c.abs() < NORMAL_SNAP {
                0.0
            } else {
                c
            }
        })
    } else {
        [0.0; 3]
    };

    let centroid = [
        (p0[0] + p1[0] + p2[0]) / 3.0,
        (p0[1] + p1[1] + p2[1]) / 3.0,
        (p0[2] + p1[2] + p2[2]) / 3.0,
    ];
    let offset = -dot(patch.normal, centroid);
    let grid = window.grid();

    for &node in &patch.nodes {
        let Some(axis) = NodeTable::slot_of(node).edge_axis() else {
            continue;
        };
        let near = NodeTable::site_of(node);
        let Some(far) = grid.step(near, axis) else {
            continue;
        };
        let found = [window.label(near), window.label(far)];
        let [a, b] = patch.labels;
        if !(found == [a, b] || found == [b, a]) {
            return Err(TopologyFault::LabelMismatch {
                expected: patch.labels,
                found,
            });
        }
        let side = dot(patch.normal, nodes.site_position(near)) + offset;
        if side.abs() <= SIDE_TOLERANCE {
            continue;
        }
        patch.labels = if side > 0.0 { [found[1], found[0]] } else { found };
        return Ok(());
    }

    // Every sampled site lies in the plane; sample just behind the centroid.
    let depth = 0.25 * nodes.frame().min_spacing();
    let behind = [
        centroid[0] - patch.normal[0] * depth,
        centroid[1] - patch.normal[1] * depth,
        centroid[2] - patch.normal[2] * depth,
    ];
    if let Some(site) = nodes.nearest_site(behind) {
        if window.label(site) == patch.labels[1] {
            patch.labels.swap(0, 1);
        }
    }
    Ok(())
}
