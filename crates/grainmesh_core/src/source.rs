//! # Label Sources
//!
//! The seam between volume readers and the mesher. A source describes its
//! volume once through a [`VolumeHeader`] and then hands out z-planes in
//! order, so the mesher never needs the whole volume in memory.

use crate::error::{MeshError, MeshResult};
use crate::grid::LatticeFrame;

/// Dimensions and placement of a label volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeHeader {
    /// Voxels along x, y, z.
    pub dims: [usize; 3],
    /// Voxel size along x, y, z.
    pub spacing: [f64; 3],
    /// Physical position of the first voxel.
    pub origin: [f64; 3],
}

impl VolumeHeader {
    /// Creates a header.
    #[must_use]
    pub const fn new(dims: [usize; 3], spacing: [f64; 3], origin: [f64; 3]) -> Self {
        Self {
            dims,
            spacing,
            origin,
        }
    }

    /// Labels per z-plane.
    #[inline]
    #[must_use]
    pub const fn plane_len(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    /// Total voxel count.
    #[inline]
    #[must_use]
    pub const fn voxel_count(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Whether every label of plane `z` that lies on the outer shell of the
    /// volume is exterior (`<= 0`).
    ///
    /// The first and last planes lie on the shell entirely; other planes
    /// only along their outermost ring.
    #[must_use]
    pub fn shell_is_exterior(&self, z: usize, plane: &[i32]) -> bool {
        let [nx, ny, nz] = self.dims;
        if z == 0 || z + 1 == nz {
            return plane.iter().all(|&label| label <= 0);
        }
        plane.chunks(nx).enumerate().all(|(y, row)| {
            if y == 0 || y + 1 == ny {
                row.iter().all(|&label| label <= 0)
            } else {
                row[0] <= 0 && row[nx - 1] <= 0
            }
        })
    }

    /// Lattice frame for node positions.
    #[must_use]
    pub const fn frame(&self) -> LatticeFrame {
        LatticeFrame::new(self.spacing, self.origin)
    }

    /// Checks that the header describes a usable volume.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidVolume`] for empty dimensions or non-positive
    /// spacing.
    pub fn validate(&self) -> MeshResult<()> {
        if self.dims.contains(&0) {
            return Err(MeshError::InvalidVolume(format!(
                "empty dimensions {:?}",
                self.dims
            )));
        }
        if self.spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(MeshError::InvalidVolume(format!(
                "spacing {:?} must be positive",
                self.spacing
            )));
        }
        if self.origin.iter().any(|o| !o.is_finite()) {
            return Err(MeshError::InvalidVolume(format!(
                "origin {:?} must be finite",
                self.origin
            )));
        }
        Ok(())
    }
}

/// Streams z-planes of labels.
pub trait LabelSource {
    /// Volume description.
    fn header(&self) -> &VolumeHeader;

    /// Fills `out` (`nx * ny` labels, x fastest) with plane `z`.
    ///
    /// Planes are requested in increasing order, each exactly once.
    ///
    /// # Errors
    ///
    /// Parse, I/O or ordering errors from the underlying reader.
    fn read_plane(&mut self, z: usize, out: &mut [i32]) -> MeshResult<()>;
}

/// Fully in-memory label volume.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelVolume {
    header: VolumeHeader,
    labels: Vec<i32>,
}

impl LabelVolume {
    /// Wraps labels in x-fastest, then y, then z order.
    ///
    /// # Errors
    ///
    /// [`MeshError::InvalidVolume`] if the header is invalid or the label
    /// count does not match it.
    pub fn new(header: VolumeHeader, labels: Vec<i32>) -> MeshResult<Self> {
        header.validate()?;
        if labels.len() != header.voxel_count() {
            return Err(MeshError::InvalidVolume(format!(
                "{} labels for dimensions {:?}",
                labels.len(),
                header.dims
            )));
        }
        Ok(Self { header, labels })
    }

    /// Builds a unit-spaced volume from a labelling function.
    #[must_use]
    pub fn from_fn(dims: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> i32) -> Self {
        let mut labels = Vec::with_capacity(dims[0] * dims[1] * dims[2]);
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    labels.push(f(x, y, z));
                }
            }
        }
        Self {
            header: VolumeHeader::new(dims, [1.0; 3], [0.0; 3]),
            labels,
        }
    }

    /// Replaces spacing and origin.
    #[must_use]
    pub fn with_frame(mut self, spacing: [f64; 3], origin: [f64; 3]) -> Self {
        self.header.spacing = spacing;
        self.header.origin = origin;
        self
    }

    /// Label at voxel coordinates.
    #[must_use]
    pub fn label(&self, x: usize, y: usize, z: usize) -> i32 {
        let [nx, ny, _] = self.header.dims;
        self.labels[(z * ny + y) * nx + x]
    }

    /// All labels.
    #[must_use]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }
}

impl LabelSource for LabelVolume {
    fn header(&self) -> &VolumeHeader {
        &self.header
    }

    fn read_plane(&mut self, z: usize, out: &mut [i32]) -> MeshResult<()> {
        let len = self.header.plane_len();
        if z >= self.header.dims[2] || out.len() != len {
            return Err(MeshError::InvalidVolume(format!(
                "plane {z} with buffer of {} labels is out of range",
                out.len()
            )));
        }
        out.copy_from_slice(&self.labels[z * len..(z + 1) * len]);
        Ok(())
    }
}
