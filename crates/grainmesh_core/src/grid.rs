//! # Window Grid Indexing
//!
//! Every plane of the window is the input plane surrounded by a one-site ring
//! of exterior labels, so a volume of `nx * ny` columns becomes a padded plane
//! of `x_dim * y_dim` sites with `x_dim = nx + 2` and `y_dim = ny + 2`.
//! The window stacks two such planes:
//!
//! ```text
//! site = plane * plane_len + y * x_dim + x
//!
//!   plane 0  previous slice   (sites 0 .. plane_len)
//!   plane 1  current slice    (sites plane_len .. 2 * plane_len)
//! ```
//!
//! All linear index arithmetic in the crate goes through [`GridIndex`].

/// Number of planes held by the window.
pub const WINDOW_PLANES: usize = 2;

/// Axis of the lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Fastest varying axis.
    X,
    /// In-plane second axis.
    Y,
    /// Slice axis.
    Z,
}

/// Padded window geometry and linear index conversions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndex {
    x_dim: usize,
    y_dim: usize,
    plane_len: usize,
}

impl GridIndex {
    /// Creates the padded geometry for input planes of `nx * ny` voxels.
    #[must_use]
    pub const fn new(nx: usize, ny: usize) -> Self {
        let x_dim = nx + 2;
        let y_dim = ny + 2;
        Self {
            x_dim,
            y_dim,
            plane_len: x_dim * y_dim,
        }
    }

    /// Padded extent along x.
    #[inline]
    #[must_use]
    pub const fn x_dim(&self) -> usize {
        self.x_dim
    }

    /// Padded extent along y.
    #[inline]
    #[must_use]
    pub const fn y_dim(&self) -> usize {
        self.y_dim
    }

    /// Sites per padded plane.
    #[inline]
    #[must_use]
    pub const fn plane_len(&self) -> usize {
        self.plane_len
    }

    /// Sites in the whole two-plane window.
    #[inline]
    #[must_use]
    pub const fn window_len(&self) -> usize {
        self.plane_len * WINDOW_PLANES
    }

    /// Linear index of padded coordinates.
    #[inline]
    #[must_use]
    pub const fn site(&self, x: usize, y: usize, plane: usize) -> usize {
        plane * self.plane_len + y * self.x_dim + x
    }

    /// Padded `(x, y, plane)` coordinates of a site.
    #[inline]
    #[must_use]
    pub const fn coords(&self, site: usize) -> (usize, usize, usize) {
        let plane = site / self.plane_len;
        let in_plane = site % self.plane_len;
        (in_plane % self.x_dim, in_plane / self.x_dim, plane)
    }

    /// Plane (0 or 1) a site belongs to.
    #[inline]
    #[must_use]
    pub const fn plane_of(&self, site: usize) -> usize {
        site / self.plane_len
    }

    /// Linear offset of one lattice step along `axis`.
    #[inline]
    #[must_use]
    pub const fn stride(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => 1,
            Axis::Y => self.x_dim,
            Axis::Z => self.plane_len,
        }
    }

    /// Site one step along `axis`, if it is still inside the window.
    #[inline]
    #[must_use]
    pub fn step(&self, site: usize, axis: Axis) -> Option<usize> {
        let next = site + self.stride(axis);
        (next < self.window_len()).then_some(next)
    }

    /// Whether the site lies on the far edge of its plane (`x` or `y` maximal).
    ///
    /// Squares and cells anchored there would wrap into the next row.
    #[inline]
    #[must_use]
    pub const fn on_far_edge(&self, site: usize) -> bool {
        let (x, y, _) = self.coords(site);
        x + 1 == self.x_dim || y + 1 == self.y_dim
    }

    /// Whether the site belongs to the exterior padding ring of its plane.
    #[inline]
    #[must_use]
    pub const fn on_ring(&self, site: usize) -> bool {
        let (x, y, _) = self.coords(site);
        x == 0 || y == 0 || x + 1 == self.x_dim || y + 1 == self.y_dim
    }

    /// Iterates the sites of one plane in linear order.
    pub fn plane_sites(&self, plane: usize) -> std::ops::Range<usize> {
        let start = plane * self.plane_len;
        start..start + self.plane_len
    }
}

/// Physical placement of the padded lattice.
///
/// Padded lattice coordinate `i` maps to `origin + (i - 1) * spacing`, so the
/// first real voxel sits exactly on the volume origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeFrame {
    /// Voxel size along x, y, z.
    pub spacing: [f64; 3],
    /// Physical position of the first voxel.
    pub origin: [f64; 3],
}

impl LatticeFrame {
    /// Creates a frame from spacing and origin.
    #[must_use]
    pub const fn new(spacing: [f64; 3], origin: [f64; 3]) -> Self {
        Self { spacing, origin }
    }

    /// Physical position of padded lattice coordinates.
    #[inline]
    #[must_use]
    pub fn position(&self, x: usize, y: usize, z: usize) -> [f64; 3] {
        let padded = [x, y, z];
        let mut out = [0.0; 3];
        for axis in 0..3 {
            out[axis] = self.origin[axis] + (padded[axis] as f64 - 1.0) * self.spacing[axis];
        }
        out
    }

    /// Smallest voxel size over all axes.
    #[must_use]
    pub fn min_spacing(&self) -> f64 {
        self.spacing.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

impl Default for LatticeFrame {
    fn default() -> Self {
        Self::new([1.0; 3], [0.0; 3])
    }
}
