//! # Neighbor Table
//!
//! The 26-neighbourhood of every window site, computed once for the window
//! geometry. In-plane offsets wrap periodically; offsets that leave the
//! two-plane window in z have no neighbour and read as exterior.
//!
//! Neighbour order: the 8 in-plane neighbours first, then the site below and
//! its 8 neighbours, then the site above and its 8 neighbours.

use crate::error::{MeshError, MeshResult};
use crate::grid::GridIndex;

/// Number of neighbours per site.
pub const NEIGHBOR_COUNT: usize = 26;

/// Number of in-plane neighbours (the first entries of every record).
pub const IN_PLANE_COUNT: usize = 8;

const RING: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// `(dx, dy, dz)` of every neighbour, in table order.
pub const NEIGHBOR_OFFSETS: [(isize, isize, isize); NEIGHBOR_COUNT] = {
    let mut out = [(0, 0, 0); NEIGHBOR_COUNT];
    let mut i = 0;
    while i < 8 {
        out[i] = (RING[i].0, RING[i].1, 0);
        out[9 + i] = (RING[i].0, RING[i].1, -1);
        out[18 + i] = (RING[i].0, RING[i].1, 1);
        i += 1;
    }
    out[8] = (0, 0, -1);
    out[17] = (0, 0, 1);
    out
};

const NONE: u32 = u32::MAX;

/// Flat `26 * window_len` neighbour table.
pub struct NeighborTable {
    entries: Box<[u32]>,
}

impl NeighborTable {
    /// Builds the table for a window geometry.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidVolume`] if the window is too large to
    /// index with 32-bit entries.
    pub fn new(grid: &GridIndex) -> MeshResult<Self> {
        let window_len = grid.window_len();
        if u32::try_from(window_len).map_or(true, |n| n == NONE) {
            return Err(MeshError::InvalidVolume(format!(
                "window of {window_len} sites exceeds the neighbour index range"
            )));
        }

        let x_dim = grid.x_dim() as isize;
        let y_dim = grid.y_dim() as isize;
        let mut entries = Vec::with_capacity(window_len * NEIGHBOR_COUNT);
        for site in 0..window_len {
            let (x, y, plane) = grid.coords(site);
            for &(dx, dy, dz) in &NEIGHBOR_OFFSETS {
                let z = plane as isize + dz;
                if !(0..2).contains(&z) {
                    entries.push(NONE);
                    continue;
                }
                let nx = (x as isize + dx).rem_euclid(x_dim) as usize;
                let ny = (y as isize + dy).rem_euclid(y_dim) as usize;
                entries.push(grid.site(nx, ny, z as usize) as u32);
            }
        }

        Ok(Self {
            entries: entries.into_boxed_slice(),
        })
    }

    /// Neighbour `k` of `site`, or `None` outside the window.
    #[inline]
    #[must_use]
    pub fn neighbor(&self, site: usize, k: usize) -> Option<usize> {
        let raw = self.entries[site * NEIGHBOR_COUNT + k];
        (raw != NONE).then_some(raw as usize)
    }

    /// First `count` neighbours of `site` in table order.
    pub fn iter(&self, site: usize, count: usize) -> impl Iterator<Item = Option<usize>> + '_ {
        let start = site * NEIGHBOR_COUNT;
        self.entries[start..start + count.min(NEIGHBOR_COUNT)]
            .iter()
            .map(|&raw| (raw != NONE).then_some(raw as usize))
    }
}
