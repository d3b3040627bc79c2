//! # Double-Buffered Label Window
//!
//! Holds exactly two padded planes of labels: the previous slice (plane 0)
//! and the current slice (plane 1).
//!
//! ## Architecture
//!
//! ```text
//!          ┌─────────────────────────────┐
//!          │         LabelWindow         │
//!          │  ┌─────────┐  ┌─────────┐   │
//!          │  │ Plane A │  │ Plane B │   │
//!          │  └────┬────┘  └────┬────┘   │
//!          │       └──── upper ─┘        │
//!          └─────────────────────────────┘
//! ```
//!
//! Advancing to the next slice swaps the roles of the two buffers: the old
//! current plane becomes the previous plane without copying, and the freed
//! buffer is reset to the exterior label and refilled from the source.

use crate::error::{MeshError, MeshResult};
use crate::grid::GridIndex;

/// Label reserved for everything outside the volume.
pub const EXTERIOR_LABEL: i32 = -3;

/// Maps raw input labels onto the window's label domain.
///
/// Non-positive labels are treated as exterior.
#[inline]
#[must_use]
pub const fn normalize_label(raw: i32) -> i32 {
    if raw <= 0 {
        EXTERIOR_LABEL
    } else {
        raw
    }
}

/// Two-plane label buffer with swap-on-advance semantics.
pub struct LabelWindow {
    grid: GridIndex,
    planes: [Box<[i32]>; 2],
    /// Index of the buffer currently acting as plane 1.
    upper: usize,
    slices_loaded: usize,
}

impl LabelWindow {
    /// Creates a window with both planes set to the exterior label.
    #[must_use]
    pub fn new(grid: GridIndex) -> Self {
        let exterior = || vec![EXTERIOR_LABEL; grid.plane_len()].into_boxed_slice();
        Self {
            grid,
            planes: [exterior(), exterior()],
            upper: 1,
            slices_loaded: 0,
        }
    }

    /// Window geometry.
    #[inline]
    #[must_use]
    pub const fn grid(&self) -> &GridIndex {
        &self.grid
    }

    /// Number of input planes loaded so far.
    #[inline]
    #[must_use]
    pub const fn slices_loaded(&self) -> usize {
        self.slices_loaded
    }

    /// Label at a window site.
    #[inline]
    #[must_use]
    pub fn label(&self, site: usize) -> i32 {
        let plane_len = self.grid.plane_len();
        if site < plane_len {
            self.planes[self.upper ^ 1][site]
        } else {
            self.planes[self.upper][site - plane_len]
        }
    }

    /// Label at an optional site; sites outside the window read as exterior.
    #[inline]
    #[must_use]
    pub fn label_or_exterior(&self, site: Option<usize>) -> i32 {
        site.map_or(EXTERIOR_LABEL, |s| self.label(s))
    }

    /// Labels of the previous plane.
    #[must_use]
    pub fn lower_plane(&self) -> &[i32] {
        &self.planes[self.upper ^ 1]
    }

    /// Labels of the current plane.
    #[must_use]
    pub fn upper_plane(&self) -> &[i32] {
        &self.planes[self.upper]
    }

    /// Moves the current plane down and loads the next one.
    ///
    /// `next` holds one raw input plane (`nx * ny` labels, x fastest). `None`
    /// leaves the new current plane fully exterior, which closes the volume
    /// after its last slice.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidVolume`] if `next` has the wrong length.
    pub fn advance(&mut self, next: Option<&[i32]>) -> MeshResult<()> {
        self.upper ^= 1;
        self.planes[self.upper].fill(EXTERIOR_LABEL);
        if let Some(raw) = next {
            self.load_upper(raw)?;
            self.slices_loaded += 1;
        }
        Ok(())
    }

    fn load_upper(&mut self, raw: &[i32]) -> MeshResult<()> {
        let nx = self.grid.x_dim() - 2;
        let ny = self.grid.y_dim() - 2;
        if raw.len() != nx * ny {
            return Err(MeshError::InvalidVolume(format!(
                "plane holds {} labels, expected {}",
                raw.len(),
                nx * ny
            )));
        }
        let x_dim = self.grid.x_dim();
        let upper = &mut self.planes[self.upper];
        for (y, row) in raw.chunks_exact(nx).enumerate() {
            let start = (y + 1) * x_dim + 1;
            for (dst, &src) in upper[start..start + nx].iter_mut().zip(row) {
                *dst = normalize_label(src);
            }
        }
        Ok(())
    }
}
