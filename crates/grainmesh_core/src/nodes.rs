//! # Node Table
//!
//! Arena of candidate mesh nodes. Every window site owns seven slots: the
//! three lattice-edge midpoints leaving it in +x, +y and +z, the three face
//! centres of the squares anchored at it, and the body centre of its cell.
//!
//! Nodes are addressed by `site * SLOTS_PER_SITE + slot`. Slots start unused
//! and are promoted to a [`NodeKind`] as edges and triangles touch them.
//! [`NodeTable::assign_ids`] numbers promoted nodes once, in window order,
//! threading the global counter explicitly.

use crate::grid::{Axis, GridIndex, LatticeFrame};

/// Candidate node slots per site.
pub const SLOTS_PER_SITE: usize = 7;

/// Classification of a mesh node by the number of materials meeting there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// Not part of the mesh.
    #[default]
    Unused,
    /// Lies on an interface between two materials.
    Manifold,
    /// Face centre where three materials meet.
    TripleLine,
    /// Face centre where four materials meet.
    QuadruplePoint,
    /// Body centre touched by the given number of distinct labels.
    BodyCenter(u8),
}

impl NodeKind {
    /// Integer code stored in node records.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Unused => 0,
            Self::Manifold => 2,
            Self::TripleLine => 3,
            Self::QuadruplePoint => 4,
            Self::BodyCenter(n) => 10 + n as i32,
        }
    }

    /// Inverse of [`NodeKind::code`].
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unused),
            2 => Some(Self::Manifold),
            3 => Some(Self::TripleLine),
            4 => Some(Self::QuadruplePoint),
            10..=18 => Some(Self::BodyCenter((code - 10) as u8)),
            _ => None,
        }
    }

    /// Whether the node takes part in the mesh.
    #[inline]
    #[must_use]
    pub const fn is_used(self) -> bool {
        !matches!(self, Self::Unused)
    }
}

/// Position of a node relative to its owning site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeSlot {
    /// Midpoint of the +x lattice edge.
    EdgeX = 0,
    /// Midpoint of the +y lattice edge.
    EdgeY = 1,
    /// Midpoint of the +z lattice edge.
    EdgeZ = 2,
    /// Centre of the xy face.
    FaceXy = 3,
    /// Centre of the xz face.
    FaceXz = 4,
    /// Centre of the yz face.
    FaceYz = 5,
    /// Centre of the cell.
    Body = 6,
}

impl NodeSlot {
    /// All slots in index order.
    pub const ALL: [Self; SLOTS_PER_SITE] = [
        Self::EdgeX,
        Self::EdgeY,
        Self::EdgeZ,
        Self::FaceXy,
        Self::FaceXz,
        Self::FaceYz,
        Self::Body,
    ];

    /// Slot for an index in `0..SLOTS_PER_SITE`.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % SLOTS_PER_SITE]
    }

    /// Offset from the owning site in half voxels.
    #[must_use]
    pub const fn half_offset(self) -> [u8; 3] {
        match self {
            Self::EdgeX => [1, 0, 0],
            Self::EdgeY => [0, 1, 0],
            Self::EdgeZ => [0, 0, 1],
            Self::FaceXy => [1, 1, 0],
            Self::FaceXz => [1, 0, 1],
            Self::FaceYz => [0, 1, 1],
            Self::Body => [1, 1, 1],
        }
    }

    /// Lattice edge direction for midpoint slots.
    #[must_use]
    pub const fn edge_axis(self) -> Option<Axis> {
        match self {
            Self::EdgeX => Some(Axis::X),
            Self::EdgeY => Some(Axis::Y),
            Self::EdgeZ => Some(Axis::Z),
            _ => None,
        }
    }
}

/// One candidate mesh node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    /// Physical position.
    pub position: [f64; 3],
    /// Current classification.
    pub kind: NodeKind,
    /// Global ID, assigned once.
    pub id: Option<i32>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            kind: NodeKind::Unused,
            id: None,
        }
    }
}

/// Node arena covering both window planes.
pub struct NodeTable {
    grid: GridIndex,
    frame: LatticeFrame,
    nodes: Vec<Node>,
    /// Padded z coordinate of plane 1.
    upper_z: usize,
}

impl NodeTable {
    /// Creates the table for the first slice (padded planes 0 and 1).
    #[must_use]
    pub fn new(grid: GridIndex, frame: LatticeFrame) -> Self {
        let mut table = Self {
            grid,
            frame,
            nodes: vec![Node::default(); grid.window_len() * SLOTS_PER_SITE],
            upper_z: 1,
        };
        table.reset_plane(0, 0);
        table.reset_plane(1, 1);
        table
    }

    /// Node index of a slot.
    #[inline]
    #[must_use]
    pub const fn index(site: usize, slot: NodeSlot) -> usize {
        site * SLOTS_PER_SITE + slot as usize
    }

    /// Owning site of a node index.
    #[inline]
    #[must_use]
    pub const fn site_of(node: usize) -> usize {
        node / SLOTS_PER_SITE
    }

    /// Slot of a node index.
    #[inline]
    #[must_use]
    pub const fn slot_of(node: usize) -> NodeSlot {
        NodeSlot::from_index(node % SLOTS_PER_SITE)
    }

    /// Total slots in the arena.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at an index.
    #[inline]
    #[must_use]
    pub fn get(&self, node: usize) -> &Node {
        &self.nodes[node]
    }

    /// Kind of a node.
    #[inline]
    #[must_use]
    pub fn kind(&self, node: usize) -> NodeKind {
        self.nodes[node].kind
    }

    /// Overwrites the kind of a node.
    #[inline]
    pub fn set_kind(&mut self, node: usize, kind: NodeKind) {
        self.nodes[node].kind = kind;
    }

    /// Marks a node as manifold unless it already has a kind.
    #[inline]
    pub fn promote(&mut self, node: usize) {
        let slot = &mut self.nodes[node].kind;
        if *slot == NodeKind::Unused {
            *slot = NodeKind::Manifold;
        }
    }

    /// Position of a node.
    #[inline]
    #[must_use]
    pub fn position(&self, node: usize) -> [f64; 3] {
        self.nodes[node].position
    }

    /// Physical position of a window site.
    #[must_use]
    pub fn site_position(&self, site: usize) -> [f64; 3] {
        let (x, y, plane) = self.grid.coords(site);
        self.frame.position(x, y, self.upper_z - 1 + plane)
    }

    /// Lattice frame used for positions.
    #[must_use]
    pub const fn frame(&self) -> &LatticeFrame {
        &self.frame
    }

    /// Shifts the window one slice up.
    ///
    /// Plane 1 nodes (with kinds and IDs) move into plane 0; plane 1 is
    /// reinitialised for the next padded z coordinate.
    pub fn advance(&mut self) {
        let plane_nodes = self.grid.plane_len() * SLOTS_PER_SITE;
        self.nodes.copy_within(plane_nodes.., 0);
        self.upper_z += 1;
        self.reset_plane(1, self.upper_z);
    }

    /// Numbers every used node that has no ID yet, in window order.
    ///
    /// Returns the counter to pass to the next slice.
    #[must_use]
    pub fn assign_ids(&mut self, mut next_id: i32) -> i32 {
        for node in &mut self.nodes {
            if node.kind.is_used() && node.id.is_none() {
                node.id = Some(next_id);
                next_id += 1;
            }
        }
        next_id
    }

    /// Nodes whose ID is at least `first_id`, with their IDs, in window order.
    pub fn numbered_since(&self, first_id: i32) -> impl Iterator<Item = (i32, &Node)> + '_ {
        self.nodes
            .iter()
            .filter_map(move |node| node.id.filter(|&id| id >= first_id).map(|id| (id, node)))
    }

    /// Window site nearest to a physical point, if it lies inside the window.
    #[must_use]
    pub fn nearest_site(&self, point: [f64; 3]) -> Option<usize> {
        let mut padded = [0usize; 3];
        for axis in 0..3 {
            let t = (point[axis] - self.frame.origin[axis]) / self.frame.spacing[axis] + 1.0;
            let rounded = t.round();
            if !rounded.is_finite() || rounded < 0.0 {
                return None;
            }
            padded[axis] = rounded as usize;
        }
        let plane = padded[2].checked_sub(self.upper_z - 1)?;
        if padded[0] >= self.grid.x_dim() || padded[1] >= self.grid.y_dim() || plane > 1 {
            return None;
        }
        Some(self.grid.site(padded[0], padded[1], plane))
    }

    fn reset_plane(&mut self, plane: usize, z: usize) {
        let half = self.frame.spacing.map(|s| s * 0.5);
        for site in self.grid.plane_sites(plane) {
            let (x, y, _) = self.grid.coords(site);
            let base = self.frame.position(x, y, z);
            for slot in NodeSlot::ALL {
                let offset = slot.half_offset();
                let mut position = base;
                for axis in 0..3 {
                    position[axis] += f64::from(offset[axis]) * half[axis];
                }
                self.nodes[Self::index(site, slot)] = Node {
                    position,
                    kind: NodeKind::Unused,
                    id: None,
                };
            }
        }
    }
}
