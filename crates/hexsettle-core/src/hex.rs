//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the coordinate types the board arena is built from:
//! - `HexCoord`: Identifies individual hex cells
//! - `VertexCoord`: Identifies corners, as the three hexes meeting there
//! - `EdgeCoord`: Identifies sides, as the two hexes sharing them
//!
//! Vertices and edges are canonicalized by sorting their hexes, so the same
//! corner described from any of its three hexes compares equal without any
//! floating point work.

use serde::{Deserialize, Serialize};

/// Neighbor direction, in counter-clockwise order starting from East.
///
/// Consecutive directions point at hexes that are themselves neighbors, which
/// is what makes the corner and side construction below work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl Direction {
    /// All directions in cyclic order
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// Axial offset for one step in this direction
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (0, -1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (0, 1),
        }
    }

    /// Index into [`Direction::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Next direction counter-clockwise
    pub const fn next(self) -> Direction {
        Direction::ALL[(self.index() + 1) % 6]
    }

    /// Previous direction (clockwise)
    pub const fn prev(self) -> Direction {
        Direction::ALL[(self.index() + 5) % 6]
    }
}

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring hexes in [`Direction::ALL`] order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    /// Get the neighbor in a specific direction
    pub fn neighbor(&self, direction: Direction) -> HexCoord {
        let (dq, dr) = direction.offset();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// Direction from this hex to `other`, if they are neighbors
    pub fn direction_to(&self, other: &HexCoord) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|dir| self.neighbor(*dir) == *other)
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Hexes at exactly `radius` steps from this one.
    ///
    /// The walk starts `radius` steps south-west and proceeds counter-clockwise.
    pub fn ring(&self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![*self];
        }
        let (dq, dr) = Direction::SouthWest.offset();
        let r = radius as i32;
        let mut hex = HexCoord::new(self.q + dq * r, self.r + dr * r);
        let mut ring = Vec::with_capacity(6 * radius as usize);
        for dir in Direction::ALL {
            for _ in 0..radius {
                ring.push(hex);
                hex = hex.neighbor(dir);
            }
        }
        ring
    }

    /// All hexes within `radius`, center first then ring by ring outward
    pub fn spiral(&self, radius: u32) -> Vec<HexCoord> {
        (0..=radius).flat_map(|k| self.ring(k)).collect()
    }

    /// Corner `k` of this hex lies between the neighbors in direction `k` and `k + 1`
    pub fn corner(&self, direction: Direction) -> VertexCoord {
        VertexCoord::between(
            *self,
            self.neighbor(direction),
            self.neighbor(direction.next()),
        )
    }

    /// Get all six corners of this hex
    pub fn corners(&self) -> [VertexCoord; 6] {
        Direction::ALL.map(|dir| self.corner(dir))
    }

    /// Side shared with the neighbor in `direction`
    pub fn side(&self, direction: Direction) -> EdgeCoord {
        EdgeCoord::between(*self, self.neighbor(direction))
    }

    /// Get all six sides of this hex
    pub fn sides(&self) -> [EdgeCoord; 6] {
        Direction::ALL.map(|dir| self.side(dir))
    }

    /// Convert to pixel coordinates (center of hex)
    /// Uses pointy-top orientation with the given hex size (radius)
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * (3.0_f64.sqrt() * self.q as f64 + 3.0_f64.sqrt() / 2.0 * self.r as f64);
        let y = hex_size * (3.0 / 2.0 * self.r as f64);
        (x, y)
    }
}

/// Vertex coordinate - identifies a corner where 3 hexes meet.
///
/// Stored as the three hexes sorted ascending. Some of them may lie outside
/// the playable area; the corner still has a single canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexCoord([HexCoord; 3]);

impl VertexCoord {
    /// Corner shared by three mutually adjacent hexes
    pub fn between(a: HexCoord, b: HexCoord, c: HexCoord) -> Self {
        let mut hexes = [a, b, c];
        hexes.sort();
        Self(hexes)
    }

    /// The 3 hexes that touch this vertex
    pub fn hexes(&self) -> [HexCoord; 3] {
        self.0
    }

    /// The 3 sides that meet at this vertex
    pub fn sides(&self) -> [EdgeCoord; 3] {
        let [a, b, c] = self.0;
        [
            EdgeCoord::between(a, b),
            EdgeCoord::between(a, c),
            EdgeCoord::between(b, c),
        ]
    }

    /// Convert to pixel coordinates (centroid of the three hex centers)
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let (mut x, mut y) = (0.0, 0.0);
        for hex in self.0 {
            let (hx, hy) = hex.to_pixel(hex_size);
            x += hx;
            y += hy;
        }
        (x / 3.0, y / 3.0)
    }
}

/// Edge coordinate - identifies the side two neighboring hexes share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeCoord([HexCoord; 2]);

impl EdgeCoord {
    /// Side shared by two neighboring hexes
    pub fn between(a: HexCoord, b: HexCoord) -> Self {
        if a <= b {
            Self([a, b])
        } else {
            Self([b, a])
        }
    }

    /// The 2 hexes that share this edge
    pub fn hexes(&self) -> [HexCoord; 2] {
        self.0
    }

    /// The 2 corners at the ends of this edge.
    ///
    /// Each end is the corner formed with one of the two hexes adjacent to
    /// both sides of the edge.
    pub fn endpoints(&self) -> [VertexCoord; 2] {
        let [a, b] = self.0;
        match a.direction_to(&b) {
            Some(dir) => [
                VertexCoord::between(a, b, a.neighbor(dir.prev())),
                VertexCoord::between(a, b, a.neighbor(dir.next())),
            ],
            // Not reachable for edges built with `between` on neighbors
            None => [VertexCoord::between(a, b, a); 2],
        }
    }

    /// Convert to pixel coordinates (midpoint of edge)
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let [v1, v2] = self.endpoints();
        let (x1, y1) = v1.to_pixel(hex_size);
        let (x2, y2) = v2.to_pixel(hex_size);
        ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
    }

    /// Polar angle of the edge midpoint around the origin, in radians
    pub fn angle(&self) -> f64 {
        let (x, y) = self.to_pixel(1.0);
        y.atan2(x)
    }
}
