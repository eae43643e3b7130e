//! Board topology: tiles, vertices and edges held in flat arenas.
//!
//! This module contains:
//! - Resource and terrain kinds
//! - Index newtypes (`TileId`, `VertexId`, `EdgeId`) into the arenas
//! - The `Board` arena and its adjacency queries
//! - Harbor placements on coastal edges
//! - `ConstructionError`, raised only while a board or game is being built
//!
//! The topology is fixed once `Board::new` returns. Everything that changes
//! during play (structures, roads, robber) lives outside the board and refers
//! to it by index.

use crate::hex::{Direction, EdgeCoord, HexCoord, VertexCoord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Player identifier (0..N-1)
pub type PlayerId = u8;

/// Largest radius the id types can address comfortably
pub const MAX_RADIUS: u32 = 8;

/// Errors raised while assembling a board or a game. Never raised mid-game.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConstructionError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Invalid board constraints: {0}")]
    InvalidBoardConstraints(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Index of a tile in [`Board::tiles`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u16);

/// Index of a vertex in [`Board::vertices`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u16);

/// Index of an edge in [`Board::edges`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u16);

impl TileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Resource kinds, in the fixed tie-break order used wherever resources are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Terrain of a land tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Forest,
    Hills,
    Pasture,
    Fields,
    Mountains,
    /// Produces nothing and carries no number
    Desert,
}

impl Terrain {
    pub const ALL: [Terrain; 6] = [
        Terrain::Forest,
        Terrain::Hills,
        Terrain::Pasture,
        Terrain::Fields,
        Terrain::Mountains,
        Terrain::Desert,
    ];

    /// Get the resource this terrain produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Terrain::Forest => Some(Resource::Wood),
            Terrain::Hills => Some(Resource::Brick),
            Terrain::Pasture => Some(Resource::Sheep),
            Terrain::Fields => Some(Resource::Wheat),
            Terrain::Mountains => Some(Resource::Ore),
            Terrain::Desert => None,
        }
    }
}

/// Harbor types for bank trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Harbor {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl Harbor {
    /// The exchange rate for this harbor
    pub fn rate(&self) -> u32 {
        match self {
            Harbor::Generic => 3,
            Harbor::Specific(_) => 2,
        }
    }

    /// Whether this harbor improves the rate for giving `resource`
    pub fn applies_to(&self, resource: Resource) -> bool {
        match self {
            Harbor::Generic => true,
            Harbor::Specific(r) => *r == resource,
        }
    }
}

/// Harbor placement on a coastal edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarborPlacement {
    /// The edge where ships dock
    pub edge: EdgeId,
    pub harbor: Harbor,
}

/// Input for one tile when assembling a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    pub coord: HexCoord,
    pub terrain: Terrain,
    pub number: Option<u8>,
}

/// A single land tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    /// Position on the hex grid
    pub coord: HexCoord,
    pub terrain: Terrain,
    /// Dice number that triggers production (2-12, None for desert)
    pub number: Option<u8>,
    /// Corners in [`Direction::ALL`] order
    pub corners: [VertexId; 6],
    /// Sides in [`Direction::ALL`] order
    pub sides: [EdgeId; 6],
}

impl Tile {
    /// Get the resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        self.terrain.resource()
    }
}

/// A corner where settlements and cities are placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub coord: VertexCoord,
    /// Land tiles touching this corner (1 to 3)
    pub tiles: Vec<TileId>,
    /// Incident edges (2 or 3)
    pub edges: Vec<EdgeId>,
    /// Vertices one edge away
    pub neighbors: Vec<VertexId>,
}

/// A side where roads are placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub coord: EdgeCoord,
    pub vertices: [VertexId; 2],
    /// Land tiles bordering this edge (1 or 2)
    pub tiles: Vec<TileId>,
}

impl Edge {
    /// Coastal edges border exactly one land tile
    pub fn is_coastal(&self) -> bool {
        self.tiles.len() == 1
    }

    /// The endpoint that is not `vertex`
    pub fn other_end(&self, vertex: VertexId) -> Option<VertexId> {
        match self.vertices {
            [a, b] if a == vertex => Some(b),
            [a, b] if b == vertex => Some(a),
            _ => None,
        }
    }
}

/// Number of tiles in a hexagonal board of the given radius
pub fn tile_count(radius: u32) -> usize {
    (3 * radius * (radius + 1) + 1) as usize
}

/// Number of corners in a hexagonal board of the given radius
pub fn vertex_count(radius: u32) -> usize {
    (6 * (radius + 1) * (radius + 1)) as usize
}

/// The game board: static topology plus terrain, numbers and harbors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    radius: u32,
    tiles: Vec<Tile>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    harbors: Vec<HarborPlacement>,
}

impl Board {
    /// Assemble a hexagonal board of `radius` rings around the origin.
    ///
    /// Tiles are stored in spiral order (center outward) regardless of the
    /// order of `specs`, and vertex/edge ids are handed out while walking
    /// them, so two boards with the same radius share every id.
    pub fn new(radius: u32, specs: Vec<TileSpec>) -> Result<Self, ConstructionError> {
        if radius > MAX_RADIUS {
            return Err(ConstructionError::InvalidTopology(format!(
                "radius {} exceeds maximum {}",
                radius, MAX_RADIUS
            )));
        }

        let expected = tile_count(radius);
        if specs.len() != expected {
            return Err(ConstructionError::InvalidTopology(format!(
                "expected {} tiles for radius {}, got {}",
                expected,
                radius,
                specs.len()
            )));
        }

        let order: HashMap<HexCoord, usize> = HexCoord::default()
            .spiral(radius)
            .into_iter()
            .enumerate()
            .map(|(i, coord)| (coord, i))
            .collect();

        let mut seen = HashSet::new();
        for spec in &specs {
            if !order.contains_key(&spec.coord) {
                return Err(ConstructionError::InvalidTopology(format!(
                    "tile {:?} lies outside radius {}",
                    spec.coord, radius
                )));
            }
            if !seen.insert(spec.coord) {
                return Err(ConstructionError::InvalidTopology(format!(
                    "duplicate tile {:?}",
                    spec.coord
                )));
            }
            check_tile_constraints(spec)?;
        }

        let mut specs = specs;
        specs.sort_by_key(|spec| order.get(&spec.coord).copied().unwrap_or(usize::MAX));

        let mut vertex_ids: HashMap<VertexCoord, VertexId> = HashMap::new();
        let mut edge_ids: HashMap<EdgeCoord, EdgeId> = HashMap::new();
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut tiles: Vec<Tile> = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            let tile_id = TileId(index as u16);
            let mut corners = [VertexId(0); 6];
            let mut sides = [EdgeId(0); 6];

            for dir in Direction::ALL {
                let corner = spec.coord.corner(dir);
                let vertex_id = *vertex_ids.entry(corner).or_insert_with(|| {
                    let id = VertexId(vertices.len() as u16);
                    vertices.push(Vertex {
                        id,
                        coord: corner,
                        tiles: Vec::new(),
                        edges: Vec::new(),
                        neighbors: Vec::new(),
                    });
                    id
                });
                vertices[vertex_id.index()].tiles.push(tile_id);
                corners[dir.index()] = vertex_id;

                let side = spec.coord.side(dir);
                let edge_id = *edge_ids.entry(side).or_insert_with(|| {
                    let id = EdgeId(edges.len() as u16);
                    edges.push(Edge {
                        id,
                        coord: side,
                        vertices: [VertexId(0); 2],
                        tiles: Vec::new(),
                    });
                    id
                });
                edges[edge_id.index()].tiles.push(tile_id);
                sides[dir.index()] = edge_id;
            }

            tiles.push(Tile {
                id: tile_id,
                coord: spec.coord,
                terrain: spec.terrain,
                number: spec.number,
                corners,
                sides,
            });
        }

        // Wire edges to their endpoints
        for edge in edges.iter_mut() {
            let [a, b] = edge.coord.endpoints();
            let (Some(&va), Some(&vb)) = (vertex_ids.get(&a), vertex_ids.get(&b)) else {
                return Err(ConstructionError::InvalidTopology(format!(
                    "edge {:?} has an endpoint outside the board",
                    edge.coord
                )));
            };
            edge.vertices = [va, vb];
        }
        for edge in &edges {
            let [a, b] = edge.vertices;
            vertices[a.index()].edges.push(edge.id);
            vertices[a.index()].neighbors.push(b);
            vertices[b.index()].edges.push(edge.id);
            vertices[b.index()].neighbors.push(a);
        }

        let board = Self {
            radius,
            tiles,
            vertices,
            edges,
            harbors: Vec::new(),
        };
        board.check_topology()?;
        Ok(board)
    }

    /// Attach harbors. Every harbor must sit on a distinct coastal edge.
    pub fn with_harbors(
        mut self,
        harbors: Vec<HarborPlacement>,
    ) -> Result<Self, ConstructionError> {
        let mut used = HashSet::new();
        for placement in &harbors {
            let edge = self.edge(placement.edge).ok_or_else(|| {
                ConstructionError::InvalidTopology(format!(
                    "harbor on unknown edge {}",
                    placement.edge
                ))
            })?;
            if !edge.is_coastal() {
                return Err(ConstructionError::InvalidTopology(format!(
                    "harbor on inland edge {}",
                    placement.edge
                )));
            }
            if !used.insert(placement.edge) {
                return Err(ConstructionError::InvalidTopology(format!(
                    "two harbors on edge {}",
                    placement.edge
                )));
            }
        }
        self.harbors = harbors;
        Ok(self)
    }

    /// Tile/vertex/edge counts must match a full hexagon of this radius
    fn check_topology(&self) -> Result<(), ConstructionError> {
        let t = self.tiles.len();
        let v = self.vertices.len();
        let e = self.edges.len();
        let expected_v = vertex_count(self.radius);

        if t != tile_count(self.radius) || v != expected_v || e + 1 != v + t {
            return Err(ConstructionError::InvalidTopology(format!(
                "radius {} gives {} tiles, {} vertices, {} edges",
                self.radius, t, v, e
            )));
        }
        if self.vertices.iter().any(|vx| vx.tiles.is_empty() || vx.tiles.len() > 3) {
            return Err(ConstructionError::InvalidTopology(
                "vertex touching more than three tiles".into(),
            ));
        }
        Ok(())
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn harbors(&self) -> &[HarborPlacement] {
        &self.harbors
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.index())
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.index())
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    pub fn tile_at(&self, coord: HexCoord) -> Option<TileId> {
        self.tiles.iter().find(|t| t.coord == coord).map(|t| t.id)
    }

    pub fn vertex_at(&self, coord: VertexCoord) -> Option<VertexId> {
        self.vertices.iter().find(|v| v.coord == coord).map(|v| v.id)
    }

    pub fn edge_at(&self, coord: EdgeCoord) -> Option<EdgeId> {
        self.edges.iter().find(|e| e.coord == coord).map(|e| e.id)
    }

    /// Tiles touching a vertex
    pub fn tiles_of_vertex(&self, vertex: VertexId) -> &[TileId] {
        self.vertex(vertex).map(|v| v.tiles.as_slice()).unwrap_or(&[])
    }

    /// Both endpoints of an edge
    pub fn vertices_of_edge(&self, edge: EdgeId) -> Option<[VertexId; 2]> {
        self.edge(edge).map(|e| e.vertices)
    }

    /// Edges meeting at a vertex
    pub fn edges_of_vertex(&self, vertex: VertexId) -> &[EdgeId] {
        self.vertex(vertex).map(|v| v.edges.as_slice()).unwrap_or(&[])
    }

    /// Vertices one edge away
    pub fn adjacent_vertices(&self, vertex: VertexId) -> &[VertexId] {
        self.vertex(vertex)
            .map(|v| v.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Six corners of a tile
    pub fn vertices_of_tile(&self, tile: TileId) -> &[VertexId] {
        self.tile(tile).map(|t| t.corners.as_slice()).unwrap_or(&[])
    }

    /// Vertices within `radius` edges of `vertex`, excluding `vertex` itself
    pub fn vertices_within(&self, vertex: VertexId, radius: u32) -> BTreeSet<VertexId> {
        let mut found = BTreeSet::new();
        if self.vertex(vertex).is_none() {
            return found;
        }
        let mut queue = VecDeque::from([(vertex, 0)]);
        let mut visited = HashSet::from([vertex]);

        while let Some((current, depth)) = queue.pop_front() {
            if depth == radius {
                continue;
            }
            for &next in self.adjacent_vertices(current) {
                if visited.insert(next) {
                    found.insert(next);
                    queue.push_back((next, depth + 1));
                }
            }
        }
        found
    }

    /// Edge connecting two vertices, if they are adjacent
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edges_of_vertex(a)
            .iter()
            .copied()
            .find(|e| self.vertices_of_edge(*e).is_some_and(|vs| vs.contains(&b)))
    }

    /// Land tiles sharing a side with `tile`
    pub fn tile_neighbors(&self, tile: TileId) -> Vec<TileId> {
        let Some(t) = self.tile(tile) else {
            return Vec::new();
        };
        t.coord
            .neighbors()
            .into_iter()
            .filter_map(|coord| self.tile_at(coord))
            .collect()
    }

    /// Edges bordering exactly one land tile
    pub fn coastal_edges(&self) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|e| e.is_coastal())
            .map(|e| e.id)
            .collect()
    }

    /// Tiles of a given terrain, in id order
    pub fn tiles_with(&self, terrain: Terrain) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(move |t| t.terrain == terrain)
    }

    /// Harbors reachable from a vertex
    pub fn harbors_at(&self, vertex: VertexId) -> impl Iterator<Item = Harbor> + '_ {
        self.harbors.iter().filter_map(move |h| {
            self.vertices_of_edge(h.edge)
                .filter(|vs| vs.contains(&vertex))
                .map(|_| h.harbor)
        })
    }
}

fn check_tile_constraints(spec: &TileSpec) -> Result<(), ConstructionError> {
    match (spec.terrain, spec.number) {
        (Terrain::Desert, None) => Ok(()),
        (Terrain::Desert, Some(n)) => Err(ConstructionError::InvalidBoardConstraints(format!(
            "desert at {:?} carries number {}",
            spec.coord, n
        ))),
        (terrain, None) => Err(ConstructionError::InvalidBoardConstraints(format!(
            "{:?} at {:?} has no number",
            terrain, spec.coord
        ))),
        (_, Some(n)) if !(2..=12).contains(&n) || n == 7 => Err(
            ConstructionError::InvalidBoardConstraints(format!(
                "number {} at {:?} is not a valid production number",
                n, spec.coord
            )),
        ),
        _ => Ok(()),
    }
}
