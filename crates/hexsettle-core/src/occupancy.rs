//! Structure ownership on top of the static board.
//!
//! The board never changes after generation; `Occupancy` records who owns
//! what on it. Network queries (which edges a player may extend a road to,
//! which players sit on a tile) take the board by reference.

use crate::board::{Board, EdgeId, Harbor, PlayerId, TileId, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Settlement or city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Settlement,
    City,
}

impl Tier {
    /// Victory points provided by this building
    pub fn victory_points(&self) -> u32 {
        match self {
            Tier::Settlement => 1,
            Tier::City => 2,
        }
    }

    /// Resources produced per matching roll
    pub fn yield_multiplier(&self) -> u32 {
        match self {
            Tier::Settlement => 1,
            Tier::City => 2,
        }
    }
}

/// What's built on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    pub owner: PlayerId,
    pub tier: Tier,
}

/// Per-vertex structures and per-edge roads, indexed by board ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    vertices: Vec<Option<Structure>>,
    edges: Vec<Option<PlayerId>>,
}

impl Occupancy {
    /// Empty occupancy sized to `board`
    pub fn new(board: &Board) -> Self {
        Self {
            vertices: vec![None; board.vertices().len()],
            edges: vec![None; board.edges().len()],
        }
    }

    pub fn structure_at(&self, vertex: VertexId) -> Option<Structure> {
        self.vertices.get(vertex.index()).copied().flatten()
    }

    pub fn road_at(&self, edge: EdgeId) -> Option<PlayerId> {
        self.edges.get(edge.index()).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.iter().all(Option::is_none) && self.edges.iter().all(Option::is_none)
    }

    /// All occupied vertices with their structure
    pub fn structures(&self) -> impl Iterator<Item = (VertexId, Structure)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (VertexId(i as u16), s)))
    }

    /// All occupied edges with their owner
    pub fn roads(&self) -> impl Iterator<Item = (EdgeId, PlayerId)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|p| (EdgeId(i as u16), p)))
    }

    pub fn settlements_of(&self, player: PlayerId) -> Vec<VertexId> {
        self.structures()
            .filter(|(_, s)| s.owner == player && s.tier == Tier::Settlement)
            .map(|(v, _)| v)
            .collect()
    }

    pub fn cities_of(&self, player: PlayerId) -> Vec<VertexId> {
        self.structures()
            .filter(|(_, s)| s.owner == player && s.tier == Tier::City)
            .map(|(v, _)| v)
            .collect()
    }

    pub fn roads_of(&self, player: PlayerId) -> Vec<EdgeId> {
        self.roads()
            .filter(|(_, owner)| *owner == player)
            .map(|(e, _)| e)
            .collect()
    }

    /// Victory points from structures on the board
    pub fn victory_points(&self, player: PlayerId) -> u32 {
        self.structures()
            .filter(|(_, s)| s.owner == player)
            .map(|(_, s)| s.tier.victory_points())
            .sum()
    }

    pub(crate) fn place_settlement(&mut self, vertex: VertexId, owner: PlayerId) {
        if let Some(slot) = self.vertices.get_mut(vertex.index()) {
            *slot = Some(Structure {
                owner,
                tier: Tier::Settlement,
            });
        }
    }

    pub(crate) fn upgrade_to_city(&mut self, vertex: VertexId) {
        if let Some(Some(structure)) = self.vertices.get_mut(vertex.index()) {
            structure.tier = Tier::City;
        }
    }

    pub(crate) fn place_road(&mut self, edge: EdgeId, owner: PlayerId) {
        if let Some(slot) = self.edges.get_mut(edge.index()) {
            *slot = Some(owner);
        }
    }

    /// True if any vertex within distance 1 of `vertex` holds a structure
    pub fn violates_distance_rule(&self, board: &Board, vertex: VertexId) -> bool {
        board
            .vertices_within(vertex, 1)
            .into_iter()
            .any(|v| self.structure_at(v).is_some())
    }

    /// Whether a road on `edge` would join `player`'s network.
    ///
    /// An endpoint qualifies if it holds one of the player's structures, or
    /// if it is free of opponent structures and another of the player's
    /// roads meets there. Opponent buildings cut a network.
    pub fn is_network_edge(&self, board: &Board, player: PlayerId, edge: EdgeId) -> bool {
        let Some(endpoints) = board.vertices_of_edge(edge) else {
            return false;
        };
        endpoints.into_iter().any(|v| match self.structure_at(v) {
            Some(s) if s.owner == player => true,
            Some(_) => false,
            None => board
                .edges_of_vertex(v)
                .iter()
                .any(|&e| e != edge && self.road_at(e) == Some(player)),
        })
    }

    /// Unoccupied edges a player's road network can extend onto
    pub fn reachable_edges(&self, board: &Board, player: PlayerId) -> BTreeSet<EdgeId> {
        board
            .edges()
            .iter()
            .map(|e| e.id)
            .filter(|&e| self.road_at(e).is_none() && self.is_network_edge(board, player, e))
            .collect()
    }

    /// Whether `player` owns a road touching `vertex`
    pub fn has_road_at(&self, board: &Board, player: PlayerId, vertex: VertexId) -> bool {
        board
            .edges_of_vertex(vertex)
            .iter()
            .any(|&e| self.road_at(e) == Some(player))
    }

    /// Owners of structures on a tile's corners, ascending
    pub fn owners_on_tile(&self, board: &Board, tile: TileId) -> BTreeSet<PlayerId> {
        board
            .vertices_of_tile(tile)
            .iter()
            .filter_map(|&v| self.structure_at(v).map(|s| s.owner))
            .collect()
    }

    /// Harbors a player can use through their structures
    pub fn harbors_of(&self, board: &Board, player: PlayerId) -> Vec<Harbor> {
        board
            .harbors()
            .iter()
            .filter(|h| {
                board.vertices_of_edge(h.edge).is_some_and(|vs| {
                    vs.iter()
                        .any(|&v| self.structure_at(v).is_some_and(|s| s.owner == player))
                })
            })
            .map(|h| h.harbor)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::fixed_board;
    use crate::board::{HarborPlacement, Resource};
    use crate::hex::HexCoord;

    #[test]
    fn test_new_occupancy_is_empty() {
        let board = fixed_board();
        let occupancy = Occupancy::new(&board);
        assert!(occupancy.is_empty());
        assert_eq!(occupancy.structures().count(), 0);
    }

    #[test]
    fn test_distance_rule() {
        let board = fixed_board();
        let mut occupancy = Occupancy::new(&board);
        let v = VertexId(0);
        occupancy.place_settlement(v, 0);

        for &neighbor in board.adjacent_vertices(v) {
            assert!(occupancy.violates_distance_rule(&board, neighbor));
        }
        let far = board
            .vertices()
            .iter()
            .map(|vx| vx.id)
            .find(|&id| id != v && !board.vertices_within(v, 1).contains(&id))
            .unwrap();
        assert!(!occupancy.violates_distance_rule(&board, far));
    }

    #[test]
    fn test_road_connectivity() {
        let board = fixed_board();
        let mut occupancy = Occupancy::new(&board);
        let v = VertexId(0);
        occupancy.place_settlement(v, 0);

        let reachable = occupancy.reachable_edges(&board, 0);
        let incident: BTreeSet<EdgeId> = board.edges_of_vertex(v).iter().copied().collect();
        assert_eq!(reachable, incident);
        assert!(occupancy.reachable_edges(&board, 1).is_empty());

        // Extending a road opens the edges at its far end
        let first = *incident.iter().next().unwrap();
        occupancy.place_road(first, 0);
        let far_end = board.edge(first).unwrap().other_end(v).unwrap();
        for &e in board.edges_of_vertex(far_end) {
            if e != first {
                assert!(occupancy.is_network_edge(&board, 0, e));
            }
        }
    }

    #[test]
    fn test_opponent_settlement_blocks_network() {
        let board = fixed_board();
        let mut occupancy = Occupancy::new(&board);
        let v = VertexId(0);
        occupancy.place_settlement(v, 0);
        let road = board.edges_of_vertex(v)[0];
        occupancy.place_road(road, 0);
        let far_end = board.edge(road).unwrap().other_end(v).unwrap();

        occupancy.place_settlement(far_end, 1);
        for &e in board.edges_of_vertex(far_end) {
            if e != road {
                assert!(!occupancy.is_network_edge(&board, 0, e));
                assert!(occupancy.is_network_edge(&board, 1, e));
            }
        }
    }

    #[test]
    fn test_upgrade_and_victory_points() {
        let board = fixed_board();
        let mut occupancy = Occupancy::new(&board);
        occupancy.place_settlement(VertexId(0), 1);
        occupancy.place_settlement(VertexId(20), 1);
        assert_eq!(occupancy.victory_points(1), 2);

        occupancy.upgrade_to_city(VertexId(0));
        assert_eq!(occupancy.victory_points(1), 3);
        assert_eq!(occupancy.cities_of(1), vec![VertexId(0)]);
        assert_eq!(occupancy.settlements_of(1), vec![VertexId(20)]);
        assert_eq!(occupancy.victory_points(0), 0);
    }

    #[test]
    fn test_owners_on_tile() {
        let board = fixed_board();
        let mut occupancy = Occupancy::new(&board);
        let center = board.tile_at(HexCoord::default()).unwrap();
        let corners = board.vertices_of_tile(center).to_vec();
        occupancy.place_settlement(corners[0], 2);
        occupancy.place_settlement(corners[3], 0);

        let owners: Vec<_> = occupancy.owners_on_tile(&board, center).into_iter().collect();
        assert_eq!(owners, vec![0, 2]);
    }

    #[test]
    fn test_harbor_access() {
        let board = fixed_board();
        let edge = board.coastal_edges()[3];
        let board = board
            .with_harbors(vec![HarborPlacement {
                edge,
                harbor: Harbor::Specific(Resource::Wheat),
            }])
            .unwrap();
        let mut occupancy = Occupancy::new(&board);
        let [a, _] = board.vertices_of_edge(edge).unwrap();

        assert!(occupancy.harbors_of(&board, 0).is_empty());
        occupancy.place_settlement(a, 0);
        assert_eq!(
            occupancy.harbors_of(&board, 0),
            vec![Harbor::Specific(Resource::Wheat)]
        );
    }
}
