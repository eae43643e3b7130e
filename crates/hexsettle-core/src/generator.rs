//! Seeded board generation.
//!
//! A `BoardLayout` says what goes on the board (terrain counts, number
//! tokens, harbors); `generate` decides where. Layouts breaking the
//! hot-number rule are re-sampled from the same seeded stream, and after
//! [`MAX_LAYOUT_ATTEMPTS`] failures generation gives up with an error rather
//! than returning a board that breaks the rules.

use crate::board::{
    tile_count, Board, ConstructionError, Harbor, HarborPlacement, Resource, Terrain, TileSpec,
    MAX_RADIUS,
};
use crate::hex::HexCoord;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Re-sampling budget for a constraint-satisfying layout
pub const MAX_LAYOUT_ATTEMPTS: usize = 1000;

/// Token sequence laid along the spiral on the standard board
pub const STANDARD_TOKEN_ORDER: [u8; 18] = [
    5, 2, 6, 3, 8, 10, 9, 12, 11, 4, 8, 10, 9, 4, 5, 6, 3, 11,
];

/// The most frequently rolled numbers
const HOT_NUMBERS: [u8; 2] = [6, 8];

/// How number tokens are put on tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenPlacement {
    /// Numbers shuffled independently of terrain
    Shuffled,
    /// Numbers laid in the listed order along a spiral, outer ring first,
    /// skipping deserts. The spiral's starting corner is random.
    Spiral,
}

/// What a generated board is made of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Rings around the center tile
    pub radius: u32,
    /// How many tiles of each terrain
    pub terrains: Vec<(Terrain, u32)>,
    /// Number tokens, one per non-desert tile
    pub numbers: Vec<u8>,
    /// Forbid 6 and 8 on neighboring tiles
    pub spread_hot_numbers: bool,
    pub tokens: TokenPlacement,
    /// Harbor kinds to spread along the coast
    pub harbors: Vec<Harbor>,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl BoardLayout {
    /// The standard 19-tile board
    pub fn standard() -> Self {
        Self {
            radius: 2,
            terrains: vec![
                (Terrain::Forest, 4),
                (Terrain::Hills, 3),
                (Terrain::Pasture, 4),
                (Terrain::Fields, 4),
                (Terrain::Mountains, 3),
                (Terrain::Desert, 1),
            ],
            numbers: STANDARD_TOKEN_ORDER.to_vec(),
            spread_hot_numbers: true,
            tokens: TokenPlacement::Spiral,
            harbors: vec![
                Harbor::Generic,
                Harbor::Generic,
                Harbor::Generic,
                Harbor::Generic,
                Harbor::Specific(Resource::Wood),
                Harbor::Specific(Resource::Brick),
                Harbor::Specific(Resource::Sheep),
                Harbor::Specific(Resource::Wheat),
                Harbor::Specific(Resource::Ore),
            ],
        }
    }

    fn desert_count(&self) -> u32 {
        self.terrains
            .iter()
            .filter(|(t, _)| *t == Terrain::Desert)
            .map(|(_, n)| n)
            .sum()
    }

    /// Check the counts add up for the board size
    pub fn validate(&self) -> Result<(), ConstructionError> {
        if self.radius > MAX_RADIUS {
            return Err(ConstructionError::InvalidTopology(format!(
                "radius {} exceeds maximum {}",
                self.radius, MAX_RADIUS
            )));
        }

        let tiles = tile_count(self.radius) as u32;
        let listed: u32 = self.terrains.iter().map(|(_, n)| n).sum();
        if listed != tiles {
            return Err(ConstructionError::InvalidBoardConstraints(format!(
                "{} terrains listed for {} tiles",
                listed, tiles
            )));
        }

        let deserts = self.desert_count();
        if deserts == 0 {
            return Err(ConstructionError::InvalidBoardConstraints(
                "layout has no desert for the robber".into(),
            ));
        }
        if self.numbers.len() as u32 != tiles - deserts {
            return Err(ConstructionError::InvalidBoardConstraints(format!(
                "{} numbers for {} producing tiles",
                self.numbers.len(),
                tiles - deserts
            )));
        }
        if let Some(bad) = self
            .numbers
            .iter()
            .find(|n| !(2..=12).contains(*n) || **n == 7)
        {
            return Err(ConstructionError::InvalidBoardConstraints(format!(
                "{} is not a production number",
                bad
            )));
        }

        let coast = 6 * (2 * self.radius + 1) as usize;
        if self.harbors.len() > coast {
            return Err(ConstructionError::InvalidBoardConstraints(format!(
                "{} harbors for {} coastal edges",
                self.harbors.len(),
                coast
            )));
        }
        Ok(())
    }
}

/// Generate a board from `layout`, deterministically for a given `seed`
pub fn generate(layout: &BoardLayout, seed: u64) -> Result<Board, ConstructionError> {
    layout.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let coords = HexCoord::default().spiral(layout.radius);
    let mut terrains: Vec<Terrain> = layout
        .terrains
        .iter()
        .flat_map(|&(terrain, n)| std::iter::repeat_n(terrain, n as usize))
        .collect();

    for attempt in 0..MAX_LAYOUT_ATTEMPTS {
        terrains.shuffle(&mut rng);
        let placed: HashMap<HexCoord, Terrain> =
            coords.iter().copied().zip(terrains.iter().copied()).collect();
        let numbers = place_numbers(layout, &placed, &mut rng);

        if layout.spread_hot_numbers && has_adjacent_hot_numbers(&numbers) {
            continue;
        }

        let specs = coords
            .iter()
            .map(|coord| TileSpec {
                coord: *coord,
                terrain: placed.get(coord).copied().unwrap_or(Terrain::Desert),
                number: numbers.get(coord).copied(),
            })
            .collect();
        let board = Board::new(layout.radius, specs)?;
        let harbors = place_harbors(&board, &layout.harbors, &mut rng);
        debug!(seed, attempt, "board generated");
        return board.with_harbors(harbors);
    }

    debug!(seed, "layout attempts exhausted");
    Err(ConstructionError::InvalidBoardConstraints(format!(
        "no layout satisfying the number spread after {} attempts",
        MAX_LAYOUT_ATTEMPTS
    )))
}

/// Draw a fresh layout over the same topology as `board`.
///
/// Tile, vertex and edge ids carry over unchanged; terrain, numbers and
/// harbors are new.
pub fn regenerate(
    board: &Board,
    layout: &BoardLayout,
    seed: u64,
) -> Result<Board, ConstructionError> {
    if layout.radius != board.radius() {
        return Err(ConstructionError::InvalidTopology(format!(
            "layout radius {} does not match board radius {}",
            layout.radius,
            board.radius()
        )));
    }
    generate(layout, seed)
}

fn place_numbers(
    layout: &BoardLayout,
    terrains: &HashMap<HexCoord, Terrain>,
    rng: &mut ChaCha8Rng,
) -> HashMap<HexCoord, u8> {
    let order: Vec<HexCoord> = match layout.tokens {
        TokenPlacement::Shuffled => HexCoord::default().spiral(layout.radius),
        TokenPlacement::Spiral => {
            let rotation = rng.gen_range(0..6);
            (0..=layout.radius)
                .rev()
                .flat_map(|k| {
                    let mut ring = HexCoord::default().ring(k);
                    let shift = (rotation * k as usize) % ring.len();
                    ring.rotate_left(shift);
                    ring
                })
                .collect()
        }
    };

    let mut numbers = layout.numbers.clone();
    if layout.tokens == TokenPlacement::Shuffled {
        numbers.shuffle(rng);
    }

    order
        .into_iter()
        .filter(|coord| terrains.get(coord).is_some_and(|t| *t != Terrain::Desert))
        .zip(numbers)
        .collect()
}

fn has_adjacent_hot_numbers(numbers: &HashMap<HexCoord, u8>) -> bool {
    numbers
        .iter()
        .filter(|(_, n)| HOT_NUMBERS.contains(*n))
        .any(|(coord, _)| {
            coord
                .neighbors()
                .iter()
                .any(|nb| numbers.get(nb).is_some_and(|n| HOT_NUMBERS.contains(n)))
        })
}

/// Spread harbors evenly around the coast, starting at a random edge
fn place_harbors(board: &Board, kinds: &[Harbor], rng: &mut ChaCha8Rng) -> Vec<HarborPlacement> {
    if kinds.is_empty() {
        return Vec::new();
    }

    let mut coast = board.coastal_edges();
    coast.sort_by(|a, b| {
        let angle = |id| board.edge(id).map(|e| e.coord.angle()).unwrap_or_default();
        angle(*a).total_cmp(&angle(*b))
    });

    let mut kinds = kinds.to_vec();
    kinds.shuffle(rng);

    let n = coast.len();
    let count = kinds.len();
    let offset = rng.gen_range(0..n);
    kinds
        .into_iter()
        .enumerate()
        .map(|(i, harbor)| HarborPlacement {
            edge: coast[(offset + i * n / count) % n],
            harbor,
        })
        .collect()
}
