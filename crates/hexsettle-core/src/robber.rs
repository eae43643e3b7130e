//! Robber helpers: who discards after a 7, and who can be robbed.

use crate::board::{Board, PlayerId, Resource, TileId};
use crate::occupancy::Occupancy;
use crate::player::{Player, ResourceHand};

/// Players holding more than `threshold` cards and how many each must give
/// back, in ascending player order
pub fn discard_obligations(players: &[Player], threshold: u32) -> Vec<(PlayerId, u32)> {
    players
        .iter()
        .filter(|p| p.resources.total() > threshold)
        .map(|p| (p.id, p.resources.total() / 2))
        .collect()
}

/// Opponents with a structure on `tile` who hold at least one card, ascending
pub fn eligible_victims(
    board: &Board,
    occupancy: &Occupancy,
    players: &[Player],
    tile: TileId,
    thief: PlayerId,
) -> Vec<PlayerId> {
    occupancy
        .owners_on_tile(board, tile)
        .into_iter()
        .filter(|&owner| owner != thief)
        .filter(|&owner| {
            players
                .get(owner as usize)
                .is_some_and(|p| !p.resources.is_empty())
        })
        .collect()
}

/// Every way to discard exactly `count` cards out of `hand`
pub fn discard_choices(hand: &ResourceHand, count: u32) -> Vec<ResourceHand> {
    let mut choices = Vec::new();
    collect_choices(hand, count, 0, ResourceHand::new(), &mut choices);
    choices
}

fn collect_choices(
    hand: &ResourceHand,
    left: u32,
    index: usize,
    current: ResourceHand,
    out: &mut Vec<ResourceHand>,
) {
    if left == 0 {
        out.push(current);
        return;
    }
    let Some(&resource) = Resource::ALL.get(index) else {
        return;
    };
    for take in (0..=hand.get(resource).min(left)).rev() {
        let mut next = current;
        next.set(resource, take);
        collect_choices(hand, left - take, index + 1, next, out);
    }
}
