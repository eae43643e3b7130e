//! Resource production and the bank.
//!
//! Yields for one roll are computed as a single batch before anything is
//! paid out, so one player's balance can never affect another's yield.

use crate::board::{Board, PlayerId, Resource, TileId, VertexId};
use crate::occupancy::Occupancy;
use crate::player::ResourceHand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cards per resource in a standard finite bank
pub const STANDARD_BANK_SIZE: u32 = 19;

/// Resources owed to each player by one roll (or one setup windfall)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Production {
    grants: BTreeMap<PlayerId, ResourceHand>,
}

impl Production {
    pub fn new() -> Self {
        Self::default()
    }

    /// Production paying a single hand to one player
    pub fn single(player: PlayerId, hand: ResourceHand) -> Self {
        let mut production = Self::new();
        for (resource, amount) in hand.iter() {
            production.grant(player, resource, amount);
        }
        production
    }

    pub fn grant(&mut self, player: PlayerId, resource: Resource, amount: u32) {
        if amount > 0 {
            self.grants.entry(player).or_default().add(resource, amount);
        }
    }

    /// What `player` is owed (empty if nothing)
    pub fn get(&self, player: PlayerId) -> ResourceHand {
        self.grants.get(&player).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.values().all(ResourceHand::is_empty)
    }

    /// Total demand for one resource across all players
    pub fn demand(&self, resource: Resource) -> u32 {
        self.grants.values().map(|h| h.get(resource)).sum()
    }

    /// Grants in ascending player order
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &ResourceHand)> + '_ {
        self.grants.iter().map(|(p, h)| (*p, h))
    }

    pub fn into_grants(self) -> Vec<(PlayerId, ResourceHand)> {
        self.grants
            .into_iter()
            .filter(|(_, h)| !h.is_empty())
            .collect()
    }
}

/// What a roll of `roll` produces.
///
/// Every tile numbered `roll` other than the robber's pays its resource to
/// the structures on its corners: 1 per settlement, 2 per city.
pub fn roll_yield(board: &Board, occupancy: &Occupancy, robber: TileId, roll: u8) -> Production {
    let mut production = Production::new();
    if roll == 7 {
        return production;
    }

    for tile in board.tiles() {
        if tile.number != Some(roll) || tile.id == robber {
            continue;
        }
        let Some(resource) = tile.resource() else {
            continue;
        };
        for &vertex in &tile.corners {
            if let Some(structure) = occupancy.structure_at(vertex) {
                production.grant(structure.owner, resource, structure.tier.yield_multiplier());
            }
        }
    }

    production
}

/// One of each resource from the producing tiles around a vertex
pub fn settlement_yield(board: &Board, vertex: VertexId) -> ResourceHand {
    let mut hand = ResourceHand::new();
    for &tile in board.tiles_of_vertex(vertex) {
        if let Some(resource) = board.tile(tile).and_then(|t| t.resource()) {
            hand.add(resource, 1);
        }
    }
    hand
}

// ==================== Bank ====================

/// Whether resources are created on demand or drawn from a finite supply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankPolicy {
    #[default]
    Unlimited,
    Finite { per_resource: u32 },
}

/// The resource supply. `None` stock means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    stock: Option<ResourceHand>,
}

impl Bank {
    pub fn new(policy: BankPolicy) -> Self {
        let stock = match policy {
            BankPolicy::Unlimited => None,
            BankPolicy::Finite { per_resource } => Some(ResourceHand::with_amounts(
                per_resource,
                per_resource,
                per_resource,
                per_resource,
                per_resource,
            )),
        };
        Self { stock }
    }

    pub fn is_unlimited(&self) -> bool {
        self.stock.is_none()
    }

    /// Cards left, or `None` for an unlimited bank
    pub fn stock(&self) -> Option<&ResourceHand> {
        self.stock.as_ref()
    }

    /// Whether the bank can hand out `amount` of `resource`
    pub fn has(&self, resource: Resource, amount: u32) -> bool {
        self.stock.as_ref().is_none_or(|s| s.get(resource) >= amount)
    }

    /// Return spent cards to the bank
    pub fn deposit(&mut self, hand: &ResourceHand) {
        if let Some(stock) = self.stock.as_mut() {
            stock.add_hand(hand);
        }
    }

    /// Take cards out of the bank. Returns false and changes nothing if short.
    pub fn withdraw(&mut self, hand: &ResourceHand) -> bool {
        match self.stock.as_mut() {
            Some(stock) => stock.try_subtract(hand),
            None => true,
        }
    }

    /// Settle a production batch against the stock and return what is paid.
    ///
    /// Per resource: if the stock covers total demand everyone is paid. If it
    /// does not and exactly one player is owed, that player gets what is
    /// left. Otherwise nobody receives that resource.
    pub fn settle(&mut self, production: Production) -> Production {
        let Some(stock) = self.stock.as_mut() else {
            return production;
        };

        let mut paid = production;
        for resource in Resource::ALL {
            let demand = paid.demand(resource);
            if demand == 0 {
                continue;
            }
            let available = stock.get(resource);
            if demand <= available {
                stock.set(resource, available - demand);
                continue;
            }

            let claimants: Vec<PlayerId> = paid
                .iter()
                .filter(|(_, h)| h.get(resource) > 0)
                .map(|(p, _)| p)
                .collect();
            if let [only] = claimants[..] {
                if let Some(hand) = paid.grants.get_mut(&only) {
                    hand.set(resource, available);
                }
                stock.set(resource, 0);
            } else {
                for hand in paid.grants.values_mut() {
                    hand.set(resource, 0);
                }
            }
        }
        paid.grants.retain(|_, h| !h.is_empty());
        paid
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new(BankPolicy::default())
    }
}
