//! Player state and resource management.
//!
//! This module contains:
//! - `ResourceHand` for managing resource counts
//! - Building costs
//! - `PiecePool`, the configurable starting token counts
//! - `Player` with resources and remaining pieces

use crate::board::{PlayerId, Resource};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts, in [`Resource::ALL`] order
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.wood + self.brick + self.sheep + self.wheat + self.ore
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Brick => &mut self.brick,
            Resource::Sheep => &mut self.sheep,
            Resource::Wheat => &mut self.wheat,
            Resource::Ore => &mut self.ore,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        *self.slot_mut(resource) = count;
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot_mut(resource) += amount;
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if this hand holds at least `other`, i.e. `other` is a submultiset
    pub fn contains(&self, other: &ResourceHand) -> bool {
        Resource::ALL
            .into_iter()
            .all(|r| self.get(r) >= other.get(r))
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        self.contains(cost)
    }

    /// Remove `cost` from the hand, or return `None` if it is not fully held
    pub fn checked_sub(&self, cost: &ResourceHand) -> Option<ResourceHand> {
        let mut out = *self;
        for resource in Resource::ALL {
            *out.slot_mut(resource) = self.get(resource).checked_sub(cost.get(resource))?;
        }
        Some(out)
    }

    /// Try to subtract, returning false (and leaving the hand alone) if insufficient
    pub fn try_subtract(&mut self, cost: &ResourceHand) -> bool {
        match self.checked_sub(cost) {
            Some(rest) => {
                *self = rest;
                true
            }
            None => false,
        }
    }

    /// Resources with a non-zero count, in [`Resource::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, n)| *n > 0)
    }

    /// Remove one card chosen uniformly among all cards held (for robber stealing)
    pub fn steal_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let mut pick = rng.gen_range(0..total);
        for resource in Resource::ALL {
            let held = self.get(resource);
            if pick < held {
                *self.slot_mut(resource) -= 1;
                return Some(resource);
            }
            pick -= held;
        }
        None
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 wood, 1 brick, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// Cost to upgrade to city: 2 wheat, 3 ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }
}

/// Kind of placeable piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Piece {
    Settlement,
    City,
    Road,
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Piece::Settlement => "settlement",
            Piece::City => "city",
            Piece::Road => "road",
        })
    }
}

/// Starting token counts per player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecePool {
    pub settlements: u32,
    pub cities: u32,
    pub roads: u32,
}

impl Default for PiecePool {
    fn default() -> Self {
        Self {
            settlements: 5,
            cities: 4,
            roads: 15,
        }
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Player index (0..N-1)
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Current resources
    pub resources: ResourceHand,
    /// Number of settlements remaining to build
    pub settlements_remaining: u32,
    /// Number of cities remaining to build
    pub cities_remaining: u32,
    /// Number of roads remaining to build
    pub roads_remaining: u32,
}

impl Player {
    /// Create a new player with the standard pool
    pub fn new(id: PlayerId, name: String) -> Self {
        Self::with_pool(id, name, PiecePool::default())
    }

    pub fn with_pool(id: PlayerId, name: String, pool: PiecePool) -> Self {
        Self {
            id,
            name,
            resources: ResourceHand::new(),
            settlements_remaining: pool.settlements,
            cities_remaining: pool.cities,
            roads_remaining: pool.roads,
        }
    }

    /// Tokens left of a kind
    pub fn remaining(&self, piece: Piece) -> u32 {
        match piece {
            Piece::Settlement => self.settlements_remaining,
            Piece::City => self.cities_remaining,
            Piece::Road => self.roads_remaining,
        }
    }

    /// Take a piece from the pool. Callers check `remaining` first.
    pub(crate) fn take_piece(&mut self, piece: Piece) {
        match piece {
            Piece::Settlement => {
                self.settlements_remaining = self.settlements_remaining.saturating_sub(1)
            }
            Piece::City => {
                self.cities_remaining = self.cities_remaining.saturating_sub(1);
                // Settlement piece returned
                self.settlements_remaining += 1;
            }
            Piece::Road => self.roads_remaining = self.roads_remaining.saturating_sub(1),
        }
    }
}
