//! Hexsettle - rules engine for a hex-board settlement game
//!
//! This crate provides the authoritative game logic, including:
//! - Hex coordinate system for tiles, corners and sides
//! - Board arena with tiles, vertices, edges and harbors
//! - Seeded board generation with the 6/8 fairness rule
//! - Move validation and legal-intent enumeration
//! - Resource production, the bank and the robber
//! - Turn/phase state machine with atomic intent application
//!
//! # Architecture
//!
//! The engine is synchronous and does no I/O. Callers submit an [`Intent`]
//! for a player; [`GameState::apply`] either commits the whole effect and
//! returns the emitted [`Event`]s, or returns a [`Rejection`] and changes
//! nothing. Many matches can run side by side since a `GameState` shares
//! nothing.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system for hex tiles, vertices, and edges
//! - [`board`]: Static board topology
//! - [`occupancy`]: Who owns what on the board
//! - [`generator`]: Randomized, constraint-satisfying board layouts
//! - [`player`]: Player state and resources
//! - [`actions`]: Intents and events
//! - [`rules`]: Move validator
//! - [`production`]: Dice yields and the bank
//! - [`robber`]: Discards and theft
//! - [`game`]: Game state machine

pub mod actions;
pub mod board;
pub mod game;
pub mod generator;
pub mod hex;
pub mod occupancy;
pub mod player;
pub mod production;
pub mod robber;
pub mod rules;

// Re-export commonly used types
pub use actions::{Event, Intent, TradeOffer};
pub use board::{
    Board, ConstructionError, EdgeId, Harbor, PlayerId, Resource, Terrain, Tile, TileId, VertexId,
};
pub use game::{GameConfig, GameState, Outcome, Phase, SetupStep, SetupTurn, Stage};
pub use generator::{BoardLayout, TokenPlacement};
pub use hex::{EdgeCoord, HexCoord, VertexCoord};
pub use occupancy::{Occupancy, Structure, Tier};
pub use player::{Piece, PiecePool, Player, ResourceHand};
pub use production::{Bank, BankPolicy, Production};
pub use rules::Rejection;
