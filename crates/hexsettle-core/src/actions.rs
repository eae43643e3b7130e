//! Intents players submit and the events accepted intents produce.
//!
//! Both are closed tagged unions so they can be matched exhaustively and
//! carried over any serde format.

use crate::board::{EdgeId, PlayerId, Resource, TileId, VertexId};
use crate::player::ResourceHand;
use serde::{Deserialize, Serialize};

/// Everything a player can ask the engine to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Intent {
    // ==================== Placement ====================
    /// Place a settlement (setup placement or paid build)
    PlaceSettlement { vertex: VertexId },
    /// Place a road (setup placement or paid build)
    PlaceRoad { edge: EdgeId },
    /// Upgrade one of the actor's settlements
    UpgradeToCity { vertex: VertexId },

    // ==================== Turn Actions ====================
    /// Roll the dice (must be done at start of turn)
    RollDice,
    /// Finish the turn and pass to the next player
    EndTurn,

    // ==================== Robber Actions ====================
    /// Give back half the hand after a 7
    Discard { resources: ResourceHand },
    /// Move the robber to a new tile (after rolling 7)
    MoveRobber { tile: TileId },
    /// Choose a player to steal from (after moving robber)
    StealFrom { victim: PlayerId },

    // ==================== Trading ====================
    /// Trade with the bank at 4:1, or better through a harbor
    BankTrade {
        give: Resource,
        receive: Resource,
    },
    /// Offer a trade to one other player
    ProposeTrade { offer: TradeOffer },
    /// Answer the pending offer (target player only)
    RespondToTrade { accept: bool },
    /// Withdraw your own pending offer
    CancelTrade,

    // ==================== Setup ====================
    /// Draw a new board before anything has been placed
    RegenerateBoard { seed: u64 },
}

impl Intent {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::PlaceSettlement { .. } => "place_settlement",
            Intent::PlaceRoad { .. } => "place_road",
            Intent::UpgradeToCity { .. } => "upgrade_to_city",
            Intent::RollDice => "roll_dice",
            Intent::EndTurn => "end_turn",
            Intent::Discard { .. } => "discard",
            Intent::MoveRobber { .. } => "move_robber",
            Intent::StealFrom { .. } => "steal_from",
            Intent::BankTrade { .. } => "bank_trade",
            Intent::ProposeTrade { .. } => "propose_trade",
            Intent::RespondToTrade { .. } => "respond_to_trade",
            Intent::CancelTrade => "cancel_trade",
            Intent::RegenerateBoard { .. } => "regenerate_board",
        }
    }
}

/// A trade offer between the turn owner and one other player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    /// Player who made the offer
    pub from: PlayerId,
    /// Player the offer is made to
    pub to: PlayerId,
    /// What the proposer gives
    pub offering: ResourceHand,
    /// What the proposer wants back
    pub requesting: ResourceHand,
}

/// Events emitted by accepted intents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // ==================== Placement ====================
    SettlementPlaced {
        player: PlayerId,
        vertex: VertexId,
    },
    RoadPlaced { player: PlayerId, edge: EdgeId },
    CityBuilt {
        player: PlayerId,
        vertex: VertexId,
    },

    // ==================== Dice & Production ====================
    DiceRolled {
        player: PlayerId,
        dice: (u8, u8),
        total: u8,
    },
    /// Per-player grants from one roll or setup windfall, ascending by player
    ResourcesProduced {
        grants: Vec<(PlayerId, ResourceHand)>,
    },

    // ==================== Robber ====================
    DiscardRequired { player: PlayerId, count: u32 },
    ResourcesDiscarded {
        player: PlayerId,
        resources: ResourceHand,
    },
    RobberMoved {
        player: PlayerId,
        from: TileId,
        to: TileId,
    },
    ResourceStolen {
        victim: PlayerId,
        thief: PlayerId,
        resource: Resource,
    },

    // ==================== Trading ====================
    BankTraded {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },
    TradeProposed { offer: TradeOffer },
    TradeAccepted { offer: TradeOffer },
    TradeDeclined { offer: TradeOffer },
    TradeCancelled { offer: TradeOffer },

    // ==================== Flow ====================
    BoardRegenerated { seed: u64 },
    /// Setup is over; the first regular turn begins
    PlayStarted { first_player: PlayerId },
    TurnEnded {
        player: PlayerId,
        next: PlayerId,
    },
    GameEnded {
        winner: PlayerId,
        victory_points: u32,
    },
}
