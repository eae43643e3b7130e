//! Move legality.
//!
//! Every check here is a pure function of `&GameState`. `validate` answers
//! whether one intent may be applied right now, and `legal_intents` lists
//! what a player could submit, built by filtering candidates through
//! `validate` so the two never disagree.

use crate::actions::{Intent, TradeOffer};
use crate::board::{EdgeId, PlayerId, Resource, TileId, VertexId};
use crate::game::{GameState, Phase, SetupStep, Stage};
use crate::occupancy::Tier;
use crate::player::{costs, Piece, Player, ResourceHand};
use crate::robber;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bank exchange rate without a harbor
pub const BANK_RATE: u32 = 4;

/// Why an intent was refused. Rejections are ordinary results, never panics.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("Game is over")]
    GameAlreadyEnded,

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Not your turn")]
    NotPlayersTurn,

    #[error("Invalid action for current phase")]
    WrongSubStage,

    #[error("Unknown vertex {0}")]
    UnknownVertex(VertexId),

    #[error("Unknown edge {0}")]
    UnknownEdge(EdgeId),

    #[error("Unknown tile {0}")]
    UnknownTile(TileId),

    #[error("Vertex {0} is already occupied")]
    OccupiedVertex(VertexId),

    #[error("Edge {0} is already occupied")]
    OccupiedEdge(EdgeId),

    #[error("Too close to another settlement")]
    DistanceRuleViolation,

    #[error("Not connected to your road network")]
    NotConnectedToNetwork,

    #[error("No {0} pieces remaining")]
    InsufficientTokens(Piece),

    #[error("Cannot afford this")]
    InsufficientResources,

    #[error("Vertex {0} does not hold your settlement")]
    NotOwnSettlement(VertexId),

    #[error("Must discard exactly {expected} cards, got {actual}")]
    InvalidDiscardAmount { expected: u32, actual: u32 },

    #[error("Discard includes cards you do not hold")]
    InvalidDiscardContents,

    #[error("Robber must move to a different tile")]
    RobberDestinationUnchanged,

    #[error("Player {0} cannot be robbed")]
    NoEligibleVictim(PlayerId),

    #[error("Invalid trade")]
    InvalidTrade,

    #[error("Bank has no {0} left")]
    BankDepleted(Resource),

    #[error("Board can only be regenerated before anything is placed")]
    BoardLocked,

    #[error("Board regeneration failed: {0}")]
    RegenerationFailed(String),

    #[error("Dice values must be between 1 and 6")]
    InvalidDice,
}

/// Check whether `actor` may apply `intent` to `state`
pub fn validate(state: &GameState, actor: PlayerId, intent: &Intent) -> Result<(), Rejection> {
    if state.is_finished() {
        return Err(Rejection::GameAlreadyEnded);
    }
    let player = state.player(actor).ok_or(Rejection::UnknownPlayer(actor))?;

    match state.phase() {
        Phase::Ended { .. } => Err(Rejection::GameAlreadyEnded),
        Phase::Setup { step, .. } => validate_setup(state, player, step, intent),
        Phase::Play { stage, .. } => validate_play(state, player, stage, intent),
    }
}

fn validate_setup(
    state: &GameState,
    player: &Player,
    step: &SetupStep,
    intent: &Intent,
) -> Result<(), Rejection> {
    match (step, intent) {
        (SetupStep::Settlement, Intent::PlaceSettlement { vertex }) => {
            require_turn(state, player.id)?;
            check_settlement_site(state, player.id, *vertex, false)?;
            require_piece(player, Piece::Settlement)
        }
        (SetupStep::Road { settlement }, Intent::PlaceRoad { edge }) => {
            require_turn(state, player.id)?;
            check_free_edge(state, *edge)?;
            let touches = state
                .board()
                .vertices_of_edge(*edge)
                .is_some_and(|vs| vs.contains(settlement));
            if !touches {
                return Err(Rejection::NotConnectedToNetwork);
            }
            require_piece(player, Piece::Road)
        }
        (SetupStep::Settlement, Intent::RegenerateBoard { .. }) => {
            require_turn(state, player.id)?;
            if !state.occupancy().is_empty() {
                return Err(Rejection::BoardLocked);
            }
            Ok(())
        }
        (SetupStep::Road { .. }, Intent::RegenerateBoard { .. }) => Err(Rejection::BoardLocked),
        _ => Err(Rejection::WrongSubStage),
    }
}

fn validate_play(
    state: &GameState,
    player: &Player,
    stage: &Stage,
    intent: &Intent,
) -> Result<(), Rejection> {
    let actor = player.id;
    match (stage, intent) {
        // ==================== Dice ====================
        (Stage::AwaitingRoll, Intent::RollDice) => require_turn(state, actor),

        // ==================== Robber ====================
        (Stage::AwaitingDiscard { remaining }, Intent::Discard { resources }) => {
            let owed = remaining
                .iter()
                .find(|(p, _)| *p == actor)
                .map(|(_, n)| *n)
                .ok_or(Rejection::NotPlayersTurn)?;
            check_discard(player, owed, resources)
        }
        (Stage::AwaitingRobberMove, Intent::MoveRobber { tile }) => {
            require_turn(state, actor)?;
            if state.board().tile(*tile).is_none() {
                return Err(Rejection::UnknownTile(*tile));
            }
            if *tile == state.robber() {
                return Err(Rejection::RobberDestinationUnchanged);
            }
            Ok(())
        }
        (Stage::AwaitingRobberTheft { victims, .. }, Intent::StealFrom { victim }) => {
            require_turn(state, actor)?;
            if victims.contains(victim) {
                Ok(())
            } else {
                Err(Rejection::NoEligibleVictim(*victim))
            }
        }

        // ==================== Building ====================
        (Stage::AwaitingBuild, Intent::PlaceSettlement { vertex }) => {
            require_turn(state, actor)?;
            check_settlement_site(state, actor, *vertex, true)?;
            require_piece(player, Piece::Settlement)?;
            require_funds(&player.resources, &costs::settlement())
        }
        (Stage::AwaitingBuild, Intent::PlaceRoad { edge }) => {
            require_turn(state, actor)?;
            check_free_edge(state, *edge)?;
            if !state.occupancy().is_network_edge(state.board(), actor, *edge) {
                return Err(Rejection::NotConnectedToNetwork);
            }
            require_piece(player, Piece::Road)?;
            require_funds(&player.resources, &costs::road())
        }
        (Stage::AwaitingBuild, Intent::UpgradeToCity { vertex }) => {
            require_turn(state, actor)?;
            if state.board().vertex(*vertex).is_none() {
                return Err(Rejection::UnknownVertex(*vertex));
            }
            match state.occupancy().structure_at(*vertex) {
                Some(s) if s.owner == actor && s.tier == Tier::Settlement => {}
                _ => return Err(Rejection::NotOwnSettlement(*vertex)),
            }
            require_piece(player, Piece::City)?;
            require_funds(&player.resources, &costs::city())
        }

        // ==================== Trading ====================
        (Stage::AwaitingBuild, Intent::BankTrade { give, receive }) => {
            require_turn(state, actor)?;
            if give == receive {
                return Err(Rejection::InvalidTrade);
            }
            let rate = bank_rate(state, actor, *give);
            require_funds(&player.resources, &ResourceHand::single(*give, rate))?;
            if !state.bank().has(*receive, 1) {
                return Err(Rejection::BankDepleted(*receive));
            }
            Ok(())
        }
        (Stage::AwaitingBuild, Intent::ProposeTrade { offer }) => {
            require_turn(state, actor)?;
            check_offer(state, player, offer)
        }
        (Stage::AwaitingTrade { offer }, Intent::RespondToTrade { accept }) => {
            if actor != offer.to {
                return Err(Rejection::NotPlayersTurn);
            }
            if *accept {
                require_funds(&player.resources, &offer.requesting)?;
            }
            Ok(())
        }
        (Stage::AwaitingTrade { .. }, Intent::CancelTrade) => require_turn(state, actor),

        // ==================== Turn ====================
        (Stage::AwaitingBuild, Intent::EndTurn) => require_turn(state, actor),

        (_, Intent::RegenerateBoard { .. }) => Err(Rejection::BoardLocked),
        _ => Err(Rejection::WrongSubStage),
    }
}

fn require_turn(state: &GameState, actor: PlayerId) -> Result<(), Rejection> {
    if state.current_player() == Some(actor) {
        Ok(())
    } else {
        Err(Rejection::NotPlayersTurn)
    }
}

fn require_piece(player: &Player, piece: Piece) -> Result<(), Rejection> {
    if player.remaining(piece) > 0 {
        Ok(())
    } else {
        Err(Rejection::InsufficientTokens(piece))
    }
}

fn require_funds(hand: &ResourceHand, cost: &ResourceHand) -> Result<(), Rejection> {
    if hand.can_afford(cost) {
        Ok(())
    } else {
        Err(Rejection::InsufficientResources)
    }
}

fn check_free_edge(state: &GameState, edge: EdgeId) -> Result<(), Rejection> {
    if state.board().edge(edge).is_none() {
        return Err(Rejection::UnknownEdge(edge));
    }
    if state.occupancy().road_at(edge).is_some() {
        return Err(Rejection::OccupiedEdge(edge));
    }
    Ok(())
}

/// Free vertex, distance rule, and (outside setup) a touching road of the actor's
fn check_settlement_site(
    state: &GameState,
    actor: PlayerId,
    vertex: VertexId,
    needs_road: bool,
) -> Result<(), Rejection> {
    let board = state.board();
    let occupancy = state.occupancy();
    if board.vertex(vertex).is_none() {
        return Err(Rejection::UnknownVertex(vertex));
    }
    if occupancy.structure_at(vertex).is_some() {
        return Err(Rejection::OccupiedVertex(vertex));
    }
    if occupancy.violates_distance_rule(board, vertex) {
        return Err(Rejection::DistanceRuleViolation);
    }
    if needs_road && !occupancy.has_road_at(board, actor, vertex) {
        return Err(Rejection::NotConnectedToNetwork);
    }
    Ok(())
}

fn check_discard(player: &Player, owed: u32, discard: &ResourceHand) -> Result<(), Rejection> {
    if discard.total() != owed {
        return Err(Rejection::InvalidDiscardAmount {
            expected: owed,
            actual: discard.total(),
        });
    }
    if !player.resources.contains(discard) {
        return Err(Rejection::InvalidDiscardContents);
    }
    Ok(())
}

fn check_offer(state: &GameState, player: &Player, offer: &TradeOffer) -> Result<(), Rejection> {
    if offer.from != player.id || offer.to == player.id || state.player(offer.to).is_none() {
        return Err(Rejection::InvalidTrade);
    }
    if offer.offering.is_empty() || offer.requesting.is_empty() {
        return Err(Rejection::InvalidTrade);
    }
    require_funds(&player.resources, &offer.offering)
}

/// Cards of `give` the player must hand the bank for one card back
pub fn bank_rate(state: &GameState, player: PlayerId, give: Resource) -> u32 {
    state
        .occupancy()
        .harbors_of(state.board(), player)
        .into_iter()
        .filter(|h| h.applies_to(give))
        .map(|h| h.rate())
        .fold(BANK_RATE, u32::min)
}

/// Every intent `player` could submit right now.
///
/// Open-ended intents (`ProposeTrade`, `RegenerateBoard`) are not listed.
pub fn legal_intents(state: &GameState, player: PlayerId) -> Vec<Intent> {
    let board = state.board();
    let mut candidates = Vec::new();

    match state.phase() {
        Phase::Ended { .. } => return candidates,

        Phase::Setup { step, .. } => match step {
            SetupStep::Settlement => {
                candidates.extend(
                    board
                        .vertices()
                        .iter()
                        .map(|v| Intent::PlaceSettlement { vertex: v.id }),
                );
            }
            SetupStep::Road { settlement } => {
                candidates.extend(
                    board
                        .edges_of_vertex(*settlement)
                        .iter()
                        .map(|&edge| Intent::PlaceRoad { edge }),
                );
            }
        },

        Phase::Play { stage, .. } => match stage {
            Stage::AwaitingRoll => candidates.push(Intent::RollDice),
            Stage::AwaitingDiscard { remaining } => {
                let owed = remaining.iter().find(|(p, _)| *p == player);
                if let (Some((_, count)), Some(p)) = (owed, state.player(player)) {
                    candidates.extend(
                        robber::discard_choices(&p.resources, *count)
                            .into_iter()
                            .map(|resources| Intent::Discard { resources }),
                    );
                }
            }
            Stage::AwaitingRobberMove => {
                candidates.extend(
                    board
                        .tiles()
                        .iter()
                        .map(|t| Intent::MoveRobber { tile: t.id }),
                );
            }
            Stage::AwaitingRobberTheft { victims, .. } => {
                candidates.extend(victims.iter().map(|&victim| Intent::StealFrom { victim }));
            }
            Stage::AwaitingBuild => {
                candidates.push(Intent::EndTurn);
                candidates.extend(
                    state
                        .occupancy()
                        .reachable_edges(board, player)
                        .into_iter()
                        .map(|edge| Intent::PlaceRoad { edge }),
                );
                candidates.extend(
                    board
                        .vertices()
                        .iter()
                        .map(|v| Intent::PlaceSettlement { vertex: v.id }),
                );
                candidates.extend(
                    state
                        .occupancy()
                        .settlements_of(player)
                        .into_iter()
                        .map(|vertex| Intent::UpgradeToCity { vertex }),
                );
                for give in Resource::ALL {
                    for receive in Resource::ALL {
                        candidates.push(Intent::BankTrade { give, receive });
                    }
                }
            }
            Stage::AwaitingTrade { .. } => {
                candidates.push(Intent::RespondToTrade { accept: true });
                candidates.push(Intent::RespondToTrade { accept: false });
                candidates.push(Intent::CancelTrade);
            }
        },
    }

    candidates.retain(|intent| validate(state, player, intent).is_ok());
    candidates
}
