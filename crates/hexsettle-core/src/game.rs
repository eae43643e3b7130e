//! Core game state machine.
//!
//! `GameState` owns the board, occupancy, players, bank and the seeded RNG.
//! It only changes through [`GameState::apply`], which validates an intent
//! with [`crate::rules::validate`], executes it on a working copy and
//! commits the copy. A rejected intent leaves the state untouched.

use crate::actions::{Event, Intent, TradeOffer};
use crate::board::{Board, ConstructionError, PlayerId, Terrain, TileId, VertexId};
use crate::generator::{self, BoardLayout};
use crate::occupancy::Occupancy;
use crate::player::{costs, Piece, PiecePool, Player, ResourceHand};
use crate::production::{self, Bank, BankPolicy, Production};
use crate::robber;
use crate::rules::{self, Rejection};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Victory points needed to win
pub const VICTORY_POINTS_TO_WIN: u32 = 10;

/// Players holding more than this many cards discard half on a 7
pub const DISCARD_THRESHOLD: u32 = 7;

/// RNG stream used for dice and theft, kept apart from board generation
const PLAY_STREAM: u64 = 1;

/// Everything needed to start a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player_names: Vec<String>,
    pub victory_points: u32,
    pub discard_threshold: u32,
    pub pieces: PiecePool,
    pub bank: BankPolicy,
    pub layout: BoardLayout,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::with_players(4)
    }
}

impl GameConfig {
    /// Standard rules with `count` players named "Player 1".."Player N"
    pub fn with_players(count: u8) -> Self {
        Self {
            player_names: (1..=count).map(|i| format!("Player {}", i)).collect(),
            victory_points: VICTORY_POINTS_TO_WIN,
            discard_threshold: DISCARD_THRESHOLD,
            pieces: PiecePool::default(),
            bank: BankPolicy::default(),
            layout: BoardLayout::standard(),
            seed: 0,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConstructionError> {
        let count = self.player_names.len();
        if !(2..=4).contains(&count) {
            return Err(ConstructionError::InvalidConfig(format!(
                "Must have 2-4 players, got {}",
                count
            )));
        }
        if self.victory_points < 3 {
            return Err(ConstructionError::InvalidConfig(format!(
                "Victory threshold {} is below the 2 points every player gets in setup",
                self.victory_points
            )));
        }
        Ok(())
    }
}

/// One entry of the snake-draft setup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupTurn {
    pub player: PlayerId,
    /// 1 on the way out, 2 on the way back
    pub round: u8,
}

/// Players 0..N-1, then N-1..0
pub fn snake_order(player_count: usize) -> Vec<SetupTurn> {
    let forward = (0..player_count).map(|p| SetupTurn {
        player: p as PlayerId,
        round: 1,
    });
    let back = (0..player_count).rev().map(|p| SetupTurn {
        player: p as PlayerId,
        round: 2,
    });
    forward.chain(back).collect()
}

/// What the current setup entry still needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupStep {
    Settlement,
    /// The road must touch the settlement just placed
    Road { settlement: VertexId },
}

/// Sub-stage of a regular turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Before rolling dice at start of turn
    AwaitingRoll,
    /// Rolled 7; these players still owe a discard
    AwaitingDiscard { remaining: Vec<(PlayerId, u32)> },
    /// Turn owner must move the robber
    AwaitingRobberMove,
    /// Robber moved; turn owner picks one of `victims`
    AwaitingRobberTheft {
        tile: TileId,
        victims: Vec<PlayerId>,
    },
    /// Build, trade, or end the turn
    AwaitingBuild,
    /// A player trade offer is waiting for its target
    AwaitingTrade { offer: TradeOffer },
}

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Snake-draft placement; `placement` indexes the setup order
    Setup {
        placement: usize,
        step: SetupStep,
    },
    /// Regular turns; the owner is `turn % player_count`
    Play { turn: u32, stage: Stage },
    /// Game is over
    Ended { winner: PlayerId },
}

/// Result of [`GameState::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted {
        state: Box<GameState>,
        events: Vec<Event>,
    },
    Rejected(Rejection),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    config: GameConfig,
    board: Board,
    occupancy: Occupancy,
    /// All players, indexed by id
    pub players: Vec<Player>,
    phase: Phase,
    robber: TileId,
    setup_order: Vec<SetupTurn>,
    bank: Bank,
    last_roll: Option<(u8, u8)>,
    rng: ChaCha8Rng,
}

impl GameState {
    /// Generate the board and seat the players
    pub fn new(config: GameConfig) -> Result<Self, ConstructionError> {
        config.validate()?;

        let board = generator::generate(&config.layout, config.seed)?;
        let robber = starting_robber(&board)?;
        let occupancy = Occupancy::new(&board);
        let players = config
            .player_names
            .iter()
            .enumerate()
            .map(|(i, name)| Player::with_pool(i as PlayerId, name.clone(), config.pieces))
            .collect::<Vec<_>>();
        let setup_order = snake_order(players.len());
        let bank = Bank::new(config.bank);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        rng.set_stream(PLAY_STREAM);

        debug!(
            players = players.len(),
            seed = config.seed,
            tiles = board.tiles().len(),
            "game created"
        );

        Ok(Self {
            config,
            board,
            occupancy,
            players,
            phase: Phase::Setup {
                placement: 0,
                step: SetupStep::Settlement,
            },
            robber,
            setup_order,
            bank,
            last_roll: None,
            rng,
        })
    }

    // ==================== Queries ====================

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Tile the robber sits on
    pub fn robber(&self) -> TileId {
        self.robber
    }

    pub fn setup_order(&self) -> &[SetupTurn] {
        &self.setup_order
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn last_roll(&self) -> Option<(u8, u8)> {
        self.last_roll
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    pub fn resources(&self, id: PlayerId) -> Option<&ResourceHand> {
        self.player(id).map(|p| &p.resources)
    }

    /// Victory points from structures on the board
    pub fn victory_points(&self, id: PlayerId) -> u32 {
        self.occupancy.victory_points(id)
    }

    /// Setup entry being played, if still in setup
    pub fn setup_turn(&self) -> Option<SetupTurn> {
        match self.phase {
            Phase::Setup { placement, .. } => self.setup_order.get(placement).copied(),
            _ => None,
        }
    }

    /// Sub-stage of the current turn, if in regular play
    pub fn stage(&self) -> Option<&Stage> {
        match &self.phase {
            Phase::Play { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Player expected to act next. During discards this is still the turn
    /// owner, although any player owing a discard may act.
    pub fn current_player(&self) -> Option<PlayerId> {
        match &self.phase {
            Phase::Setup { .. } => self.setup_turn().map(|t| t.player),
            Phase::Play { turn, .. } => {
                Some((*turn as usize % self.players.len().max(1)) as PlayerId)
            }
            Phase::Ended { .. } => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Ended { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            Phase::Ended { winner } => Some(winner),
            _ => None,
        }
    }

    /// Intents `player` could submit now
    pub fn legal_intents(&self, player: PlayerId) -> Vec<Intent> {
        rules::legal_intents(self, player)
    }

    /// Check an intent without applying it
    pub fn validate(&self, actor: PlayerId, intent: &Intent) -> Result<(), Rejection> {
        rules::validate(self, actor, intent)
    }

    // ==================== Commands ====================

    /// Apply an intent, returning its events. On rejection nothing changes.
    pub fn apply(&mut self, actor: PlayerId, intent: Intent) -> Result<Vec<Event>, Rejection> {
        self.apply_with(actor, intent, None)
    }

    /// RollDice with dice supplied by the caller (replays, tests)
    pub fn roll_with(&mut self, actor: PlayerId, dice: (u8, u8)) -> Result<Vec<Event>, Rejection> {
        self.apply_with(actor, Intent::RollDice, Some(dice))
    }

    /// Functional form of [`GameState::apply`]
    pub fn submit(&self, actor: PlayerId, intent: Intent) -> Outcome {
        let mut next = self.clone();
        match next.apply(actor, intent) {
            Ok(events) => Outcome::Accepted {
                state: Box::new(next),
                events,
            },
            Err(reason) => Outcome::Rejected(reason),
        }
    }

    fn apply_with(
        &mut self,
        actor: PlayerId,
        intent: Intent,
        dice: Option<(u8, u8)>,
    ) -> Result<Vec<Event>, Rejection> {
        if let Err(reason) = rules::validate(self, actor, &intent) {
            trace!(actor, intent = intent.kind(), %reason, "intent rejected");
            return Err(reason);
        }

        let kind = intent.kind();
        let mut working = self.clone();
        match working.execute(actor, intent, dice) {
            Ok(events) => {
                *self = working;
                debug!(actor, intent = kind, events = events.len(), "intent applied");
                Ok(events)
            }
            Err(reason) => {
                trace!(actor, intent = kind, %reason, "intent rejected");
                Err(reason)
            }
        }
    }

    /// Run an already validated intent
    fn execute(
        &mut self,
        actor: PlayerId,
        intent: Intent,
        dice: Option<(u8, u8)>,
    ) -> Result<Vec<Event>, Rejection> {
        let mut events = Vec::new();

        match intent {
            // ==================== Placement ====================
            Intent::PlaceSettlement { vertex } => {
                let setup_round = self.setup_turn().map(|t| t.round);
                if setup_round.is_none() {
                    self.pay(actor, &costs::settlement())?;
                }
                self.player_mut(actor)?.take_piece(Piece::Settlement);
                self.occupancy.place_settlement(vertex, actor);
                events.push(Event::SettlementPlaced {
                    player: actor,
                    vertex,
                });

                if let Some(round) = setup_round {
                    if round == 2 {
                        let windfall = Production::single(
                            actor,
                            production::settlement_yield(&self.board, vertex),
                        );
                        self.distribute(windfall, &mut events);
                    }
                    if let Phase::Setup { step, .. } = &mut self.phase {
                        *step = SetupStep::Road { settlement: vertex };
                    }
                }
                self.check_victory(actor, &mut events);
            }

            Intent::PlaceRoad { edge } => {
                let in_setup = matches!(self.phase, Phase::Setup { .. });
                if !in_setup {
                    self.pay(actor, &costs::road())?;
                }
                self.player_mut(actor)?.take_piece(Piece::Road);
                self.occupancy.place_road(edge, actor);
                events.push(Event::RoadPlaced {
                    player: actor,
                    edge,
                });

                if in_setup {
                    self.advance_setup(&mut events);
                }
            }

            Intent::UpgradeToCity { vertex } => {
                self.pay(actor, &costs::city())?;
                self.player_mut(actor)?.take_piece(Piece::City);
                self.occupancy.upgrade_to_city(vertex);
                events.push(Event::CityBuilt {
                    player: actor,
                    vertex,
                });
                self.check_victory(actor, &mut events);
            }

            // ==================== Dice Rolling ====================
            Intent::RollDice => {
                let (die1, die2) = match dice {
                    Some(dice) => dice,
                    None => (self.rng.gen_range(1..=6), self.rng.gen_range(1..=6)),
                };
                if !(1..=6).contains(&die1) || !(1..=6).contains(&die2) {
                    return Err(Rejection::InvalidDice);
                }
                let total = die1 + die2;
                self.last_roll = Some((die1, die2));
                events.push(Event::DiceRolled {
                    player: actor,
                    dice: (die1, die2),
                    total,
                });

                if total == 7 {
                    let owed =
                        robber::discard_obligations(&self.players, self.config.discard_threshold);
                    for &(player, count) in &owed {
                        events.push(Event::DiscardRequired { player, count });
                    }
                    if owed.is_empty() {
                        self.set_stage(Stage::AwaitingRobberMove);
                    } else {
                        self.set_stage(Stage::AwaitingDiscard { remaining: owed });
                    }
                } else {
                    let batch =
                        production::roll_yield(&self.board, &self.occupancy, self.robber, total);
                    self.distribute(batch, &mut events);
                    self.set_stage(Stage::AwaitingBuild);
                }
            }

            // ==================== Robber ====================
            Intent::Discard { resources } => {
                self.pay(actor, &resources)?;
                events.push(Event::ResourcesDiscarded {
                    player: actor,
                    resources,
                });

                let mut done = false;
                if let Phase::Play {
                    stage: Stage::AwaitingDiscard { remaining },
                    ..
                } = &mut self.phase
                {
                    remaining.retain(|(p, _)| *p != actor);
                    done = remaining.is_empty();
                }
                if done {
                    self.set_stage(Stage::AwaitingRobberMove);
                }
            }

            Intent::MoveRobber { tile } => {
                let from = self.robber;
                self.robber = tile;
                events.push(Event::RobberMoved {
                    player: actor,
                    from,
                    to: tile,
                });

                let victims = robber::eligible_victims(
                    &self.board,
                    &self.occupancy,
                    &self.players,
                    tile,
                    actor,
                );
                if victims.is_empty() {
                    self.set_stage(Stage::AwaitingBuild);
                } else {
                    self.set_stage(Stage::AwaitingRobberTheft { tile, victims });
                }
            }

            Intent::StealFrom { victim } => {
                let stolen = match self.players.get_mut(victim as usize) {
                    Some(p) => p.resources.steal_random(&mut self.rng),
                    None => return Err(Rejection::UnknownPlayer(victim)),
                };
                if let Some(resource) = stolen {
                    self.player_mut(actor)?.resources.add(resource, 1);
                    events.push(Event::ResourceStolen {
                        victim,
                        thief: actor,
                        resource,
                    });
                }
                self.set_stage(Stage::AwaitingBuild);
            }

            // ==================== Trading ====================
            Intent::BankTrade { give, receive } => {
                let rate = rules::bank_rate(self, actor, give);
                self.pay(actor, &ResourceHand::single(give, rate))?;
                let card = ResourceHand::single(receive, 1);
                if !self.bank.withdraw(&card) {
                    return Err(Rejection::BankDepleted(receive));
                }
                self.player_mut(actor)?.resources.add_hand(&card);
                events.push(Event::BankTraded {
                    player: actor,
                    gave: give,
                    gave_count: rate,
                    received: receive,
                });
            }

            Intent::ProposeTrade { offer } => {
                events.push(Event::TradeProposed {
                    offer: offer.clone(),
                });
                self.set_stage(Stage::AwaitingTrade { offer });
            }

            Intent::RespondToTrade { accept } => {
                let offer = self.pending_offer()?;
                if accept {
                    self.exchange(&offer)?;
                    events.push(Event::TradeAccepted { offer });
                } else {
                    events.push(Event::TradeDeclined { offer });
                }
                self.set_stage(Stage::AwaitingBuild);
            }

            Intent::CancelTrade => {
                let offer = self.pending_offer()?;
                events.push(Event::TradeCancelled { offer });
                self.set_stage(Stage::AwaitingBuild);
            }

            // ==================== Turn Management ====================
            Intent::EndTurn => {
                if let Phase::Play { turn, .. } = self.phase {
                    let next_turn = turn + 1;
                    let next = (next_turn as usize % self.players.len()) as PlayerId;
                    self.phase = Phase::Play {
                        turn: next_turn,
                        stage: Stage::AwaitingRoll,
                    };
                    events.push(Event::TurnEnded {
                        player: actor,
                        next,
                    });
                }
            }

            Intent::RegenerateBoard { seed } => {
                self.board = generator::regenerate(&self.board, &self.config.layout, seed)
                    .map_err(|e| Rejection::RegenerationFailed(e.to_string()))?;
                self.robber = starting_robber(&self.board)
                    .map_err(|e| Rejection::RegenerationFailed(e.to_string()))?;
                self.occupancy = Occupancy::new(&self.board);
                events.push(Event::BoardRegenerated { seed });
            }
        }

        Ok(events)
    }

    // ==================== Helper Methods ====================

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, Rejection> {
        self.players
            .get_mut(id as usize)
            .ok_or(Rejection::UnknownPlayer(id))
    }

    /// Move cards from a player's hand back to the bank
    fn pay(&mut self, id: PlayerId, cost: &ResourceHand) -> Result<(), Rejection> {
        if !self.player_mut(id)?.resources.try_subtract(cost) {
            return Err(Rejection::InsufficientResources);
        }
        self.bank.deposit(cost);
        Ok(())
    }

    /// Settle a production batch against the bank and credit the grants
    fn distribute(&mut self, batch: Production, events: &mut Vec<Event>) {
        let paid = self.bank.settle(batch);
        if paid.is_empty() {
            return;
        }
        for (player, hand) in paid.iter() {
            if let Some(p) = self.players.get_mut(player as usize) {
                p.resources.add_hand(hand);
            }
        }
        events.push(Event::ResourcesProduced {
            grants: paid.into_grants(),
        });
    }

    fn exchange(&mut self, offer: &TradeOffer) -> Result<(), Rejection> {
        if !self.player_mut(offer.from)?.resources.try_subtract(&offer.offering) {
            return Err(Rejection::InsufficientResources);
        }
        if !self.player_mut(offer.to)?.resources.try_subtract(&offer.requesting) {
            return Err(Rejection::InsufficientResources);
        }
        self.player_mut(offer.from)?
            .resources
            .add_hand(&offer.requesting);
        self.player_mut(offer.to)?.resources.add_hand(&offer.offering);
        Ok(())
    }

    fn pending_offer(&self) -> Result<TradeOffer, Rejection> {
        match self.stage() {
            Some(Stage::AwaitingTrade { offer }) => Ok(offer.clone()),
            _ => Err(Rejection::WrongSubStage),
        }
    }

    fn set_stage(&mut self, next: Stage) {
        if let Phase::Play { stage, .. } = &mut self.phase {
            *stage = next;
        }
    }

    fn advance_setup(&mut self, events: &mut Vec<Event>) {
        let Phase::Setup { placement, .. } = self.phase else {
            return;
        };
        let next = placement + 1;
        if next >= self.setup_order.len() {
            self.phase = Phase::Play {
                turn: 0,
                stage: Stage::AwaitingRoll,
            };
            events.push(Event::PlayStarted { first_player: 0 });
            debug!("setup complete");
        } else {
            self.phase = Phase::Setup {
                placement: next,
                step: SetupStep::Settlement,
            };
        }
    }

    fn check_victory(&mut self, actor: PlayerId, events: &mut Vec<Event>) {
        let victory_points = self.victory_points(actor);
        if victory_points >= self.config.victory_points {
            self.phase = Phase::Ended { winner: actor };
            events.push(Event::GameEnded {
                winner: actor,
                victory_points,
            });
            info!(winner = actor, victory_points, "game ended");
        }
    }

    // ==================== Persistence ====================

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Lowest-id desert, where the robber starts
fn starting_robber(board: &Board) -> Result<TileId, ConstructionError> {
    board
        .tiles_with(Terrain::Desert)
        .map(|t| t.id)
        .min()
        .ok_or_else(|| {
            ConstructionError::InvalidBoardConstraints("Board has no desert for the robber".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Resource;
    use pretty_assertions::assert_eq;

    fn new_game(players: u8, seed: u64) -> GameState {
        GameState::new(GameConfig::with_players(players).seed(seed)).unwrap()
    }

    /// Play through setup taking the first legal placement each time
    fn finish_setup(game: &mut GameState) {
        while let Some(turn) = game.setup_turn() {
            let intent = game.legal_intents(turn.player).remove(0);
            game.apply(turn.player, intent).unwrap();
        }
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = new_game(4, 1);
        assert_eq!(
            game.phase(),
            &Phase::Setup {
                placement: 0,
                step: SetupStep::Settlement
            }
        );
        assert_eq!(game.current_player(), Some(0));
        assert_eq!(
            game.board().tile(game.robber()).unwrap().terrain,
            Terrain::Desert
        );
    }

    #[test]
    fn test_snake_order() {
        let players: Vec<_> = snake_order(3).iter().map(|t| t.player).collect();
        assert_eq!(players, vec![0, 1, 2, 2, 1, 0]);
        let rounds: Vec<_> = snake_order(2).iter().map(|t| t.round).collect();
        assert_eq!(rounds, vec![1, 1, 2, 2]);
    }

    #[test]
    fn test_invalid_config() {
        let config = GameConfig::with_players(1);
        assert!(matches!(
            GameState::new(config),
            Err(ConstructionError::InvalidConfig(_))
        ));

        let mut config = GameConfig::with_players(3);
        config.victory_points = 2;
        assert!(matches!(
            GameState::new(config),
            Err(ConstructionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_setup_valid_actions() {
        let game = new_game(4, 2);
        let intents = game.legal_intents(0);

        assert!(intents
            .iter()
            .all(|i| matches!(i, Intent::PlaceSettlement { .. })));
        assert_eq!(intents.len(), game.board().vertices().len());
        assert!(game.legal_intents(1).is_empty());
    }

    #[test]
    fn test_setup_road_must_touch_new_settlement() {
        let mut game = new_game(2, 3);
        let vertex = game.board().vertices()[10].id;
        game.apply(0, Intent::PlaceSettlement { vertex }).unwrap();

        let roads = game.legal_intents(0);
        assert_eq!(roads.len(), game.board().edges_of_vertex(vertex).len());

        let far_edge = game
            .board()
            .edges()
            .iter()
            .find(|e| !e.vertices.contains(&vertex))
            .unwrap()
            .id;
        assert_eq!(
            game.apply(0, Intent::PlaceRoad { edge: far_edge }),
            Err(Rejection::NotConnectedToNetwork)
        );
    }

    #[test]
    fn test_setup_finishes_into_play() {
        let mut game = new_game(3, 4);
        finish_setup(&mut game);

        assert_eq!(
            game.phase(),
            &Phase::Play {
                turn: 0,
                stage: Stage::AwaitingRoll
            }
        );
        for p in 0..3 {
            assert_eq!(game.victory_points(p), 2);
            assert_eq!(game.occupancy().roads_of(p).len(), 2);
            assert_eq!(game.player(p).unwrap().settlements_remaining, 3);
        }
    }

    #[test]
    fn test_roll_with_rejects_bad_dice() {
        let mut game = new_game(2, 5);
        finish_setup(&mut game);
        let before = game.clone();

        assert_eq!(game.roll_with(0, (0, 4)), Err(Rejection::InvalidDice));
        assert_eq!(game, before);
        assert_eq!(game.roll_with(1, (2, 4)), Err(Rejection::NotPlayersTurn));
    }

    #[test]
    fn test_roll_then_end_turn() {
        let mut game = new_game(2, 6);
        finish_setup(&mut game);

        let events = game.roll_with(0, (2, 3)).unwrap();
        assert!(matches!(events[0], Event::DiceRolled { total: 5, .. }));
        assert_eq!(game.stage(), Some(&Stage::AwaitingBuild));
        assert_eq!(game.last_roll(), Some((2, 3)));

        let events = game.apply(0, Intent::EndTurn).unwrap();
        assert_eq!(events, vec![Event::TurnEnded { player: 0, next: 1 }]);
        assert_eq!(game.current_player(), Some(1));
        assert_eq!(game.stage(), Some(&Stage::AwaitingRoll));
    }

    #[test]
    fn test_seven_without_discards_goes_to_robber() {
        let mut game = new_game(2, 7);
        finish_setup(&mut game);
        for p in game.players.iter_mut() {
            p.resources = ResourceHand::new();
        }

        game.roll_with(0, (3, 4)).unwrap();
        assert_eq!(game.stage(), Some(&Stage::AwaitingRobberMove));

        let robber = game.robber();
        assert_eq!(
            game.apply(0, Intent::MoveRobber { tile: robber }),
            Err(Rejection::RobberDestinationUnchanged)
        );
    }

    #[test]
    fn test_bank_trade_rate() {
        let mut game = new_game(2, 8);
        finish_setup(&mut game);
        game.roll_with(0, (1, 1)).unwrap();
        game.players[0].resources = ResourceHand::single(Resource::Ore, 4);

        let rate = rules::bank_rate(&game, 0, Resource::Ore);
        assert!((2..=4).contains(&rate));
        game.apply(
            0,
            Intent::BankTrade {
                give: Resource::Ore,
                receive: Resource::Wood,
            },
        )
        .unwrap();
        assert_eq!(game.players[0].resources.ore, 4 - rate);
        assert_eq!(game.players[0].resources.wood, 1);

        assert_eq!(
            game.apply(
                0,
                Intent::BankTrade {
                    give: Resource::Wood,
                    receive: Resource::Wood,
                },
            ),
            Err(Rejection::InvalidTrade)
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut game = new_game(4, 9);
        finish_setup(&mut game);
        game.roll_with(0, (4, 4)).unwrap();

        let json = game.to_json().unwrap();
        let back = GameState::from_json(&json).unwrap();
        assert_eq!(back, game);
    }
}
