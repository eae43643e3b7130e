//! Match sessions.
//!
//! A session is one tokio task that owns a `GameState`. Every request goes
//! through a bounded queue and is handled to completion before the next one
//! is read, so intents from concurrent submitters are applied one at a time
//! in arrival order. Accepted events are published on a broadcast channel.

use crate::protocol::{Command, MatchEvent, MatchInfo, MatchStatus, Reply};
use hexsettle_core::{ConstructionError, Event, GameConfig, GameState, Intent, PlayerId, Rejection};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events buffered per subscriber before it starts lagging
const EVENT_BUFFER: usize = 1024;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Match {0} not found")]
    MatchNotFound(Uuid),

    #[error("Match {0} is closed")]
    MatchClosed(Uuid),

    #[error("Could not create match: {0}")]
    Construction(#[from] ConstructionError),

    #[error("Unexpected reply to {0}")]
    UnexpectedReply(&'static str),

    #[error("Seat task failed: {0}")]
    Seat(#[from] tokio::task::JoinError),
}

/// A queued command and where to send its answer
struct Envelope {
    command: Command,
    reply: oneshot::Sender<Reply>,
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    id: Uuid,
    commands: mpsc::Sender<Envelope>,
    events: broadcast::Sender<MatchEvent>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("command", &self.command)
            .finish()
    }
}

impl MatchHandle {
    /// Create the game and spawn its session task
    pub fn spawn(id: Uuid, config: GameConfig, queue_capacity: usize) -> Result<Self, HostError> {
        let game = GameState::new(config)?;
        let (commands, queue) = mpsc::channel(queue_capacity.max(1));
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let session = Session {
            id,
            game,
            accepted: 0,
            rejected: 0,
            sequence: 0,
            events: events.clone(),
        };
        tokio::spawn(session.run(queue));
        info!(match_id = %id, "match started");

        Ok(Self {
            id,
            commands,
            events,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive every event accepted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> {
        self.events.subscribe()
    }

    async fn request(&self, command: Command) -> Result<Reply, HostError> {
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| HostError::MatchClosed(self.id))?;
        answer.await.map_err(|_| HostError::MatchClosed(self.id))
    }

    /// Queue an intent and wait for the engine's verdict
    pub async fn submit(
        &self,
        player: PlayerId,
        intent: Intent,
    ) -> Result<Result<Vec<Event>, Rejection>, HostError> {
        match self.request(Command::Submit { player, intent }).await? {
            Reply::Accepted { events } => Ok(Ok(events)),
            Reply::Rejected { reason } => Ok(Err(reason)),
            _ => Err(HostError::UnexpectedReply("submit")),
        }
    }

    pub async fn snapshot(&self) -> Result<GameState, HostError> {
        match self.request(Command::Snapshot).await? {
            Reply::Snapshot { state } => Ok(*state),
            _ => Err(HostError::UnexpectedReply("snapshot")),
        }
    }

    pub async fn legal_intents(&self, player: PlayerId) -> Result<Vec<Intent>, HostError> {
        match self.request(Command::LegalIntents { player }).await? {
            Reply::LegalIntents { intents } => Ok(intents),
            _ => Err(HostError::UnexpectedReply("legal intents")),
        }
    }

    pub async fn status(&self) -> Result<MatchInfo, HostError> {
        match self.request(Command::Status).await? {
            Reply::Status { info } => Ok(info),
            _ => Err(HostError::UnexpectedReply("status")),
        }
    }

    /// Stop the session and return the final state
    pub async fn close(&self) -> Result<GameState, HostError> {
        match self.request(Command::Close).await? {
            Reply::Closed { state } => Ok(*state),
            _ => Err(HostError::UnexpectedReply("close")),
        }
    }
}

/// State owned by the session task
struct Session {
    id: Uuid,
    game: GameState,
    accepted: u64,
    rejected: u64,
    sequence: u64,
    events: broadcast::Sender<MatchEvent>,
}

impl Session {
    async fn run(mut self, mut queue: mpsc::Receiver<Envelope>) {
        while let Some(Envelope { command, reply }) = queue.recv().await {
            let closing = matches!(command, Command::Close);
            let answer = self.handle(command);
            if reply.send(answer).is_err() {
                debug!(match_id = %self.id, "requester went away before the reply");
            }
            if closing {
                break;
            }
        }
        if !self.game.is_finished() {
            warn!(match_id = %self.id, "session closed before the match finished");
        }
        info!(
            match_id = %self.id,
            accepted = self.accepted,
            rejected = self.rejected,
            "match closed"
        );
    }

    fn handle(&mut self, command: Command) -> Reply {
        match command {
            Command::Submit { player, intent } => match self.game.apply(player, intent) {
                Ok(events) => {
                    self.accepted += 1;
                    self.publish(player, &events);
                    Reply::Accepted { events }
                }
                Err(reason) => {
                    self.rejected += 1;
                    debug!(match_id = %self.id, player, %reason, "intent rejected");
                    Reply::Rejected { reason }
                }
            },
            Command::Snapshot => Reply::Snapshot {
                state: Box::new(self.game.clone()),
            },
            Command::LegalIntents { player } => Reply::LegalIntents {
                intents: self.game.legal_intents(player),
            },
            Command::Status => Reply::Status { info: self.info() },
            Command::Close => Reply::Closed {
                state: Box::new(self.game.clone()),
            },
        }
    }

    fn publish(&mut self, actor: PlayerId, events: &[Event]) {
        for event in events {
            if let Event::GameEnded { winner, .. } = event {
                info!(match_id = %self.id, winner, "match won");
            }
            let message = MatchEvent {
                match_id: self.id,
                sequence: self.sequence,
                actor,
                event: event.clone(),
            };
            self.sequence += 1;
            // No subscribers is fine
            let _ = self.events.send(message);
        }
    }

    fn info(&self) -> MatchInfo {
        MatchInfo {
            id: self.id,
            players: self.game.players.iter().map(|p| p.name.clone()).collect(),
            status: MatchStatus::of(&self.game),
            current_player: self.game.current_player(),
            accepted: self.accepted,
            rejected: self.rejected,
        }
    }
}
