//! Self-play driver.
//!
//! Every seat of a match runs as its own task and submits uniformly random
//! legal intents through the match queue. Seats race each other, so some
//! submissions arrive after the state they were chosen for has moved on;
//! those come back as ordinary rejections.

use crate::protocol::MatchStatus;
use crate::session::{HostError, MatchHandle};
use hexsettle_core::{Event, Phase, PlayerId};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, trace};
use uuid::Uuid;

/// How a self-played match went
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfPlayReport {
    pub match_id: Uuid,
    pub status: MatchStatus,
    pub accepted: u64,
    pub rejected: u64,
    /// Turn counter when play stopped, if setup was finished
    pub turn: Option<u32>,
}

/// Shared stop signal and intent budget for one match's seats
struct Limits {
    submitted: AtomicUsize,
    max_intents: usize,
    stop: watch::Sender<bool>,
}

impl Limits {
    fn halt(&self) {
        self.stop.send_replace(true);
    }
}

/// Play a match with random legal intents until it ends or `max_intents`
/// submissions have been made
pub async fn play(
    handle: MatchHandle,
    seed: u64,
    max_intents: usize,
) -> Result<SelfPlayReport, HostError> {
    let players = handle.snapshot().await?.player_count();
    let (stop, stopped) = watch::channel(false);
    let limits = Arc::new(Limits {
        submitted: AtomicUsize::new(0),
        max_intents,
        stop,
    });

    let mut seats = JoinSet::new();
    for seat in 0..players {
        let rng = ChaCha8Rng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(seat as u64));
        seats.spawn(run_seat(
            handle.clone(),
            seat as PlayerId,
            rng,
            Arc::clone(&limits),
            stopped.clone(),
        ));
    }
    while let Some(joined) = seats.join_next().await {
        joined??;
    }

    let info = handle.status().await?;
    let turn = match handle.snapshot().await?.phase() {
        Phase::Play { turn, .. } => Some(*turn),
        _ => None,
    };
    debug!(
        match_id = %info.id,
        accepted = info.accepted,
        rejected = info.rejected,
        "self-play done"
    );

    Ok(SelfPlayReport {
        match_id: info.id,
        status: info.status,
        accepted: info.accepted,
        rejected: info.rejected,
        turn,
    })
}

async fn run_seat(
    handle: MatchHandle,
    seat: PlayerId,
    mut rng: ChaCha8Rng,
    limits: Arc<Limits>,
    mut stopped: watch::Receiver<bool>,
) -> Result<(), HostError> {
    let mut events = handle.subscribe();

    loop {
        if *stopped.borrow() {
            return Ok(());
        }

        let intents = handle.legal_intents(seat).await?;
        let Some(intent) = intents.choose(&mut rng).cloned() else {
            // Nothing to do until someone else moves
            tokio::select! {
                _ = events.recv() => {}
                _ = stopped.changed() => {}
            }
            continue;
        };

        if limits.submitted.fetch_add(1, Ordering::SeqCst) >= limits.max_intents {
            limits.halt();
            return Ok(());
        }

        match handle.submit(seat, intent).await? {
            Ok(applied) => {
                if applied.iter().any(|e| matches!(e, Event::GameEnded { .. })) {
                    limits.halt();
                    return Ok(());
                }
            }
            Err(reason) => trace!(seat, %reason, "lost a race"),
        }
    }
}
