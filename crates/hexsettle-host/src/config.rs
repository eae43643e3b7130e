//! Host configuration

use hexsettle_core::GameConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Host configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Matches to run side by side
    pub matches: usize,
    /// Players per match (2-4)
    pub players: u8,
    /// Base seed; match `i` uses `seed + i`
    pub seed: u64,
    /// Intents each match may apply before it is stopped
    pub max_intents: usize,
    /// Bounded length of each match's request queue
    pub queue_capacity: usize,
    /// Points needed to win
    pub victory_points: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            matches: 4,
            players: 4,
            seed: 7,
            max_intents: 5000,
            queue_capacity: 64,
            victory_points: 10,
        }
    }
}

impl HostConfig {
    /// Read `HEXSETTLE_*` variables, keeping defaults for unset or bad values
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            matches: read(&lookup, "HEXSETTLE_MATCHES", defaults.matches),
            players: read(&lookup, "HEXSETTLE_PLAYERS", defaults.players),
            seed: read(&lookup, "HEXSETTLE_SEED", defaults.seed),
            max_intents: read(&lookup, "HEXSETTLE_MAX_INTENTS", defaults.max_intents),
            queue_capacity: read(&lookup, "HEXSETTLE_QUEUE_CAPACITY", defaults.queue_capacity),
            victory_points: read(&lookup, "HEXSETTLE_VICTORY_POINTS", defaults.victory_points),
        }
    }

    /// Game settings for the `index`-th match
    pub fn game_config(&self, index: usize) -> GameConfig {
        let seed = self.seed.wrapping_add(index as u64);
        let mut config = GameConfig::with_players(self.players).seed(seed);
        config.victory_points = self.victory_points;
        config
    }
}

fn read<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, default = %default, "ignoring unparsable setting");
                default
            }
        },
    }
}
