//! Hexsettle match host
//!
//! Runs many independent matches of the `hexsettle-core` engine inside one
//! tokio runtime:
//! - [`session`]: one task per match, fed by a bounded request queue
//! - [`registry`]: the live matches, keyed by id
//! - [`protocol`]: request, reply and event messages
//! - [`selfplay`]: a driver that plays matches with random legal intents
//! - [`config`]: environment-driven settings

pub mod config;
pub mod protocol;
pub mod registry;
pub mod selfplay;
pub mod session;

pub use config::HostConfig;
pub use protocol::{Command, MatchEvent, MatchInfo, MatchStatus, Reply};
pub use registry::MatchRegistry;
pub use selfplay::SelfPlayReport;
pub use session::{HostError, MatchHandle};
