//! Registry of running matches.

use crate::protocol::MatchInfo;
use crate::session::{HostError, MatchHandle};
use dashmap::DashMap;
use hexsettle_core::{GameConfig, GameState};
use tracing::info;
use uuid::Uuid;

/// All live matches, shared across tasks.
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
    queue_capacity: usize,
}

impl MatchRegistry {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            matches: DashMap::new(),
            queue_capacity,
        }
    }

    /// Start a new match and register it
    pub fn create(&self, config: GameConfig) -> Result<MatchHandle, HostError> {
        let id = Uuid::new_v4();
        let handle = MatchHandle::spawn(id, config, self.queue_capacity)?;
        self.matches.insert(id, handle.clone());
        Ok(handle)
    }

    pub fn get(&self, id: Uuid) -> Result<MatchHandle, HostError> {
        self.matches
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(HostError::MatchNotFound(id))
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.matches.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Status of every match
    pub async fn list(&self) -> Vec<MatchInfo> {
        // Clone the handles first so no map guard is held across an await
        let handles: Vec<MatchHandle> = self.matches.iter().map(|e| e.value().clone()).collect();
        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(info) = handle.status().await {
                infos.push(info);
            }
        }
        infos
    }

    /// Close a match and drop it from the registry
    pub async fn close(&self, id: Uuid) -> Result<GameState, HostError> {
        let (_, handle) = self
            .matches
            .remove(&id)
            .ok_or(HostError::MatchNotFound(id))?;
        let state = handle.close().await?;
        info!(match_id = %id, "match removed");
        Ok(state)
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new(crate::config::HostConfig::default().queue_capacity)
    }
}
