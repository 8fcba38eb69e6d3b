use thiserror::Error;

use crate::types::{MatchContext, PlayerRef, RawMatchRecord, RawStatRecord};

/// How an individual upstream fetch can fail. Retry/backoff is owned by the
/// implementation; by the time a `Transient` reaches this core, retries are
/// already exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource not found upstream")]
    NotFound,
    #[error("upstream request failed")]
    Transient(#[from] anyhow::Error),
}

/// Narrow interface to the statistics provider. This core owns no wire
/// protocol; the implementation owns credentials, caching and throttling.
pub trait StatsProvider: Send + Sync {
    /// Match status plus both rosters. The roster order is preserved into
    /// the final result.
    fn fetch_match_context(&self, match_id: &str) -> Result<MatchContext, FetchError>;

    /// One player's most recent finished matches, most-recent-first,
    /// at most `limit`.
    fn fetch_player_history(
        &self,
        player: &PlayerRef,
        limit: usize,
    ) -> Result<Vec<RawMatchRecord>, FetchError>;

    /// The player's stat line for one historical match. `Ok(None)` means the
    /// provider has the match but no stat row for this player.
    fn fetch_player_stats(
        &self,
        player: &PlayerRef,
        match_id: &str,
    ) -> Result<Option<RawStatRecord>, FetchError>;
}
