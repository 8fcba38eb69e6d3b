use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::provider::{FetchError, StatsProvider};
use crate::types::{
    MatchContext, MatchOutcome, MatchStatus, PlayerRef, RawMatchRecord, RawStatRecord, TeamRoster,
};

pub const FAKE_MATCH_ID: &str = "1-550c9b9a-b79f-4eff-8f42-5a2d71efa0d9";

const MAP_POOL: &[&str] = &[
    "Mirage", "Inferno", "Nuke", "Ancient", "Anubis", "Dust2", "Vertigo",
];

const ALPHA_PLAYERS: &[(&str, &str, u32, u8)] = &[
    ("a1", "rifle_ace", 2350, 10),
    ("a2", "awp_ghost", 2180, 10),
    ("a3", "entry_king", 2060, 9),
    ("a4", "support_sam", 1940, 9),
    ("a5", "igl_anna", 1870, 8),
];

const BRAVO_PLAYERS: &[(&str, &str, u32, u8)] = &[
    ("b1", "shadow", 1980, 9),
    ("b2", "viper", 1890, 8),
    ("b3", "fragger", 1830, 8),
    ("b4", "anchor", 1760, 7),
    ("b5", "lurker", 1700, 7),
];

/// Deterministic in-process provider for tests and benches. Seeded histories,
/// injectable outages and stalls, and a fetch-call counter so tests can
/// assert that no upstream call was made.
pub struct FakeProvider {
    context: MatchContext,
    histories: HashMap<String, Vec<RawMatchRecord>>,
    stats: HashMap<(String, String), RawStatRecord>,
    failing: HashSet<String>,
    stalls: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FakeProvider {
    /// A standard 5v5 scheduled match. Team alpha is seeded stronger than
    /// team bravo, both in elo and in generated stat lines.
    pub fn standard_match(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let rosters = vec![
            TeamRoster {
                team_id: "team-alpha".to_string(),
                name: "Alpha".to_string(),
                players: roster(ALPHA_PLAYERS),
            },
            TeamRoster {
                team_id: "team-bravo".to_string(),
                name: "Bravo".to_string(),
                players: roster(BRAVO_PLAYERS),
            },
        ];

        let mut histories = HashMap::new();
        let mut stats = HashMap::new();
        for (roster_idx, team) in rosters.iter().enumerate() {
            let strong = roster_idx == 0;
            for player in &team.players {
                let rows = seeded_history(&mut rng, &player.id, strong);
                for (record, stat) in &rows {
                    stats.insert(
                        (player.id.clone(), record.match_id.clone()),
                        stat.clone(),
                    );
                }
                histories.insert(
                    player.id.clone(),
                    rows.into_iter().map(|(record, _)| record).collect(),
                );
            }
        }

        Self {
            context: MatchContext {
                match_id: FAKE_MATCH_ID.to_string(),
                status: MatchStatus::Scheduled,
                rosters,
                map_name: None,
            },
            histories,
            stats,
            failing: HashSet::new(),
            stalls: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.context.status = status;
        self
    }

    /// All fetches for this player fail with an exhausted-retries error.
    pub fn with_failing_player(mut self, player_id: &str) -> Self {
        self.failing.insert(player_id.to_string());
        self
    }

    /// The history fetch for this player blocks for `delay` first.
    pub fn with_stalled_player(mut self, player_id: &str, delay: Duration) -> Self {
        self.stalls.insert(player_id.to_string(), delay);
        self
    }

    pub fn with_empty_history(mut self, player_id: &str) -> Self {
        self.histories.insert(player_id.to_string(), Vec::new());
        self
    }

    pub fn context(&self) -> &MatchContext {
        &self.context
    }

    pub fn upstream_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl StatsProvider for FakeProvider {
    fn fetch_match_context(&self, match_id: &str) -> Result<MatchContext, FetchError> {
        self.record_call();
        if match_id == self.context.match_id {
            Ok(self.context.clone())
        } else {
            Err(FetchError::NotFound)
        }
    }

    fn fetch_player_history(
        &self,
        player: &PlayerRef,
        limit: usize,
    ) -> Result<Vec<RawMatchRecord>, FetchError> {
        self.record_call();
        if let Some(delay) = self.stalls.get(&player.id) {
            thread::sleep(*delay);
        }
        if self.failing.contains(&player.id) {
            return Err(FetchError::Transient(anyhow!(
                "simulated outage for {}",
                player.id
            )));
        }
        let rows = self
            .histories
            .get(&player.id)
            .ok_or(FetchError::NotFound)?;
        Ok(rows.iter().take(limit).cloned().collect())
    }

    fn fetch_player_stats(
        &self,
        player: &PlayerRef,
        match_id: &str,
    ) -> Result<Option<RawStatRecord>, FetchError> {
        self.record_call();
        if self.failing.contains(&player.id) {
            return Err(FetchError::Transient(anyhow!(
                "simulated outage for {}",
                player.id
            )));
        }
        Ok(self
            .stats
            .get(&(player.id.clone(), match_id.to_string()))
            .cloned())
    }
}

fn roster(table: &[(&str, &str, u32, u8)]) -> Vec<PlayerRef> {
    table.iter()
        .map(|(id, nickname, elo, skill)| PlayerRef {
            id: (*id).to_string(),
            nickname: (*nickname).to_string(),
            elo: Some(*elo),
            skill_level: Some(*skill),
        })
        .collect()
}

fn seeded_history(
    rng: &mut StdRng,
    player_id: &str,
    strong: bool,
) -> Vec<(RawMatchRecord, RawStatRecord)> {
    let base = Utc.with_ymd_and_hms(2026, 8, 20, 18, 0, 0).unwrap();
    let matches = rng.gen_range(10..=14);
    (0..matches)
        .map(|idx| {
            let map_name = MAP_POOL[rng.gen_range(0..MAP_POOL.len())].to_string();
            let rounds = rng.gen_range(16..=30u32);
            let (kill_range, win_odds) = if strong {
                (12..=32u32, 0.62)
            } else {
                (6..=24u32, 0.45)
            };
            let kills = rng.gen_range(kill_range);
            let deaths = rng.gen_range(8..=24u32).min(rounds);
            let clutch_attempts = rng.gen_range(0..=3u32);
            let clutch_wins = rng.gen_range(0..=clutch_attempts);
            let record = RawMatchRecord {
                match_id: format!("1-{:08x}-{idx:04x}-4000-8000-000000000000", hash(player_id)),
                map_name: map_name.clone(),
                finished_at: base - ChronoDuration::hours(6 * idx as i64),
            };
            let stat = RawStatRecord {
                kills,
                deaths,
                assists: rng.gen_range(0..=8),
                damage: kills * rng.gen_range(85..=115),
                headshots: rng.gen_range(0..=kills),
                mvp_rounds: rng.gen_range(0..=4),
                rounds_played: rounds,
                result: if rng.gen_bool(win_odds) {
                    MatchOutcome::Win
                } else {
                    MatchOutcome::Loss
                },
                map_name,
                entry_attempts: Some(rng.gen_range(2..=8)),
                entry_kills: Some(rng.gen_range(0..=5)),
                clutch_attempts: Some(clutch_attempts),
                clutch_wins: Some(clutch_wins),
                multi_kill_rounds: Some(rng.gen_range(0..=6)),
            };
            (record, stat)
        })
        .collect()
}

// Small stable hash so each player's generated match ids are distinct
// without threading extra state through.
fn hash(input: &str) -> u32 {
    input
        .bytes()
        .fold(0x811c_9dc5u32, |acc, b| (acc ^ b as u32).wrapping_mul(0x0100_0193))
}
