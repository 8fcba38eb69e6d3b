use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::classifier;
use crate::map_profile;
use crate::metrics::extract_metrics;
use crate::provider::{FetchError, StatsProvider};
use crate::resolver;
use crate::team::aggregate_team;
use crate::types::{
    AnalysisError, AnalysisResult, MatchContext, MatchStatus, PlayerAnalysis, PlayerRef,
    RawMatchRecord, RawStatRecord,
};
use crate::insights;

const DEFAULT_HISTORY_LIMIT: usize = 20;
const DEFAULT_DEADLINE_SECS: u64 = 25;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// How many historical matches to request per player.
    pub history_limit: usize,
    /// Overall wall-clock budget; whatever finished by then is returned.
    pub deadline: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
        }
    }
}

/// The single public entry point: resolve the input, fetch rosters, fan out
/// one pipeline per player on the shared bounded pool, aggregate and
/// synthesize. Synchronous to the caller, parallel inside.
pub fn analyze_match(provider: &Arc<dyn StatsProvider>, raw_input: &str) -> AnalysisResult {
    analyze_match_with(provider, raw_input, &AnalysisConfig::default())
}

pub fn analyze_match_with(
    provider: &Arc<dyn StatsProvider>,
    raw_input: &str,
    cfg: &AnalysisConfig,
) -> AnalysisResult {
    let Some(match_ref) = resolver::resolve(raw_input) else {
        return AnalysisResult::failure(
            AnalysisError::UnresolvableInput {
                input: raw_input.to_string(),
            },
            None,
        );
    };

    let context = match provider.fetch_match_context(&match_ref.canonical_id) {
        Ok(context) => context,
        Err(FetchError::NotFound) => {
            return AnalysisResult::failure(
                AnalysisError::MatchNotFound {
                    match_id: match_ref.canonical_id,
                },
                None,
            );
        }
        Err(FetchError::Transient(err)) => {
            return AnalysisResult::failure(AnalysisError::UpstreamUnavailable(err), None);
        }
    };

    if context.status == MatchStatus::Finished {
        let match_id = context.match_id.clone();
        return AnalysisResult::failure(
            AnalysisError::MatchAlreadyFinished { match_id },
            Some(context),
        );
    }

    let per_player = fan_out_players(provider, &context, cfg);

    let mut team_analyses = Vec::with_capacity(context.rosters.len());
    for (team_idx, roster) in context.rosters.iter().enumerate() {
        let players: Vec<PlayerAnalysis> = roster
            .players
            .iter()
            .enumerate()
            .map(|(player_idx, player)| {
                per_player
                    .get(&(team_idx, player_idx))
                    .cloned()
                    .unwrap_or_else(|| {
                        debug!("player {} timed out; marked unavailable", player.nickname);
                        PlayerAnalysis::unavailable(player.clone())
                    })
            })
            .collect();
        team_analyses.push(aggregate_team(&roster.team_id, &roster.name, players));
    }

    let match_insights = match team_analyses.as_slice() {
        [ours, theirs, ..] => Some(insights::synthesize(ours, theirs)),
        _ => None,
    };

    AnalysisResult {
        match_context: Some(context),
        team_analyses,
        insights: match_insights,
        success: true,
        error: None,
    }
}

/// Spawn one pipeline per roster player and join with the overall deadline.
/// Results that arrive after the deadline are simply discarded with the
/// channel; the sender side never blocks on a dropped receiver.
fn fan_out_players(
    provider: &Arc<dyn StatsProvider>,
    context: &MatchContext,
    cfg: &AnalysisConfig,
) -> HashMap<(usize, usize), PlayerAnalysis> {
    let jobs: Vec<((usize, usize), PlayerRef)> = context
        .rosters
        .iter()
        .enumerate()
        .flat_map(|(team_idx, roster)| {
            roster
                .players
                .iter()
                .enumerate()
                .map(move |(player_idx, player)| ((team_idx, player_idx), player.clone()))
        })
        .collect();
    let total = jobs.len();

    let (tx, rx) = mpsc::channel();
    match shared_fetch_pool() {
        Some(pool) => {
            for (slot, player) in jobs {
                let provider = Arc::clone(provider);
                let tx = tx.clone();
                let history_limit = cfg.history_limit;
                pool.spawn(move || {
                    let analysis = analyze_player(provider.as_ref(), &player, history_limit);
                    let _ = tx.send((slot, analysis));
                });
            }
        }
        None => {
            // Pool construction failed; degrade to sequential fetches.
            for (slot, player) in jobs {
                let _ = tx.send((slot, analyze_player(provider.as_ref(), &player, cfg.history_limit)));
            }
        }
    }
    drop(tx);

    let deadline = Instant::now() + cfg.deadline;
    let mut collected = HashMap::with_capacity(total);
    while collected.len() < total {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!(
                "analysis deadline elapsed with {}/{} players done",
                collected.len(),
                total
            );
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok((slot, analysis)) => {
                collected.insert(slot, analysis);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    "analysis deadline elapsed with {}/{} players done",
                    collected.len(),
                    total
                );
                break;
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    collected
}

/// One player's full pipeline: history fetch, per-match stats, metrics,
/// classification, map profile. Upstream failure (after the provider's own
/// retries) degrades to a flagged unavailable analysis, never an abort.
fn analyze_player(provider: &dyn StatsProvider, player: &PlayerRef, history_limit: usize) -> PlayerAnalysis {
    let history = match provider.fetch_player_history(player, history_limit) {
        Ok(history) => history,
        Err(err) => {
            warn!("history fetch failed for {}: {err}", player.nickname);
            return PlayerAnalysis::unavailable(player.clone());
        }
    };

    let mut rows: Vec<(RawMatchRecord, RawStatRecord)> = Vec::with_capacity(history.len());
    for record in history {
        match provider.fetch_player_stats(player, &record.match_id) {
            Ok(Some(stat)) => rows.push((record, stat)),
            // No stat row for this player in this match; skip it.
            Ok(None) => {}
            Err(err) => {
                warn!(
                    "stats fetch failed for {} in {}: {err}",
                    player.nickname, record.match_id
                );
            }
        }
    }
    rows.sort_by(|a, b| b.0.finished_at.cmp(&a.0.finished_at));

    let metrics = extract_metrics(&rows);
    let classification = classifier::classify(&metrics);
    let per_map_stats = map_profile::per_map_breakdown(&rows);
    let style_tags = map_profile::style_tags(&metrics);
    let low_sample = metrics.low_sample;

    PlayerAnalysis {
        player: player.clone(),
        role: classification.role,
        aggression: classification.aggression,
        danger_level: classification.danger_level,
        strengths: classification.strengths,
        weaknesses: classification.weaknesses,
        style_tags,
        per_map_stats,
        metrics,
        low_sample,
        unavailable: false,
    }
}

/// Process-wide bounded pool. Every concurrent analysis shares it, keeping
/// total in-flight upstream calls under one ceiling.
fn shared_fetch_pool() -> Option<&'static rayon::ThreadPool> {
    static POOL: OnceLock<Option<rayon::ThreadPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(upstream_parallelism())
            .thread_name(|idx| format!("scout-fetch-{idx}"))
            .build()
            .ok()
    })
    .as_ref()
}

fn upstream_parallelism() -> usize {
    env::var("UPSTREAM_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(6)
        .clamp(2, 32)
}
