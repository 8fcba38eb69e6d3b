use std::cmp::Ordering;

use crate::map_profile::{merged_map_table, recommend_maps};
use crate::types::{EloAdvantage, MatchInsights, PlayerHighlight, TeamAnalysis};

/// Minimum average-elo gap before calling an advantage at all.
pub const ELO_SIGNIFICANCE: f64 = 50.0;
pub const DANGEROUS_TOP_N: usize = 5;
pub const WEAK_TARGETS_TOP_N: usize = 3;

/// Compare two team profiles into the final briefing. Pure transform over
/// already-fetched data; nothing persists between invocations.
pub fn synthesize(ours: &TeamAnalysis, theirs: &TeamAnalysis) -> MatchInsights {
    let elo_advantage = elo_advantage(ours, theirs);

    let mut pool: Vec<PlayerHighlight> = highlight_pool(ours);
    pool.extend(highlight_pool(theirs));

    let mut dangerous_players = pool.clone();
    dangerous_players.sort_by(|a, b| rank_desc(a, b));
    dangerous_players.truncate(DANGEROUS_TOP_N);

    let mut weak_targets = pool;
    weak_targets.sort_by(|a, b| rank_desc(b, a));
    weak_targets.truncate(WEAK_TARGETS_TOP_N);

    let map_recommendations = recommend_maps(
        &merged_map_table(&ours.players),
        &merged_map_table(&theirs.players),
    );

    MatchInsights {
        elo_advantage,
        dangerous_players,
        weak_targets,
        map_recommendations,
    }
}

fn elo_advantage(ours: &TeamAnalysis, theirs: &TeamAnalysis) -> Option<EloAdvantage> {
    if !ours.avg_elo.is_measured() || !theirs.avg_elo.is_measured() {
        return None;
    }
    let delta = ours.avg_elo.value() - theirs.avg_elo.value();
    if delta.abs() < ELO_SIGNIFICANCE {
        return None;
    }
    let favored = if delta > 0.0 { ours } else { theirs };
    Some(EloAdvantage {
        favored_team_id: favored.team_id.clone(),
        delta: delta.abs(),
    })
}

fn highlight_pool(team: &TeamAnalysis) -> Vec<PlayerHighlight> {
    team.players
        .iter()
        .filter(|p| !p.unavailable)
        .map(|p| PlayerHighlight {
            player_id: p.player.id.clone(),
            nickname: p.player.nickname.clone(),
            team_id: team.team_id.clone(),
            danger_level: p.danger_level,
            hltv_rating: p.metrics.hltv_rating.value(),
        })
        .collect()
}

// Danger level first, rating as tie-break, nickname keeps it deterministic.
fn rank_desc(a: &PlayerHighlight, b: &PlayerHighlight) -> Ordering {
    b.danger_level
        .cmp(&a.danger_level)
        .then_with(|| {
            b.hltv_rating
                .partial_cmp(&a.hltv_rating)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.nickname.cmp(&b.nickname))
}
