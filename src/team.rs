use crate::map_profile::merged_map_table;
use crate::types::{PlayerAnalysis, Sample, TeamAnalysis, TeamMapRecord};

pub const TEAM_MAP_TOP_N: usize = 3;
/// Combined roster sample a map needs before it can be called strong or weak.
pub const MIN_TEAM_MAP_SAMPLE: usize = 5;

/// Combine per-player analyses into a team profile. `players` keeps roster
/// order; unavailable players stay in the list but are excluded from every
/// aggregate.
pub fn aggregate_team(team_id: &str, name: &str, players: Vec<PlayerAnalysis>) -> TeamAnalysis {
    let avg_elo = roster_mean(&players, |p| p.player.elo.map(f64::from));
    let avg_skill_level = roster_mean(&players, |p| p.player.skill_level.map(f64::from));

    let mut qualified: Vec<TeamMapRecord> = merged_map_table(&players)
        .into_values()
        .filter(|record| record.matches >= MIN_TEAM_MAP_SAMPLE)
        .collect();
    qualified.sort_by(|a, b| {
        b.winrate_pct
            .partial_cmp(&a.winrate_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.map_name.cmp(&b.map_name))
    });

    let strong_maps: Vec<TeamMapRecord> = qualified.iter().take(TEAM_MAP_TOP_N).cloned().collect();
    // Weakest first; never re-list a map already called strong.
    let mut weak_maps: Vec<TeamMapRecord> = qualified
        .iter()
        .rev()
        .filter(|record| !strong_maps.iter().any(|s| s.map_name == record.map_name))
        .take(TEAM_MAP_TOP_N)
        .cloned()
        .collect();
    weak_maps.sort_by(|a, b| {
        a.winrate_pct
            .partial_cmp(&b.winrate_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.map_name.cmp(&b.map_name))
    });

    TeamAnalysis {
        team_id: team_id.to_string(),
        name: name.to_string(),
        players,
        avg_elo,
        avg_skill_level,
        strong_maps,
        weak_maps,
    }
}

fn roster_mean(
    players: &[PlayerAnalysis],
    value: impl Fn(&PlayerAnalysis) -> Option<f64>,
) -> Sample {
    let values: Vec<f64> = players
        .iter()
        .filter(|p| !p.unavailable)
        .filter_map(&value)
        .collect();
    if values.is_empty() {
        Sample::NoData
    } else {
        Sample::measured(values.iter().sum::<f64>() / values.len() as f64, values.len())
    }
}
