use std::collections::BTreeMap;

use crate::types::{
    MapAction, MapMetrics, MapRecommendation, MatchOutcome, PlayerAnalysis, PlayerMetrics,
    RawMatchRecord, RawStatRecord, TeamMapRecord,
};

/// A map needs this many matches on each side before a pick/ban call.
pub const MIN_SIDE_MAP_SAMPLE: usize = 3;
/// Winrate lead (percentage points) required before recommending anything.
pub const MAP_EDGE_PCT: f64 = 15.0;
pub const MAX_MAP_RECOMMENDATIONS: usize = 4;

pub const MAX_STYLE_TAGS: usize = 3;

const STYLE_PRECISE_HEADSHOT_PCT: f64 = 52.0;
const STYLE_DAMAGE_MIN_ADR: f64 = 88.0;
const STYLE_ROUND_WINNER_MULTI_KILL_SHARE: f64 = 0.16;
const STYLE_OPENER_ENTRY_RATIO: f64 = 0.14;
const STYLE_CLUTCH_MIN_PCT: f64 = 40.0;
const STYLE_ANCHOR_MAX_ENTRY_RATIO: f64 = 0.06;

/// Group one player's history by map. Maps without a played match are simply
/// absent from the result, never zero-filled.
pub fn per_map_breakdown(
    rows: &[(RawMatchRecord, RawStatRecord)],
) -> BTreeMap<String, MapMetrics> {
    let mut grouped: BTreeMap<String, Vec<&RawStatRecord>> = BTreeMap::new();
    for (record, stat) in rows {
        grouped
            .entry(record.map_name.clone())
            .or_default()
            .push(stat);
    }

    grouped
        .into_iter()
        .map(|(map_name, stats)| {
            let n = stats.len() as f64;
            let wins = stats
                .iter()
                .filter(|s| s.result == MatchOutcome::Win)
                .count() as f64;
            let kd: f64 = stats
                .iter()
                .map(|s| s.kills as f64 / s.deaths.max(1) as f64)
                .sum::<f64>()
                / n;
            let adr: f64 = stats
                .iter()
                .map(|s| s.damage as f64 / s.rounds_played.max(1) as f64)
                .sum::<f64>()
                / n;
            let metrics = MapMetrics {
                matches_played: stats.len(),
                winrate_pct: wins / n * 100.0,
                avg_kd: kd,
                avg_adr: adr,
                rating_on_map: map_rating(&stats),
            };
            (map_name, metrics)
        })
        .collect()
}

// Cheap per-map rating proxy: same inputs as the composite rating, but the
// full formula needs the KAST/impact window, so reuse K/D and ADR scaled
// around the 1.0 baseline.
fn map_rating(stats: &[&RawStatRecord]) -> f64 {
    let n = stats.len() as f64;
    let kd: f64 = stats
        .iter()
        .map(|s| s.kills as f64 / s.deaths.max(1) as f64)
        .sum::<f64>()
        / n;
    let adr: f64 = stats
        .iter()
        .map(|s| s.damage as f64 / s.rounds_played.max(1) as f64)
        .sum::<f64>()
        / n;
    (0.5 * kd + 0.5 * (adr / 75.0)).max(0.0)
}

/// Overall engagement style, derived from aggregate rates. Capped small tag
/// set; low-information metrics contribute nothing.
pub fn style_tags(metrics: &PlayerMetrics) -> Vec<String> {
    let mut out = Vec::new();
    if metrics.headshot_pct.value() >= STYLE_PRECISE_HEADSHOT_PCT {
        out.push("precise".to_string());
    }
    if metrics.avg_adr.value() >= STYLE_DAMAGE_MIN_ADR {
        out.push("high-volume damage".to_string());
    }
    if metrics.multi_kill_round_share.value() >= STYLE_ROUND_WINNER_MULTI_KILL_SHARE {
        out.push("round-winner".to_string());
    }
    if metrics.entry_frag_ratio.value() >= STYLE_OPENER_ENTRY_RATIO {
        out.push("opening duelist".to_string());
    } else if metrics.entry_frag_ratio.is_measured()
        && metrics.entry_frag_ratio.value() <= STYLE_ANCHOR_MAX_ENTRY_RATIO
    {
        out.push("site anchor".to_string());
    }
    if metrics.clutch_success_pct.is_measured()
        && metrics.clutch_success_pct.value() >= STYLE_CLUTCH_MIN_PCT
    {
        out.push("clutch-minded".to_string());
    }
    out.truncate(MAX_STYLE_TAGS);
    out
}

/// Merge a roster's per-map winrates, sample-weighted. Unavailable players
/// contribute nothing.
pub fn merged_map_table(players: &[PlayerAnalysis]) -> BTreeMap<String, TeamMapRecord> {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for player in players.iter().filter(|p| !p.unavailable) {
        for (map_name, metrics) in &player.per_map_stats {
            let entry = totals.entry(map_name.clone()).or_insert((0.0, 0));
            entry.0 += metrics.winrate_pct * metrics.matches_played as f64;
            entry.1 += metrics.matches_played;
        }
    }
    totals
        .into_iter()
        .filter(|(_, (_, matches))| *matches > 0)
        .map(|(map_name, (weighted, matches))| {
            let record = TeamMapRecord {
                map_name: map_name.clone(),
                winrate_pct: weighted / matches as f64,
                matches,
            };
            (map_name, record)
        })
        .collect()
}

/// Pick/ban guidance for `ours` against `theirs`. A map is recommended only
/// when both sides clear the sample floor and one side holds a wide winrate
/// lead; thin or balanced maps are omitted rather than forced.
pub fn recommend_maps(
    ours: &BTreeMap<String, TeamMapRecord>,
    theirs: &BTreeMap<String, TeamMapRecord>,
) -> Vec<MapRecommendation> {
    let mut out = Vec::new();
    for (map_name, our_record) in ours {
        let Some(their_record) = theirs.get(map_name) else {
            continue;
        };
        if our_record.matches < MIN_SIDE_MAP_SAMPLE || their_record.matches < MIN_SIDE_MAP_SAMPLE {
            continue;
        }
        let edge = our_record.winrate_pct - their_record.winrate_pct;
        if edge >= MAP_EDGE_PCT {
            out.push(MapRecommendation {
                map_name: map_name.clone(),
                action: MapAction::Play,
                edge_pct: edge,
            });
        } else if edge <= -MAP_EDGE_PCT {
            out.push(MapRecommendation {
                map_name: map_name.clone(),
                action: MapAction::Ban,
                edge_pct: edge,
            });
        }
    }
    out.sort_by(|a, b| {
        b.edge_pct
            .abs()
            .partial_cmp(&a.edge_pct.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.map_name.cmp(&b.map_name))
    });
    out.truncate(MAX_MAP_RECOMMENDATIONS);
    out
}
