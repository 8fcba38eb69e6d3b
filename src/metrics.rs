use crate::types::{MatchOutcome, PlayerMetrics, RawMatchRecord, RawStatRecord, Sample};

/// Below this many matches every rate is still computed, but the player is
/// flagged low-sample so classification lowers confidence instead of
/// asserting a role.
pub const MIN_SAMPLE_MATCHES: usize = 2;
pub const FORM_STREAK_LEN: usize = 10;

// HLTV 2.0-style rating weights. A tuned approximation with no authoritative
// source; recalibrate the constants, keep the shape.
const RATING_KAST_WEIGHT: f64 = 0.0073;
const RATING_KPR_WEIGHT: f64 = 0.3591;
const RATING_DPR_WEIGHT: f64 = -0.5329;
const RATING_IMPACT_WEIGHT: f64 = 0.2372;
const RATING_ADR_WEIGHT: f64 = 0.0032;
const RATING_OFFSET: f64 = 0.1587;

// Impact term: kill/assist involvement plus a bonus for multi-kill and
// clutch rounds when the source reports them.
const IMPACT_KPR_WEIGHT: f64 = 2.13;
const IMPACT_APR_WEIGHT: f64 = 0.42;
const IMPACT_OFFSET: f64 = -0.41;
const IMPACT_MULTI_KILL_WEIGHT: f64 = 0.65;
const IMPACT_CLUTCH_WEIGHT: f64 = 0.35;

// KAST estimate credits: survival counts fully, kills and assists partially
// (they overlap with surviving the round).
const KAST_KILL_CREDIT: f64 = 0.45;
const KAST_ASSIST_CREDIT: f64 = 0.25;

/// Turn one player's historical (match, stat) pairs into derived metrics.
/// Input is expected most-recent-first; the function is pure and idempotent.
pub fn extract_metrics(rows: &[(RawMatchRecord, RawStatRecord)]) -> PlayerMetrics {
    if rows.is_empty() {
        return PlayerMetrics::empty();
    }

    let matches = rows.len();
    let wins = rows
        .iter()
        .filter(|(_, s)| s.result == MatchOutcome::Win)
        .count();
    let winrate_pct = Sample::measured(wins as f64 / matches as f64 * 100.0, matches);

    // Per-match means. max(deaths, 1) keeps a zero-death match from
    // producing an unbounded ratio.
    let avg_kd = per_match_mean(rows, |s| s.kills as f64 / s.deaths.max(1) as f64);
    let avg_adr = per_match_mean(rows, |s| s.damage as f64 / s.rounds_played.max(1) as f64);
    let estimated_kast = per_match_mean(rows, estimate_match_kast);

    let total_rounds: u32 = rows.iter().map(|(_, s)| s.rounds_played.max(1)).sum();
    let total_kills: u32 = rows.iter().map(|(_, s)| s.kills).sum();
    let total_assists: u32 = rows.iter().map(|(_, s)| s.assists).sum();
    let total_deaths: u32 = rows.iter().map(|(_, s)| s.deaths).sum();
    let total_headshots: u32 = rows.iter().map(|(_, s)| s.headshots).sum();

    let headshot_pct = guarded_pct(total_headshots, total_kills, matches);

    // Optional columns: ratios only over the matches that report them, so a
    // source that omits a column yields NoData rather than a diluted zero.
    let entry_frag_ratio = optional_ratio(rows, |s| {
        s.entry_kills.map(|k| (k, s.rounds_played.max(1)))
    });
    let clutch = optional_totals(rows, |s| match (s.clutch_wins, s.clutch_attempts) {
        (Some(w), Some(a)) => Some((w, a)),
        _ => None,
    });
    // Noisy sources occasionally report more wins than attempts; cap at 100.
    let clutch_success_pct = match clutch {
        Some((wins, attempts, n)) if attempts > 0 => {
            Sample::measured((wins as f64 / attempts as f64 * 100.0).min(100.0), n)
        }
        _ => Sample::NoData,
    };
    let multi_kill_round_share = optional_ratio(rows, |s| {
        s.multi_kill_rounds.map(|m| (m, s.rounds_played.max(1)))
    });

    let kpr = total_kills as f64 / total_rounds as f64;
    let apr = total_assists as f64 / total_rounds as f64;
    let dpr = total_deaths as f64 / total_rounds as f64;
    let clutch_wins_per_round = clutch
        .map(|(wins, _, _)| wins as f64 / total_rounds as f64)
        .unwrap_or(0.0);
    let hltv_rating = composite_rating(
        kpr,
        dpr,
        apr,
        estimated_kast.value(),
        avg_adr.value(),
        multi_kill_round_share.value(),
        clutch_wins_per_round,
    );
    let hltv_rating = Sample::measured(hltv_rating, matches);

    let form_streak = rows
        .iter()
        .take(FORM_STREAK_LEN)
        .map(|(_, s)| s.result)
        .collect();

    PlayerMetrics {
        winrate_pct,
        avg_kd,
        avg_adr,
        estimated_kast,
        hltv_rating,
        clutch_success_pct,
        entry_frag_ratio,
        headshot_pct,
        multi_kill_round_share,
        form_streak,
        matches,
        low_sample: matches < MIN_SAMPLE_MATCHES,
    }
}

/// Monotonic KAST approximation for one match: increases with kill/assist
/// involvement, decreases with death rate, clamped to [0, 100]. An estimate,
/// not a reported figure.
fn estimate_match_kast(stat: &RawStatRecord) -> f64 {
    let rounds = stat.rounds_played.max(1) as f64;
    let survived = rounds - (stat.deaths as f64).min(rounds);
    let score = survived
        + KAST_KILL_CREDIT * stat.kills as f64
        + KAST_ASSIST_CREDIT * stat.assists as f64;
    (score / rounds * 100.0).clamp(0.0, 100.0)
}

fn composite_rating(
    kpr: f64,
    dpr: f64,
    apr: f64,
    kast: f64,
    adr: f64,
    multi_kill_share: f64,
    clutch_wins_per_round: f64,
) -> f64 {
    let impact = IMPACT_KPR_WEIGHT * kpr
        + IMPACT_APR_WEIGHT * apr
        + IMPACT_OFFSET
        + IMPACT_MULTI_KILL_WEIGHT * multi_kill_share
        + IMPACT_CLUTCH_WEIGHT * clutch_wins_per_round;
    let rating = RATING_KAST_WEIGHT * kast
        + RATING_KPR_WEIGHT * kpr
        + RATING_DPR_WEIGHT * dpr
        + RATING_IMPACT_WEIGHT * impact.max(0.0)
        + RATING_ADR_WEIGHT * adr
        + RATING_OFFSET;
    rating.max(0.0)
}

fn per_match_mean(
    rows: &[(RawMatchRecord, RawStatRecord)],
    value: impl Fn(&RawStatRecord) -> f64,
) -> Sample {
    let sum: f64 = rows.iter().map(|(_, s)| value(s)).sum();
    Sample::measured(sum / rows.len() as f64, rows.len())
}

fn guarded_pct(numerator: u32, denominator: u32, matches: usize) -> Sample {
    if denominator == 0 {
        Sample::NoData
    } else {
        Sample::measured(
            (numerator as f64 / denominator as f64 * 100.0).min(100.0),
            matches,
        )
    }
}

/// Sum an optional (numerator, denominator) column over the matches that
/// report it. Returns the ratio with the number of reporting matches.
fn optional_ratio(
    rows: &[(RawMatchRecord, RawStatRecord)],
    column: impl Fn(&RawStatRecord) -> Option<(u32, u32)>,
) -> Sample {
    match optional_totals(rows, column) {
        Some((num, den, n)) if den > 0 => Sample::measured(num as f64 / den as f64, n),
        _ => Sample::NoData,
    }
}

fn optional_totals(
    rows: &[(RawMatchRecord, RawStatRecord)],
    column: impl Fn(&RawStatRecord) -> Option<(u32, u32)>,
) -> Option<(u32, u32, usize)> {
    let mut num = 0u32;
    let mut den = 0u32;
    let mut n = 0usize;
    for (_, stat) in rows {
        if let Some((a, b)) = column(stat) {
            num += a;
            den += b;
            n += 1;
        }
    }
    if n == 0 { None } else { Some((num, den, n)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn record(idx: usize, map: &str) -> RawMatchRecord {
        RawMatchRecord {
            match_id: format!("1-{idx:08}-0000-0000-0000-000000000000"),
            map_name: map.to_string(),
            finished_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
                - chrono::Duration::hours(idx as i64),
        }
    }

    fn stat(kills: u32, deaths: u32, rounds: u32, result: MatchOutcome) -> RawStatRecord {
        RawStatRecord {
            kills,
            deaths,
            assists: 3,
            damage: kills * 105,
            headshots: kills / 2,
            mvp_rounds: 2,
            rounds_played: rounds,
            result,
            map_name: "Mirage".to_string(),
            entry_attempts: None,
            entry_kills: None,
            clutch_attempts: None,
            clutch_wins: None,
            multi_kill_rounds: None,
        }
    }

    fn pairs(stats: Vec<RawStatRecord>) -> Vec<(RawMatchRecord, RawStatRecord)> {
        stats
            .into_iter()
            .enumerate()
            .map(|(i, s)| (record(i, &s.map_name.clone()), s))
            .collect()
    }

    #[test]
    fn zero_death_match_is_not_unbounded() {
        let rows = pairs(vec![stat(20, 0, 16, MatchOutcome::Win)]);
        let m = extract_metrics(&rows);
        assert_eq!(m.avg_kd.value(), 20.0);
        assert!(m.avg_kd.value().is_finite());
    }

    #[test]
    fn empty_history_is_no_data_and_low_sample() {
        let m = extract_metrics(&[]);
        assert!(m.low_sample);
        assert_eq!(m.matches, 0);
        assert!(!m.winrate_pct.is_measured());
        assert_eq!(m.winrate_pct.value(), 0.0);
        assert_eq!(m.hltv_rating.value(), 0.0);
        assert!(m.form_streak.is_empty());
    }

    #[test]
    fn single_match_is_computed_but_flagged() {
        let rows = pairs(vec![stat(18, 12, 24, MatchOutcome::Win)]);
        let m = extract_metrics(&rows);
        assert!(m.low_sample);
        assert_eq!(m.winrate_pct.value(), 100.0);
        assert!(m.avg_kd.is_measured());
    }

    #[test]
    fn winrate_counts_wins_over_total() {
        let rows = pairs(vec![
            stat(20, 15, 26, MatchOutcome::Win),
            stat(10, 18, 22, MatchOutcome::Loss),
            stat(15, 15, 24, MatchOutcome::Win),
            stat(12, 16, 25, MatchOutcome::Loss),
        ]);
        let m = extract_metrics(&rows);
        assert_eq!(m.winrate_pct.value(), 50.0);
        assert!(!m.low_sample);
    }

    #[test]
    fn form_streak_is_most_recent_first_and_capped() {
        let rows = pairs(
            (0..14)
                .map(|i| {
                    stat(
                        15,
                        15,
                        24,
                        if i == 0 {
                            MatchOutcome::Win
                        } else {
                            MatchOutcome::Loss
                        },
                    )
                })
                .collect(),
        );
        let m = extract_metrics(&rows);
        assert_eq!(m.form_streak.len(), FORM_STREAK_LEN);
        assert_eq!(m.form_streak[0], MatchOutcome::Win);
        assert_eq!(m.form_streak[1], MatchOutcome::Loss);
    }

    #[test]
    fn unreported_optional_columns_are_no_data() {
        let rows = pairs(vec![
            stat(20, 15, 26, MatchOutcome::Win),
            stat(10, 18, 22, MatchOutcome::Loss),
        ]);
        let m = extract_metrics(&rows);
        assert!(!m.entry_frag_ratio.is_measured());
        assert!(!m.clutch_success_pct.is_measured());
        assert!(!m.multi_kill_round_share.is_measured());
    }

    #[test]
    fn clutch_ratio_only_counts_reporting_matches() {
        let mut with_clutch = stat(20, 15, 26, MatchOutcome::Win);
        with_clutch.clutch_attempts = Some(4);
        with_clutch.clutch_wins = Some(2);
        let rows = pairs(vec![with_clutch, stat(10, 18, 22, MatchOutcome::Loss)]);
        let m = extract_metrics(&rows);
        assert_eq!(m.clutch_success_pct.value(), 50.0);
        assert_eq!(m.clutch_success_pct.matches(), 1);
    }

    #[test]
    fn zero_kills_means_headshot_pct_is_absent_not_zero() {
        let rows = pairs(vec![stat(0, 18, 20, MatchOutcome::Loss)]);
        let m = extract_metrics(&rows);
        assert!(!m.headshot_pct.is_measured());
    }

    #[test]
    fn average_player_rates_near_one() {
        // ~0.67 KPR, ~0.67 DPR, ~105 dmg per kill.
        let rows = pairs(vec![
            stat(17, 17, 26, MatchOutcome::Win),
            stat(16, 16, 24, MatchOutcome::Loss),
            stat(18, 17, 27, MatchOutcome::Win),
        ]);
        let m = extract_metrics(&rows);
        let r = m.hltv_rating.value();
        assert!(r > 0.8 && r < 1.2, "rating {r} not near 1.0");
    }

    #[test]
    fn extraction_is_idempotent() {
        let rows = pairs(vec![
            stat(20, 15, 26, MatchOutcome::Win),
            stat(10, 18, 22, MatchOutcome::Loss),
        ]);
        assert_eq!(extract_metrics(&rows), extract_metrics(&rows));
    }

    #[test]
    fn fuzzed_inputs_stay_in_domain() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..500 {
            let n = rng.gen_range(0..8);
            let rows = pairs(
                (0..n)
                    .map(|_| {
                        let mut s = stat(
                            rng.gen_range(0..60),
                            rng.gen_range(0..60),
                            rng.gen_range(0..40),
                            if rng.gen_bool(0.5) {
                                MatchOutcome::Win
                            } else {
                                MatchOutcome::Loss
                            },
                        );
                        s.damage = rng.gen_range(0..6000);
                        s.headshots = rng.gen_range(0..=s.kills);
                        if rng.gen_bool(0.4) {
                            s.entry_kills = Some(rng.gen_range(0..8));
                            s.entry_attempts = Some(rng.gen_range(0..10));
                        }
                        if rng.gen_bool(0.3) {
                            s.clutch_attempts = Some(rng.gen_range(0..5));
                            s.clutch_wins = Some(rng.gen_range(0..3).min(s.clutch_attempts.unwrap()));
                        }
                        s
                    })
                    .collect(),
            );
            let m = extract_metrics(&rows);
            assert!((0.0..=100.0).contains(&m.winrate_pct.value()));
            assert!((0.0..=100.0).contains(&m.estimated_kast.value()));
            assert!((0.0..=100.0).contains(&m.clutch_success_pct.value()));
            assert!(m.avg_kd.value() >= 0.0);
            assert!(m.hltv_rating.value() >= 0.0);
            assert!(m.avg_kd.value().is_finite());
            assert!(m.hltv_rating.value().is_finite());
        }
    }
}
