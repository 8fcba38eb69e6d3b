use crate::types::{Aggression, MatchOutcome, PlayerMetrics, Role};

// Role rules, ordered. First match wins; ties are broken by rule order.
const SNIPER_MIN_HEADSHOT_PCT: f64 = 55.0;
const SNIPER_MIN_KD: f64 = 1.15;
const ENTRY_MIN_RATIO: f64 = 0.16;
const ENTRY_MIN_KD: f64 = 1.0;
const STAR_MIN_MULTI_KILL_SHARE: f64 = 0.18;
const STAR_MIN_ADR: f64 = 85.0;
const SUPPORT_MAX_KD: f64 = 1.0;
const SUPPORT_MIN_ADR: f64 = 72.0;

const AGGRESSIVE_MIN_ENTRY_RATIO: f64 = 0.14;
const AGGRESSIVE_MIN_ADR: f64 = 90.0;
const PASSIVE_MAX_ENTRY_RATIO: f64 = 0.07;
const PASSIVE_MAX_ADR: f64 = 65.0;

// Danger ladder. Every point traces to a named factor; improving any
// single metric never lowers the level.
const DANGER_RATING_HIGH: f64 = 1.20;
const DANGER_RATING_MID: f64 = 1.05;
const DANGER_RATING_LOW: f64 = 0.90;
const DANGER_WINRATE_HIGH: f64 = 60.0;
const DANGER_WINRATE_MID: f64 = 50.0;
const DANGER_WINRATE_LOW: f64 = 40.0;
const DANGER_KD_HIGH: f64 = 1.30;
const DANGER_KD_MID: f64 = 1.00;
const DANGER_FORM_WINDOW: usize = 5;
const DANGER_FORM_MIN_WINS: usize = 3;

const MAX_TRAIT_TAGS: usize = 3;

#[derive(Debug, Clone)]
pub struct Classification {
    pub role: Role,
    pub aggression: Aggression,
    pub danger_level: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

pub fn classify(metrics: &PlayerMetrics) -> Classification {
    Classification {
        role: classify_role(metrics),
        aggression: classify_aggression(metrics),
        danger_level: danger_level(metrics),
        strengths: strengths(metrics),
        weaknesses: weaknesses(metrics),
    }
}

fn classify_role(m: &PlayerMetrics) -> Role {
    let kd = m.avg_kd.value();
    if m.headshot_pct.value() >= SNIPER_MIN_HEADSHOT_PCT && kd >= SNIPER_MIN_KD {
        return Role::SniperType;
    }
    if m.entry_frag_ratio.value() >= ENTRY_MIN_RATIO && kd >= ENTRY_MIN_KD {
        return Role::EntryFragger;
    }
    if m.multi_kill_round_share.value() >= STAR_MIN_MULTI_KILL_SHARE
        && m.avg_adr.value() >= STAR_MIN_ADR
    {
        return Role::StarPlayer;
    }
    if m.avg_kd.is_measured() && kd < SUPPORT_MAX_KD && m.avg_adr.value() >= SUPPORT_MIN_ADR {
        return Role::Support;
    }
    Role::Generalist
}

fn classify_aggression(m: &PlayerMetrics) -> Aggression {
    let entry = m.entry_frag_ratio.value();
    let adr = m.avg_adr.value();
    if entry >= AGGRESSIVE_MIN_ENTRY_RATIO || adr >= AGGRESSIVE_MIN_ADR {
        Aggression::Aggressive
    } else if m.avg_adr.is_measured() && entry <= PASSIVE_MAX_ENTRY_RATIO && adr < PASSIVE_MAX_ADR {
        Aggression::Passive
    } else {
        Aggression::Balanced
    }
}

/// Capped additive score: rating contributes up to 2.0, winrate up to 1.5,
/// K/D up to 1.0, recent form up to 0.5. Sum floored, +1, clamped to [1, 5].
pub fn danger_level(m: &PlayerMetrics) -> u8 {
    let mut score: f64 = 0.0;

    let rating = m.hltv_rating.value();
    score += if rating >= DANGER_RATING_HIGH {
        2.0
    } else if rating >= DANGER_RATING_MID {
        1.0
    } else if rating >= DANGER_RATING_LOW {
        0.5
    } else {
        0.0
    };

    let winrate = m.winrate_pct.value();
    score += if winrate >= DANGER_WINRATE_HIGH {
        1.5
    } else if winrate >= DANGER_WINRATE_MID {
        1.0
    } else if winrate >= DANGER_WINRATE_LOW {
        0.5
    } else {
        0.0
    };

    let kd = m.avg_kd.value();
    score += if kd >= DANGER_KD_HIGH {
        1.0
    } else if kd >= DANGER_KD_MID {
        0.5
    } else {
        0.0
    };

    if recent_wins(m) >= DANGER_FORM_MIN_WINS {
        score += 0.5;
    }

    (score.floor() as i64 + 1).clamp(1, 5) as u8
}

fn recent_wins(m: &PlayerMetrics) -> usize {
    m.form_streak
        .iter()
        .take(DANGER_FORM_WINDOW)
        .filter(|r| **r == MatchOutcome::Win)
        .count()
}

fn strengths(m: &PlayerMetrics) -> Vec<String> {
    let mut out = Vec::new();
    if m.hltv_rating.value() >= DANGER_RATING_HIGH {
        out.push("consistently high impact".to_string());
    }
    if m.headshot_pct.value() >= SNIPER_MIN_HEADSHOT_PCT {
        out.push("precise aim".to_string());
    }
    if m.entry_frag_ratio.value() >= ENTRY_MIN_RATIO {
        out.push("wins opening duels".to_string());
    }
    if m.clutch_success_pct.is_measured() && m.clutch_success_pct.value() >= 40.0 {
        out.push("reliable in clutches".to_string());
    }
    if m.winrate_pct.value() >= DANGER_WINRATE_HIGH {
        out.push("strong recent winrate".to_string());
    }
    out.truncate(MAX_TRAIT_TAGS);
    out
}

fn weaknesses(m: &PlayerMetrics) -> Vec<String> {
    let mut out = Vec::new();
    if m.low_sample {
        out.push("few recent matches on record".to_string());
    }
    if m.avg_kd.is_measured() && m.avg_kd.value() < 0.90 {
        out.push("loses more duels than won".to_string());
    }
    if m.winrate_pct.is_measured() && m.winrate_pct.value() < DANGER_WINRATE_LOW {
        out.push("poor recent winrate".to_string());
    }
    let window = m.form_streak.len().min(DANGER_FORM_WINDOW);
    if window >= 4 && recent_wins(m) <= window.saturating_sub(4) {
        out.push("cold streak".to_string());
    }
    if m.clutch_success_pct.is_measured() && m.clutch_success_pct.value() < 15.0 {
        out.push("folds in clutches".to_string());
    }
    out.truncate(MAX_TRAIT_TAGS);
    out
}
