use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// A resolved match reference. Created per request, discarded after use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRef {
    pub raw_input: String,
    pub canonical_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRef {
    pub id: String,
    pub nickname: String,
    pub elo: Option<u32>,
    pub skill_level: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamRoster {
    pub team_id: String,
    pub name: String,
    pub players: Vec<PlayerRef>,
}

/// Match/roster context fetched once per analysis. Roster order is
/// significant: map recommendations are phrased for the first team.
#[derive(Debug, Clone, Serialize)]
pub struct MatchContext {
    pub match_id: String,
    pub status: MatchStatus,
    pub rosters: Vec<TeamRoster>,
    pub map_name: Option<String>,
}

/// One historical match for one player, externally sourced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatchRecord {
    pub match_id: String,
    pub map_name: String,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    Win,
    Loss,
}

/// One player's stat line for one historical match. The optional columns are
/// only present when the upstream source reports them; `None` means
/// "not reported", never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatRecord {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub damage: u32,
    pub headshots: u32,
    pub mvp_rounds: u32,
    pub rounds_played: u32,
    pub result: MatchOutcome,
    pub map_name: String,
    pub entry_attempts: Option<u32>,
    pub entry_kills: Option<u32>,
    pub clutch_attempts: Option<u32>,
    pub clutch_wins: Option<u32>,
    pub multi_kill_rounds: Option<u32>,
}

/// A derived rate that knows its own sample size. `NoData` keeps
/// "insufficient data" distinct from a legitimately-zero measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sample {
    Measured { value: f64, matches: usize },
    NoData,
}

impl Sample {
    /// Non-finite inputs collapse to `NoData` so downstream math never sees
    /// NaN or infinity.
    pub fn measured(value: f64, matches: usize) -> Self {
        if value.is_finite() && matches > 0 {
            Sample::Measured { value, matches }
        } else {
            Sample::NoData
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Sample::Measured { value, .. } => *value,
            Sample::NoData => 0.0,
        }
    }

    pub fn matches(&self) -> usize {
        match self {
            Sample::Measured { matches, .. } => *matches,
            Sample::NoData => 0,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Sample::Measured { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMetrics {
    pub winrate_pct: Sample,
    pub avg_kd: Sample,
    pub avg_adr: Sample,
    pub estimated_kast: Sample,
    pub hltv_rating: Sample,
    pub clutch_success_pct: Sample,
    pub entry_frag_ratio: Sample,
    pub headshot_pct: Sample,
    pub multi_kill_round_share: Sample,
    /// Most-recent-first, at most `metrics::FORM_STREAK_LEN` entries.
    pub form_streak: Vec<MatchOutcome>,
    pub matches: usize,
    pub low_sample: bool,
}

impl PlayerMetrics {
    pub fn empty() -> Self {
        Self {
            winrate_pct: Sample::NoData,
            avg_kd: Sample::NoData,
            avg_adr: Sample::NoData,
            estimated_kast: Sample::NoData,
            hltv_rating: Sample::NoData,
            clutch_success_pct: Sample::NoData,
            entry_frag_ratio: Sample::NoData,
            headshot_pct: Sample::NoData,
            multi_kill_round_share: Sample::NoData,
            form_streak: Vec::new(),
            matches: 0,
            low_sample: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    SniperType,
    EntryFragger,
    StarPlayer,
    Support,
    Generalist,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::SniperType => "sniper-type",
            Role::EntryFragger => "entry fragger",
            Role::StarPlayer => "star player",
            Role::Support => "support",
            Role::Generalist => "generalist",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Aggression {
    Passive,
    Balanced,
    Aggressive,
}

/// Per-map breakdown. Only built for maps with at least one played match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMetrics {
    pub matches_played: usize,
    pub winrate_pct: f64,
    pub avg_kd: f64,
    pub avg_adr: f64,
    pub rating_on_map: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerAnalysis {
    pub player: PlayerRef,
    pub metrics: PlayerMetrics,
    pub role: Role,
    pub aggression: Aggression,
    pub danger_level: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub style_tags: Vec<String>,
    pub per_map_stats: BTreeMap<String, MapMetrics>,
    pub low_sample: bool,
    pub unavailable: bool,
}

impl PlayerAnalysis {
    /// Placeholder for a player whose upstream data could not be fetched.
    /// Team aggregation skips these; the roster slot stays visible.
    pub fn unavailable(player: PlayerRef) -> Self {
        Self {
            player,
            metrics: PlayerMetrics::empty(),
            role: Role::Generalist,
            aggression: Aggression::Balanced,
            danger_level: 1,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            style_tags: Vec::new(),
            per_map_stats: BTreeMap::new(),
            low_sample: true,
            unavailable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMapRecord {
    pub map_name: String,
    pub winrate_pct: f64,
    pub matches: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamAnalysis {
    pub team_id: String,
    pub name: String,
    pub players: Vec<PlayerAnalysis>,
    pub avg_elo: Sample,
    pub avg_skill_level: Sample,
    pub strong_maps: Vec<TeamMapRecord>,
    pub weak_maps: Vec<TeamMapRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EloAdvantage {
    pub favored_team_id: String,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerHighlight {
    pub player_id: String,
    pub nickname: String,
    pub team_id: String,
    pub danger_level: u8,
    pub hltv_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MapAction {
    Play,
    Ban,
}

/// Pick/ban guidance, phrased for the first roster in the match context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRecommendation {
    pub map_name: String,
    pub action: MapAction,
    pub edge_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchInsights {
    pub elo_advantage: Option<EloAdvantage>,
    pub dangerous_players: Vec<PlayerHighlight>,
    pub weak_targets: Vec<PlayerHighlight>,
    pub map_recommendations: Vec<MapRecommendation>,
}

/// Why an analysis could not be produced. These are returned values, not
/// panics, so the caller can pattern-match and phrase its own follow-up.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("could not resolve a match identifier from {input:?}")]
    UnresolvableInput { input: String },
    #[error("match {match_id} was not found upstream")]
    MatchNotFound { match_id: String },
    #[error("match {match_id} has already finished")]
    MatchAlreadyFinished { match_id: String },
    #[error("upstream statistics source unavailable")]
    UpstreamUnavailable(#[source] anyhow::Error),
}

impl AnalysisError {
    pub fn category(&self) -> &'static str {
        match self {
            AnalysisError::UnresolvableInput { .. } => "input error",
            AnalysisError::MatchNotFound { .. } => "not found",
            AnalysisError::MatchAlreadyFinished { .. } => "ineligible state",
            AnalysisError::UpstreamUnavailable(_) => "upstream unavailable",
        }
    }
}

impl Serialize for AnalysisError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("AnalysisError", 2)?;
        row.serialize_field("category", self.category())?;
        row.serialize_field("message", &self.to_string())?;
        row.end()
    }
}

/// The sole public output. Produced fresh per request, never cached here.
#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    pub match_context: Option<MatchContext>,
    pub team_analyses: Vec<TeamAnalysis>,
    pub insights: Option<MatchInsights>,
    pub success: bool,
    pub error: Option<AnalysisError>,
}

impl AnalysisResult {
    pub fn failure(error: AnalysisError, context: Option<MatchContext>) -> Self {
        Self {
            match_context: context,
            team_analyses: Vec::new(),
            insights: None,
            success: false,
            error: Some(error),
        }
    }
}
