//! Pre-game tactical briefing core: resolve a match identifier, fetch both
//! rosters through a narrow provider interface, derive per-player metrics and
//! judgments in parallel, then aggregate team profiles and cross-team
//! insights into a single briefing result.

pub mod classifier;
pub mod fake_provider;
pub mod insights;
pub mod map_profile;
pub mod metrics;
pub mod orchestrator;
pub mod provider;
pub mod resolver;
pub mod team;
pub mod types;

pub use orchestrator::{AnalysisConfig, analyze_match, analyze_match_with};
pub use provider::{FetchError, StatsProvider};
pub use types::{AnalysisError, AnalysisResult};
