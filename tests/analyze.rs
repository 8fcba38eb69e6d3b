use std::sync::Arc;
use std::time::Duration;

use prematch_scout::fake_provider::{FAKE_MATCH_ID, FakeProvider};
use prematch_scout::types::{MatchStatus, Role};
use prematch_scout::{AnalysisConfig, StatsProvider, analyze_match, analyze_match_with};

fn arcs(fake: FakeProvider) -> (Arc<FakeProvider>, Arc<dyn StatsProvider>) {
    let fake = Arc::new(fake);
    let provider: Arc<dyn StatsProvider> = fake.clone();
    (fake, provider)
}

#[test]
fn full_briefing_succeeds() {
    let (_, provider) = arcs(FakeProvider::standard_match(11));
    let url = format!("https://www.faceit.com/en/cs2/room/{FAKE_MATCH_ID}");
    let result = analyze_match(&provider, &url);

    assert!(result.success, "error: {:?}", result.error);
    assert!(result.error.is_none());
    assert_eq!(result.team_analyses.len(), 2);
    for team in &result.team_analyses {
        assert_eq!(team.players.len(), 5);
        for player in &team.players {
            assert!(!player.unavailable);
            assert!((1..=5).contains(&player.danger_level));
            assert!(player.metrics.hltv_rating.value().is_finite());
        }
    }

    let insights = result.insights.expect("two teams produce insights");
    // Alpha is seeded with the higher average elo.
    let adv = insights.elo_advantage.expect("seeded gap is significant");
    assert_eq!(adv.favored_team_id, "team-alpha");
    assert!(adv.delta > 0.0);

    assert!(!insights.dangerous_players.is_empty());
    assert!(insights.dangerous_players.len() <= 5);
    for pair in insights.dangerous_players.windows(2) {
        assert!(pair[0].danger_level >= pair[1].danger_level);
    }
    for pair in insights.weak_targets.windows(2) {
        assert!(pair[0].danger_level <= pair[1].danger_level);
    }
}

#[test]
fn unresolvable_input_makes_no_upstream_calls() {
    let (fake, provider) = arcs(FakeProvider::standard_match(11));
    let result = analyze_match(&provider, "not a url");

    assert!(!result.success);
    assert_eq!(result.error.as_ref().unwrap().category(), "input error");
    assert!(result.match_context.is_none());
    assert_eq!(fake.upstream_calls(), 0);
}

#[test]
fn unknown_match_is_not_found() {
    let (_, provider) = arcs(FakeProvider::standard_match(11));
    let result = analyze_match(&provider, "1-00000000-0000-0000-0000-000000000000");

    assert!(!result.success);
    assert_eq!(result.error.as_ref().unwrap().category(), "not found");
}

#[test]
fn finished_match_is_refused() {
    let (fake, provider) = arcs(
        FakeProvider::standard_match(11).with_status(MatchStatus::Finished),
    );
    let result = analyze_match(&provider, FAKE_MATCH_ID);

    assert!(!result.success);
    assert_eq!(result.error.as_ref().unwrap().category(), "ineligible state");
    // The context was fetched before the refusal and is surfaced anyway.
    assert!(result.match_context.is_some());
    // Exactly one upstream call: the context fetch. No player fan-out.
    assert_eq!(fake.upstream_calls(), 1);
}

#[test]
fn one_failing_player_degrades_not_aborts() {
    let (_, provider) = arcs(FakeProvider::standard_match(11).with_failing_player("b3"));
    let result = analyze_match(&provider, FAKE_MATCH_ID);

    assert!(result.success, "partial data is not an error");
    let bravo = &result.team_analyses[1];
    assert_eq!(bravo.players.len(), 5);
    let degraded = &bravo.players[2];
    assert_eq!(degraded.player.id, "b3");
    assert!(degraded.unavailable);
    assert_eq!(bravo.players.iter().filter(|p| !p.unavailable).count(), 4);

    // Elo mean over the four available players only.
    assert_eq!(bravo.avg_elo.matches(), 4);

    let insights = result.insights.expect("insights");
    assert!(insights.dangerous_players.iter().all(|p| p.player_id != "b3"));
    assert!(insights.weak_targets.iter().all(|p| p.player_id != "b3"));
}

#[test]
fn deadline_returns_partial_result() {
    let (_, provider) = arcs(
        FakeProvider::standard_match(11)
            .with_stalled_player("a1", Duration::from_millis(1500)),
    );
    let cfg = AnalysisConfig {
        deadline: Duration::from_millis(200),
        ..AnalysisConfig::default()
    };
    let result = analyze_match_with(&provider, FAKE_MATCH_ID, &cfg);

    assert!(result.success);
    let alpha = &result.team_analyses[0];
    assert!(alpha.players[0].unavailable, "stalled player is flagged");
    assert!(
        alpha.players.iter().skip(1).all(|p| !p.unavailable),
        "fast players still land"
    );
}

#[test]
fn empty_history_player_gets_default_role() {
    let (_, provider) = arcs(FakeProvider::standard_match(11).with_empty_history("b5"));
    let result = analyze_match(&provider, FAKE_MATCH_ID);

    assert!(result.success);
    let player = &result.team_analyses[1].players[4];
    assert_eq!(player.player.id, "b5");
    assert!(!player.unavailable, "no data is not an outage");
    assert!(player.low_sample);
    assert_eq!(player.role, Role::Generalist);
    assert_eq!(player.metrics.matches, 0);
    assert!(player.per_map_stats.is_empty());
}

#[test]
fn repeated_analysis_is_identical() {
    let url = format!("faceit.com/en/cs2/room/{FAKE_MATCH_ID}");
    let (_, provider) = arcs(FakeProvider::standard_match(3));
    let first = analyze_match(&provider, &url);
    let second = analyze_match(&provider, &url);

    let a = serde_json::to_value(&first).unwrap();
    let b = serde_json::to_value(&second).unwrap();
    assert_eq!(a, b);
}

#[test]
fn output_contract_is_serializable() {
    let (_, provider) = arcs(FakeProvider::standard_match(11));
    let result = analyze_match(&provider, FAKE_MATCH_ID);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], true);
    assert!(json["team_analyses"].as_array().unwrap().len() == 2);
    assert!(json["insights"]["dangerous_players"].is_array());

    let failure = analyze_match(&provider, "nonsense");
    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["category"], "input error");
    assert!(json["error"]["message"].is_string());
}
