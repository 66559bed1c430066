use liga_scout::cache::AnalysisCache;
use liga_scout::config::AnalysisConfig;
use liga_scout::error::{ConfigError, ScoutError};
use liga_scout::player::{Feature, PlayerRecord};
use liga_scout::positions::PositionGroup;
use liga_scout::recommend::{RecommendRequest, recommend_cached, recommend_similar_players};
use liga_scout::source::MemorySource;
use liga_scout::store::SqliteStore;

const FORWARD_FEATURES: [Feature; 9] = [
    Feature::GoalPerGame,
    Feature::ShotPerGame,
    Feature::SotPerGame,
    Feature::AssistPerGame,
    Feature::SuccessfulDribblePerGame,
    Feature::SuccessfulCrossingPerGame,
    Feature::KeyPassPerGame,
    Feature::TotalDuelPerGame,
    Feature::AerialDuelPerGame,
];

fn forward(name: &str, position: &str, nationality: &str, level: f64, jitter: f64) -> PlayerRecord {
    FORWARD_FEATURES.iter().enumerate().fold(
        PlayerRecord::new(name)
            .with_position(position)
            .with_nationality(nationality)
            .with_team("Persib"),
        |p, (idx, f)| p.with_stat(*f, level * (idx + 1) as f64 + jitter * (idx % 3) as f64),
    )
}

/// Anchor "Dimas" shares a profile with three others; four more sit far away.
fn season_rows() -> Vec<PlayerRecord> {
    vec![
        forward("Dimas", "ST", "Indonesia", 0.0, 0.00),
        forward("Twin", "ST", "Brazil", 0.0, 0.00),
        forward("Winger", "LW", "Indonesia", 0.0, 0.02),
        forward("Rafael", "ST", "Brazil", 0.0, 0.03),
        forward("Far 1", "ST", "Indonesia", 1.0, 0.00),
        forward("Far 2", "RW", "Japan", 1.0, 0.01),
        forward("Far 3", "ST", "Indonesia", 1.0, 0.02),
        forward("Far 4", "ST", "Korea", 1.0, 0.03),
    ]
}

fn source() -> MemorySource {
    MemorySource::new().with_season("2024/2025", season_rows())
}

#[test]
fn ranks_cluster_mates_without_the_anchor() {
    let cfg = AnalysisConfig::default();
    let req = RecommendRequest::new("2024/2025", "ST", "Dimas", 2);
    let rows = recommend_similar_players(&source(), &cfg, &req).unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.player != "Dimas"));
    assert!(rows.iter().all(|r| !r.player.starts_with("Far")));
    assert!(rows.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert!(rows.iter().all(|r| r.cluster == rows[0].cluster));

    // Identical stats standardize to identical vectors.
    assert_eq!(rows[0].player, "Twin");
    assert!((rows[0].similarity - 1.0).abs() < 1e-12);
}

#[test]
fn anchor_lookup_ignores_case() {
    let cfg = AnalysisConfig::default();
    let req = RecommendRequest::new("2024/2025", "st", "dimas", 10);
    let rows = recommend_similar_players(&source(), &cfg, &req).unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn domestic_filter_keeps_only_configured_nationality() {
    let cfg = AnalysisConfig::default();
    let mut req = RecommendRequest::new("2024/2025", "ST", "Dimas", 10);
    req.domestic_only = true;
    let rows = recommend_similar_players(&source(), &cfg, &req).unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.player.as_str()).collect();
    assert_eq!(names, vec!["Winger"]);
}

#[test]
fn domestic_filter_leaving_only_the_anchor_is_empty() {
    let mut rows = season_rows();
    rows[2].nationality = Some("Thailand".to_string());
    let source = MemorySource::new().with_season("2024/2025", rows);

    let mut req = RecommendRequest::new("2024/2025", "ST", "Dimas", 10);
    req.domestic_only = true;
    let out = recommend_similar_players(&source, &AnalysisConfig::default(), &req).unwrap();
    assert!(out.is_empty());
}

#[test]
fn position_filter_uses_anchor_tokens() {
    let cfg = AnalysisConfig::default();
    let mut req = RecommendRequest::new("2024/2025", "LW", "Dimas", 10);
    req.match_position = true;
    let rows = recommend_similar_players(&source(), &cfg, &req).unwrap();
    let mut names: Vec<&str> = rows.iter().map(|r| r.player.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Rafael", "Twin"]);
}

#[test]
fn unknown_anchor_and_empty_season_are_empty() {
    let cfg = AnalysisConfig::default();
    let req = RecommendRequest::new("2024/2025", "ST", "Nobody", 5);
    assert!(recommend_similar_players(&source(), &cfg, &req).unwrap().is_empty());

    let req = RecommendRequest::new("2010", "ST", "Dimas", 5);
    assert!(recommend_similar_players(&source(), &cfg, &req).unwrap().is_empty());
}

#[test]
fn no_usable_clustering_means_no_recommendations() {
    let rows: Vec<PlayerRecord> = (0..4)
        .map(|i| forward(&format!("Clone {i}"), "ST", "Indonesia", 1.0, 0.0))
        .collect();
    let source = MemorySource::new().with_season("2024/2025", rows);
    let req = RecommendRequest::new("2024/2025", "ST", "Clone 0", 5);
    let out = recommend_similar_players(&source, &AnalysisConfig::default(), &req).unwrap();
    assert!(out.is_empty());
}

#[test]
fn invalid_position_code_is_a_config_error() {
    let cfg = AnalysisConfig::default();
    let req = RecommendRequest::new("2024/2025", "GK", "Dimas", 5);
    let err = recommend_similar_players(&source(), &cfg, &req).unwrap_err();
    assert!(matches!(
        err,
        ScoutError::Config(ConfigError::InvalidPosition(ref code)) if code == "GK"
    ));
    assert!(err.is_actionable());
}

#[test]
fn overlapping_group_codes_fail_before_any_lookup() {
    let mut cfg = AnalysisConfig::default();
    cfg.groups[1].codes.push("ST".to_string());
    let req = RecommendRequest::new("2024/2025", "ST", "Dimas", 5);

    let err = recommend_similar_players(&source(), &cfg, &req).unwrap_err();
    assert!(matches!(
        err,
        ScoutError::Config(ConfigError::OverlappingCodes { ref code, .. }) if code == "ST"
    ));
    assert!(err.is_actionable());

    let mut cache = AnalysisCache::new();
    let err = recommend_cached(&mut cache, &source(), &cfg, &req).unwrap_err();
    assert!(matches!(err, ScoutError::Config(ConfigError::OverlappingCodes { .. })));
    assert!(!cache.contains("2024/2025", PositionGroup::Forward));
}

#[test]
fn cache_reuses_group_results_until_season_changes() {
    let cfg = AnalysisConfig::default();
    let source = source().with_season("2023/2024", season_rows());
    let mut cache = AnalysisCache::new();

    let req = RecommendRequest::new("2024/2025", "ST", "Dimas", 3);
    let first = recommend_cached(&mut cache, &source, &cfg, &req).unwrap();
    let again = recommend_cached(&mut cache, &source, &cfg, &req).unwrap();
    assert_eq!(first, again);
    assert_eq!(first, recommend_similar_players(&source, &cfg, &req).unwrap());
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("2024/2025", PositionGroup::Forward));

    let other = RecommendRequest::new("2023/2024", "RW", "Dimas", 3);
    recommend_cached(&mut cache, &source, &cfg, &other).unwrap();
    assert_eq!(cache.season(), Some("2023/2024"));
    assert!(!cache.contains("2024/2025", PositionGroup::Forward));
    assert_eq!(cache.len(), 1);
}

#[test]
fn sqlite_store_feeds_the_same_pipeline() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .replace_dataset("Liga 1", "2024/2025", &season_rows())
        .unwrap();

    let cfg = AnalysisConfig::default();
    let req = RecommendRequest::new("2024/2025", "ST", "Dimas", 5);
    let from_store = recommend_similar_players(&store, &cfg, &req).unwrap();
    let from_memory = recommend_similar_players(&source(), &cfg, &req).unwrap();

    let names = |rows: &[liga_scout::recommend::RecommendationRow]| {
        rows.iter().map(|r| r.player.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&from_store), names(&from_memory));
    assert!(from_store.iter().all(|r| r.team.as_deref() == Some("Persib")));
}
