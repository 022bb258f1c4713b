use lib_pulse::{IngestConfig, IngestionFacade, SentimentLabel, SourceMode};
use std::time::Duration;

#[tokio::test]
async fn malformed_endpoint_seeds_in_the_same_turn() {
    for endpoint in ["", "not a url", "http://localhost:8765", "ftp://feed"] {
        let mut facade = IngestionFacade::new(IngestConfig::with_endpoint(endpoint)).unwrap();
        assert_eq!(facade.connect(), SourceMode::Synthetic, "endpoint {endpoint:?}");

        let snapshot = facade.snapshot();
        assert!(snapshot.connected);
        assert!(snapshot.video_info.is_some());
        assert!(snapshot.analytics.is_some());
        assert_eq!(snapshot.comments.len(), 5);
        assert!(snapshot.events.is_empty());
        facade.shutdown().await;
    }
}

#[tokio::test]
async fn buffer_stays_bounded_under_the_generator() {
    let mut facade = IngestionFacade::new(IngestConfig {
        comment_buffer_capacity: 8,
        generator_interval_ms: 5,
        generator_seed: Some(99),
        ..IngestConfig::with_endpoint("bogus")
    })
    .unwrap();
    facade.connect();

    let mut snapshots = facade.subscribe();
    tokio::time::timeout(
        Duration::from_secs(10),
        snapshots.wait_for(|s| s.comments.iter().any(|c| c.comment_id == "synthetic_20")),
    )
    .await
    .expect("generator too slow")
    .unwrap();

    let snapshot = facade.snapshot();
    assert_eq!(snapshot.comments.len(), 8);
    assert!(snapshot.comments.iter().all(|c| c.comment_id.starts_with("synthetic_")));
    assert!(
        snapshot
            .comments
            .iter()
            .all(|c| SentimentLabel::ALL.contains(&c.sentiment_label))
    );
    facade.shutdown().await;
}

#[tokio::test]
async fn snapshot_json_matches_view_contract() {
    let mut facade = IngestionFacade::new(IngestConfig::with_endpoint("bogus")).unwrap();
    facade.connect();
    let value = serde_json::to_value(facade.snapshot()).unwrap();
    facade.shutdown().await;

    assert_eq!(value["connected"], true);
    assert!(value["videoInfo"]["title"].is_string());
    assert_eq!(value["comments"].as_array().unwrap().len(), 5);
    assert!(value["analytics"]["top_words"][0][0].is_string());
    assert!(value["events"].as_array().unwrap().is_empty());
}

#[test]
fn logging_setup_prunes_old_files() {
    let dir = tempfile::tempdir().unwrap();
    for day in 1..=3 {
        std::fs::File::create(dir.path().join(format!("it_2024-01-0{day}_00-00-00.log"))).unwrap();
    }
    let path = lib_pulse::loggers::setup_logging(dir.path(), "debug", "it").unwrap();
    log::info!("integration logging ready");

    let logs: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(logs.len(), 2);
    assert!(path.exists());
}
