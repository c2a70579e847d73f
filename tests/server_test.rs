//! Integration tests for the HTTP read layer.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`
//! rather than a live socket.

use std::fs;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use divelog::builder::DiveLogBuilder;
use divelog::model::DiveLog;
use divelog::server::{router, AppState};
use divelog::subsurface::Decoder;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

const SAMPLE_EXPORT: &str = r#"<divelog program="subsurface" version="3">
  <divesites>
    <site uuid="s1" name="Zenobia, Larnaca" gps="34.8912 33.6536" description="tags:_region_mediterranean Wreck of a ferry">
      <geo cat="2" origin="0" value="Cyprus"/>
    </site>
    <site uuid="s2" name="Amphitheatre" description=""/>
  </divesites>
  <dives>
    <trip date="2023-06-01" location="Cyprus 2023">
      <dive number="1" rating="5" visibility="4" tags="wreck" divesiteid="s1" watersalinity="1030 g/l" date="2023-06-02" time="09:00:00" duration="48:00 min">
        <cylinder size="12.0 l" description="AL100" start="200.0 bar" end="70.0 bar" o2=""/>
      </dive>
      <dive number="2" rating="4" visibility="3" tags="wreck, deep" divesiteid="s1" watersalinity="1030 g/l" date="2023-06-03" time="10:00:00" duration="52:00 min"/>
    </trip>
    <trip date="2023-09-10" location="Gozo 2023">
      <dive number="3" rating="3" visibility="5" tags="reef" divesiteid="s2" watersalinity="1030 g/l" date="2023-09-11" time="08:30:00" duration="41:00 min"/>
    </trip>
  </dives>
</divelog>"#;

fn sample_log() -> DiveLog {
    let mut builder = DiveLogBuilder::new("test");
    Decoder::new(std::io::Cursor::new(SAMPLE_EXPORT.as_bytes().to_vec()))
        .decode(&mut builder)
        .expect("decode succeeds");
    builder.finish().expect("model is built")
}

fn sample_state(source: PathBuf) -> AppState {
    AppState::new(sample_log(), source)
}

async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(sample_state("unused.xml".into()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_fetch_all_dumps_whole_model() {
    let (status, body) = get_json(sample_state("unused.xml".into()), "/data/0").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["metadata"]["program"], "subsurface");
    assert_eq!(body["sites"].as_array().unwrap().len(), 2);
    assert_eq!(body["trips"].as_array().unwrap().len(), 2);

    let dives = body["dives"].as_array().unwrap();
    assert_eq!(dives.len(), 3);
    assert_eq!(dives[0]["date_time_in"], "2023-06-02T09:00:00Z");
}

#[tokio::test]
async fn test_fetch_sites_full() {
    let (status, body) = get_json(sample_state("unused.xml".into()), "/data/sites").await;
    assert_eq!(status, StatusCode::OK);

    let sites = body.as_array().unwrap();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0]["name"], "Zenobia, Larnaca");
    assert_eq!(sites[0]["region"], "Mediterranean Sea");
    assert_eq!(sites[0]["linked_dives"].as_array().unwrap().len(), 2);
    assert_eq!(sites[1]["linked_dives"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_sites_headonly_is_sorted_by_name() {
    let (status, body) =
        get_json(sample_state("unused.xml".into()), "/data/sites?headonly=true").await;
    assert_eq!(status, StatusCode::OK);

    let heads = body.as_array().unwrap();
    assert_eq!(heads.len(), 2);
    assert_eq!(heads[0]["name"], "Amphitheatre");
    assert_eq!(heads[1]["name"], "Zenobia, Larnaca");
    assert!(heads[0].get("linked_dives").is_none());
}

#[tokio::test]
async fn test_fetch_site_by_id() {
    let state = sample_state("unused.xml".into());

    let (status, body) = get_json(state.clone(), "/data/sites/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["formatted_coordinates"], "lat = 34.8912, long = 33.6536");

    for bad in ["/data/sites/0", "/data/sites/3", "/data/sites/junk", "/data/sites/-1"] {
        let (status, _) = get_json(state.clone(), bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "expected 400 for {bad}");
    }
}

#[tokio::test]
async fn test_fetch_dives_with_tag_filter() {
    let state = sample_state("unused.xml".into());

    let (_, all) = get_json(state.clone(), "/data/dives").await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, wrecks) = get_json(state.clone(), "/data/dives?tag=wreck").await;
    assert_eq!(wrecks.as_array().unwrap().len(), 2);

    let (_, none) = get_json(state, "/data/dives?tag=cave").await;
    assert_eq!(none.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_fetch_dive_navigation() {
    let state = sample_state("unused.xml".into());

    let (status, first) = get_json(state.clone(), "/data/dives/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], 1);
    assert_eq!(first["site_name"], "Zenobia, Larnaca");
    assert_eq!(first["gas"], "air");
    assert!(first.get("prev_id").is_none());
    assert_eq!(first["next_id"], 2);

    let (_, last) = get_json(state.clone(), "/data/dives/3").await;
    assert_eq!(last["prev_id"], 2);
    assert!(last.get("next_id").is_none());

    let (status, _) = get_json(state, "/data/dives/4").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fetch_trips_newest_first_by_default() {
    let state = sample_state("unused.xml".into());

    let (status, trips) = get_json(state.clone(), "/data/trips").await;
    assert_eq!(status, StatusCode::OK);
    let trips = trips.as_array().unwrap();
    assert_eq!(trips[0]["label"], "Gozo 2023");
    assert_eq!(trips[1]["label"], "Cyprus 2023");
    // Within a reversed trip the dives are reversed too.
    assert_eq!(trips[1]["linked_dives"][0]["id"], 2);

    let (_, ordered) = get_json(state, "/data/trips?reverse=true").await;
    let ordered = ordered.as_array().unwrap();
    assert_eq!(ordered[0]["label"], "Cyprus 2023");
    assert_eq!(ordered[0]["linked_dives"][0]["id"], 1);
}

#[tokio::test]
async fn test_fetch_tags_histogram() {
    let (status, tags) = get_json(sample_state("unused.xml".into()), "/data/tags").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags["wreck"], 2);
    assert_eq!(tags["deep"], 1);
    assert_eq!(tags["reef"], 1);
}

#[tokio::test]
async fn test_rebuild_publishes_new_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.xml");
    fs::write(&path, SAMPLE_EXPORT).unwrap();
    let state = sample_state(path.clone());

    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/action/rebuild")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["sites"], 2);
    assert_eq!(body["trips"], 2);
    assert_eq!(body["dives"], 3);
}

#[tokio::test]
async fn test_failed_rebuild_keeps_current_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.xml");
    fs::write(&path, "<divelog program=\"s\" version=\"3\"><divesites>").unwrap();
    let state = sample_state(path);

    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/action/rebuild")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The model from before the failed rebuild still answers.
    let (status, dives) = get_json(state, "/data/dives").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dives.as_array().unwrap().len(), 3);
}
