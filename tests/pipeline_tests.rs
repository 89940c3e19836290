//! Integration tests for the fetch/render pipeline.

use std::sync::Arc;
use std::time::Duration;

use linklight::aggregator::ColorScheme;
use linklight::hal::{MockFeed, MockStrip};
use linklight::services::{FileFeed, Fetcher, Renderer, SharedLinkState};
use linklight::topology::{link_table, LED_COUNT};
use linklight::{Direction, FetchError, Line, Rgb, Snapshot, StopRef, Vehicle, VehicleState};

fn create_state() -> Arc<SharedLinkState> {
    Arc::new(SharedLinkState::builder(Arc::new(link_table().unwrap())).build())
}

fn trips_document(entries: &[(&str, &str, &str, i64)]) -> Vec<u8> {
    // (vehicle id, direction id, next stop name, next stop offset)
    let list: Vec<_> = entries
        .iter()
        .map(|(id, _, stop, offset)| {
            serde_json::json!({
                "tripId": format!("trip_{}", id),
                "status": {
                    "closestStop": format!("stop_{}", stop),
                    "closestStopTimeOffset": 0,
                    "nextStop": format!("stop_{}", stop),
                    "nextStopTimeOffset": offset,
                    "vehicleId": id,
                    "scheduledDistanceAlongTrip": 500.0
                }
            })
        })
        .collect();
    let trips: Vec<_> = entries
        .iter()
        .map(|(id, direction, _, _)| {
            serde_json::json!({ "id": format!("trip_{}", id), "directionId": direction })
        })
        .collect();
    let stops: Vec<_> = entries
        .iter()
        .map(|(_, _, stop, _)| serde_json::json!({ "id": format!("stop_{}", stop), "name": stop }))
        .collect();

    serde_json::json!({
        "code": 200,
        "data": { "list": list, "references": { "trips": trips, "stops": stops } }
    })
    .to_string()
    .into_bytes()
}

fn lit(snapshot: &Snapshot) -> Vec<usize> {
    snapshot
        .colors
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_off())
        .map(|(i, _)| i)
        .collect()
}

// ============================================================================
// Sample Data
// ============================================================================

#[tokio::test]
async fn sample_document_renders_line_one() {
    let state = create_state();
    let feed = Arc::new(FileFeed::new("data/sample_trips.json"));
    let fetcher = Fetcher::new(state.clone(), feed);
    assert_eq!(fetcher.run_cycle().await, Ok(1));

    let strip = MockStrip::new(LED_COUNT);
    let mut renderer = Renderer::new(state.clone(), strip.clone());
    let snapshot = renderer.render_current();

    assert_eq!(snapshot.vehicles.len(), 6);
    assert!(snapshot.vehicles.vehicles.iter().all(|v| v.line == Line::One));
    // Westlake nb enroute, Northgate nb platform, Westlake sb enroute,
    // Beacon Hill sb platform, Rainier Beach nb platform, SeaTac/Airport
    // sb platform on the south tail
    assert_eq!(lit(&snapshot), vec![1, 20, 31, 87, 100, 148]);
    assert!(snapshot.placements.iter().all(|p| p.placed));
    assert_eq!(strip.last_frame().unwrap(), snapshot.colors);
}

// ============================================================================
// Failure Retention
// ============================================================================

#[tokio::test]
async fn failed_cycle_keeps_previous_display() {
    let state = create_state();
    let feed = Arc::new(MockFeed::new());
    feed.set_body(Line::One, trips_document(&[("a", "1", "Westlake", 5)]));
    feed.set_body(Line::Two, trips_document(&[("b", "0", "Mercer Island", 120)]));

    let fetcher = Fetcher::new(state.clone(), feed.clone());
    let mut renderer = Renderer::new(state.clone(), MockStrip::new(LED_COUNT));

    assert_eq!(fetcher.tick().await, Some(1));
    let before = renderer.render_current();
    let json_before = state.serializer().to_json(&before).unwrap();

    feed.set_error(Line::Two, FetchError::Status(503));
    assert_eq!(fetcher.tick().await, None);
    feed.set_body(Line::One, b"not json".to_vec());
    assert_eq!(fetcher.tick().await, None);

    let after = renderer.render_current();
    assert_eq!(after.generation(), 1);
    assert_eq!(after.colors, before.colors);
    assert_eq!(state.serializer().to_json(&after).unwrap(), json_before);

    let status = state.fetch_status();
    assert_eq!(status.consecutive_failures, 2);
    assert!(status.last_error.is_some());
}

#[tokio::test]
async fn recovery_clears_failure_status() {
    let state = create_state();
    let feed = Arc::new(MockFeed::new().with_lines(&[Line::One]));
    feed.set_error(Line::One, FetchError::Transport("connection reset".into()));

    let fetcher = Fetcher::new(state.clone(), feed.clone());
    assert_eq!(fetcher.tick().await, None);

    feed.set_body(Line::One, trips_document(&[("a", "1", "SODO", 60)]));
    assert_eq!(fetcher.tick().await, Some(1));

    let status = state.fetch_status();
    assert_eq!(status.consecutive_failures, 0);
    assert!(status.last_error.is_none());
    assert!(status.last_success_ms.is_some());
}

// ============================================================================
// Display Settings
// ============================================================================

#[tokio::test]
async fn focus_filters_then_clears() {
    let state = create_state();
    let feed = Arc::new(MockFeed::new());
    feed.set_body(Line::One, trips_document(&[("a", "1", "Westlake", 5), ("c", "0", "SODO", 5)]));
    feed.set_body(Line::Two, trips_document(&[("b", "1", "Wilburton", 5)]));
    Fetcher::new(state.clone(), feed).run_cycle().await.unwrap();

    let mut renderer = Renderer::new(state.clone(), MockStrip::new(LED_COUNT));
    assert_eq!(renderer.render_current().placements.len(), 3);

    state.set_focus(Some("b"));
    let focused = renderer.render_current();
    assert_eq!(focused.placements.len(), 1);
    assert_eq!(focused.placements[0].vehicle_id, "b");
    // Wilburton northbound platform
    assert_eq!(lit(&focused), vec![53]);

    state.set_focus(Some(""));
    assert_eq!(renderer.render_current().placements.len(), 3);
}

#[tokio::test]
async fn color_change_applies_to_next_render() {
    let state = create_state();
    let feed = Arc::new(MockFeed::new().with_lines(&[Line::One]));
    feed.set_body(Line::One, trips_document(&[("a", "1", "Westlake", 5)]));
    Fetcher::new(state.clone(), feed).run_cycle().await.unwrap();

    let mut renderer = Renderer::new(state.clone(), MockStrip::new(LED_COUNT));
    assert_eq!(renderer.render_current().colors[21], Rgb::new(0, 32, 0));

    state.update_settings(|s| s.line1_color = Rgb::new(255, 0, 0));
    assert_eq!(renderer.render_current().colors[21], Rgb::new(255, 0, 0));
}

// ============================================================================
// Timing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn fetcher_runs_every_update_interval() {
    let state = create_state();
    let feed = Arc::new(MockFeed::new().with_lines(&[Line::One]));
    feed.set_body(Line::One, trips_document(&[("a", "1", "Westlake", 5)]));

    let task = tokio::spawn(Fetcher::new(state.clone(), feed.clone()).run());

    // Ticks at 0s, 30s and 60s
    tokio::time::sleep(Duration::from_secs(65)).await;
    assert_eq!(state.current_vehicles().generation, 3);
    assert_eq!(feed.call_count(), 3);

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn hung_request_times_out_without_commit() {
    let state = create_state();
    let feed = Arc::new(
        MockFeed::new()
            .with_lines(&[Line::One])
            .with_delay(Duration::from_secs(3600)),
    );
    feed.set_body(Line::One, trips_document(&[("a", "1", "Westlake", 5)]));

    let fetcher = Fetcher::new(state.clone(), feed);
    assert_eq!(fetcher.tick().await, None);
    assert_eq!(state.current_vehicles().generation, 0);
    assert!(state
        .fetch_status()
        .last_error
        .is_some_and(|e| e.contains("timed out")));
}

// ============================================================================
// Concurrency
// ============================================================================

const STATIONS: [&str; 5] = ["Westlake", "SODO", "Northgate", "Othello", "Symphony"];
const COMMITS: u64 = 200;

fn batch(generation: u64) -> Vec<Vehicle> {
    let count = (generation % 5 + 1) as usize;
    (0..count)
        .map(|n| Vehicle {
            id: format!("{}_{}", generation, n),
            trip_id: format!("trip_{}_{}", generation, n),
            line: Line::One,
            direction: if n % 2 == 0 {
                Direction::Northbound
            } else {
                Direction::Southbound
            },
            state: VehicleState::AtStation,
            closest_stop: StopRef::named(STATIONS[(generation as usize + n) % STATIONS.len()]),
            closest_stop_offset_secs: 0,
            next_stop: StopRef::named(STATIONS[(generation as usize + n) % STATIONS.len()]),
            next_stop_offset_secs: 5,
            headsign: String::new(),
        })
        .collect()
}

fn assert_consistent(snapshot: &Snapshot) {
    let generation = snapshot.generation();
    let prefix = format!("{}_", generation);
    assert_eq!(snapshot.placements.len(), snapshot.vehicles.len());
    assert_eq!(snapshot.aggregator.vehicle_count(), snapshot.vehicles.len());
    for placement in &snapshot.placements {
        assert!(
            placement.vehicle_id.starts_with(&prefix),
            "generation {} shows {}",
            generation,
            placement.vehicle_id
        );
    }
    if generation > 0 {
        assert_eq!(snapshot.vehicles.len(), (generation % 5 + 1) as usize);
    }
    assert_eq!(snapshot.colors, snapshot.aggregator.colors(&ColorScheme::default()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_rendered_snapshot_matches_one_commit() {
    let state = create_state();
    let strip = MockStrip::new(LED_COUNT);
    let renderer = tokio::spawn(Renderer::new(state.clone(), strip.clone()).run());

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let mut snapshots = state.subscribe_snapshots();
            let api_state = state.clone();
            tokio::spawn(async move {
                let mut last_generation = 0;
                loop {
                    let snapshot = snapshots.borrow_and_update().clone();
                    assert_consistent(&snapshot);
                    assert!(snapshot.generation() >= last_generation);
                    last_generation = snapshot.generation();
                    // The web path serializes the same snapshot it reads
                    let json = api_state.serializer().to_json(&snapshot).unwrap();
                    assert_eq!(json.matches("trainIds").count() > 0, !snapshot.placements.is_empty());
                    if last_generation == COMMITS {
                        break;
                    }
                    if snapshots.changed().await.is_err() {
                        break;
                    }
                }
                last_generation
            })
        })
        .collect();

    let writer_state = state.clone();
    let writer = tokio::spawn(async move {
        for generation in 1..=COMMITS {
            assert_eq!(writer_state.commit(batch(generation)), generation);
            tokio::task::yield_now().await;
        }
    });

    writer.await.unwrap();
    for reader in readers {
        let seen = tokio::time::timeout(Duration::from_secs(10), reader)
            .await
            .expect("reader did not observe the final commit")
            .unwrap();
        assert_eq!(seen, COMMITS);
    }

    assert_eq!(strip.last_frame().unwrap(), state.latest_snapshot().colors);
    for frame in strip.frames() {
        assert_eq!(frame.len(), LED_COUNT);
    }
    renderer.abort();
}
