mod common;

use common::{Injected, RecordingBackend};
use global_hotkey::hotkey::Code;
use repeat_clicker::dispatcher::InputDispatcher;
use repeat_clicker::platform::{CursorReport, Edge, Origin};
use repeat_clicker::resolver::CoordinateResolver;
use repeat_clicker::{
    ActionKind, Coordinate, Engine, EngineHandle, Interval, RepeatPolicy, RunRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

fn spawn_engine(backend: &Arc<RecordingBackend>) -> EngineHandle {
    Engine::spawn(
        InputDispatcher::new(backend.clone()),
        CoordinateResolver::new(backend.clone()),
    )
}

fn clicks_at(
    secs: f64,
    policy: RepeatPolicy,
    target: Option<Coordinate>,
) -> RunRequest {
    RunRequest::new(ActionKind::PointerClick, Interval::seconds(secs), policy, target).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_three_clicks_one_second_apart() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);
    let mut watcher = engine.watch();
    let target = Coordinate::new(100.0, 200.0);

    let started = Instant::now();
    engine.start(clicks_at(1.0, RepeatPolicy::times(3).unwrap(), Some(target)));
    watcher.wait_until_finished(1).await;

    let clicks = backend.clicks();
    assert_eq!(clicks.len(), 3);
    for (i, (at, point)) in clicks.iter().enumerate() {
        assert_eq!(*point, target);
        let offset = at.duration_since(started);
        let expected = Duration::from_secs(i as u64);
        assert!(
            offset >= expected && offset < expected + Duration::from_millis(10),
            "click {i} fired at {offset:?}"
        );
    }
    assert!(!engine.is_running());

    // Nothing else fires once the bound is reached.
    sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.click_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_single_fire_bound() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);
    let mut watcher = engine.watch();

    engine.start(clicks_at(0.25, RepeatPolicy::times(1).unwrap(), None));
    let status = watcher.wait_until_finished(1).await;

    assert!(!status.running);
    sleep(Duration::from_secs(2)).await;
    assert_eq!(backend.click_count(), 1);
    assert_eq!(
        backend.events(),
        vec![
            Injected::Pointer(Edge::Down, Coordinate::new(0.0, 0.0)),
            Injected::Pointer(Edge::Up, Coordinate::new(0.0, 0.0)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_runs_until_stopped() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);

    engine.start(clicks_at(1.0, RepeatPolicy::Unbounded, None));
    sleep(Duration::from_millis(10_500)).await;

    assert_eq!(backend.click_count(), 11);
    assert!(engine.is_running());

    engine.stop();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(backend.click_count(), 11);
    assert!(!engine.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_second_start_replaces_first_schedule() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);

    engine.start(clicks_at(1.0, RepeatPolicy::Unbounded, None));
    engine.start(clicks_at(1.0, RepeatPolicy::Unbounded, None));
    sleep(Duration::from_millis(3_500)).await;

    // 0s, 1s, 2s, 3s from the second schedule only.
    assert_eq!(backend.click_count(), 4);
    assert!(engine.is_running());
    assert_eq!(engine.watch().status().runs_started, 2);
}

#[tokio::test(start_paused = true)]
async fn test_restart_resets_the_counter() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);
    let mut watcher = engine.watch();

    engine.start(clicks_at(1.0, RepeatPolicy::times(5).unwrap(), None));
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(backend.click_count(), 2);

    engine.start(clicks_at(1.0, RepeatPolicy::times(2).unwrap(), None));
    watcher.wait_until_finished(2).await;

    assert_eq!(backend.click_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);

    engine.stop();
    engine.stop();
    sleep(Duration::from_millis(100)).await;
    assert!(!engine.is_running());
    assert_eq!(engine.watch().status().runs_started, 0);

    engine.start(clicks_at(1.0, RepeatPolicy::Unbounded, None));
    sleep(Duration::from_millis(100)).await;
    assert!(engine.is_running());

    engine.stop();
    engine.stop();
    sleep(Duration::from_secs(3)).await;
    assert!(!engine.is_running());
    assert_eq!(backend.click_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_starts_then_stops() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);
    let request = clicks_at(1.0, RepeatPolicy::Unbounded, None);

    engine.toggle(request);
    sleep(Duration::from_millis(1_500)).await;
    assert!(engine.is_running());

    engine.toggle(request);
    sleep(Duration::from_secs(3)).await;
    assert!(!engine.is_running());
    assert_eq!(backend.click_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_key_tap_presses_space() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);
    let mut watcher = engine.watch();

    let request = RunRequest::new(
        ActionKind::KeyTap,
        Interval::seconds(0.5),
        RepeatPolicy::times(2).unwrap(),
        Some(Coordinate::new(9.0, 9.0)),
    )
    .unwrap();
    engine.start(request);
    watcher.wait_until_finished(1).await;

    assert_eq!(
        backend.events(),
        vec![
            Injected::Key(Code::Space, Edge::Down),
            Injected::Key(Code::Space, Edge::Up),
            Injected::Key(Code::Space, Edge::Down),
            Injected::Key(Code::Space, Edge::Up),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_follows_live_cursor_without_target() {
    let backend = RecordingBackend::with_cursor(Some(CursorReport {
        x: 50.0,
        y: 300.0,
        origin: Origin::BottomLeft,
    }));
    let engine = spawn_engine(&backend);

    engine.start(clicks_at(1.0, RepeatPolicy::Unbounded, None));
    sleep(Duration::from_millis(500)).await;
    backend.set_cursor(Some(CursorReport {
        x: 60.0,
        y: 80.0,
        origin: Origin::BottomLeft,
    }));
    sleep(Duration::from_secs(1)).await;
    engine.stop();

    let points: Vec<Coordinate> = backend.clicks().into_iter().map(|(_, p)| p).collect();
    assert_eq!(
        points,
        vec![Coordinate::new(50.0, 780.0), Coordinate::new(60.0, 1000.0)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_fires_still_count() {
    let backend = RecordingBackend::new();
    backend.refuse_events(true);
    let engine = spawn_engine(&backend);
    let mut watcher = engine.watch();

    engine.start(clicks_at(1.0, RepeatPolicy::times(2).unwrap(), None));
    let status = watcher.wait_until_finished(1).await;

    assert!(!status.running);
    assert!(backend.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_cursor_skips_fire() {
    let backend = RecordingBackend::with_cursor(None);
    let engine = spawn_engine(&backend);

    engine.start(clicks_at(1.0, RepeatPolicy::Unbounded, None));
    sleep(Duration::from_millis(1_500)).await;
    assert!(engine.is_running());
    assert_eq!(backend.click_count(), 0);

    backend.set_cursor(Some(CursorReport {
        x: 1.0,
        y: 2.0,
        origin: Origin::TopLeft,
    }));
    sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.click_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_engine_stops_when_handles_drop() {
    let backend = RecordingBackend::new();
    let engine = spawn_engine(&backend);
    let mut watcher = engine.watch();

    engine.start(clicks_at(1.0, RepeatPolicy::Unbounded, None));
    sleep(Duration::from_millis(500)).await;
    drop(engine);

    sleep(Duration::from_secs(3)).await;
    assert!(!watcher.is_running());
    assert_eq!(backend.click_count(), 1);

    // Returns false once the final idle update is seen and the engine is gone.
    while watcher.changed().await {}
    assert!(!watcher.is_running());
}

// Coordinate resolution

#[test]
fn test_fixed_target_ignores_cursor() {
    let backend = RecordingBackend::with_cursor(Some(CursorReport {
        x: 5.0,
        y: 5.0,
        origin: Origin::BottomLeft,
    }));
    let resolver = CoordinateResolver::new(backend);
    let target = Coordinate::new(100.0, 200.0);

    assert_eq!(resolver.resolve(Some(target)).unwrap(), target);
    assert_eq!(
        CoordinateResolver::new(RecordingBackend::with_cursor(None))
            .resolve(Some(target))
            .unwrap(),
        target
    );
}

#[test]
fn test_cursor_is_flipped_from_bottom_left() {
    let backend = RecordingBackend::with_cursor(Some(CursorReport {
        x: 320.0,
        y: 1000.0,
        origin: Origin::BottomLeft,
    }));
    let resolver = CoordinateResolver::new(backend);
    assert_eq!(resolver.resolve(None).unwrap(), Coordinate::new(320.0, 80.0));
}

#[test]
fn test_top_left_cursor_is_unchanged() {
    let backend = RecordingBackend::with_cursor(Some(CursorReport {
        x: 320.0,
        y: 1000.0,
        origin: Origin::TopLeft,
    }));
    let resolver = CoordinateResolver::new(backend);
    assert_eq!(resolver.resolve(None).unwrap(), Coordinate::new(320.0, 1000.0));
    assert!(CoordinateResolver::new(RecordingBackend::with_cursor(None))
        .resolve(None)
        .is_err());
}
