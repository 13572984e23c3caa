//! Integration tests driving the simulation through the public API.
//!
//! The motion engine and connection graph are plain CPU code, so a whole
//! animation session can run headless: tick the cloud at a fixed step,
//! feed the graph, and check the invariants a renderer would rely on.

use glam::Vec3;
use plexus::{Config, ConnectionGraph, ConnectionMode, GeometryUpdate, MotionState, ParticleCloud};

fn small_config() -> Config {
    Config {
        particle_count: 100,
        move_duration: 1.0,
        wait_duration: 0.1,
        ..Config::default()
    }
}

/// Run one full wait + move cycle at 60 fps.
fn run_cycle(cloud: &mut ParticleCloud, graph: &mut ConnectionGraph) {
    let step = 1.0 / 60.0;
    let mut steps = 0;
    while cloud.state() == MotionState::Waiting {
        cloud.update(step);
        graph.update(cloud.positions());
        steps += 1;
        assert!(steps < 1000, "stuck in waiting");
    }
    while cloud.state() == MotionState::Moving {
        cloud.update(step);
        graph.update(cloud.positions());
        steps += 1;
        assert!(steps < 1000, "stuck in moving");
    }
}

#[test]
fn simulation_session_stays_finite() {
    let config = small_config();
    let mut cloud = ParticleCloud::new(&config);
    let mut graph = ConnectionGraph::new(config.connection_distance);

    for _ in 0..3 {
        run_cycle(&mut cloud, &mut graph);
        for p in cloud.positions() {
            assert!(p.is_finite());
        }
        for c in graph.colors() {
            assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
        }
    }
}

#[test]
fn segment_buffers_stay_parallel() {
    let config = small_config();
    let mut cloud = ParticleCloud::new(&config);
    let mut graph = ConnectionGraph::new(config.connection_distance);

    for _ in 0..120 {
        cloud.update(1.0 / 60.0);
        graph.update(cloud.positions());
        assert_eq!(graph.positions().len(), graph.colors().len());
        assert_eq!(graph.positions().len() % 2, 0);
    }
}

#[test]
fn geometry_policy_never_recreates_on_identical_frames() {
    let config = small_config();
    let cloud = ParticleCloud::new(&config);
    let mut graph = ConnectionGraph::new(config.connection_distance);

    graph.update(cloud.positions());
    graph.commit_geometry();

    // The cloud has not moved, so the count cannot change.
    for _ in 0..10 {
        graph.update(cloud.positions());
        let update = graph.commit_geometry();
        assert_ne!(update, GeometryUpdate::Recreate);
    }
}

#[test]
fn persistent_session_only_grows() {
    let config = small_config();
    let mut cloud = ParticleCloud::new(&config);
    let mut graph = ConnectionGraph::new(config.connection_distance);
    graph.set_mode(ConnectionMode::Persistent, cloud.positions());

    let mut last = 0;
    for _ in 0..3 {
        run_cycle(&mut cloud, &mut graph);
        let count = graph.segment_count();
        assert!(count >= last, "persistent set shrank: {} -> {}", last, count);
        last = count;
    }

    graph.reset();
    graph.update(&[Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)]);
    assert_eq!(graph.segment_count(), 0);
}

#[test]
fn mode_round_trip_drops_accumulation() {
    let config = small_config();
    let mut cloud = ParticleCloud::new(&config);
    let mut graph = ConnectionGraph::new(config.connection_distance);

    graph.set_mode(ConnectionMode::Persistent, cloud.positions());
    run_cycle(&mut cloud, &mut graph);
    let accumulated = graph.segment_count();

    // Back to dynamic and into persistent again: the set re-seeds from the
    // current geometry instead of keeping the accumulated history.
    graph.set_mode(ConnectionMode::Dynamic, cloud.positions());
    graph.update(cloud.positions());
    let dynamic_now = graph.segment_count();

    graph.set_mode(ConnectionMode::Persistent, cloud.positions());
    graph.update(cloud.positions());
    assert_eq!(graph.segment_count(), dynamic_now);
    assert!(graph.segment_count() <= accumulated);
}
