//! Connection graph between nearby particles.
//!
//! Every frame the graph scans particle pairs and emits a line-segment
//! vertex/color buffer for the renderer. Two modes:
//!
//! - **Dynamic**: connections are recomputed from scratch each frame and
//!   exist only while the pair is within the threshold.
//! - **Persistent**: once a pair comes within the threshold it is remembered
//!   and keeps rendering even after the particles separate, until an
//!   explicit reset or a mode switch.
//!
//! The pair scan is O(N^2); at the default N = 500 that is cheap. A
//! spatial grid could replace it behind the same interface.

use std::collections::HashSet;

use glam::Vec3;

use crate::math::{pair_indices, pair_key};

/// How connections are maintained across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Recompute from proximity every frame.
    Dynamic,
    /// Accumulate; pairs stay connected once formed.
    Persistent,
}

/// What the renderer should do with its segment buffer this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryUpdate {
    /// Segment count swung by more than 10%: drop the old buffer and
    /// allocate a fresh one sized for the new count.
    Recreate,
    /// Small change: overwrite the existing buffer in place.
    InPlace,
    /// Nothing to draw: release the buffer.
    Clear,
}

/// Proximity graph over the particle cloud.
pub struct ConnectionGraph {
    mode: ConnectionMode,
    threshold: f32,
    persistent: HashSet<u32>,
    line_positions: Vec<Vec3>,
    line_colors: Vec<Vec3>,
    rendered_segments: usize,
}

impl ConnectionGraph {
    /// Create a graph with the given connection distance threshold.
    pub fn new(threshold: f32) -> Self {
        Self {
            mode: ConnectionMode::Dynamic,
            threshold,
            persistent: HashSet::new(),
            line_positions: Vec::new(),
            line_colors: Vec::new(),
            rendered_segments: 0,
        }
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Switch modes.
    ///
    /// Entering `Persistent` re-seeds the persistent set from the current
    /// geometry, discarding anything accumulated before; entering `Dynamic`
    /// clears it. Not idempotent: re-activating `Persistent` starts over.
    pub fn set_mode(&mut self, mode: ConnectionMode, positions: &[Vec3]) {
        self.mode = mode;
        match mode {
            ConnectionMode::Persistent => self.seed_persistent(positions),
            ConnectionMode::Dynamic => self.persistent.clear(),
        }
    }

    /// Rebuild the persistent set from current proximity.
    ///
    /// An empty particle list is a no-op (the previous set survives).
    pub fn seed_persistent(&mut self, positions: &[Vec3]) {
        if positions.is_empty() {
            return;
        }
        self.persistent.clear();
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if positions[i].distance(positions[j]) < self.threshold {
                    self.persistent.insert(pair_key(i, j));
                }
            }
        }
    }

    /// Forget every persistent connection, whatever the current mode.
    pub fn reset(&mut self) {
        self.persistent.clear();
    }

    /// Recompute the segment buffers from the given particle positions.
    pub fn update(&mut self, positions: &[Vec3]) {
        self.line_positions.clear();
        self.line_colors.clear();
        if positions.is_empty() {
            return;
        }
        match self.mode {
            ConnectionMode::Dynamic => self.update_dynamic(positions),
            ConnectionMode::Persistent => self.update_persistent(positions),
        }
    }

    fn update_dynamic(&mut self, positions: &[Vec3]) {
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let dist = positions[i].distance(positions[j]);
                if dist < self.threshold {
                    let proximity = 1.0 - dist / self.threshold;
                    let color = Vec3::new(
                        (0.7 + proximity * 0.2).max(0.3),
                        (0.3 + proximity * 0.8).max(0.3),
                        (0.3 + proximity * 0.8).max(0.3),
                    );
                    self.push_segment(positions[i], positions[j], color);
                }
            }
        }
    }

    fn update_persistent(&mut self, positions: &[Vec3]) {
        // Grow the set with any pair currently within the threshold.
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if positions[i].distance(positions[j]) < self.threshold {
                    self.persistent.insert(pair_key(i, j));
                }
            }
        }

        // Emit every remembered pair; the current distance only feeds the
        // color, so stretched connections dim but keep rendering.
        for &key in &self.persistent {
            let (i, j) = pair_indices(key);
            let dist = positions[i].distance(positions[j]);
            let intensity = (1.0 - dist / self.threshold).max(0.3);
            let color = Vec3::new(intensity, intensity * 0.5, 0.2);
            self.line_positions.push(positions[i]);
            self.line_positions.push(positions[j]);
            self.line_colors.push(color);
            self.line_colors.push(color);
        }
    }

    fn push_segment(&mut self, a: Vec3, b: Vec3, color: Vec3) {
        self.line_positions.push(a);
        self.line_positions.push(b);
        self.line_colors.push(color);
        self.line_colors.push(color);
    }

    /// Number of segments in the current buffers.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.line_positions.len() / 2
    }

    /// Segment endpoints, two per segment.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.line_positions
    }

    /// Vertex colors, parallel to [`positions`](ConnectionGraph::positions).
    #[inline]
    pub fn colors(&self) -> &[Vec3] {
        &self.line_colors
    }

    /// Decide how the renderer should apply this frame's buffers, and
    /// record the new segment count as rendered.
    ///
    /// Reallocate only when the count moves by more than 10% of what is
    /// currently allocated; small oscillations update in place.
    pub fn commit_geometry(&mut self) -> GeometryUpdate {
        let new = self.segment_count();
        let old = self.rendered_segments;
        self.rendered_segments = new;

        if new == 0 {
            GeometryUpdate::Clear
        } else if new.abs_diff(old) as f32 > old as f32 * 0.1 {
            GeometryUpdate::Recreate
        } else {
            GeometryUpdate::InPlace
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tight pairs far apart: (0,1) and (2,3) connect at threshold 1.5.
    fn square_cluster() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_dynamic_counts_pairs_below_threshold() {
        let mut graph = ConnectionGraph::new(1.5);
        let positions = square_cluster();
        for _ in 0..3 {
            graph.update(&positions);
            assert_eq!(graph.segment_count(), 2);
        }
    }

    #[test]
    fn test_dynamic_retains_nothing() {
        let mut graph = ConnectionGraph::new(1.5);
        let mut positions = square_cluster();
        graph.update(&positions);
        assert_eq!(graph.segment_count(), 2);

        positions[1] = Vec3::new(100.0, 0.0, 0.0);
        graph.update(&positions);
        assert_eq!(graph.segment_count(), 1);
    }

    #[test]
    fn test_persistent_survives_separation() {
        let mut graph = ConnectionGraph::new(1.5);
        let mut positions = square_cluster();
        graph.set_mode(ConnectionMode::Persistent, &positions);
        graph.update(&positions);
        assert_eq!(graph.segment_count(), 2);

        // Pair 0-1 stretches far past the threshold but keeps rendering.
        positions[1] = Vec3::new(100.0, 0.0, 0.0);
        graph.update(&positions);
        assert_eq!(graph.segment_count(), 2);
        assert!(graph.persistent.contains(&pair_key(0, 1)));
        assert!(graph.persistent.contains(&pair_key(2, 3)));
    }

    #[test]
    fn test_persistent_grows_with_new_proximity() {
        let mut graph = ConnectionGraph::new(1.5);
        let mut positions = square_cluster();
        graph.set_mode(ConnectionMode::Persistent, &positions);

        positions[2] = Vec3::new(0.5, 0.5, 0.0);
        graph.update(&positions);
        // 2 is now near 0 and 1; 2-3 is remembered from seeding.
        assert!(graph.persistent.contains(&pair_key(0, 2)));
        assert!(graph.persistent.contains(&pair_key(1, 2)));
        assert!(graph.persistent.contains(&pair_key(2, 3)));
    }

    #[test]
    fn test_reset_clears_regardless_of_mode() {
        let mut graph = ConnectionGraph::new(1.5);
        let positions = square_cluster();
        graph.set_mode(ConnectionMode::Persistent, &positions);
        assert!(!graph.persistent.is_empty());

        graph.reset();
        assert!(graph.persistent.is_empty());

        // With nothing close enough afterwards, nothing renders.
        let far = vec![Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)];
        graph.update(&far);
        assert_eq!(graph.segment_count(), 0);
    }

    #[test]
    fn test_switch_to_dynamic_clears_set() {
        let mut graph = ConnectionGraph::new(1.5);
        let positions = square_cluster();
        graph.set_mode(ConnectionMode::Persistent, &positions);
        assert!(!graph.persistent.is_empty());
        graph.set_mode(ConnectionMode::Dynamic, &positions);
        assert!(graph.persistent.is_empty());
    }

    #[test]
    fn test_persistent_reactivation_reseeds() {
        let mut graph = ConnectionGraph::new(1.5);
        let mut positions = square_cluster();
        graph.set_mode(ConnectionMode::Persistent, &positions);

        // Accumulate an extra connection, then move everyone apart.
        positions[2] = Vec3::new(0.5, 0.5, 0.0);
        graph.update(&positions);
        positions[2] = Vec3::new(10.0, 0.0, 0.0);
        positions[1] = Vec3::new(100.0, 0.0, 0.0);

        // Re-activation scans fresh geometry: only 2-3 remains close.
        graph.set_mode(ConnectionMode::Persistent, &positions);
        assert_eq!(graph.persistent.len(), 1);
        assert!(graph.persistent.contains(&pair_key(2, 3)));
    }

    #[test]
    fn test_seed_with_no_particles_is_noop() {
        let mut graph = ConnectionGraph::new(1.5);
        graph.set_mode(ConnectionMode::Persistent, &square_cluster());
        let before = graph.persistent.len();
        graph.seed_persistent(&[]);
        assert_eq!(graph.persistent.len(), before);
    }

    #[test]
    fn test_update_with_no_particles_is_noop() {
        let mut graph = ConnectionGraph::new(1.5);
        graph.update(&[]);
        assert_eq!(graph.segment_count(), 0);
    }

    #[test]
    fn test_color_floor() {
        let mut graph = ConnectionGraph::new(1.5);
        // Just inside the threshold: proximity near zero, colors clamp to 0.3.
        let positions = vec![Vec3::ZERO, Vec3::new(1.499, 0.0, 0.0)];
        graph.update(&positions);
        let c = graph.colors()[0];
        assert!(c.min_element() >= 0.3 - 1e-6);
    }

    #[test]
    fn test_persistent_color_uses_current_distance() {
        let mut graph = ConnectionGraph::new(1.5);
        let mut positions = vec![Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0)];
        graph.set_mode(ConnectionMode::Persistent, &positions);
        graph.update(&positions);
        let bright = graph.colors()[0].x;

        positions[1] = Vec3::new(100.0, 0.0, 0.0);
        graph.update(&positions);
        let dim = graph.colors()[0].x;
        assert!(bright > dim);
        // Clamped at the floor once far beyond the threshold.
        assert!((dim - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_geometry_policy_hysteresis() {
        let mut graph = ConnectionGraph::new(1.5);

        // First frame with segments: 0 -> 2 exceeds 10% of 0.
        graph.update(&square_cluster());
        assert_eq!(graph.commit_geometry(), GeometryUpdate::Recreate);

        // Same count again: within the band, update in place.
        graph.update(&square_cluster());
        assert_eq!(graph.commit_geometry(), GeometryUpdate::InPlace);

        // Everything out of range: clear.
        graph.update(&[Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0)]);
        assert_eq!(graph.commit_geometry(), GeometryUpdate::Clear);
    }

    #[test]
    fn test_geometry_policy_band_edges() {
        let mut graph = ConnectionGraph::new(1.5);
        graph.rendered_segments = 100;

        // 105 segments: |105 - 100| = 5 <= 10, in place.
        graph.line_positions = vec![Vec3::ZERO; 210];
        assert_eq!(graph.commit_geometry(), GeometryUpdate::InPlace);

        // 120 segments from 105: |120 - 105| = 15 > 10.5, recreate.
        graph.line_positions = vec![Vec3::ZERO; 240];
        assert_eq!(graph.commit_geometry(), GeometryUpdate::Recreate);
    }
}
