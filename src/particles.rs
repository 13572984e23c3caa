//! Particle motion engine.
//!
//! Owns the particle positions and drives the two-state animation cycle:
//! the cloud waits, then eases every particle from its current configuration
//! to a new one generated by a pair of random affine transforms. Every
//! `reset_cycle_count` cycles the target is the original configuration
//! instead, so the cloud periodically reassembles itself.

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::math::{ease_in_out_quint, random_transform, sphere_point};

/// Phase of the animation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    /// Holding still, counting down to the next move.
    Waiting,
    /// Interpolating from the start snapshot to the end snapshot.
    Moving,
}

/// The animated particle cloud.
///
/// Positions are mutated in place by [`update`](ParticleCloud::update);
/// everything downstream (the connection graph, the renderer) reads them
/// through [`positions`](ParticleCloud::positions).
pub struct ParticleCloud {
    positions: Vec<Vec3>,
    start_positions: Vec<Vec3>,
    end_positions: Vec<Vec3>,
    original_positions: Vec<Vec3>,
    state: MotionState,
    progress: f32,
    reset_progress: u32,
    move_duration: f32,
    wait_duration: f32,
    reset_cycle_count: u32,
    rng: StdRng,
}

impl ParticleCloud {
    /// Create a cloud from the configuration, seeded from OS entropy.
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a cloud with an explicit RNG (deterministic for tests).
    pub fn with_rng(config: &Config, mut rng: StdRng) -> Self {
        assert!(
            config.particle_count <= 65536,
            "particle count must fit 16-bit pair keys"
        );

        let jitter = config.entropy_factor * config.sphere_radius;
        let positions: Vec<Vec3> = (0..config.particle_count)
            .map(|_| {
                let base = sphere_point(&mut rng, config.sphere_radius);
                let entropy = Vec3::new(
                    (rng.gen::<f32>() - 0.5) * jitter,
                    (rng.gen::<f32>() - 0.5) * jitter,
                    (rng.gen::<f32>() - 0.5) * jitter,
                );
                base + entropy
            })
            .collect();

        Self {
            start_positions: positions.clone(),
            end_positions: positions.clone(),
            original_positions: positions.clone(),
            positions,
            state: MotionState::Waiting,
            progress: 0.0,
            reset_progress: 0,
            move_duration: config.move_duration,
            wait_duration: config.wait_duration,
            reset_cycle_count: config.reset_cycle_count,
            rng,
        }
    }

    /// Advance the animation by `delta_time` seconds.
    pub fn update(&mut self, delta_time: f32) {
        match self.state {
            MotionState::Waiting => self.update_waiting(delta_time),
            MotionState::Moving => self.update_moving(delta_time),
        }
    }

    fn update_waiting(&mut self, delta_time: f32) {
        self.progress += delta_time / self.wait_duration;
        if self.progress >= 1.0 {
            self.reset_progress += 1;
            let reset = self.reset_progress >= self.reset_cycle_count;
            if reset {
                self.reset_progress = 0;
            }
            self.start_new_cycle(reset);
            self.progress = 0.0;
            self.state = MotionState::Moving;
        }
    }

    fn update_moving(&mut self, delta_time: f32) {
        self.progress += delta_time / self.move_duration;

        if self.progress >= 1.0 {
            // Land on the targets exactly; lerp at t = 1 leaves float residue.
            self.positions.copy_from_slice(&self.end_positions);
            self.progress = 0.0;
            self.state = MotionState::Waiting;
            return;
        }

        let eased = ease_in_out_quint(self.progress);
        for i in 0..self.positions.len() {
            self.positions[i] = self.start_positions[i].lerp(self.end_positions[i], eased);
        }
    }

    /// Pick the next target configuration.
    ///
    /// The previous targets become the new starts, so consecutive cycles
    /// join without a jump. A reset cycle targets the original
    /// configuration; a normal cycle splits the cloud into two random
    /// groups and pushes each through its own random affine transform.
    fn start_new_cycle(&mut self, reset: bool) {
        self.start_positions.copy_from_slice(&self.end_positions);

        if reset {
            self.end_positions.copy_from_slice(&self.original_positions);
            return;
        }

        let transforms = [
            random_transform(&mut self.rng),
            random_transform(&mut self.rng),
        ];
        self.apply_group_transforms(&transforms);
    }

    /// Assign each particle to one of the two groups with p = 0.5 and push
    /// its start entry through that group's transform.
    fn apply_group_transforms(&mut self, transforms: &[Mat4; 2]) {
        for i in 0..self.end_positions.len() {
            let group = usize::from(self.rng.gen::<f32>() >= 0.5);
            self.end_positions[i] = transforms[group].transform_point3(self.start_positions[i]);
        }
    }

    /// Current particle positions.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the cloud holds no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Current animation phase.
    #[inline]
    pub fn state(&self) -> MotionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            particle_count: 64,
            ..Config::default()
        }
    }

    fn test_cloud() -> ParticleCloud {
        ParticleCloud::with_rng(&test_config(), StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_construction_within_bounds() {
        let config = test_config();
        let cloud = test_cloud();
        assert_eq!(cloud.len(), 64);

        // Sphere radius plus the worst-case jitter on every axis.
        let jitter = config.entropy_factor * config.sphere_radius * 0.5;
        let bound = config.sphere_radius + jitter * 3.0_f32.sqrt();
        for p in cloud.positions() {
            assert!(p.length() <= bound + 1e-4);
        }
    }

    #[test]
    fn test_starts_waiting() {
        let cloud = test_cloud();
        assert_eq!(cloud.state(), MotionState::Waiting);
    }

    #[test]
    fn test_wait_transitions_to_moving() {
        let mut cloud = test_cloud();
        cloud.update(cloud.wait_duration + 0.01);
        assert_eq!(cloud.state(), MotionState::Moving);
        assert_eq!(cloud.progress, 0.0);
    }

    #[test]
    fn test_cycle_continuity() {
        let mut cloud = test_cloud();
        let before = cloud.end_positions.clone();
        cloud.update(cloud.wait_duration + 0.01);
        // The previous targets are the new starts.
        assert_eq!(cloud.start_positions, before);
        // And the new targets differ from them.
        assert_ne!(cloud.end_positions, cloud.start_positions);
    }

    #[test]
    fn test_move_completes_at_end_positions() {
        let mut cloud = test_cloud();
        cloud.update(cloud.wait_duration + 0.01);
        let targets = cloud.end_positions.clone();

        // Feed deltas summing past the move duration; progress clamps at 1.
        let step = cloud.move_duration / 7.0;
        for _ in 0..8 {
            cloud.update(step);
        }
        assert_eq!(cloud.state(), MotionState::Waiting);
        for (p, t) in cloud.positions.iter().zip(&targets) {
            assert_eq!(p, t);
        }
    }

    #[test]
    fn test_midway_position_is_eased_lerp() {
        let mut cloud = test_cloud();
        cloud.update(cloud.wait_duration + 0.01);
        let t = 0.3;
        cloud.update(cloud.move_duration * t);
        let eased = ease_in_out_quint(t);
        for i in 0..cloud.len() {
            let expected = cloud.start_positions[i].lerp(cloud.end_positions[i], eased);
            assert!((cloud.positions[i] - expected).length() < 1e-4);
        }
    }

    #[test]
    fn test_cycle_splits_cloud_under_two_transforms() {
        let mut cloud = test_cloud();
        let transforms = [
            Mat4::from_translation(Vec3::new(3.0, -1.0, 2.0)),
            Mat4::from_scale(Vec3::splat(2.0)),
        ];
        // Desync the live positions so transforming the wrong snapshot
        // cannot pass by coincidence.
        for p in &mut cloud.positions {
            *p += Vec3::ONE;
        }
        cloud.apply_group_transforms(&transforms);

        // Every target is its start entry under exactly one of the two
        // transforms, and both groups are non-empty at this size.
        let mut used = [false; 2];
        for (start, end) in cloud.start_positions.iter().zip(&cloud.end_positions) {
            let a = transforms[0].transform_point3(*start);
            let b = transforms[1].transform_point3(*start);
            let hit_a = (a - *end).length() < 1e-4;
            let hit_b = (b - *end).length() < 1e-4;
            assert!(hit_a || hit_b, "target matches neither group transform");
            used[0] |= hit_a;
            used[1] |= hit_b;
        }
        assert!(used[0] && used[1], "one group is empty");
    }

    #[test]
    fn test_reset_cycle_targets_original() {
        let mut cloud = test_cloud();
        let cycles = cloud.reset_cycle_count;
        for cycle in 1..=cycles {
            cloud.update(cloud.wait_duration + 0.01);
            assert_eq!(cloud.state(), MotionState::Moving);
            cloud.update(cloud.move_duration + 0.01);
            assert_eq!(cloud.state(), MotionState::Waiting);
            if cycle == cycles {
                assert_eq!(cloud.end_positions, cloud.original_positions);
                assert_eq!(cloud.reset_progress, 0);
            } else {
                assert_ne!(cloud.end_positions, cloud.original_positions);
            }
        }
    }

    #[test]
    fn test_waiting_leaves_positions_untouched() {
        let mut cloud = test_cloud();
        let before = cloud.positions.clone();
        cloud.update(cloud.wait_duration * 0.5);
        assert_eq!(cloud.positions, before);
    }
}
