//! Math helpers shared by the motion engine and the connection graph.

use glam::{EulerRot, Mat4, Quat, Vec3};
use rand::Rng;

/// Ease-in-out quintic curve.
///
/// `f(0) = 0`, `f(0.5) = 0.5`, `f(1) = 1`, monotone on [0, 1] and
/// C1-continuous at the midpoint.
pub fn ease_in_out_quint(t: f32) -> f32 {
    if t < 0.5 {
        16.0 * t * t * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
    }
}

/// Uniform random point on a sphere surface of the given radius.
///
/// Inverse-transform sampling: theta uniform in [0, 2pi), phi = acos(2u - 1).
/// Uniform phi would cluster points at the poles.
pub fn sphere_point<R: Rng>(rng: &mut R, radius: f32) -> Vec3 {
    let theta = rng.gen::<f32>() * std::f32::consts::TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}

/// Random affine transform: translation uniform in +-5 per axis, rotation
/// uniform per axis composed via quaternion, isotropic scale in [0.5, 1.5].
pub fn random_transform<R: Rng>(rng: &mut R) -> Mat4 {
    let translation = Vec3::new(
        rng.gen_range(-5.0..5.0),
        rng.gen_range(-5.0..5.0),
        rng.gen_range(-5.0..5.0),
    );
    let rotation = Quat::from_euler(
        EulerRot::XYZ,
        rng.gen_range(0.0..std::f32::consts::TAU),
        rng.gen_range(0.0..std::f32::consts::TAU),
        rng.gen_range(0.0..std::f32::consts::TAU),
    );
    let scale = rng.gen_range(0.5..1.5);
    Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, translation)
}

/// Canonical key for an unordered particle pair.
///
/// The smaller index lands in the high 16 bits, so `pair_key(i, j)` and
/// `pair_key(j, i)` collide. Only valid while indices stay below 65536.
#[inline]
pub fn pair_key(i: usize, j: usize) -> u32 {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    ((lo as u32) << 16) | hi as u32
}

/// Recover the (smaller, larger) index pair from a canonical key.
#[inline]
pub fn pair_indices(key: u32) -> (usize, usize) {
    (((key >> 16) & 0xFFFF) as usize, (key & 0xFFFF) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ease_endpoints() {
        assert_eq!(ease_in_out_quint(0.0), 0.0);
        assert_eq!(ease_in_out_quint(1.0), 1.0);
        assert!((ease_in_out_quint(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ease_monotone() {
        let mut prev = 0.0;
        for i in 0..=1000 {
            let v = ease_in_out_quint(i as f32 / 1000.0);
            assert!(v >= prev, "ease decreased at t={}", i as f32 / 1000.0);
            prev = v;
        }
    }

    #[test]
    fn test_sphere_point_on_surface() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let p = sphere_point(&mut rng, 10.0);
            assert!((p.length() - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_pair_key_symmetry() {
        assert_eq!(pair_key(3, 41), pair_key(41, 3));
        assert_eq!(pair_key(0, 65535), pair_key(65535, 0));
    }

    #[test]
    fn test_pair_key_unique() {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for i in 0..50 {
            for j in (i + 1)..50 {
                assert!(seen.insert(pair_key(i, j)), "duplicate key for ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_pair_indices_roundtrip() {
        let (i, j) = pair_indices(pair_key(12, 7));
        assert_eq!((i, j), (7, 12));
    }

    #[test]
    fn test_random_transform_isotropic_scale() {
        let mut rng = StdRng::seed_from_u64(1);
        let m = random_transform(&mut rng);
        let (scale, _, _) = m.to_scale_rotation_translation();
        assert!((scale.x - scale.y).abs() < 1e-4);
        assert!((scale.y - scale.z).abs() < 1e-4);
        assert!(scale.x >= 0.5 && scale.x <= 1.5);
    }
}
