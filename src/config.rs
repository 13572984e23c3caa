//! Configuration for the particle cloud and its rendering.
//!
//! All values are fixed at startup. `Config::default()` reproduces the
//! reference look: 500 particles on a radius-10 sphere with a teal
//! background and warm orange connection lines.

use glam::Vec3;

/// Bloom pass parameters.
#[derive(Clone, Copy, Debug)]
pub struct BloomConfig {
    /// How strongly the blurred bright pass is added back.
    pub strength: f32,
    /// Blur radius in UV space.
    pub radius: f32,
    /// Luminance below which pixels do not bloom.
    pub threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 0.18,
            radius: 0.1,
            threshold: 0.09,
        }
    }
}

/// Film grain and scanline parameters.
#[derive(Clone, Copy, Debug)]
pub struct FilmConfig {
    /// Intensity of the animated noise grain.
    pub noise_intensity: f32,
    /// Intensity of the horizontal scanline darkening.
    pub scanline_intensity: f32,
    /// Number of scanlines across the frame height.
    pub scanline_count: f32,
}

impl Default for FilmConfig {
    fn default() -> Self {
        Self {
            noise_intensity: 0.7,
            scanline_intensity: 0.8,
            scanline_count: 323.0,
        }
    }
}

/// Chromatic aberration parameters.
#[derive(Clone, Copy, Debug)]
pub struct AberrationConfig {
    /// UV offset applied to the red and blue channels (in opposite directions).
    pub offset: f32,
    /// Blend factor between the clean and aberrated image.
    pub opacity: f32,
}

impl Default for AberrationConfig {
    fn default() -> Self {
        Self {
            offset: 0.0005,
            opacity: 1.0,
        }
    }
}

/// Top-level configuration, fixed at construction.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of particles. Must be <= 65536 (pair keys pack two 16-bit indices).
    pub particle_count: usize,
    /// Radius of the sphere the cloud is sampled on.
    pub sphere_radius: f32,
    /// Per-axis jitter applied to each base point, as a fraction of the radius.
    pub entropy_factor: f32,
    /// Distance below which two particles connect.
    pub connection_distance: f32,
    /// Seconds a MOVING phase takes.
    pub move_duration: f32,
    /// Seconds a WAITING phase takes.
    pub wait_duration: f32,
    /// Cycles between full resets to the original configuration.
    pub reset_cycle_count: u32,
    /// Scene clear color.
    pub background: Vec3,
    pub bloom: BloomConfig,
    pub film: FilmConfig,
    pub aberration: AberrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            particle_count: 500,
            sphere_radius: 10.0,
            entropy_factor: 0.20,
            connection_distance: 3.2,
            move_duration: 5.0,
            wait_duration: 0.1,
            reset_cycle_count: 5,
            // 0x284843
            background: Vec3::new(0.157, 0.282, 0.263),
            bloom: BloomConfig::default(),
            film: FilmConfig::default(),
            aberration: AberrationConfig::default(),
        }
    }
}
