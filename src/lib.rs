//! # Plexus
//!
//! An animated 3D particle cloud. Particles sit on a jittered sphere and
//! glide between random affine rearrangements of it, while lines connect
//! pairs that drift within a distance threshold. The frame is finished
//! with bloom, film grain, scanlines, and chromatic aberration.
//!
//! ## Quick Start
//!
//! ```ignore
//! use plexus::Config;
//!
//! fn main() {
//!     env_logger::init();
//!     plexus::run(Config::default()).unwrap();
//! }
//! ```
//!
//! ## Controls
//!
//! - `D` - dynamic connections (recomputed every frame)
//! - `P` - persistent connections (accumulate, never drop)
//! - `R` - clear the persistent set
//! - `Space` - pause
//! - Mouse drag / wheel - orbit and zoom the camera
//!
//! The simulation core ([`particles`], [`connections`], [`math`]) is plain
//! CPU code with no GPU dependency, so it can be driven and tested headless.

pub mod config;
pub mod connections;
pub mod error;
pub mod gpu;
pub mod math;
pub mod particles;
pub mod time;
pub mod window;

pub use config::Config;
pub use connections::{ConnectionGraph, ConnectionMode, GeometryUpdate};
pub use error::AppError;
pub use particles::{MotionState, ParticleCloud};
pub use window::run;
