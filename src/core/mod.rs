//! Core primitives.
//!
//! Vector math and the seeded random source shared by the run simulation
//! and the progression layer.

pub mod vec3;
pub mod rng;

// Re-export core types
pub use vec3::Vec3;
pub use rng::SeededRng;
