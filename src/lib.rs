//! Minimal real-time rigid body simulation.
//!
//! Advances a set of bodies under gravity, detects intersections between
//! convex shapes with a GJK narrow phase, and resolves collisions with a
//! mass-weighted elastic response. Rendering, windowing and input are left
//! to the caller, which samples body state read-only between steps.
//!
//! Designed for `no_std` environments: all collections are fixed-capacity
//! `heapless` types and world capacities are const generics.
//!
//! # Example
//! ```
//! use fiz3d::{Body, Shape, World};
//! use nalgebra::Vector3;
//!
//! let mut world = World::<16>::new();
//!
//! let geometry = world
//!     .add_shape(Shape::sphere(Vector3::zeros(), 0.5).unwrap())
//!     .unwrap();
//! let ball = world
//!     .add_body(Body::new(Vector3::new(0.0, 10.0, 0.0)))
//!     .unwrap();
//! world.attach_shape(ball, geometry).unwrap();
//!
//! // Advance the simulation — the ball falls toward the ground plane at y = 0.
//! for _ in 0..60 {
//!     world.step(1.0 / 60.0);
//! }
//! assert!(world.body(ball).unwrap().position.y < 10.0);
//! ```

#![no_std]

pub mod body;
pub mod counters;
pub mod gjk;
pub mod shape;
pub mod simplex;
pub mod world;

pub use body::Body;
pub use counters::StepCounters;
pub use gjk::{GjkConfig, Outcome};
pub use shape::{Shape, ShapeId, ShapeRegistry};
pub use world::{BodyId, World};

/// Errors surfaced by fallible constructors and mutators.
///
/// Expected narrow-phase outcomes ("no intersection", iteration-bound
/// exhaustion) are ordinary return values, not errors; see [`gjk::Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A caller-supplied value is outside its documented domain
    /// (non-positive density, zero-length search direction, inverted AABB
    /// corners, ...). The message names the offending parameter.
    InvalidParameter(&'static str),
    /// A fixed-capacity collection is full.
    CapacityExceeded,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidParameter(what) => write!(f, "invalid parameter: {}", what),
            Error::CapacityExceeded => write!(f, "capacity exceeded"),
        }
    }
}

impl core::error::Error for Error {}
