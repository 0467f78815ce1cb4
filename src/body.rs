//! Rigid bodies.
//!
//! A body aggregates shape handles and tracks kinematic state. Mass is
//! always derived — `density × Σ volume(shape)` — and recomputed whenever
//! the shape set or density changes; it can never be set directly.

use nalgebra::Vector3;

use crate::shape::{Shape, ShapeId, ShapeRegistry};
use crate::Error;

/// Maximum number of shapes a body can reference.
pub const MAX_BODY_SHAPES: usize = 8;

/// One simulated rigid object.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    /// Friction coefficient in `[0, 1]`; `0` slides freely.
    pub friction: f32,
    /// Fraction of normal velocity retained after a collision, in `[0, 1]`.
    pub restitution: f32,

    density: f32,
    mass: f32,
    shapes: heapless::Vec<ShapeId, MAX_BODY_SHAPES>,
}

impl Body {
    /// Create a body at `position` with no shapes, unit density and zero mass.
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            friction: 0.0,
            restitution: 0.0,
            density: 1.0,
            mass: 0.0,
            shapes: heapless::Vec::new(),
        }
    }

    /// Builder: set initial velocity.
    pub fn with_velocity(mut self, velocity: Vector3<f32>) -> Self {
        self.velocity = velocity;
        self
    }

    /// Builder: set friction coefficient (clamped to `0.0..=1.0`).
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    /// Builder: set restitution (clamped to `0.0..=1.0`).
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    /// Append a shape handle and recompute mass.
    ///
    /// Fails with [`Error::InvalidParameter`] when the handle does not
    /// resolve in `shapes`, and [`Error::CapacityExceeded`] when the body
    /// already references [`MAX_BODY_SHAPES`] shapes.
    pub fn attach_shape<const S: usize>(
        &mut self,
        id: ShapeId,
        shapes: &ShapeRegistry<S>,
    ) -> Result<(), Error> {
        if shapes.get(id).is_none() {
            return Err(Error::InvalidParameter("unknown shape handle"));
        }
        self.shapes.push(id).map_err(|_| Error::CapacityExceeded)?;
        self.recompute_mass(shapes);
        Ok(())
    }

    /// Change density and recompute mass.
    ///
    /// Fails with [`Error::InvalidParameter`] unless `density` is positive
    /// and finite; the previous density is kept on failure.
    pub fn set_density<const S: usize>(
        &mut self,
        density: f32,
        shapes: &ShapeRegistry<S>,
    ) -> Result<(), Error> {
        if !(density > 0.0 && density.is_finite()) {
            return Err(Error::InvalidParameter("density must be positive"));
        }
        self.density = density;
        self.recompute_mass(shapes);
        Ok(())
    }

    /// Derived mass: `density × Σ volume(shape)`.
    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Handles of all attached shapes, in attachment order.
    pub fn shape_ids(&self) -> &[ShapeId] {
        &self.shapes
    }

    /// The first attached shape, used for pairwise narrow-phase tests.
    #[inline]
    pub fn primary_shape(&self) -> Option<ShapeId> {
        self.shapes.first().copied()
    }

    fn recompute_mass<const S: usize>(&mut self, shapes: &ShapeRegistry<S>) {
        let mut volume = 0.0;
        for id in &self.shapes {
            volume += shapes.get(*id).map(Shape::volume).unwrap_or(0.0);
        }
        self.mass = volume * self.density;
        debug_assert!(self.mass >= 0.0, "mass must never go negative");
    }
}
