//! Convex collision geometry.
//!
//! Every shape exposes three pure functions: a support mapping (the only
//! primitive the narrow phase is allowed to use), a point containment test,
//! and a closed-form volume. Shapes are stored in a [`ShapeRegistry`] arena
//! and referenced by [`ShapeId`] handles, so growing the registry never
//! invalidates a handle held by a body.

use nalgebra::Vector3;

use crate::Error;

/// Maximum number of vertices a [`Shape::Polyhedron`] can carry.
pub const MAX_POLYHEDRON_VERTICES: usize = 16;

/// A convex collision shape, defined in body-local space.
///
/// The shape is positioned relative to its owning body: a sphere's `center`
/// and an AABB's corners are offsets from the body position.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A sphere with a center offset and radius.
    Sphere { center: Vector3<f32>, radius: f32 },
    /// An axis-aligned box between two corners, `min <= max` componentwise.
    Aabb { min: Vector3<f32>, max: Vector3<f32> },
    /// A convex vertex cloud. Convexity is assumed, not validated.
    Polyhedron {
        vertices: heapless::Vec<Vector3<f32>, MAX_POLYHEDRON_VERTICES>,
    },
}

impl Shape {
    /// Create a sphere. Fails with [`Error::InvalidParameter`] unless
    /// `radius` is positive and finite.
    pub fn sphere(center: Vector3<f32>, radius: f32) -> Result<Self, Error> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(Error::InvalidParameter("sphere radius must be positive"));
        }
        Ok(Shape::Sphere { center, radius })
    }

    /// Create an axis-aligned box. Fails with [`Error::InvalidParameter`]
    /// unless `min <= max` on every axis.
    pub fn aabb(min: Vector3<f32>, max: Vector3<f32>) -> Result<Self, Error> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(Error::InvalidParameter("AABB corners must satisfy min <= max"));
        }
        Ok(Shape::Aabb { min, max })
    }

    /// Create a convex polyhedron from a vertex cloud.
    ///
    /// Fails with [`Error::InvalidParameter`] when `vertices` is empty and
    /// [`Error::CapacityExceeded`] when it holds more than
    /// [`MAX_POLYHEDRON_VERTICES`] points.
    pub fn polyhedron(vertices: &[Vector3<f32>]) -> Result<Self, Error> {
        if vertices.is_empty() {
            return Err(Error::InvalidParameter("polyhedron needs at least one vertex"));
        }
        let vertices =
            heapless::Vec::from_slice(vertices).map_err(|_| Error::CapacityExceeded)?;
        Ok(Shape::Polyhedron { vertices })
    }

    /// The point on the shape's boundary extremal in `direction`.
    ///
    /// This is the sole geometric primitive the narrow phase uses, and it is
    /// invariant under positive scaling of `direction`. The direction must be
    /// non-zero; the public GJK entry point validates this. A zero direction
    /// on a sphere falls back to the center rather than producing NaN.
    pub fn support(&self, direction: &Vector3<f32>) -> Vector3<f32> {
        match self {
            Shape::Sphere { center, radius } => {
                let norm = direction.norm();
                if norm <= f32::EPSILON {
                    return *center;
                }
                center + direction * (radius / norm)
            }
            Shape::Aabb { min, max } => Vector3::new(
                if direction.x < 0.0 { min.x } else { max.x },
                if direction.y < 0.0 { min.y } else { max.y },
                if direction.z < 0.0 { min.z } else { max.z },
            ),
            Shape::Polyhedron { vertices } => {
                let mut best = vertices[0];
                let mut best_dot = best.dot(direction);
                for vertex in vertices.iter().skip(1) {
                    let dot = vertex.dot(direction);
                    if dot > best_dot {
                        best_dot = dot;
                        best = *vertex;
                    }
                }
                best
            }
        }
    }

    /// Whether `point` (in shape-local space) lies inside the shape.
    ///
    /// Spheres and AABBs use their closed forms; a polyhedron runs a GJK
    /// point query against its vertex cloud.
    pub fn contains_point(&self, point: &Vector3<f32>) -> bool {
        match self {
            Shape::Sphere { center, radius } => (point - center).norm() <= *radius,
            Shape::Aabb { min, max } => {
                point.x >= min.x
                    && point.x <= max.x
                    && point.y >= min.y
                    && point.y <= max.y
                    && point.z >= min.z
                    && point.z <= max.z
            }
            Shape::Polyhedron { .. } => {
                let mut probe = heapless::Vec::new();
                // Capacity is at least one, the push cannot fail.
                let _ = probe.push(*point);
                let probe = Shape::Polyhedron { vertices: probe };
                matches!(
                    crate::gjk::intersect(self, &Vector3::zeros(), &probe, &Vector3::zeros()),
                    crate::gjk::Outcome::Intersecting
                )
            }
        }
    }

    /// Closed-form volume, `>= 0`.
    ///
    /// A polyhedron carries no face data, so it is treated as degenerate
    /// zero-volume geometry and contributes no mass.
    pub fn volume(&self) -> f32 {
        match self {
            Shape::Sphere { radius, .. } => {
                (4.0 / 3.0) * core::f32::consts::PI * radius * radius * radius
            }
            Shape::Aabb { min, max } => {
                (max.x - min.x) * (max.y - min.y) * (max.z - min.z)
            }
            Shape::Polyhedron { .. } => 0.0,
        }
    }
}

/// Handle into a [`ShapeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeId(pub(crate) usize);

/// Append-only arena of shapes with stable slots.
///
/// Bodies hold [`ShapeId`] handles instead of references, so inserting more
/// shapes never leaves a body pointing at freed or moved geometry. Shapes
/// are released only when the registry itself is dropped.
#[derive(Debug, Default)]
pub struct ShapeRegistry<const S: usize> {
    shapes: heapless::Vec<Shape, S>,
}

impl<const S: usize> ShapeRegistry<S> {
    pub fn new() -> Self {
        Self {
            shapes: heapless::Vec::new(),
        }
    }

    /// Insert a shape, returning its handle, or [`Error::CapacityExceeded`].
    pub fn insert(&mut self, shape: Shape) -> Result<ShapeId, Error> {
        let id = ShapeId(self.shapes.len());
        self.shapes
            .push(shape)
            .map_err(|_| Error::CapacityExceeded)?;
        Ok(id)
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
