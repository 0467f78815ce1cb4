//! GJK intersection query.
//!
//! Determines whether the Minkowski difference of two convex shapes
//! contains the origin, which holds iff the shapes overlap. Only the
//! shapes' support mappings are consulted; no internal representation
//! leaks into the query.
//!
//! In exact arithmetic convex GJK terminates within four iterations (one
//! per simplex dimension), so the default bound of 32 is a generous guard
//! against floating-point degeneracy. Exhausting it yields
//! [`Outcome::NonConvergent`], which callers treat as "no intersection"
//! and may surface through a diagnostic counter; it is never an error.

use nalgebra::Vector3;

use crate::shape::Shape;
use crate::simplex::Simplex;
use crate::Error;

/// Squared length below which a search direction is considered zero,
/// meaning the origin lies on the current simplex.
const DIRECTION_EPSILON: f32 = 1e-10;

/// Tuning knobs for the query loop.
#[derive(Debug, Clone)]
pub struct GjkConfig {
    /// First support direction. Any non-zero vector is valid; the choice
    /// affects iteration count, never correctness.
    pub initial_direction: Vector3<f32>,
    /// Convergence limit on support iterations.
    pub max_iterations: u32,
}

impl Default for GjkConfig {
    fn default() -> Self {
        Self {
            initial_direction: Vector3::new(1.0, 1.0, 1.0),
            max_iterations: 32,
        }
    }
}

/// Result of one intersection query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The simplex enclosed the origin: the shapes overlap.
    Intersecting,
    /// A separating direction was found: the shapes do not overlap.
    Separated,
    /// The iteration bound ran out without a definitive answer. Treated as
    /// "no intersection" by callers, conservatively.
    NonConvergent,
}

/// Test two positioned shapes for intersection with the default
/// [`GjkConfig`].
pub fn intersect(
    shape_a: &Shape,
    pos_a: &Vector3<f32>,
    shape_b: &Shape,
    pos_b: &Vector3<f32>,
) -> Outcome {
    run(shape_a, pos_a, shape_b, pos_b, &GjkConfig::default())
}

/// Test two positioned shapes for intersection.
///
/// Fails with [`Error::InvalidParameter`] when the configured initial
/// direction is (near) zero length.
pub fn intersect_with(
    shape_a: &Shape,
    pos_a: &Vector3<f32>,
    shape_b: &Shape,
    pos_b: &Vector3<f32>,
    config: &GjkConfig,
) -> Result<Outcome, Error> {
    if config.initial_direction.norm_squared() <= DIRECTION_EPSILON {
        return Err(Error::InvalidParameter(
            "GJK initial direction must be non-zero",
        ));
    }
    Ok(run(shape_a, pos_a, shape_b, pos_b, config))
}

/// Support point of the Minkowski difference `A ⊖ B` in `direction`.
#[inline]
fn minkowski_support(
    shape_a: &Shape,
    pos_a: &Vector3<f32>,
    shape_b: &Shape,
    pos_b: &Vector3<f32>,
    direction: &Vector3<f32>,
) -> Vector3<f32> {
    (pos_a + shape_a.support(direction)) - (pos_b + shape_b.support(&-direction))
}

fn run(
    shape_a: &Shape,
    pos_a: &Vector3<f32>,
    shape_b: &Shape,
    pos_b: &Vector3<f32>,
    config: &GjkConfig,
) -> Outcome {
    let first = minkowski_support(shape_a, pos_a, shape_b, pos_b, &config.initial_direction);

    let mut simplex = Simplex::new();
    simplex.push(first);
    let mut direction = -first;

    for _ in 0..config.max_iterations {
        if direction.norm_squared() <= DIRECTION_EPSILON {
            // The origin sits on the current simplex: the boundaries touch.
            return Outcome::Intersecting;
        }

        let point = minkowski_support(shape_a, pos_a, shape_b, pos_b, &direction);
        if point.dot(&direction) < 0.0 {
            // The support point cannot pass the origin in this direction,
            // so the whole difference lies on one side of it.
            return Outcome::Separated;
        }

        simplex.push(point);
        if simplex.next(&mut direction) {
            return Outcome::Intersecting;
        }
    }

    Outcome::NonConvergent
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;

    fn sphere(x: f32, radius: f32) -> (Shape, Vector3<f32>) {
        (
            Shape::sphere(Vector3::zeros(), radius).unwrap(),
            Vector3::new(x, 0.0, 0.0),
        )
    }

    fn unit_cube() -> Shape {
        Shape::polyhedron(&[
            Vector3::new(-1.0, -1.0, -1.0),
            Vector3::new(1.0, -1.0, -1.0),
            Vector3::new(-1.0, 1.0, -1.0),
            Vector3::new(1.0, 1.0, -1.0),
            Vector3::new(-1.0, -1.0, 1.0),
            Vector3::new(1.0, -1.0, 1.0),
            Vector3::new(-1.0, 1.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
        ])
        .unwrap()
    }

    fn intersecting(a: &(Shape, Vector3<f32>), b: &(Shape, Vector3<f32>)) -> bool {
        matches!(intersect(&a.0, &a.1, &b.0, &b.1), Outcome::Intersecting)
    }

    #[test]
    fn test_sphere_pairs_match_closed_form() {
        // Away from the exact-touch boundary, GJK must agree with the
        // analytic sphere test d < r1 + r2.
        for &distance in &[0.25, 0.5, 1.0, 1.5, 1.9, 2.1, 2.5, 3.0, 10.0] {
            let a = sphere(0.0, 1.0);
            let b = sphere(distance, 1.0);
            let expected = distance < 2.0;
            assert_eq!(
                intersecting(&a, &b),
                expected,
                "sphere pair at distance {}",
                distance
            );
        }
    }

    #[test]
    fn test_unequal_radii() {
        let a = sphere(0.0, 0.5);
        let b = sphere(2.0, 1.0);
        assert!(!intersecting(&a, &b));
        let c = sphere(1.2, 1.0);
        assert!(intersecting(&a, &c));
    }

    #[test]
    fn test_offset_along_diagonal() {
        let a = (Shape::sphere(Vector3::zeros(), 1.0).unwrap(), Vector3::zeros());
        let b = (
            Shape::sphere(Vector3::zeros(), 1.0).unwrap(),
            Vector3::new(1.0, 1.0, 1.0),
        );
        // Center distance sqrt(3) ≈ 1.73 < 2.
        assert!(intersecting(&a, &b));
    }

    #[test]
    fn test_cube_pair_overlapping() {
        let a = (unit_cube(), Vector3::zeros());
        let b = (unit_cube(), Vector3::new(1.5, 0.0, 0.0));
        assert!(intersecting(&a, &b));
    }

    #[test]
    fn test_cube_pair_separated() {
        let a = (unit_cube(), Vector3::zeros());
        let b = (unit_cube(), Vector3::new(3.0, 0.0, 0.0));
        assert!(!intersecting(&a, &b));
    }

    #[test]
    fn test_cube_corner_overlap() {
        let a = (unit_cube(), Vector3::zeros());
        let b = (unit_cube(), Vector3::new(1.5, 1.5, 1.5));
        assert!(intersecting(&a, &b));
    }

    #[test]
    fn test_cube_diagonal_separated() {
        let a = (unit_cube(), Vector3::zeros());
        let b = (unit_cube(), Vector3::new(2.5, 2.5, 2.5));
        assert!(!intersecting(&a, &b));
    }

    #[test]
    fn test_cube_against_sphere() {
        let cube = (unit_cube(), Vector3::zeros());
        let near = (
            Shape::sphere(Vector3::zeros(), 1.0).unwrap(),
            Vector3::new(1.5, 0.0, 0.0),
        );
        let far = (
            Shape::sphere(Vector3::zeros(), 1.0).unwrap(),
            Vector3::new(4.0, 0.0, 0.0),
        );
        assert!(intersecting(&cube, &near));
        assert!(!intersecting(&cube, &far));
    }

    #[test]
    fn test_aabb_pair() {
        let a = (
            Shape::aabb(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0)).unwrap(),
            Vector3::zeros(),
        );
        let b = (
            Shape::aabb(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0)).unwrap(),
            Vector3::new(0.0, 1.5, 0.0),
        );
        let c = (
            Shape::aabb(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0)).unwrap(),
            Vector3::new(0.0, 4.0, 0.0),
        );
        assert!(intersecting(&a, &b));
        assert!(!intersecting(&a, &c));
    }

    #[test]
    fn test_concentric_shapes_terminate() {
        // Fully contained / concentric configurations must not loop.
        let big = (Shape::sphere(Vector3::zeros(), 2.0).unwrap(), Vector3::zeros());
        let small = (Shape::sphere(Vector3::zeros(), 0.5).unwrap(), Vector3::zeros());
        assert!(intersecting(&big, &small));
    }

    #[test]
    fn test_degenerate_point_shape() {
        // A single-vertex polyhedron is a point; zero volume is permitted.
        let point = (
            Shape::polyhedron(&[Vector3::zeros()]).unwrap(),
            Vector3::zeros(),
        );
        let around = (Shape::sphere(Vector3::zeros(), 1.0).unwrap(), Vector3::zeros());
        let away = (
            Shape::sphere(Vector3::zeros(), 1.0).unwrap(),
            Vector3::new(5.0, 0.0, 0.0),
        );
        assert!(intersecting(&point, &around));
        assert!(!intersecting(&point, &away));
    }

    #[test]
    fn test_zero_initial_direction_rejected() {
        let a = sphere(0.0, 1.0);
        let b = sphere(1.0, 1.0);
        let config = GjkConfig {
            initial_direction: Vector3::zeros(),
            max_iterations: 32,
        };
        assert_eq!(
            intersect_with(&a.0, &a.1, &b.0, &b.1, &config),
            Err(Error::InvalidParameter("GJK initial direction must be non-zero"))
        );
    }

    #[test]
    fn test_custom_initial_direction_same_answer() {
        let a = sphere(0.0, 1.0);
        let b = sphere(1.5, 1.0);
        for direction in [
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(-1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.2, -0.9),
        ] {
            let config = GjkConfig {
                initial_direction: direction,
                max_iterations: 32,
            };
            let outcome = intersect_with(&a.0, &a.1, &b.0, &b.1, &config).unwrap();
            assert_eq!(outcome, Outcome::Intersecting);
        }
    }

    #[test]
    fn test_iteration_bound_reported_as_non_convergent() {
        // One iteration is not enough to build an enclosing tetrahedron for
        // overlapping spheres.
        let a = sphere(0.0, 1.0);
        let b = sphere(0.5, 1.0);
        let config = GjkConfig {
            max_iterations: 1,
            ..GjkConfig::default()
        };
        let outcome = intersect_with(&a.0, &a.1, &b.0, &b.1, &config).unwrap();
        assert_eq!(outcome, Outcome::NonConvergent);
    }
}
