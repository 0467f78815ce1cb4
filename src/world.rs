//! Simulation world: body storage, stepping, and collision resolution.
//!
//! A [`World`] owns a shape registry and a fixed-capacity set of bodies and
//! advances them with `step(dt)`: semi-implicit Euler integration, a
//! ground-plane and ceiling constraint, then a fixed number of relaxation
//! passes over all unique body pairs. Sphere and box pairs use closed-form
//! tests; pairs involving a polyhedron fall back to the GJK query.
//!
//! Stepping is single-threaded and synchronous. Renderers read body state
//! between steps through [`World::bodies`] and [`World::shape`].

use nalgebra::Vector3;

// ComplexField provides sqrt() for f32 in no_std via libm
#[allow(unused_imports)]
use nalgebra::ComplexField;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::body::Body;
use crate::counters::StepCounters;
use crate::gjk::{self, GjkConfig, Outcome};
use crate::shape::{Shape, ShapeId, ShapeRegistry};
use crate::Error;

/// Unique identifier for a body within a [`World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId(usize);

/// Number of bodies placed by [`World::seeded`].
pub const SEEDED_BODY_COUNT: usize = 100;

/// Lateral-basis reference vector for velocity resolution. Any vector works
/// as long as it is not parallel to a contact normal; a skewed constant
/// avoids the common axis-aligned normals.
const LATERAL_REFERENCE: Vector3<f32> = Vector3::new(0.57, 0.51, 0.13);

/// Outcome of one pair narrow-phase test.
enum PairTest {
    Separated,
    Contact {
        /// Unit normal from body A toward body B.
        normal: Vector3<f32>,
        penetration: f32,
    },
    NonConvergent,
}

/// Owns all bodies and shapes and steps the simulation forward.
///
/// # Type Parameters
/// * `N` - Maximum number of bodies (compile-time capacity).
/// * `S` - Maximum number of shapes in the registry.
///
/// # Example
/// ```
/// use fiz3d::{Body, Shape, World};
/// use nalgebra::Vector3;
///
/// let mut world = World::<8>::new();
/// let geometry = world
///     .add_shape(Shape::sphere(Vector3::zeros(), 1.0).unwrap())
///     .unwrap();
/// let id = world
///     .add_body(Body::new(Vector3::new(0.0, 5.0, 0.0)))
///     .unwrap();
/// world.attach_shape(id, geometry).unwrap();
///
/// world.step(1.0 / 60.0);
/// ```
pub struct World<const N: usize, const S: usize = 128> {
    shapes: ShapeRegistry<S>,
    bodies: heapless::Vec<Body, N>,
    gravity: Vector3<f32>,
    /// Relaxation passes over all pairs per step.
    pub solver_passes: u32,
    /// Damping applied to vertical velocity on ground contact.
    pub ground_restitution: f32,
    /// Upper bound on body height; positions are clamped here.
    pub ceiling: f32,
    /// Narrow-phase tuning for polyhedron pairs.
    pub gjk: GjkConfig,
    counters: StepCounters,
}

impl<const N: usize, const S: usize> Default for World<N, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const S: usize> World<N, S> {
    /// Create an empty world with downward gravity of 9.8 m/s².
    pub fn new() -> Self {
        Self {
            shapes: ShapeRegistry::new(),
            bodies: heapless::Vec::new(),
            gravity: Vector3::new(0.0, -9.8, 0.0),
            solver_passes: 8,
            ground_restitution: 0.9,
            ceiling: 30.0,
            gjk: GjkConfig::default(),
            counters: StepCounters::new(),
        }
    }

    /// Build a reproducible 100-body scene as a pure function of `rng_seed`.
    ///
    /// Each body gets a sphere (radius in `[0.5, 1.0)`) or a box
    /// (half-extents in `[0.5, 1.0)` per axis) with equal probability, placed
    /// with `x, z` in `[-5, 5)` and `y` in `[1, 6)`. Two calls with the same
    /// seed produce identical worlds.
    ///
    /// Fails with [`Error::CapacityExceeded`] when `N` or `S` is below
    /// [`SEEDED_BODY_COUNT`].
    pub fn seeded(rng_seed: u64) -> Result<Self, Error> {
        let mut rng = SmallRng::seed_from_u64(rng_seed);
        let mut world = Self::new();

        for _ in 0..SEEDED_BODY_COUNT {
            let shape = if rng.gen::<f32>() < 0.5 {
                let radius = rng.gen::<f32>() * 0.5 + 0.5;
                Shape::sphere(Vector3::zeros(), radius)?
            } else {
                let hx = rng.gen::<f32>() * 0.5 + 0.5;
                let hy = rng.gen::<f32>() * 0.5 + 0.5;
                let hz = rng.gen::<f32>() * 0.5 + 0.5;
                Shape::aabb(Vector3::new(-hx, -hy, -hz), Vector3::new(hx, hy, hz))?
            };
            let x = rng.gen::<f32>() * 10.0 - 5.0;
            let y = rng.gen::<f32>() * 5.0 + 1.0;
            let z = rng.gen::<f32>() * 10.0 - 5.0;

            let shape = world.add_shape(shape)?;
            let body = world.add_body(Body::new(Vector3::new(x, y, z)))?;
            world.attach_shape(body, shape)?;
        }
        Ok(world)
    }

    /// Set the gravity vector.
    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.gravity = gravity;
    }

    /// Returns the current gravity vector.
    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    /// Insert a shape into the registry, returning its handle.
    pub fn add_shape(&mut self, shape: Shape) -> Result<ShapeId, Error> {
        self.shapes.insert(shape)
    }

    /// Add a body. Fails with [`Error::CapacityExceeded`] at capacity.
    pub fn add_body(&mut self, body: Body) -> Result<BodyId, Error> {
        let id = BodyId(self.bodies.len());
        self.bodies.push(body).map_err(|_| Error::CapacityExceeded)?;
        Ok(id)
    }

    /// Attach a registered shape to a body, recomputing the body's mass.
    pub fn attach_shape(&mut self, body: BodyId, shape: ShapeId) -> Result<(), Error> {
        let body = self
            .bodies
            .get_mut(body.0)
            .ok_or(Error::InvalidParameter("unknown body handle"))?;
        body.attach_shape(shape, &self.shapes)
    }

    /// Get an immutable reference to a body by its ID.
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    /// Get a mutable reference to a body by its ID.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0)
    }

    /// Look up a shape by its handle.
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id)
    }

    /// Iterate over all bodies read-only, with their IDs.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    /// Returns the number of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Narrow-phase statistics from the most recent [`step`](World::step).
    pub fn counters(&self) -> &StepCounters {
        &self.counters
    }

    /// Penetration-scaled contact normal from body `a` toward body `b`, or
    /// `None` when the bodies' primary shapes do not overlap.
    ///
    /// The magnitude equals the penetration depth for sphere and box pairs;
    /// polyhedron pairs carry no depth measure and report a zero vector when
    /// intersecting.
    pub fn intersection_normal(&self, a: BodyId, b: BodyId) -> Option<Vector3<f32>> {
        let body_a = self.bodies.get(a.0)?;
        let body_b = self.bodies.get(b.0)?;
        let shape_a = self.shapes.get(body_a.primary_shape()?)?;
        let shape_b = self.shapes.get(body_b.primary_shape()?)?;

        match pair_test(
            shape_a,
            &body_a.position,
            shape_b,
            &body_b.position,
            &self.gjk,
        ) {
            PairTest::Contact {
                normal,
                penetration,
            } => Some(normal * penetration),
            _ => None,
        }
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Integrates every body, applies the ground and ceiling constraints to
    /// the deepest point across all attached shapes, then runs
    /// `solver_passes` relaxation passes over all unique body pairs,
    /// separating and exchanging momentum at each contact. Bodies without
    /// shapes integrate but never collide.
    pub fn step(&mut self, dt: f32) {
        debug_assert!(
            dt >= 0.0 && dt.is_finite(),
            "dt must be non-negative and finite"
        );
        self.counters.reset();

        let down = Vector3::new(0.0, -1.0, 0.0);
        for body in self.bodies.iter_mut() {
            body.velocity += self.gravity * dt;
            body.position += body.velocity * dt;

            // Deepest point of any attached shape along (0, -1, 0).
            let mut lowest = f32::INFINITY;
            for id in body.shape_ids() {
                if let Some(shape) = self.shapes.get(*id) {
                    let point = body.position + shape.support(&down);
                    if point.y < lowest {
                        lowest = point.y;
                    }
                }
            }
            if lowest < 0.0 {
                body.position.y -= lowest;
                body.velocity.y *= -self.ground_restitution;
            }
            if body.position.y > self.ceiling {
                body.position.y = self.ceiling;
                body.velocity.y = 0.0;
            }
        }

        for _ in 0..self.solver_passes {
            for i in 1..self.bodies.len() {
                for j in 0..i {
                    self.counters.pairs_tested += 1;

                    let test = {
                        let body_a = &self.bodies[i];
                        let body_b = &self.bodies[j];
                        let shape_a = body_a.primary_shape().and_then(|id| self.shapes.get(id));
                        let shape_b = body_b.primary_shape().and_then(|id| self.shapes.get(id));
                        match (shape_a, shape_b) {
                            (Some(shape_a), Some(shape_b)) => {
                                if matches!(shape_a, Shape::Polyhedron { .. })
                                    || matches!(shape_b, Shape::Polyhedron { .. })
                                {
                                    self.counters.gjk_queries += 1;
                                }
                                pair_test(
                                    shape_a,
                                    &self.bodies[i].position,
                                    shape_b,
                                    &self.bodies[j].position,
                                    &self.gjk,
                                )
                            }
                            _ => PairTest::Separated,
                        }
                    };

                    match test {
                        PairTest::Contact {
                            normal,
                            penetration,
                        } => {
                            if self.resolve(i, j, &normal, penetration) {
                                self.counters.contacts_resolved += 1;
                            }
                        }
                        PairTest::NonConvergent => self.counters.gjk_non_convergent += 1,
                        PairTest::Separated => {}
                    }
                }
            }
        }
    }

    /// Separate two overlapping bodies and exchange momentum at the contact.
    ///
    /// Positional correction splits the penetration in proportion to mass,
    /// the heavier body moving less. Velocity resolution decomposes each
    /// velocity into the contact normal and two lateral axes, applies the
    /// 1-D elastic collision formulas along the normal scaled by the pair's
    /// combined restitution (minimum of the two), and damps the lateral
    /// components by the combined friction (geometric mean).
    ///
    /// Returns `true` when a correction was applied.
    fn resolve(&mut self, a: usize, b: usize, normal: &Vector3<f32>, penetration: f32) -> bool {
        let m1 = self.bodies[a].mass();
        let m2 = self.bodies[b].mass();
        let total = m1 + m2;
        if total <= 0.0 {
            // Two massless bodies carry no momentum to exchange.
            return false;
        }

        let correction = normal * penetration;
        self.bodies[a].position -= correction * (m2 / total);
        self.bodies[b].position += correction * (m1 / total);

        let v1 = self.bodies[a].velocity;
        let v2 = self.bodies[b].velocity;

        // Only exchange momentum while the bodies approach each other; this
        // keeps repeated passes from re-resolving a settled contact.
        if (v2 - v1).dot(normal) >= 0.0 {
            return true;
        }

        let mut lat1 = normal.cross(&LATERAL_REFERENCE);
        if lat1.norm_squared() < 1e-8 {
            // Normal happens to be parallel to the reference vector.
            lat1 = normal.cross(&Vector3::x());
        }
        let lat1 = lat1.normalize();
        let lat2 = normal.cross(&lat1).normalize();

        let restitution = self.bodies[a].restitution.min(self.bodies[b].restitution);
        let friction = (self.bodies[a].friction * self.bodies[b].friction).sqrt();
        let lateral_keep = 1.0 - friction;

        let u1 = normal.dot(&v1);
        let u2 = normal.dot(&v2);
        let v1n = ((m1 - m2) / total) * u1 + (2.0 * m2 / total) * u2;
        let v2n = (2.0 * m1 / total) * u1 + ((m2 - m1) / total) * u2;

        self.bodies[a].velocity = normal * (v1n * restitution)
            + lat1 * (lat1.dot(&v1) * lateral_keep)
            + lat2 * (lat2.dot(&v1) * lateral_keep);
        self.bodies[b].velocity = normal * (v2n * restitution)
            + lat1 * (lat1.dot(&v2) * lateral_keep)
            + lat2 * (lat2.dot(&v2) * lateral_keep);

        true
    }
}

/// Narrow-phase dispatch for one positioned shape pair.
///
/// Sphere and box combinations use closed forms; any pair involving a
/// polyhedron goes through GJK, which yields a boolean, so the contact
/// normal degrades to the center-to-center direction with zero depth.
fn pair_test(
    shape_a: &Shape,
    pos_a: &Vector3<f32>,
    shape_b: &Shape,
    pos_b: &Vector3<f32>,
    config: &GjkConfig,
) -> PairTest {
    match (shape_a, shape_b) {
        (
            Shape::Sphere {
                center: ca,
                radius: ra,
            },
            Shape::Sphere {
                center: cb,
                radius: rb,
            },
        ) => to_pair(contact_sphere_sphere(
            &(pos_a + ca),
            *ra,
            &(pos_b + cb),
            *rb,
        )),
        (
            Shape::Aabb {
                min: min_a,
                max: max_a,
            },
            Shape::Aabb {
                min: min_b,
                max: max_b,
            },
        ) => to_pair(contact_aabb_aabb(
            &(pos_a + (min_a + max_a) * 0.5),
            &((max_a - min_a) * 0.5),
            &(pos_b + (min_b + max_b) * 0.5),
            &((max_b - min_b) * 0.5),
        )),
        (Shape::Sphere { center, radius }, Shape::Aabb { min, max }) => to_pair(
            contact_sphere_aabb(&(pos_a + center), *radius, &(pos_b + min), &(pos_b + max)),
        ),
        (Shape::Aabb { min, max }, Shape::Sphere { center, radius }) => {
            // Flip: run sphere-box with swapped order, negate the normal.
            let result =
                contact_sphere_aabb(&(pos_b + center), *radius, &(pos_a + min), &(pos_a + max));
            to_pair(result.map(|(normal, penetration)| (-normal, penetration)))
        }
        _ => {
            let outcome = match gjk::intersect_with(shape_a, pos_a, shape_b, pos_b, config) {
                Ok(outcome) => outcome,
                // A zero initial direction is a configuration error; fall
                // back to the default so the step stays total.
                Err(_) => gjk::intersect(shape_a, pos_a, shape_b, pos_b),
            };
            match outcome {
                Outcome::Intersecting => {
                    let diff = pos_b - pos_a;
                    let normal = if diff.norm_squared() > 1e-12 {
                        diff.normalize()
                    } else {
                        Vector3::y()
                    };
                    PairTest::Contact {
                        normal,
                        penetration: 0.0,
                    }
                }
                Outcome::Separated => PairTest::Separated,
                Outcome::NonConvergent => PairTest::NonConvergent,
            }
        }
    }
}

fn to_pair(result: Option<(Vector3<f32>, f32)>) -> PairTest {
    match result {
        Some((normal, penetration)) => PairTest::Contact {
            normal,
            penetration,
        },
        None => PairTest::Separated,
    }
}

/// Sphere vs sphere intersection test.
///
/// Returns `(normal_a_to_b, penetration_depth)` or `None`. Agrees exactly
/// with the analytic overlap condition `distance < r_a + r_b`.
fn contact_sphere_sphere(
    center_a: &Vector3<f32>,
    radius_a: f32,
    center_b: &Vector3<f32>,
    radius_b: f32,
) -> Option<(Vector3<f32>, f32)> {
    let diff = center_b - center_a;
    let dist_sq = diff.norm_squared();
    let sum_r = radius_a + radius_b;

    if dist_sq >= sum_r * sum_r {
        return None;
    }

    let dist = dist_sq.sqrt();
    let penetration = sum_r - dist;

    let normal = if dist > 1e-6 {
        diff / dist
    } else {
        // Coincident centers; pick an arbitrary separation axis.
        Vector3::new(0.0, 1.0, 0.0)
    };

    Some((normal, penetration))
}

/// Box vs box intersection test using the separating axis theorem.
///
/// Returns `(normal_a_to_b, penetration_depth)` along the axis of least
/// overlap, or `None`.
fn contact_aabb_aabb(
    center_a: &Vector3<f32>,
    half_a: &Vector3<f32>,
    center_b: &Vector3<f32>,
    half_b: &Vector3<f32>,
) -> Option<(Vector3<f32>, f32)> {
    let diff = center_b - center_a;

    let overlap_x = half_a.x + half_b.x - diff.x.abs();
    if overlap_x <= 0.0 {
        return None;
    }
    let overlap_y = half_a.y + half_b.y - diff.y.abs();
    if overlap_y <= 0.0 {
        return None;
    }
    let overlap_z = half_a.z + half_b.z - diff.z.abs();
    if overlap_z <= 0.0 {
        return None;
    }

    if overlap_x <= overlap_y && overlap_x <= overlap_z {
        let sign = if diff.x >= 0.0 { 1.0 } else { -1.0 };
        Some((Vector3::new(sign, 0.0, 0.0), overlap_x))
    } else if overlap_y <= overlap_z {
        let sign = if diff.y >= 0.0 { 1.0 } else { -1.0 };
        Some((Vector3::new(0.0, sign, 0.0), overlap_y))
    } else {
        let sign = if diff.z >= 0.0 { 1.0 } else { -1.0 };
        Some((Vector3::new(0.0, 0.0, sign), overlap_z))
    }
}

/// Sphere vs box intersection test via the closest point on the box.
///
/// Returns `(normal_sphere_to_box, penetration_depth)` or `None`.
fn contact_sphere_aabb(
    center: &Vector3<f32>,
    radius: f32,
    min: &Vector3<f32>,
    max: &Vector3<f32>,
) -> Option<(Vector3<f32>, f32)> {
    let closest = Vector3::new(
        center.x.clamp(min.x, max.x),
        center.y.clamp(min.y, max.y),
        center.z.clamp(min.z, max.z),
    );

    let diff = center - closest;
    let dist_sq = diff.norm_squared();

    if dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    if dist > 1e-6 {
        // Center outside the box; the closest point lies on a face.
        Some((-diff / dist, radius - dist))
    } else {
        // Center inside the box; exit through the face of least depth.
        let faces = [
            (max.x - center.x, Vector3::new(1.0, 0.0, 0.0)),
            (center.x - min.x, Vector3::new(-1.0, 0.0, 0.0)),
            (max.y - center.y, Vector3::new(0.0, 1.0, 0.0)),
            (center.y - min.y, Vector3::new(0.0, -1.0, 0.0)),
            (max.z - center.z, Vector3::new(0.0, 0.0, 1.0)),
            (center.z - min.z, Vector3::new(0.0, 0.0, -1.0)),
        ];
        let mut depth = faces[0].0;
        let mut normal = faces[0].1;
        for (face_depth, face_normal) in faces.iter().skip(1) {
            if *face_depth < depth {
                depth = *face_depth;
                normal = *face_normal;
            }
        }
        Some((normal, radius + depth))
    }
}
