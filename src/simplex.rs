//! The evolving GJK simplex.
//!
//! A simplex holds up to four support points from Minkowski-difference
//! space, newest first. [`Simplex::next`] classifies which Voronoi region of
//! the current simplex contains the origin, drops the vertices that are not
//! part of that region's closest feature, and produces the next search
//! direction. Only a tetrahedron whose four face half-spaces all contain the
//! origin terminates with "enclosed".
//!
//! Simplices are ephemeral: one lives for a single narrow-phase query and is
//! never persisted across queries or frames.

use nalgebra::Vector3;

/// Up to four support points, newest at index 0.
#[derive(Debug, Clone)]
pub struct Simplex {
    points: [Vector3<f32>; 4],
    len: usize,
}

impl Default for Simplex {
    fn default() -> Self {
        Self::new()
    }
}

impl Simplex {
    pub fn new() -> Self {
        Self {
            points: [Vector3::zeros(); 4],
            len: 0,
        }
    }

    /// Insert a new support point at the front.
    pub fn push(&mut self, point: Vector3<f32>) {
        debug_assert!(self.len < 4, "simplex already holds four points");
        let mut i = self.len.min(3);
        while i > 0 {
            self.points[i] = self.points[i - 1];
            i -= 1;
        }
        self.points[0] = point;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The retained points, newest first.
    pub fn points(&self) -> &[Vector3<f32>] {
        &self.points[..self.len]
    }

    fn assign(&mut self, points: &[Vector3<f32>]) {
        for (slot, point) in self.points.iter_mut().zip(points) {
            *slot = *point;
        }
        self.len = points.len();
    }

    /// One reduction step: classify the origin's Voronoi region, keep the
    /// closest feature and write the next search direction into `direction`.
    ///
    /// Returns `true` when the simplex is a tetrahedron enclosing the
    /// origin, which for a Minkowski difference means the shapes intersect.
    pub fn next(&mut self, direction: &mut Vector3<f32>) -> bool {
        match self.len {
            2 => self.line(direction),
            3 => self.triangle(direction),
            4 => self.tetrahedron(direction),
            _ => {
                *direction = -self.points[0];
                false
            }
        }
    }

    fn line(&mut self, direction: &mut Vector3<f32>) -> bool {
        let a = self.points[0];
        let b = self.points[1];

        let ab = b - a;
        let ao = -a;

        if ab.dot(&ao) > 0.0 {
            // Origin projects onto the segment interior; search perpendicular
            // to the segment, toward the origin.
            *direction = ab.cross(&ao).cross(&ab);
        } else {
            self.assign(&[a]);
            *direction = ao;
        }
        false
    }

    fn triangle(&mut self, direction: &mut Vector3<f32>) -> bool {
        let a = self.points[0];
        let b = self.points[1];
        let c = self.points[2];

        let ab = b - a;
        let ac = c - a;
        let ao = -a;
        let abc = ab.cross(&ac);

        if abc.cross(&ac).dot(&ao) > 0.0 {
            if ac.dot(&ao) > 0.0 {
                // Edge AC region.
                self.assign(&[a, c]);
                *direction = ac.cross(&ao).cross(&ac);
            } else {
                // Vertex A / edge AB region; re-run the line case.
                self.assign(&[a, b]);
                return self.line(direction);
            }
        } else if ab.cross(&abc).dot(&ao) > 0.0 {
            // Edge AB region.
            self.assign(&[a, b]);
            return self.line(direction);
        } else if abc.dot(&ao) > 0.0 {
            // Origin above the triangle plane; keep winding.
            *direction = abc;
        } else {
            // Origin below; flip winding so the next point lands on the
            // origin side.
            self.assign(&[a, c, b]);
            *direction = -abc;
        }
        false
    }

    fn tetrahedron(&mut self, direction: &mut Vector3<f32>) -> bool {
        let a = self.points[0];
        let b = self.points[1];
        let c = self.points[2];
        let d = self.points[3];

        let ab = b - a;
        let ac = c - a;
        let ad = d - a;
        let ao = -a;

        // Only the three faces sharing the newest vertex A need testing:
        // the origin is known to lie on A's side of face BCD from the
        // iteration that added A.
        let abc = ab.cross(&ac);
        let acd = ac.cross(&ad);
        let adb = ad.cross(&ab);

        if abc.dot(&ao) > 0.0 {
            self.assign(&[a, b, c]);
            return self.triangle(direction);
        }
        if acd.dot(&ao) > 0.0 {
            self.assign(&[a, c, d]);
            return self.triangle(direction);
        }
        if adb.dot(&ao) > 0.0 {
            self.assign(&[a, d, b]);
            return self.triangle(direction);
        }

        // The origin is inside all four half-spaces: enclosed.
        true
    }
}
