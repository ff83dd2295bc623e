/// Frustum - six clipping planes for visibility culling.
///
/// Each plane is a Vec4 (A, B, C, D):
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance
/// - A point P is inside if dot(plane, P_homogeneous) >= 0 for all planes
///
/// Planes are extracted for glam's projection convention (clip depth in
/// `[0, 1]`), so the same code serves the camera's perspective frustum and
/// the orthographic frusta of the shadow cascades.

use glam::{Mat4, Vec3, Vec4};
use crate::scene::AABB;

/// Result of a 3-way frustum/AABB classification.
///
/// - `Outside` → skip the entire subtree
/// - `Inside` → collect all objects without further testing
/// - `Partial` → test individual objects and recurse into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix (Gribb & Hartmann).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [
            row3 + row0, // left
            row3 - row0, // right
            row3 + row1, // bottom
            row3 - row1, // top
            row2,        // near: z_clip >= 0
            row3 - row2, // far:  z_clip <= w
        ];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance of a point to a plane (positive = inside).
    fn distance(plane: &Vec4, point: Vec3) -> f32 {
        plane.truncate().dot(point) + plane.w
    }

    /// Corner of `aabb` furthest along the plane normal.
    fn positive_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
        Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min)
    }

    /// Corner of `aabb` furthest against the plane normal.
    fn negative_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
        Vec3::select(normal.cmpge(Vec3::ZERO), aabb.min, aabb.max)
    }

    /// `true` if the point lies inside all six planes.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| Self::distance(plane, point) >= 0.0)
    }

    /// Conservative AABB test.
    ///
    /// Returns `false` only when the box is fully behind at least one plane.
    /// May return false positives near frustum corners, never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.planes.iter().all(|plane| {
            let p_vertex = Self::positive_vertex(plane.truncate(), aabb);
            Self::distance(plane, p_vertex) >= 0.0
        })
    }

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// - p-vertex outside any plane → `Outside` (early out)
    /// - n-vertex outside any plane → at least `Partial`
    /// - otherwise → `Inside`
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = plane.truncate();

            if Self::distance(plane, Self::positive_vertex(normal, aabb)) < 0.0 {
                return FrustumTest::Outside;
            }

            if Self::distance(plane, Self::negative_vertex(normal, aabb)) < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
