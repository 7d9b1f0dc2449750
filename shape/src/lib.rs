mod mesh;
mod sphere;

pub use mesh::{Triangle, TriangleMesh};
pub use sphere::Sphere;

use geometry::bxdf::Bxdf;
use math::hcm::Vec3;

/// Everything an intersection routine reports about the closest hit found so far.
///
/// The contract shared by all intersection routines: a routine that returns `true` has found a
/// hit strictly closer than the incoming `t` and has filled every field; a routine that returns
/// `false` has left the record untouched. Repeated calls therefore never replace a hit with a
/// farther one.
#[derive(Clone, Copy)]
pub struct RayHit<'a> {
    pub t: f32,
    /// Geometric normal of the hit surface.
    pub normal: Vec3,
    /// Interpolated vertex normal for meshes; equals `normal` for analytic shapes.
    pub shading_normal: Vec3,
    /// Wald-convention barycentrics for triangles (`u` weighs vertex 2, `v` vertex 1);
    /// zero for other shapes.
    pub uv: (f32, f32),
    pub bsdf: Option<&'a Bxdf>,
    /// Index of the area light bound to the hit surface, if it is emissive.
    pub area_light: Option<usize>,
}

impl RayHit<'_> {
    /// A fresh record accepting any hit closer than `t_max`.
    pub fn none_before(t_max: f32) -> Self {
        RayHit {
            t: t_max,
            normal: Vec3::Z,
            shading_normal: Vec3::Z,
            uv: (0.0, 0.0),
            bsdf: None,
            area_light: None,
        }
    }

    pub fn is_hit(&self, t_max: f32) -> bool {
        self.t < t_max
    }
}
