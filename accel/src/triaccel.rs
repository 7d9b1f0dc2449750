use geometry::ray::Ray;
use math::hcm::Point3;

/// Intersections closer than this along the ray are rejected as self-hits.
pub const T_EPSILON: f32 = 1e-4;

/// Lookup for the two axes accompanying the projection axis: `MODULO[k]` and `MODULO[k + 1]`
/// are `(k + 1) % 3` and `(k + 2) % 3` without the division.
const MODULO: [usize; 4] = [1, 2, 0, 1];

/// A triangle preprocessed for fast ray intersection by projecting it onto the coordinate plane
/// most perpendicular to its normal, turning the intersection into a 2-D point-in-triangle
/// test: plane coefficients `(n_u, n_v, n_d)` with the projection axis `k`, and two edge
/// equations `(b_u, b_v, b_d)` and `(c_u, c_v, c_d)`. `tri_idx` / `mesh_idx` point back into
/// the scene's mesh list.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy)]
pub struct TriAccel {
    pub n_u: f32,
    pub n_v: f32,
    pub n_d: f32,
    pub k: i32,

    pub b_u: f32,
    pub b_v: f32,
    pub b_d: f32,
    pub tri_idx: i32,

    pub c_u: f32,
    pub c_v: f32,
    pub c_d: f32,
    pub mesh_idx: i32,
}

/// The minimal record a projected-triangle intersection fills: hit distance and the
/// edge-equation barycentrics (`u` weighs vertex 2, `v` vertex 1).
#[derive(Debug, Clone, Copy)]
pub struct TriHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

impl TriHit {
    pub fn none_before(t_max: f32) -> Self {
        TriHit {
            t: t_max,
            u: 0.0,
            v: 0.0,
        }
    }
}

impl TriAccel {
    /// Projects one triangle. Returns `None` for degenerate triangles (zero-area, or a normal
    /// with no usable dominant axis); those are skipped silently and never indexed.
    pub fn project(
        a: Point3,
        b: Point3,
        c: Point3,
        tri_idx: i32,
        mesh_idx: i32,
    ) -> Option<TriAccel> {
        let ab = b - a;
        let ac = c - a;
        let normal = ab.cross(ac);

        // Choose the axis in which the normal has the largest absolute value; project on the
        // plane perpendicular to it. Defaults to the XZ plane, with ties resolved by the
        // nested comparisons below.
        let mut k = 1usize;
        if normal.x.abs() > normal.y.abs() {
            if normal.x.abs() > normal.z.abs() {
                k = 0;
            } else {
                k = 2;
            }
        } else if normal.z.abs() > normal.y.abs() {
            k = 2;
        }

        if normal[k] == 0.0 {
            return None;
        }
        let u = (k + 1) % 3;
        let v = (k + 2) % 3;

        let norm_proj = normal / normal[k];

        let det = ab[u] * ac[v] - ab[v] * ac[u];
        if det == 0.0 {
            return None;
        }

        let a_vec = math::hcm::Vec3::from(a);
        Some(TriAccel {
            n_u: norm_proj[u],
            n_v: norm_proj[v],
            n_d: a_vec.dot(norm_proj),
            k: k as i32,

            b_u: -ab[v] / det,
            b_v: ab[u] / det,
            b_d: (ab[v] * a[u] - ab[u] * a[v]) / det,
            tri_idx,

            c_u: ac[v] / det,
            c_v: -ac[u] / det,
            c_d: -(ac[v] * a[u] - ac[u] * a[v]) / det,
            mesh_idx,
        })
    }

    /// The 2-D intersection test. Updates `hit` and returns `true` only for a `t` strictly
    /// between `T_EPSILON` and the current `hit.t`, so repeated calls keep the closest hit.
    #[inline]
    pub fn intersect(&self, ray: &Ray, hit: &mut TriHit) -> bool {
        let k = self.k as usize;
        let ku = MODULO[k];
        let kv = MODULO[k + 1];

        let nd = 1.0
            / (ray.dir[k] + self.n_u * ray.dir[ku] + self.n_v * ray.dir[kv]);
        let t = (self.n_d
            - ray.origin[k]
            - self.n_u * ray.origin[ku]
            - self.n_v * ray.origin[kv])
            * nd;

        if !(hit.t > t && t > T_EPSILON) {
            return false;
        }

        let hu = ray.origin[ku] + t * ray.dir[ku];
        let hv = ray.origin[kv] + t * ray.dir[kv];

        let lambda = hu * self.b_u + hv * self.b_v + self.b_d;
        if lambda < 0.0 {
            return false;
        }

        let mue = hu * self.c_u + hv * self.c_v + self.c_d;
        if mue < 0.0 {
            return false;
        }

        if lambda + mue > 1.0 {
            return false;
        }

        hit.t = t;
        hit.u = lambda;
        hit.v = mue;
        debug_assert!(hit.u >= 0.0 && hit.v >= 0.0 && hit.u + hit.v <= 1.0);
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, vec3};

    #[test]
    fn record_is_two_rows_of_16_bytes_plus_plane() {
        assert_eq!(std::mem::size_of::<TriAccel>(), 48);
        assert_eq!(std::mem::align_of::<TriAccel>(), 16);
    }

    #[test]
    fn projects_axis_aligned_triangle_on_xy() {
        // Normal is +z, so the projection axis must be z.
        let accel = TriAccel::project(
            point3(0.0, 0.0, 0.0),
            point3(1.0, 0.0, 0.0),
            point3(0.0, 1.0, 0.0),
            0,
            0,
        )
        .unwrap();
        assert_eq!(accel.k, 2);

        let ray = Ray::new(point3(0.25, 0.25, 1.0), vec3(0.0, 0.0, -1.0));
        let mut hit = TriHit::none_before(f32::INFINITY);
        assert!(accel.intersect(&ray, &mut hit));
        assert!((hit.t - 1.0).abs() < 1e-6);
        assert!((hit.u - 0.25).abs() < 1e-6);
        assert!((hit.v - 0.25).abs() < 1e-6);
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        // Collinear vertices have a zero-area triangle.
        let accel = TriAccel::project(
            point3(0.0, 0.0, 0.0),
            point3(1.0, 1.0, 1.0),
            point3(2.0, 2.0, 2.0),
            0,
            0,
        );
        assert!(accel.is_none());
    }

    #[test]
    fn closer_hits_are_kept() {
        let accel = TriAccel::project(
            point3(-1.0, -1.0, 0.0),
            point3(3.0, -1.0, 0.0),
            point3(-1.0, 3.0, 0.0),
            0,
            0,
        )
        .unwrap();
        let ray = Ray::new(point3(0.0, 0.0, 2.0), vec3(0.0, 0.0, -1.0));
        let mut hit = TriHit::none_before(f32::INFINITY);
        assert!(accel.intersect(&ray, &mut hit));
        assert!((hit.t - 2.0).abs() < 1e-6);
        // A second attempt can't replace the result with a farther hit.
        assert!(!accel.intersect(&ray, &mut hit));
    }
}
