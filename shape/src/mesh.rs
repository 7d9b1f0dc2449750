use std::sync::Arc;

use geometry::bxdf::Bxdf;
use geometry::ray::Ray;
use math::hcm::{Point3, Vec3};

use crate::RayHit;

const HIT_EPSILON: f32 = 1e-4;

/// Three indices into the owning mesh's vertex array, wound counter-clockwise.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub i0: u32,
    pub i1: u32,
    pub i2: u32,
}

impl Triangle {
    pub fn new(i0: u32, i1: u32, i2: u32) -> Self {
        Triangle { i0, i1, i2 }
    }
}

/// An indexed triangle mesh sharing one scattering model across all its triangles.
///
/// Vertex normals are smoothed at construction by averaging the unit face normals of each
/// vertex's incident triangles; `shading_normal` interpolates them with the hit barycentrics.
pub struct TriangleMesh {
    vertices: Vec<Point3>,
    normals: Vec<Vec3>,
    triangles: Vec<Triangle>,
    bsdf: Arc<Bxdf>,
    /// Index of the area light bound to this mesh, if the mesh is emissive. Propagated into
    /// triangle hits so emissive meshes contribute direct radiance.
    pub area_light: Option<usize>,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Point3>, triangles: Vec<Triangle>, bsdf: Arc<Bxdf>) -> Self {
        let mut normal_sums = vec![Vec3::ZERO; vertices.len()];
        let mut incident_counts = vec![0u32; vertices.len()];
        for tri in &triangles {
            let face_normal = face_normal_of(&vertices, tri);
            for idx in [tri.i0, tri.i1, tri.i2] {
                normal_sums[idx as usize] += face_normal;
                incident_counts[idx as usize] += 1;
            }
        }
        let normals = normal_sums
            .into_iter()
            .zip(incident_counts)
            .map(|(sum, count)| {
                if count == 0 {
                    Vec3::Z
                } else {
                    (sum / count as f32).try_hat().unwrap_or(Vec3::Z)
                }
            })
            .collect();

        TriangleMesh {
            vertices,
            normals,
            triangles,
            bsdf,
            area_light: None,
        }
    }

    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
    pub fn bsdf(&self) -> &Bxdf {
        &self.bsdf
    }

    /// Unit geometric normal of triangle `i`.
    pub fn face_normal(&self, i: usize) -> Vec3 {
        face_normal_of(&self.vertices, &self.triangles[i])
    }

    /// Interpolated vertex normal at barycentrics `(u, v)` of triangle `i`. The convention
    /// follows the projected-triangle intersector: `u` weighs vertex 2 and `v` vertex 1.
    pub fn shading_normal(&self, i: usize, u: f32, v: f32) -> Vec3 {
        let tri = &self.triangles[i];
        let n0 = self.normals[tri.i0 as usize];
        let n1 = self.normals[tri.i1 as usize];
        let n2 = self.normals[tri.i2 as usize];
        let lerped = math::float::barycentric_lerp((n0, n1, n2), (1.0 - u - v, v, u));
        lerped.try_hat().unwrap_or_else(|| self.face_normal(i))
    }

    /// Möller–Trumbore intersection of one triangle; the reference path the projected
    /// representation is validated against. Returns `(t, u_weight_of_v1, v_weight_of_v2)`.
    pub fn intersect_triangle(&self, i: usize, ray: &Ray) -> Option<(f32, f32, f32)> {
        let tri = &self.triangles[i];
        let v0 = self.vertices[tri.i0 as usize];
        let v1 = self.vertices[tri.i1 as usize];
        let v2 = self.vertices[tri.i2 as usize];

        let e1 = v1 - v0;
        let e2 = v2 - v0;

        let pvec = ray.dir.cross(e2);
        let det = e1.dot(pvec);
        if det.abs() < 1e-8 {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = ray.origin - v0;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(e1);
        let v = ray.dir.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(qvec) * inv_det;
        (t > HIT_EPSILON).then_some((t, u, v))
    }

    /// Closest hit over all triangles by exhaustive Möller–Trumbore. Production intersection
    /// goes through the scene's acceleration structures instead.
    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut RayHit<'a>) -> bool {
        let mut best: Option<(usize, f32, f32, f32)> = None;
        let mut closest = hit.t.min(ray.t_max);
        for i in 0..self.triangles.len() {
            if let Some((t, u, v)) = self.intersect_triangle(i, ray) {
                if t < closest {
                    closest = t;
                    best = Some((i, t, u, v));
                }
            }
        }
        match best {
            None => false,
            Some((i, t, mt_u, mt_v)) => {
                // Möller–Trumbore weighs vertex 1 with u; the hit record stores the projected
                // convention (u weighs vertex 2), so the pair is swapped here.
                let (u, v) = (mt_v, mt_u);
                hit.t = t;
                hit.normal = self.face_normal(i);
                hit.shading_normal = self.shading_normal(i, u, v);
                hit.uv = (u, v);
                hit.bsdf = Some(self.bsdf.as_ref());
                hit.area_light = self.area_light;
                true
            }
        }
    }
}

fn face_normal_of(vertices: &[Point3], tri: &Triangle) -> Vec3 {
    let e1 = vertices[tri.i1 as usize] - vertices[tri.i0 as usize];
    let e2 = vertices[tri.i2 as usize] - vertices[tri.i0 as usize];
    e1.cross(e2).try_hat().unwrap_or(Vec3::Z)
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::point3;
    use radiometry::color::Color;

    fn single_triangle() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                point3(0.0, 0.0, 0.0),
                point3(1.0, 0.0, 0.0),
                point3(0.0, 1.0, 0.0),
            ],
            vec![Triangle::new(0, 1, 2)],
            Arc::new(Bxdf::lambertian(Color::gray(0.5))),
        )
    }

    #[test]
    fn hits_triangle_face() {
        let mesh = single_triangle();
        let ray = Ray::new(
            point3(0.25, 0.25, 1.0),
            math::hcm::vec3(0.0, 0.0, -1.0),
        );
        let mut hit = RayHit::none_before(f32::INFINITY);
        assert!(mesh.intersect(&ray, &mut hit));
        assert!((hit.t - 1.0).abs() < 1e-5);
        assert!((hit.normal.z - 1.0).abs() < 1e-5);
        let (u, v) = hit.uv;
        assert!((u - 0.25).abs() < 1e-5 && (v - 0.25).abs() < 1e-5);
    }

    #[test]
    fn misses_outside_the_face() {
        let mesh = single_triangle();
        let ray = Ray::new(point3(0.9, 0.9, 1.0), math::hcm::vec3(0.0, 0.0, -1.0));
        let mut hit = RayHit::none_before(f32::INFINITY);
        assert!(!mesh.intersect(&ray, &mut hit));
    }

    #[test]
    fn smoothed_normals_average_incident_faces() {
        // Two faces of a ridge: +z facing and +x facing, sharing the edge x=0/z=0.
        let mesh = TriangleMesh::new(
            vec![
                point3(0.0, 0.0, 0.0),
                point3(0.0, 1.0, 0.0),
                point3(-1.0, 0.0, 0.0),
                point3(0.0, 0.0, -1.0),
            ],
            vec![Triangle::new(0, 1, 2), Triangle::new(0, 3, 1)],
            Arc::new(Bxdf::lambertian(Color::gray(0.5))),
        );
        // The shared edge's vertices see both faces; its smoothed normal leans between +z and +x.
        let shared = mesh.shading_normal(0, 0.0, 0.0);
        assert!(shared.x > 0.1 && shared.z > 0.1, "normal = {}", shared);
    }
}
