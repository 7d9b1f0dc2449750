use std::sync::Arc;

use geometry::bxdf::{self, Bxdf};
use geometry::ray::Ray;
use math::hcm::Point3;

use crate::RayHit;

/// Roots closer than this are discarded so a ray leaving the surface doesn't immediately re-hit
/// it.
const HIT_EPSILON: f32 = 1e-4;

pub struct Sphere {
    center: Point3,
    radius: f32,
    bsdf: Option<Arc<Bxdf>>,
    /// Index of the area light bound to this sphere, if any. Set when the scene is assembled;
    /// rebuilt together with the light list so it cannot dangle.
    pub area_light: Option<usize>,
}

impl Sphere {
    pub fn new(center: Point3, radius: f32, bsdf: Arc<Bxdf>) -> Sphere {
        debug_assert!(radius > 0.0 && !center.has_nan());
        Sphere {
            center,
            radius,
            bsdf: Some(bsdf),
            area_light: None,
        }
    }

    /// A sphere with no scattering model; only useful as the surface of an emitter.
    pub fn emitter(center: Point3, radius: f32) -> Sphere {
        Sphere {
            center,
            radius,
            bsdf: None,
            area_light: None,
        }
    }

    pub fn center(&self) -> Point3 {
        self.center
    }
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn area(&self) -> f32 {
        4.0 * std::f32::consts::PI * self.radius * self.radius
    }

    /// Analytic quadratic intersection, keeping the nearer root above `HIT_EPSILON`. Respects
    /// the closer-hit contract: the record is only updated for a `t` closer than both the
    /// current `hit.t` and the ray extent.
    pub fn intersect<'a>(&'a self, ray: &Ray, hit: &mut RayHit<'a>) -> bool {
        // The quadratic runs in f64: the catastrophic cancellation in b^2 - |op|^2 + r^2 is
        // visible as surface acne at f32.
        let op = self.center - ray.origin;
        let b = op.dot(ray.dir) as f64;
        let det2 = b * b - op.norm_squared() as f64 + (self.radius * self.radius) as f64;
        if det2 < 0.0 {
            return false;
        }
        let det = det2.sqrt();

        let t = if b - det > HIT_EPSILON as f64 {
            (b - det) as f32
        } else if b + det > HIT_EPSILON as f64 {
            (b + det) as f32
        } else {
            return false;
        };
        if t >= hit.t || t >= ray.t_max {
            return false;
        }

        let normal = (ray.position_at(t) - self.center) / self.radius;
        hit.t = t;
        hit.normal = normal;
        hit.shading_normal = normal;
        hit.uv = (0.0, 0.0);
        hit.bsdf = self.bsdf.as_deref();
        hit.area_light = self.area_light;
        true
    }

    /// Uniformly samples a point on the surface. The pdf w.r.t. surface area is `1 / area()`.
    pub fn sample(&self, u: (f32, f32)) -> (Point3, f32) {
        let dir = bxdf::uniform_sample_sphere(u);
        (self.center + dir * self.radius, 1.0 / self.area())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geometry::bxdf::Bxdf;
    use math::hcm::{point3, vec3};
    use radiometry::color::Color;

    fn unit_sphere() -> Sphere {
        Sphere::new(
            Point3::ORIGIN,
            1.0,
            Arc::new(Bxdf::lambertian(Color::gray(0.5))),
        )
    }

    #[test]
    fn hits_from_outside() {
        let s = unit_sphere();
        let ray = Ray::new(point3(0.0, 0.0, 3.0), vec3(0.0, 0.0, -1.0));
        let mut hit = RayHit::none_before(f32::INFINITY);
        assert!(s.intersect(&ray, &mut hit));
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.normal - vec3(0.0, 0.0, 1.0)).norm() < 1e-5);
        assert!(hit.bsdf.is_some());
    }

    #[test]
    fn picks_far_root_from_inside() {
        let s = unit_sphere();
        let ray = Ray::new(Point3::ORIGIN, vec3(1.0, 0.0, 0.0));
        let mut hit = RayHit::none_before(f32::INFINITY);
        assert!(s.intersect(&ray, &mut hit));
        assert!((hit.t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn never_overwrites_closer_hit() {
        let s = unit_sphere();
        let ray = Ray::new(point3(0.0, 0.0, 3.0), vec3(0.0, 0.0, -1.0));
        let mut hit = RayHit::none_before(f32::INFINITY);
        hit.t = 1.5;
        assert!(!s.intersect(&ray, &mut hit));
        assert_eq!(hit.t, 1.5);
    }

    #[test]
    fn sampled_points_lie_on_surface() {
        let s = unit_sphere();
        for (u, v) in [(0.1, 0.9), (0.5, 0.5), (0.99, 0.01)] {
            let (p, pdf) = s.sample((u, v));
            assert!((p.distance_to(Point3::ORIGIN) - 1.0).abs() < 1e-5);
            assert!((pdf - 1.0 / s.area()).abs() < 1e-8);
        }
    }
}
