use std::f32::consts::PI;

use math::hcm::{Point3, Vec3};
use radiometry::color::Color;
use shape::Sphere;

/// Distance to stop short of a point light when casting the visibility ray.
const POINT_LIGHT_EPSILON: f32 = 1e-3;
/// Area emitters have actual surface; the visibility ray must stop early enough not to graze
/// the emitting shape itself.
const AREA_LIGHT_EPSILON: f32 = 1e-2;

/// One draw from a light's emission distribution towards a scene point. The caller builds a
/// shadow ray towards `position` travelling no farther than
/// `distance(position, scene point) - epsilon`.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    /// Unit direction from the scene point towards the sampled emitter point.
    pub wi: Vec3,
    /// Probability of this draw: 1 for delta lights, the shape's area pdf for area emitters.
    pub pdf: f32,
    /// The sampled point on the emitter.
    pub position: Point3,
    /// Emitted intensity over squared distance; the cosine term is the integrator's business.
    pub radiance: Color,
    pub epsilon: f32,
}

/// The emitter family. Area lights borrow their surface from the scene's shape list by index;
/// the shape in question carries the inverse link (`Sphere::area_light`) so that hits on it
/// can be credited.
pub enum Light {
    Point { position: Point3, intensity: Color },
    Area { shape: usize, intensity: Color },
}

impl Light {
    pub fn point(position: Point3, intensity: Color) -> Self {
        Light::Point { position, intensity }
    }

    pub fn area(shape: usize, intensity: Color) -> Self {
        Light::Area { shape, intensity }
    }

    /// True when the emitter occupies a single point: its direction distribution is a Dirac
    /// delta and BSDF sampling can never find it.
    pub fn is_delta(&self) -> bool {
        matches!(self, Light::Point { .. })
    }

    pub fn intensity(&self) -> Color {
        match self {
            Light::Point { intensity, .. } => *intensity,
            Light::Area { intensity, .. } => *intensity,
        }
    }

    /// Draws a point on the emitter towards `target`. `shapes` is the scene's sphere list that
    /// area lights index into.
    pub fn sample(&self, shapes: &[Sphere], target: Point3, u: (f32, f32)) -> LightSample {
        match self {
            Light::Point { position, intensity } => {
                let to_light = *position - target;
                LightSample {
                    wi: to_light.hat(),
                    pdf: 1.0,
                    position: *position,
                    radiance: *intensity / to_light.norm_squared(),
                    epsilon: POINT_LIGHT_EPSILON,
                }
            }
            Light::Area { shape, intensity } => {
                let (position, pdf) = shapes[*shape].sample(u);
                let to_light = position - target;
                LightSample {
                    wi: to_light.hat(),
                    pdf,
                    position,
                    radiance: *intensity / to_light.norm_squared(),
                    epsilon: AREA_LIGHT_EPSILON,
                }
            }
        }
    }

    /// Total emitted power.
    pub fn power(&self, shapes: &[Sphere]) -> Color {
        match self {
            Light::Point { intensity, .. } => *intensity * 4.0 * PI,
            Light::Area { shape, intensity } => *intensity * shapes[*shape].area() * PI,
        }
    }
}
