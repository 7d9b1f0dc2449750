use geometry::frame::Frame;
use geometry::ray::Ray;
use radiometry::color::Color;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use scene::Scene;

use crate::camera::Camera;

/// Paths are cut off after this many scattering events regardless of Russian roulette.
pub const MAX_BOUNCES: u32 = 10;

/// Estimates one pixel: `samples` jittered camera rays, each traced by [`radiance`], averaged.
///
/// The random stream is seeded from the pixel index alone, so the result does not depend on
/// which worker renders the pixel or in what order tiles are scheduled.
pub fn render_pixel(scene: &Scene, camera: &Camera, x: u32, y: u32, samples: u32) -> Color {
    let mut rng = SmallRng::seed_from_u64((y * camera.width() + x) as u64);
    let inv_samples = 1.0 / samples as f32;
    let mut pixel = Color::black();
    for _ in 0..samples {
        let ray = camera.sample(
            x as f32 + rng.gen::<f32>() - 0.5,
            y as f32 + rng.gen::<f32>() - 0.5,
        );
        pixel += radiance(scene, ray, &mut rng) * inv_samples;
    }
    pixel
}

/// Traces one light-transport path from the camera.
///
/// Each bounce: find the closest hit; credit emission if the previous event couldn't have
/// sampled it explicitly; do next-event estimation against one uniformly chosen light; play
/// Russian roulette on the path throughput; then sample the BSDF for the next direction.
/// Delta scatterers re-arm the emission credit since explicit light sampling never sees
/// through them.
pub fn radiance(scene: &Scene, mut ray: Ray, rng: &mut SmallRng) -> Color {
    let mut color = Color::black();
    let mut path_weight = Color::ONE;
    let mut evaluate_direct_light_hit = true;

    for _bounce in 0..MAX_BOUNCES {
        let hit = match scene.intersect(&ray) {
            None => break,
            Some(hit) => hit,
        };

        if evaluate_direct_light_hit {
            if let Some(light_index) = hit.area_light {
                color += path_weight * scene.lights[light_index].intensity();
            }
        }

        let bsdf = match hit.bsdf {
            None => break,
            Some(bsdf) => bsdf,
        };

        let intersection = ray.position_at(hit.t);
        let normal = hit.normal;
        // The side of the surface the ray arrived on.
        let nl = if normal.dot(ray.dir) < 0.0 { normal } else { -normal };

        let hit_frame = Frame::from_normal(normal);
        let wo = hit_frame.to_local(-ray.dir);

        // Next-event estimation: one light, chosen uniformly, compensated by the light count.
        let num_lights = scene.lights.len();
        if num_lights > 0 {
            let light_index =
                ((rng.gen::<f32>() * num_lights as f32) as usize).min(num_lights - 1);
            let light_sample =
                scene.sample_light(light_index, intersection, (rng.gen(), rng.gen()));
            let distance = intersection.distance_to(light_sample.position);
            if light_sample.pdf > 0.0 && distance > light_sample.epsilon {
                let shadow_ray = Ray::spawn(intersection, light_sample.wi)
                    .with_extent(distance - light_sample.epsilon);
                if !scene.intersect_shadow(&shadow_ray) {
                    let f = bsdf.f(wo, hit_frame.to_local(light_sample.wi));
                    color += path_weight
                        * f
                        * light_sample.radiance
                        * (nl.dot(light_sample.wi).abs() / light_sample.pdf)
                        * num_lights as f32;
                }
            }
        }

        // Russian roulette: survive with probability equal to the throughput's luminance.
        let continue_probability = path_weight.luminance().min(1.0);
        if rng.gen::<f32>() > continue_probability {
            break;
        }
        path_weight = path_weight / continue_probability;

        let (wi, pdf, reflectance) = bsdf.sample(wo, (rng.gen(), rng.gen()));
        if reflectance.luminance() == 0.0 || !pdf.is_positive() {
            break;
        }

        // Deltas propagate the emission credit: the next emissive surface they see can only
        // be accounted for here, never by light sampling at this bounce.
        evaluate_direct_light_hit = bsdf.is_delta();

        let dir = hit_frame.to_world(wi);
        path_weight = path_weight * reflectance * (dir.dot(nl).abs() / pdf.value());
        ray = Ray::spawn(intersection, dir);
    }

    color
}
