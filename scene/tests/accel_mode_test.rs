use geometry::ray::Ray;
use math::hcm::{point3, vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use scene::{preset, AccelMode};

/// All three triangle-intersection paths must report the same closest hit and the same
/// occlusion answers on the Cornell preset.
#[test]
fn accel_modes_agree_on_cornell_box() {
    let mut scenes = [
        preset::cornell_box().with_accel_mode(AccelMode::Sweep),
        preset::cornell_box().with_accel_mode(AccelMode::Packed8),
        preset::cornell_box().with_accel_mode(AccelMode::Bvh),
    ];
    for scene in scenes.iter_mut() {
        scene.preprocess();
    }

    let mut rng = SmallRng::seed_from_u64(99);
    for _ in 0..300 {
        let origin = point3(
            rng.gen::<f32>() * 90.0 + 5.0,
            rng.gen::<f32>() * 70.0 + 5.0,
            rng.gen::<f32>() * 200.0 + 10.0,
        );
        let dir = vec3(
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
            rng.gen::<f32>() - 0.5,
        );
        if dir.norm_squared() < 1e-6 {
            continue;
        }
        let ray = Ray::new(origin, dir.hat());

        let hits: Vec<_> = scenes.iter().map(|s| s.intersect(&ray)).collect();
        let ts: Vec<_> = hits
            .iter()
            .map(|h| h.as_ref().map(|hit| hit.t))
            .collect();
        assert!(
            ts.iter().all(|t| t.is_some()),
            "a ray inside the box cannot escape: {}",
            ray
        );
        let t0 = ts[0].unwrap();
        for t in &ts[1..] {
            assert!((t.unwrap() - t0).abs() < 1e-3, "ray = {}, ts = {:?}", ray, ts);
        }

        let shadow_ray = ray.with_extent(t0 * 0.5);
        let occlusions: Vec<_> = scenes
            .iter()
            .map(|s| s.intersect_shadow(&shadow_ray))
            .collect();
        assert_eq!(occlusions[0], occlusions[1]);
        assert_eq!(occlusions[1], occlusions[2]);
    }
}

/// An empty scene reports no intersections in any mode.
#[test]
fn empty_scene_never_intersects() {
    for mode in [AccelMode::Sweep, AccelMode::Packed8, AccelMode::Bvh] {
        let mut scene = scene::Scene::new(vec![], vec![], vec![]).with_accel_mode(mode);
        scene.preprocess();
        let ray = Ray::new(point3(0.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0));
        assert!(scene.intersect(&ray).is_none());
        assert!(!scene.intersect_shadow(&ray));
    }
}
