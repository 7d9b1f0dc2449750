use std::sync::Arc;

use geometry::bxdf::Bxdf;
use geometry::ray::Ray;
use math::hcm::{point3, vec3};
use radiometry::color::Color;
use shape::{RayHit, Sphere, Triangle, TriangleMesh};

fn grey_bsdf() -> Arc<Bxdf> {
    Arc::new(Bxdf::lambertian(Color::gray(0.5)))
}

#[test]
fn ray_extent_excludes_the_sphere() {
    let sphere = Sphere::new(point3(3.0, 4.0, 5.0), 1.6, grey_bsdf());
    let toward = (point3(3.0, 4.0, 5.0) - point3(0.1, 0.2, 0.1)).hat();
    let ray = Ray::new(point3(0.1, 0.2, 0.1), toward);

    let mut hit = RayHit::none_before(ray.t_max);
    assert!(sphere.intersect(&ray, &mut hit));
    let full_t = hit.t;

    // The same ray clipped short of the surface reports nothing.
    let clipped = ray.with_extent(full_t * 0.9);
    let mut hit = RayHit::none_before(clipped.t_max);
    assert!(!sphere.intersect(&clipped, &mut hit));
}

#[test]
fn closer_shape_wins_regardless_of_query_order() {
    // A triangle at z = 1 in front of a sphere at the origin, viewed from z = 3.
    let mesh = TriangleMesh::new(
        vec![
            point3(-2.0, -2.0, 1.5),
            point3(2.0, -2.0, 1.5),
            point3(0.0, 2.0, 1.5),
        ],
        vec![Triangle::new(0, 1, 2)],
        grey_bsdf(),
    );
    let sphere = Sphere::new(point3(0.0, 0.0, 0.0), 1.0, grey_bsdf());
    let ray = Ray::new(point3(0.0, 0.0, 3.0), vec3(0.0, 0.0, -1.0));

    // Sphere first, then mesh: the mesh is closer and replaces the record.
    let mut hit = RayHit::none_before(ray.t_max);
    assert!(sphere.intersect(&ray, &mut hit));
    assert!(mesh.intersect(&ray, &mut hit));
    assert!((hit.t - 1.5).abs() < 1e-5);

    // Mesh first, then sphere: the sphere is farther and must not overwrite.
    let mut hit = RayHit::none_before(ray.t_max);
    assert!(mesh.intersect(&ray, &mut hit));
    assert!(!sphere.intersect(&ray, &mut hit));
    assert!((hit.t - 1.5).abs() < 1e-5);
}

#[test]
fn emissive_sphere_reports_backlink_and_no_bsdf() {
    let mut emitter = Sphere::emitter(point3(0.0, 0.0, 0.0), 1.0);
    emitter.area_light = Some(7);
    let ray = Ray::new(point3(0.0, 0.0, 3.0), vec3(0.0, 0.0, -1.0));
    let mut hit = RayHit::none_before(ray.t_max);
    assert!(emitter.intersect(&ray, &mut hit));
    assert_eq!(hit.area_light, Some(7));
    assert!(hit.bsdf.is_none());
}
