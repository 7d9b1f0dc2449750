use std::sync::Arc;

use geometry::bxdf::Bxdf;
use light::Light;
use math::hcm::{point3, Point3};
use radiometry::color::Color;
use shape::{Sphere, Triangle, TriangleMesh};

use crate::Scene;

/// Index of refraction / absorption of the conductor used by every metal in the box.
const CONDUCTOR_ETA: Color = Color::new(0.16, 0.55, 1.75);
const CONDUCTOR_K: Color = Color::new(4.6, 2.2, 1.9);

fn quad(corners: [Point3; 4], winding: [(u32, u32, u32); 2], bsdf: Bxdf) -> TriangleMesh {
    let triangles = winding
        .iter()
        .map(|&(a, b, c)| Triangle::new(a, b, c))
        .collect();
    TriangleMesh::new(corners.to_vec(), triangles, Arc::new(bsdf))
}

/// The Cornell-style test box: 100 x 80 x 230 units, colored side walls, a metal cube, three
/// characteristically different spheres, a point light and a small spherical area emitter.
pub fn cornell_box() -> Scene {
    let white = Color::new(0.75, 0.75, 0.75);

    let meshes = vec![
        // Left wall, red.
        quad(
            [
                point3(0.0, 0.0, 0.0),
                point3(0.0, 0.0, 230.0),
                point3(0.0, 80.0, 0.0),
                point3(0.0, 80.0, 230.0),
            ],
            [(0, 1, 2), (3, 2, 1)],
            Bxdf::lambertian(Color::new(0.75, 0.25, 0.25)),
        ),
        // Right wall, blue.
        quad(
            [
                point3(100.0, 0.0, 0.0),
                point3(100.0, 0.0, 230.0),
                point3(100.0, 80.0, 0.0),
                point3(100.0, 80.0, 230.0),
            ],
            [(0, 2, 1), (3, 1, 2)],
            Bxdf::lambertian(Color::new(0.25, 0.25, 0.75)),
        ),
        // Front wall (behind the camera's subject), grey.
        quad(
            [
                point3(0.0, 0.0, 0.0),
                point3(100.0, 0.0, 0.0),
                point3(0.0, 80.0, 0.0),
                point3(100.0, 80.0, 0.0),
            ],
            [(0, 1, 2), (3, 2, 1)],
            Bxdf::lambertian(white),
        ),
        // Back wall, desaturated cyan.
        quad(
            [
                point3(0.0, 0.0, 230.0),
                point3(100.0, 0.0, 230.0),
                point3(0.0, 80.0, 230.0),
                point3(100.0, 80.0, 230.0),
            ],
            [(0, 2, 1), (3, 1, 2)],
            Bxdf::lambertian(Color::new(0.25, 0.75, 0.75)),
        ),
        // Floor.
        quad(
            [
                point3(0.0, 0.0, 230.0),
                point3(100.0, 0.0, 230.0),
                point3(0.0, 0.0, 0.0),
                point3(100.0, 0.0, 0.0),
            ],
            [(0, 1, 2), (3, 2, 1)],
            Bxdf::lambertian(white),
        ),
        // Ceiling.
        quad(
            [
                point3(0.0, 80.0, 230.0),
                point3(100.0, 80.0, 230.0),
                point3(0.0, 80.0, 0.0),
                point3(100.0, 80.0, 0.0),
            ],
            [(0, 2, 1), (3, 1, 2)],
            Bxdf::lambertian(white),
        ),
        // Metal cube.
        metal_cube(),
    ];

    let mut spheres = vec![
        Sphere::new(
            point3(27.0, 16.5, 47.0),
            16.5,
            Arc::new(Bxdf::fresnel_conductor(
                Color::gray(0.999),
                CONDUCTOR_ETA,
                CONDUCTOR_K,
            )),
        ),
        Sphere::new(
            point3(73.0, 16.5, 88.0),
            16.5,
            Arc::new(Bxdf::fresnel_dielectric(Color::gray(0.999), 1.66)),
        ),
        Sphere::new(
            point3(50.0, 8.5, 60.0),
            8.5,
            Arc::new(Bxdf::torrance_sparrow_conductor(
                Color::gray(0.999),
                CONDUCTOR_ETA,
                CONDUCTOR_K,
                1000.0,
            )),
        ),
        Sphere::emitter(point3(50.0, 60.0, 85.0), 2.0),
    ];

    let lights = vec![
        Light::point(point3(80.0, 60.0, 85.0), Color::gray(700.0)),
        Light::area(3, Color::gray(500.0)),
    ];
    // Back-link the emitting sphere to its light so direct hits are credited.
    spheres[3].area_light = Some(1);

    Scene::new(meshes, spheres, lights)
}

fn metal_cube() -> TriangleMesh {
    let corners = vec![
        point3(10.0, 20.0, 80.0),   // 0
        point3(10.0, 40.0, 80.0),   // 1
        point3(30.0, 20.0, 80.0),   // 2
        point3(30.0, 40.0, 80.0),   // 3
        point3(10.0, 20.0, 100.0),  // 4
        point3(10.0, 40.0, 100.0),  // 5
        point3(30.0, 20.0, 100.0),  // 6
        point3(30.0, 40.0, 100.0),  // 7
    ];
    let faces = [
        (0, 1, 2), // rear
        (1, 3, 2),
        (0, 4, 1), // left
        (4, 5, 1),
        (4, 7, 5), // front
        (7, 4, 6),
        (7, 6, 3), // right
        (6, 2, 3),
        (1, 5, 7), // top
        (1, 7, 3),
        (0, 6, 4), // bottom
        (0, 2, 6),
    ];
    let triangles = faces
        .iter()
        .map(|&(a, b, c)| Triangle::new(a, b, c))
        .collect();
    TriangleMesh::new(
        corners,
        triangles,
        Arc::new(Bxdf::fresnel_conductor(
            Color::gray(0.999),
            CONDUCTOR_ETA,
            CONDUCTOR_K,
        )),
    )
}
