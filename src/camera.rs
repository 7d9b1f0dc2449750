use std::io;
use std::path::Path;
use std::sync::Mutex;

use geometry::ray::Ray;
use math::hcm::{Point3, Vec3};
use radiometry::color::Color;

use crate::bitmap;
use crate::renderer::Tile;

/// Pinhole camera plus the film it exposes. Ray generation precomputes the sensor basis: the
/// horizontal axis scaled by aspect and field factor, and the vertical axis derived from it.
pub struct Camera {
    position: Point3,
    direction: Vec3,
    width: u32,
    height: u32,
    right: Vec3,
    up: Vec3,
    film: Film,
}

impl Camera {
    /// `direction` must be unit-length. `fov` is the field scale factor applied to the basis
    /// vectors; `up_hint` only disambiguates which way is up for the derived vertical axis.
    pub fn new(
        position: Point3,
        direction: Vec3,
        width: u32,
        height: u32,
        fov: f32,
        up_hint: Vec3,
    ) -> Camera {
        let right = Vec3::new(width as f32 * fov / height as f32, 0.0, 0.0);
        let mut up = right.cross(direction).hat();
        if up.dot(up_hint) < 0.0 {
            up = -up;
        }
        Camera {
            position,
            direction,
            width,
            height,
            right,
            up: up * fov,
            film: Film::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The primary ray through continuous image coordinates `(x, y)`. Integrators pass
    /// jittered coordinates for anti-aliasing.
    pub fn sample(&self, x: f32, y: f32) -> Ray {
        let d = self.right * ((x + 0.5) / self.width as f32 - 0.5)
            + self.up * (-(y + 0.5) / self.height as f32 + 0.5)
            + self.direction;
        Ray::new(self.position, d.hat())
    }

    /// Deposits one finished tile of radiance values into the film.
    pub fn merge_tile(&self, tile: &Tile, colors: &[Color]) {
        self.film.merge_tile(tile, colors);
    }

    pub fn film(&self) -> &Film {
        &self.film
    }

    /// Tone-maps the film and writes it as a 24-bit BMP. The only I/O side effect of a render.
    pub fn save_image(&self, path: &Path) -> io::Result<()> {
        let pixels = self.film.snapshot();
        bitmap::write_bmp(path, self.width, self.height, &pixels)
    }
}

/// The accumulation target. Tiles are disjoint rectangles, so merges never overlap; the mutex
/// is held only for the duration of one tile's copy.
pub struct Film {
    width: u32,
    pixels: Mutex<Vec<Color>>,
}

impl Film {
    pub fn new(width: u32, height: u32) -> Film {
        Film {
            width,
            pixels: Mutex::new(vec![Color::black(); (width * height) as usize]),
        }
    }

    pub fn merge_tile(&self, tile: &Tile, colors: &[Color]) {
        debug_assert_eq!(colors.len() as u32, tile.area());
        let mut pixels = self.pixels.lock().unwrap();
        let mut source = colors.iter();
        for y in tile.y0..tile.y1 {
            for x in tile.x0..tile.x1 {
                pixels[(y * self.width + x) as usize] = *source.next().unwrap();
            }
        }
    }

    pub fn snapshot(&self) -> Vec<Color> {
        self.pixels.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, vec3};

    fn test_camera() -> Camera {
        Camera::new(
            point3(0.0, 0.0, 0.0),
            vec3(0.0, 0.0, -1.0),
            200,
            100,
            0.785398,
            Vec3::Y,
        )
    }

    #[test]
    fn center_ray_matches_view_direction() {
        let camera = test_camera();
        // The midpoint of the sensor; (x + 0.5) / w == 0.5 exactly.
        let ray = camera.sample(99.5, 49.5);
        assert!((ray.dir - vec3(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn horizontal_extent_scales_with_aspect() {
        let camera = test_camera();
        let left = camera.sample(-0.5, 49.5);
        let right = camera.sample(199.5, 49.5);
        // Symmetric about the axis, and wider than tall for a 2:1 image.
        assert!((left.dir.x + right.dir.x).abs() < 1e-6);
        assert!(left.dir.x < -0.5);
    }

    #[test]
    fn tile_merges_land_in_place() {
        let camera = test_camera();
        let tile = Tile::new(2, 3, 4, 5);
        let colors = vec![Color::new(1.0, 2.0, 3.0); tile.area() as usize];
        camera.merge_tile(&tile, &colors);
        let film = camera.film.snapshot();
        assert_eq!(film[(3 * 200 + 2) as usize], Color::new(1.0, 2.0, 3.0));
        assert_eq!(film[(4 * 200 + 3) as usize], Color::new(1.0, 2.0, 3.0));
        assert_eq!(film[(3 * 200 + 4) as usize], Color::black());
    }
}
