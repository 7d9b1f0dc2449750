use std::path::Path;
use std::sync::Arc;

use math::hcm::{point3, vec3, Vec3};

use rt::camera::Camera;
use rt::renderer::{RenderOptions, Renderer};

const WIDTH: u32 = 1031;
const HEIGHT: u32 = 775;

fn main() -> std::io::Result<()> {
    env_logger::init();

    let mut scene = scene::preset::cornell_box();
    scene.preprocess();
    let scene = Arc::new(scene);

    let camera = Arc::new(Camera::new(
        point3(50.0, 48.0, 220.0),
        vec3(0.0, -0.042612, -1.0).hat(),
        WIDTH,
        HEIGHT,
        0.785398,
        Vec3::Y,
    ));

    let renderer = Renderer::new(RenderOptions::default());
    renderer.render(scene, camera.clone());

    camera.save_image(Path::new("image.bmp"))?;
    log::info!("wrote image.bmp");
    Ok(())
}
