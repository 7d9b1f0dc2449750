use std::sync::Arc;
use std::time::Instant;

use scene::Scene;

use crate::camera::Camera;
use crate::integrator;
use crate::scheduler::{Scheduler, Task};

/// A pixel block `[x0, x1) x [y0, y1)`, the unit of parallel work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Tile {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Tile {
        debug_assert!(x0 < x1 && y0 < y1);
        Tile { x0, y0, x1, y1 }
    }

    pub fn area(&self) -> u32 {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

pub struct RenderOptions {
    pub tile_size: u32,
    pub samples_per_pixel: u32,
    pub num_workers: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            tile_size: 32,
            samples_per_pixel: 32,
            num_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

/// Renders one tile into a local buffer, then deposits it on the film in a single merge. The
/// scene and camera are shared read-only; the film merge is the only synchronized step.
struct TileTask {
    tile: Tile,
    scene: Arc<Scene>,
    camera: Arc<Camera>,
    samples: u32,
}

impl Task for TileTask {
    fn run(&self) {
        let mut colors = Vec::with_capacity(self.tile.area() as usize);
        for y in self.tile.y0..self.tile.y1 {
            for x in self.tile.x0..self.tile.x1 {
                colors.push(integrator::render_pixel(
                    &self.scene,
                    &self.camera,
                    x,
                    y,
                    self.samples,
                ));
            }
        }
        self.camera.merge_tile(&self.tile, &colors);
    }
}

pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Renderer {
        Renderer { options }
    }

    /// Decomposes the image into tiles, runs them through the worker pool, and blocks until
    /// the completion barrier releases.
    pub fn render(&self, scene: Arc<Scene>, camera: Arc<Camera>) {
        let tiles = tiles_for(camera.width(), camera.height(), self.options.tile_size);
        log::info!(
            "renderer: {}x{} image, {} tiles, {} spp",
            camera.width(),
            camera.height(),
            tiles.len(),
            self.options.samples_per_pixel
        );

        let tasks: Vec<Box<dyn Task>> = tiles
            .into_iter()
            .map(|tile| {
                Box::new(TileTask {
                    tile,
                    scene: scene.clone(),
                    camera: camera.clone(),
                    samples: self.options.samples_per_pixel,
                }) as Box<dyn Task>
            })
            .collect();

        let start = Instant::now();
        let scheduler = Scheduler::new(self.options.num_workers);
        scheduler.enqueue(tasks);
        scheduler.run();
        scheduler.wait_for_completion();
        scheduler.shutdown();
        log::info!("renderer: finished in {:.2?}", start.elapsed());
    }
}

/// Full `size`-square tiles in a grid, a band of partial tiles along the right edge, one along
/// the bottom, and a corner tile when both remainders exist.
pub fn tiles_for(width: u32, height: u32, size: u32) -> Vec<Tile> {
    let full_x = width / size;
    let full_y = height / size;
    let mut tiles = Vec::with_capacity((full_x * full_y) as usize + 8);

    for i in 0..full_x {
        for j in 0..full_y {
            tiles.push(Tile::new(i * size, j * size, (i + 1) * size, (j + 1) * size));
        }
    }

    let leftover_width = width - full_x * size;
    if leftover_width > 0 {
        for j in 0..full_y {
            tiles.push(Tile::new(full_x * size, j * size, width, (j + 1) * size));
        }
    }

    let leftover_height = height - full_y * size;
    if leftover_height > 0 {
        for i in 0..full_x {
            tiles.push(Tile::new(i * size, full_y * size, (i + 1) * size, height));
        }
    }

    if leftover_width > 0 && leftover_height > 0 {
        tiles.push(Tile::new(full_x * size, full_y * size, width, height));
    }

    tiles
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_tiles_cover_exactly(width: u32, height: u32, size: u32) {
        let tiles = tiles_for(width, height, size);
        let mut coverage = vec![0u32; (width * height) as usize];
        for tile in &tiles {
            assert!(tile.x1 <= width && tile.y1 <= height);
            for y in tile.y0..tile.y1 {
                for x in tile.x0..tile.x1 {
                    coverage[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(
            coverage.iter().all(|&c| c == 1),
            "{}x{} at tile size {} is not a partition",
            width,
            height,
            size
        );
    }

    #[test]
    fn tiles_partition_the_image() {
        // Exact grid, right band only, bottom band only, and both.
        assert_tiles_cover_exactly(64, 64, 32);
        assert_tiles_cover_exactly(70, 64, 32);
        assert_tiles_cover_exactly(64, 70, 32);
        assert_tiles_cover_exactly(1031, 775, 32);
        assert_tiles_cover_exactly(8, 8, 32);
    }
}
