pub mod preset;

use accel::{Bvh, BvhPrimitive, TriAccel, TriAccel8, TriHit};
use geometry::bbox::BBox;
use geometry::ray::Ray;
use light::{Light, LightSample};
use math::hcm::Point3;
use shape::{RayHit, Sphere, TriangleMesh};

/// Which triangle-intersection machinery `Scene::intersect` drives. All three produce the same
/// hits; `Bvh` is the production default, the sweeps exist for validation and measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelMode {
    /// Exhaustive scalar sweep over the projected-triangle table.
    Sweep,
    /// Exhaustive sweep over the 8-wide packs.
    Packed8,
    /// Front-to-back traversal of the flattened BVH.
    Bvh,
}

/// Owns all geometry and emitters. `preprocess()` must be called once after construction and
/// before any intersection query: it concatenates every mesh triangle into the
/// projected-triangle table (in BVH leaf order), groups the table into 8-wide packs, and
/// builds the hierarchy.
pub struct Scene {
    pub meshes: Vec<TriangleMesh>,
    pub spheres: Vec<Sphere>,
    pub lights: Vec<Light>,

    accel_mode: AccelMode,
    preprocessed: bool,
    triaccels: Vec<TriAccel>,
    packs: Vec<TriAccel8>,
    bvh: Bvh,
}

impl Scene {
    pub fn new(meshes: Vec<TriangleMesh>, spheres: Vec<Sphere>, lights: Vec<Light>) -> Scene {
        Scene {
            meshes,
            spheres,
            lights,
            accel_mode: AccelMode::Bvh,
            preprocessed: false,
            triaccels: vec![],
            packs: vec![],
            bvh: Bvh {
                nodes: vec![],
                order: vec![],
            },
        }
    }

    pub fn with_accel_mode(mut self, mode: AccelMode) -> Scene {
        self.accel_mode = mode;
        self
    }

    /// Builds the acceleration structures. Degenerate triangles fail projection and are left
    /// out of the index entirely.
    pub fn preprocess(&mut self) {
        let mut prims = Vec::new();
        for (mesh_id, mesh) in self.meshes.iter().enumerate() {
            let vertices = mesh.vertices();
            for (tri_id, tri) in mesh.triangles().iter().enumerate() {
                let (a, b, c) = (
                    vertices[tri.i0 as usize],
                    vertices[tri.i1 as usize],
                    vertices[tri.i2 as usize],
                );
                if TriAccel::project(a, b, c, tri_id as i32, mesh_id as i32).is_none() {
                    log::warn!(
                        "skipping degenerate triangle {} of mesh {}",
                        tri_id,
                        mesh_id
                    );
                    continue;
                }
                let bounds = BBox::new(a, b).union(c);
                prims.push(BvhPrimitive::new(bounds, mesh_id as u32, tri_id as u32));
            }
        }

        self.bvh = Bvh::build(&mut prims);
        self.triaccels = self
            .bvh
            .order
            .iter()
            .map(|&(mesh_id, tri_id)| {
                let mesh = &self.meshes[mesh_id as usize];
                let tri = mesh.triangles()[tri_id as usize];
                let vertices = mesh.vertices();
                TriAccel::project(
                    vertices[tri.i0 as usize],
                    vertices[tri.i1 as usize],
                    vertices[tri.i2 as usize],
                    tri_id as i32,
                    mesh_id as i32,
                )
                .expect("projection succeeded during primitive collection")
            })
            .collect();
        self.packs = TriAccel8::pack_all(&self.triaccels);
        self.preprocessed = true;

        log::info!(
            "scene: {} meshes ({} indexed triangles), {} spheres, {} lights",
            self.meshes.len(),
            self.triaccels.len(),
            self.spheres.len(),
            self.lights.len()
        );
    }

    /// Closest hit over analytic shapes and the triangle index combined. Returns a fully
    /// populated record, or `None` if nothing lies within the ray's extent.
    pub fn intersect(&self, ray: &Ray) -> Option<RayHit<'_>> {
        debug_assert!(self.preprocessed || self.meshes.is_empty());
        let mut hit = RayHit::none_before(ray.t_max);
        for sphere in &self.spheres {
            sphere.intersect(ray, &mut hit);
        }

        let mut tri_hit = TriHit::none_before(hit.t);
        let winner = match self.accel_mode {
            AccelMode::Sweep => {
                let mut winner = None;
                for (i, accel) in self.triaccels.iter().enumerate() {
                    if accel.intersect(ray, &mut tri_hit) {
                        winner = Some(i);
                    }
                }
                winner
            }
            AccelMode::Packed8 => {
                let mut winner = None;
                for (pack_idx, pack) in self.packs.iter().enumerate() {
                    if let Some(lane) = pack.intersect(ray, &mut tri_hit) {
                        winner = Some(pack_idx * 8 + lane);
                    }
                }
                winner
            }
            AccelMode::Bvh => self.bvh.intersect_closest(&self.triaccels, ray, &mut tri_hit),
        };

        if let Some(i) = winner {
            let accel = &self.triaccels[i];
            let mesh = &self.meshes[accel.mesh_idx as usize];
            let tri_id = accel.tri_idx as usize;
            hit.t = tri_hit.t;
            hit.normal = mesh.face_normal(tri_id);
            hit.shading_normal = mesh.shading_normal(tri_id, tri_hit.u, tri_hit.v);
            hit.uv = (tri_hit.u, tri_hit.v);
            hit.bsdf = Some(mesh.bsdf());
            hit.area_light = mesh.area_light;
        }

        hit.is_hit(ray.t_max).then_some(hit)
    }

    /// Any-hit test against the same geometry, clamped to the ray's extent. Used for shadow
    /// rays whose `t_max` the caller has set to just short of the light sample.
    pub fn intersect_shadow(&self, ray: &Ray) -> bool {
        debug_assert!(self.preprocessed || self.meshes.is_empty());
        let mut hit = RayHit::none_before(ray.t_max);
        for sphere in &self.spheres {
            if sphere.intersect(ray, &mut hit) {
                return true;
            }
        }

        match self.accel_mode {
            AccelMode::Sweep => {
                let mut tri_hit = TriHit::none_before(ray.t_max);
                self.triaccels
                    .iter()
                    .any(|accel| accel.intersect(ray, &mut tri_hit))
            }
            AccelMode::Packed8 => {
                let mut tri_hit = TriHit::none_before(ray.t_max);
                self.packs
                    .iter()
                    .any(|pack| pack.intersect(ray, &mut tri_hit).is_some())
            }
            AccelMode::Bvh => self.bvh.intersect_any(&self.triaccels, ray),
        }
    }

    /// Samples light `index` towards `target`, resolving area lights against this scene's
    /// shape list.
    pub fn sample_light(&self, index: usize, target: Point3, u: (f32, f32)) -> LightSample {
        self.lights[index].sample(&self.spheres, target, u)
    }
}
