use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use geometry::bxdf::Bxdf;
use math::hcm::{point3, Point3};
use radiometry::color::Color;
use shape::{Triangle, TriangleMesh};

/// Loads a Wavefront OBJ file (with its MTL library, if one is referenced) into triangle
/// meshes. Each `o`/`g` group becomes one mesh; each material becomes a Lambertian model keyed
/// by its diffuse color. Faces with more than three vertices are fan-triangulated.
pub fn load_obj(path: &Path) -> io::Result<Vec<TriangleMesh>> {
    let text = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut materials = HashMap::new();
    for line in text.lines() {
        if let Some(lib_name) = line.trim().strip_prefix("mtllib ") {
            let mtl_path = base_dir.join(lib_name.trim());
            match std::fs::read_to_string(&mtl_path) {
                Ok(mtl_text) => materials.extend(parse_mtl(&mtl_text)),
                Err(e) => log::warn!("can't read material library {:?}: {}", mtl_path, e),
            }
        }
    }

    Ok(build_meshes(&text, &materials))
}

/// Parses `newmtl` / `Kd` pairs out of an MTL library. Specular colors and the other material
/// attributes are accepted but not used; everything renders as a diffuse reflector.
pub fn parse_mtl(text: &str) -> HashMap<String, Color> {
    let mut materials = HashMap::new();
    let mut current: Option<String> = None;
    for line in text.lines() {
        let line = line.trim();
        let mut words = line.split_whitespace();
        match words.next() {
            Some("newmtl") => {
                current = words.next().map(String::from);
            }
            Some("Kd") => {
                let rgb: Vec<f32> = words.flat_map(|w| w.parse().ok()).collect();
                match (&current, rgb.len()) {
                    (Some(name), 3) => {
                        materials.insert(name.clone(), Color::new(rgb[0], rgb[1], rgb[2]));
                    }
                    _ => log::warn!("stray or malformed Kd line: {}", line),
                }
            }
            // Ks, Ns, illum, d, map_* and friends are intentionally ignored.
            _ => {}
        }
    }
    materials
}

/// Parses the geometry of an OBJ body against an already-loaded material table.
pub fn build_meshes(text: &str, materials: &HashMap<String, Color>) -> Vec<TriangleMesh> {
    let default_color = Color::gray(0.75);

    // Global OBJ state: positions are shared by all groups; indices are 1-based and may be
    // negative (relative to the end of the list so far).
    let mut positions: Vec<Point3> = Vec::new();

    let mut meshes = Vec::new();
    let mut current = MeshBuilder::new(default_color);

    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        match words.next() {
            Some("v") => {
                let coords: Vec<f32> = words.flat_map(|w| w.parse().ok()).collect();
                if coords.len() >= 3 {
                    positions.push(point3(coords[0], coords[1], coords[2]));
                } else {
                    log::warn!("line {}: malformed vertex: {}", line_number + 1, line);
                }
            }
            Some("f") => {
                let indices: Vec<usize> = words
                    .flat_map(|w| resolve_index(w, positions.len()))
                    .collect();
                if indices.len() < 3 {
                    log::warn!("line {}: degenerate face: {}", line_number + 1, line);
                    continue;
                }
                for i in 1..indices.len() - 1 {
                    current.push_triangle(&positions, indices[0], indices[i], indices[i + 1]);
                }
            }
            Some("o") | Some("g") => {
                if let Some(mesh) = current.finish() {
                    meshes.push(mesh);
                }
                current = MeshBuilder::new(current.color);
            }
            Some("usemtl") => {
                let color = words
                    .next()
                    .and_then(|name| materials.get(name).copied())
                    .unwrap_or(default_color);
                // A material switch mid-group splits the group: one mesh, one model.
                if let Some(mesh) = current.finish() {
                    meshes.push(mesh);
                }
                current = MeshBuilder::new(color);
            }
            Some("vn") | Some("vt") | Some("s") | Some("mtllib") => {}
            Some(other) => {
                log::debug!("line {}: unhandled obj element '{}'", line_number + 1, other);
            }
            None => {}
        }
    }
    if let Some(mesh) = current.finish() {
        meshes.push(mesh);
    }
    meshes
}

/// OBJ face references look like `7`, `7/1`, `7/1/2` or `-3`; only the position index is used.
fn resolve_index(word: &str, num_positions: usize) -> Option<usize> {
    let first = word.split('/').next()?;
    let index: i64 = first.parse().ok()?;
    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        num_positions as i64 + index
    } else {
        return None;
    };
    (0..num_positions as i64)
        .contains(&resolved)
        .then_some(resolved as usize)
}

/// Accumulates one mesh's triangles, remapping the OBJ's global vertex indices to a compact
/// per-mesh vertex list.
struct MeshBuilder {
    color: Color,
    vertices: Vec<Point3>,
    remap: HashMap<usize, u32>,
    triangles: Vec<Triangle>,
}

impl MeshBuilder {
    fn new(color: Color) -> MeshBuilder {
        MeshBuilder {
            color,
            vertices: Vec::new(),
            remap: HashMap::new(),
            triangles: Vec::new(),
        }
    }

    fn local_index(&mut self, positions: &[Point3], global: usize) -> u32 {
        *self.remap.entry(global).or_insert_with(|| {
            self.vertices.push(positions[global]);
            (self.vertices.len() - 1) as u32
        })
    }

    fn push_triangle(&mut self, positions: &[Point3], a: usize, b: usize, c: usize) {
        let tri = Triangle::new(
            self.local_index(positions, a),
            self.local_index(positions, b),
            self.local_index(positions, c),
        );
        self.triangles.push(tri);
    }

    fn finish(&mut self) -> Option<TriangleMesh> {
        if self.triangles.is_empty() {
            return None;
        }
        let vertices = std::mem::take(&mut self.vertices);
        let triangles = std::mem::take(&mut self.triangles);
        self.remap.clear();
        Some(TriangleMesh::new(
            vertices,
            triangles,
            Arc::new(Bxdf::lambertian(self.color)),
        ))
    }
}
