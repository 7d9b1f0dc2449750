use geometry::bbox::{self, BBox};
use geometry::ray::Ray;
use math::hcm::Point3;
use partition::partition;

use crate::triaccel::{TriAccel, TriHit};

/// Nodes with fewer triangles than this become leaves. Eight matches the pack width, so a leaf
/// is at most one pack.
pub const MIN_TRIANGLES_IN_NODE: usize = 8;

const MAX_TRAVERSAL_DEPTH: usize = 64;

const AXIS_NONE: u8 = 3;

/// Per-triangle build input: its bounds, centroid, and back-reference into the scene.
pub struct BvhPrimitive {
    pub bounds: BBox,
    pub centroid: Point3,
    pub mesh_id: u32,
    pub tri_id: u32,
}

impl BvhPrimitive {
    pub fn new(bounds: BBox, mesh_id: u32, tri_id: u32) -> Self {
        BvhPrimitive {
            bounds,
            centroid: bounds.midpoint(),
            mesh_id,
            tri_id,
        }
    }
}

/// One node of the flattened tree, 32 bytes. Nodes are laid out depth-first, left-child-first:
/// an interior node's left child is the next slot and `offset` holds the right child's index.
/// For leaves, `offset` is the first triangle and `num_triangles` is nonzero.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FlatBvhNode {
    pub bounds: BBox,
    pub offset: u32,
    pub num_triangles: u8,
    pub axis: u8,
}

impl FlatBvhNode {
    pub fn is_leaf(&self) -> bool {
        self.num_triangles > 0
    }
}

/// The finished hierarchy: the flat node array plus the leaf-contiguous triangle order. Entry
/// `i` of `order` is the `(mesh, triangle)` pair that the projected-triangle table should hold
/// at index `i`.
pub struct Bvh {
    pub nodes: Vec<FlatBvhNode>,
    pub order: Vec<(u32, u32)>,
}

enum BuildContent {
    Leaf { first: usize, count: usize },
    Interior { axis: usize, children: [Box<BuildNode>; 2] },
}

struct BuildNode {
    bounds: BBox,
    content: BuildContent,
}

impl Bvh {
    /// Builds the tree over the given primitives. The slice is reordered in place during
    /// partitioning; the leaf-emission order is recorded in `order`.
    pub fn build(prims: &mut [BvhPrimitive]) -> Bvh {
        if prims.is_empty() {
            return Bvh {
                nodes: vec![],
                order: vec![],
            };
        }
        let mut order = Vec::with_capacity(prims.len());
        let root = build_recursive(prims, &mut order);
        let mut nodes = Vec::new();
        flatten(&root, &mut nodes);
        log::info!(
            "bvh: {} triangles in {} nodes",
            order.len(),
            nodes.len()
        );
        Bvh { nodes, order }
    }

    /// Closest-hit traversal. `tris[i]` must be the projected triangle for `order[i]`.
    /// Returns the index of the winning triangle, with `hit` updated to the closest
    /// intersection found below its incoming `t`.
    pub fn intersect_closest(&self, tris: &[TriAccel], ray: &Ray, hit: &mut TriHit) -> Option<usize> {
        self.traverse(ray, hit, tris, false).0
    }

    /// Shadow traversal: stops at the first triangle hit below `hit.t`.
    pub fn intersect_any(&self, tris: &[TriAccel], ray: &Ray) -> bool {
        let mut hit = TriHit::none_before(ray.t_max);
        self.traverse(ray, &mut hit, tris, true).0.is_some()
    }

    /// Closest-hit traversal that also reports how many per-triangle tests ran; the second
    /// number over `tris.len()` measures how much geometry the hierarchy culled.
    pub fn intersect_closest_counting(
        &self,
        tris: &[TriAccel],
        ray: &Ray,
        hit: &mut TriHit,
    ) -> (Option<usize>, usize) {
        self.traverse(ray, hit, tris, false)
    }

    fn traverse(
        &self,
        ray: &Ray,
        hit: &mut TriHit,
        tris: &[TriAccel],
        any_hit: bool,
    ) -> (Option<usize>, usize) {
        if self.nodes.is_empty() {
            return (None, 0);
        }
        let mut stack = [0u32; MAX_TRAVERSAL_DEPTH];
        let mut stack_top = 0usize;
        let mut current = 0usize;
        let mut winner = None;
        let mut tested = 0usize;
        // The slab test narrows to the closest hit found so far.
        let mut clipped = *ray;

        loop {
            clipped.t_max = hit.t;
            let node = &self.nodes[current];
            if node.bounds.intersect(&clipped) {
                if node.is_leaf() {
                    let first = node.offset as usize;
                    for i in first..first + node.num_triangles as usize {
                        tested += 1;
                        if tris[i].intersect(ray, hit) {
                            winner = Some(i);
                            if any_hit {
                                return (winner, tested);
                            }
                        }
                    }
                } else {
                    // Visit the child the ray enters first; defer the other.
                    let left = current + 1;
                    let right = node.offset as usize;
                    let (near, far) = if ray.dir[node.axis as usize] > 0.0 {
                        (left, right)
                    } else {
                        (right, left)
                    };
                    debug_assert!(stack_top < MAX_TRAVERSAL_DEPTH);
                    stack[stack_top] = far as u32;
                    stack_top += 1;
                    current = near;
                    continue;
                }
            }
            match stack_top {
                0 => break,
                _ => {
                    stack_top -= 1;
                    current = stack[stack_top] as usize;
                }
            }
        }
        (winner, tested)
    }
}

fn build_recursive(prims: &mut [BvhPrimitive], order: &mut Vec<(u32, u32)>) -> BuildNode {
    if prims.len() < MIN_TRIANGLES_IN_NODE {
        let first = order.len();
        let mut bounds = BBox::empty();
        for prim in prims.iter() {
            bounds = bbox::union(bounds, prim.bounds);
            order.push((prim.mesh_id, prim.tri_id));
        }
        return BuildNode {
            bounds,
            content: BuildContent::Leaf {
                first,
                count: prims.len(),
            },
        };
    }

    let bounds = prims
        .iter()
        .fold(BBox::empty(), |b, p| bbox::union(b, p.bounds));

    let axis = bounds.diag().max_dimension();
    let midpoint = (bounds.max()[axis] - bounds.min()[axis]) / 2.0 + bounds.min()[axis];
    let (left, _right) = partition(prims, |p| p.centroid[axis] < midpoint);
    let mut mid = left.len();

    if mid == 0 || mid == prims.len() {
        // All centroids landed on one side of the midpoint; fall back to a median split along
        // the same axis.
        mid = prims.len() / 2;
        prims.select_nth_unstable_by(mid, |a, b| {
            a.centroid[axis]
                .partial_cmp(&b.centroid[axis])
                .expect("NaN centroid")
        });
    }

    let (left_prims, right_prims) = prims.split_at_mut(mid);
    let left_child = build_recursive(left_prims, order);
    let right_child = build_recursive(right_prims, order);

    BuildNode {
        bounds,
        content: BuildContent::Interior {
            axis,
            children: [Box::new(left_child), Box::new(right_child)],
        },
    }
}

/// Emits `node` and its subtree depth-first, left-first. The parent's slot is reserved before
/// the children are emitted so the left child always lands at `parent + 1`; the right child's
/// index is patched in afterwards.
fn flatten(node: &BuildNode, nodes: &mut Vec<FlatBvhNode>) -> u32 {
    let my_index = nodes.len() as u32;
    nodes.push(FlatBvhNode {
        bounds: node.bounds,
        offset: 0,
        num_triangles: 0,
        axis: AXIS_NONE,
    });
    match &node.content {
        BuildContent::Leaf { first, count } => {
            debug_assert!(*count < MIN_TRIANGLES_IN_NODE);
            nodes[my_index as usize].offset = *first as u32;
            nodes[my_index as usize].num_triangles = *count as u8;
        }
        BuildContent::Interior { axis, children } => {
            flatten(&children[0], nodes);
            let right_index = flatten(&children[1], nodes);
            nodes[my_index as usize].offset = right_index;
            nodes[my_index as usize].axis = *axis as u8;
        }
    }
    my_index
}
