/// Binary BVH over projected triangles: recursive midpoint build with median fallback,
/// depth-first flattening, and iterative front-to-back traversal.
pub mod bvh;
/// Eight projected triangles in structure-of-arrays form, intersected lanewise.
pub mod pack;
/// The Wald projected-triangle representation and its scalar intersection routine.
pub mod triaccel;

pub use bvh::{Bvh, BvhPrimitive, FlatBvhNode};
pub use pack::TriAccel8;
pub use triaccel::{TriAccel, TriHit};
