/// Defines the `BBox` bounding-box type.
pub mod bbox;
/// Scattering models and the sampling/Fresnel utilities they are built from.
pub mod bxdf;
/// Orthonormal shading basis built from a surface normal.
pub mod frame;
/// Blinn microfacet distribution used by the Torrance–Sparrow model.
pub mod microfacet;
pub mod ray;
