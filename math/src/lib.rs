/// Small helpers over `f32`: min/max pairs, interpolation, `linspace` for
/// numeric tests, and the `Float` extension trait.
pub mod float;
/// Cartesian maths: `Vec3` and `Point3`, reflection/refraction, and helpers
/// to build coordinate systems from a single vector.
pub mod hcm;
/// The `Prob` type distinguishing probability densities from discrete masses.
pub mod prob;
