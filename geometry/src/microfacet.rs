use crate::bxdf::local;
use math::hcm::{spherical_direction, Vec3};

/// Exponents above this make the distribution numerically indistinguishable from a mirror and
/// start producing infinities in the pdf; clamp at construction.
pub const MAX_EXPONENT: f32 = 10_000.0;

/// Blinn microfacet distribution: the density of half-vectors is proportional to
/// `|cos(theta_h)|^exponent`. Larger exponents mean tighter highlights.
#[derive(Debug, Clone, Copy)]
pub struct Blinn {
    exponent: f32,
}

impl Blinn {
    pub fn new(exponent: f32) -> Self {
        Self {
            exponent: exponent.min(MAX_EXPONENT),
        }
    }

    /// Differential area of microfacets with half-vector `wh`:
    /// `D(wh) = (e + 2) / (2 pi) * |cos(theta_h)|^e`.
    pub fn d(&self, wh: Vec3) -> f32 {
        let cos_theta_h = local::abs_cos_theta(wh);
        (self.exponent + 2.0) * 0.5 * std::f32::consts::FRAC_1_PI * cos_theta_h.powf(self.exponent)
    }

    /// Samples a half-vector from the distribution, reflects `wo` about it, and returns the
    /// incident direction together with the pdf of having produced it. The half-vector is
    /// flipped into `wo`'s hemisphere when needed; a half-vector facing away from `wo` yields
    /// a zero pdf.
    pub fn sample(&self, wo: Vec3, u: (f32, f32)) -> (Vec3, f32) {
        let (u1, u2) = u;
        let cos_theta = u1.powf(1.0 / (self.exponent + 1.0));
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi = u2 * 2.0 * std::f32::consts::PI;
        let mut wh = spherical_direction(sin_theta, cos_theta, phi);

        if !local::same_hemisphere(wo, wh) {
            wh = -wh;
        }
        let wi = -wo + 2.0 * wo.dot(wh) * wh;

        let pdf = if wo.dot(wh) < 0.0 {
            0.0
        } else {
            (self.exponent + 1.0) * cos_theta.powf(self.exponent)
                / (2.0 * std::f32::consts::PI * 4.0 * wo.dot(wh))
        };
        (wi, pdf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exponent_is_clamped() {
        let d = Blinn::new(1e9);
        // A clamped exponent keeps D finite at the pole.
        assert!(d.d(Vec3::Z).is_finite());
    }

    #[test]
    fn sampled_direction_mirrors_about_half_vector() {
        let distrib = Blinn::new(50.0);
        let wo = Vec3::new(0.3, -0.2, 0.8).hat();
        let (wi, pdf) = distrib.sample(wo, (0.7, 0.3));
        assert!(pdf > 0.0);
        // wo and wi make equal angles with the implied half vector.
        let wh = (wo + wi).hat();
        assert!((wo.dot(wh) - wi.dot(wh)).abs() < 1e-5);
    }
}
