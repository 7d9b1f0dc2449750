use math::hcm::Vec3;
use math::prob::Prob;
use radiometry::color::Color;

use crate::microfacet::Blinn;

/// Cosines with magnitude below this are glancing; evaluations at such angles return black
/// rather than dividing by a near-zero cosine.
pub const COS_EPSILON: f32 = 1e-4;

/// Trigonometry of directions expressed in the local shading frame, where the surface normal is
/// the z-axis and `w.z` is the cosine of the polar angle.
pub mod local {
    use math::hcm::Vec3;

    pub fn cos_theta(w: Vec3) -> f32 {
        w.z
    }
    pub fn abs_cos_theta(w: Vec3) -> f32 {
        w.z.abs()
    }
    pub fn cos2_theta(w: Vec3) -> f32 {
        w.z * w.z
    }
    pub fn sin2_theta(w: Vec3) -> f32 {
        (1.0 - cos2_theta(w)).max(0.0)
    }
    pub fn sin_theta(w: Vec3) -> f32 {
        sin2_theta(w).sqrt()
    }
    pub fn same_hemisphere(w: Vec3, w1: Vec3) -> bool {
        w.z * w1.z > 0.0
    }
}

// Sampling utilities.
// -------------------------------------------------------------------------------------------------

/// Maps a uniform point of the unit square onto the unit disk, preserving relative areas.
pub fn concentric_sample_disk(uv: (f32, f32)) -> (f32, f32) {
    let x = uv.0 * 2.0 - 1.0;
    let y = uv.1 * 2.0 - 1.0;

    if x == 0.0 && y == 0.0 {
        return (0.0, 0.0);
    }
    let r = if x.abs() > y.abs() { x } else { y }.abs();
    let hypot = x.hypot(y);
    let (cos_theta, sin_theta) = (x / hypot, y / hypot);
    (r * cos_theta, r * sin_theta)
}

/// Cosine-weighted direction on the upper (+z) hemisphere, via Malley's method.
pub fn cos_sample_hemisphere(uv: (f32, f32)) -> Vec3 {
    let (x, y) = concentric_sample_disk(uv);
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    Vec3::new(x, y, z)
}

pub fn cos_hemisphere_pdf(w_local: Vec3) -> f32 {
    local::cos_theta(w_local) * std::f32::consts::FRAC_1_PI
}

/// Uniform direction on the upper (+z) hemisphere.
pub fn uniform_sample_hemisphere(uv: (f32, f32)) -> Vec3 {
    let (u1, u2) = uv;
    let z = u1;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * std::f32::consts::PI * u2;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniform direction on the full sphere.
pub fn uniform_sample_sphere(uv: (f32, f32)) -> Vec3 {
    let (u1, u2) = uv;
    let z = 1.0 - 2.0 * u1;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * std::f32::consts::PI * u2;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn uniform_sphere_pdf() -> f32 {
    0.25 * std::f32::consts::FRAC_1_PI
}

// Fresnel formulas.
// -------------------------------------------------------------------------------------------------

/// Exact Fresnel reflectance for dielectrics, averaged over the two polarizations.
/// `cos_i`/`cos_t` are the incident/transmitted angle cosines; `eta_i`/`eta_t` the indices of
/// refraction on either side of the boundary.
pub fn fresnel_dielectric(cos_i: f32, cos_t: f32, eta_i: Color, eta_t: Color) -> Color {
    let r_parallel = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let r_perpendicular = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    (r_parallel * r_parallel + r_perpendicular * r_perpendicular) * 0.5
}

/// Schlick's polynomial approximation of the dielectric Fresnel reflectance.
pub fn fresnel_dielectric_schlick(cos_i: f32, eta_i: f32, eta_t: f32) -> f32 {
    let r0 = ((eta_i - eta_t) / (eta_i + eta_t)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cos_i).powi(5)
}

/// Fresnel reflectance for conductors with wavelength-dependent index of refraction `eta` and
/// absorption coefficient `k`.
pub fn fresnel_conductor(cos_i: f32, eta: Color, k: Color) -> Color {
    let tmp = (eta * eta + k * k) * (cos_i * cos_i);
    let two_eta_cos = eta * (2.0 * cos_i);
    let one = Color::ONE;
    let cos2 = Color::gray(cos_i * cos_i);
    let r_parl2 = (tmp - two_eta_cos + one) / (tmp + two_eta_cos + one);
    let tmp2 = eta * eta + k * k;
    let r_perp2 = (tmp2 - two_eta_cos + cos2) / (tmp2 + two_eta_cos + cos2);
    (r_parl2 + r_perp2) * 0.5
}

// The scattering models.
// -------------------------------------------------------------------------------------------------

/// The closed family of scattering models. All directions are expressed in the local shading
/// frame (normal = z-axis).
///
/// Three operations make up the contract:
/// - `f(wo, wi)` evaluates the scattering density for a given pair of directions. Models whose
///   distribution is a Dirac delta always evaluate to black; their energy only shows up through
///   sampling.
/// - `sample(wo, u)` draws an incident direction, returning it together with the probability of
///   the draw and the model's value for that pair. The caller divides by the probability; no
///   division happens here.
/// - `is_delta()` reports whether the distribution is a Dirac delta, which integrators need to
///   know when combining sampled directions with explicit light sampling.
pub enum Bxdf {
    Lambertian {
        reflectance: Color,
    },
    PerfectConductor {
        reflectance: Color,
    },
    PerfectDielectric {
        reflectance: Color,
        eta: f32,
    },
    FresnelConductor {
        reflectance: Color,
        eta: Color,
        k: Color,
    },
    FresnelDielectric {
        reflectance: Color,
        eta: f32,
    },
    TorranceSparrowConductor {
        reflectance: Color,
        eta: Color,
        k: Color,
        distribution: Blinn,
    },
}

impl Bxdf {
    pub fn lambertian(reflectance: Color) -> Self {
        Self::Lambertian { reflectance }
    }
    pub fn perfect_conductor(reflectance: Color) -> Self {
        Self::PerfectConductor { reflectance }
    }
    pub fn perfect_dielectric(reflectance: Color, eta: f32) -> Self {
        Self::PerfectDielectric { reflectance, eta }
    }
    pub fn fresnel_conductor(reflectance: Color, eta: Color, k: Color) -> Self {
        Self::FresnelConductor { reflectance, eta, k }
    }
    pub fn fresnel_dielectric(reflectance: Color, eta: f32) -> Self {
        Self::FresnelDielectric { reflectance, eta }
    }
    pub fn torrance_sparrow_conductor(reflectance: Color, eta: Color, k: Color, exponent: f32) -> Self {
        Self::TorranceSparrowConductor {
            reflectance,
            eta,
            k,
            distribution: Blinn::new(exponent),
        }
    }

    /// True when the model's distribution is concentrated on a single direction. Such models
    /// cannot be evaluated by `f` and explicit light sampling never finds them.
    pub fn is_delta(&self) -> bool {
        match self {
            Self::Lambertian { .. } | Self::TorranceSparrowConductor { .. } => false,
            Self::PerfectConductor { .. }
            | Self::PerfectDielectric { .. }
            | Self::FresnelConductor { .. }
            | Self::FresnelDielectric { .. } => true,
        }
    }

    /// Evaluates the scattering density for `(wo, wi)`. Delta models return black.
    pub fn f(&self, wo: Vec3, wi: Vec3) -> Color {
        match self {
            Self::Lambertian { reflectance } => *reflectance * std::f32::consts::FRAC_1_PI,
            Self::PerfectConductor { .. }
            | Self::PerfectDielectric { .. }
            | Self::FresnelConductor { .. }
            | Self::FresnelDielectric { .. } => Color::black(),
            Self::TorranceSparrowConductor {
                reflectance,
                eta,
                k,
                distribution,
            } => {
                let cos_theta_o = local::abs_cos_theta(wo);
                let cos_theta_i = local::abs_cos_theta(wi);
                if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
                    return Color::black();
                }
                let wh = match (wo + wi).try_hat() {
                    Some(wh) => wh,
                    None => return Color::black(),
                };
                let cos_theta_h = wi.dot(wh);
                let fr = fresnel_conductor(cos_theta_h, *eta, *k);
                *reflectance * fr * distribution.d(wh) * geometric_attenuation(wo, wi, wh)
                    / (4.0 * cos_theta_i * cos_theta_o)
            }
        }
    }

    /// Draws an incident direction for the given outgoing one. Returns `(wi, pdf, value)` where
    /// `value` is `f` evaluated at the sampled pair (times the Fresnel/branch weight for delta
    /// models). A black value or zero pdf means the path should terminate.
    pub fn sample(&self, wo: Vec3, u: (f32, f32)) -> (Vec3, Prob, Color) {
        match self {
            Self::Lambertian { .. } => {
                let mut wi = cos_sample_hemisphere(u);
                if wo.z < 0.0 {
                    wi.z = -wi.z;
                }
                let pdf = if local::same_hemisphere(wo, wi) {
                    local::abs_cos_theta(wi) * std::f32::consts::FRAC_1_PI
                } else {
                    0.0
                };
                if local::abs_cos_theta(wi) < COS_EPSILON {
                    return (wi, Prob::Density(pdf), Color::black());
                }
                (wi, Prob::Density(pdf), self.f(wo, wi))
            }

            Self::PerfectConductor { reflectance } => {
                let wi = Vec3::new(-wo.x, -wo.y, wo.z);
                if local::abs_cos_theta(wi) < COS_EPSILON {
                    return (wi, Prob::Mass(1.0), Color::black());
                }
                (wi, Prob::Mass(1.0), *reflectance / local::abs_cos_theta(wi))
            }

            Self::PerfectDielectric { reflectance, eta } => {
                let entering = local::cos_theta(wo) > 0.0;
                let eta_ratio = if entering { 1.0 / eta } else { *eta };
                let sin2_i = local::sin2_theta(wo);
                let sin2_t = eta_ratio * eta_ratio * sin2_i;

                // Total internal reflection: the refractor passes nothing.
                if sin2_t > 1.0 {
                    return (Vec3::ZERO, Prob::Mass(1.0), Color::black());
                }

                let mut cos_t = (1.0 - sin2_t).max(0.0).sqrt();
                if entering {
                    cos_t = -cos_t;
                }
                let wi = Vec3::new(eta_ratio * -wo.x, eta_ratio * -wo.y, cos_t);
                if local::abs_cos_theta(wi) < COS_EPSILON {
                    return (wi, Prob::Mass(1.0), Color::black());
                }
                (wi, Prob::Mass(1.0), *reflectance / local::abs_cos_theta(wi))
            }

            Self::FresnelConductor { reflectance, eta, k } => {
                let wi = Vec3::new(-wo.x, -wo.y, wo.z);
                if local::abs_cos_theta(wi) < COS_EPSILON {
                    return (wi, Prob::Mass(1.0), Color::black());
                }
                let fr = fresnel_conductor(local::abs_cos_theta(wo), *eta, *k);
                (
                    wi,
                    Prob::Mass(1.0),
                    fr * *reflectance / local::abs_cos_theta(wi),
                )
            }

            Self::FresnelDielectric { reflectance, eta } => {
                self.sample_fresnel_dielectric(*reflectance, *eta, wo, u)
            }

            Self::TorranceSparrowConductor { distribution, .. } => {
                let (wi, pdf) = distribution.sample(wo, u);
                if !local::same_hemisphere(wo, wi) {
                    return (wi, Prob::Density(pdf), Color::black());
                }
                (wi, Prob::Density(pdf), self.f(wo, wi))
            }
        }
    }

    /// The dielectric with both reflection and transmission: Russian-split on the Fresnel
    /// reflectance, using its luminance as the branch probability.
    fn sample_fresnel_dielectric(
        &self,
        reflectance: Color,
        eta: f32,
        wo: Vec3,
        u: (f32, f32),
    ) -> (Vec3, Prob, Color) {
        let entering = local::cos_theta(wo) > 0.0;
        let eta_ratio = if entering { 1.0 / eta } else { eta };
        let sin2_i = local::sin2_theta(wo);
        let sin2_t = eta_ratio * eta_ratio * sin2_i;

        // Total internal reflection: the boundary acts as a perfect mirror.
        if sin2_t > 1.0 {
            let wi = Vec3::new(-wo.x, -wo.y, wo.z);
            if local::abs_cos_theta(wi) < COS_EPSILON {
                return (wi, Prob::Mass(1.0), Color::black());
            }
            return (wi, Prob::Mass(1.0), reflectance / local::abs_cos_theta(wi));
        }

        let (eta_i, eta_t) = if entering { (1.0, eta) } else { (eta, 1.0) };
        let cos_t = (1.0 - sin2_t).max(0.0).sqrt();
        let fresnel = fresnel_dielectric(
            local::abs_cos_theta(wo),
            cos_t,
            Color::gray(eta_i),
            Color::gray(eta_t),
        );
        let reflect_prob = fresnel.luminance();

        if u.0 < reflect_prob {
            let wi = Vec3::new(-wo.x, -wo.y, wo.z);
            if local::abs_cos_theta(wi) < COS_EPSILON {
                return (wi, Prob::Mass(reflect_prob), Color::black());
            }
            (
                wi,
                Prob::Mass(reflect_prob),
                fresnel * reflectance / local::abs_cos_theta(wi),
            )
        } else {
            let mut cos_t = cos_t;
            if entering {
                cos_t = -cos_t;
            }
            let wi = Vec3::new(eta_ratio * -wo.x, eta_ratio * -wo.y, cos_t);
            if local::abs_cos_theta(wi) < COS_EPSILON {
                return (wi, Prob::Mass(1.0 - reflect_prob), Color::black());
            }
            (
                wi,
                Prob::Mass(1.0 - reflect_prob),
                (Color::ONE - fresnel) * reflectance / local::abs_cos_theta(wi),
            )
        }
    }
}

/// Torrance–Sparrow shadowing-masking term.
fn geometric_attenuation(wo: Vec3, wi: Vec3, wh: Vec3) -> f32 {
    let n_dot_wh = local::abs_cos_theta(wh);
    let n_dot_wo = local::abs_cos_theta(wo);
    let n_dot_wi = local::abs_cos_theta(wi);
    let wo_dot_wh = wo.dot(wh).abs();
    (2.0 * n_dot_wh * n_dot_wo / wo_dot_wh)
        .min(2.0 * n_dot_wh * n_dot_wi / wo_dot_wh)
        .min(1.0)
}
