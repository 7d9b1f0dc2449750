use geometry::bxdf::{self, Bxdf};
use math::hcm::Vec3;
use math::prob::Prob;
use radiometry::color::Color;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn f32_close(a: f32, b: f32, rel_tolerance: f32) -> bool {
    if a == 0.0 || b == 0.0 {
        (a - b).abs() < rel_tolerance
    } else {
        (a - b).abs() / a.abs().max(b.abs()) < rel_tolerance
    }
}

#[test]
fn lambertian_energy_conservation() {
    // Monte-Carlo integral of f(wo, wi) |cos(wi)| over the hemisphere should recover the
    // reflectance, channel by channel.
    let albedo = Color::new(0.4, 0.5, 0.7);
    let matte = Bxdf::lambertian(albedo);
    let wo = Vec3::new(0.48, 0.64, 0.6);

    let mut rng = SmallRng::seed_from_u64(7);
    const N: usize = 200_000;
    let mut sum = Color::black();
    for _ in 0..N {
        let wi = bxdf::uniform_sample_hemisphere((rng.gen(), rng.gen()));
        let pdf = 0.5 * std::f32::consts::FRAC_1_PI;
        sum += matte.f(wo, wi) * bxdf::local::abs_cos_theta(wi) / pdf;
    }
    let rho = sum / N as f32;
    assert!(f32_close(rho.r, albedo.r, 0.01), "rho = {}", rho);
    assert!(f32_close(rho.g, albedo.g, 0.01), "rho = {}", rho);
    assert!(f32_close(rho.b, albedo.b, 0.01), "rho = {}", rho);
}

#[test]
fn lambertian_sample_matches_eval() {
    let matte = Bxdf::lambertian(Color::gray(0.8));
    let wo = Vec3::new(0.3, 0.1, 0.9).hat();
    let mut rng = SmallRng::seed_from_u64(11);
    for _ in 0..100 {
        let (wi, pdf, value) = matte.sample(wo, (rng.gen(), rng.gen()));
        assert!(matches!(pdf, Prob::Density(_)));
        assert!(bxdf::local::same_hemisphere(wo, wi));
        assert!(f32_close(
            pdf.value(),
            bxdf::cos_hemisphere_pdf(wi),
            1e-4
        ));
        assert_eq!(value, matte.f(wo, wi));
    }
}

#[test]
fn reciprocity_of_non_delta_models() {
    let models = [
        Bxdf::lambertian(Color::new(0.7, 0.6, 0.2)),
        Bxdf::torrance_sparrow_conductor(
            Color::gray(0.9),
            Color::new(0.16, 0.55, 1.75),
            Color::new(4.6, 2.2, 1.9),
            1000.0,
        ),
    ];
    let pairs = [
        (Vec3::new(0.48, 0.64, 0.6), Vec3::new(-0.3, 0.1, 0.9).hat()),
        (Vec3::new(0.0, 0.6, 0.8), Vec3::new(0.5, -0.5, 0.7).hat()),
    ];
    for model in &models {
        for (wo, wi) in pairs {
            let forward = model.f(wo, wi);
            let backward = model.f(wi, wo);
            assert!(f32_close(forward.r, backward.r, 1e-3));
            assert!(f32_close(forward.g, backward.g, 1e-3));
            assert!(f32_close(forward.b, backward.b, 1e-3));
        }
    }
}

#[test]
fn perfect_conductor_mirrors_the_outgoing_direction() {
    let mirror = Bxdf::perfect_conductor(Color::gray(0.9));
    let wo = Vec3::new(0.48, -0.36, 0.8);
    let (wi, pdf, value) = mirror.sample(wo, (0.0, 0.0));
    assert_eq!(wi.z, wo.z);
    assert_eq!(wi.x, -wo.x);
    assert_eq!(wi.y, -wo.y);
    assert!(matches!(pdf, Prob::Mass(p) if p == 1.0));
    assert!(!value.is_black());
    // Delta models never evaluate through f.
    assert!(mirror.f(wo, wi).is_black());
}

#[test]
fn perfect_dielectric_total_internal_reflection() {
    // Leaving the dense medium (cos < 0) at a grazing angle: eta * sin exceeds 1 and the
    // refractor passes nothing.
    let glass = Bxdf::perfect_dielectric(Color::white(), 1.5);
    let wo = Vec3::new(0.99, 0.0, -0.14).hat();
    let (_, _, value) = glass.sample(wo, (0.5, 0.5));
    assert!(value.is_black());

    // Near-normal incidence refracts through.
    let wo = Vec3::new(0.1, 0.0, 0.99).hat();
    let (wi, pdf, value) = glass.sample(wo, (0.5, 0.5));
    assert!(!value.is_black());
    assert!(matches!(pdf, Prob::Mass(p) if p == 1.0));
    assert!(wi.z < 0.0, "refracted ray continues to the far side");
}

#[test]
fn fresnel_dielectric_splits_between_branches() {
    let glass = Bxdf::fresnel_dielectric(Color::white(), 1.66);
    let wo = Vec3::new(0.6, 0.0, 0.8);

    // u1 = 0 always lands in the reflection branch, u1 close to 1 in refraction.
    let (wi_r, pdf_r, value_r) = glass.sample(wo, (0.0, 0.0));
    assert_eq!(wi_r, Vec3::new(-0.6, 0.0, 0.8));
    assert!(matches!(pdf_r, Prob::Mass(_)));
    assert!(!value_r.is_black());

    let (wi_t, pdf_t, value_t) = glass.sample(wo, (0.999, 0.0));
    assert!(wi_t.z < 0.0);
    assert!(!value_t.is_black());
    // The two branch probabilities are complementary.
    assert!(f32_close(pdf_r.value() + pdf_t.value(), 1.0, 1e-5));
}

#[test]
fn fresnel_values_are_sane() {
    // At normal incidence the dielectric formula degenerates to ((n1-n2)/(n1+n2))^2, which is
    // also what Schlick's approximation starts from.
    let exact = bxdf::fresnel_dielectric(1.0, 1.0, Color::gray(1.0), Color::gray(1.5));
    let schlick = bxdf::fresnel_dielectric_schlick(1.0, 1.0, 1.5);
    assert!(f32_close(exact.r, 0.04, 1e-3));
    assert!(f32_close(schlick, 0.04, 1e-3));

    // Conductor reflectance stays within [0, 1] per channel over the angle sweep.
    let eta = Color::new(0.16, 0.55, 1.75);
    let k = Color::new(4.6, 2.2, 1.9);
    for i in 1..=10 {
        let cos_i = i as f32 / 10.0;
        let fr = bxdf::fresnel_conductor(cos_i, eta, k);
        for channel in [fr.r, fr.g, fr.b] {
            assert!((0.0..=1.0).contains(&channel), "Fr = {} at cos {}", fr, cos_i);
        }
    }
}

#[test]
fn torrance_sparrow_sample_stays_in_hemisphere_or_is_black() {
    let rough_metal = Bxdf::torrance_sparrow_conductor(
        Color::gray(0.999),
        Color::new(0.16, 0.55, 1.75),
        Color::new(4.6, 2.2, 1.9),
        1000.0,
    );
    let wo = Vec3::new(0.3, -0.4, 0.866).hat();
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..1000 {
        let (wi, pdf, value) = rough_metal.sample(wo, (rng.gen(), rng.gen()));
        if !value.is_black() {
            assert!(bxdf::local::same_hemisphere(wo, wi));
            assert!(pdf.value() > 0.0);
        }
    }
}
