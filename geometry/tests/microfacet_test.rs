use geometry::microfacet::Blinn;
use math::float::linspace;
use math::hcm::spherical_direction;

/// Riemann-integrates D(wh) cos(theta_h) over the hemisphere; a proper microfacet
/// distribution normalizes this to 1.
fn integrate_d_projected(distribution: &Blinn) -> f32 {
    let mut integral = 0.0;
    let (thetas, d_theta) = linspace((0.0, std::f32::consts::FRAC_PI_2), 400);
    let (phis, d_phi) = linspace((0.0, std::f32::consts::PI * 2.0), 400);
    for theta in thetas {
        let (sin_theta, cos_theta) = theta.sin_cos();
        for phi in phis.iter().copied() {
            let wh = spherical_direction(sin_theta, cos_theta, phi);
            integral += distribution.d(wh) * cos_theta * sin_theta * d_theta * d_phi;
        }
    }
    integral
}

#[test]
fn blinn_distribution_is_normalized() {
    for exponent in [1.0, 20.0, 400.0] {
        let integral = integrate_d_projected(&Blinn::new(exponent));
        assert!(
            (integral - 1.0).abs() < 0.02,
            "exponent {}: integral = {}",
            exponent,
            integral
        );
    }
}
