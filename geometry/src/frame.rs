use math::hcm::Vec3;

/// Orthonormal basis `(s, t, n)` attached to a surface point, with `n` being the normal. Shading
/// computations happen in the local frame where `n` maps to the z-axis, so `w.z` is the cosine
/// of a direction's polar angle.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub s: Vec3,
    pub t: Vec3,
    pub n: Vec3,
}

impl Frame {
    /// Builds a frame around `normal` (not necessarily unit-length). The tangent is chosen from
    /// whichever coordinate plane the normal leans away from, which keeps the division
    /// well-conditioned.
    pub fn from_normal(normal: Vec3) -> Frame {
        let n = normal.hat();
        let t = if n.x.abs() > n.y.abs() {
            let inv_len = 1.0 / (n.x * n.x + n.z * n.z).sqrt();
            Vec3::new(-n.z * inv_len, 0.0, n.x * inv_len)
        } else {
            let inv_len = 1.0 / (n.y * n.y + n.z * n.z).sqrt();
            Vec3::new(0.0, n.z * inv_len, -n.y * inv_len)
        };
        let s = n.cross(t);
        Frame { s, t, n }
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(world.dot(self.s), world.dot(self.t), world.dot(self.n))
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        local.x * self.s + local.y * self.t + local.z * self.n
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            s: Vec3::X,
            t: Vec3::Y,
            n: Vec3::Z,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Frame;
    use math::hcm::vec3;

    #[test]
    fn basis_is_orthonormal() {
        for normal in [
            vec3(0.0, 0.0, 1.0),
            vec3(1.0, 0.0, 0.0),
            vec3(0.2, -0.7, 0.4),
            vec3(-5.0, 0.01, 0.01),
        ] {
            let f = Frame::from_normal(normal);
            assert!(f.s.dot(f.t).abs() < 1e-6);
            assert!(f.t.dot(f.n).abs() < 1e-6);
            assert!(f.n.dot(f.s).abs() < 1e-6);
            assert!((f.n.norm_squared() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn world_local_round_trip() {
        let f = Frame::from_normal(vec3(0.3, 0.5, -0.2));
        for w in [
            vec3(1.0, 2.0, 3.0),
            vec3(-0.4, 0.0, 0.9),
            vec3(0.0, -2.5, 0.1),
        ] {
            let round_trip = f.to_world(f.to_local(w));
            assert!((round_trip - w).norm() < 1e-5, "{} vs {}", round_trip, w);
        }
    }
}
