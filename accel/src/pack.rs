use geometry::ray::Ray;
use wide::*;

use crate::triaccel::{TriAccel, TriHit, T_EPSILON};

const MODULO: [usize; 4] = [1, 2, 0, 1];

/// Eight `TriAccel` records in structure-of-arrays layout, one register-width lane per
/// triangle. The trailing pack of a scene is padded with invalid lanes; `valid` carries
/// all-ones bits for real lanes and zero for padding. Mesh/triangle back-references are not
/// duplicated here: the winning lane index recovers them from the scalar table.
///
/// `wide`'s vectors are 32-byte aligned, which is the load width this layout is built for.
pub struct TriAccel8 {
    n_u: f32x8,
    n_v: f32x8,
    n_d: f32x8,
    k: [i32; 8],

    b_u: f32x8,
    b_v: f32x8,
    b_d: f32x8,

    c_u: f32x8,
    c_v: f32x8,
    c_d: f32x8,

    valid: f32x8,
}

impl TriAccel8 {
    /// Packs up to eight scalar records; missing trailing lanes are marked invalid.
    pub fn pack(records: &[TriAccel]) -> TriAccel8 {
        assert!(!records.is_empty() && records.len() <= 8);
        let mut n_u = [0.0f32; 8];
        let mut n_v = [0.0f32; 8];
        let mut n_d = [0.0f32; 8];
        let mut k = [0i32; 8];
        let mut b_u = [0.0f32; 8];
        let mut b_v = [0.0f32; 8];
        let mut b_d = [0.0f32; 8];
        let mut c_u = [0.0f32; 8];
        let mut c_v = [0.0f32; 8];
        let mut c_d = [0.0f32; 8];
        let mut valid = [0.0f32; 8];

        for (i, accel) in records.iter().enumerate() {
            n_u[i] = accel.n_u;
            n_v[i] = accel.n_v;
            n_d[i] = accel.n_d;
            k[i] = accel.k;
            b_u[i] = accel.b_u;
            b_v[i] = accel.b_v;
            b_d[i] = accel.b_d;
            c_u[i] = accel.c_u;
            c_v[i] = accel.c_v;
            c_d[i] = accel.c_d;
            valid[i] = f32::from_bits(u32::MAX);
        }

        TriAccel8 {
            n_u: f32x8::from(n_u),
            n_v: f32x8::from(n_v),
            n_d: f32x8::from(n_d),
            k,
            b_u: f32x8::from(b_u),
            b_v: f32x8::from(b_v),
            b_d: f32x8::from(b_d),
            c_u: f32x8::from(c_u),
            c_v: f32x8::from(c_v),
            c_d: f32x8::from(c_d),
            valid: f32x8::from(valid),
        }
    }

    /// Groups a scalar table into packs of eight, the last one padded with invalid lanes.
    pub fn pack_all(records: &[TriAccel]) -> Vec<TriAccel8> {
        records.chunks(8).map(TriAccel8::pack).collect()
    }

    fn lane_is_valid(&self, lane: usize) -> bool {
        self.valid.to_array()[lane].to_bits() != 0
    }

    /// Lanewise Wald intersection of one ray against all eight triangles. Rejection tests are
    /// AND-ed into the validity mask; as soon as the mask empties the routine returns early.
    /// On success the closest surviving lane updates `hit` and its index is returned so the
    /// caller can recover `mesh_idx`/`tri_idx` from the scalar table.
    ///
    /// The per-lane ray components depend on each lane's projection axis, so the gather is
    /// scalar; the ray is constant across the pack.
    pub fn intersect(&self, ray: &Ray, hit: &mut TriHit) -> Option<usize> {
        let mut d_k = [0.0f32; 8];
        let mut d_ku = [0.0f32; 8];
        let mut d_kv = [0.0f32; 8];
        let mut o_k = [0.0f32; 8];
        let mut o_ku = [0.0f32; 8];
        let mut o_kv = [0.0f32; 8];

        for lane in 0..8 {
            if self.lane_is_valid(lane) {
                let k = self.k[lane] as usize;
                let ku = MODULO[k];
                let kv = MODULO[k + 1];
                d_k[lane] = ray.dir[k];
                d_ku[lane] = ray.dir[ku];
                d_kv[lane] = ray.dir[kv];
                o_k[lane] = ray.origin[k];
                o_ku[lane] = ray.origin[ku];
                o_kv[lane] = ray.origin[kv];
            }
        }
        let d_k = f32x8::from(d_k);
        let d_ku = f32x8::from(d_ku);
        let d_kv = f32x8::from(d_kv);
        let o_k = f32x8::from(o_k);
        let o_ku = f32x8::from(o_ku);
        let o_kv = f32x8::from(o_kv);

        let zero = f32x8::splat(0.0);
        let one = f32x8::splat(1.0);
        let eps = f32x8::splat(T_EPSILON);

        let nd = one / self.n_v.mul_add(d_kv, self.n_u.mul_add(d_ku, d_k));
        let t = (self.n_d - o_k - self.n_u * o_ku - self.n_v * o_kv) * nd;

        let mut mask = t.cmp_lt(f32x8::splat(hit.t)) & t.cmp_gt(eps) & self.valid;
        if mask.move_mask() == 0 {
            return None;
        }

        let hu = t.mul_add(d_ku, o_ku);
        let hv = t.mul_add(d_kv, o_kv);

        let lambda = self.b_u.mul_add(hu, self.b_v.mul_add(hv, self.b_d));
        mask = mask & lambda.cmp_gt(zero);
        if mask.move_mask() == 0 {
            return None;
        }

        let mue = self.c_u.mul_add(hu, self.c_v.mul_add(hv, self.c_d));
        mask = mask & mue.cmp_gt(zero);
        if mask.move_mask() == 0 {
            return None;
        }

        mask = mask & (lambda + mue).cmp_lt(one);
        if mask.move_mask() == 0 {
            return None;
        }

        let t_lanes = t.to_array();
        let lambda_lanes = lambda.to_array();
        let mue_lanes = mue.to_array();
        let mask_lanes = mask.to_array();

        let mut winner = None;
        for lane in 0..8 {
            if mask_lanes[lane].to_bits() != 0 && t_lanes[lane] < hit.t {
                hit.t = t_lanes[lane];
                hit.u = lambda_lanes[lane];
                hit.v = mue_lanes[lane];
                winner = Some(lane);
            }
        }
        winner
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use math::hcm::{point3, vec3, Point3};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_point(rng: &mut SmallRng) -> Point3 {
        point3(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>())
    }

    #[test]
    fn agrees_with_scalar_sweep() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _round in 0..50 {
            let accels: Vec<TriAccel> = (0..8)
                .filter_map(|i| {
                    TriAccel::project(
                        random_point(&mut rng),
                        random_point(&mut rng),
                        random_point(&mut rng),
                        i,
                        0,
                    )
                })
                .collect();
            if accels.is_empty() {
                continue;
            }
            let pack = TriAccel8::pack(&accels);

            for _ in 0..40 {
                let ray = Ray::new(
                    point3(rng.gen::<f32>(), rng.gen::<f32>(), 2.0 + rng.gen::<f32>()),
                    (vec3(
                        rng.gen::<f32>() - 0.5,
                        rng.gen::<f32>() - 0.5,
                        -1.0,
                    ))
                    .hat(),
                );

                let mut scalar_hit = TriHit::none_before(f32::INFINITY);
                let mut scalar_winner = None;
                for (i, accel) in accels.iter().enumerate() {
                    if accel.intersect(&ray, &mut scalar_hit) {
                        scalar_winner = Some(i);
                    }
                }

                let mut pack_hit = TriHit::none_before(f32::INFINITY);
                let pack_winner = pack.intersect(&ray, &mut pack_hit);

                assert_eq!(scalar_winner, pack_winner);
                if scalar_winner.is_some() {
                    assert!((scalar_hit.t - pack_hit.t).abs() < 1e-4);
                    assert!((scalar_hit.u - pack_hit.u).abs() < 1e-4);
                    assert!((scalar_hit.v - pack_hit.v).abs() < 1e-4);
                }
            }
        }
    }

    #[test]
    fn padded_lanes_never_win() {
        // A single valid triangle in the pack; the seven padded lanes must not produce hits.
        let accel = TriAccel::project(
            point3(-1.0, -1.0, 0.0),
            point3(3.0, -1.0, 0.0),
            point3(-1.0, 3.0, 0.0),
            0,
            0,
        )
        .unwrap();
        let pack = TriAccel8::pack(std::slice::from_ref(&accel));

        let ray = Ray::new(point3(0.0, 0.0, 2.0), vec3(0.0, 0.0, -1.0));
        let mut hit = TriHit::none_before(f32::INFINITY);
        assert_eq!(pack.intersect(&ray, &mut hit), Some(0));
        assert!((hit.t - 2.0).abs() < 1e-6);

        let miss = Ray::new(point3(10.0, 10.0, 2.0), vec3(0.0, 0.0, -1.0));
        let mut hit = TriHit::none_before(f32::INFINITY);
        assert_eq!(pack.intersect(&miss, &mut hit), None);
    }
}
