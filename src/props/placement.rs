// src/props/placement.rs
//! Jittered-grid placement over the terrain domain, deterministic per
//! (world seed, kind).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Clone, Copy, Debug)]
pub struct PlacementParams {
    /// Grid cell size in meters.
    pub cell: f32,
    /// Jitter fraction of a cell, 0..=0.5.
    pub jitter: f32,
    /// Absolute cap on generated placements.
    pub cap: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub z: f32,
    pub rot_y: f32,
    pub scale: f32,
}

fn rng_for(seed: u64, salt: u64) -> ChaCha8Rng {
    let mix = seed ^ (salt << 48) ^ 0x9E37_79B9_7F4A_7C15u64;
    ChaCha8Rng::seed_from_u64(mix)
}

/// Walk a cell grid over `[-half_extent, half_extent]^2`, jittering each
/// cell center and rolling a yaw and a mild scale per placement.
pub fn jittered_grid(
    seed: u64,
    salt: u64,
    half_extent: f32,
    params: &PlacementParams,
) -> Vec<Placement> {
    let cell = params.cell.max(0.0001);
    let jitter = params.jitter.clamp(0.0, 0.5);
    let extent = half_extent.max(0.0);

    let n = ((extent * 2.0) / cell).floor().max(1.0) as i32;
    let mut rng = rng_for(seed, salt);
    let mut out = Vec::with_capacity((n as usize) * (n as usize));

    'outer: for j in 0..n {
        for i in 0..n {
            if out.len() >= params.cap {
                break 'outer;
            }

            let cx = -extent + (i as f32 + 0.5) * cell;
            let cz = -extent + (j as f32 + 0.5) * cell;

            let jx = (rng.random::<f32>() - 0.5) * 2.0 * (jitter * cell);
            let jz = (rng.random::<f32>() - 0.5) * 2.0 * (jitter * cell);

            let x = (cx + jx).clamp(-extent, extent);
            let z = (cz + jz).clamp(-extent, extent);

            let rot_y = rng.random_range(0.0..std::f32::consts::TAU);
            let scale = rng.random_range(0.8..1.25);

            out.push(Placement { x, z, rot_y, scale });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: PlacementParams = PlacementParams {
        cell: 25.0,
        jitter: 0.4,
        cap: 4096,
    };

    #[test]
    fn identical_seeds_place_identically() {
        let a = jittered_grid(99, 1, 200.0, &PARAMS);
        let b = jittered_grid(99, 1, 200.0, &PARAMS);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn seed_and_salt_both_reshuffle() {
        let base = jittered_grid(99, 1, 200.0, &PARAMS);
        let other_seed = jittered_grid(100, 1, 200.0, &PARAMS);
        let other_salt = jittered_grid(99, 2, 200.0, &PARAMS);
        assert_ne!(base, other_seed);
        assert_ne!(base, other_salt);
    }

    #[test]
    fn placements_stay_inside_the_domain() {
        let placements = jittered_grid(7, 3, 150.0, &PARAMS);
        for p in &placements {
            assert!(p.x.abs() <= 150.0);
            assert!(p.z.abs() <= 150.0);
            assert!((0.8..1.25).contains(&p.scale));
        }
    }

    #[test]
    fn the_cap_bounds_the_population() {
        let params = PlacementParams {
            cell: 1.0,
            jitter: 0.2,
            cap: 10,
        };
        let placements = jittered_grid(7, 3, 100.0, &params);
        assert_eq!(placements.len(), 10);
    }
}
