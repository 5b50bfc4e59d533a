//! Gradient noise primitives: simplex-style 2-D/3-D noise, fractal
//! Brownian motion, and ridge noise.
//!
//! **Seed-based determinism:** the permutation table is built once per seed
//! by shuffling `0..=255` with a seeded RNG and duplicating the table, so
//! the same seed always produces the same value at every world coordinate,
//! regardless of chunk load order. One instance per distinct seed is shared
//! immutably across chunks.

use rand::prelude::*;

/// Permutation-table simplex noise.
pub struct SimplexNoise {
    perm: [u8; 512],
}

impl SimplexNoise {
    pub fn new(seed: u32) -> Self {
        let mut noise = Self { perm: [0; 512] };
        noise.reseed(seed);
        noise
    }

    /// Rebuild the permutation table for a new seed.
    pub fn reseed(&mut self, seed: u32) {
        let mut p: Vec<u8> = (0..=255).collect();
        let mut rng = StdRng::seed_from_u64(seed as u64);
        p.shuffle(&mut rng);

        // Duplicate the 256 half for overflow-free hashing
        for i in 0..256 {
            self.perm[i] = p[i];
            self.perm[256 + i] = p[i];
        }
    }

    #[inline]
    fn grad2(hash: u8, x: f32, y: f32) -> f32 {
        let h = hash & 7;
        let u = if h < 4 { x } else { y };
        let v = if h < 4 { y } else { x };
        let u = if h & 1 != 0 { -u } else { u };
        let v = if h & 2 != 0 { -2.0 * v } else { 2.0 * v };
        u + v
    }

    #[inline]
    fn grad3(hash: u8, x: f32, y: f32, z: f32) -> f32 {
        let h = hash & 15;
        let u = if h < 8 { x } else { y };
        let v = if h < 4 {
            y
        } else if h == 12 || h == 14 {
            x
        } else {
            z
        };
        let u = if h & 1 != 0 { -u } else { u };
        let v = if h & 2 != 0 { -v } else { v };
        u + v
    }

    #[inline]
    fn hash(&self, i: usize) -> u8 {
        self.perm[i]
    }

    /// 2-D noise in `[-1, 1]`.
    pub fn noise2(&self, x: f32, y: f32) -> f32 {
        // Skew factors for 2D
        let f2 = 0.5 * (3.0f32.sqrt() - 1.0);
        let g2 = (3.0 - 3.0f32.sqrt()) / 6.0;

        let s = (x + y) * f2;
        let i = (x + s).floor() as i32;
        let j = (y + s).floor() as i32;

        let t = (i + j) as f32 * g2;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + g2;
        let y1 = y0 - j1 as f32 + g2;
        let x2 = x0 - 1.0 + 2.0 * g2;
        let y2 = y0 - 1.0 + 2.0 * g2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;

        let mut total = 0.0;

        let t0 = 0.5 - x0 * x0 - y0 * y0;
        if t0 > 0.0 {
            let t0 = t0 * t0;
            let h = self.hash(ii + self.hash(jj) as usize);
            total += t0 * t0 * Self::grad2(h, x0, y0);
        }

        let t1 = 0.5 - x1 * x1 - y1 * y1;
        if t1 > 0.0 {
            let t1 = t1 * t1;
            let h = self.hash(ii + i1 + self.hash(jj + j1) as usize);
            total += t1 * t1 * Self::grad2(h, x1, y1);
        }

        let t2 = 0.5 - x2 * x2 - y2 * y2;
        if t2 > 0.0 {
            let t2 = t2 * t2;
            let h = self.hash(ii + 1 + self.hash(jj + 1) as usize);
            total += t2 * t2 * Self::grad2(h, x2, y2);
        }

        70.0 * total
    }

    /// 3-D noise in `[-1, 1]`.
    pub fn noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        // Skew factors for 3D
        let f3 = 1.0 / 3.0;
        let g3 = 1.0 / 6.0;

        let s = (x + y + z) * f3;
        let i = (x + s).floor() as i32;
        let j = (y + s).floor() as i32;
        let k = (z + s).floor() as i32;

        let t = (i + j + k) as f32 * g3;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);
        let z0 = z - (k as f32 - t);

        // Rank the simplex corner offsets
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f32 + g3;
        let y1 = y0 - j1 as f32 + g3;
        let z1 = z0 - k1 as f32 + g3;
        let x2 = x0 - i2 as f32 + 2.0 * g3;
        let y2 = y0 - j2 as f32 + 2.0 * g3;
        let z2 = z0 - k2 as f32 + 2.0 * g3;
        let x3 = x0 - 1.0 + 3.0 * g3;
        let y3 = y0 - 1.0 + 3.0 * g3;
        let z3 = z0 - 1.0 + 3.0 * g3;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let kk = (k & 255) as usize;

        let mut total = 0.0;

        let corners = [
            (x0, y0, z0, 0usize, 0usize, 0usize),
            (x1, y1, z1, i1, j1, k1),
            (x2, y2, z2, i2, j2, k2),
            (x3, y3, z3, 1, 1, 1),
        ];

        for (cx, cy, cz, di, dj, dk) in corners {
            let t = 0.6 - cx * cx - cy * cy - cz * cz;
            if t > 0.0 {
                let t = t * t;
                let h = self.hash(
                    ii + di + self.hash(jj + dj + self.hash(kk + dk) as usize) as usize,
                );
                total += t * t * Self::grad3(h, cx, cy, cz);
            }
        }

        32.0 * total
    }

    /// Fractal Brownian motion over 2-D noise. Octave amplitudes follow
    /// `persistence^i` and frequencies `lacunarity^i`; the sum is divided
    /// by the total amplitude so output stays in `[-1, 1]`.
    pub fn fbm2(&self, x: f32, y: f32, octaves: u32, persistence: f32, lacunarity: f32) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.noise2(x * frequency, y * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_value
    }

    /// Fractal Brownian motion over 3-D noise.
    pub fn fbm3(
        &self,
        x: f32,
        y: f32,
        z: f32,
        octaves: u32,
        persistence: f32,
        lacunarity: f32,
    ) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.noise3(x * frequency, y * frequency, z * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_value
    }

    /// Ridge noise: `(1 - |n|)^2` summed over octaves. Produces sharp
    /// crest lines for mountain ranges, output in `[0, 1]`.
    pub fn ridge(&self, x: f32, y: f32, octaves: u32, persistence: f32, lacunarity: f32) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            let n = self.noise2(x * frequency, y * frequency);
            let n = 1.0 - n.abs();
            total += n * n * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Same seed must produce identical samples (replayability).
    #[test]
    fn noise_deterministic_same_seed() {
        let a = SimplexNoise::new(98765);
        let b = SimplexNoise::new(98765);
        for i in 0..200 {
            let x = i as f32 * 0.173;
            let z = i as f32 * -0.091;
            assert_eq!(a.noise2(x, z), b.noise2(x, z));
            assert_eq!(a.noise3(x, z, 0.5), b.noise3(x, z, 0.5));
        }
    }

    /// Different seeds must produce different fields.
    #[test]
    fn noise_different_seed_differs() {
        let a = SimplexNoise::new(1);
        let b = SimplexNoise::new(2);
        let mut any_diff = false;
        for i in 0..64 {
            let x = i as f32 * 0.37;
            if a.noise2(x, 1.5) != b.noise2(x, 1.5) {
                any_diff = true;
                break;
            }
        }
        assert!(any_diff);
    }

    /// Raw noise stays within [-1, 1].
    #[test]
    fn noise_output_in_range() {
        let n = SimplexNoise::new(42);
        for i in 0..500 {
            let x = (i % 37) as f32 * 0.631 - 9.0;
            let z = (i / 37) as f32 * 0.287 - 3.0;
            let v = n.noise2(x, z);
            assert!((-1.0..=1.0).contains(&v), "noise2({x}, {z}) = {v}");
        }
    }

    /// FBM normalizes by total amplitude so octave sums cannot blow up.
    #[test]
    fn fbm_output_in_range() {
        let n = SimplexNoise::new(7);
        for i in 0..200 {
            let x = i as f32 * 0.513;
            let v = n.fbm2(x, -x * 0.7, 6, 0.5, 2.0);
            assert!((-1.0..=1.0).contains(&v), "fbm2 out of range: {v}");
        }
    }

    /// Ridge noise is non-negative and bounded by 1.
    #[test]
    fn ridge_output_in_range() {
        let n = SimplexNoise::new(1234);
        for i in 0..200 {
            let x = i as f32 * 0.219;
            let v = n.ridge(x, x * 0.3, 3, 0.5, 2.0);
            assert!((0.0..=1.0).contains(&v), "ridge out of range: {v}");
        }
    }
}
