// src/stft/dct.rs
//! Orthonormal DCT-II from log Mel energies to cepstra, with optional
//! sinusoidal liftering.

use super::config::{Q7, Q9};
use super::try_vec;
use crate::common::StftError;
use crate::fixed::Q15;
use crate::fixed::math::{q_shift_rnd, sat_i16, sat_i32};
use alloc::vec::Vec;
use core::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct Dct {
    /// `num_out` rows of `num_in` Q1.15 coefficients.
    matrix: Vec<Q15>,
    num_in: usize,
    num_out: usize,
    /// Q7.9 gain per output, empty when liftering is off.
    lifter: Vec<Q9>,
}

impl Dct {
    /// `D[k][m] = s_k · cos(πk(m + 0.5)/M)` with `s_0 = √(1/M)` and
    /// `s_k = √(2/M)`, keeping the first `num_out` rows.
    pub fn new(num_in: usize, num_out: usize, lifter: Q9) -> Result<Self, StftError> {
        if num_in == 0 || num_out == 0 || num_out > num_in {
            return Err(StftError::InvalidConfig("dct size"));
        }

        let m = num_in as f64;
        let mut matrix = try_vec(num_in * num_out, Q15::ZERO)?;
        for (k, row) in matrix.chunks_exact_mut(num_in).enumerate() {
            let scale = if k == 0 { libm::sqrt(1.0 / m) } else { libm::sqrt(2.0 / m) };
            for (i, d) in row.iter_mut().enumerate() {
                *d = Q15::from_f64(scale * libm::cos(PI * k as f64 * (i as f64 + 0.5) / m));
            }
        }

        let lifter = if lifter.to_bits() > 0 {
            let l = lifter.to_f64();
            let mut gains = try_vec(num_out, Q9::ZERO)?;
            for (k, g) in gains.iter_mut().enumerate() {
                *g = Q9::from_f64(1.0 + 0.5 * l * libm::sin(PI * k as f64 / l));
            }
            gains
        } else {
            Vec::new()
        };

        Ok(Self { matrix, num_in, num_out, lifter })
    }

    pub fn num_in(&self) -> usize {
        self.num_in
    }

    pub fn num_out(&self) -> usize {
        self.num_out
    }

    /// Lifter gains, empty when disabled.
    pub fn lifter(&self) -> &[Q9] {
        &self.lifter
    }

    pub fn apply(&self, mel: &[Q7], ceps: &mut [Q7]) {
        for (k, (row, c)) in self.matrix.chunks_exact(self.num_in).zip(ceps.iter_mut()).enumerate() {
            // Q8.7 · Q1.15 -> Q22
            let acc: i64 = row
                .iter()
                .zip(mel.iter())
                .map(|(d, x)| d.to_bits() as i64 * x.to_bits() as i64)
                .sum();
            let mut y = sat_i32(q_shift_rnd(acc, 22, 7));
            if let Some(g) = self.lifter.get(k) {
                y = sat_i32(q_shift_rnd(y as i64 * g.to_bits() as i64, 16, 7));
            }
            *c = Q7::from_bits(sat_i16(y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input_lands_in_c0() {
        let dct = Dct::new(23, 13, Q9::ZERO).unwrap();
        assert!(dct.lifter().is_empty());
        let mel = [Q7::from_bits(128); 23];
        let mut ceps = [Q7::ZERO; 13];
        dct.apply(&mel, &mut ceps);

        // 1.0 · √23
        assert!((ceps[0].to_bits() - 614).abs() <= 1, "{:?}", ceps[0]);
        for c in &ceps[1..] {
            assert!(c.to_bits().abs() <= 1, "{:?}", c);
        }
    }

    #[test]
    fn test_rows_are_orthonormal() {
        let dct = Dct::new(8, 8, Q9::ZERO).unwrap();
        let rows: std::vec::Vec<&[Q15]> = dct.matrix.chunks_exact(8).collect();
        for a in 0..8 {
            for b in 0..8 {
                let dot: f64 = rows[a].iter().zip(rows[b].iter()).map(|(x, y)| x.to_f64() * y.to_f64()).sum();
                let expect = if a == b { 1.0 } else { 0.0 };
                assert!(libm::fabs(dot - expect) < 1e-3, "rows {} {}: {}", a, b, dot);
            }
        }
    }

    #[test]
    fn test_lifter_gains() {
        let dct = Dct::new(23, 13, Q9::from_bits(22 << 9)).unwrap();
        let lifter = dct.lifter();
        assert_eq!(lifter.len(), 13);
        assert_eq!(lifter[0], Q9::from_bits(512));
        assert_eq!(lifter[11], Q9::from_bits(12 << 9));

        // c0 untouched, c1 scaled by 1 + 11·sin(π/22)
        let mut mel = [Q7::ZERO; 23];
        mel[0] = Q7::from_bits(1 << 10);
        let plain = Dct::new(23, 13, Q9::ZERO).unwrap();
        let mut a = [Q7::ZERO; 13];
        let mut b = [Q7::ZERO; 13];
        plain.apply(&mel, &mut a);
        dct.apply(&mel, &mut b);
        assert_eq!(a[0], b[0]);
        let gain = lifter[1].to_f64();
        let expect = a[1].to_bits() as f64 * gain;
        assert!(libm::fabs(b[1].to_bits() as f64 - expect) <= 1.0);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        assert!(Dct::new(0, 0, Q9::ZERO).is_err());
        assert!(Dct::new(4, 5, Q9::ZERO).is_err());
    }
}
