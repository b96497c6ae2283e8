// src/fixed/core.rs

use super::math::{sat_i16, sat_i32};
use super::types::{ComplexFixed, ComplexFixed16, ComplexQ15, ComplexQ31, Fixed, Fixed16};
use core::f64::consts::PI;
use core::fmt::Debug;
use core::ops::{Add, Mul, Sub};

/// Largest supported power-of-two transform.
pub const FFT_SIZE_MAX: usize = 1024;

/// Number of entries in the shared twiddle table, exp(-2πik/FFT_SIZE_MAX) for k < N/2.
pub const TWIDDLE_TABLE_SIZE: usize = FFT_SIZE_MAX / 2;

/// A complex word the radix-2 core can transform.
///
/// Add and subtract wrap; multiply truncates the double-width product back
/// to the word's own format. Twiddles are stored in the same word format.
pub trait FftWord:
    Copy + Default + PartialEq + Debug + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self>
{
    /// Word width in bits of each part.
    const BITS: u32;

    fn from_twiddle(cos: f64, sin: f64) -> Self;

    /// Conjugate with saturating negation.
    fn conj(self) -> Self;

    /// n > 0: saturating left shift, n < 0: arithmetic right shift.
    fn shift(self, n: i32) -> Self;

    /// Real-valued word from a Q1.15 PCM sample.
    fn from_q15(x: i16) -> Self;

    /// Widens (or rounds down) to Q1.31.
    fn to_q31(self) -> ComplexQ31;

    fn from_q31(c: ComplexQ31) -> Self;

    /// Multiplies the real part by a Q1.15 window coefficient with an
    /// additional normalization shift `s`: `(((x·w) >> (14 − s)) + 1) >> 1`.
    fn window(self, coef: i16, s: i32) -> Self;
}

/// Window product shared by all word widths.
#[inline]
pub(crate) fn window_product(x: i64, w: i16, s: i32) -> i64 {
    let p = x * w as i64;
    let t = 14 - s;
    let p = if t >= 0 { p >> t } else { p << -t };
    (p + 1) >> 1
}

impl FftWord for ComplexQ31 {
    const BITS: u32 = 32;

    #[inline]
    fn from_twiddle(cos: f64, sin: f64) -> Self {
        ComplexFixed::new(Fixed::from_f64(cos), Fixed::from_f64(sin))
    }

    #[inline]
    fn conj(self) -> Self {
        ComplexFixed::conj(self)
    }

    #[inline]
    fn shift(self, n: i32) -> Self {
        ComplexFixed::shift(self, n)
    }

    #[inline]
    fn from_q15(x: i16) -> Self {
        ComplexFixed::from_bits((x as i32) << 16, 0)
    }

    #[inline]
    fn to_q31(self) -> ComplexQ31 {
        self
    }

    #[inline]
    fn from_q31(c: ComplexQ31) -> Self {
        c
    }

    #[inline]
    fn window(self, coef: i16, s: i32) -> Self {
        let re = window_product(self.re.to_bits() as i64, coef, s);
        ComplexFixed::new(Fixed::from_bits(sat_i32(re)), self.im)
    }
}

impl FftWord for ComplexQ15 {
    const BITS: u32 = 16;

    #[inline]
    fn from_twiddle(cos: f64, sin: f64) -> Self {
        ComplexFixed16::new(Fixed16::from_f64(cos), Fixed16::from_f64(sin))
    }

    #[inline]
    fn conj(self) -> Self {
        ComplexFixed16::conj(self)
    }

    #[inline]
    fn shift(self, n: i32) -> Self {
        ComplexFixed16::shift(self, n)
    }

    #[inline]
    fn from_q15(x: i16) -> Self {
        ComplexFixed16::from_bits(x, 0)
    }

    #[inline]
    fn to_q31(self) -> ComplexQ31 {
        ComplexFixed::from_bits((self.re.to_bits() as i32) << 16, (self.im.to_bits() as i32) << 16)
    }

    #[inline]
    fn from_q31(c: ComplexQ31) -> Self {
        let round = |x: i32| sat_i16(sat_i32(((x as i64 >> 15) + 1) >> 1));
        ComplexFixed16::from_bits(round(c.re.to_bits()), round(c.im.to_bits()))
    }

    #[inline]
    fn window(self, coef: i16, s: i32) -> Self {
        let re = window_product(self.re.to_bits() as i64, coef, s);
        ComplexFixed16::new(Fixed16::from_bits(sat_i16(sat_i32(re))), self.im)
    }
}

/// Computes the shared twiddle table exp(-2πik/FFT_SIZE_MAX), k < FFT_SIZE_MAX/2.
/// A stage with group size m reads it at stride FFT_SIZE_MAX/m.
pub(crate) fn precompute_twiddles<W: FftWord>(twiddles: &mut [W]) {
    for (k, w) in twiddles.iter_mut().enumerate() {
        let angle = -2.0 * PI * (k as f64) / (FFT_SIZE_MAX as f64);
        *w = W::from_twiddle(libm::cos(angle), libm::sin(angle));
    }
}

/// Fills the bit-reversal table: rev[i] = (rev[i >> 1] >> 1) | ((i & 1) << (log2n - 1)).
pub(crate) fn precompute_bitrev(bitrev: &mut [u16], log2n: u32) {
    let n = 1usize << log2n;
    bitrev[0] = 0;
    for i in 1..n {
        bitrev[i] = (bitrev[i >> 1] >> 1) | (((i & 1) as u16) << (log2n - 1));
    }
}

/// Radix-2 decimation-in-time FFT, out of place.
///
/// The input is shifted right by `log2n` while being permuted into `output`,
/// which gives the butterfly stages their headroom; the forward result is
/// therefore X[k]/N. For an inverse transform the input is conjugated in
/// place first, and the output is shifted back up and conjugated again.
pub(crate) fn radix_2_dit_fft_core<W: FftWord>(
    input: &mut [W],
    output: &mut [W],
    twiddles: &[W],
    bitrev: &[u16],
    log2n: u32,
    inverse: bool,
) {
    let n = 1usize << log2n;
    let shift = log2n as i32;

    // 1. Conjugate for the inverse direction
    if inverse {
        for x in input[..n].iter_mut() {
            *x = x.conj();
        }
    }

    // 2. Bit-reverse permutation with headroom shift
    for (i, x) in input[..n].iter().enumerate() {
        output[bitrev[i] as usize] = x.shift(-shift);
    }

    // 3. Butterfly stages
    for depth in 1..=log2n {
        let m = 1usize << depth;
        let half = m >> 1;
        let tw_stride = FFT_SIZE_MAX / m;

        for k in (0..n).step_by(m) {
            for j in 0..half {
                let w = twiddles[tw_stride * j];
                let top = output[k + j];
                let t = output[k + j + half] * w;
                output[k + j] = top + t;
                output[k + j + half] = top - t;
            }
        }
    }

    // 4. Restore scale and undo the conjugation
    if inverse {
        for x in output[..n].iter_mut() {
            *x = x.shift(shift).conj();
        }
    }
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;
