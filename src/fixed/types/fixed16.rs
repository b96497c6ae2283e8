// src/fixed/types/fixed16.rs
/// 16-bit counterpart of [`Fixed`](super::Fixed): `Fixed16<15>` is Q1.15,
/// `Fixed16<7>` is Q8.7, `Fixed16<9>` is Q7.9.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[repr(transparent)]
pub struct Fixed16<const FRAC: u32>(i16);

/// Q1.15 fractional value, used for PCM16 samples and coefficient tables.
pub type Q15 = Fixed16<15>;

impl<const FRAC: u32> Fixed16<FRAC> {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(i16::MAX);
    pub const MIN: Self = Self(i16::MIN);

    #[inline]
    pub const fn from_bits(bits: i16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_bits(self) -> i16 {
        self.0
    }

    /// Converts an f64 to Fixed16 with rounding and saturation.
    pub fn from_f64(value: f64) -> Self {
        let scaled = libm::round(value * (1u32 << FRAC) as f64);
        Self(super::super::math::sat_i16(if scaled >= i32::MAX as f64 {
            i32::MAX
        } else if scaled <= i32::MIN as f64 {
            i32::MIN
        } else {
            scaled as i32
        }))
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u32 << FRAC) as f64
    }

    #[inline]
    pub fn saturating_neg(self) -> Self {
        Self(self.0.saturating_neg())
    }

    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Shifts by `n` bits: left with saturation for n > 0, arithmetic right otherwise.
    #[inline]
    pub fn shift(self, n: i32) -> Self {
        if n > 0 {
            Self(super::super::math::sat_i16((self.0 as i32) << n.min(16)))
        } else {
            Self(self.0 >> (-n).min(15))
        }
    }
}

use core::ops::{Add, Mul, Sub};

impl<const FRAC: u32> Add for Fixed16<FRAC> {
    type Output = Fixed16<FRAC>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Fixed16(self.0.wrapping_add(rhs.0))
    }
}

impl<const FRAC: u32> Sub for Fixed16<FRAC> {
    type Output = Fixed16<FRAC>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Fixed16(self.0.wrapping_sub(rhs.0))
    }
}

// Fixed16<F1> * Fixed16<F2> -> Fixed16<F1>, rounded and saturated.
impl<const F1: u32, const F2: u32> Mul<Fixed16<F2>> for Fixed16<F1> {
    type Output = Fixed16<F1>;

    #[inline]
    fn mul(self, rhs: Fixed16<F2>) -> Self::Output {
        let product = self.0 as i32 * rhs.0 as i32;
        let rounded = if F2 > 0 { (product + (1 << (F2 - 1))) >> F2 } else { product };
        Fixed16(super::super::math::sat_i16(rounded))
    }
}

use core::fmt;

impl<const FRAC: u32> fmt::Display for Fixed16<FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

impl<const FRAC: u32> fmt::Debug for Fixed16<FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} (raw: {})", self.to_f64(), self.0)
    }
}
