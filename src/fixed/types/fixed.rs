// src/fixed/types/fixed.rs
/// Generic fixed-point structure based on the number of fractional bits (FRAC).
/// The internal value is stored as a signed 32-bit integer, so `Fixed<31>` is
/// Q1.31, `Fixed<30>` is Q2.30 and `Fixed<29>` is Q3.29.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[repr(transparent)]
pub struct Fixed<const FRAC: u32>(i32);

/// Q1.31 fractional value.
pub type Q31 = Fixed<31>;
/// Q2.30 value, used for magnitudes and square roots.
pub type Q30 = Fixed<30>;
/// Q3.29 value, used for phase angles in radians.
pub type Q29 = Fixed<29>;

impl<const FRAC: u32> Fixed<FRAC> {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(i32::MIN);

    /// Creates a Fixed from the raw integer value (without shift).
    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Creates a Fixed from an integer, applying the necessary shift.
    /// E.g.: Fixed::<8>::from_int(1) will result in internal value 256.
    #[inline]
    pub fn from_int(value: i32) -> Self {
        Self(super::super::math::sat_i32((value as i64) << FRAC))
    }

    /// Converts an f64 to Fixed with rounding and saturation.
    /// Used for tables built at setup time (twiddles, windows, filterbanks).
    pub fn from_f64(value: f64) -> Self {
        let scaling_factor = (1u64 << FRAC) as f64;
        let scaled = libm::round(value * scaling_factor);
        let bits = if scaled >= i32::MAX as f64 {
            i32::MAX
        } else if scaled <= i32::MIN as f64 {
            i32::MIN
        } else {
            scaled as i32
        };
        Self::from_bits(bits)
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u64 << FRAC) as f64
    }

    /// Returns the stored raw value.
    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Saturating negation, -1.0 maps to the largest positive value.
    #[inline]
    pub fn saturating_neg(self) -> Self {
        Self(self.0.saturating_neg())
    }

    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Shifts by `n` bits: left with saturation for n > 0, arithmetic right otherwise.
    #[inline]
    pub fn shift(self, n: i32) -> Self {
        if n > 0 {
            Self(super::super::math::sat_i32((self.0 as i64) << n))
        } else {
            Self(self.0 >> -n)
        }
    }

    /// Multiplies by an integer with saturation.
    #[inline]
    pub fn saturating_mul_int(self, k: i32) -> Self {
        Self(super::super::math::sat_i32(self.0 as i64 * k as i64))
    }
}

impl<const FRAC: u32> Fixed<FRAC> {
    /// Changes the number of fractional bits, rounding when bits are dropped
    /// and saturating when bits are added.
    #[inline]
    pub fn convert<const TO_FRAC: u32>(self) -> Fixed<TO_FRAC> {
        if TO_FRAC > FRAC {
            Fixed::from_bits(super::super::math::sat_i32((self.0 as i64) << (TO_FRAC - FRAC)))
        } else if TO_FRAC < FRAC {
            Fixed::from_bits(super::super::math::q_shift_rnd(self.0 as i64, FRAC, TO_FRAC) as i32)
        } else {
            Fixed::from_bits(self.0)
        }
    }
}

use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

// Plain add/sub wrap like the two's complement hardware they model; the
// callers guarantee headroom. Use saturating_add/sub where they don't.
impl<const FRAC: u32> Add for Fixed<FRAC> {
    type Output = Fixed<FRAC>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl<const FRAC: u32> AddAssign for Fixed<FRAC> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl<const FRAC: u32> Sub for Fixed<FRAC> {
    type Output = Fixed<FRAC>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl<const FRAC: u32> SubAssign for Fixed<FRAC> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl<const FRAC: u32> Neg for Fixed<FRAC> {
    type Output = Fixed<FRAC>;

    #[inline]
    fn neg(self) -> Self::Output {
        self.saturating_neg()
    }
}

// Multiplication: Fixed<F1> * Fixed<F2> -> Fixed<F1>, rounded and saturated.
impl<const F1: u32, const F2: u32> Mul<Fixed<F2>> for Fixed<F1> {
    type Output = Fixed<F1>;

    #[inline]
    fn mul(self, rhs: Fixed<F2>) -> Self::Output {
        let product = self.0 as i64 * rhs.0 as i64;

        // If F2 > 0, add 2^(F2-1) for rounding
        let rounded = if F2 > 0 {
            let offset = 1i64 << (F2 - 1);
            (product + offset) >> F2
        } else {
            product
        };

        Fixed::from_bits(super::super::math::sat_i32(rounded))
    }
}

impl<const F1: u32, const F2: u32> MulAssign<Fixed<F2>> for Fixed<F1> {
    #[inline]
    fn mul_assign(&mut self, rhs: Fixed<F2>) {
        *self = *self * rhs;
    }
}

use core::fmt;

impl<const FRAC: u32> fmt::Display for Fixed<FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.to_f64())
    }
}

impl<const FRAC: u32> fmt::Debug for Fixed<FRAC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // In Debug, show both the decimal value and the raw value in parentheses
        write!(f, "{:.6} (raw: {})", self.to_f64(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_sum_same_scale() {
        let a = Fixed::<23>::from_int(10);
        let b = Fixed::<23>::from_int(5);
        assert_eq!((a + b).to_bits(), Fixed::<23>::from_int(15).to_bits());
    }

    #[test]
    fn test_saturating_add_clamps() {
        let a = Q31::from_f64(0.75);
        assert_eq!(a.saturating_add(a), Q31::MAX);
        assert_eq!((-a).saturating_sub(a), Q31::MIN);
    }

    #[test]
    fn test_multiplication_with_rounding() {
        // 0.5 (Q31) * 0.5 (Q31) = 0.25
        let a = Q31::from_bits(1 << 30);
        let res = a * a;
        assert_eq!(res.to_bits(), 1 << 29);
    }

    #[test]
    fn test_mixed_precision_multiplication() {
        // 2.0 (Q16) * 0.5 (Q31) = 1.0 (Q16)
        let a = Fixed::<16>::from_int(2);
        let b = Q31::from_bits(1 << 30);
        assert_eq!(a * b, Fixed::<16>::from_int(1));
    }

    #[test]
    fn test_minus_one_squared_saturates() {
        let m = Q31::MIN;
        assert_eq!(m * m, Q31::MAX);
        assert_eq!(-m, Q31::MAX);
    }

    #[test]
    fn test_shift_saturates_left_and_floors_right() {
        let x = Q31::from_f64(0.3);
        assert_eq!(x.shift(2), Q31::MAX);
        assert_eq!(Q31::from_bits(-3).shift(-1).to_bits(), -2);
        assert_eq!(Q31::from_bits(1 << 20).shift(3).to_bits(), 1 << 23);
    }

    #[test]
    fn test_convert_rounds_down_and_saturates_up() {
        let x = Q31::from_f64(0.5);
        let q29: Q29 = x.convert();
        assert_eq!(q29.to_bits(), 1 << 28);
        let big = Q29::from_f64(3.0);
        assert_eq!(big.convert::<31>(), Q31::MAX);
    }

    #[test]
    fn test_debug_display() {
        let val = Fixed::<23>::from_bits(1 << 22); // 0.5
        assert_eq!(format!("{}", val), "0.500000");
        assert_eq!(format!("{:?}", val), "0.500000 (raw: 4194304)");
    }

    #[test]
    fn test_from_f64() {
        let val = Fixed::<23>::from_f64(0.5);
        assert_eq!(val.to_bits(), 1 << 22);

        // 1.0 is not representable in Q1.31
        assert_eq!(Q31::from_f64(1.0), Q31::MAX);
        assert_eq!(Q31::from_f64(-1.0), Q31::MIN);

        let neg = Fixed::<8>::from_f64(-2.5);
        assert_eq!(neg.to_bits(), -640);

        let rounded = Fixed::<16>::from_f64(1.0 / 3.0);
        assert!(libm::fabs(rounded.to_f64() - 1.0 / 3.0) < 0.0001);
    }
}
