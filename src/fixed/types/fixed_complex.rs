use super::fixed::Fixed;
use super::fixed16::Fixed16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ComplexFixed<const FRAC: u32> {
    pub re: Fixed<FRAC>,
    pub im: Fixed<FRAC>,
}

/// Complex Q1.31 sample, the 32-bit FFT word.
pub type ComplexQ31 = ComplexFixed<31>;

impl<const FRAC: u32> ComplexFixed<FRAC> {
    pub const ZERO: Self = Self { re: Fixed::ZERO, im: Fixed::ZERO };

    pub const fn new(re: Fixed<FRAC>, im: Fixed<FRAC>) -> Self {
        Self { re, im }
    }

    pub const fn from_bits(re: i32, im: i32) -> Self {
        Self { re: Fixed::from_bits(re), im: Fixed::from_bits(im) }
    }

    /// Returns the complex conjugate (a - bi), saturating -1.0 to the largest positive value.
    #[inline]
    pub fn conj(self) -> Self {
        ComplexFixed { re: self.re, im: self.im.saturating_neg() }
    }

    /// Shifts both parts by `n` bits, n > 0: saturating left shift, n < 0: right shift.
    #[inline]
    pub fn shift(self, n: i32) -> Self {
        ComplexFixed { re: self.re.shift(n), im: self.im.shift(n) }
    }

    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        ComplexFixed { re: self.re.saturating_add(rhs.re), im: self.im.saturating_add(rhs.im) }
    }
}

use core::ops::{Add, AddAssign, Mul, Sub, SubAssign};

impl<const FRAC: u32> Add for ComplexFixed<FRAC> {
    type Output = ComplexFixed<FRAC>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        ComplexFixed { re: self.re + rhs.re, im: self.im + rhs.im }
    }
}

impl<const FRAC: u32> AddAssign for ComplexFixed<FRAC> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl<const FRAC: u32> Sub for ComplexFixed<FRAC> {
    type Output = ComplexFixed<FRAC>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        ComplexFixed { re: self.re - rhs.re, im: self.im - rhs.im }
    }
}

impl<const FRAC: u32> SubAssign for ComplexFixed<FRAC> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.re -= rhs.re;
        self.im -= rhs.im;
    }
}

// Multiplication: ComplexFixed<F1> * ComplexFixed<F2> -> ComplexFixed<F1>.
// Both sums are formed at full 64-bit width and truncated once, e.g.
// Q1.31 x Q1.31 -> Q2.62 >> 31 -> Q1.31.
impl<const F1: u32, const F2: u32> Mul<ComplexFixed<F2>> for ComplexFixed<F1> {
    type Output = ComplexFixed<F1>;

    #[inline]
    fn mul(self, rhs: ComplexFixed<F2>) -> Self::Output {
        let (a, b) = (self.re.to_bits() as i64, self.im.to_bits() as i64);
        let (c, d) = (rhs.re.to_bits() as i64, rhs.im.to_bits() as i64);
        // (ac - bd)
        let re = (a * c).wrapping_sub(b * d) >> F2;
        // (ad + bc)
        let im = (a * d).wrapping_add(b * c) >> F2;

        ComplexFixed::from_bits(super::super::math::sat_i32(re), super::super::math::sat_i32(im))
    }
}

impl<const FRAC: u32> From<ComplexFixed<FRAC>> for num_complex::Complex64 {
    fn from(c: ComplexFixed<FRAC>) -> Self {
        num_complex::Complex64::new(c.re.to_f64(), c.im.to_f64())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ComplexFixed16<const FRAC: u32> {
    pub re: Fixed16<FRAC>,
    pub im: Fixed16<FRAC>,
}

/// Complex Q1.15 sample, the 16-bit FFT word.
pub type ComplexQ15 = ComplexFixed16<15>;

impl<const FRAC: u32> ComplexFixed16<FRAC> {
    pub const ZERO: Self = Self { re: Fixed16::ZERO, im: Fixed16::ZERO };

    pub const fn new(re: Fixed16<FRAC>, im: Fixed16<FRAC>) -> Self {
        Self { re, im }
    }

    pub const fn from_bits(re: i16, im: i16) -> Self {
        Self { re: Fixed16::from_bits(re), im: Fixed16::from_bits(im) }
    }

    #[inline]
    pub fn conj(self) -> Self {
        ComplexFixed16 { re: self.re, im: self.im.saturating_neg() }
    }

    #[inline]
    pub fn shift(self, n: i32) -> Self {
        ComplexFixed16 { re: self.re.shift(n), im: self.im.shift(n) }
    }
}

impl<const FRAC: u32> Add for ComplexFixed16<FRAC> {
    type Output = ComplexFixed16<FRAC>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        ComplexFixed16 { re: self.re + rhs.re, im: self.im + rhs.im }
    }
}

impl<const FRAC: u32> Sub for ComplexFixed16<FRAC> {
    type Output = ComplexFixed16<FRAC>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        ComplexFixed16 { re: self.re - rhs.re, im: self.im - rhs.im }
    }
}

impl<const F1: u32, const F2: u32> Mul<ComplexFixed16<F2>> for ComplexFixed16<F1> {
    type Output = ComplexFixed16<F1>;

    #[inline]
    fn mul(self, rhs: ComplexFixed16<F2>) -> Self::Output {
        let (a, b) = (self.re.to_bits() as i64, self.im.to_bits() as i64);
        let (c, d) = (rhs.re.to_bits() as i64, rhs.im.to_bits() as i64);
        let re = (a * c - b * d) >> F2;
        let im = (a * d + b * c) >> F2;
        ComplexFixed16::from_bits(
            super::super::math::sat_i16(super::super::math::sat_i32(re)),
            super::super::math::sat_i16(super::super::math::sat_i32(im)),
        )
    }
}
