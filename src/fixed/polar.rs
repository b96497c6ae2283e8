// src/fixed/polar.rs
//! Magnitude/phase bridge between a forward and an inverse transform.

use super::math::{acos_q29, cmpx_exp, q_mults_32x32, sat_i32, sqrt_q30};
use super::types::{ComplexQ31, Fixed, PolarFixed};

/// Converts one Q1.31 bin to polar form.
///
/// Magnitude is the square root of the Q2.62 power rounded to Q2.30; the
/// angle is acos(re / magnitude) with the sign of the imaginary part. A zero
/// bin maps to zero magnitude and zero angle.
pub fn complex_to_polar(c: ComplexQ31) -> PolarFixed {
    let (re, im) = (c.re.to_bits() as i64, c.im.to_bits() as i64);
    let squares_sum = (re * re) as u64 + (im * im) as u64;

    // Q2.62 -> Q2.30
    let power = sat_i32((((squares_sum >> 31) + 1) >> 1) as i64);
    let magnitude = sqrt_q30(Fixed::from_bits(power));
    if magnitude == Fixed::ZERO {
        return PolarFixed::ZERO;
    }

    let acos_arg = sat_i32((re << 29) / magnitude.to_bits() as i64);
    let angle = acos_q29(Fixed::from_bits(acos_arg));
    PolarFixed::new(magnitude, if im < 0 { -angle } else { angle })
}

/// Converts one polar value back to a Q1.31 bin, saturating.
pub fn polar_to_complex(p: PolarFixed) -> ComplexQ31 {
    let cexp = cmpx_exp(p.angle);
    let magnitude = p.magnitude.to_bits() as i64;
    // Q2.30 x Q2.30 -> Q1.31
    let re = q_mults_32x32(magnitude, cexp.re.to_bits() as i64, 29);
    let im = q_mults_32x32(magnitude, cexp.im.to_bits() as i64, 29);
    ComplexQ31::from_bits(sat_i32(re), sat_i32(im))
}

/// Converts as many bins as `polar` holds; callers pass the first `N/2 + 1`.
pub fn to_polar(spectrum: &[ComplexQ31], polar: &mut [PolarFixed]) {
    for (p, &c) in polar.iter_mut().zip(spectrum.iter()) {
        *p = complex_to_polar(c);
    }
}

pub fn to_complex(polar: &[PolarFixed], spectrum: &mut [ComplexQ31]) {
    for (c, &p) in spectrum.iter_mut().zip(polar.iter()) {
        *c = polar_to_complex(p);
    }
}

/// Rebuilds bins `N/2 + 1 .. N` of a real signal's spectrum by conjugate
/// mirroring of the lower half.
pub fn apply_symmetry(spectrum: &mut [ComplexQ31]) {
    let size = spectrum.len();
    for i in size / 2 + 1..size {
        spectrum[i] = spectrum[size - i].conj();
    }
}

#[cfg(test)]
#[path = "polar_tests.rs"]
mod tests;
