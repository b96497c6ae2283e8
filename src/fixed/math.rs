// src/fixed/math.rs
//! Integer kernels shared by the transforms and the stream processors:
//! saturation, rounding shifts, square root, CORDIC arc cosine and complex
//! exponential, and a fixed-point base-2 logarithm.

use super::types::{ComplexFixed, Fixed};

/// Saturates a 64-bit intermediate to i32.
#[inline]
pub fn sat_i32(x: i64) -> i32 {
    if x > i32::MAX as i64 {
        i32::MAX
    } else if x < i32::MIN as i64 {
        i32::MIN
    } else {
        x as i32
    }
}

/// Saturates a 32-bit intermediate to i16.
#[inline]
pub fn sat_i16(x: i32) -> i16 {
    if x > i16::MAX as i32 {
        i16::MAX
    } else if x < i16::MIN as i32 {
        i16::MIN
    } else {
        x as i16
    }
}

/// Drops `src - dst` fractional bits with round-half-up.
#[inline]
pub fn q_shift_rnd(x: i64, src: u32, dst: u32) -> i64 {
    if src <= dst {
        return x << (dst - src);
    }
    ((x >> (src - dst - 1)) + 1) >> 1
}

/// Rounding product of two Q values, dropping `shift` bits (`qa + qb - qy`).
#[inline]
pub fn q_mults_32x32(a: i64, b: i64, shift: u32) -> i64 {
    (((a * b) >> (shift - 1)) + 1) >> 1
}

/// Number of redundant sign bits, i.e. how far `x` can be shifted left
/// without overflow. Returns 31 for zero.
#[inline]
pub fn norm_i32(x: i32) -> i32 {
    ((x ^ (x >> 31)).leading_zeros() as i32) - 1
}

const SQRT_LUT: [u32; 32] = [
    268435456, 379625062, 464943848, 536870912, 600239927, 657529896, 710213460, 759250125,
    805306368, 848867446, 890299688, 929887697, 967857801, 1004393507, 1039646051, 1073741824,
    1106787739, 1138875187, 1170083026, 1200479854, 1230125796, 1259073893, 1287371222,
    1315059792, 1342177280, 1368757628, 1394831545, 1420426919, 1445569171, 1470281545,
    1494585366, 1518500250,
];

/// Square root of a Q2.30 value in `[0, 2)`, result in Q2.30.
///
/// The argument is normalised by an even power of two, seeded from a
/// 32-entry table and refined with three Newton iterations.
pub fn sqrt_q30(n: Fixed<30>) -> Fixed<30> {
    let n = n.to_bits();
    if n < 1 {
        return Fixed::ZERO;
    }

    let div_shift = (n.leading_zeros() - 1) >> 1;
    let n = (n as u32) << (div_shift << 1);
    let n_shifted = (n as u64) << 30;

    let mut x = SQRT_LUT[(n >> 26) as usize] as u64;
    for _ in 0..3 {
        x = ((n_shifted / x + x) + 1) >> 1;
    }

    Fixed::from_bits((x >> div_shift) as i32)
}

/// atan(2^-i) in Q3.29.
const CORDIC_ATAN: [i32; 31] = [
    421657428, 248918915, 131521918, 66762579, 33510843, 16771758, 8387925, 4194219, 2097141,
    1048575, 524288, 262144, 131072, 65536, 32768, 16384, 8192, 4096, 2048, 1024, 512, 256, 128,
    64, 32, 16, 8, 4, 2, 1, 0,
];

/// Inverse CORDIC gain in Q2.30.
const CORDIC_GAIN_INV: i64 = 652032874;

/// π in Q3.29.
pub const PI_Q29: i32 = 1686629713;
/// π/2 in Q3.29.
pub const HALF_PI_Q29: i32 = 843314857;

/// Angle of the vector (x, y) for y >= 0, in Q3.29. Inputs share any Q format.
fn cordic_atan2(x: i64, y: i64) -> i32 {
    let (mut x, mut y, mut z) = if x < 0 {
        // rotate by -π/2 so the vector lands in the right half plane
        (y, -x, HALF_PI_Q29 as i64)
    } else {
        (x, y, 0)
    };

    for (i, &a) in CORDIC_ATAN.iter().enumerate() {
        let (dx, dy) = (y >> i, x >> i);
        if y > 0 {
            x += dx;
            y -= dy;
            z += a as i64;
        } else {
            x -= dx;
            y += dy;
            z -= a as i64;
        }
    }

    sat_i32(z)
}

/// Arc cosine of a Q2.30 argument in `[-1, 1]`, result in Q3.29 `[0, π]`.
pub fn acos_q29(x: Fixed<30>) -> Fixed<29> {
    let one = 1i64 << 30;
    let x = (x.to_bits() as i64).clamp(-one, one);
    let sine_sq = one - ((x * x) >> 30);
    let sine = sqrt_q30(Fixed::from_bits(sat_i32(sine_sq))).to_bits() as i64;
    Fixed::from_bits(cordic_atan2(x, sine))
}

/// e^(i·θ) for θ in Q3.29, result (cos θ, sin θ) in Q2.30.
pub fn cmpx_exp(angle: Fixed<29>) -> ComplexFixed<30> {
    let mut z = angle.to_bits() as i64;
    let mut negate = false;

    // Reduce into [-π/2, π/2] where rotation mode converges.
    while z > HALF_PI_Q29 as i64 {
        z -= PI_Q29 as i64;
        negate = !negate;
    }
    while z < -(HALF_PI_Q29 as i64) {
        z += PI_Q29 as i64;
        negate = !negate;
    }

    let (mut x, mut y) = (CORDIC_GAIN_INV, 0i64);
    for (i, &a) in CORDIC_ATAN.iter().enumerate() {
        let (dx, dy) = (y >> i, x >> i);
        if z >= 0 {
            x -= dx;
            y += dy;
            z -= a as i64;
        } else {
            x += dx;
            y -= dy;
            z += a as i64;
        }
    }

    if negate {
        x = -x;
        y = -y;
    }
    ComplexFixed::from_bits(sat_i32(x), sat_i32(y))
}

/// Base-2 logarithm of an unsigned integer, Q16 result. Zero maps to `None`.
pub fn log2_q16(x: u128) -> Option<i32> {
    if x == 0 {
        return None;
    }
    let exponent = 127 - x.leading_zeros() as i32;

    // mantissa in [1, 2) as Q1.30
    let mut m = if exponent >= 30 {
        (x >> (exponent - 30)) as u64
    } else {
        (x << (30 - exponent)) as u64
    };

    let mut frac = 0i32;
    for bit in (0..16).rev() {
        m = (m * m) >> 30;
        if m >= 2 << 30 {
            m >>= 1;
            frac |= 1 << bit;
        }
    }

    Some((exponent << 16) | frac)
}
