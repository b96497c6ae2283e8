// src/stft/window.rs
//! Q1.15 analysis windows and the matching synthesis window for overlap-add.

use super::config::WindowType;
use super::try_vec;
use crate::common::StftError;
use crate::fixed::Q15;
use alloc::vec::Vec;
use core::f64::consts::PI;

const POVEY_EXPONENT: f64 = 0.85;

/// Largest gain the synthesis window may carry, as a power of two.
const MAX_SYNTHESIS_SHIFT: i32 = 14;

fn to_q15(x: f64) -> i16 {
    Q15::from_f64(x).to_bits()
}

/// Symmetric window of `length` points in Q1.15, raw words.
///
/// Hamming uses the 0.54/0.46 pair, Povey is the Hann window raised to 0.85
/// and Blackman takes its `a0` coefficient from the configuration.
pub fn analysis_window(kind: WindowType, length: usize, blackman_a0: Q15) -> Result<Vec<i16>, StftError> {
    let mut w = try_vec(length, i16::MAX)?;
    if length < 2 || kind == WindowType::Rectangular {
        return Ok(w);
    }

    let a = 2.0 * PI / (length - 1) as f64;
    let a0 = blackman_a0.to_f64();
    for (n, x) in w.iter_mut().enumerate() {
        let c = libm::cos(a * n as f64);
        let v = match kind {
            WindowType::Rectangular => 1.0,
            WindowType::Blackman => a0 - 0.5 * c + (0.5 - a0) * libm::cos(2.0 * a * n as f64),
            WindowType::Hamming => 0.54 - 0.46 * c,
            WindowType::Hann => 0.5 - 0.5 * c,
            WindowType::Povey => libm::pow(0.5 - 0.5 * c, POVEY_EXPONENT),
        };
        *x = to_q15(v.max(0.0));
    }
    Ok(w)
}

/// Synthesis window stored as `coefs · 2^shift`.
#[derive(Clone, Debug)]
pub struct SynthesisWindow {
    pub coefs: Vec<i16>,
    /// Left shift applied together with the Q1.15 coefficients.
    pub shift: i32,
}

impl SynthesisWindow {
    /// Dual of `analysis` for hop size `hop`:
    /// `ws[n] = w[n] / Σ_k w²(n mod hop + k·hop)`.
    ///
    /// With it the windowed frames of a constant signal add back up to the
    /// constant once every position is covered by all of its frames.
    /// Positions whose denominator vanishes get a zero coefficient.
    pub fn dual(analysis: &[i16], hop: usize) -> Result<Self, StftError> {
        if hop == 0 || hop > analysis.len() {
            return Err(StftError::InvalidConfig("hop size"));
        }
        let w: Vec<f64> = analysis.iter().map(|&x| x as f64 / 32768.0).collect();

        let mut ws = try_vec(analysis.len(), 0.0f64)?;
        for (n, y) in ws.iter_mut().enumerate() {
            let den: f64 = w[n % hop..].iter().step_by(hop).map(|&v| v * v).sum();
            *y = if den < 1e-9 { 0.0 } else { w[n] / den };
        }

        let peak = ws.iter().fold(0.0f64, |m, &v| m.max(v));
        let mut shift = 0;
        while peak / (1u64 << shift) as f64 >= 32767.0 / 32768.0 {
            shift += 1;
            if shift > MAX_SYNTHESIS_SHIFT {
                return Err(StftError::InvalidConfig("window cannot be inverted at this hop"));
            }
        }
        let scale = (1u64 << shift) as f64;
        let coefs = ws.iter().map(|&v| to_q15(v / scale)).collect();
        Ok(Self { coefs, shift })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WindowType; 5] = [
        WindowType::Rectangular,
        WindowType::Blackman,
        WindowType::Hamming,
        WindowType::Hann,
        WindowType::Povey,
    ];

    fn a0() -> Q15 {
        Q15::from_f64(0.42)
    }

    #[test]
    fn test_window_shapes() {
        let hamming = analysis_window(WindowType::Hamming, 9, a0()).unwrap();
        assert_eq!(hamming[0], to_q15(0.08));
        assert_eq!(hamming[4], i16::MAX);
        assert_eq!(hamming[0], hamming[8]);

        let hann = analysis_window(WindowType::Hann, 9, a0()).unwrap();
        assert_eq!((hann[0], hann[2], hann[4]), (0, 16384, i16::MAX));

        let povey = analysis_window(WindowType::Povey, 9, a0()).unwrap();
        assert_eq!(povey[2], to_q15(libm::pow(0.5, 0.85)));

        let blackman = analysis_window(WindowType::Blackman, 9, a0()).unwrap();
        assert!(blackman[0].abs() <= 1);
        assert!(blackman[4] >= 32766);

        let rect = analysis_window(WindowType::Rectangular, 5, a0()).unwrap();
        assert!(rect.iter().all(|&x| x == i16::MAX));
    }

    #[test]
    fn test_windows_are_symmetric() {
        for kind in ALL {
            let w = analysis_window(kind, 400, a0()).unwrap();
            for n in 0..200 {
                assert!((w[n] - w[399 - n]).abs() <= 1, "{:?} at {}", kind, n);
            }
        }
    }

    #[test]
    fn test_dual_window_sums_to_one() {
        for kind in ALL {
            for &(len, hop) in &[(256usize, 64usize), (400, 160), (192, 48), (64, 32)] {
                let w = analysis_window(kind, len, a0()).unwrap();
                let ws = SynthesisWindow::dual(&w, hop).unwrap();
                let scale = (1u64 << ws.shift) as f64;
                // interior positions see every overlapping frame
                for n in 0..hop {
                    let sum: f64 = (n..len)
                        .step_by(hop)
                        .map(|i| w[i] as f64 / 32768.0 * ws.coefs[i] as f64 / 32768.0 * scale)
                        .sum();
                    let covered = (n..len).step_by(hop).any(|i| w[i] != 0);
                    if covered {
                        assert!(libm::fabs(sum - 1.0) < 2e-4, "{:?} {}/{} at {}: {}", kind, len, hop, n, sum);
                    }
                }
            }
        }
    }

    #[test]
    fn test_dual_of_rectangular_without_overlap_needs_shift() {
        let w = analysis_window(WindowType::Rectangular, 32, a0()).unwrap();
        let ws = SynthesisWindow::dual(&w, 32).unwrap();
        assert_eq!(ws.shift, 1);
        assert!(ws.coefs.iter().all(|&c| c == 16385 || c == 16384));
        assert!(SynthesisWindow::dual(&w, 0).is_err());
        assert!(SynthesisWindow::dual(&w, 33).is_err());
    }
}
