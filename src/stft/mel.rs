// src/stft/mel.rs
//! Power spectrum and HTK-scale Mel filterbank with logarithmic output.

use super::config::{MelLog, MelNorm, Q7, StftConfig};
use super::try_vec;
use crate::common::StftError;
use crate::fixed::math::{log2_q16, q_shift_rnd, sat_i16, sat_i32};
use crate::fixed::{FftWord, Q15};
use alloc::vec::Vec;

/// ln(2), log10(2) and 10·log10(2) in Q16.
const LN2_Q16: i64 = 45426;
const LOG10_2_Q16: i64 = 19728;
const DB_2_Q16: i64 = 197283;

/// Fraction bits of a Mel energy: Q2.62 power times Q1.15 weight.
const MEL_ENERGY_FRAC: i32 = 77;

pub fn hz_to_mel(hz: f64) -> f64 {
    1127.0 * libm::log(1.0 + hz / 700.0)
}

pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (libm::exp(mel / 1127.0) - 1.0)
}

/// |X[k]|² of each bin as Q2.62, using the Q1.31 view of the spectrum.
pub fn power_spectrum<W: FftWord>(spectrum: &[W], power: &mut [u64]) {
    for (p, x) in power.iter_mut().zip(spectrum.iter()) {
        let c = x.to_q31();
        let (re, im) = (c.re.to_bits() as i64, c.im.to_bits() as i64);
        *p = (re * re) as u64 + (im * im) as u64;
    }
}

#[derive(Debug, Clone)]
struct Band {
    start: usize,
    weights: Vec<Q15>,
    /// Slaney area normalization as a log2 gain, Q16.
    log2_gain: i32,
}

/// Triangular filters over the non-redundant FFT bins, equally spaced on
/// the Mel scale between the configured low and high frequencies.
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    bands: Vec<Band>,
    mel_log: MelLog,
    pmin_log2: i32,
    top_db: Q7,
}

impl MelFilterbank {
    pub fn new(cfg: &StftConfig) -> Result<Self, StftError> {
        let n = cfg.padded_size();
        let half = n / 2 + 1;
        let bin_hz = cfg.sample_frequency as f64 / n as f64;
        let mel_lo = hz_to_mel(cfg.low_freq as f64);
        let mel_hi = hz_to_mel(cfg.resolved_high_freq() as f64);
        let step = (mel_hi - mel_lo) / (cfg.num_mel_bins + 1) as f64;

        let mut bands = Vec::new();
        bands.try_reserve_exact(cfg.num_mel_bins).map_err(|_| StftError::AllocFailed)?;

        for i in 0..cfg.num_mel_bins {
            let left = mel_lo + i as f64 * step;
            let center = left + step;
            let right = center + step;
            let weight = |k: usize| {
                let mel = hz_to_mel(k as f64 * bin_hz);
                if mel <= left || mel >= right {
                    0.0
                } else if mel <= center {
                    (mel - left) / step
                } else {
                    (right - mel) / step
                }
            };

            let start = (0..half).find(|&k| weight(k) > 0.0).unwrap_or(half);
            let end = (start..half).find(|&k| weight(k) <= 0.0).unwrap_or(half);
            let mut weights = try_vec(end - start, Q15::ZERO)?;
            for (k, w) in (start..end).zip(weights.iter_mut()) {
                *w = Q15::from_f64(weight(k));
            }

            let log2_gain = match cfg.mel_norm {
                MelNorm::None => 0,
                MelNorm::Slaney => {
                    let enorm = 2.0 / (mel_to_hz(right) - mel_to_hz(left));
                    libm::round(libm::log2(enorm) * 65536.0) as i32
                }
            };
            bands.push(Band { start: start.min(half - 1), weights, log2_gain });
        }

        let pmin_log2 = log2_q16(cfg.pmin.to_bits().max(1) as u128).unwrap_or(0) - (31 << 16);
        Ok(Self { bands, mel_log: cfg.mel_log, pmin_log2, top_db: cfg.top_db })
    }

    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    /// First bin and Q1.15 weights of band `i`.
    pub fn band(&self, i: usize) -> Option<(usize, &[Q15])> {
        self.bands.get(i).map(|b| (b.start, b.weights.as_slice()))
    }

    /// Logarithmic Mel energies in Q8.7.
    ///
    /// `power` holds Q2.62 bins of a transform that was scaled by
    /// `2^mel_scale_shift`; the scale is removed in the log domain so the
    /// result is the energy of the unscaled spectrum.
    pub fn apply(&self, power: &[u64], mel_scale_shift: i32, out: &mut [Q7]) {
        let comp = -(2 * mel_scale_shift + MEL_ENERGY_FRAC) << 16;
        for (band, y) in self.bands.iter().zip(out.iter_mut()) {
            let bins = power.get(band.start..).unwrap_or(&[]);
            let energy: u128 = band
                .weights
                .iter()
                .zip(bins.iter())
                .map(|(w, &p)| p as u128 * w.to_bits().max(0) as u128)
                .sum();
            let log2 = match log2_q16(energy) {
                Some(l) => (l + comp + band.log2_gain).max(self.pmin_log2),
                None => self.pmin_log2,
            };
            *y = self.to_log_q7(log2);
        }

        if self.mel_log == MelLog::Db && self.top_db > Q7::ZERO {
            let n = self.bands.len().min(out.len());
            if let Some(&peak) = out[..n].iter().max() {
                let floor = Q7::from_bits(peak.to_bits().saturating_sub(self.top_db.to_bits()));
                for y in out[..n].iter_mut() {
                    *y = (*y).max(floor);
                }
            }
        }
    }

    fn to_log_q7(&self, log2: i32) -> Q7 {
        let k = match self.mel_log {
            MelLog::Ln => LN2_Q16,
            MelLog::Log10 => LOG10_2_Q16,
            MelLog::Db => DB_2_Q16,
        };
        // Q16 · Q16 -> Q8.7
        Q7::from_bits(sat_i16(sat_i32(q_shift_rnd(log2 as i64 * k, 32, 7))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::ComplexQ31;
    use std::vec;

    fn single_band(mel_log: MelLog, top_db: Q7) -> MelFilterbank {
        MelFilterbank {
            bands: vec![
                Band { start: 2, weights: vec![Q15::MAX], log2_gain: 0 },
                Band { start: 3, weights: vec![Q15::MAX], log2_gain: 0 },
            ],
            mel_log,
            pmin_log2: -31 << 16,
            top_db,
        }
    }

    #[test]
    fn test_mel_scale() {
        assert!(libm::fabs(hz_to_mel(700.0) - 1127.0 * core::f64::consts::LN_2) < 1e-9);
        for &hz in &[0.0, 20.0, 1000.0, 7999.0] {
            assert!(libm::fabs(mel_to_hz(hz_to_mel(hz)) - hz) < 1e-6);
        }
    }

    #[test]
    fn test_power_spectrum() {
        let spec = [ComplexQ31::from_bits(1 << 30, 0), ComplexQ31::from_bits(-(1 << 30), 1 << 30)];
        let mut power = [0u64; 2];
        power_spectrum(&spec, &mut power);
        assert_eq!(power, [1 << 60, 1 << 61]);
    }

    #[test]
    fn test_filterbank_shape() {
        let cfg = StftConfig::default();
        let fb = MelFilterbank::new(&cfg).unwrap();
        assert_eq!(fb.num_bands(), 23);
        let mut last_start = 0;
        for i in 0..fb.num_bands() {
            let (start, w) = fb.band(i).unwrap();
            assert!(!w.is_empty(), "band {} is empty", i);
            assert!(start >= last_start && start + w.len() <= 257);
            assert!(w.iter().all(|&x| x >= Q15::ZERO));
            assert!(w.iter().max().is_some_and(|&x| x > Q15::from_f64(0.5)), "band {} peak", i);
            last_start = start;
        }
        // 20 Hz is above bin 0 at 31.25 Hz spacing, so bin 0 is never used
        assert!(fb.band(0).is_some_and(|(start, _)| start >= 1));
        assert!(fb.band(23).is_none());
    }

    #[test]
    fn test_silence_hits_the_floor() {
        let fb = single_band(MelLog::Ln, Q7::ZERO);
        let mut out = [Q7::ZERO; 2];
        fb.apply(&[0; 8], -9, &mut out);
        assert_eq!(out, [Q7::from_bits(-2750); 2]);

        let fb = single_band(MelLog::Db, Q7::ZERO);
        fb.apply(&[0; 8], -9, &mut out);
        assert_eq!(out[0], Q7::from_bits(-11945));
    }

    #[test]
    fn test_scale_compensation() {
        let fb = single_band(MelLog::Ln, Q7::ZERO);
        let mut power = [0u64; 8];
        power[2] = 1 << 62;
        let mut out = [Q7::ZERO; 2];

        // unit power at full weight is log(1) = 0 before compensation
        fb.apply(&power, 0, &mut out);
        assert!(out[0].to_bits().abs() <= 1, "{:?}", out[0]);

        // 512-point transform: 2·9 octaves of gain restored
        fb.apply(&power, -9, &mut out);
        assert!((out[0].to_bits() - 1597).abs() <= 1, "{:?}", out[0]);
        assert_eq!(out[1], Q7::from_bits(-2750));
    }

    #[test]
    fn test_top_db_clamp() {
        let top = Q7::from_bits(40 << 7);
        let fb = single_band(MelLog::Db, top);
        let mut power = [0u64; 8];
        power[2] = 1 << 62;
        let mut out = [Q7::ZERO; 2];
        fb.apply(&power, 0, &mut out);
        assert!(out[0].to_bits().abs() <= 1);
        assert_eq!(out[1].to_bits(), out[0].to_bits() - (40 << 7));
    }

    #[test]
    fn test_slaney_gain_lowers_energy() {
        let plain = MelFilterbank::new(&StftConfig::default()).unwrap();
        let cfg = StftConfig { mel_norm: MelNorm::Slaney, ..Default::default() };
        let slaney = MelFilterbank::new(&cfg).unwrap();

        let power = vec![1u64 << 50; 257];
        let mut a = [Q7::ZERO; 23];
        let mut b = [Q7::ZERO; 23];
        plain.apply(&power, -9, &mut a);
        slaney.apply(&power, -9, &mut b);
        // triangles are wider than 2 Hz, so the area gain is below one
        assert!(a.iter().zip(b.iter()).all(|(x, y)| y < x));
        // higher bands are wider, so they are attenuated more
        let d0 = a[0].to_bits() - b[0].to_bits();
        let d22 = a[22].to_bits() - b[22].to_bits();
        assert!(d22 > d0);
    }
}
