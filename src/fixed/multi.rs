use crate::common::{FftError, FftProcess};
use super::complex::FftPlan;
use super::core::{FftWord, FFT_SIZE_MAX};
use super::math::{q_mults_32x32, sat_i32};
use super::types::{ComplexQ31, Fixed};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::f64::consts::PI;

/// Length of the virtual composite twiddle table exp(-2πik/3072); only the
/// first two thirds are ever indexed.
const MULTI_TWIDDLE_PERIOD: usize = 3 * FFT_SIZE_MAX;
const MULTI_TWIDDLE_SIZE: usize = 2 * FFT_SIZE_MAX;

const DFT3_COEFR: i32 = -1073741824; // -0.5
const DFT3_COEFI: i32 = 1859775393; // sqrt(3)/2
const DFT3_SCALE: i64 = 715827883; // 1/3

/// FFT plan for sizes `2^k` or `3·2^k`, Q1.31 only.
///
/// A composite size runs three power-of-two sub-transforms of the residue
/// classes mod 3, rotates the second and third by exp(-2πi·j·k/N) and joins
/// them with a 3-point DFT. The caller's buffers double as scratch, so the
/// plan allocates nothing per call.
#[derive(Clone, Debug)]
pub struct FftMultiPlan {
    inner: FftPlan<ComplexQ31>,
    twiddles: Arc<[ComplexQ31]>,
    total_size: usize,
    fft_size: usize,
    num_ffts: usize,
}

impl FftMultiPlan {
    pub fn new(size: usize) -> Result<Self, FftError> {
        let num_ffts = if size.is_power_of_two() && size >= 2 {
            1
        } else if size % 3 == 0 && (size / 3).is_power_of_two() && size >= 6 {
            3
        } else {
            return Err(FftError::UnsupportedSize(size));
        };

        let fft_size = size / num_ffts;
        if fft_size > FFT_SIZE_MAX {
            return Err(FftError::SizeTooLarge(size));
        }

        let inner = FftPlan::new(fft_size)?;
        let twiddles: Arc<[ComplexQ31]> = if num_ffts > 1 {
            (0..MULTI_TWIDDLE_SIZE)
                .map(|k| {
                    let angle = -2.0 * PI * k as f64 / MULTI_TWIDDLE_PERIOD as f64;
                    ComplexQ31::from_twiddle(libm::cos(angle), libm::sin(angle))
                })
                .collect::<Vec<_>>()
                .into()
        } else {
            Arc::from([])
        };

        Ok(Self { inner, twiddles, total_size: size, fft_size, num_ffts })
    }

    /// Number of power-of-two sub-transforms: 1 or 3.
    pub fn num_ffts(&self) -> usize {
        self.num_ffts
    }

    /// Size of each power-of-two sub-transform.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// log2 of the sub-transform size.
    pub fn log2n(&self) -> u32 {
        self.inner.log2n()
    }

    /// Executes the transform. Both buffers must hold `size()` samples and
    /// both are overwritten; see [`FftPlan::execute`] for the scaling.
    pub fn execute(
        &self,
        input: &mut [ComplexQ31],
        output: &mut [ComplexQ31],
        inverse: bool,
    ) -> Result<(), FftError> {
        if input.len() < self.total_size || output.len() < self.total_size {
            return Err(FftError::BufferTooSmall);
        }

        if self.num_ffts == 1 {
            return self.inner.execute(input, output, inverse);
        }

        let m = self.fft_size;
        let input = &mut input[..self.total_size];
        let output = &mut output[..self.total_size];

        if inverse {
            for x in input.iter_mut() {
                *x = x.conj();
            }
        }

        // De-interleave by residue class: x[3i + j] -> sub-sequence j, position i
        for (k, x) in input.iter().enumerate() {
            output[(k % 3) * m + k / 3] = *x;
        }

        for (src, dst) in output.chunks_exact_mut(m).zip(input.chunks_exact_mut(m)) {
            self.inner.execute(src, dst, false)?;
        }

        let stride = FFT_SIZE_MAX / m;
        for j in 1..3 {
            for i in 0..m {
                let t = self.twiddles[j * i * stride];
                input[j * m + i] = t * input[j * m + i];
            }
        }

        for i in 0..m {
            let y = dft3([input[i], input[m + i], input[2 * m + i]]);
            output[i] = y[0];
            output[m + i] = y[1];
            output[2 * m + i] = y[2];
        }

        if inverse {
            let shift = self.inner.log2n() as i32;
            for x in output.iter_mut() {
                let y = x.conj().shift(shift);
                *x = ComplexQ31::new(y.re.saturating_mul_int(3), y.im.saturating_mul_int(3));
            }
        }

        Ok(())
    }
}

/// 3-point DFT of inputs pre-scaled by 1/3.
pub(crate) fn dft3(x: [ComplexQ31; 3]) -> [ComplexQ31; 3] {
    let c0 = ComplexQ31::from_bits(DFT3_COEFR, -DFT3_COEFI);
    let c1 = ComplexQ31::from_bits(DFT3_COEFR, DFT3_COEFI);
    let x = x.map(|v| {
        ComplexQ31::new(
            Fixed::from_bits(sat_i32(q_mults_32x32(v.re.to_bits() as i64, DFT3_SCALE, 31))),
            Fixed::from_bits(sat_i32(q_mults_32x32(v.im.to_bits() as i64, DFT3_SCALE, 31))),
        )
    });

    let y0 = x[0].saturating_add(x[1]).saturating_add(x[2]);
    let y1 = x[0].saturating_add((c0 * x[1]).saturating_add(c1 * x[2]));
    let y2 = x[0].saturating_add((c1 * x[1]).saturating_add(c0 * x[2]));
    [y0, y1, y2]
}

impl FftProcess<ComplexQ31> for FftMultiPlan {
    fn execute(
        &self,
        input: &mut [ComplexQ31],
        output: &mut [ComplexQ31],
        inverse: bool,
    ) -> Result<(), FftError> {
        FftMultiPlan::execute(self, input, output, inverse)
    }

    fn size(&self) -> usize {
        self.total_size
    }
}

#[cfg(test)]
#[path = "multi_tests.rs"]
mod tests;
