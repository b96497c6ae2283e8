use crate::common::{FftError, FftProcess};
use super::core::{precompute_bitrev, precompute_twiddles, radix_2_dit_fft_core, FftWord, FFT_SIZE_MAX, TWIDDLE_TABLE_SIZE};
use alloc::sync::Arc;
use alloc::vec;

/// Power-of-two FFT plan.
///
/// Holds the bit-reversal table and the twiddle table, never sample
/// buffers: the caller passes input and output on every call, so one plan
/// serves both directions and every channel of a stream. The tables are
/// reference counted, so clones share them.
#[derive(Clone, Debug)]
pub struct FftPlan<W: FftWord> {
    twiddles: Arc<[W]>,
    bitrev: Arc<[u16]>,
    n: usize,
    log2n: u32,
}

impl<W: FftWord> FftPlan<W> {
    /// Builds the tables for a transform of `n` points, 2 <= n <= 1024.
    pub fn new(n: usize) -> Result<Self, FftError> {
        Self::validate(n)?;
        let mut twiddles = vec![W::default(); TWIDDLE_TABLE_SIZE];
        precompute_twiddles(&mut twiddles);

        let log2n = n.trailing_zeros();
        let mut bitrev = vec![0u16; n];
        precompute_bitrev(&mut bitrev, log2n);
        Ok(Self { twiddles: twiddles.into(), bitrev: bitrev.into(), n, log2n })
    }

    fn validate(n: usize) -> Result<(), FftError> {
        if !n.is_power_of_two() || n < 2 {
            return Err(FftError::NotPowerOfTwo);
        }
        if n > FFT_SIZE_MAX {
            return Err(FftError::SizeTooLarge(n));
        }
        Ok(())
    }

    /// log2 of the transform size, i.e. the headroom shift applied to the input.
    pub fn log2n(&self) -> u32 {
        self.log2n
    }

    /// Executes the transform from `input` into `output`.
    ///
    /// Forward returns X[k]/N; inverse returns the plain inverse DFT of its
    /// input. `input` is scratch for the inverse direction.
    pub fn execute(&self, input: &mut [W], output: &mut [W], inverse: bool) -> Result<(), FftError> {
        if input.len() < self.n || output.len() < self.n {
            return Err(FftError::BufferTooSmall);
        }

        radix_2_dit_fft_core(input, output, &self.twiddles, &self.bitrev, self.log2n, inverse);
        Ok(())
    }
}

impl<W: FftWord> FftProcess<W> for FftPlan<W> {
    fn execute(&self, input: &mut [W], output: &mut [W], inverse: bool) -> Result<(), FftError> {
        FftPlan::execute(self, input, output, inverse)
    }

    fn size(&self) -> usize {
        self.n
    }
}

#[cfg(test)]
#[path = "complex_tests.rs"]
mod tests;
