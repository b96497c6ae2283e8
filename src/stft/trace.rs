// src/stft/trace.rs
//! Optional observation hooks for the transform stages.

use crate::fixed::FftWord;
use log::trace;

/// Receives the buffers around each transform. All hooks default to no-ops;
/// implementations must not block.
pub trait TraceSink<W> {
    fn fft_input(&mut self, _channel: usize, _frame: &[W]) {}

    fn fft_output(&mut self, _channel: usize, _spectrum: &[W]) {}

    fn ifft_output(&mut self, _channel: usize, _frame: &[W]) {}
}

/// Logs the peak magnitude of every traced buffer at `trace` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTrace;

fn peak<W: FftWord>(buf: &[W]) -> u32 {
    buf.iter()
        .map(|x| {
            let c = x.to_q31();
            c.re.to_bits().unsigned_abs().max(c.im.to_bits().unsigned_abs())
        })
        .max()
        .unwrap_or(0)
}

impl<W: FftWord> TraceSink<W> for LogTrace {
    fn fft_input(&mut self, channel: usize, frame: &[W]) {
        trace!("ch {} fft in: {} points, peak {:#x}", channel, frame.len(), peak(frame));
    }

    fn fft_output(&mut self, channel: usize, spectrum: &[W]) {
        trace!("ch {} fft out: peak {:#x}", channel, peak(spectrum));
    }

    fn ifft_output(&mut self, channel: usize, frame: &[W]) {
        trace!("ch {} ifft out: peak {:#x}", channel, peak(frame));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::ComplexQ31;

    struct Counter(usize);

    impl TraceSink<ComplexQ31> for Counter {
        fn fft_output(&mut self, _channel: usize, _spectrum: &[ComplexQ31]) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_default_hooks_are_noops() {
        let mut c = Counter(0);
        let buf = [ComplexQ31::from_bits(-5, 3)];
        c.fft_input(0, &buf);
        c.ifft_output(0, &buf);
        c.fft_output(0, &buf);
        assert_eq!(c.0, 1);
    }

    #[test]
    fn test_peak() {
        let buf = [ComplexQ31::from_bits(-5, 3), ComplexQ31::from_bits(2, i32::MIN)];
        assert_eq!(peak(&buf), 1 << 31);
        assert_eq!(peak::<ComplexQ31>(&[]), 0);
        let mut t = LogTrace;
        TraceSink::<ComplexQ31>::fft_input(&mut t, 1, &buf);
    }
}
