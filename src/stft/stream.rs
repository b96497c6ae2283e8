// src/stft/stream.rs
//! Stream lifecycle shared by the processors and dispatch over sample
//! container formats.

use super::config::StftConfig;
use super::features::FeatureStream;
use super::pcm::{S24, Sample, SampleFormat, SinkView, SourceView};
use super::vocoder::PhaseVocoder;
use crate::common::StftError;
use log::error;

/// Negotiated stream parameters, known at prepare time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: u32,
    /// Interleaved channels in the source and sink.
    pub channels: usize,
    /// Largest number of frames passed to one `process` call.
    pub max_frames: usize,
}

/// ```text
/// Uninitialized -> Configured -> WarmingUp -> Streaming
///                      ^------------ reset ------'
/// any -> Freed (release)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Uninitialized,
    /// Buffers allocated, no input seen yet.
    Configured,
    /// Collecting the first frame; output is silence.
    WarmingUp,
    Streaming,
    Freed,
}

/// A hop-synchronous processor over one sample container.
pub trait StreamProcessor<S: Sample> {
    /// Validates the configuration against the stream and allocates every
    /// buffer. Nothing is allocated afterwards.
    fn prepare(&mut self, params: StreamParams) -> Result<(), StftError>;

    /// Reads up to `frames` interleaved frames from `source`, runs every hop
    /// that became possible and writes `frames` frames to `sink` (bounded by
    /// its free space), zero-filled where nothing is ready. Returns the
    /// number of frames consumed.
    fn process(
        &mut self,
        source: &mut SourceView<'_, S>,
        sink: &mut SinkView<'_, S>,
        frames: usize,
    ) -> Result<usize, StftError>;

    /// Drops all buffered samples and returns to `Configured`, keeping the
    /// allocations.
    fn reset(&mut self) -> Result<(), StftError>;

    /// Frees plans and buffers. Calling it again has no effect.
    fn release(&mut self);

    fn state(&self) -> StreamState;
}

/// Source and sink of one `process` call, tagged by container.
pub enum PcmIo<'s, 'a> {
    S16(&'s mut SourceView<'a, i16>, &'s mut SinkView<'a, i16>),
    S24(&'s mut SourceView<'a, S24>, &'s mut SinkView<'a, S24>),
    S32(&'s mut SourceView<'a, i32>, &'s mut SinkView<'a, i32>),
}

impl PcmIo<'_, '_> {
    pub fn format(&self) -> SampleFormat {
        match self {
            PcmIo::S16(..) => SampleFormat::S16,
            PcmIo::S24(..) => SampleFormat::S24,
            PcmIo::S32(..) => SampleFormat::S32,
        }
    }
}

/// A processor instantiated for the container chosen at configuration time.
pub enum FormatStream<A, B, C> {
    S16(A),
    S24(B),
    S32(C),
}

impl FormatStream<PhaseVocoder<i16>, PhaseVocoder<S24>, PhaseVocoder<i32>> {
    /// Pass-through phase vocoder for `format`.
    pub fn vocoder(format: SampleFormat, config: StftConfig) -> Self {
        match format {
            SampleFormat::S16 => FormatStream::S16(PhaseVocoder::new(config)),
            SampleFormat::S24 => FormatStream::S24(PhaseVocoder::new(config)),
            SampleFormat::S32 => FormatStream::S32(PhaseVocoder::new(config)),
        }
    }
}

impl FormatStream<FeatureStream<i16>, FeatureStream<S24>, FeatureStream<i32>> {
    /// Cepstral feature stream for `format` with a 16-bit FFT.
    pub fn features(format: SampleFormat, config: StftConfig) -> Self {
        match format {
            SampleFormat::S16 => FormatStream::S16(FeatureStream::new(config)),
            SampleFormat::S24 => FormatStream::S24(FeatureStream::new(config)),
            SampleFormat::S32 => FormatStream::S32(FeatureStream::new(config)),
        }
    }
}

impl<A, B, C> FormatStream<A, B, C>
where
    A: StreamProcessor<i16>,
    B: StreamProcessor<S24>,
    C: StreamProcessor<i32>,
{
    pub fn format(&self) -> SampleFormat {
        match self {
            FormatStream::S16(_) => SampleFormat::S16,
            FormatStream::S24(_) => SampleFormat::S24,
            FormatStream::S32(_) => SampleFormat::S32,
        }
    }

    pub fn prepare(&mut self, params: StreamParams) -> Result<(), StftError> {
        match self {
            FormatStream::S16(p) => p.prepare(params),
            FormatStream::S24(p) => p.prepare(params),
            FormatStream::S32(p) => p.prepare(params),
        }
    }

    pub fn process(&mut self, io: PcmIo<'_, '_>, frames: usize) -> Result<usize, StftError> {
        match (self, io) {
            (FormatStream::S16(p), PcmIo::S16(src, sink)) => p.process(src, sink, frames),
            (FormatStream::S24(p), PcmIo::S24(src, sink)) => p.process(src, sink, frames),
            (FormatStream::S32(p), PcmIo::S32(src, sink)) => p.process(src, sink, frames),
            (stream, io) => {
                error!("stream prepared for {:?}, got {:?} buffers", stream.format(), io.format());
                Err(StftError::FormatMismatch)
            }
        }
    }

    pub fn reset(&mut self) -> Result<(), StftError> {
        match self {
            FormatStream::S16(p) => p.reset(),
            FormatStream::S24(p) => p.reset(),
            FormatStream::S32(p) => p.reset(),
        }
    }

    pub fn release(&mut self) {
        match self {
            FormatStream::S16(p) => p.release(),
            FormatStream::S24(p) => p.release(),
            FormatStream::S32(p) => p.release(),
        }
    }

    pub fn state(&self) -> StreamState {
        match self {
            FormatStream::S16(p) => p.state(),
            FormatStream::S24(p) => p.state(),
            FormatStream::S32(p) => p.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;

    fn params() -> StreamParams {
        StreamParams { sample_rate: 16000, channels: 1, max_frames: 64 }
    }

    fn small_config() -> StftConfig {
        StftConfig { frame_length: 256, frame_shift: 64, ..Default::default() }
    }

    #[test]
    fn test_dispatch_by_format() {
        let mut stream = FormatStream::vocoder(SampleFormat::S24, small_config());
        assert_eq!(stream.format(), SampleFormat::S24);
        assert_eq!(stream.state(), StreamState::Uninitialized);
        stream.prepare(params()).unwrap();
        assert_eq!(stream.state(), StreamState::Configured);

        let input = vec![S24(1000); 64];
        let mut output = vec![S24(7); 64];
        let mut src = SourceView::linear(&input);
        let mut sink = SinkView::linear(&mut output);
        assert_eq!(stream.process(PcmIo::S24(&mut src, &mut sink), 64), Ok(64));
        assert!(output.iter().all(|&x| x == S24(0)));
        assert_eq!(stream.state(), StreamState::WarmingUp);
    }

    #[test]
    fn test_format_mismatch() {
        let mut stream = FormatStream::features(SampleFormat::S16, StftConfig::default());
        stream.prepare(StreamParams { max_frames: 160, ..params() }).unwrap();

        let input = vec![0i32; 160];
        let mut output = vec![0i32; 160];
        let mut src = SourceView::linear(&input);
        let mut sink = SinkView::linear(&mut output);
        let io = PcmIo::S32(&mut src, &mut sink);
        assert_eq!(io.format(), SampleFormat::S32);
        assert_eq!(stream.process(io, 160), Err(StftError::FormatMismatch));
        assert_eq!(src.consumed(), 0);
    }

    #[test]
    fn test_release_is_terminal() {
        let mut stream = FormatStream::vocoder(SampleFormat::S16, small_config());
        stream.prepare(params()).unwrap();
        stream.release();
        stream.release();
        assert_eq!(stream.state(), StreamState::Freed);
        assert_eq!(stream.reset(), Err(StftError::Freed));
        assert_eq!(stream.prepare(params()), Err(StftError::Freed));
    }
}
