//! Streaming STFT processing on top of the fixed-point transforms.
//!
//! Two stream processors share the framing code: [`PhaseVocoder`]
//! (analysis, polar-domain hook, synthesis by overlap-add) and
//! [`FeatureStream`] (power spectrum, Mel filterbank, DCT, cepstral blocks).

pub mod arena;
pub mod buffer;
pub mod config;
pub mod dct;
pub mod features;
pub mod frame;
pub mod mel;
pub mod overlap_add;
pub mod pcm;
pub mod stream;
pub mod trace;
pub mod vocoder;
pub mod window;

pub use buffer::CircularBuffer;
pub use config::{MelLog, MelNorm, PadType, StftConfig, WindowType};
pub use features::FeatureStream;
pub use pcm::{Sample, SampleFormat, SinkView, SourceView, S24};
pub use stream::{FormatStream, PcmIo, StreamParams, StreamProcessor, StreamState};
pub use trace::{LogTrace, TraceSink};
pub use vocoder::{MagnitudeGain, Passthrough, PhaseVocoder, PolarProcessor};

use crate::common::StftError;
use alloc::vec::Vec;

/// Allocates `len` copies of `value`, reporting failure instead of aborting.
pub(crate) fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>, StftError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| StftError::AllocFailed)?;
    v.resize(len, value);
    Ok(v)
}
