// src/stft/features.rs
//! Cepstral feature extraction: power spectrum, Mel filterbank, log, DCT.

use super::arena::{ArenaLayout, ScratchArena};
use super::buffer::CircularBuffer;
use super::config::StftConfig;
use super::dct::Dct;
use super::frame::{apply_window, fill_frame, fill_prev_samples, normalize_shift};
use super::mel::{MelFilterbank, power_spectrum};
use super::pcm::{Sample, SinkView, SourceView};
use super::stream::{StreamParams, StreamProcessor, StreamState};
use super::trace::TraceSink;
use super::try_vec;
use super::window::analysis_window;
use crate::common::StftError;
use crate::fixed::math::{q_shift_rnd, sat_i16, sat_i32};
use crate::fixed::{ComplexQ15, FftPlan, FftWord};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::marker::PhantomData;
use log::{debug, error, info, trace, warn};

/// Header words in front of every cepstral block: `0x6d666363` as two
/// little-endian 16-bit words.
pub const BLOCK_MAGIC: [i16; 2] = [0x6363, 0x6d66];

/// One-pole pre-emphasis `y[n] = x[n] − c·x[n−1]` on Q1.15 samples.
#[derive(Debug, Clone, Copy, Default)]
struct Preemphasis {
    coef: i16,
    delay: i16,
}

impl Preemphasis {
    fn apply(&mut self, x: i16) -> i16 {
        // Q1.15 << 15 and Q1.15 · Q1.15 are both Q2.30
        let s = ((x as i64) << 15) - self.delay as i64 * self.coef as i64;
        self.delay = x;
        sat_i16(sat_i32(q_shift_rnd(s, 30, 15)))
    }
}

struct FeatureCore<W: FftWord> {
    plan: FftPlan<W>,
    window: Vec<i16>,
    mel: MelFilterbank,
    dct: Dct,
    arena: ScratchArena<W>,
    input: CircularBuffer<i16>,
    prev: Vec<i16>,
    /// Queued output blocks, header included.
    output: CircularBuffer<i16>,
    preemphasis: Preemphasis,
    channel: usize,
    num_channels: usize,
    waiting_fill: bool,
    prev_valid: bool,
    blocks: u64,
}

impl<W: FftWord> FeatureCore<W> {
    fn block_len(&self) -> usize {
        BLOCK_MAGIC.len() + self.dct.num_out()
    }

    fn reset(&mut self) {
        self.arena.clear();
        self.input.reset();
        self.output.reset();
        self.prev.fill(0);
        self.preemphasis.delay = 0;
        self.waiting_fill = true;
        self.prev_valid = false;
        self.blocks = 0;
    }
}

/// Streams cepstral coefficient blocks computed from one input channel.
///
/// Every hop produces `[BLOCK_MAGIC, c_0 .. c_{num_ceps-1}]` with the
/// cepstra in Q8.7. `W` selects the FFT word; with the default 16-bit word
/// each frame is normalized before the transform and the shift is removed
/// again in the log domain.
pub struct FeatureStream<S: Sample, W: FftWord = ComplexQ15> {
    config: StftConfig,
    trace: Option<Box<dyn TraceSink<W>>>,
    state: StreamState,
    core: Option<FeatureCore<W>>,
    _sample: PhantomData<S>,
}

impl<S: Sample, W: FftWord> FeatureStream<S, W> {
    pub fn new(config: StftConfig) -> Self {
        Self { config, trace: None, state: StreamState::Uninitialized, core: None, _sample: PhantomData }
    }

    pub fn set_trace(&mut self, trace: Option<Box<dyn TraceSink<W>>>) {
        self.trace = trace;
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    /// Words per output block, header included.
    pub fn block_len(&self) -> usize {
        BLOCK_MAGIC.len() + self.config.num_ceps
    }

    /// Blocks computed since prepare or the last reset.
    pub fn blocks(&self) -> u64 {
        self.core.as_ref().map_or(0, |c| c.blocks)
    }

    fn build(&self, params: StreamParams) -> Result<FeatureCore<W>, StftError> {
        let cfg = &self.config;
        cfg.validate(params.sample_rate, params.channels)?;
        cfg.validate_features()?;
        if params.max_frames == 0 {
            error!("features: max_frames is zero");
            return Err(StftError::InvalidConfig("max_frames"));
        }

        let n = cfg.padded_size();
        let plan = FftPlan::new(n).map_err(|e| {
            error!("features: no transform for {} points: {}", n, e);
            StftError::from(e)
        })?;
        let window = analysis_window(cfg.window, cfg.frame_length, cfg.blackman_a0)?;
        let mel = MelFilterbank::new(cfg)?;
        let dct = Dct::new(cfg.num_mel_bins, cfg.num_ceps, cfg.cepstral_lifter)?;
        let arena = ScratchArena::new(ArenaLayout {
            fft_size: n,
            power: cfg.half_size(),
            mel: cfg.num_mel_bins,
            ceps: cfg.num_ceps,
            ..Default::default()
        })?;

        let block_len = BLOCK_MAGIC.len() + cfg.num_ceps;
        let queued = params.max_frames / cfg.frame_shift + 2;
        info!(
            "features: ch {} of {}, frame {} hop {}, fft {}, {} mel, {} ceps, {} block queue",
            cfg.source_channel(),
            params.channels,
            cfg.frame_length,
            cfg.frame_shift,
            n,
            cfg.num_mel_bins,
            cfg.num_ceps,
            queued
        );

        Ok(FeatureCore {
            plan,
            window,
            mel,
            dct,
            arena,
            input: CircularBuffer::new(cfg.frame_length + params.max_frames)?,
            prev: try_vec(cfg.prev_size(), 0)?,
            output: CircularBuffer::new(block_len * queued)?,
            preemphasis: Preemphasis { coef: cfg.preemphasis_coefficient.to_bits(), delay: 0 },
            channel: cfg.source_channel(),
            num_channels: params.channels,
            waiting_fill: true,
            prev_valid: false,
            blocks: 0,
        })
    }
}

/// Computes one cepstral block and queues it.
fn run_hop<W: FftWord>(
    cfg: &StftConfig,
    core: &mut FeatureCore<W>,
    trace: &mut Option<Box<dyn TraceSink<W>>>,
) -> Result<(), StftError> {
    let s = core.arena.hop();
    let frame = cfg.pad_offset()..cfg.pad_offset() + cfg.frame_length;
    let half = s.power.len();

    fill_frame(&mut core.input, &mut core.prev, &mut s.fft_in[frame.clone()], cfg.frame_shift, W::from_q15);
    let shift = if cfg.normalize_fft && W::BITS == 16 { normalize_shift(&s.fft_in[frame.clone()]) } else { 0 };
    apply_window(&mut s.fft_in[frame], &core.window, shift);
    if let Some(t) = trace.as_mut() {
        t.fft_input(core.channel, s.fft_in);
    }

    core.plan.execute(s.fft_in, s.fft_out, false)?;
    if let Some(t) = trace.as_mut() {
        t.fft_output(core.channel, s.fft_out);
    }

    power_spectrum(&s.fft_out[..half], s.power);
    core.mel.apply(s.power, shift - core.plan.log2n() as i32, s.mel);
    core.dct.apply(s.mel, s.ceps);

    for &w in BLOCK_MAGIC.iter() {
        core.output.push(w);
    }
    for c in s.ceps.iter() {
        core.output.push(c.to_bits());
    }
    core.blocks += 1;
    trace!("features: block {} shift {} c0 {:?}", core.blocks, shift, s.ceps.first());
    Ok(())
}

impl<S: Sample, W: FftWord> StreamProcessor<S> for FeatureStream<S, W> {
    fn prepare(&mut self, params: StreamParams) -> Result<(), StftError> {
        if self.state == StreamState::Freed {
            return Err(StftError::Freed);
        }
        self.core = None;
        self.state = StreamState::Uninitialized;
        let core = self.build(params)?;
        self.core = Some(core);
        self.state = StreamState::Configured;
        Ok(())
    }

    fn process(
        &mut self,
        source: &mut SourceView<'_, S>,
        sink: &mut SinkView<'_, S>,
        frames: usize,
    ) -> Result<usize, StftError> {
        let Self { config, trace, state, core, .. } = self;
        let core = match (*state, core.as_mut()) {
            (StreamState::Freed, _) => return Err(StftError::Freed),
            (_, Some(core)) => core,
            (_, None) => return Err(StftError::NotPrepared),
        };

        let wanted = core.channel;
        let read = {
            let FeatureCore { input, preemphasis, num_channels, .. } = &mut *core;
            let room = input.free();
            source.read_frames(frames.min(room), *num_channels, |ch, x| {
                if ch == wanted {
                    input.push(preemphasis.apply(x.to_q15()));
                }
            })
        };
        if read > 0 && *state == StreamState::Configured {
            *state = StreamState::WarmingUp;
        }

        if core.waiting_fill && core.input.avail() >= config.frame_length {
            core.waiting_fill = false;
        }
        if !core.waiting_fill && !core.prev_valid {
            core.prev_valid = fill_prev_samples(&mut core.input, &mut core.prev);
        }
        if core.prev_valid {
            let block_len = core.block_len();
            while core.input.avail() >= config.frame_shift {
                if core.output.free() < block_len {
                    warn!("features: output queue full, hop deferred");
                    break;
                }
                run_hop(config, core, trace)?;
                *state = StreamState::Streaming;
            }
        }

        let block_len = core.block_len();
        let words = frames.min(sink.free() / core.num_channels) * core.num_channels;
        let mut written = 0;
        while core.output.avail() >= block_len && written + block_len <= words {
            written += sink.write_with(block_len, || S::from_word(core.output.pop().unwrap_or(0)));
        }
        if core.output.avail() > 0 {
            debug!("features: {} words stay queued", core.output.avail());
        }
        sink.zero_fill(words - written);
        Ok(read)
    }

    fn reset(&mut self) -> Result<(), StftError> {
        match (self.state, self.core.as_mut()) {
            (StreamState::Freed, _) => Err(StftError::Freed),
            (_, None) => Ok(()),
            (_, Some(core)) => {
                core.reset();
                self.state = StreamState::Configured;
                debug!("features: reset");
                Ok(())
            }
        }
    }

    fn release(&mut self) {
        if self.state != StreamState::Freed {
            debug!("features: released");
        }
        self.core = None;
        self.state = StreamState::Freed;
    }

    fn state(&self) -> StreamState {
        self.state
    }
}
