// src/stft/vocoder.rs
//! Phase vocoder: STFT analysis, a polar-domain hook and overlap-add
//! resynthesis, per channel.

use super::arena::{ArenaLayout, ScratchArena};
use super::buffer::CircularBuffer;
use super::config::StftConfig;
use super::frame::{apply_window, fill_frame, fill_prev_samples};
use super::overlap_add::overlap_add;
use super::pcm::{Sample, SinkView, SourceView};
use super::stream::{StreamParams, StreamProcessor, StreamState};
use super::trace::TraceSink;
use super::try_vec;
use super::window::{SynthesisWindow, analysis_window};
use crate::common::StftError;
use crate::fixed::math::{q_mults_32x32, sat_i32};
use crate::fixed::polar::{apply_symmetry, to_complex, to_polar};
use crate::fixed::{ComplexQ31, FftMultiPlan, PolarFixed, Q30};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::marker::PhantomData;
use log::{debug, error, info, trace, warn};

/// Spectral modification applied between analysis and synthesis.
///
/// `bins` holds the `N/2 + 1` non-negative frequencies of one channel's
/// frame; the upper half is rebuilt by conjugate symmetry afterwards.
pub trait PolarProcessor {
    fn process(&mut self, channel: usize, bins: &mut [PolarFixed]);

    /// Called when the stream is reset.
    fn reset(&mut self) {}
}

/// Leaves the spectrum untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl PolarProcessor for Passthrough {
    fn process(&mut self, _channel: usize, _bins: &mut [PolarFixed]) {}
}

/// Scales every magnitude by a Q2.30 gain.
#[derive(Debug, Clone, Copy)]
pub struct MagnitudeGain {
    pub gain: Q30,
}

impl PolarProcessor for MagnitudeGain {
    fn process(&mut self, _channel: usize, bins: &mut [PolarFixed]) {
        let g = self.gain.to_bits() as i64;
        for b in bins.iter_mut() {
            let m = q_mults_32x32(b.magnitude.to_bits() as i64, g, 30);
            b.magnitude = Q30::from_bits(sat_i32(m));
        }
    }
}

struct Kernels {
    plan: FftMultiPlan,
    window: Vec<i16>,
    synthesis: SynthesisWindow,
}

struct ChannelState {
    input: CircularBuffer<i32>,
    output: CircularBuffer<i32>,
    prev: Vec<i32>,
    waiting_fill: bool,
    prev_valid: bool,
}

impl ChannelState {
    fn new(cfg: &StftConfig, max_frames: usize) -> Result<Self, StftError> {
        Ok(Self {
            input: CircularBuffer::new(cfg.frame_length + max_frames)?,
            output: CircularBuffer::new(cfg.frame_length + max_frames + cfg.frame_shift)?,
            prev: try_vec(cfg.prev_size(), 0)?,
            waiting_fill: true,
            prev_valid: false,
        })
    }

    fn reset(&mut self) {
        self.input.reset();
        self.output.reset();
        self.prev.fill(0);
        self.waiting_fill = true;
        self.prev_valid = false;
    }

    /// Moves through warm-up; true once hops may run.
    fn warm_up(&mut self, frame_length: usize) -> bool {
        if self.waiting_fill && self.input.avail() >= frame_length {
            self.waiting_fill = false;
        }
        if !self.waiting_fill && !self.prev_valid {
            self.prev_valid = fill_prev_samples(&mut self.input, &mut self.prev);
        }
        self.prev_valid
    }
}

struct VocoderCore {
    kernels: Kernels,
    arena: ScratchArena<ComplexQ31>,
    channels: Vec<ChannelState>,
    fft_done: bool,
}

/// Phase vocoder over sample container `S`.
///
/// Each hop takes `frame_shift` new samples per channel, transforms the
/// windowed frame, hands the polar spectrum to the [`PolarProcessor`] and
/// adds the resynthesized frame into the channel's output ring. The
/// synthesis window is the dual of the analysis window, so an unmodified
/// spectrum reconstructs the input once warm-up is over.
///
/// With `round_to_power_of_two` unset and a frame length of `3·2^k` the
/// composite transform is used.
///
/// Output starts in the call that completes the first frame. When the host
/// period does not divide `frame_shift`, the output ring can run dry once
/// shortly after warm-up; the missing samples are written as silence and
/// the stream is steady from then on.
pub struct PhaseVocoder<S: Sample> {
    config: StftConfig,
    processor: Box<dyn PolarProcessor>,
    trace: Option<Box<dyn TraceSink<ComplexQ31>>>,
    state: StreamState,
    core: Option<VocoderCore>,
    _sample: PhantomData<S>,
}

impl<S: Sample> PhaseVocoder<S> {
    pub fn new(config: StftConfig) -> Self {
        Self::with_processor(config, Box::new(Passthrough))
    }

    pub fn with_processor(config: StftConfig, processor: Box<dyn PolarProcessor>) -> Self {
        Self { config, processor, trace: None, state: StreamState::Uninitialized, core: None, _sample: PhantomData }
    }

    pub fn set_trace(&mut self, trace: Option<Box<dyn TraceSink<ComplexQ31>>>) {
        self.trace = trace;
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    /// Transform size once prepared.
    pub fn fft_size(&self) -> Option<usize> {
        self.core.as_ref().map(|c| c.arena.layout().fft_size)
    }

    fn build(&self, params: StreamParams) -> Result<VocoderCore, StftError> {
        let cfg = &self.config;
        cfg.validate(params.sample_rate, params.channels)?;
        if params.max_frames == 0 {
            error!("vocoder: max_frames is zero");
            return Err(StftError::InvalidConfig("max_frames"));
        }

        let n = cfg.padded_size();
        let plan = FftMultiPlan::new(n).map_err(|e| {
            error!("vocoder: no transform for {} points: {}", n, e);
            StftError::from(e)
        })?;
        let window = analysis_window(cfg.window, cfg.frame_length, cfg.blackman_a0)?;
        let synthesis = SynthesisWindow::dual(&window, cfg.frame_shift)?;
        let arena = ScratchArena::new(ArenaLayout { fft_size: n, polar: n / 2 + 1, ..Default::default() })?;

        let mut channels = Vec::new();
        channels.try_reserve_exact(params.channels).map_err(|_| StftError::AllocFailed)?;
        for _ in 0..params.channels {
            channels.push(ChannelState::new(cfg, params.max_frames)?);
        }

        info!(
            "vocoder: {} ch, frame {} hop {}, fft {} ({} x {}), synthesis shift {}",
            params.channels,
            cfg.frame_length,
            cfg.frame_shift,
            n,
            plan.num_ffts(),
            plan.fft_size(),
            synthesis.shift
        );
        Ok(VocoderCore { kernels: Kernels { plan, window, synthesis }, arena, channels, fft_done: false })
    }
}

/// One analysis/synthesis hop of channel `index`.
fn run_hop(
    cfg: &StftConfig,
    kernels: &Kernels,
    arena: &mut ScratchArena<ComplexQ31>,
    ch: &mut ChannelState,
    index: usize,
    processor: &mut dyn PolarProcessor,
    trace: &mut Option<Box<dyn TraceSink<ComplexQ31>>>,
) -> Result<(), StftError> {
    let s = arena.hop();
    let n = s.fft_in.len();
    let half = n / 2 + 1;
    let frame = cfg.pad_offset()..cfg.pad_offset() + cfg.frame_length;

    fill_frame(&mut ch.input, &mut ch.prev, &mut s.fft_in[frame.clone()], cfg.frame_shift, |x| {
        ComplexQ31::from_bits(x, 0)
    });
    apply_window(&mut s.fft_in[frame.clone()], &kernels.window, 0);
    if let Some(t) = trace.as_mut() {
        t.fft_input(index, s.fft_in);
    }

    kernels.plan.execute(s.fft_in, s.fft_out, false)?;
    if let Some(t) = trace.as_mut() {
        t.fft_output(index, s.fft_out);
    }

    to_polar(&s.fft_out[..half], s.polar);
    processor.process(index, s.polar);
    to_complex(s.polar, &mut s.fft_out[..half]);
    apply_symmetry(s.fft_out);

    kernels.plan.execute(s.fft_out, s.fft_in, true)?;
    if let Some(t) = trace.as_mut() {
        t.ifft_output(index, s.fft_in);
    }

    apply_window(&mut s.fft_in[frame.clone()], &kernels.synthesis.coefs, kernels.synthesis.shift);
    overlap_add(&mut ch.output, &s.fft_in[frame], cfg.frame_shift)
}

impl<S: Sample> StreamProcessor<S> for PhaseVocoder<S> {
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
        let Self { config, processor, trace, state, core, .. } = self;
        let core = match (*state, core.as_mut()) {
            (StreamState::Freed, _) => return Err(StftError::Freed),
            (_, Some(core)) => core,
            (_, None) => return Err(StftError::NotPrepared),
        };
        let num_channels = core.channels.len();

        let room = core.channels.iter().map(|c| c.input.free()).min().unwrap_or(0);
        let read = source.read_frames(frames.min(room), num_channels, |ch, x| {
            core.channels[ch].input.push(x.to_q31());
        });
        if read > 0 && *state == StreamState::Configured {
            *state = StreamState::WarmingUp;
        }

        let mut hops = 0;
        for (index, ch) in core.channels.iter_mut().enumerate() {
            if !ch.warm_up(config.frame_length) {
                continue;
            }
            while ch.input.avail() >= config.frame_shift {
                if ch.output.free() < config.frame_length {
                    warn!("vocoder: ch {} output ring full, hop deferred", index);
                    break;
                }
                run_hop(config, &core.kernels, &mut core.arena, ch, index, &mut **processor, trace)?;
                hops += 1;
            }
        }
        if hops > 0 {
            trace!("vocoder: {} hops", hops);
            if !core.fft_done {
                debug!("vocoder: first frame complete");
            }
            core.fft_done = true;
            *state = StreamState::Streaming;
        }

        let out_frames = frames.min(sink.free() / num_channels);
        let ready = if core.fft_done {
            let avail = core.channels.iter().map(|c| c.output.avail()).min().unwrap_or(0);
            avail.min(out_frames)
        } else {
            0
        };
        sink.write_frames(ready, num_channels, |ch| S::from_q31(core.channels[ch].output.take().unwrap_or(0)));
        if core.fft_done && ready < out_frames {
            debug!("vocoder: output short by {} frames", out_frames - ready);
        }
        sink.zero_fill((out_frames - ready) * num_channels);
        Ok(read)
    }

    fn reset(&mut self) -> Result<(), StftError> {
        match (self.state, self.core.as_mut()) {
            (StreamState::Freed, _) => Err(StftError::Freed),
            (_, None) => Ok(()),
            (_, Some(core)) => {
                for ch in core.channels.iter_mut() {
                    ch.reset();
                }
                core.arena.clear();
                core.fft_done = false;
                self.processor.reset();
                self.state = StreamState::Configured;
                debug!("vocoder: reset");
                Ok(())
            }
        }
    }

    fn release(&mut self) {
        if self.state != StreamState::Freed {
            debug!("vocoder: released");
        }
        self.core = None;
        self.state = StreamState::Freed;
    }

    fn state(&self) -> StreamState {
        self.state
    }
}
