// src/stft/config.rs
//! Resolved numeric configuration shared by the stream processors.

use crate::common::{FftError, StftError};
use crate::fixed::{FFT_SIZE_MAX, Fixed16, Q15, Q31};
use log::error;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum WindowType {
    Rectangular,
    Blackman,
    #[default]
    Hamming,
    Hann,
    Povey,
}

/// Where the frame sits inside a zero-padded FFT buffer.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum PadType {
    /// Frame first, zeros after it.
    #[default]
    End,
    Center,
    /// Zeros first, frame at the end.
    Start,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum MelLog {
    /// Natural logarithm.
    #[default]
    Ln,
    Log10,
    Db,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum MelNorm {
    #[default]
    None,
    /// Each triangle scaled to unit area.
    Slaney,
}

/// Cepstral lifter coefficient, Q7.9.
pub type Q9 = Fixed16<9>;
/// Log Mel and cepstral values, Q8.7.
pub type Q7 = Fixed16<7>;

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct StftConfig {
    /// Hz, must match the negotiated stream rate.
    pub sample_frequency: u32,
    pub frame_length: usize,
    /// Hop size in samples.
    pub frame_shift: usize,
    /// Source channel, -1 for mono input.
    pub channel: i16,
    pub window: WindowType,
    pub blackman_a0: Q15,
    pub pad: PadType,
    pub round_to_power_of_two: bool,
    /// One-pole pre-emphasis, 0 disables.
    pub preemphasis_coefficient: Q15,
    pub num_mel_bins: usize,
    pub num_ceps: usize,
    pub low_freq: u32,
    /// 0 selects the Nyquist frequency.
    pub high_freq: u32,
    /// 0 disables the lifter.
    pub cepstral_lifter: Q9,
    /// Floor for the linear Mel energy.
    pub pmin: Q31,
    pub mel_log: MelLog,
    pub mel_norm: MelNorm,
    /// Dynamic range limit below the frame maximum, dB mode only, 0 disables.
    pub top_db: Q7,
    /// Block normalization before a 16-bit FFT.
    pub normalize_fft: bool,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            sample_frequency: 16000,
            frame_length: 400,
            frame_shift: 160,
            channel: -1,
            window: WindowType::Hamming,
            blackman_a0: Q15::from_bits(13763),
            pad: PadType::End,
            round_to_power_of_two: true,
            preemphasis_coefficient: Q15::from_bits(31785),
            num_mel_bins: 23,
            num_ceps: 13,
            low_freq: 20,
            high_freq: 0,
            cepstral_lifter: Q9::from_bits(22 << 9),
            pmin: Q31::from_bits(1),
            mel_log: MelLog::Ln,
            mel_norm: MelNorm::None,
            top_db: Q7::from_bits(0),
            normalize_fft: true,
        }
    }
}

fn reject(what: &'static str) -> StftError {
    error!("stft config: {}", what);
    StftError::InvalidConfig(what)
}

impl StftConfig {
    /// Transform length: the frame length, or the next power of two when
    /// `round_to_power_of_two` is set.
    pub fn padded_size(&self) -> usize {
        if self.round_to_power_of_two {
            self.frame_length.next_power_of_two()
        } else {
            self.frame_length
        }
    }

    /// Non-redundant bins of a real transform.
    pub fn half_size(&self) -> usize {
        self.padded_size() / 2 + 1
    }

    /// Samples carried from one hop to the next.
    pub fn prev_size(&self) -> usize {
        self.frame_length - self.frame_shift
    }

    /// Index of the first frame sample inside the padded buffer.
    pub fn pad_offset(&self) -> usize {
        let padding = self.padded_size() - self.frame_length;
        match self.pad {
            PadType::End => 0,
            PadType::Center => padding / 2,
            PadType::Start => padding,
        }
    }

    pub fn source_channel(&self) -> usize {
        self.channel.max(0) as usize
    }

    pub fn nyquist(&self) -> u32 {
        self.sample_frequency / 2
    }

    /// Upper Mel edge with the 0 = Nyquist rule applied.
    pub fn resolved_high_freq(&self) -> u32 {
        if self.high_freq == 0 { self.nyquist() } else { self.high_freq }
    }

    /// Checks framing against the negotiated stream.
    pub fn validate(&self, sample_rate: u32, channels: usize) -> Result<(), StftError> {
        if channels == 0 {
            return Err(reject("zero channels"));
        }
        if self.frame_length < 2 {
            return Err(reject("frame length"));
        }
        if self.frame_shift == 0 || self.frame_shift > self.frame_length {
            return Err(reject("frame shift"));
        }
        let padded = self.padded_size();
        let limit = if self.round_to_power_of_two { FFT_SIZE_MAX } else { 3 * FFT_SIZE_MAX };
        if padded > limit {
            error!("stft config: FFT size {} above {}", padded, limit);
            return Err(FftError::SizeTooLarge(padded).into());
        }
        if self.sample_frequency != sample_rate {
            error!("stft config: sample_frequency {} != stream rate {}", self.sample_frequency, sample_rate);
            return Err(StftError::SampleRateMismatch { config: self.sample_frequency, stream: sample_rate });
        }
        if self.channel >= 0 && self.channel as usize >= channels {
            error!("stft config: channel {} out of {}", self.channel, channels);
            return Err(StftError::IllegalChannel { channel: self.channel, channels });
        }
        Ok(())
    }

    /// Additional checks for the cepstral feature path.
    pub fn validate_features(&self) -> Result<(), StftError> {
        if !self.round_to_power_of_two {
            return Err(reject("feature path needs round_to_power_of_two"));
        }
        if self.num_mel_bins == 0 {
            return Err(reject("num_mel_bins"));
        }
        if self.num_ceps == 0 || self.num_ceps > self.num_mel_bins {
            return Err(reject("num_ceps"));
        }
        let high = self.resolved_high_freq();
        if self.low_freq >= high || high > self.nyquist() {
            return Err(reject("mel frequency range"));
        }
        if self.cepstral_lifter.to_bits() < 0 || self.top_db.to_bits() < 0 || self.pmin.to_bits() <= 0 {
            return Err(reject("negative lifter, top_db or pmin"));
        }
        Ok(())
    }
}
