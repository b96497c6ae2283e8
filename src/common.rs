// src/common.rs

use core::fmt;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum FftError {
    NotPowerOfTwo,
    BufferTooSmall,
    /// Size is neither a power of two nor three times a power of two.
    UnsupportedSize(usize),
    /// Size (or the sub-transform size of a composite plan) is above the limit.
    SizeTooLarge(usize),
}

impl fmt::Display for FftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FftError::NotPowerOfTwo => write!(f, "Size must be a power of 2"),
            FftError::BufferTooSmall => write!(f, "Input or output buffer is too small"),
            FftError::UnsupportedSize(n) => write!(f, "Not supported FFT size {}", n),
            FftError::SizeTooLarge(n) => write!(f, "Requested size {} FFT is too large", n),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum StftError {
    Fft(FftError),
    InvalidConfig(&'static str),
    SampleRateMismatch { config: u32, stream: u32 },
    IllegalChannel { channel: i16, channels: usize },
    AllocFailed,
    NotPrepared,
    Freed,
    FormatMismatch,
}

impl fmt::Display for StftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StftError::Fft(e) => write!(f, "FFT setup failed: {}", e),
            StftError::InvalidConfig(what) => write!(f, "Invalid configuration: {}", what),
            StftError::SampleRateMismatch { config, stream } => write!(
                f,
                "Config sample_frequency {} does not match stream rate {}",
                config, stream
            ),
            StftError::IllegalChannel { channel, channels } => {
                write!(f, "Illegal channel {} for {} channel stream", channel, channels)
            }
            StftError::AllocFailed => write!(f, "Failed buffer allocate"),
            StftError::NotPrepared => write!(f, "Stream is not prepared"),
            StftError::Freed => write!(f, "Stream has been freed"),
            StftError::FormatMismatch => write!(f, "Sample container does not match the prepared format"),
        }
    }
}

impl From<FftError> for StftError {
    fn from(e: FftError) -> Self {
        StftError::Fft(e)
    }
}

/// Out-of-place transform over caller-owned buffers.
///
/// The input buffer is scratch: an inverse transform conjugates it in place.
pub trait FftProcess<T> {
    fn execute(&self, input: &mut [T], output: &mut [T], inverse: bool) -> Result<(), FftError>;

    /// Number of points in the transform.
    fn size(&self) -> usize;
}

#[cfg(feature = "std")]
impl std::error::Error for FftError {}

#[cfg(feature = "std")]
impl std::error::Error for StftError {}
