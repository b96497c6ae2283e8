#![no_std]

// Enables the standard library only for tests and the `std` feature,
// so you can run 'cargo test' on your PC normally.
#[cfg(any(test, feature = "std"))]
extern crate std;

extern crate alloc;

pub mod common;
pub mod fixed;
pub mod stft;

pub use common::{FftError, StftError};
pub use fixed::{ComplexFixed, ComplexFixed16, Fixed, Fixed16, FftMultiPlan, FftPlan, PolarFixed};
pub use stft::{FeatureStream, PhaseVocoder, StftConfig, WindowType};
