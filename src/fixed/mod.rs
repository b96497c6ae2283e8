pub mod types;
pub mod math;
pub mod core;
pub mod complex;
pub mod multi;
pub mod polar;

pub use complex::FftPlan;
pub use self::core::{FftWord, FFT_SIZE_MAX};
pub use multi::FftMultiPlan;
pub use types::{
    ComplexFixed, ComplexFixed16, ComplexQ15, ComplexQ31, Fixed, Fixed16, PolarFixed, Q15, Q29, Q30, Q31,
};
