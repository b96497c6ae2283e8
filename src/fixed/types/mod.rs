mod fixed;
mod fixed16;
mod fixed_complex;
mod polar;

pub use fixed::{Fixed, Q29, Q30, Q31};
pub use fixed16::{Fixed16, Q15};
pub use fixed_complex::{ComplexFixed, ComplexFixed16, ComplexQ15, ComplexQ31};
pub use polar::PolarFixed;
