use super::fixed::{Q29, Q30};

/// Complex value in polar form: magnitude in Q2.30, angle in Q3.29 radians
/// within `[-π, π]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PolarFixed {
    pub magnitude: Q30,
    pub angle: Q29,
}

impl PolarFixed {
    pub const ZERO: Self = Self { magnitude: Q30::ZERO, angle: Q29::ZERO };

    pub const fn new(magnitude: Q30, angle: Q29) -> Self {
        Self { magnitude, angle }
    }
}
