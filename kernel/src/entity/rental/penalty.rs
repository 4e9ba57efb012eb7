use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Late fee, always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Fromln, AsRefln, Serialize, Deserialize)]
pub struct Penalty(Decimal);

impl Penalty {
    pub fn new(amount: impl Into<Decimal>) -> Self {
        Self(amount.into())
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}
