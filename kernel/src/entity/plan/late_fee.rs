use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::entity::PlanCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Fromln, AsRefln, Serialize, Deserialize)]
pub struct LateFeeMultiplier(Decimal);

impl LateFeeMultiplier {
    pub fn new(multiplier: impl Into<Decimal>) -> Self {
        Self(multiplier.into())
    }

    /// `D` (beginner) pays double, `I` (intermediate) one and a half,
    /// `A` (advanced) and any unknown code pay the base rate.
    pub fn for_plan(code: &PlanCode) -> Self {
        match code.as_ref().trim() {
            "D" => Self(Decimal::TWO),
            "I" => Self(Decimal::new(15, 1)),
            _ => Self(Decimal::ONE),
        }
    }
}
