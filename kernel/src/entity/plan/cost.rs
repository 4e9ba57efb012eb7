use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Fromln, AsRefln, Serialize, Deserialize)]
pub struct PlanCost(Decimal);

impl PlanCost {
    pub fn new(cost: impl Into<Decimal>) -> Self {
        Self(cost.into())
    }
}
