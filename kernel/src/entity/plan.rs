mod code;
mod cost;
mod late_fee;
mod loan_days;
mod name;
mod rental_limit;

pub use self::{code::*, cost::*, late_fee::*, loan_days::*, name::*, rental_limit::*};
use destructure::Destructure;
use serde::{Deserialize, Serialize};
use vodca::References;

/// Subscription tier ("forfait"). Static reference data, never written by the rental core.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Destructure, References)]
pub struct Plan {
    code: PlanCode,
    name: PlanName,
    cost: PlanCost,
    rental_limit: RentalLimit,
    loan_days: Option<LoanDays>,
}

impl Plan {
    pub fn new(
        code: PlanCode,
        name: PlanName,
        cost: PlanCost,
        rental_limit: RentalLimit,
        loan_days: Option<LoanDays>,
    ) -> Self {
        Self {
            code,
            name,
            cost,
            rental_limit,
            loan_days,
        }
    }

    pub fn late_fee_multiplier(&self) -> LateFeeMultiplier {
        LateFeeMultiplier::for_plan(&self.code)
    }
}
