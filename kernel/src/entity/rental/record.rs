use destructure::Destructure;
use vodca::References;

use crate::entity::{Film, PlanCode, Rental};

/// A rental joined with the film it concerns and the renter's current plan.
#[derive(Debug, Clone, Eq, PartialEq, References, Destructure)]
pub struct RentalRecord {
    rental: Rental,
    film: Film,
    plan_code: PlanCode,
}

impl RentalRecord {
    pub fn new(rental: Rental, film: Film, plan_code: PlanCode) -> Self {
        Self {
            rental,
            film,
            plan_code,
        }
    }
}
