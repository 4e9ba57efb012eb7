use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln, References};

use crate::entity::RentalLimit;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Fromln, AsRefln, Serialize, Deserialize)]
pub struct ActiveRentals(i64);

impl ActiveRentals {
    pub fn new(count: impl Into<i64>) -> Self {
        Self(count.into())
    }
}

/// Snapshot of a customer's open rentals against the plan limit, read at one point in time.
#[derive(Debug, Clone, Copy, Eq, PartialEq, References)]
pub struct Quota {
    active_rentals: ActiveRentals,
    rental_limit: RentalLimit,
}

impl Quota {
    pub fn new(active_rentals: ActiveRentals, rental_limit: RentalLimit) -> Self {
        Self {
            active_rentals,
            rental_limit,
        }
    }

    pub fn can_rent(&self) -> bool {
        self.active_rentals.0 < i64::from(*self.rental_limit.as_ref())
    }
}
