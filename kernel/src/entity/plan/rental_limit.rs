use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Maximum number of simultaneously open rentals.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Fromln, AsRefln, Serialize, Deserialize)]
pub struct RentalLimit(i32);

impl RentalLimit {
    pub fn new(limit: impl Into<i32>) -> Self {
        Self(limit.into())
    }
}
