mod id;
mod penalty;
mod record;
mod status;
mod timestamp;

pub use self::{id::*, penalty::*, record::*, status::*, timestamp::*};
use destructure::{Destructure, Mutation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use vodca::References;

use crate::entity::{CopyId, CustomerId};

/// A checkout of one copy by one customer.
///
/// `rented_at` and `due_at` never change once created. `returned_at` moves from `None`
/// to `Some` exactly once and the row is kept afterwards as history.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure, Mutation)]
pub struct Rental {
    id: RentalId,
    customer_id: CustomerId,
    copy_id: CopyId,
    rented_at: RentedAt,
    due_at: Option<DueAt>,
    returned_at: Option<ReturnedAt>,
}

impl Rental {
    pub fn new(
        id: RentalId,
        customer_id: CustomerId,
        copy_id: CopyId,
        rented_at: RentedAt,
        due_at: Option<DueAt>,
        returned_at: Option<ReturnedAt>,
    ) -> Self {
        Self {
            id,
            customer_id,
            copy_id,
            rented_at,
            due_at,
            returned_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn is_overdue(&self, now: &OffsetDateTime) -> bool {
        self.due_at
            .as_ref()
            .is_some_and(|due_at| due_at.as_ref() < now)
    }

    pub fn status(&self, now: &OffsetDateTime) -> RentalStatus {
        if !self.is_open() {
            RentalStatus::Returned
        } else if self.is_overdue(now) {
            RentalStatus::Overdue
        } else {
            RentalStatus::Ongoing
        }
    }
}
