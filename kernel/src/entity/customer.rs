mod id;

pub use self::id::*;
use crate::entity::PlanCode;
use destructure::Destructure;
use serde::{Deserialize, Serialize};
use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Destructure, References)]
pub struct Customer {
    id: CustomerId,
    plan_code: PlanCode,
}

impl Customer {
    pub fn new(id: CustomerId, plan_code: PlanCode) -> Self {
        Self { id, plan_code }
    }
}
