use kernel::interface::query::PlanQuery;
use kernel::prelude::entity::{Plan, PlanCode};
use kernel::KernelError;

use crate::database::memory::InMemoryTransaction;

pub struct InMemoryPlanRepository;

#[async_trait::async_trait]
impl PlanQuery for InMemoryPlanRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_code(
        &self,
        con: &mut InMemoryTransaction,
        code: &PlanCode,
    ) -> error_stack::Result<Option<Plan>, KernelError> {
        con.read(|rows| rows.plans.get(code.as_ref()).cloned())
    }
}
