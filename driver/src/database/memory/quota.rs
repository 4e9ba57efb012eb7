use kernel::interface::query::QuotaQuery;
use kernel::prelude::entity::{ActiveRentals, CustomerId, Quota};
use kernel::KernelError;

use crate::database::memory::rental::count_open;
use crate::database::memory::InMemoryTransaction;

pub struct InMemoryQuotaRepository;

#[async_trait::async_trait]
impl QuotaQuery for InMemoryQuotaRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_customer_id(
        &self,
        con: &mut InMemoryTransaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Option<Quota>, KernelError> {
        con.read(|rows| {
            let customer = rows.customers.get(customer_id.as_ref())?;
            let plan = rows.plans.get(customer.plan_code().as_ref())?;
            Some(Quota::new(
                ActiveRentals::new(count_open(rows, customer_id)),
                *plan.rental_limit(),
            ))
        })
    }
}
