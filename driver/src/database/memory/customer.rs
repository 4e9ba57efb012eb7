use kernel::interface::query::CustomerQuery;
use kernel::prelude::entity::{Customer, CustomerId};
use kernel::KernelError;

use crate::database::memory::{InMemoryTransaction, RowKey};

pub struct InMemoryCustomerRepository;

#[async_trait::async_trait]
impl CustomerQuery for InMemoryCustomerRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &CustomerId,
    ) -> error_stack::Result<Option<Customer>, KernelError> {
        con.read(|rows| rows.customers.get(id.as_ref()).cloned())
    }

    async fn lock_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &CustomerId,
    ) -> error_stack::Result<Option<Customer>, KernelError> {
        con.lock(RowKey::Customer(*id.as_ref())).await?;
        self.find_by_id(con, id).await
    }
}
