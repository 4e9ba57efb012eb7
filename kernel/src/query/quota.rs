use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{CustomerId, Quota};
use crate::KernelError;

#[async_trait::async_trait]
pub trait QuotaQuery: 'static + Sync + Send {
    type Transaction: Transaction;

    /// Open rental count and plan limit read from a single snapshot.
    /// `None` when the customer or its plan does not exist.
    async fn find_by_customer_id(
        &self,
        con: &mut Self::Transaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Option<Quota>, KernelError>;
}

pub trait DependOnQuotaQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type QuotaQuery: QuotaQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn quota_query(&self) -> &Self::QuotaQuery;
}
