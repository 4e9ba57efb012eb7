use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{ActiveRentals, CopyId, CustomerId, Rental, RentalRecord};
use crate::KernelError;

#[async_trait::async_trait]
pub trait RentalQuery: 'static + Sync + Send {
    type Transaction: Transaction;

    /// Locks and returns the rental of the copy that has not been returned yet.
    /// Waits for a concurrent holder of the same rental to finish first.
    async fn lock_open_by_copy_id(
        &self,
        con: &mut Self::Transaction,
        copy_id: &CopyId,
    ) -> error_stack::Result<Option<Rental>, KernelError>;

    async fn count_open_by_customer_id(
        &self,
        con: &mut Self::Transaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<ActiveRentals, KernelError>;

    /// Newest `rented_at` first.
    async fn find_by_customer_id(
        &self,
        con: &mut Self::Transaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Vec<RentalRecord>, KernelError>;
}

pub trait DependOnRentalQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type RentalQuery: RentalQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn rental_query(&self) -> &Self::RentalQuery;
}
