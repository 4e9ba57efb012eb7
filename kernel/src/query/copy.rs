use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{CopyId, FilmCopy, FilmId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait CopyQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &CopyId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError>;

    async fn find_by_film_id(
        &self,
        con: &mut Self::Transaction,
        film_id: &FilmId,
    ) -> error_stack::Result<Vec<FilmCopy>, KernelError>;

    /// Picks one available copy of the film and locks it exclusively.
    ///
    /// Copies already locked by another transaction are skipped rather than waited on,
    /// so concurrent callers never receive the same copy.
    async fn lock_available_by_film_id(
        &self,
        con: &mut Self::Transaction,
        film_id: &FilmId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError>;
}

pub trait DependOnCopyQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type CopyQuery: CopyQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn copy_query(&self) -> &Self::CopyQuery;
}
