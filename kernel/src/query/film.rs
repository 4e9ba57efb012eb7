use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Film, FilmId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait FilmQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &FilmId,
    ) -> error_stack::Result<Option<Film>, KernelError>;
}

pub trait DependOnFilmQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type FilmQuery: FilmQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn film_query(&self) -> &Self::FilmQuery;
}
