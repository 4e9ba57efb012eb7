use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::FilmCopy;
use crate::KernelError;

#[async_trait::async_trait]
pub trait CopyModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        copy: &FilmCopy,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnCopyModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type CopyModifier: CopyModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn copy_modifier(&self) -> &Self::CopyModifier;
}
