use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Plan, PlanCode};
use crate::KernelError;

#[async_trait::async_trait]
pub trait PlanQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_code(
        &self,
        con: &mut Self::Transaction,
        code: &PlanCode,
    ) -> error_stack::Result<Option<Plan>, KernelError>;
}

pub trait DependOnPlanQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type PlanQuery: PlanQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn plan_query(&self) -> &Self::PlanQuery;
}
