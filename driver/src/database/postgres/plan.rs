use rust_decimal::Decimal;
use sqlx::PgConnection;

use kernel::interface::query::PlanQuery;
use kernel::prelude::entity::{LoanDays, Plan, PlanCode, PlanCost, PlanName, RentalLimit};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresPlanRepository;

#[async_trait::async_trait]
impl PlanQuery for PostgresPlanRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_code(
        &self,
        con: &mut PostgresTransaction,
        code: &PlanCode,
    ) -> error_stack::Result<Option<Plan>, KernelError> {
        PgPlanInternal::find_by_code(con, code).await
    }
}

#[derive(sqlx::FromRow)]
struct PlanRow {
    code: String,
    name: String,
    cost: Decimal,
    rental_limit: i32,
    loan_days: Option<i32>,
}

impl From<PlanRow> for Plan {
    fn from(value: PlanRow) -> Self {
        Plan::new(
            PlanCode::new(value.code),
            PlanName::new(value.name),
            PlanCost::new(value.cost),
            RentalLimit::new(value.rental_limit),
            value.loan_days.map(LoanDays::new),
        )
    }
}

pub(in crate::database) struct PgPlanInternal;

impl PgPlanInternal {
    async fn find_by_code(
        con: &mut PgConnection,
        code: &PlanCode,
    ) -> error_stack::Result<Option<Plan>, KernelError> {
        let row = sqlx::query_as::<_, PlanRow>(
            // language=postgresql
            r#"
            SELECT code, name, cost, rental_limit, loan_days
            FROM plans
            WHERE code = $1
            "#,
        )
        .bind(code.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Plan::from))
    }
}
