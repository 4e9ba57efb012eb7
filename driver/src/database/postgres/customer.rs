use sqlx::PgConnection;

use kernel::interface::query::CustomerQuery;
use kernel::prelude::entity::{Customer, CustomerId, PlanCode};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresCustomerRepository;

#[async_trait::async_trait]
impl CustomerQuery for PostgresCustomerRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &CustomerId,
    ) -> error_stack::Result<Option<Customer>, KernelError> {
        PgCustomerInternal::find_by_id(con, id).await
    }

    async fn lock_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &CustomerId,
    ) -> error_stack::Result<Option<Customer>, KernelError> {
        PgCustomerInternal::lock_by_id(con, id).await
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    plan_code: String,
}

impl From<CustomerRow> for Customer {
    fn from(value: CustomerRow) -> Self {
        Customer::new(CustomerId::new(value.id), PlanCode::new(value.plan_code))
    }
}

pub(in crate::database) struct PgCustomerInternal;

impl PgCustomerInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &CustomerId,
    ) -> error_stack::Result<Option<Customer>, KernelError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            // language=postgresql
            r#"
            SELECT id, plan_code
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Customer::from))
    }

    async fn lock_by_id(
        con: &mut PgConnection,
        id: &CustomerId,
    ) -> error_stack::Result<Option<Customer>, KernelError> {
        tracing::debug!("locking customer {}", id.as_ref());
        let row = sqlx::query_as::<_, CustomerRow>(
            // language=postgresql
            r#"
            SELECT id, plan_code
            FROM customers
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Customer::from))
    }
}

#[cfg(test)]
mod test {
    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::CustomerQuery;
    use kernel::prelude::entity::CustomerId;
    use kernel::KernelError;

    use crate::database::postgres::customer::PostgresCustomerRepository;
    use crate::database::postgres::{fixture, PostgresDatabase};
    use crate::error::ConvertError;

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn test() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut con = db.transact().await?;
        let (customer_id, _) = fixture::seed(&mut con, &[]).await?;
        let id = CustomerId::new(customer_id);

        let found = PostgresCustomerRepository.find_by_id(&mut con, &id).await?;
        let plan_code = found.map(|customer| customer.plan_code().as_ref().clone());
        assert_eq!(plan_code.as_deref(), Some("F"));

        let locked = PostgresCustomerRepository.lock_by_id(&mut con, &id).await?;
        assert!(locked.is_some());

        let missing = PostgresCustomerRepository
            .find_by_id(&mut con, &CustomerId::new(-1))
            .await?;
        assert!(missing.is_none());

        con.roll_back().await?;
        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn held_lock_times_out() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut seed = db.transact().await?;
        let (customer_id, _) = fixture::seed(&mut seed, &[]).await?;
        seed.commit().await?;
        let id = CustomerId::new(customer_id);

        let mut holder = db.transact().await?;
        PostgresCustomerRepository.lock_by_id(&mut holder, &id).await?;

        let mut waiter = db.transact().await?;
        // language=postgresql
        sqlx::query("SET LOCAL lock_timeout = '100ms'")
            .execute(&mut *waiter)
            .await
            .convert_error()?;
        let error = PostgresCustomerRepository
            .lock_by_id(&mut waiter, &id)
            .await
            .expect_err("lock wait should time out");
        assert_eq!(error.current_context(), &KernelError::Timeout);

        waiter.roll_back().await?;
        holder.roll_back().await?;
        Ok(())
    }
}
